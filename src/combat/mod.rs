pub mod abilities;
pub mod casualty;
pub mod dice;
pub mod engine;
pub mod hit;
pub mod keywords;
pub mod modifiers;
pub mod rng;
pub mod save;
pub mod trace;
pub mod wound;

pub use abilities::{resolve_abilities, Ability, AbilityKind};
pub use casualty::apply_damage;
pub use dice::{parse_dice, DiceExpr, DiceParseError};
pub use engine::{resolve_engagement, EngagementResult};
pub use hit::{hit_threshold, resolve_hits, HitOutcome};
pub use keywords::{KeywordSet, WeaponKeyword};
pub use modifiers::{ModifierSet, DEFAULT_CRITICAL};
pub use rng::{derive_trial_seed, entropy_seed, DiceRng};
pub use save::{resolve_saves, DefenseProfile, SaveOutcome};
pub use trace::{serialize_events_json, CombatEvent, TraceCollector, TraceMode};
pub use wound::{resolve_wounds, wound_threshold, WoundOutcome};
