//! Hit stage: one D6 per attack against the weapon's skill, with rerolls,
//! critical fishing, Sustained Hits and Lethal Hits.

use serde::Serialize;

use crate::combat::modifiers::clamp_threshold;
use crate::combat::rng::DiceRng;
use crate::combat::trace::{CombatEvent, TraceCollector};
use crate::data::unit::WeaponProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HitOutcome {
    pub attacks: u32,
    /// Successful hits including Sustained Hits bonuses.
    pub hits: u32,
    pub critical_hits: u32,
    /// Hits that wound automatically; a subset of `hits`.
    pub lethal_hits: u32,
}

pub fn hit_threshold(skill: u8, hit_mod: i32) -> u8 {
    clamp_threshold(skill as i32 - hit_mod)
}

pub fn resolve_hits(
    total_attacks: u32,
    weapon: &WeaponProfile,
    rng: &mut DiceRng,
    trace: &mut TraceCollector,
) -> HitOutcome {
    let mut outcome = HitOutcome {
        attacks: total_attacks,
        ..HitOutcome::default()
    };
    if total_attacks == 0 {
        return outcome;
    }

    if weapon.keywords.torrent() {
        outcome.hits = total_attacks;
        trace.record_with(|| {
            CombatEvent::new("torrent", "hit")
                .weapon(weapon.name.as_str())
                .value("attacks", total_attacks)
                .value("hits", total_attacks)
        });
        return outcome;
    }

    let Some(skill) = weapon.skill else {
        trace.record_with(|| {
            CombatEvent::new("weapon_skipped", "hit")
                .weapon(weapon.name.as_str())
                .value("reason", "unparsable skill")
        });
        return outcome;
    };

    let modifiers = weapon.modifiers;
    let threshold = hit_threshold(skill, modifiers.hit_mod);
    let sustained = weapon.keywords.sustained_hits();
    let lethal = weapon.keywords.lethal_hits();

    for _ in 0..total_attacks {
        let first = rng.d6();
        let mut roll = first;
        let mut hit = roll >= threshold;
        let mut critical = roll >= modifiers.critical_hit;
        let mut rerolled = false;

        if !hit && modifiers.may_reroll_hit(roll) {
            roll = rng.d6();
            rerolled = true;
        } else if hit && !critical && modifiers.fish_critical_hits {
            // Replaces the hit outright, so fishing can turn a hit into a miss.
            roll = rng.d6();
            rerolled = true;
        }
        if rerolled {
            hit = roll >= threshold;
            critical = roll >= modifiers.critical_hit;
        }
        // A critical hit always hits, even if abilities push the crit band below the threshold.
        hit |= critical;

        let mut bonus_hits = 0;
        if hit {
            outcome.hits += 1;
            if critical {
                outcome.critical_hits += 1;
                if let Some(amount) = sustained {
                    bonus_hits = amount.roll(rng);
                    outcome.hits += bonus_hits;
                }
                if lethal {
                    outcome.lethal_hits += 1;
                }
            }
        }

        trace.record_with(|| {
            CombatEvent::new("hit_roll", "hit")
                .weapon(weapon.name.as_str())
                .value("roll", first)
                .value("reroll", if rerolled { Some(roll) } else { None })
                .value("threshold", threshold)
                .value("hit", hit)
                .value("critical", critical)
                .value("sustained_bonus", bonus_hits)
        });
    }

    outcome
}
