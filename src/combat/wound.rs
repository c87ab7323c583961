//! Wound stage: strength against toughness, Lethal Hits auto-wounds and Devastating Wounds.

use serde::Serialize;

use crate::combat::hit::HitOutcome;
use crate::combat::modifiers::clamp_threshold;
use crate::combat::rng::DiceRng;
use crate::combat::trace::{CombatEvent, TraceCollector};
use crate::data::unit::WeaponProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WoundOutcome {
    pub wounds: u32,
    /// Wounds that skip saving throws; a subset of `wounds`.
    pub devastating: u32,
}

/// Unmodified wound roll target for `strength` against `toughness`.
pub fn wound_threshold(strength: i32, toughness: i32) -> u8 {
    if strength >= 2 * toughness {
        2
    } else if strength > toughness {
        3
    } else if strength == toughness {
        4
    } else if 2 * strength <= toughness {
        6
    } else {
        5
    }
}

pub fn resolve_wounds(
    hits: &HitOutcome,
    weapon: &WeaponProfile,
    toughness: Option<i32>,
    rng: &mut DiceRng,
    trace: &mut TraceCollector,
) -> WoundOutcome {
    let mut outcome = WoundOutcome::default();
    if hits.hits == 0 {
        return outcome;
    }

    let (Some(strength), Some(toughness)) = (weapon.strength, toughness) else {
        trace.record_with(|| {
            CombatEvent::new("weapon_skipped", "wound")
                .weapon(weapon.name.as_str())
                .value("reason", "unparsable strength or toughness")
        });
        return outcome;
    };

    let modifiers = weapon.modifiers;
    let threshold =
        clamp_threshold(wound_threshold(strength, toughness) as i32 - modifiers.wound_mod);
    let devastating = weapon.keywords.devastating_wounds();

    let lethal = hits.lethal_hits.min(hits.hits);
    outcome.wounds = lethal;
    if lethal > 0 {
        trace.record_with(|| {
            CombatEvent::new("lethal_hits", "wound")
                .weapon(weapon.name.as_str())
                .value("auto_wounds", lethal)
        });
    }

    for _ in 0..hits.hits - lethal {
        let first = rng.d6();
        let mut roll = first;
        let mut rerolled = false;
        if roll < threshold && modifiers.may_reroll_wound(roll) {
            roll = rng.d6();
            rerolled = true;
        }
        let critical = devastating && roll >= modifiers.critical_wound;
        let wounded = roll >= threshold || critical;

        if wounded {
            outcome.wounds += 1;
            if critical {
                outcome.devastating += 1;
            }
        }

        trace.record_with(|| {
            CombatEvent::new("wound_roll", "wound")
                .weapon(weapon.name.as_str())
                .value("roll", first)
                .value("reroll", if rerolled { Some(roll) } else { None })
                .value("threshold", threshold)
                .value("strength", strength)
                .value("toughness", toughness)
                .value("wounded", wounded)
                .value("devastating", critical)
        });
    }

    outcome
}
