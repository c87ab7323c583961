//! Save and damage stage: devastating wounds bypass saves, remaining wounds face the
//! invulnerable or armour save, and unsaved damage is reduced by feel-no-pain and
//! damage-halving before it reaches the casualty tracker.

use serde::Serialize;

use crate::combat::casualty::apply_damage;
use crate::combat::rng::DiceRng;
use crate::combat::trace::{CombatEvent, TraceCollector};
use crate::combat::wound::WoundOutcome;
use crate::data::unit::{ModelGroup, WeaponProfile};

/// Defensive characteristics of the target group and its unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DefenseProfile {
    pub save: Option<u8>,
    /// Ignores armour penetration.
    pub invulnerable: Option<u8>,
    pub feel_no_pain: Option<u8>,
    /// Applies only to damage from devastating wounds.
    pub mortal_feel_no_pain: Option<u8>,
    pub halve_damage: bool,
}

impl DefenseProfile {
    /// Feel-no-pain threshold for a damage instance.
    ///
    /// Mortal damage takes the better (lower) of the general and mortal-only thresholds, so a
    /// weaker mortal-only ability never overrides a stronger general one. Picking the higher
    /// threshold here would let an extra ability make the unit easier to hurt.
    pub fn feel_no_pain_for(&self, mortal: bool) -> Option<u8> {
        if mortal {
            [self.feel_no_pain, self.mortal_feel_no_pain]
                .into_iter()
                .flatten()
                .min()
        } else {
            self.feel_no_pain
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub saved: u32,
    pub unsaved: u32,
    /// Damage applied to the target after reductions.
    pub damage: u32,
    pub models_slain: u32,
}

/// Whether a save roll of `roll` succeeds against `armor_penetration`.
pub fn save_succeeds(roll: u8, armor_penetration: i32, defense: &DefenseProfile) -> bool {
    if let Some(invulnerable) = defense.invulnerable.filter(|inv| *inv <= 6) {
        if roll >= invulnerable {
            return true;
        }
    }
    match defense.save {
        Some(save) => {
            let modified = save as i32 + armor_penetration;
            modified <= 6 && roll as i32 >= modified
        }
        None => false,
    }
}

/// Reduce `raw` damage by feel-no-pain (one roll per point) and halving (rounded up).
pub fn reduce_damage(
    raw: u32,
    feel_no_pain: Option<u8>,
    halve: bool,
    rng: &mut DiceRng,
) -> (u32, u32) {
    let mut negated = 0;
    if let Some(threshold) = feel_no_pain {
        for _ in 0..raw {
            if rng.d6() >= threshold {
                negated += 1;
            }
        }
    }
    let mut net = raw - negated;
    if halve {
        net = net.div_ceil(2);
    }
    (net, negated)
}

/// Roll damage for one unsaved wound, reduce it and apply it to `target`.
pub fn apply_damage_instance(
    weapon: &WeaponProfile,
    defense: &DefenseProfile,
    mortal: bool,
    target: &mut ModelGroup,
    rng: &mut DiceRng,
    trace: &mut TraceCollector,
) -> (u32, bool) {
    let raw = weapon.damage.roll(rng);
    let (net, negated) = reduce_damage(
        raw,
        defense.feel_no_pain_for(mortal),
        defense.halve_damage,
        rng,
    );
    let slain = apply_damage(target, net);
    trace.record_with(|| {
        CombatEvent::new("damage_applied", "damage")
            .weapon(weapon.name.as_str())
            .value("raw", raw)
            .value("negated", negated)
            .value("net", net)
            .value("mortal", mortal)
            .value("model_slain", slain)
            .value("carry_over", target.carry_over)
            .value("killed", target.killed)
    });
    (net, slain)
}

pub fn resolve_saves(
    wounds: &WoundOutcome,
    weapon: &WeaponProfile,
    defense: &DefenseProfile,
    target: &mut ModelGroup,
    rng: &mut DiceRng,
    trace: &mut TraceCollector,
) -> SaveOutcome {
    let mut outcome = SaveOutcome::default();
    let devastating = wounds.devastating.min(wounds.wounds);

    for _ in 0..devastating {
        let (damage, slain) = apply_damage_instance(weapon, defense, true, target, rng, trace);
        outcome.unsaved += 1;
        outcome.damage += damage;
        outcome.models_slain += slain as u32;
    }

    for _ in 0..wounds.wounds - devastating {
        let roll = rng.d6();
        let saved = save_succeeds(roll, weapon.armor_penetration, defense);
        trace.record_with(|| {
            CombatEvent::new("save_roll", "save")
                .weapon(weapon.name.as_str())
                .value("roll", roll)
                .value("armor_penetration", weapon.armor_penetration)
                .value("save", defense.save)
                .value("invulnerable", defense.invulnerable)
                .value("saved", saved)
        });
        if saved {
            outcome.saved += 1;
            continue;
        }
        let (damage, slain) = apply_damage_instance(weapon, defense, false, target, rng, trace);
        outcome.unsaved += 1;
        outcome.damage += damage;
        outcome.models_slain += slain as u32;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::unit::{ModelStats, WeaponDocument};
    use std::collections::BTreeMap;

    fn weapon(damage: &str) -> WeaponProfile {
        let characteristics: BTreeMap<String, String> =
            [("A", "1"), ("BS", "3+"), ("S", "4"), ("AP", "-1"), ("D", damage)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        WeaponProfile::from_document(
            "test gun",
            &WeaponDocument {
                name: None,
                weapon_type: "Ranged Weapons".to_string(),
                characteristics,
            },
        )
    }

    fn target(count: u32, wounds: u32) -> ModelGroup {
        ModelGroup {
            name: "Target".to_string(),
            count,
            killed: 0,
            wounds,
            carry_over: 0,
            leader: false,
            stats: ModelStats::default(),
            base_loadout: Vec::new(),
            weapons: Vec::new(),
        }
    }

    #[test]
    fn mortal_damage_uses_the_better_feel_no_pain() {
        let defense = DefenseProfile {
            feel_no_pain: Some(5),
            mortal_feel_no_pain: Some(6),
            ..DefenseProfile::default()
        };
        assert_eq!(defense.feel_no_pain_for(true), Some(5));
        assert_eq!(defense.feel_no_pain_for(false), Some(5));

        let mortal_only = DefenseProfile {
            mortal_feel_no_pain: Some(4),
            ..DefenseProfile::default()
        };
        assert_eq!(mortal_only.feel_no_pain_for(true), Some(4));
        assert_eq!(mortal_only.feel_no_pain_for(false), None);
    }

    #[test]
    fn armour_save_is_worsened_by_penetration() {
        let defense = DefenseProfile {
            save: Some(3),
            ..DefenseProfile::default()
        };
        assert!(save_succeeds(3, 0, &defense));
        assert!(!save_succeeds(3, 1, &defense));
        assert!(save_succeeds(4, 1, &defense));
        assert!(!save_succeeds(6, 4, &defense));
    }

    #[test]
    fn invulnerable_save_ignores_penetration() {
        let defense = DefenseProfile {
            save: Some(2),
            invulnerable: Some(4),
            ..DefenseProfile::default()
        };
        assert!(save_succeeds(4, 5, &defense));
        assert!(!save_succeeds(3, 5, &defense));
        assert!(save_succeeds(3, 0, &defense));
    }

    #[test]
    fn no_save_characteristic_never_saves() {
        let defense = DefenseProfile::default();
        for roll in 1..=6 {
            assert!(!save_succeeds(roll, 0, &defense));
        }
    }

    #[test]
    fn devastating_wounds_bypass_saves() {
        let gun = weapon("2");
        let defense = DefenseProfile {
            save: Some(2),
            invulnerable: Some(2),
            ..DefenseProfile::default()
        };
        let mut group = target(10, 100);
        let wounds = WoundOutcome {
            wounds: 5,
            devastating: 5,
        };
        let outcome = resolve_saves(
            &wounds,
            &gun,
            &defense,
            &mut group,
            &mut DiceRng::new(3),
            &mut TraceCollector::disabled(),
        );
        assert_eq!(outcome.saved, 0);
        assert_eq!(outcome.damage, 10);
        assert_eq!(group.carry_over, 10);
    }

    #[test]
    fn halving_rounds_up() {
        let mut rng = DiceRng::new(1);
        assert_eq!(reduce_damage(3, None, true, &mut rng), (2, 0));
        assert_eq!(reduce_damage(1, None, true, &mut rng), (1, 0));
        assert_eq!(reduce_damage(0, None, true, &mut rng), (0, 0));
        assert_eq!(reduce_damage(4, None, false, &mut rng), (4, 0));
    }

    #[test]
    fn feel_no_pain_five_plus_negates_a_third() {
        let mut rng = DiceRng::new(77);
        let trials = 5000;
        let mut net_total = 0u64;
        for _ in 0..trials {
            let (net, negated) = reduce_damage(6, Some(5), false, &mut rng);
            assert_eq!(net + negated, 6);
            net_total += net as u64;
        }
        let mean = net_total as f64 / trials as f64;
        assert!((mean - 4.0).abs() < 0.1, "mean net damage {mean}");
    }

    #[test]
    fn mortal_feel_no_pain_only_applies_to_mortal_damage() {
        let defense = DefenseProfile {
            feel_no_pain: Some(6),
            mortal_feel_no_pain: Some(5),
            ..DefenseProfile::default()
        };
        assert_eq!(defense.feel_no_pain_for(false), Some(6));
        assert_eq!(defense.feel_no_pain_for(true), Some(5));
    }
}
