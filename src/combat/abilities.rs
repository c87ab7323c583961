//! Unit abilities and the pre-engagement modifier resolver.
//!
//! Ability text is parsed once into an [Ability] record (`{kind, parameter}`). The resolver
//! is a name-keyed rule table: each recognised kind mutates the attacker's weapon
//! [ModifierSet](crate::combat::modifiers::ModifierSet)s, keywords or characteristics.
//! Unrecognised abilities are kept as [AbilityKind::Other] and ignored.

use serde::Serialize;

use crate::combat::keywords::WeaponKeyword;
use crate::combat::trace::{CombatEvent, TraceCollector};
use crate::data::stats::embedded_threshold;
use crate::data::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Reroll every failed hit.
    OathOfMoment,
    /// Heavy weapons hit more easily.
    Stationary,
    /// Rapid Fire weapons gain their bonus attacks.
    RapidFireDistance,
    /// Melee weapons gain Lethal Hits and Lance; the unit counts as having charged.
    RedRampage,
    CritHitFish,
    /// Defender: ranged attacks against this unit are harder to hit.
    Stealth,
    Charged,
    FeelNoPain,
    /// Feel no pain that only applies to mortal (devastating) damage.
    MortalFeelNoPain,
    InvulnerableSave,
    /// Halve incoming damage, rounding up.
    HalveDamage,
    Leader,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ability {
    pub name: String,
    pub kind: AbilityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<u8>,
}

impl Ability {
    pub fn parse(raw: &str) -> Self {
        let name = raw.trim().to_string();
        let lower = name.to_lowercase();

        let kind = if lower.starts_with("oath of moment") {
            AbilityKind::OathOfMoment
        } else if lower.starts_with("stationary") {
            AbilityKind::Stationary
        } else if lower.starts_with("rapid fire distance") {
            AbilityKind::RapidFireDistance
        } else if lower.starts_with("red rampage") {
            AbilityKind::RedRampage
        } else if lower == "crithitfish" {
            AbilityKind::CritHitFish
        } else if lower.starts_with("stealth") {
            AbilityKind::Stealth
        } else if lower == "charged" {
            AbilityKind::Charged
        } else if lower.contains("feel no pain") {
            if lower.contains("mortal") {
                AbilityKind::MortalFeelNoPain
            } else {
                AbilityKind::FeelNoPain
            }
        } else if lower.contains("invulnerable save") {
            AbilityKind::InvulnerableSave
        } else if lower.contains("necrodermis") || lower.starts_with("halve damage") {
            AbilityKind::HalveDamage
        } else if lower == "leader" {
            AbilityKind::Leader
        } else {
            AbilityKind::Other
        };

        let parameter = match kind {
            AbilityKind::FeelNoPain
            | AbilityKind::MortalFeelNoPain
            | AbilityKind::InvulnerableSave => embedded_threshold(&name),
            _ => None,
        };

        Self {
            name,
            kind,
            parameter,
        }
    }
}

/// Apply attacker and defender abilities to the attacker's weapons for this trial.
///
/// Runs at most once per trial: a second call before [Unit::reload] does nothing and
/// returns false.
pub fn resolve_abilities(attacker: &mut Unit, defender: &Unit, trace: &mut TraceCollector) -> bool {
    if attacker.abilities_resolved {
        return false;
    }

    if attacker.has_ability(AbilityKind::RedRampage)
        && !attacker.has_ability(AbilityKind::Charged)
    {
        attacker.abilities.push(Ability::parse("Charged"));
        trace.record_with(|| {
            CombatEvent::new("ability_applied", "abilities")
                .value("ability", "Red Rampage")
                .value("effect", "charged")
        });
    }

    let oath = attacker.has_ability(AbilityKind::OathOfMoment);
    let stationary = attacker.has_ability(AbilityKind::Stationary);
    let rapid_fire_distance = attacker.has_ability(AbilityKind::RapidFireDistance);
    let red_rampage = attacker.has_ability(AbilityKind::RedRampage);
    let fish = attacker.has_ability(AbilityKind::CritHitFish);
    let charged = attacker.has_ability(AbilityKind::Charged);
    let stealth = defender.has_ability(AbilityKind::Stealth);

    for weapon in attacker.models.iter_mut().flat_map(|group| group.weapons.iter_mut()) {
        let before = weapon.modifiers;

        if red_rampage && weapon.is_melee() {
            weapon.keywords.insert(WeaponKeyword::LethalHits);
            weapon.keywords.insert(WeaponKeyword::Lance);
        }
        if oath {
            weapon.modifiers.reroll_hits = true;
        }
        if fish {
            weapon.modifiers.fish_critical_hits = true;
        }
        if stationary && weapon.keywords.heavy() {
            weapon.modifiers.hit_mod += 1;
        }
        if rapid_fire_distance {
            if let (Some(bonus), Some(attacks)) = (weapon.keywords.rapid_fire(), weapon.attacks) {
                weapon.attacks = Some(attacks.with_bonus(bonus as i32));
                trace.record_with(|| {
                    CombatEvent::new("ability_applied", "abilities")
                        .weapon(weapon.name.as_str())
                        .value("ability", "Rapid Fire Distance")
                        .value("bonus_attacks", bonus)
                });
            }
        }
        if stealth && weapon.is_ranged() {
            weapon.modifiers.hit_mod -= 1;
        }
        if weapon.is_twin_linked() {
            weapon.modifiers.reroll_wounds = true;
        }
        if charged && weapon.keywords.lance() && weapon.modifiers.wound_mod == 0 {
            weapon.modifiers.wound_mod = 1;
        }

        if weapon.modifiers != before {
            let after = weapon.modifiers;
            trace.record_with(|| {
                CombatEvent::new("modifiers_resolved", "abilities")
                    .weapon(weapon.name.as_str())
                    .value("reroll_hits", after.reroll_hits)
                    .value("reroll_wounds", after.reroll_wounds)
                    .value("hit_mod", after.hit_mod)
                    .value("wound_mod", after.wound_mod)
                    .value("fish_critical_hits", after.fish_critical_hits)
            });
        }
    }

    attacker.abilities_resolved = true;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameterised_abilities() {
        let fnp = Ability::parse("Feel No Pain (5+)");
        assert_eq!(fnp.kind, AbilityKind::FeelNoPain);
        assert_eq!(fnp.parameter, Some(5));

        let mortal = Ability::parse("Feel No Pain 6+ against mortal wounds");
        assert_eq!(mortal.kind, AbilityKind::MortalFeelNoPain);
        assert_eq!(mortal.parameter, Some(6));

        let invuln = Ability::parse("Invulnerable Save (4+)");
        assert_eq!(invuln.kind, AbilityKind::InvulnerableSave);
        assert_eq!(invuln.parameter, Some(4));
    }

    #[test]
    fn rule_names_match_case_insensitively() {
        assert_eq!(Ability::parse("OATH OF MOMENT").kind, AbilityKind::OathOfMoment);
        assert_eq!(Ability::parse("stealth").kind, AbilityKind::Stealth);
        assert_eq!(Ability::parse("Red Rampage").kind, AbilityKind::RedRampage);
        assert_eq!(Ability::parse("crithitfish").kind, AbilityKind::CritHitFish);
        assert_eq!(Ability::parse("Necrodermis").kind, AbilityKind::HalveDamage);
    }

    #[test]
    fn curly_quotes_and_symbols_do_not_break_parsing() {
        let invuln = Ability::parse("Invulnerable Save \u{2018}4+\u{2019}");
        assert_eq!(invuln.kind, AbilityKind::InvulnerableSave);
        assert_eq!(invuln.parameter, Some(4));
        assert_eq!(Ability::parse("Feel No Pain \u{2265}5+").parameter, Some(5));
    }

    #[test]
    fn unknown_abilities_are_other_without_parameter() {
        let ability = Ability::parse("Deep Strike");
        assert_eq!(ability.kind, AbilityKind::Other);
        assert_eq!(ability.parameter, None);
        assert_eq!(ability.name, "Deep Strike");
    }
}
