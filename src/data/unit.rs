//! Unit documents (as produced by the catalog ingestion tool) and the runtime unit model
//! the combat engine mutates during a trial.
//!
//! A [Unit] keeps a shared, read-only baseline captured at load time. [Unit::reload]
//! restores casualties, wound thresholds, weapon characteristics, modifier sets and the
//! ability list from it between trials without rebuilding the structure.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::combat::abilities::{Ability, AbilityKind};
use crate::combat::dice::{parse_dice, DiceExpr};
use crate::combat::keywords::KeywordSet;
use crate::combat::modifiers::ModifierSet;
use crate::combat::save::DefenseProfile;
use crate::data::stats::{parse_int, parse_penetration, parse_threshold};
use crate::error::{LoadError, SimulationError};

// --- Document schema -------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDocument {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub cost: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub models: Vec<ModelDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loadout_options: Vec<LoadoutOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub name: String,
    pub count: u32,
    /// Lower values are targeted and resolved first. Absent keeps document order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Leader models attached to a bodyguard unit; wounds use the bodyguard's toughness.
    #[serde(default, skip_serializing_if = "is_false")]
    pub leader: bool,
    #[serde(default, deserialize_with = "scalar_map")]
    pub stats: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_loadout: Vec<String>,
    #[serde(default)]
    pub loadouts: BTreeMap<String, WeaponDocument>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub weapon_type: String,
    #[serde(default, deserialize_with = "scalar_map")]
    pub characteristics: BTreeMap<String, String>,
}

/// Named weapon-selection group ("Option 1: bolt rifle + grenade launcher").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutOption {
    pub name: String,
    #[serde(rename = "type", default)]
    pub option_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Stat lines arrive as a mix of strings ("3+") and bare numbers (4); keep them all as text.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarMapVisitor;

    impl<'de> Visitor<'de> for ScalarMapVisitor {
        type Value = BTreeMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of scalar characteristics")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut out = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, Scalar>()? {
                out.insert(key, value.into_string());
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ScalarMapVisitor)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null(()),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Text(v) => v,
            Self::Null(()) => String::new(),
        }
    }
}

/// Case-insensitive lookup into a characteristic map, trying each alias in turn.
fn characteristic<'a>(map: &'a BTreeMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|alias| {
        map.iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(alias))
            .map(|(_, value)| value.as_str())
    })
}

// --- Runtime model ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    Ranged,
    Melee,
}

impl WeaponCategory {
    pub fn from_type(raw: &str) -> Self {
        if raw.to_lowercase().contains("melee") {
            Self::Melee
        } else {
            Self::Ranged
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponProfile {
    pub name: String,
    pub category: WeaponCategory,
    pub characteristics: BTreeMap<String, String>,
    /// None when the attacks characteristic is missing or garbled; the weapon makes no attacks.
    pub attacks: Option<DiceExpr>,
    /// BS for ranged weapons, WS for melee. None means the weapon cannot hit.
    pub skill: Option<u8>,
    pub strength: Option<i32>,
    pub armor_penetration: i32,
    pub damage: DiceExpr,
    pub keywords: KeywordSet,
    pub modifiers: ModifierSet,
}

impl WeaponProfile {
    pub fn from_document(key: &str, doc: &WeaponDocument) -> Self {
        let chars = &doc.characteristics;
        let category = WeaponCategory::from_type(&doc.weapon_type);
        let skill_key: &[&str] = match category {
            WeaponCategory::Ranged => &["BS"],
            WeaponCategory::Melee => &["WS"],
        };
        let name = doc.name.clone().unwrap_or_else(|| key.to_string());

        let attacks = characteristic(chars, &["A"]).and_then(|raw| parse_dice(raw).ok());
        let damage = characteristic(chars, &["D"])
            .and_then(|raw| parse_dice(raw).ok())
            .unwrap_or(DiceExpr::flat(1));
        let armor_penetration = characteristic(chars, &["AP"])
            .and_then(parse_penetration)
            .unwrap_or(0);
        let keywords = characteristic(chars, &["Keywords"])
            .map(KeywordSet::parse)
            .unwrap_or_default();

        let weapon = Self {
            category,
            characteristics: chars.clone(),
            attacks,
            skill: characteristic(chars, skill_key).and_then(parse_threshold),
            strength: characteristic(chars, &["S"]).and_then(parse_int),
            armor_penetration,
            damage,
            keywords,
            modifiers: ModifierSet::baseline(),
            name,
        };
        if weapon.attacks.is_none() || weapon.skill.is_none() || weapon.strength.is_none() {
            tracing::warn!(
                weapon = %weapon.name,
                attacks = weapon.attacks.is_some(),
                skill = weapon.skill.is_some(),
                strength = weapon.strength.is_some(),
                "weapon has unparsable characteristics and will be skipped where they are needed"
            );
        }
        weapon
    }

    pub fn is_melee(&self) -> bool {
        self.category == WeaponCategory::Melee
    }

    pub fn is_ranged(&self) -> bool {
        self.category == WeaponCategory::Ranged
    }

    pub fn is_twin_linked(&self) -> bool {
        self.keywords.twin_linked() || self.name.to_lowercase().contains("twin-linked")
    }

    fn restore_from(&mut self, baseline: &WeaponProfile) {
        self.attacks = baseline.attacks;
        self.keywords.clone_from(&baseline.keywords);
        self.modifiers.reset();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub toughness: Option<i32>,
    pub save: Option<u8>,
    pub invulnerable: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelGroup {
    pub name: String,
    pub count: u32,
    pub killed: u32,
    /// Wounds per model.
    pub wounds: u32,
    /// Unsaved damage on the current model that has not yet killed it.
    pub carry_over: u32,
    pub leader: bool,
    pub stats: ModelStats,
    pub base_loadout: Vec<String>,
    pub weapons: Vec<WeaponProfile>,
}

impl ModelGroup {
    pub fn from_document(unit: &str, doc: &ModelDocument) -> Result<Self, LoadError> {
        if doc.count == 0 {
            return Err(LoadError::Invalid {
                unit: unit.to_string(),
                reason: format!("model '{}' has a count of zero", doc.name),
            });
        }
        let wounds = characteristic(&doc.stats, &["W"])
            .and_then(parse_int)
            .filter(|w| *w > 0)
            .ok_or_else(|| LoadError::Invalid {
                unit: unit.to_string(),
                reason: format!("model '{}' has no usable wounds characteristic", doc.name),
            })?;

        let stats = ModelStats {
            toughness: characteristic(&doc.stats, &["T"]).and_then(parse_int),
            save: characteristic(&doc.stats, &["SV", "Save"]).and_then(parse_threshold),
            invulnerable: characteristic(&doc.stats, &["ISV", "InvSv", "Invulnerable"])
                .and_then(parse_threshold),
        };

        let weapons = doc
            .loadouts
            .iter()
            .map(|(key, weapon)| WeaponProfile::from_document(key, weapon))
            .collect();

        Ok(Self {
            name: doc.name.clone(),
            count: doc.count,
            killed: 0,
            wounds: wounds as u32,
            carry_over: 0,
            leader: doc.leader,
            stats,
            base_loadout: doc.base_loadout.clone(),
            weapons,
        })
    }

    pub fn alive(&self) -> u32 {
        self.count.saturating_sub(self.killed)
    }

    pub fn is_destroyed(&self) -> bool {
        self.killed >= self.count
    }

    fn restore_from(&mut self, baseline: &ModelGroup) {
        self.count = baseline.count;
        self.wounds = baseline.wounds;
        self.killed = 0;
        self.carry_over = 0;
        for (weapon, base) in self.weapons.iter_mut().zip(&baseline.weapons) {
            weapon.restore_from(base);
        }
    }
}

#[derive(Debug)]
struct UnitBaseline {
    abilities: Vec<Ability>,
    models: Vec<ModelGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub name: String,
    pub cost: u32,
    /// Identifier the unit was loaded from.
    pub source: String,
    pub abilities: Vec<Ability>,
    pub keywords: Vec<String>,
    /// Target-priority and resolution order; fixed at load time.
    pub models: Vec<ModelGroup>,
    pub loadout_options: Vec<LoadoutOption>,
    pub active_loadout: Option<String>,
    /// Set once the ability resolver has run for the current trial.
    #[serde(skip)]
    pub abilities_resolved: bool,
    #[serde(skip)]
    baseline: Arc<UnitBaseline>,
}

impl Unit {
    pub fn from_document(doc: &UnitDocument, source: impl Into<String>) -> Result<Self, LoadError> {
        if doc.models.is_empty() {
            return Err(LoadError::Invalid {
                unit: doc.name.clone(),
                reason: "unit has no models".to_string(),
            });
        }

        let mut ordered: Vec<&ModelDocument> = doc.models.iter().collect();
        ordered.sort_by_key(|model| model.priority.unwrap_or(i32::MAX));
        let models = ordered
            .into_iter()
            .map(|model| ModelGroup::from_document(&doc.name, model))
            .collect::<Result<Vec<_>, _>>()?;
        let abilities: Vec<Ability> = doc.abilities.iter().map(|a| Ability::parse(a)).collect();

        Ok(Self {
            name: doc.name.clone(),
            cost: doc.cost,
            source: source.into(),
            keywords: doc.keywords.clone(),
            loadout_options: doc.loadout_options.clone(),
            active_loadout: None,
            abilities_resolved: false,
            baseline: Arc::new(UnitBaseline {
                abilities: abilities.clone(),
                models: models.clone(),
            }),
            abilities,
            models,
        })
    }

    /// Restore the trial-start state: no casualties, baseline counts, wounds, weapon
    /// characteristics and modifiers, and the original ability list.
    pub fn reload(&mut self) {
        let baseline = Arc::clone(&self.baseline);
        self.abilities.clone_from(&baseline.abilities);
        for (group, base) in self.models.iter_mut().zip(&baseline.models) {
            group.restore_from(base);
        }
        self.abilities_resolved = false;
    }

    pub fn has_ability(&self, kind: AbilityKind) -> bool {
        self.abilities.iter().any(|ability| ability.kind == kind)
    }

    /// Best (lowest) threshold among abilities of `kind`.
    pub fn ability_threshold(&self, kind: AbilityKind) -> Option<u8> {
        self.abilities
            .iter()
            .filter(|ability| ability.kind == kind)
            .filter_map(|ability| ability.parameter)
            .min()
    }

    /// Remove the first ability named exactly `name`. Returns whether one was removed.
    pub fn remove_ability(&mut self, name: &str) -> bool {
        match self.abilities.iter().position(|ability| ability.name == name) {
            Some(index) => {
                self.abilities.remove(index);
                true
            }
            None => false,
        }
    }

    /// Restrict every model group to the weapons of the named loadout option plus the
    /// group's base loadout.
    pub fn select_loadout(&mut self, name: &str) -> Result<(), SimulationError> {
        let found = self
            .loadout_options
            .iter()
            .any(|option| option.name.eq_ignore_ascii_case(name));
        if !found {
            return Err(SimulationError::UnknownLoadout {
                unit: self.name.clone(),
                loadout: name.to_string(),
            });
        }
        self.active_loadout = Some(name.to_string());
        Ok(())
    }

    /// Weapons `group` fires this trial: all of them, or only the active loadout's selection.
    pub fn active_weapons<'a>(
        &'a self,
        group: &'a ModelGroup,
    ) -> impl Iterator<Item = &'a WeaponProfile> + 'a {
        let selection = self.active_loadout.as_deref().and_then(|active| {
            self.loadout_options
                .iter()
                .find(|option| option.name.eq_ignore_ascii_case(active))
        });
        group.weapons.iter().filter(move |weapon| match selection {
            None => true,
            Some(option) => {
                let listed = |names: &[String]| {
                    names
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&weapon.name))
                };
                listed(&option.options) || listed(&group.base_loadout)
            }
        })
    }

    /// Names of every weapon this unit can fire with the current loadout, deduplicated, in order.
    pub fn weapon_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for group in &self.models {
            for weapon in self.active_weapons(group) {
                if !names.contains(&weapon.name) {
                    names.push(weapon.name.clone());
                }
            }
        }
        names
    }

    /// Index of the first model group that still has living models.
    pub fn first_living_group(&self) -> Option<usize> {
        self.models.iter().position(|group| !group.is_destroyed())
    }

    /// Toughness wounds are allocated against when group `index` is targeted: the highest
    /// toughness among living non-leader groups, or the target's own once only leaders remain.
    pub fn wound_toughness(&self, index: usize) -> Option<i32> {
        self.models
            .iter()
            .filter(|group| !group.leader && !group.is_destroyed())
            .filter_map(|group| group.stats.toughness)
            .max()
            .or_else(|| self.models.get(index).and_then(|group| group.stats.toughness))
    }

    /// Defensive characteristics of model group `index` combined with unit-wide abilities.
    pub fn defense_profile(&self, index: usize) -> DefenseProfile {
        let stats = self.models.get(index).map(|g| g.stats).unwrap_or_default();
        let invulnerable = [
            stats.invulnerable,
            self.ability_threshold(AbilityKind::InvulnerableSave),
        ]
        .into_iter()
        .flatten()
        .min();
        DefenseProfile {
            save: stats.save,
            invulnerable,
            feel_no_pain: self.ability_threshold(AbilityKind::FeelNoPain),
            mortal_feel_no_pain: self.ability_threshold(AbilityKind::MortalFeelNoPain),
            halve_damage: self.has_ability(AbilityKind::HalveDamage),
        }
    }

    pub fn alive_models(&self) -> u32 {
        self.models.iter().map(ModelGroup::alive).sum()
    }

    pub fn total_killed(&self) -> u32 {
        self.models.iter().map(|group| group.killed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUAD: &str = r#"
name: Test Squad
cost: 90
abilities: ["Oath of Moment", "Feel No Pain (5+)"]
models:
  - name: Sergeant
    count: 1
    priority: 2
    stats: { T: 4, SV: "3+", W: 2 }
    loadouts:
      Power fist:
        type: Melee Weapons
        characteristics: { A: 3, WS: "3+", S: 8, AP: "-2", D: 2 }
  - name: Trooper
    count: 4
    priority: 1
    stats: { T: 4, SV: "3+", W: "2" }
    loadouts:
      Bolt rifle:
        type: Ranged Weapons
        characteristics: { A: 2, BS: "3+", S: 4, AP: "-1", D: 1, Keywords: "Assault, Heavy" }
"#;

    fn squad() -> Unit {
        let doc: UnitDocument = serde_yaml::from_str(SQUAD).expect("fixture parses");
        Unit::from_document(&doc, "test_squad").expect("fixture is valid")
    }

    #[test]
    fn models_are_ordered_by_priority() {
        let unit = squad();
        let names: Vec<_> = unit.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Trooper", "Sergeant"]);
    }

    #[test]
    fn numeric_and_string_stats_parse_alike() {
        let unit = squad();
        let trooper = &unit.models[0];
        assert_eq!(trooper.wounds, 2);
        assert_eq!(trooper.stats.toughness, Some(4));
        assert_eq!(trooper.stats.save, Some(3));
        assert_eq!(trooper.stats.invulnerable, None);

        let rifle = &trooper.weapons[0];
        assert_eq!(rifle.attacks, Some(DiceExpr::flat(2)));
        assert_eq!(rifle.skill, Some(3));
        assert_eq!(rifle.armor_penetration, 1);
        assert!(rifle.keywords.heavy());
        assert!(rifle.is_ranged());

        let fist = &unit.models[1].weapons[0];
        assert!(fist.is_melee());
        assert_eq!(fist.skill, Some(3));
        assert_eq!(fist.damage, DiceExpr::flat(2));
    }

    #[test]
    fn reload_restores_casualties_modifiers_and_abilities() {
        let mut unit = squad();
        unit.models[0].killed = 3;
        unit.models[0].carry_over = 1;
        unit.models[0].weapons[0].modifiers.reroll_hits = true;
        unit.models[0].weapons[0].modifiers.critical_hit = 5;
        unit.models[0].weapons[0].attacks = Some(DiceExpr::flat(4));
        unit.abilities.push(Ability::parse("Charged"));
        unit.abilities_resolved = true;

        unit.reload();

        assert_eq!(unit.models[0].killed, 0);
        assert_eq!(unit.models[0].carry_over, 0);
        assert!(unit.models[0].weapons[0].modifiers.is_baseline());
        assert_eq!(unit.models[0].weapons[0].attacks, Some(DiceExpr::flat(2)));
        assert!(!unit.has_ability(AbilityKind::Charged));
        assert!(!unit.abilities_resolved);
    }

    #[test]
    fn zero_count_model_is_rejected() {
        let doc: UnitDocument = serde_yaml::from_str(
            "name: Empty\nmodels:\n  - name: Ghost\n    count: 0\n    stats: { W: 1 }\n",
        )
        .expect("fixture parses");
        assert!(matches!(
            Unit::from_document(&doc, "empty"),
            Err(LoadError::Invalid { .. })
        ));
    }

    #[test]
    fn unit_without_models_is_rejected() {
        let doc: UnitDocument = serde_yaml::from_str("name: Nobody\n").expect("fixture parses");
        assert!(Unit::from_document(&doc, "nobody").is_err());
    }

    #[test]
    fn feel_no_pain_flows_into_the_defense_profile() {
        let unit = squad();
        let defense = unit.defense_profile(0);
        assert_eq!(defense.feel_no_pain, Some(5));
        assert_eq!(defense.save, Some(3));
        assert!(!defense.halve_damage);
    }

    #[test]
    fn remove_ability_matches_exact_names() {
        let mut unit = squad();
        assert!(unit.remove_ability("Oath of Moment"));
        assert!(!unit.remove_ability("Oath of Moment"));
        assert!(!unit.has_ability(AbilityKind::OathOfMoment));
    }

    #[test]
    fn unknown_loadout_is_an_error() {
        let mut unit = squad();
        assert!(matches!(
            unit.select_loadout("Heavy Bolter"),
            Err(SimulationError::UnknownLoadout { .. })
        ));
    }
}
