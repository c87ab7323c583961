//! Attack pipeline for one engagement: select the defender's target group, then drive
//! every surviving attacker group's active weapons through hit, wound and save.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::combat::hit::resolve_hits;
use crate::combat::rng::DiceRng;
use crate::combat::save::resolve_saves;
use crate::combat::trace::{CombatEvent, TraceCollector};
use crate::combat::wound::resolve_wounds;
use crate::data::unit::Unit;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngagementResult {
    pub total_damage: u32,
    /// Damage per weapon name. Weapons shared by several groups are summed.
    pub damage_by_weapon: BTreeMap<String, u32>,
    pub models_killed: u32,
    /// Target model group, or None when the defender had nothing left alive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Resolve one full attack by `attacker` against `defender`, mutating the defender's
/// casualty state. Attacker abilities must already have been resolved for this trial.
pub fn resolve_engagement(
    attacker: &Unit,
    defender: &mut Unit,
    rng: &mut DiceRng,
    trace: &mut TraceCollector,
) -> EngagementResult {
    let mut result = EngagementResult::default();
    let Some(target_index) = defender.first_living_group() else {
        trace.record_with(|| {
            CombatEvent::new("no_target", "engagement").value("defender", defender.name.as_str())
        });
        return result;
    };

    let defense = defender.defense_profile(target_index);
    let toughness = defender.wound_toughness(target_index);
    let target = &mut defender.models[target_index];
    result.target = Some(target.name.clone());
    trace.record_with(|| {
        CombatEvent::new("target_selected", "engagement")
            .value("group", target.name.as_str())
            .value("alive", target.alive())
            .value("toughness", toughness)
            .value("save", defense.save)
            .value("invulnerable", defense.invulnerable)
            .value("feel_no_pain", defense.feel_no_pain)
    });

    for group in attacker.models.iter().filter(|group| !group.is_destroyed()) {
        let alive = group.alive();
        for weapon in attacker.active_weapons(group) {
            let Some(attacks) = weapon.attacks else {
                trace.record_with(|| {
                    CombatEvent::new("weapon_skipped", "engagement")
                        .weapon(weapon.name.as_str())
                        .value("reason", "unparsable attacks")
                });
                continue;
            };
            let per_model = attacks.roll(rng);
            let total_attacks = per_model * alive;
            trace.record_with(|| {
                CombatEvent::new("attacks_rolled", "engagement")
                    .weapon(weapon.name.as_str())
                    .value("group", group.name.as_str())
                    .value("per_model", per_model)
                    .value("alive", alive)
                    .value("total_attacks", total_attacks)
            });

            let hits = resolve_hits(total_attacks, weapon, rng, trace);
            let wounds = resolve_wounds(&hits, weapon, toughness, rng, trace);
            let saves = resolve_saves(&wounds, weapon, &defense, target, rng, trace);

            result.total_damage += saves.damage;
            result.models_killed += saves.models_slain;
            *result
                .damage_by_weapon
                .entry(weapon.name.clone())
                .or_insert(0) += saves.damage;

            trace.record_with(|| {
                CombatEvent::new("weapon_resolved", "engagement")
                    .weapon(weapon.name.as_str())
                    .value("hits", hits.hits)
                    .value("wounds", wounds.wounds)
                    .value("devastating", wounds.devastating)
                    .value("saved", saves.saved)
                    .value("damage", saves.damage)
            });
        }
    }

    tracing::debug!(
        attacker = %attacker.name,
        defender = %defender.name,
        damage = result.total_damage,
        killed = result.models_killed,
        "engagement resolved"
    );
    result
}
