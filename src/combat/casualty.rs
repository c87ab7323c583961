//! Casualty tracking on the defender's target model group.

use crate::data::unit::ModelGroup;

/// Add `damage` to the current model's carried-over damage. When it reaches the wound
/// threshold and a model is still alive, that model dies and the carry-over resets.
/// Damage in excess of the threshold is discarded rather than spilling onto the next model.
///
/// Returns true when a model was slain.
pub fn apply_damage(group: &mut ModelGroup, damage: u32) -> bool {
    group.carry_over = group.carry_over.saturating_add(damage);
    if group.carry_over >= group.wounds && group.killed < group.count {
        group.killed += 1;
        group.carry_over = 0;
        return true;
    }
    false
}
