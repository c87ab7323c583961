use serde::Serialize;

/// Natural roll at or above which a hit or wound is critical unless an ability lowers it.
pub const DEFAULT_CRITICAL: u8 = 6;

/// Per-weapon roll modifiers. Reset to [ModifierSet::baseline] before every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModifierSet {
    pub reroll_hits: bool,
    pub reroll_hit_ones: bool,
    pub reroll_wounds: bool,
    pub reroll_wound_ones: bool,
    /// Positive values make hitting easier.
    pub hit_mod: i32,
    /// Positive values make wounding easier.
    pub wound_mod: i32,
    pub critical_hit: u8,
    pub critical_wound: u8,
    /// Reroll successful non-critical hits looking for a critical.
    pub fish_critical_hits: bool,
}

impl ModifierSet {
    pub const fn baseline() -> Self {
        Self {
            reroll_hits: false,
            reroll_hit_ones: false,
            reroll_wounds: false,
            reroll_wound_ones: false,
            hit_mod: 0,
            wound_mod: 0,
            critical_hit: DEFAULT_CRITICAL,
            critical_wound: DEFAULT_CRITICAL,
            fish_critical_hits: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::baseline();
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::baseline()
    }

    /// Whether a failed hit roll of `roll` may be rerolled.
    pub fn may_reroll_hit(&self, roll: u8) -> bool {
        self.reroll_hits || (self.reroll_hit_ones && roll == 1)
    }

    /// Whether a failed wound roll of `roll` may be rerolled.
    pub fn may_reroll_wound(&self, roll: u8) -> bool {
        self.reroll_wounds || (self.reroll_wound_ones && roll == 1)
    }
}

impl Default for ModifierSet {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Clamp a modified roll target into the 2+..6+ band.
pub fn clamp_threshold(value: i32) -> u8 {
    value.clamp(2, 6) as u8
}
