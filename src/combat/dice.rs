//! Dice notation used by weapon characteristics: "3", "D6", "2D6", "D3+1".
//!
//! Parsed once at ingestion; rolled against the trial's [DiceRng].

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::combat::rng::DiceRng;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("empty dice expression")]
    Empty,
    #[error("invalid dice count '{0}'")]
    Count(String),
    #[error("invalid die size '{0}'")]
    Sides(String),
    #[error("invalid modifier '{0}'")]
    Modifier(String),
    #[error("invalid value '{0}'")]
    Value(String),
}

/// `count` dice of `sides` faces plus `modifier`. A flat value has `count == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub const fn flat(value: i32) -> Self {
        Self {
            count: 0,
            sides: 0,
            modifier: value,
        }
    }

    pub const fn dice(count: u32, sides: u32) -> Self {
        Self {
            count,
            sides,
            modifier: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.count == 0
    }

    /// Same expression with `bonus` added to the modifier.
    pub fn with_bonus(self, bonus: i32) -> Self {
        Self {
            modifier: self.modifier + bonus,
            ..self
        }
    }

    /// Roll the expression. Negative totals clamp to zero. Flat values consume no randomness.
    pub fn roll(&self, rng: &mut DiceRng) -> u32 {
        let mut total = self.modifier as i64;
        for _ in 0..self.count {
            total += rng.die(self.sides) as i64;
        }
        total.max(0) as u32
    }
}

impl FromStr for DiceExpr {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flat() {
            return write!(f, "{}", self.modifier);
        }
        if self.count == 1 {
            write!(f, "D{}", self.sides)?;
        } else {
            write!(f, "{}D{}", self.count, self.sides)?;
        }
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

impl Serialize for DiceExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a literal integer or dice notation. Whitespace and case are ignored.
pub fn parse_dice(notation: &str) -> Result<DiceExpr, DiceParseError> {
    let compact: String = notation
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if compact.is_empty() {
        return Err(DiceParseError::Empty);
    }

    let Some(d_pos) = compact.find('d') else {
        return compact
            .parse::<i32>()
            .map(DiceExpr::flat)
            .map_err(|_| DiceParseError::Value(notation.trim().to_string()));
    };

    let count_str = &compact[..d_pos];
    let count = if count_str.is_empty() {
        1
    } else {
        count_str
            .parse::<u32>()
            .map_err(|_| DiceParseError::Count(count_str.to_string()))?
    };

    let rest = &compact[d_pos + 1..];
    let (sides_str, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
        Some(pos) => {
            let raw = &rest[pos..];
            let modifier = raw
                .trim_start_matches('+')
                .parse::<i32>()
                .map_err(|_| DiceParseError::Modifier(raw.to_string()))?;
            (&rest[..pos], modifier)
        }
        None => (rest, 0),
    };

    let sides = sides_str
        .parse::<u32>()
        .map_err(|_| DiceParseError::Sides(sides_str.to_string()))?;
    if sides == 0 {
        return Err(DiceParseError::Sides(sides_str.to_string()));
    }

    Ok(DiceExpr {
        count,
        sides,
        modifier,
    })
}
