//! Weapon keyword table. Free-form keyword strings are resolved once, at ingestion,
//! into [WeaponKeyword] values; the dice stages only ever look at the typed set.

use serde::Serialize;

use crate::combat::dice::{parse_dice, DiceExpr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "parameter", rename_all = "snake_case")]
pub enum WeaponKeyword {
    Torrent,
    /// Extra hits per critical hit.
    SustainedHits(DiceExpr),
    LethalHits,
    DevastatingWounds,
    TwinLinked,
    Heavy,
    /// Extra attacks at half range.
    RapidFire(u32),
    Lance,
    Other(String),
}

impl WeaponKeyword {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();

        if lower == "torrent" {
            return Self::Torrent;
        }
        if lower == "lethal hits" {
            return Self::LethalHits;
        }
        if lower == "devastating wounds" {
            return Self::DevastatingWounds;
        }
        if lower == "twin-linked" || lower == "twin linked" {
            return Self::TwinLinked;
        }
        if lower == "heavy" {
            return Self::Heavy;
        }
        if lower == "lance" {
            return Self::Lance;
        }
        if let Some(rest) = lower.strip_prefix("sustained hits") {
            let amount = parse_dice(rest).unwrap_or(DiceExpr::flat(1));
            return Self::SustainedHits(amount);
        }
        if let Some(rest) = lower.strip_prefix("rapid fire") {
            if let Ok(n) = rest.trim().parse::<u32>() {
                return Self::RapidFire(n);
            }
        }
        Self::Other(trimmed.to_string())
    }
}

/// Parsed keywords of one weapon, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordSet(Vec<WeaponKeyword>);

impl KeywordSet {
    /// Parse a comma-separated keyword characteristic ("Rapid Fire 1, Lethal Hits").
    /// Dashes and empty entries are ignored.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty() && *entry != "-")
                .map(WeaponKeyword::parse)
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponKeyword> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, keyword: &WeaponKeyword) -> bool {
        self.0.contains(keyword)
    }

    /// Adds `keyword` unless an equal entry exists. Returns whether it was added.
    pub fn insert(&mut self, keyword: WeaponKeyword) -> bool {
        if self.contains(&keyword) {
            return false;
        }
        self.0.push(keyword);
        true
    }

    pub fn torrent(&self) -> bool {
        self.contains(&WeaponKeyword::Torrent)
    }

    pub fn lethal_hits(&self) -> bool {
        self.contains(&WeaponKeyword::LethalHits)
    }

    pub fn devastating_wounds(&self) -> bool {
        self.contains(&WeaponKeyword::DevastatingWounds)
    }

    pub fn twin_linked(&self) -> bool {
        self.contains(&WeaponKeyword::TwinLinked)
    }

    pub fn heavy(&self) -> bool {
        self.contains(&WeaponKeyword::Heavy)
    }

    pub fn lance(&self) -> bool {
        self.contains(&WeaponKeyword::Lance)
    }

    pub fn sustained_hits(&self) -> Option<DiceExpr> {
        self.0.iter().find_map(|keyword| match keyword {
            WeaponKeyword::SustainedHits(amount) => Some(*amount),
            _ => None,
        })
    }

    pub fn rapid_fire(&self) -> Option<u32> {
        self.0.iter().find_map(|keyword| match keyword {
            WeaponKeyword::RapidFire(n) => Some(*n),
            _ => None,
        })
    }

    /// Keywords that did not resolve to a known rule.
    pub fn unrecognized(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|keyword| match keyword {
            WeaponKeyword::Other(name) => Some(name.as_str()),
            _ => None,
        })
    }
}
