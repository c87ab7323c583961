use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::combat::abilities::{Ability, AbilityKind};
use crate::combat::dice::parse_dice;
use crate::combat::keywords::KeywordSet;
use crate::data::stats::{parse_int, parse_threshold};
use crate::data::unit::{UnitDocument, WeaponCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

fn stat<'a>(stats: &'a BTreeMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|alias| {
        stats
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(alias))
            .map(|(_, value)| value.as_str())
    })
}

/// Check a unit document for problems that would abort loading (errors) or silently
/// zero out part of an engagement (warnings). Never fails.
pub fn validate_unit_document(doc: &UnitDocument) -> ValidationReport {
    let mut report = ValidationReport::default();
    let unit = doc.name.as_str();

    if doc.name.trim().is_empty() {
        report.push(ValidationSeverity::Error, "unit", "unit has no name");
    }
    if doc.models.is_empty() {
        report.push(ValidationSeverity::Error, unit, "unit has no models");
    }

    for raw in &doc.abilities {
        if Ability::parse(raw).kind == AbilityKind::Other {
            report.push(
                ValidationSeverity::Info,
                unit,
                format!("ability '{raw}' has no combat effect"),
            );
        }
    }

    let mut weapon_names: Vec<String> = Vec::new();
    for model in &doc.models {
        let context = format!("{unit}/{}", model.name);
        if model.count == 0 {
            report.push(ValidationSeverity::Error, &context, "model count is zero");
        }
        match stat(&model.stats, &["W"]).and_then(parse_int) {
            Some(w) if w > 0 => {}
            _ => report.push(
                ValidationSeverity::Error,
                &context,
                "missing or non-positive wounds characteristic",
            ),
        }
        if stat(&model.stats, &["T"]).and_then(parse_int).is_none() {
            report.push(
                ValidationSeverity::Error,
                &context,
                "missing toughness; attacks against this model cannot wound",
            );
        }
        if stat(&model.stats, &["SV", "Save"]).and_then(parse_threshold).is_none() {
            report.push(
                ValidationSeverity::Error,
                &context,
                "missing armour save; every wound will go unsaved",
            );
        }

        for (key, weapon) in &model.loadouts {
            let name = weapon.name.clone().unwrap_or_else(|| key.clone());
            let weapon_context = format!("{context}/{name}");
            let chars = &weapon.characteristics;
            if stat(chars, &["A"]).and_then(|raw| parse_dice(raw).ok()).is_none() {
                report.push(
                    ValidationSeverity::Warning,
                    &weapon_context,
                    "unparsable attacks; the weapon makes no attacks",
                );
            }
            let keywords = stat(chars, &["Keywords"])
                .map(KeywordSet::parse)
                .unwrap_or_default();
            let skill_key = match WeaponCategory::from_type(&weapon.weapon_type) {
                WeaponCategory::Ranged => "BS",
                WeaponCategory::Melee => "WS",
            };
            let skill = stat(chars, &[skill_key]).and_then(parse_threshold);
            if !keywords.torrent() && skill.is_none() {
                report.push(
                    ValidationSeverity::Warning,
                    &weapon_context,
                    format!("unparsable {skill_key}; the weapon cannot hit"),
                );
            }
            if stat(chars, &["S"]).and_then(parse_int).is_none() {
                report.push(
                    ValidationSeverity::Warning,
                    &weapon_context,
                    "unparsable strength; the weapon cannot wound",
                );
            }
            if let Some(raw) = stat(chars, &["D"]) {
                if parse_dice(raw).is_err() {
                    report.push(
                        ValidationSeverity::Warning,
                        &weapon_context,
                        format!("unparsable damage '{raw}'; defaulting to 1"),
                    );
                }
            }
            for keyword in keywords.unrecognized() {
                report.push(
                    ValidationSeverity::Info,
                    &weapon_context,
                    format!("keyword '{keyword}' has no combat effect"),
                );
            }
            weapon_names.push(name.to_lowercase());
        }
    }

    for option in &doc.loadout_options {
        for weapon in &option.options {
            if !weapon_names.contains(&weapon.to_lowercase()) {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{unit}/loadout '{}'", option.name),
                    format!("weapon '{weapon}' is not carried by any model"),
                );
            }
        }
    }

    report
}
