//! Load unit documents from a library directory by identifier. Documents are YAML
//! (`.yaml`/`.yml`) or JSON (`.json`); identifiers match file stems loosely
//! ("Intercessor Squad", "intercessor_squad" and "intercessor_squad.yaml" are equivalent).

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::combat::abilities::{Ability, AbilityKind};
use crate::data::unit::{ModelDocument, Unit, UnitDocument};
use crate::error::LoadError;

pub const DEFAULT_LIBRARY_DIR: &str = "library";

const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Normalize a string for lookup: lowercase, collapse spaces/underscores.
pub fn normalize_lookup(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' || c == '-' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn has_unit_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

pub fn load_unit_document(path: &Path) -> Result<UnitDocument, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if is_json(path) {
        serde_json::from_str(&raw).map_err(|source| LoadError::ParseJson {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&raw).map_err(|source| LoadError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Find the document for `identifier`: an existing path, a file in `library` with a known
/// extension, or a library file whose normalized stem matches.
pub fn resolve_unit_path(library: &Path, identifier: &str) -> Result<PathBuf, LoadError> {
    let direct = Path::new(identifier);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    let in_library = library.join(identifier);
    if in_library.is_file() {
        return Ok(in_library);
    }
    for ext in EXTENSIONS {
        let candidate = library.join(format!("{identifier}.{ext}"));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let wanted = normalize_lookup(
        direct
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(identifier),
    );
    let not_found = || LoadError::NotFound {
        identifier: identifier.to_string(),
        library: library.to_path_buf(),
    };
    let entries = fs::read_dir(library).map_err(|_| not_found())?;
    let mut matches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_unit_extension(path))
        .filter(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| normalize_lookup(stem) == wanted)
        })
        .collect();
    matches.sort();
    matches.into_iter().next().ok_or_else(not_found)
}

/// Load and build a runtime unit. The identifier becomes the unit's source.
pub fn load_unit(library: &Path, identifier: &str) -> Result<Unit, LoadError> {
    let path = resolve_unit_path(library, identifier)?;
    let document = load_unit_document(&path)?;
    let unit = Unit::from_document(&document, identifier)?;
    tracing::info!(
        unit = %unit.name,
        path = %path.display(),
        models = unit.models.len(),
        "loaded unit"
    );
    Ok(unit)
}

/// Merge two documents into one unit, e.g. a leader joining a bodyguard squad. Models of a
/// document carrying the Leader ability are marked as leader groups.
pub fn combine_documents(first: &UnitDocument, second: &UnitDocument) -> UnitDocument {
    let abilities: BTreeSet<String> = first
        .abilities
        .iter()
        .chain(&second.abilities)
        .cloned()
        .collect();
    let keywords: BTreeSet<String> = first
        .keywords
        .iter()
        .chain(&second.keywords)
        .cloned()
        .collect();

    UnitDocument {
        name: format!("{} + {}", first.name, second.name),
        unit_type: Some("combined".to_string()),
        cost: first.cost + second.cost,
        abilities: abilities.into_iter().collect(),
        keywords: keywords.into_iter().collect(),
        models: leader_models(first)
            .chain(leader_models(second))
            .collect(),
        loadout_options: first
            .loadout_options
            .iter()
            .chain(&second.loadout_options)
            .cloned()
            .collect(),
    }
}

fn leader_models(document: &UnitDocument) -> impl Iterator<Item = ModelDocument> + '_ {
    let leader = document
        .abilities
        .iter()
        .any(|ability| Ability::parse(ability).kind == AbilityKind::Leader);
    document.models.iter().cloned().map(move |mut model| {
        model.leader |= leader;
        model
    })
}

/// Write `document` as JSON or YAML depending on the extension of `path`.
pub fn write_unit_document(path: &Path, document: &UnitDocument) -> Result<(), LoadError> {
    let rendered = if is_json(path) {
        serde_json::to_string_pretty(document).map_err(|source| LoadError::ParseJson {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::to_string(document).map_err(|source| LoadError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })?
    };
    fs::write(path, rendered).map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lookup_collapses_separators() {
        assert_eq!(normalize_lookup("Intercessor Squad"), "intercessor_squad");
        assert_eq!(normalize_lookup("  intercessor__squad "), "intercessor_squad");
        assert_eq!(normalize_lookup("Be'lakor"), "be'lakor");
        assert_eq!(normalize_lookup("kill-team"), "kill_team");
    }

    #[test]
    fn combine_sums_cost_and_dedupes_abilities() {
        let first: UnitDocument = serde_yaml::from_str(
            r#"
name: Captain
cost: 80
abilities: [Leader, "Oath of Moment"]
models:
  - name: Captain
    count: 1
    stats: { W: 5 }
"#,
        )
        .expect("fixture parses");
        let second: UnitDocument = serde_yaml::from_str(
            r#"
name: Intercessors
cost: 90
abilities: ["Oath of Moment"]
keywords: [Infantry]
models:
  - name: Intercessor
    count: 5
    stats: { W: 2 }
"#,
        )
        .expect("fixture parses");

        let combined = combine_documents(&first, &second);
        assert_eq!(combined.name, "Captain + Intercessors");
        assert_eq!(combined.cost, 170);
        assert_eq!(combined.abilities, vec!["Leader", "Oath of Moment"]);
        assert_eq!(combined.keywords, vec!["Infantry"]);
        let names: Vec<_> = combined.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Captain", "Intercessor"]);
        let leaders: Vec<_> = combined.models.iter().map(|m| m.leader).collect();
        assert_eq!(leaders, vec![true, false]);
    }
}
