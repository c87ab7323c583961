//! Error types shared by the loader, the harness and the CSV export.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a combatant from its unit document. Fatal for a run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read unit document '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse unit YAML '{}': {source}", path.display())]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse unit JSON '{}': {source}", path.display())]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write unit document '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unit '{identifier}' not found in library '{}'", library.display())]
    NotFound { identifier: String, library: PathBuf },

    #[error("unit '{unit}' is invalid: {reason}")]
    Invalid { unit: String, reason: String },
}

/// Failure while writing the per-trial sample.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to create '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("unit '{unit}' has no loadout option named '{loadout}'")]
    UnknownLoadout { unit: String, loadout: String },
}
