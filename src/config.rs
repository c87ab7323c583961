//! Run settings: built-in defaults, then `MATHHAMMER_*` environment variables, then CLI flags.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::combat::trace::TraceMode;
use crate::data::loader::DEFAULT_LIBRARY_DIR;
use crate::simulation::DEFAULT_TRIALS;

pub const ENV_LIBRARY: &str = "MATHHAMMER_LIBRARY";
pub const ENV_TRIALS: &str = "MATHHAMMER_TRIALS";
pub const ENV_WORKERS: &str = "MATHHAMMER_WORKERS";
pub const ENV_SEED: &str = "MATHHAMMER_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub library_dir: PathBuf,
    pub trials: u64,
    /// 0 uses every core.
    pub workers: usize,
    pub seed: Option<u64>,
    pub trace_mode: TraceMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from(DEFAULT_LIBRARY_DIR),
            trials: DEFAULT_TRIALS,
            workers: 0,
            seed: None,
            trace_mode: TraceMode::Off,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `MATHHAMMER_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            library_dir: lookup(ENV_LIBRARY)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.library_dir),
            trials: parse_or(lookup(ENV_TRIALS), ENV_TRIALS, defaults.trials),
            workers: parse_or(lookup(ENV_WORKERS), ENV_WORKERS, defaults.workers),
            seed: lookup(ENV_SEED).and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    eprintln!("invalid {ENV_SEED} '{raw}', using a random seed");
                    None
                }
            }),
            trace_mode: defaults.trace_mode,
        }
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    raw.and_then(|value| match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            eprintln!("invalid {name} '{value}', defaulting to {default}");
            None
        }
    })
    .unwrap_or(default)
}
