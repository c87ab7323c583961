pub mod export_csv;
pub mod monte_carlo;
pub mod summary;

pub use export_csv::{write_report_csv, write_trials};
pub use monte_carlo::{
    run_simulation, run_trial, SimulationConfig, SimulationReport, TrialOutcome, DEFAULT_TRIALS,
};
pub use summary::{approximate_percentile, summarize, summarize_sample, DamageSummary};
