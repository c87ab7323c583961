use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::combat::trace::TraceMode;
use crate::config::Settings;
use crate::data::loader::{
    combine_documents, load_unit, load_unit_document, resolve_unit_path, write_unit_document,
};
use crate::data::validate::{validate_unit_document, ValidationSeverity};
use crate::error::SimulationError;
use crate::parallel::WorkerPool;
use crate::simulation::{run_simulation, write_report_csv, SimulationConfig, SimulationReport};

#[derive(Debug, Parser)]
#[command(
    name = "mathhammer",
    version,
    about = "Monte Carlo damage estimates for tabletop engagements"
)]
pub struct Cli {
    /// Directory holding unit documents [env: MATHHAMMER_LIBRARY]
    #[arg(long, global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run repeated engagements and print the damage summary
    Simulate(SimulateArgs),
    /// Check unit documents for problems
    Validate {
        #[arg(required = true)]
        units: Vec<String>,
    },
    /// Merge two unit documents into one (e.g. a leader joining a squad)
    Combine {
        first: String,
        second: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a parsed unit as JSON
    Inspect { unit: String },
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    pub attacker: String,
    pub defender: String,
    /// Number of trials [env: MATHHAMMER_TRIALS]
    #[arg(short = 'n', long)]
    pub trials: Option<u64>,
    /// Base seed for reproducible runs [env: MATHHAMMER_SEED]
    #[arg(long)]
    pub seed: Option<u64>,
    /// Worker threads, 0 for all cores [env: MATHHAMMER_WORKERS]
    #[arg(long)]
    pub workers: Option<usize>,
    /// Attacker loadout option to fire
    #[arg(long)]
    pub loadout: Option<String>,
    /// Write one row per trial to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Include the dice event stream of the first trial
    #[arg(long)]
    pub trace: bool,
    /// Tab-separated summary instead of JSON
    #[arg(long)]
    pub table: bool,
    /// Run every trial on the calling thread
    #[arg(long)]
    pub sequential: bool,
}

impl SimulateArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(trials) = self.trials {
            settings.trials = trials;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if self.trace {
            settings.trace_mode = TraceMode::Events;
        }
    }
}

pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 2 } else { 0 };
        }
    };

    let mut settings = Settings::from_env();
    if let Some(library) = cli.library {
        settings.library_dir = library;
    }

    match cli.command {
        Command::Simulate(args) => {
            args.apply(&mut settings);
            handle_simulate(&args, &settings)
        }
        Command::Validate { units } => handle_validate(&units, &settings),
        Command::Combine {
            first,
            second,
            output,
        } => handle_combine(&first, &second, &output, &settings),
        Command::Inspect { unit } => handle_inspect(&unit, &settings),
    }
}

fn simulate(args: &SimulateArgs, settings: &Settings) -> Result<SimulationReport, SimulationError> {
    let mut attacker = load_unit(&settings.library_dir, &args.attacker)?;
    let defender = load_unit(&settings.library_dir, &args.defender)?;
    if let Some(loadout) = &args.loadout {
        attacker.select_loadout(loadout)?;
    }

    let config = SimulationConfig {
        trials: settings.trials,
        seed: settings.seed,
        trace_mode: settings.trace_mode,
        parallel: !args.sequential,
        pool: WorkerPool::with_workers(settings.workers),
    };
    let report = run_simulation(&attacker, &defender, &config);
    if let Some(path) = &args.csv {
        write_report_csv(path, &report)?;
    }
    Ok(report)
}

fn handle_simulate(args: &SimulateArgs, settings: &Settings) -> i32 {
    let report = match simulate(args, settings) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if args.table {
        println!("attacker\tdefender\ttrials\tseed\tmean\tp68\tp95\tmin\tmax");
        println!(
            "{}\t{}\t{}\t{}\t{:.3}\t{}\t{}\t{}\t{}",
            report.attacker,
            report.defender,
            report.trials,
            report.seed,
            report.summary.mean,
            report.summary.percentile_68,
            report.summary.percentile_95,
            report.summary.min,
            report.summary.max
        );
        return 0;
    }

    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize simulation result: {err}");
            1
        }
    }
}

fn handle_validate(units: &[String], settings: &Settings) -> i32 {
    let mut failed = false;
    for identifier in units {
        let document = match resolve_unit_path(&settings.library_dir, identifier)
            .and_then(|path| load_unit_document(&path))
        {
            Ok(document) => document,
            Err(err) => {
                eprintln!("validation failed: {err}");
                failed = true;
                continue;
            }
        };
        let report = validate_unit_document(&document);
        for diagnostic in &report.diagnostics {
            println!("{diagnostic}");
        }
        println!(
            "{identifier}: {} error(s), {} warning(s)",
            report.count(ValidationSeverity::Error),
            report.count(ValidationSeverity::Warning)
        );
        failed |= report.has_errors();
    }
    i32::from(failed)
}

fn handle_combine(first: &str, second: &str, output: &Path, settings: &Settings) -> i32 {
    let load = |identifier: &str| {
        resolve_unit_path(&settings.library_dir, identifier)
            .and_then(|path| load_unit_document(&path))
    };
    let result = load(first)
        .and_then(|a| load(second).map(|b| combine_documents(&a, &b)))
        .and_then(|combined| write_unit_document(output, &combined).map(|()| combined));
    match result {
        Ok(combined) => {
            println!(
                "combined '{}' ({} models, cost {}) -> {}",
                combined.name,
                combined.models.len(),
                combined.cost,
                output.display()
            );
            0
        }
        Err(err) => {
            eprintln!("combine failed: {err}");
            1
        }
    }
}

fn handle_inspect(identifier: &str, settings: &Settings) -> i32 {
    let unit = match load_unit(&settings.library_dir, identifier) {
        Ok(unit) => unit,
        Err(err) => {
            eprintln!("inspect failed: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&unit) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize unit: {err}");
            1
        }
    }
}
