//! Run the harness benchmark and optionally append one line to a log file for trend tracking.
//!
//! Usage:
//!   cargo run --release --bin benchmark_simulator
//!   cargo run --release --bin benchmark_simulator -- --log
//!
//! --log  Append one row to benchmark_log.csv (date, trials, sequential and parallel
//!        trials per second, speedup).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use chrono::{DateTime, Utc};

use mathhammer::data::{load_unit, Unit, DEFAULT_LIBRARY_DIR};
use mathhammer::simulation::{run_simulation, SimulationConfig};

const TRIALS: u64 = 20_000;

fn trials_per_sec(attacker: &Unit, defender: &Unit, parallel: bool) -> f64 {
    let config = SimulationConfig {
        trials: TRIALS,
        seed: Some(7),
        parallel,
        ..SimulationConfig::default()
    };
    let start = Instant::now();
    let report = run_simulation(attacker, defender, &config);
    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "  {:<10} {:>8.2} s  mean damage {:.3}",
        if parallel { "parallel" } else { "sequential" },
        elapsed,
        report.summary.mean
    );
    TRIALS as f64 / elapsed
}

fn log_line(date: &DateTime<Utc>, sequential: f64, parallel: f64, speedup: f64) -> String {
    format!(
        "{},{TRIALS},{sequential:.2},{parallel:.2},{speedup:.3}\n",
        date.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

fn append_log(line: &str) -> std::io::Result<()> {
    let path = "benchmark_log.csv";
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata().map(|m| m.len() == 0).unwrap_or(true) {
        file.write_all(
            b"date,trials,sequential_trials_per_sec,parallel_trials_per_sec,speedup\n",
        )?;
    }
    file.write_all(line.as_bytes())?;
    file.flush()?;
    println!("Appended to {path}");
    Ok(())
}

fn main() -> ExitCode {
    let log = std::env::args().any(|a| a == "--log");
    let library = Path::new(DEFAULT_LIBRARY_DIR);

    let (attacker, defender) = match (
        load_unit(library, "intercessor_squad"),
        load_unit(library, "terminator_squad"),
    ) {
        (Ok(a), Ok(d)) => (a, d),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("benchmark units unavailable: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Harness benchmark ({TRIALS} trials, {} vs {}):",
        attacker.name, defender.name
    );
    let sequential = trials_per_sec(&attacker, &defender, false);
    let parallel = trials_per_sec(&attacker, &defender, true);
    let speedup = parallel / sequential;
    println!("  Trials/s sequential: {sequential:.0}");
    println!("  Trials/s parallel:   {parallel:.0}");
    println!("  Speedup:             {speedup:.2}x");

    if log {
        let line = log_line(&Utc::now(), sequential, parallel, speedup);
        if let Err(err) = append_log(&line) {
            eprintln!("failed to write benchmark_log.csv: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_line_starts_with_utc_date() {
        let date = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
            .single()
            .expect("valid date");
        assert_eq!(
            log_line(&date, 1000.0, 3500.5, 3.5),
            "2026-03-14T09:26:53Z,20000,1000.00,3500.50,3.500\n"
        );
    }
}
