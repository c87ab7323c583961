//! Per-trial CSV export: `Simulation, Total Damage, <one column per weapon>`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::ExportError;
use crate::simulation::monte_carlo::{SimulationReport, TrialOutcome};

pub fn write_trials<W: Write>(
    writer: W,
    weapons: &[String],
    outcomes: &[TrialOutcome],
) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["Simulation".to_string(), "Total Damage".to_string()];
    header.extend(weapons.iter().cloned());
    out.write_record(&header)?;

    for outcome in outcomes {
        let mut row = vec![(outcome.trial + 1).to_string(), outcome.total_damage.to_string()];
        row.extend(weapons.iter().map(|weapon| {
            outcome
                .damage_by_weapon
                .get(weapon)
                .copied()
                .unwrap_or(0)
                .to_string()
        }));
        out.write_record(&row)?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_report_csv(path: &Path, report: &SimulationReport) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_trials(file, &report.weapons, &report.outcomes)?;
    tracing::info!(path = %path.display(), rows = report.outcomes.len(), "wrote trial CSV");
    Ok(())
}
