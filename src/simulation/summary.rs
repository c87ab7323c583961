//! Summary statistics over a damage sample.
//!
//! The 68th and 95th "percentiles" are read from the sample sorted high to low at index
//! `floor((1 - p) * N)`. This approximates one and two standard deviations for roughly
//! normal outcomes and is not an exact percentile.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::simulation::monte_carlo::TrialOutcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DamageSummary {
    pub trials: usize,
    pub mean: f64,
    pub percentile_68: u32,
    pub percentile_95: u32,
    pub min: u32,
    pub max: u32,
    pub weapon_means: BTreeMap<String, f64>,
}

/// Value at rank `floor((100 - percent) * N / 100)` of a sample sorted in descending order.
pub fn approximate_percentile(sorted_desc: &[u32], percent: u32) -> u32 {
    if sorted_desc.is_empty() {
        return 0;
    }
    let n = sorted_desc.len();
    let index = n * (100 - percent.min(100)) as usize / 100;
    sorted_desc[index.min(n - 1)]
}

pub fn summarize_sample(sample: &[u32]) -> DamageSummary {
    if sample.is_empty() {
        return DamageSummary::default();
    }
    let mut sorted = sample.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let total: u64 = sample.iter().map(|&d| u64::from(d)).sum();

    DamageSummary {
        trials: sample.len(),
        mean: total as f64 / sample.len() as f64,
        percentile_68: approximate_percentile(&sorted, 68),
        percentile_95: approximate_percentile(&sorted, 95),
        min: sorted[sorted.len() - 1],
        max: sorted[0],
        weapon_means: BTreeMap::new(),
    }
}

pub fn summarize(outcomes: &[TrialOutcome]) -> DamageSummary {
    let sample: Vec<u32> = outcomes.iter().map(|o| o.total_damage).collect();
    let mut summary = summarize_sample(&sample);
    if outcomes.is_empty() {
        return summary;
    }

    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for outcome in outcomes {
        for (weapon, damage) in &outcome.damage_by_weapon {
            *totals.entry(weapon.clone()).or_insert(0) += u64::from(*damage);
        }
    }
    summary.weapon_means = totals
        .into_iter()
        .map(|(weapon, total)| (weapon, total as f64 / outcomes.len() as f64))
        .collect();
    summary
}
