//! Simulation harness: reload both combatants, resolve abilities, run one engagement,
//! record the damage, repeat.
//!
//! Every trial draws from its own [DiceRng] seeded by
//! [derive_trial_seed](crate::combat::rng::derive_trial_seed), so a seeded
//! run yields the same sample sequentially, in parallel, or with any worker count.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::combat::abilities::resolve_abilities;
use crate::combat::engine::resolve_engagement;
use crate::combat::rng::{entropy_seed, DiceRng};
use crate::combat::trace::{CombatEvent, TraceCollector, TraceMode};
use crate::data::unit::Unit;
use crate::parallel::{batch_ranges, batches_for_current_pool, map_batches, WorkerPool};
use crate::simulation::summary::{summarize, DamageSummary};

pub const DEFAULT_TRIALS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub trials: u64,
    /// Base seed; None draws one from OS entropy.
    pub seed: Option<u64>,
    /// Applies to the first trial only.
    pub trace_mode: TraceMode,
    pub parallel: bool,
    pub pool: WorkerPool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            trace_mode: TraceMode::Off,
            parallel: true,
            pool: WorkerPool::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrialOutcome {
    pub trial: u64,
    pub total_damage: u32,
    pub damage_by_weapon: BTreeMap<String, u32>,
    pub models_killed: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub attacker: String,
    pub defender: String,
    pub trials: u64,
    pub seed: u64,
    /// Weapon columns in attacker order.
    pub weapons: Vec<String>,
    pub summary: DamageSummary,
    #[serde(skip)]
    pub outcomes: Vec<TrialOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CombatEvent>,
}

impl SimulationReport {
    pub fn damage_sample(&self) -> Vec<u32> {
        self.outcomes.iter().map(|o| o.total_damage).collect()
    }
}

/// Run trial number `trial` on the given combatants, restoring them first.
pub fn run_trial(
    attacker: &mut Unit,
    defender: &mut Unit,
    base_seed: u64,
    trial: u64,
    trace: &mut TraceCollector,
) -> TrialOutcome {
    attacker.reload();
    defender.reload();
    resolve_abilities(attacker, defender, trace);

    let mut rng = DiceRng::for_trial(base_seed, trial);
    let engagement = resolve_engagement(attacker, defender, &mut rng, trace);
    TrialOutcome {
        trial,
        total_damage: engagement.total_damage,
        damage_by_weapon: engagement.damage_by_weapon,
        models_killed: engagement.models_killed,
    }
}

fn run_range(
    attacker: &Unit,
    defender: &Unit,
    base_seed: u64,
    trials: std::ops::Range<u64>,
) -> Vec<TrialOutcome> {
    let mut attacker = attacker.clone();
    let mut defender = defender.clone();
    let mut trace = TraceCollector::disabled();
    trials
        .map(|trial| run_trial(&mut attacker, &mut defender, base_seed, trial, &mut trace))
        .collect()
}

pub fn run_simulation(
    attacker: &Unit,
    defender: &Unit,
    config: &SimulationConfig,
) -> SimulationReport {
    let base_seed = config.seed.unwrap_or_else(entropy_seed);
    tracing::info!(
        attacker = %attacker.name,
        defender = %defender.name,
        trials = config.trials,
        seed = base_seed,
        parallel = config.parallel,
        "starting simulation"
    );

    let mut outcomes = Vec::with_capacity(config.trials as usize);
    let mut events = Vec::new();
    if config.trials > 0 {
        let mut first_attacker = attacker.clone();
        let mut first_defender = defender.clone();
        let mut trace = TraceCollector::from_mode(config.trace_mode);
        outcomes.push(run_trial(
            &mut first_attacker,
            &mut first_defender,
            base_seed,
            0,
            &mut trace,
        ));
        events = trace.into_events();
    }

    let rest = 1..config.trials.max(1);
    if config.parallel {
        outcomes.extend(config.pool.install(|| {
            let ranges: Vec<_> = batch_ranges(rest.end - rest.start, batches_for_current_pool())
                .into_iter()
                .map(|range| range.start + rest.start..range.end + rest.start)
                .collect();
            map_batches(ranges, |range| run_range(attacker, defender, base_seed, range))
        }));
    } else {
        outcomes.extend(run_range(attacker, defender, base_seed, rest));
    }

    let summary = summarize(&outcomes);
    tracing::info!(
        mean = summary.mean,
        percentile_68 = summary.percentile_68,
        percentile_95 = summary.percentile_95,
        "simulation finished"
    );

    SimulationReport {
        attacker: attacker.name.clone(),
        defender: defender.name.clone(),
        trials: config.trials,
        seed: base_seed,
        weapons: attacker.weapon_names(),
        summary,
        outcomes,
        events,
    }
}
