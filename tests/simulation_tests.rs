use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use mathhammer::data::load_unit;
use mathhammer::error::SimulationError;
use mathhammer::parallel::WorkerPool;
use mathhammer::simulation::{run_simulation, write_report_csv, SimulationConfig};

fn library() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("library")
}

fn unique_temp_path(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("mathhammer-{name}-{stamp}.csv"))
}

fn config(trials: u64, seed: u64, parallel: bool, workers: usize) -> SimulationConfig {
    SimulationConfig {
        trials,
        seed: Some(seed),
        parallel,
        pool: WorkerPool::with_workers(workers),
        ..SimulationConfig::default()
    }
}

#[test]
fn parallel_and_sequential_runs_produce_the_same_sample() {
    let attacker = load_unit(&library(), "intercessor_squad").expect("attacker loads");
    let defender = load_unit(&library(), "terminator_squad").expect("defender loads");

    let sequential = run_simulation(&attacker, &defender, &config(2_000, 99, false, 0));
    let parallel = run_simulation(&attacker, &defender, &config(2_000, 99, true, 0));
    let two_workers = run_simulation(&attacker, &defender, &config(2_000, 99, true, 2));

    assert_eq!(sequential.outcomes, parallel.outcomes);
    assert_eq!(sequential.outcomes, two_workers.outcomes);
    assert_eq!(sequential.summary, parallel.summary);
}

#[test]
fn different_seeds_give_different_samples() {
    let attacker = load_unit(&library(), "captain").expect("attacker loads");
    let defender = load_unit(&library(), "cultist_mob").expect("defender loads");

    let a = run_simulation(&attacker, &defender, &config(500, 1, true, 0));
    let b = run_simulation(&attacker, &defender, &config(500, 2, true, 0));
    assert_ne!(a.damage_sample(), b.damage_sample());
    assert_eq!(a.seed, 1);
}

#[test]
fn unseeded_runs_report_the_seed_they_drew() {
    let attacker = load_unit(&library(), "heavy_gunner").expect("attacker loads");
    let defender = load_unit(&library(), "target_dummy").expect("defender loads");
    let report = run_simulation(
        &attacker,
        &defender,
        &SimulationConfig {
            trials: 200,
            ..SimulationConfig::default()
        },
    );
    let replay = run_simulation(&attacker, &defender, &config(200, report.seed, true, 0));
    assert_eq!(report.damage_sample(), replay.damage_sample());
}

#[test]
fn summary_statistics_are_ordered() {
    let attacker = load_unit(&library(), "intercessor_squad").expect("attacker loads");
    let defender = load_unit(&library(), "cultist_mob").expect("defender loads");
    let report = run_simulation(&attacker, &defender, &config(3_000, 4, true, 0));
    let s = &report.summary;

    assert_eq!(s.trials, 3_000);
    assert!(s.min as f64 <= s.mean && s.mean <= s.max as f64);
    assert!(s.percentile_68 <= s.percentile_95);
    assert!(s.percentile_95 <= s.max);
    let weapon_total: f64 = s.weapon_means.values().sum();
    assert!((weapon_total - s.mean).abs() < 1e-6);
}

#[test]
fn loadout_selection_restricts_firing_weapons() {
    let mut attacker = load_unit(&library(), "intercessor_squad").expect("attacker loads");
    let defender = load_unit(&library(), "cultist_mob").expect("defender loads");

    attacker.select_loadout("Shooting").expect("loadout exists");
    assert_eq!(attacker.weapon_names(), vec!["Bolt rifle"]);
    let report = run_simulation(&attacker, &defender, &config(200, 8, true, 0));
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.damage_by_weapon.keys().all(|w| w == "Bolt rifle")));

    attacker.select_loadout("assault").expect("loadout names ignore case");
    let mut names = attacker.weapon_names();
    names.sort();
    assert_eq!(names, vec!["Bolt rifle", "Close combat weapon", "Power fist"]);

    assert!(matches!(
        attacker.select_loadout("Plasma"),
        Err(SimulationError::UnknownLoadout { .. })
    ));
}

#[test]
fn csv_export_has_a_row_per_trial() {
    let attacker = load_unit(&library(), "intercessor_squad").expect("attacker loads");
    let defender = load_unit(&library(), "target_dummy").expect("defender loads");
    let report = run_simulation(&attacker, &defender, &config(25, 3, true, 0));

    let path = unique_temp_path("trials");
    write_report_csv(&path, &report).expect("csv should write");
    let text = fs::read_to_string(&path).expect("csv should exist");
    let _ = fs::remove_file(&path);

    let mut lines = text.lines();
    let header = lines.next().expect("header");
    assert!(header.starts_with("Simulation,Total Damage,"));
    assert!(header.contains("Bolt rifle"));
    assert_eq!(lines.count(), 25);
}
