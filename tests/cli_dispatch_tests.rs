use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_mathhammer")
}

fn library() -> String {
    format!("{}/library", env!("CARGO_MANIFEST_DIR"))
}

fn mathhammer(args: &[&str]) -> std::process::Output {
    let library = library();
    Command::new(bin())
        .args(["--library", library.as_str()])
        .args(args)
        .env_remove("MATHHAMMER_TRIALS")
        .env_remove("MATHHAMMER_SEED")
        .output()
        .expect("mathhammer should run")
}

fn unique_temp_path(name: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("mathhammer-{name}-{stamp}.{ext}"))
}

#[test]
fn simulate_command_dispatches_and_emits_json() {
    let output = mathhammer(&[
        "simulate",
        "heavy_gunner",
        "target_dummy",
        "--trials",
        "500",
        "--seed",
        "7",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("simulate should emit json");
    assert_eq!(payload["trials"], 500);
    assert_eq!(payload["seed"], 7);
    assert_eq!(payload["weapons"], serde_json::json!(["Heavy cannon"]));
    assert!(payload["summary"]["mean"].is_number());
    assert!(payload.get("events").is_none());
}

#[test]
fn simulate_is_reproducible_with_a_seed() {
    let args = [
        "simulate",
        "intercessor_squad",
        "cultist_mob",
        "-n",
        "300",
        "--seed",
        "11",
        "--table",
    ];
    let first = mathhammer(&args);
    let second = mathhammer(&args);
    assert_eq!(first.status.code(), Some(0));
    assert_eq!(first.stdout, second.stdout);
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.starts_with("attacker\tdefender\ttrials"));
}

#[test]
fn simulate_trace_includes_first_trial_events() {
    let output = mathhammer(&[
        "simulate",
        "heavy_gunner",
        "target_dummy",
        "-n",
        "50",
        "--seed",
        "3",
        "--trace",
        "--sequential",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("simulate should emit json");
    let events = payload["events"].as_array().expect("events array");
    let hit_rolls = events
        .iter()
        .filter(|e| e["event_type"] == "hit_roll")
        .count();
    assert_eq!(hit_rolls, 10);
}

#[test]
fn simulate_writes_csv_when_asked() {
    let path = unique_temp_path("cli-trials", "csv");
    let path_arg = path.display().to_string();
    let output = mathhammer(&[
        "simulate",
        "captain",
        "terminator_squad",
        "-n",
        "40",
        "--seed",
        "5",
        "--csv",
        path_arg.as_str(),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let text = fs::read_to_string(&path).expect("csv should exist");
    let _ = fs::remove_file(&path);
    assert_eq!(text.lines().count(), 41);
}

#[test]
fn unknown_unit_fails_with_runtime_error() {
    let output = mathhammer(&["simulate", "imperial_knight", "target_dummy", "-n", "10"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("imperial_knight"));
}

#[test]
fn unknown_loadout_fails_with_runtime_error() {
    let output = mathhammer(&[
        "simulate",
        "intercessor_squad",
        "target_dummy",
        "--loadout",
        "Plasma",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Plasma"));
}

#[test]
fn missing_arguments_are_usage_errors() {
    let output = Command::new(bin()).output().expect("mathhammer should run");
    assert_eq!(output.status.code(), Some(2));

    let output = mathhammer(&["simulate", "heavy_gunner"]);
    assert_eq!(output.status.code(), Some(2));

    let output = mathhammer(&["simulate", "heavy_gunner", "target_dummy", "-n", "lots"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_command_reports_library_units() {
    let output = mathhammer(&["validate", "intercessor_squad", "cultist_mob"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("intercessor_squad: 0 error(s)"));
    assert!(stdout.contains("cultist_mob: 0 error(s)"));
}

#[test]
fn validate_command_fails_on_broken_units() {
    let path = unique_temp_path("broken-unit", "yaml");
    fs::write(&path, "name: Broken\nmodels:\n  - name: Ghost\n    count: 0\n").expect("write");
    let path_arg = path.display().to_string();
    let output = mathhammer(&["validate", path_arg.as_str()]);
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[error]"));
}

#[test]
fn combine_command_writes_a_loadable_unit() {
    let path = unique_temp_path("combined", "yaml");
    let path_arg = path.display().to_string();
    let output = mathhammer(&["combine", "captain", "intercessor_squad", "-o", path_arg.as_str()]);
    assert_eq!(output.status.code(), Some(0));

    let inspect = mathhammer(&["inspect", path_arg.as_str()]);
    let _ = fs::remove_file(&path);
    assert_eq!(inspect.status.code(), Some(0));
    let unit: serde_json::Value =
        serde_json::from_slice(&inspect.stdout).expect("inspect should emit json");
    assert_eq!(unit["name"], "Captain + Intercessor Squad");
    assert_eq!(unit["models"].as_array().map(Vec::len), Some(3));
}

#[test]
fn inspect_command_shows_typed_abilities() {
    let output = mathhammer(&["inspect", "captain"]);
    assert_eq!(output.status.code(), Some(0));
    let unit: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect should emit json");
    let abilities = unit["abilities"].as_array().expect("abilities");
    assert!(abilities
        .iter()
        .any(|a| a["kind"] == "invulnerable_save" && a["parameter"] == 4));
}
