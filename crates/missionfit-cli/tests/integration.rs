#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const KEY_ENV: &str = "MISSIONFIT_TEST_API_KEY";

fn missionfit(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("missionfit").unwrap();
    cmd.current_dir(dir.path())
        .env("MISSIONFIT_ROOT", dir.path())
        .env_remove("RUST_LOG")
        .env_remove(KEY_ENV);
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::create_dir_all(dir.path().join(".missionfit")).unwrap();
    std::fs::write(dir.path().join(".missionfit/config.yaml"), yaml).unwrap();
}

/// Point the completion client at `base_url`, keyed by a test-only env var.
fn completion_config(dir: &TempDir, base_url: &str) {
    write_config(
        dir,
        &format!(
            "completion:\n  base_url: {base_url}\n  api_key_env: {KEY_ENV}\n  timeout_secs: 5\n"
        ),
    );
}

fn run_json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let out = missionfit(dir).arg("--json").args(args).output().unwrap();
    assert!(
        out.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

const SAM: &[&str] = &[
    "plan",
    "--name",
    "Sam",
    "--height",
    "70",
    "--weight",
    "180",
    "--goal",
    "lose_weight",
];

// ---------------------------------------------------------------------------
// missionfit init / config
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    missionfit(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .missionfit/config.yaml"));

    let raw = std::fs::read_to_string(dir.path().join(".missionfit/config.yaml")).unwrap();
    let cfg: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(cfg["storage"]["backend"], "json");
    assert_eq!(cfg["completion"]["model"], "gpt-3.5-turbo");
    assert_eq!(cfg["server"]["port"], 3000);
}

#[test]
fn init_is_idempotent_and_keeps_edits() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "server:\n  port: 4321\n");
    missionfit(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));

    let raw = std::fs::read_to_string(dir.path().join(".missionfit/config.yaml")).unwrap();
    assert_eq!(raw, "server:\n  port: 4321\n");
}

#[test]
fn init_backend_flag_selects_redb() {
    let dir = TempDir::new().unwrap();
    let out = run_json(&dir, &["init", "--backend", "redb"]);
    assert_eq!(out["created"], true);
    assert_eq!(out["backend"], "redb");

    let raw = std::fs::read_to_string(dir.path().join(".missionfit/config.yaml")).unwrap();
    let cfg: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(cfg["storage"]["backend"], "redb");

    run_json(&dir, &["task", "add", "a"]);
    assert!(dir.path().join("data/tasks.redb").exists());
}

#[test]
fn init_backend_flag_does_not_touch_existing_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "server:\n  port: 4321\n");
    missionfit(&dir)
        .args(["init", "--backend", "redb"])
        .assert()
        .success()
        .stderr(predicate::str::contains("--backend ignored"));

    let raw = std::fs::read_to_string(dir.path().join(".missionfit/config.yaml")).unwrap();
    assert_eq!(raw, "server:\n  port: 4321\n");
}

#[test]
fn init_rejects_unknown_backend() {
    let dir = TempDir::new().unwrap();
    missionfit(&dir)
        .args(["init", "--backend", "sqlite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown storage backend 'sqlite'"));
    assert!(!dir.path().join(".missionfit/config.yaml").exists());
}

#[test]
fn config_show_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "storage:\n  backend: redb\n");
    let shown = run_json(&dir, &["config", "show"]);
    assert_eq!(shown["config"]["storage"]["backend"], "redb");
    assert_eq!(shown["config"]["completion"]["timeout_secs"], 60);
    assert_eq!(shown["apiKeySet"], false);
    assert!(shown["tasksPath"]
        .as_str()
        .unwrap()
        .ends_with("tasks.redb"));
}

#[test]
fn config_validate_fails_on_zero_timeout() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "completion:\n  timeout_secs: 0\n");
    missionfit(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("timeout_secs"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn unparsable_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "storage: [not, a, map]\n");
    missionfit(&dir)
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

// ---------------------------------------------------------------------------
// missionfit task
// ---------------------------------------------------------------------------

#[test]
fn task_lifecycle_json() {
    let dir = TempDir::new().unwrap();

    let added = run_json(&dir, &["task", "add", "Morning", "stretch"]);
    let id = added["id"].as_str().unwrap().to_string();
    assert_eq!(added["title"], "Morning stretch");
    assert_eq!(added["completed"], false);

    let toggled = run_json(&dir, &["task", "toggle", &id]);
    assert_eq!(toggled["completed"], true);

    let renamed = run_json(&dir, &["task", "rename", &id, "Evening", "stretch"]);
    assert_eq!(renamed["title"], "Evening stretch");
    assert_eq!(renamed["completed"], true);

    let listed = run_json(&dir, &["task", "list"]);
    assert_eq!(listed, json!([renamed]));

    let removed = run_json(&dir, &["task", "rm", &id]);
    assert_eq!(removed["success"], true);
    assert_eq!(run_json(&dir, &["task", "list"]), json!([]));

    assert!(dir.path().join("data/tasks.json").exists());
}

#[test]
fn task_list_groups_subtasks_and_orphans() {
    let dir = TempDir::new().unwrap();
    let parent = run_json(&dir, &["task", "add", "Week", "one"]);
    let parent_id = parent["id"].as_str().unwrap();
    run_json(&dir, &["task", "add", "Monday", "--parent", parent_id]);
    run_json(&dir, &["task", "add", "Lost", "--parent", "missing-id"]);

    missionfit(&dir)
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Week one"))
        .stdout(predicate::str::contains("└ Monday"))
        .stdout(predicate::str::contains("Lost (parent missing-id not found)"))
        .stdout(predicate::str::contains("0/3 completed"));
}

#[test]
fn toggle_unknown_task_fails() {
    let dir = TempDir::new().unwrap();
    missionfit(&dir)
        .args(["task", "toggle", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task not found: nope"));
}

#[test]
fn rm_unknown_task_succeeds() {
    let dir = TempDir::new().unwrap();
    missionfit(&dir)
        .args(["task", "rm", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed [nope]"));
}

#[test]
fn redb_backend_from_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "storage:\n  backend: redb\n");
    let a = run_json(&dir, &["task", "add", "a"]);
    let b = run_json(&dir, &["task", "add", "b"]);
    let a = run_json(&dir, &["task", "toggle", a["id"].as_str().unwrap()]);

    assert_eq!(run_json(&dir, &["task", "list"]), json!([a, b]));
    assert!(dir.path().join("data/tasks.redb").exists());
    assert!(!dir.path().join("data/tasks.json").exists());
}

#[test]
fn redb_locked_by_server_lists_empty_and_refuses_writes() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "storage:\n  backend: redb\n");
    let added = run_json(&dir, &["task", "add", "a"]);

    // stands in for a running `missionfit serve` holding the file lock
    let held =
        missionfit_core::store::db::TaskDb::open(&dir.path().join("data/tasks.redb")).unwrap();

    assert_eq!(run_json(&dir, &["task", "list"]), json!([]));
    missionfit(&dir)
        .args(["task", "add", "b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("in use by another process"));

    drop(held);
    assert_eq!(run_json(&dir, &["task", "list"]), json!([added]));
}

// ---------------------------------------------------------------------------
// missionfit plan
// ---------------------------------------------------------------------------

#[test]
fn plan_rejects_out_of_range_height_before_calling_upstream() {
    let dir = TempDir::new().unwrap();
    missionfit(&dir)
        .args([
            "plan", "--name", "Sam", "--height", "40", "--weight", "180", "--goal", "lose_weight",
            "--meal", "no",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid profile"));
}

#[test]
fn plan_rejects_unknown_goal() {
    let dir = TempDir::new().unwrap();
    missionfit(&dir)
        .args([
            "plan", "--name", "Sam", "--height", "70", "--weight", "180", "--goal", "get_rich",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("get_rich"));
}

#[test]
fn plan_without_api_key_prints_degraded_workout_and_fails() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .expect(0)
        .create();

    let dir = TempDir::new().unwrap();
    completion_config(&dir, &server.url());
    missionfit(&dir)
        .args(SAM)
        .args(["--meal", "yes"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Activity:     N/A"))
        .stdout(predicate::str::contains("Something went wrong"))
        .stderr(predicate::str::contains(KEY_ENV));

    mock.assert();
}

#[test]
fn plan_with_meal_plan_end_to_end() {
    let mut server = mockito::Server::new();
    let workout = json!({
        "activity": "Brisk walking",
        "weeklyPlan": "Walk 30 minutes five days a week",
        "message": "Sam, every step counts!"
    })
    .to_string();
    let workout_mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-cli")
        .match_body(Matcher::PartialJson(json!({
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "choices": [{ "message": { "content": workout } }] }).to_string())
        .create();
    let meal_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("meal plan".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "choices": [{ "message": {
                "content": "Day 1 - Breakfast: oats, Lunch: salad, Dinner: fish Day 2 - Breakfast: eggs, Lunch: wrap, Dinner: stew"
            } }] })
            .to_string(),
        )
        .create();

    let dir = TempDir::new().unwrap();
    completion_config(&dir, &server.url());
    let out = missionfit(&dir)
        .env(KEY_ENV, "sk-cli")
        .arg("--json")
        .args(SAM)
        .args(["--meal", "yes"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    workout_mock.assert();
    meal_mock.assert();

    let body: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(body["state"], "done");
    assert_eq!(body["workout"]["activity"], "Brisk walking");
    assert_eq!(body["profile"]["planLength"], 7);
    assert_eq!(
        body["mealPlan"]["days"],
        json!([
            "Day 1 - Breakfast: oats, Lunch: salad, Dinner: fish",
            "Day 2 - Breakfast: eggs, Lunch: wrap, Dinner: stew"
        ])
    );
}

#[test]
fn plan_asks_for_meal_choice_on_stdin() {
    let mut server = mockito::Server::new();
    let workout_mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "choices": [{ "message": { "content": "Keep going!" } }] }).to_string())
        .expect(1)
        .create();

    let dir = TempDir::new().unwrap();
    completion_config(&dir, &server.url());
    missionfit(&dir)
        .env(KEY_ENV, "sk-cli")
        .args(SAM)
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("meal plan too?"))
        .stderr(predicate::str::contains("not a structured plan"))
        .stdout(predicate::str::contains("Plan for Sam: Lose Weight, 7 days"))
        .stdout(predicate::str::contains("Activity:     N/A"))
        .stdout(predicate::str::contains("Message:      Keep going!"))
        .stdout(predicate::str::contains("Meal plan:").not());

    // declining means only the workout request went out
    workout_mock.assert();
}
