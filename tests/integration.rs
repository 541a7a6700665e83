use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn trade_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("trade");
    path
}

const DAY_ONE: &str = "\
[07:07:08] <Jotasiete> (Har) WTS Iron Lump 1s
[07:08:00] <Alice> (Xan) WTB stone brick 20c
[07:09:10] <Bob> (Har) @Alice i have some
[07:10:00] <Carol> (Cad) hello everyone
not a log line at all

[07:11:30] <Dave> (Har) @TORTA-9F2K
[07:12:00] <Eve> (Har) WTS ok
";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let logs_dir = root.join("logs");
    fs::create_dir_all(logs_dir.join("archive")).unwrap();
    fs::write(logs_dir.join("Trade.2025-12-01.txt"), DAY_ONE).unwrap();
    fs::write(
        logs_dir.join("archive/Trade.old.txt"),
        "[01:00:00] <Old> (Har) WTS ancient relic\n",
    )
    .unwrap();

    fs::write(
        root.join("export.ndjson"),
        [
            r#"{"timestamp":"2025-12-02T10:00:00Z","player":"Frank","trade_type":"WTS","message":"Oak Planks 5c","server":"Har","log_hash":"0000F00D"}"#,
            r#"{"trade_timestamp_utc":"2025-12-02 10:05:00","nick":"Gina","message":"WTB rivets 2s"}"#,
            "{broken",
            r#"{"timestamp":"2025-12-02T10:06:00Z","player":"Hal","message":"anyone online?"}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    fs::write(
        root.join("market.json"),
        r#"[
            {"main_item": "stone brick", "player": "jotasiete", "price_s": "40c", "raw_text": "WTS stone brick"},
            {"main_item": "stone brick", "player": "alice", "price_s": "1s", "raw_text": "WTS stone brick"},
            {"main_item": "iron lump", "player": "bob", "price_s": "1s 50c", "raw_text": "WTB iron lump"},
            {"main_item": "stone shards", "player": "carol", "price": 101, "raw_text": "WTS stone shards"}
        ]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/trades.sqlite"

[ingest]
batch_size = 2
exclude_globs = ["archive/**"]

[search]
final_limit = 20
"#,
        root.display()
    );

    let config_path = config_dir.join("trade.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_trade(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = trade_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run trade binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn root_of(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().to_path_buf()
}

fn path_arg(config_path: &Path, rel: &str) -> String {
    root_of(config_path).join(rel).to_string_lossy().to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_trade(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(root_of(&config_path).join("data/trades.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_trade(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_trade(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_logs_directory() {
    let (_tmp, config_path) = setup_test_env();
    let logs = path_arg(&config_path, "logs");

    run_trade(&config_path, &["init"]);
    let (stdout, stderr, success) = run_trade(
        &config_path,
        &["ingest", "logs", &logs, "--date", "2025-12-01"],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    // archive/ is excluded by config
    assert!(stdout.contains("files: 1"), "{}", stdout);
    assert!(stdout.contains("lines: 9"), "{}", stdout);
    assert!(stdout.contains("valid: 3"), "{}", stdout);
    assert!(stdout.contains("ignored: 4"), "{}", stdout);
    assert!(stdout.contains("success: 3"), "{}", stdout);
    assert!(stdout.contains("duplicates: 0"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_ingest_logs_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    let logs = path_arg(&config_path, "logs");
    let args = ["ingest", "logs", logs.as_str(), "--date", "2025-12-01"];

    run_trade(&config_path, &["init"]);
    let (stdout1, _, _) = run_trade(&config_path, &args);
    assert!(stdout1.contains("success: 3"));

    let (stdout2, _, success) = run_trade(&config_path, &args);
    assert!(success);
    assert!(stdout2.contains("success: 0"), "{}", stdout2);
    assert!(stdout2.contains("duplicates: 3"), "{}", stdout2);
}

#[test]
fn test_ingest_logs_other_day_is_new() {
    let (_tmp, config_path) = setup_test_env();
    let logs = path_arg(&config_path, "logs");

    run_trade(&config_path, &["init"]);
    run_trade(&config_path, &["ingest", "logs", &logs, "--date", "2025-12-01"]);
    let (stdout, _, _) = run_trade(
        &config_path,
        &["ingest", "logs", &logs, "--date", "2025-12-02"],
    );
    assert!(stdout.contains("success: 3"), "{}", stdout);
}

#[test]
fn test_ingest_logs_dry_run() {
    let (_tmp, config_path) = setup_test_env();
    let logs = path_arg(&config_path, "logs");

    let (stdout, stderr, success) = run_trade(
        &config_path,
        &["ingest", "logs", &logs, "--date", "2025-12-01", "--dry-run"],
    );
    assert!(success, "dry run failed: {}", stderr);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("valid: 3"));
    assert!(!stdout.contains("success:"));
    assert!(!root_of(&config_path).join("data/trades.sqlite").exists());
}

#[test]
fn test_ingest_missing_path_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_trade(&config_path, &["init"]);
    let (_, stderr, success) = run_trade(&config_path, &["ingest", "logs", "/nonexistent/logs"]);
    assert!(!success);
    assert!(stderr.contains("does not exist"), "{}", stderr);
}

#[test]
fn test_ingest_bulk() {
    let (_tmp, config_path) = setup_test_env();
    let export = path_arg(&config_path, "export.ndjson");

    run_trade(&config_path, &["init"]);
    let (stdout, stderr, success) = run_trade(&config_path, &["ingest", "bulk", &export]);
    assert!(success, "bulk failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("total lines: 4"), "{}", stdout);
    assert!(stdout.contains("parse errors: 1"), "{}", stdout);
    assert!(stdout.contains("skipped (no trade type): 1"), "{}", stdout);
    assert!(stdout.contains("synthetic hashes: 2"), "{}", stdout);
    assert!(stdout.contains("success: 2"), "{}", stdout);

    let (stdout2, _, _) = run_trade(&config_path, &["ingest", "bulk", &export]);
    assert!(stdout2.contains("duplicates: 2"), "{}", stdout2);
}

#[test]
fn test_ingest_bulk_with_invalid_utf8_line() {
    let (_tmp, config_path) = setup_test_env();
    let export = root_of(&config_path).join("mixed.ndjson");
    let mut bytes = br#"{"timestamp":"2025-12-02T10:00:00Z","player":"Frank","trade_type":"WTS","message":"Oak Planks 5c"}"#.to_vec();
    bytes.extend_from_slice(b"\n{\"player\":\"\xff\"}\n");
    fs::write(&export, bytes).unwrap();

    let (stdout, stderr, success) =
        run_trade(&config_path, &["ingest", "bulk", export.to_str().unwrap()]);
    assert!(success, "bulk failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("total lines: 2"), "{}", stdout);
    assert!(stdout.contains("parse errors: 1"), "{}", stdout);
    assert!(stdout.contains("success: 1"), "{}", stdout);
}

#[test]
fn test_search_stored_trades() {
    let (_tmp, config_path) = setup_test_env();
    let logs = path_arg(&config_path, "logs");

    run_trade(&config_path, &["init"]);
    run_trade(&config_path, &["ingest", "logs", &logs, "--date", "2025-12-01"]);

    let (stdout, stderr, success) = run_trade(&config_path, &["search", "iron"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("Iron Lump"), "{}", stdout);
    assert!(stdout.contains("jotasiete"));
    assert!(stdout.contains("1 of 1 matches"));
}

#[test]
fn test_search_filters_json() {
    let (_tmp, config_path) = setup_test_env();
    let market = path_arg(&config_path, "market.json");

    let (stdout, stderr, success) =
        run_trade(&config_path, &["search", "price>100", "--file", &market, "--json"]);
    assert!(success, "search failed: {}", stderr);

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = parsed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["iron lump", "stone shards"]);
    assert_eq!(parsed["query"]["text_query"], "");
}

#[test]
fn test_search_empty_query_returns_all() {
    let (_tmp, config_path) = setup_test_env();
    let market = path_arg(&config_path, "market.json");

    let (stdout, _, success) = run_trade(&config_path, &["search", "", "--file", &market]);
    assert!(success);
    assert!(stdout.contains("4 of 4 matches"), "{}", stdout);
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();
    let market = path_arg(&config_path, "market.json");

    let (stdout, _, success) =
        run_trade(&config_path, &["search", "stone zzzz", "--file", &market]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_suggest_from_file() {
    let (_tmp, config_path) = setup_test_env();
    let market = path_arg(&config_path, "market.json");

    let (stdout, stderr, success) = run_trade(
        &config_path,
        &["suggest", "stone", "--file", &market, "--json"],
    );
    assert!(success, "suggest failed: {}", stderr);

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let first = &parsed.as_array().unwrap()[0];
    assert_eq!(first["item"], "stone brick");
    assert_eq!(first["score"], 95);
    assert_eq!(first["volume"], 2);
    assert_eq!(first["category"], "Bricks");
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    let logs = path_arg(&config_path, "logs");

    run_trade(&config_path, &["init"]);
    run_trade(&config_path, &["ingest", "logs", &logs, "--date", "2025-12-01"]);

    let (stdout, stderr, success) = run_trade(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Trades:        3"), "{}", stdout);
    assert!(stdout.contains("By server:"));
    assert!(stdout.contains("Har"));
    assert!(stdout.contains("WTB"));
}

#[test]
fn test_missing_config_fails_for_database_commands() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_trade(&missing, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_file_search_without_config_uses_defaults() {
    let (_tmp, config_path) = setup_test_env();
    let market = path_arg(&config_path, "market.json");
    let missing = root_of(&config_path).join("config/absent.toml");

    let (stdout, stderr, success) = run_trade(&missing, &["search", "", "--file", &market]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("4 of 4 matches"), "{}", stdout);
}

#[test]
fn test_file_search_rejects_malformed_config() {
    let (_tmp, config_path) = setup_test_env();
    let market = path_arg(&config_path, "market.json");
    fs::write(&config_path, "[db\npath = ").unwrap();

    let (_, stderr, success) = run_trade(&config_path, &["search", "", "--file", &market]);
    assert!(!success);
    assert!(stderr.contains("Failed to parse config file"), "{}", stderr);

    let (_, _, success) = run_trade(&config_path, &["suggest", "stone", "--file", &market]);
    assert!(!success);
}
