//! Integration tests for the mtrack CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd. Remote
//! commands run against a small HTTP stub on a local port.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use tempfile::TempDir;

/// Helper to get an mtrack command isolated from the user's config and env
fn mtrack(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mtrack").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("MTRACK_API_URL")
        .env_remove("MTRACK_TOKEN")
        .env_remove("MTRACK_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    mtrack(&tmp).current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// One request as seen by the stub backend
#[derive(Debug)]
struct Seen {
    request_line: String,
    authorization: Option<String>,
    body: Value,
}

const ONE_ROW: &str = r#"[{"id":"a1","project_id":"TAPL001","project_name":"Alpha","branch":"Bengaluru","status":"Active","progress_pct":"9","m1_slab1":"yes"}]"#;

/// Helper to run a local backend; `respond` maps a request line to (status, body)
fn stub_backend<F>(respond: F) -> (String, mpsc::Receiver<Seen>)
where
    F: Fn(&str) -> (u16, &'static str) + Send + 'static,
{
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let mut authorization = None;
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line.trim().is_empty() => break,
                    Ok(_) => {}
                }
                if let Some((key, value)) = line.trim().split_once(':') {
                    if key.eq_ignore_ascii_case("authorization") {
                        authorization = Some(value.trim().to_string());
                    } else if key.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut raw = vec![0; content_length];
            let _ = reader.read_exact(&mut raw);

            let request_line = request_line.trim().to_string();
            let (status, body) = respond(&request_line);
            let _ = tx.send(Seen {
                request_line,
                authorization,
                body: serde_json::from_slice(&raw).unwrap_or(Value::Null),
            });

            let mut stream = reader.into_inner();
            let _ = write!(
                stream,
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.flush();
        }
    });
    (base, rx)
}

/// Helper for an mtrack command pointed at a stub backend
fn mtrack_remote(tmp: &TempDir, base: &str) -> Command {
    let mut cmd = mtrack(tmp);
    cmd.current_dir(tmp.path())
        .env("MTRACK_API_URL", base)
        .env("MTRACK_TOKEN", "tok")
        .env("MTRACK_TIMEOUT_SECS", "5");
    cmd
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    mtrack(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("milestone"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    mtrack(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mtrack"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    mtrack(&tmp)
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".mtrack").is_dir());
    assert!(tmp.path().join(".mtrack/config.yaml").exists());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_init_with_api_url() {
    let tmp = TempDir::new().unwrap();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["init", "--api-url", "http://localhost:8000"])
        .assert()
        .success();

    let config = fs::read_to_string(tmp.path().join(".mtrack/config.yaml")).unwrap();
    assert!(config.contains("http://localhost:8000"));

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "show", "api_url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8000"));
}

// ============================================================================
// Grid Command Tests
// ============================================================================

#[test]
fn test_load_outside_workspace_fails() {
    let tmp = TempDir::new().unwrap();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .arg("load")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an mtrack workspace"));
}

#[test]
fn test_load_without_api_url_fails() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .arg("load")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no api_url configured"));
}

#[test]
fn test_load_unreachable_backend_fails() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .env("MTRACK_API_URL", "http://127.0.0.1:1")
        .env("MTRACK_TIMEOUT_SECS", "2")
        .arg("load")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load milestones"));
}

#[test]
fn test_toggle_unreachable_backend_fails_before_edit() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .env("MTRACK_API_URL", "http://127.0.0.1:1")
        .env("MTRACK_TIMEOUT_SECS", "2")
        .args(["toggle", "TAPL001", "m1_slab1"])
        .assert()
        .failure();

    // Nothing was edited, so nothing is pending
    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["-f", "json", "overrides", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}

#[test]
fn test_export_unreachable_backend_writes_nothing() {
    let tmp = setup_workspace();
    let out = tmp.path().join("out.csv");

    mtrack(&tmp)
        .current_dir(tmp.path())
        .env("MTRACK_API_URL", "http://127.0.0.1:1")
        .env("MTRACK_TIMEOUT_SECS", "2")
        .args(["export", "-o", out.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load milestones"));

    assert!(!out.exists());
}

#[test]
fn test_toggle_persists_flag_then_progress() {
    let tmp = setup_workspace();
    let (base, seen) = stub_backend(|line| {
        if line.starts_with("GET ") {
            (200, ONE_ROW)
        } else {
            (200, "{}")
        }
    });

    mtrack_remote(&tmp, &base)
        .args(["toggle", "TAPL001", "m3_wires"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"))
        .stdout(predicate::str::contains("5%"));

    let requests: Vec<Seen> = seen.try_iter().collect();
    let lines: Vec<&str> = requests.iter().map(|r| r.request_line.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "GET /api/milestones-grid HTTP/1.1",
            "PUT /api/milestones-grid/a1 HTTP/1.1",
            "PUT /api/milestones-grid/a1 HTTP/1.1",
            "PUT /api/milestones-grid/a1 HTTP/1.1",
        ]
    );
    // Stale "9" is corrected on load, then the flag, then the new progress
    assert_eq!(requests[1].body, json!({ "field": "progress_pct", "value": 2 }));
    assert_eq!(requests[2].body, json!({ "field": "m3_wires", "value": true }));
    assert_eq!(requests[3].body, json!({ "field": "progress_pct", "value": 5 }));
    for request in &requests {
        assert_eq!(request.authorization.as_deref(), Some("Bearer tok"));
    }

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["-f", "json", "overrides", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}

#[test]
fn test_toggle_save_failure_keeps_pending_edit() {
    let tmp = setup_workspace();
    let (base, _seen) = stub_backend(|line| {
        if line.starts_with("GET ") {
            (200, ONE_ROW)
        } else {
            (500, r#"{"detail":"database locked"}"#)
        }
    });

    mtrack_remote(&tmp, &base)
        .args(["toggle", "a1", "m3_wires"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Could not save"))
        .stderr(predicate::str::contains("database locked"));

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["-f", "json", "overrides", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("m3_wires"))
        .stdout(predicate::str::contains("a1"));
}

#[test]
fn test_export_to_stdout() {
    let tmp = setup_workspace();
    let (base, _seen) = stub_backend(|line| {
        if line.starts_with("GET ") {
            (200, ONE_ROW)
        } else {
            (200, "{}")
        }
    });

    let output = mtrack_remote(&tmp, &base)
        .args(["export", "-o", "-"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let mut rdr = csv::Reader::from_reader(output.stdout.as_slice());
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("Project ID"));
    assert_eq!(headers.iter().last(), Some("Progress %"));

    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.get(0), Some("TAPL001"));
    assert_eq!(record.iter().last(), Some("2"));
    assert_eq!(record.iter().filter(|v| *v == "true").count(), 1);
    assert!(!tmp.path().join("milestones-export.csv").exists());
}

#[test]
fn test_delete_reports_backend_detail() {
    let tmp = setup_workspace();
    let (base, seen) = stub_backend(|line| {
        if line.starts_with("GET ") {
            (200, ONE_ROW)
        } else if line.starts_with("DELETE ") {
            (403, r#"{"detail":"Not allowed"}"#)
        } else {
            (200, "{}")
        }
    });

    mtrack_remote(&tmp, &base)
        .args(["delete", "TAPL001", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not allowed"));

    let deletes: Vec<Seen> = seen
        .try_iter()
        .filter(|r| r.request_line.starts_with("DELETE "))
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].request_line, "DELETE /api/milestones-grid/a1 HTTP/1.1");
}

#[test]
fn test_project_flag_from_other_directory() {
    let tmp = setup_workspace();
    let elsewhere = TempDir::new().unwrap();

    mtrack(&tmp)
        .current_dir(elsewhere.path())
        .args(["--project", tmp.path().to_str().unwrap(), "overrides", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending edits"));
}

// ============================================================================
// Columns Command Tests
// ============================================================================

#[test]
fn test_columns_lists_catalog() {
    let tmp = TempDir::new().unwrap();

    mtrack(&tmp)
        .arg("columns")
        .assert()
        .success()
        .stdout(predicate::str::contains("m1_slab1"))
        .stdout(predicate::str::contains("Milestone 10 - Visualization & Handover"))
        .stdout(predicate::str::contains("44 checkpoints"));
}

#[test]
fn test_columns_id_format() {
    let tmp = TempDir::new().unwrap();

    let output = mtrack(&tmp)
        .args(["-f", "id", "columns"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 44);
    assert_eq!(stdout.lines().next(), Some("m_entry_electrical_labour"));
    assert_eq!(stdout.lines().last(), Some("m10_handover"));
}

// ============================================================================
// Overrides Command Tests
// ============================================================================

#[test]
fn test_overrides_list_empty() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["overrides", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending edits"));

    assert!(tmp.path().join(".mtrack/state.db").exists());
}

#[test]
fn test_overrides_clear_all() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["overrides", "clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 row(s)"));
}

#[test]
fn test_overrides_clear_unknown_row_fails() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["overrides", "clear", "42", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pending edits for row 42"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_set_and_unset() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "timeout_secs", "30"])
        .assert()
        .success();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "show", "timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30"));

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "unset", "timeout_secs"])
        .assert()
        .success();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "show", "timeout_secs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not set"));
}

#[test]
fn test_config_rejects_bad_values() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "timeout_secs", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("whole number"));

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "editor", "vi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration key"));
}

#[test]
fn test_config_token_is_masked() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "token", "s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cret").not());

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("s3cret").not());
}

#[test]
fn test_env_overrides_workspace_config() {
    let tmp = setup_workspace();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .args(["config", "set", "api_url", "http://file:8000"])
        .assert()
        .success();

    mtrack(&tmp)
        .current_dir(tmp.path())
        .env("MTRACK_API_URL", "http://env:9000")
        .args(["config", "show", "api_url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://env:9000"));
}

// ============================================================================
// Completions Tests
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    mtrack(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mtrack"));
}
