//! Integration tests for the `clashctl` binary.
//!
//! Argument parsing, help, completions and exit codes run without a
//! daemon; data commands run against a wiremock controller.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `clashctl` binary with env isolation.
///
/// Clears all `CLASHCTL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn clashctl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("clashctl");
    cmd.env("HOME", "/tmp/clashctl-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/clashctl-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("CLASHCTL_PROFILE")
        .env_remove("CLASHCTL_API")
        .env_remove("CLASHCTL_SECRET")
        .env_remove("CLASHCTL_OUTPUT")
        .env_remove("CLASHCTL_INSECURE")
        .env_remove("CLASHCTL_TIMEOUT");
    cmd
}

/// `clashctl --api <server> <args...>` with JSON output.
fn against(server: &MockServer, args: &[&str]) -> std::process::Output {
    clashctl_cmd()
        .args(["--api", &server.uri(), "--color", "never"])
        .args(args)
        .output()
        .unwrap()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}):\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_inventory(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/configs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "port": 7890, "socks-port": 7891, "mode": "rule", "log-level": "info"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rules": [
                { "type": "DomainSuffix", "payload": "google.com", "proxy": "Proxy" },
                { "type": "GeoIP", "payload": "CN", "proxy": "DIRECT" },
                { "type": "Match", "payload": "", "proxy": "Proxy" }
            ]
        })))
        .mount(server)
        .await;

    let proxies = r#"{
        "proxies": {
            "Proxy": { "type": "Selector", "all": ["Auto", "HK-01"], "now": "Auto", "history": [] },
            "Auto": { "type": "URLTest", "all": ["HK-01", "JP-02"], "now": "HK-01", "history": [] },
            "HK-01": { "type": "Shadowsocks", "history": [{ "time": "2026-03-01T08:00:00Z", "delay": 120 }] },
            "JP-02": { "type": "Vmess", "history": [] },
            "DIRECT": { "type": "Direct", "history": [] }
        }
    }"#;
    Mock::given(method("GET"))
        .and(path("/proxies"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(proxies, "application/json"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/providers/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "providers": {} })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/providers/proxies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "providers": {} })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = clashctl_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    clashctl_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Clash daemon")
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("probe"))
            .and(predicate::str::contains("traffic")),
    );
}

#[test]
fn test_version_flag() {
    clashctl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("clashctl"));
}

#[test]
fn test_completions_zsh() {
    clashctl_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    clashctl_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Local errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_mode_value() {
    let output = clashctl_cmd()
        .args(["--api", "http://127.0.0.1:9", "mode", "set", "sideways"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("sideways"));
}

#[test]
fn test_no_daemon_configured() {
    clashctl_cmd()
        .arg("rules")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No daemon configured"));
}

#[test]
fn test_unknown_profile() {
    clashctl_cmd()
        .args(["--profile", "work", "rules"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("work"));
}

#[test]
fn test_non_http_api_is_usage_error() {
    clashctl_cmd()
        .args(["--api", "ftp://127.0.0.1", "rules"])
        .assert()
        .code(2);
}

#[test]
fn test_config_path_and_show_without_file() {
    clashctl_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    clashctl_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_profiles_from_file() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("clashctl");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        r#"
default_profile = "lab"

[profiles.lab]
api = "http://10.0.0.2:9090"
secret = "hunter2"

[profiles.home]
api = "http://127.0.0.1:9090"
"#,
    )
    .unwrap();

    let output = clashctl_cmd()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "profiles"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lab *"), "{stdout}");
    assert!(stdout.contains("home\thttp://127.0.0.1:9090"), "{stdout}");

    let output = clashctl_cmd()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "show"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("****"), "{stdout}");
    assert!(!stdout.contains("hunter2"), "{stdout}");
}

// ── Daemon-backed commands ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_list_json() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let output = against(&server, &["-o", "json", "groups", "list"]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let groups = stdout_json(&output);
    let names: Vec<&str> = groups
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Proxy", "Auto"]);
    assert_eq!(groups[1]["members"], json!(["HK-01", "JP-02"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rules_plain() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let output = against(&server, &["-o", "plain", "rules"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "DomainSuffix,google.com,Proxy\nGeoIP,CN,DIRECT\nMatch,,Proxy\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_group_show_unknown_is_not_found() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let output = against(&server, &["groups", "show", "Nope"]);
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("groups list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delay_json_with_custom_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxies/HK-01/delay"))
        .and(query_param("url", "http://probe.test/"))
        .and(query_param("timeout", "800"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "delay": 80 })))
        .expect(1)
        .mount(&server)
        .await;

    let output = against(
        &server,
        &[
            "-o",
            "json",
            "delay",
            "HK-01",
            "--url",
            "http://probe.test/",
            "--probe-timeout",
            "800",
        ],
    );
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(stdout_json(&output), json!({ "name": "HK-01", "delay": 80 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delay_failure_reports_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxies/JP-02/delay"))
        .respond_with(ResponseTemplate::new(504).set_body_json(json!({ "message": "Timeout" })))
        .mount(&server)
        .await;

    let output = against(&server, &["-o", "json", "delay", "JP-02"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["delay"], 0);
    assert!(view["error"].as_str().unwrap().contains("Timeout"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_probe_group_in_member_order() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    Mock::given(method("GET"))
        .and(path("/proxies/HK-01/delay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "delay": 1500 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxies/JP-02/delay"))
        .respond_with(ResponseTemplate::new(504).set_body_json(json!({ "message": "Timeout" })))
        .mount(&server)
        .await;

    let output = against(&server, &["-q", "-o", "json", "probe", "Auto"]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let requests = server.received_requests().await.unwrap();
    let probed: Vec<&str> = requests
        .iter()
        .map(|r| r.url.path())
        .filter(|p| p.ends_with("/delay"))
        .collect();
    assert_eq!(probed, vec!["/proxies/HK-01/delay", "/proxies/JP-02/delay"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_probe_prints_tiers() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    Mock::given(method("GET"))
        .and(path("/proxies/HK-01/delay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "delay": 1500 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxies/JP-02/delay"))
        .respond_with(ResponseTemplate::new(504).set_body_json(json!({ "message": "Timeout" })))
        .mount(&server)
        .await;

    let output = against(&server, &["-o", "json", "probe", "Auto"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    let rows = stdout_json(&output);
    assert_eq!(rows[0]["name"], "HK-01");
    assert_eq!(rows[0]["delay"], 1500);
    assert_eq!(rows[0]["tier"], "moderate");
    assert_eq!(rows[1]["name"], "JP-02");
    assert_eq!(rows[1]["delay"], Value::Null);
    assert_eq!(rows[1]["tier"], "unknown");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mode_set_and_rejection() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/configs"))
        .and(body_json(json!({ "mode": "global" })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/configs"))
        .and(body_json(json!({ "mode": "direct" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Body invalid" })))
        .mount(&server)
        .await;

    let output = against(&server, &["mode", "set", "global"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Mode set to global"));

    let output = against(&server, &["mode", "set", "direct"]);
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mode_get_plain() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let output = against(&server, &["-o", "plain", "mode"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "rule\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switch_rejected_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/proxies/Auto"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Must be a Selector" })),
        )
        .mount(&server)
        .await;

    let output = against(&server, &["switch", "Auto", "HK-01"]);
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("refused"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_switch_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/proxies/Proxy"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let output = against(&server, &["--secret", "wrong", "switch", "Proxy", "HK-01"]);
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_exit_code_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let output = against(&server, &["--secret", "wrong", "rules"]);
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap();
    assert_eq!(auth.to_str().unwrap(), "Bearer wrong");
}

#[test]
fn test_connection_refused_exit_code() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    clashctl_cmd()
        .args(["--api", &format!("http://127.0.0.1:{port}"), "rules"])
        .assert()
        .code(7);
}
