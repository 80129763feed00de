use std::fs;

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;

const LOGIN_METHOD: &str = "Actindo.Modules.Actindo.UserManager.Login.login";
const LIST_METHOD: &str = "Actindo.Modules.Actindo.DataHub.AttributeSets.get";

fn binary_command() -> Command {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin!("pim-cli"));
    for name in [
        "PIM_ENDPOINT",
        "PIM_LOGIN",
        "PIM_PASSWORD",
        "PIM_TOKEN",
        "PIM_TOKEN_CACHE",
        "PIM_TIMEOUT_MS",
        "PIM_INSECURE",
    ] {
        command.env_remove(name);
    }
    command
}

#[test]
fn integration_base_attribute_set_prints_id_with_direct_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": LIST_METHOD, "auth": "tok-1"}).to_string());
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"success": true, "total": 1, "data": [{"id": 17, "key": "pim_base_set"}]}
        }));
    });

    binary_command()
        .env("PIM_ENDPOINT", server.url("/jsonrpc"))
        .env("PIM_TOKEN", "tok-1")
        .arg("base-attribute-set")
        .assert()
        .success()
        .stdout("17\n");
    mock.assert();
}

#[test]
fn integration_login_persists_session_and_next_run_reuses_it() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": LOGIN_METHOD}).to_string());
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"sessionId": "s-cli"}
        }));
    });
    let ping = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": "system.ping", "auth": "s-cli"}).to_string());
        then.status(200)
            .json_body(json!({"jsonrpc": "2.0", "id": 2, "result": {"pong": true}}));
    });

    let temp = tempdir().expect("tempdir");
    let cache_path = temp.path().join(".auth-token");
    for _ in 0..2 {
        binary_command()
            .env("PIM_ENDPOINT", server.url("/jsonrpc"))
            .env("PIM_LOGIN", "api")
            .env("PIM_PASSWORD", "secret")
            .env("PIM_TOKEN_CACHE", &cache_path)
            .args(["call", "system.ping"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"pong\": true"));
    }

    login.assert_calls(1);
    ping.assert_calls(2);
    assert_eq!(
        fs::read_to_string(&cache_path).expect("cached token"),
        "s-cli"
    );
}

#[test]
fn integration_list_attribute_sets_sends_filters_and_prints_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/jsonrpc").json_body(json!({
            "jsonrpc": "2.0",
            "method": LIST_METHOD,
            "params": [{
                "filter": [{"property": "id", "operator": "=", "value": 3}],
                "start": 5,
                "limit": 10
            }],
            "id": 1,
            "auth": "tok-1"
        }));
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"success": true, "total": 1, "data": [{"id": 3, "key": "shoes"}]}
        }));
    });

    binary_command()
        .env("PIM_ENDPOINT", server.url("/jsonrpc"))
        .env("PIM_TOKEN", "tok-1")
        .args([
            "list-attribute-sets",
            "--start",
            "5",
            "--limit",
            "10",
            "--filter",
            "id=3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\": \"shoes\""));
    mock.assert();
}

#[test]
fn regression_insecure_env_accepts_numeric_flag_values() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/jsonrpc")
            .json_body_includes(json!({"method": "system.ping"}).to_string());
        then.status(200)
            .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": {"pong": true}}));
    });

    for value in ["1", "0", "yes"] {
        binary_command()
            .env("PIM_ENDPOINT", server.url("/jsonrpc"))
            .env("PIM_TOKEN", "tok-1")
            .env("PIM_INSECURE", value)
            .args(["call", "system.ping"])
            .assert()
            .success();
    }
    mock.assert_calls(3);
}

#[test]
fn regression_missing_credentials_fail_with_guidance() {
    let temp = tempdir().expect("tempdir");
    binary_command()
        .env("PIM_ENDPOINT", "http://127.0.0.1:1/jsonrpc")
        .env("PIM_TOKEN_CACHE", temp.path().join(".auth-token"))
        .arg("base-attribute-set")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PIM_LOGIN"));
}

#[test]
fn regression_remote_error_exits_non_zero_with_context() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/jsonrpc");
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        }));
    });

    binary_command()
        .env("PIM_ENDPOINT", server.url("/jsonrpc"))
        .env("PIM_TOKEN", "tok-1")
        .args(["call", "missing.method"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("call 'missing.method' failed"));
}
