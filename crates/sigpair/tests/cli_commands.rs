#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn sigpair(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sigpair"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("SIGPAIR_ALGORITHMS")
        .env_remove("SIGPAIR_FORMAT")
        .output()
        .expect("sigpair should run")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn version_prints_package_version() {
    let out = sigpair(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.trim(), format!("sigpair {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_lists_algorithms() {
    let out = sigpair(&["version", "--extended"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("name: sigpair"));
    assert!(stdout.contains("ED25519"));
}

#[test]
fn algorithms_lists_catalogue_in_order() {
    let out = sigpair(&["--format", "json", "algorithms"]);
    assert!(out.status.success());
    let value = json(&out);
    let algorithms = value["algorithms"].as_array().expect("algorithms array");
    let last = algorithms.last().expect("catalogue is not empty");
    assert_eq!(last["name"], "ED25519");
    assert_eq!(last["public_key_len"], 32);
    assert_eq!(last["signature_len"], 64);
}

#[test]
fn selftest_passes_for_builtin_catalogue() {
    let out = sigpair(&["--format", "json", "selftest"]);
    assert_eq!(out.status.code(), Some(0));
    let value = json(&out);
    assert_eq!(value["failed"], 0);
    assert!(value["outcomes"]
        .as_array()
        .expect("outcomes array")
        .iter()
        .all(|o| o["passed"] == true));
}

#[test]
fn unknown_algorithm_is_usage_error() {
    let out = sigpair(&["--format", "json", "selftest", "--algorithms", "RSA_2048"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&out.stderr).contains("RSA_2048"));
}

#[test]
fn pretty_selftest_summarises() {
    let out = sigpair(&["--format", "pretty", "selftest", "--algorithms", "ED25519"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ED25519"));
    assert!(stdout.contains("passed=1 failed=0"));
}
