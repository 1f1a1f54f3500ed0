use super::{HOSTS, execute_git_inventory};

use std::fs;

use serde_json::{Value, json};
use tempfile::tempdir;

#[test]
fn test_debug_test_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.yml");
    fs::write(&path, HOSTS).unwrap();

    let output = execute_git_inventory(
        &["--list"],
        &[("DEBUG_TEST_PATH", path.to_str().unwrap())],
        dir.path(),
    );

    assert_eq!(output.code, Some(0));
    assert!(output.stderr.is_empty(), "stderr should be empty, got: {}", output.stderr);
    assert!(output.stdout.ends_with("}\n"));
    let value: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(
        value,
        json!({
            "_meta": {"hostvars": {"app2": {"role": "primary"}}},
            "db": {},
            "web": {"children": ["db"], "hosts": ["app1", "app2"], "vars": {"env": "prod"}},
        })
    );
}

#[test]
fn test_list_is_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.yml");
    fs::write(&path, HOSTS).unwrap();
    let envs = [("DEBUG_TEST_PATH", path.to_str().unwrap())];

    let with_flag = execute_git_inventory(&["--list"], &envs, dir.path());
    let without_flag = execute_git_inventory(&[], &envs, dir.path());

    assert_eq!(with_flag.stdout, without_flag.stdout);
}

#[test]
fn test_host() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.yml");
    fs::write(&path, HOSTS).unwrap();
    let envs = [("DEBUG_TEST_PATH", path.to_str().unwrap())];

    let output = execute_git_inventory(&["--host", "app2"], &envs, dir.path());
    assert_eq!(output.code, Some(0));
    assert_eq!(output.stdout, "{\n    \"role\": \"primary\"\n}\n");

    let output = execute_git_inventory(&["--host", "app1"], &envs, dir.path());
    assert_eq!(output.stdout, "{}\n");
}

#[test]
fn test_invalid_inventory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hosts.yml");
    fs::write(&path, "web:\n  hosts:\n    - {a: {}, b: {}}\n").unwrap();

    let output = execute_git_inventory(
        &[],
        &[("DEBUG_TEST_PATH", path.to_str().unwrap())],
        dir.path(),
    );

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("group `web`"));
    assert_eq!(output.stderr.trim_end().lines().count(), 1);
}

#[test]
fn test_missing_debug_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.yml");

    let output = execute_git_inventory(
        &[],
        &[("DEBUG_TEST_PATH", path.to_str().unwrap())],
        dir.path(),
    );

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("not found"));
}

#[test]
fn test_missing_configuration() {
    let dir = tempdir().unwrap();

    let output = execute_git_inventory(&[], &[("INVENTORY", "hosts.yml")], dir.path());

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("repository URL is not set"));
}

#[test]
fn test_list_conflicts_with_host() {
    let dir = tempdir().unwrap();

    let output = execute_git_inventory(&["--list", "--host", "app1"], &[], dir.path());

    assert_eq!(output.code, Some(2));
    assert!(output.stdout.is_empty());
}
