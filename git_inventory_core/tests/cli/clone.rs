use super::{HOSTS, execute_git_inventory};

use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::{Value, json};
use tempfile::tempdir;

fn git(args: &[&str], cwd: &Path) -> bool {
    Command::new("git")
        .args([
            "-c",
            "user.name=inventory",
            "-c",
            "user.email=inventory@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(cwd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Repository with `hosts.yml` on its default branch and an extra host on
/// branch `staging`. `None` when git is not available.
fn init_repository(path: &Path) -> Option<()> {
    fs::create_dir_all(path.join("inventories")).ok()?;
    fs::write(path.join("inventories/hosts.yml"), HOSTS).ok()?;

    let steps: [&[&str]; 6] = [
        &["init", "-q"],
        &["add", "."],
        &["commit", "-q", "-m", "inventory"],
        &["checkout", "-q", "-b", "staging"],
        &["commit", "-q", "-a", "-m", "staging"],
        &["checkout", "-q", "-"],
    ];
    for (idx, step) in steps.iter().enumerate() {
        if idx == 4 {
            fs::write(
                path.join("inventories/hosts.yml"),
                "staging:\n  hosts: [stage1]\n",
            )
            .ok()?;
        }
        if !git(step, path) {
            return None;
        }
    }
    Some(())
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_unreachable_url() {
    let dir = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    let url = dir.path().join("missing.git");

    let output = execute_git_inventory(
        &[],
        &[
            ("URL", url.to_str().unwrap()),
            ("INVENTORY", "hosts.yml"),
            ("TMPDIR", tmp.path().to_str().unwrap()),
        ],
        dir.path(),
    );

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
    assert_eq!(output.stderr.trim_end().lines().count(), 1);
    assert!(is_empty_dir(tmp.path()), "temporary directory left behind");
}

#[test]
fn test_unreachable_url_from_ansible_cfg() {
    let dir = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(
        dir.path().join("ansible.cfg"),
        "[git-inventory]\nurl = ./missing.git\ninventory = hosts.yml\n",
    )
    .unwrap();

    let output = execute_git_inventory(
        &[],
        &[("TMPDIR", tmp.path().to_str().unwrap())],
        dir.path(),
    );

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("./missing.git"));
    assert!(is_empty_dir(tmp.path()));
}

#[test]
fn test_clone_local_repository() {
    let dir = tempdir().unwrap();
    let repo = dir.path().join("repo");
    if init_repository(&repo).is_none() {
        eprintln!("git is not available, skipping");
        return;
    }
    let tmp = tempdir().unwrap();

    let output = execute_git_inventory(
        &[],
        &[
            ("URL", repo.to_str().unwrap()),
            ("INVENTORY", "inventories/hosts.yml"),
            ("TMPDIR", tmp.path().to_str().unwrap()),
        ],
        dir.path(),
    );

    assert_eq!(output.code, Some(0));
    let value: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(value["web"]["hosts"], json!(["app1", "app2"]));
    assert_eq!(value["_meta"]["hostvars"]["app2"], json!({"role": "primary"}));
    assert!(is_empty_dir(tmp.path()));
}

#[test]
fn test_clone_branch() {
    let dir = tempdir().unwrap();
    let repo = dir.path().join("repo");
    if init_repository(&repo).is_none() {
        eprintln!("git is not available, skipping");
        return;
    }

    let output = execute_git_inventory(
        &[],
        &[
            ("URL", repo.to_str().unwrap()),
            ("INVENTORY", "inventories/hosts.yml"),
            ("COMMIT", "staging"),
        ],
        dir.path(),
    );

    assert_eq!(output.code, Some(0));
    let value: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(value, json!({"staging": {"hosts": ["stage1"]}}));
}

#[test]
fn test_inventory_missing_in_repository() {
    let dir = tempdir().unwrap();
    let repo = dir.path().join("repo");
    if init_repository(&repo).is_none() {
        eprintln!("git is not available, skipping");
        return;
    }
    let tmp = tempdir().unwrap();

    let output = execute_git_inventory(
        &[],
        &[
            ("URL", repo.to_str().unwrap()),
            ("INVENTORY", "prod.yml"),
            ("TMPDIR", tmp.path().to_str().unwrap()),
        ],
        dir.path(),
    );

    assert_eq!(output.code, Some(1));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.contains("Inventory file \"prod.yml\" not found in repository"));
    assert!(is_empty_dir(tmp.path()));
}
