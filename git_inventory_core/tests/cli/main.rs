mod clone;
mod local;

use std::path::Path;
use std::process::Command;

pub struct Output {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

/// Run the binary with a clean environment, from `cwd`, so that neither the
/// caller's variables nor its `ansible.cfg` leak into the test.
pub fn execute_git_inventory(args: &[&str], envs: &[(&str, &str)], cwd: &Path) -> Output {
    let bin_path = Path::new(env!("CARGO_BIN_EXE_git-inventory"));

    let mut cmd = Command::new(bin_path);
    cmd.args(args)
        .env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .env("HOME", cwd)
        .current_dir(cwd);
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let output = cmd.output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    dbg!(&stdout);
    dbg!(&stderr);

    Output {
        stdout,
        stderr,
        code: output.status.code(),
    }
}

pub const HOSTS: &str = r#"
web:
  hosts:
    - app1
    - app2:
        role: primary
  vars:
    - env: prod
  children:
    - db
db: {}
"#;
