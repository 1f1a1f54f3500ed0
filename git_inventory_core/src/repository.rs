use crate::config::Repository;
use crate::error::{Error, ErrorKind, Result};

use std::io::{BufRead, BufReader, Read};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long to wait for more stderr once git has exited.
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// Fetches a repository into a directory.
pub trait Cloner {
    fn clone_repository(&self, repository: &Repository, dest: &Path) -> Result<()>;
}

/// Clone through the `git` command line client.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    timeout: Option<Duration>,
}

impl Default for GitCli {
    fn default() -> Self {
        GitCli {
            program: "git".to_owned(),
            timeout: None,
        }
    }
}

fn build_ssh_cmd(key_file: &str) -> String {
    format!("ssh -i {key_file}")
}

/// Fold git output into a single line for error messages.
fn one_line(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Forward lines as they arrive so a chatty git can't block on a full pipe
/// while we poll for the timeout.
fn forward_lines<R: Read + Send + 'static>(reader: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(reader).lines().map_while(|line| line.ok()) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Stops at end of stream, or after `STDERR_GRACE` without output: a
/// transport helper left in the background keeps the pipe open.
fn collect_lines(rx: &Receiver<String>) -> String {
    let mut lines = Vec::new();
    while let Ok(line) = rx.recv_timeout(STDERR_GRACE) {
        lines.push(line);
    }
    lines.join("\n")
}

impl GitCli {
    pub fn new(timeout: Option<Duration>) -> Self {
        GitCli {
            timeout,
            ..Default::default()
        }
    }

    #[cfg(test)]
    fn with_program(program: &str, timeout: Option<Duration>) -> Self {
        GitCli {
            program: program.to_owned(),
            timeout,
        }
    }

    fn command(&self, repository: &Repository, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["clone", "-q"]);

        if let Some(commit) = &repository.commit {
            cmd.args(["-b", commit.as_str()]);
        }

        cmd.arg(&repository.url).arg(dest);

        // Only the child sees the key, the parent environment stays untouched.
        if let Some(key_file) = &repository.sshkey {
            cmd.env("GIT_SSH_COMMAND", build_ssh_cmd(key_file));
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // git and its ssh/remote helpers share a group, killed together on timeout
        cmd.process_group(0);
        cmd
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                kill_group(child);
                let _ = child.wait();
                return Err(Error::new(
                    ErrorKind::CloneFail,
                    format!("git clone timed out after {timeout:?}"),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait for a spawned clone and gather its stderr.
    fn finish(&self, mut child: Child) -> Result<(ExitStatus, String)> {
        let lines = child.stderr.take().map(forward_lines);
        let status = self.wait(&mut child)?;
        let stderr = lines.map(|rx| collect_lines(&rx)).unwrap_or_default();
        Ok((status, stderr))
    }
}

/// Kill the whole process group led by `child`, or only `child` when it
/// leads none.
fn kill_group(child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        debug!("killpg {pgid}: {e}");
        // already exited between try_wait and kill is fine
        let _ = child.kill();
    }
}

impl Cloner for GitCli {
    fn clone_repository(&self, repository: &Repository, dest: &Path) -> Result<()> {
        let mut cmd = self.command(repository, dest);
        debug!("cloning {} into {}", repository.url, dest.display());
        trace!("{cmd:?}");

        let child = cmd.spawn().map_err(|e| {
            Error::new(
                ErrorKind::CloneFail,
                format!(
                    "Failed to execute {} to clone {}: {e}",
                    self.program, repository.url
                ),
            )
        })?;

        let (status, stderr) = self.finish(child)?;
        if !status.success() {
            return Err(Error::new(
                ErrorKind::CloneFail,
                format!(
                    "git clone of {} failed ({status}): {}",
                    repository.url,
                    one_line(&stderr)
                ),
            ));
        }

        Ok(())
    }
}
