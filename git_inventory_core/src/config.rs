//! Settings resolution.
//!
//! Ansible cannot pass arguments to an inventory script, so every setting comes
//! from the environment or from the `[git-inventory]` section of the Ansible
//! configuration file. Resolution works over an explicit environment map so it
//! never depends on the process environment at the call site.
use crate::error::{Error, ErrorKind, Result};
use crate::ini::Ini;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, trace};

pub const CONFIG_SECTION: &str = "git-inventory";
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEBUG_TEST_PATH_ENV: &str = "DEBUG_TEST_PATH";

/// Setting name in the configuration file and its environment alias.
#[derive(Debug, Clone, Copy)]
struct Key {
    option: &'static str,
    env: &'static str,
}

const URL: Key = Key {
    option: "url",
    env: "URL",
};
const SSHKEY: Key = Key {
    option: "sshkey",
    env: "SSHKEY",
};
const COMMIT: Key = Key {
    option: "commit",
    env: "COMMIT",
};
const INVENTORY: Key = Key {
    option: "inventory",
    env: "INVENTORY",
};
const TIMEOUT: Key = Key {
    option: "timeout",
    env: "CLONE_TIMEOUT",
};

#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub url: String,
    /// Branch or tag to check out.
    pub commit: Option<String>,
    /// Private key handed to ssh.
    pub sshkey: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Parse a local file, no clone.
    Local(PathBuf),
    /// Clone `repository` and parse `inventory`, relative to its root.
    Remote {
        repository: Repository,
        inventory: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: Source,
    /// `None` waits for git forever. Always `None` for a local source.
    pub clone_timeout: Option<Duration>,
}

fn non_empty(value: &str) -> Option<String> {
    match value {
        "" => None,
        s => Some(s.to_owned()),
    }
}

/// Environment alias first (even when set to an empty string), then the
/// configuration file, then `""`.
fn lookup<'a>(key: Key, env: &'a HashMap<String, String>, config: Option<&'a Ini>) -> &'a str {
    env.get(key.env)
        .map(String::as_str)
        .or_else(|| config.and_then(|ini| ini.get(CONFIG_SECTION, key.option)))
        .unwrap_or("")
}

fn parse_timeout(value: &str) -> Result<Option<Duration>> {
    match value.trim() {
        "" => Ok(Some(DEFAULT_CLONE_TIMEOUT)),
        s => match s.parse::<u64>() {
            Ok(0) => Ok(None),
            Ok(secs) => Ok(Some(Duration::from_secs(secs))),
            Err(e) => Err(Error::new(
                ErrorKind::Configuration,
                format!("invalid clone timeout `{s}`: {e}"),
            )),
        },
    }
}

fn remote_source(url: &str, inventory: &str, sshkey: &str, commit: &str) -> Result<Source> {
    if url.is_empty() {
        return Err(Error::new(
            ErrorKind::Configuration,
            format!(
                "repository URL is not set: define `{}` or `{}` in section [{CONFIG_SECTION}]",
                URL.env, URL.option
            ),
        ));
    }
    if inventory.is_empty() {
        return Err(Error::new(
            ErrorKind::Configuration,
            format!(
                "inventory path is not set: define `{}` or `{}` in section [{CONFIG_SECTION}]",
                INVENTORY.env, INVENTORY.option
            ),
        ));
    }
    Ok(Source::Remote {
        repository: Repository {
            url: url.to_owned(),
            commit: non_empty(commit),
            sshkey: non_empty(sshkey),
        },
        inventory: PathBuf::from(inventory),
    })
}

/// Resolve settings, by priority:
///
/// 1. `DEBUG_TEST_PATH`, a local inventory file parsed without cloning.
/// 2. `URL` and `INVENTORY` both set in the environment, with optional
///    `SSHKEY` and `COMMIT`.
/// 3. Per setting: environment alias, then `[git-inventory]` in `config`.
pub fn resolve(env: &HashMap<String, String>, config: Option<&Ini>) -> Result<Settings> {
    if let Some(path) = env.get(DEBUG_TEST_PATH_ENV).and_then(|p| non_empty(p)) {
        debug!("using local inventory from {DEBUG_TEST_PATH_ENV}: {path}");
        return Ok(Settings {
            source: Source::Local(PathBuf::from(path)),
            clone_timeout: None,
        });
    }

    let clone_timeout = parse_timeout(lookup(TIMEOUT, env, config))?;

    let from_env = |key: Key| env.get(key.env).map(String::as_str).unwrap_or("");
    let source = if !from_env(URL).is_empty() && !from_env(INVENTORY).is_empty() {
        debug!("using settings from environment");
        remote_source(
            from_env(URL),
            from_env(INVENTORY),
            from_env(SSHKEY),
            from_env(COMMIT),
        )?
    } else {
        debug!("using settings from section [{CONFIG_SECTION}]");
        remote_source(
            lookup(URL, env, config),
            lookup(INVENTORY, env, config),
            lookup(SSHKEY, env, config),
            lookup(COMMIT, env, config),
        )?
    };
    trace!("{source:?}");

    Ok(Settings {
        source,
        clone_timeout,
    })
}
