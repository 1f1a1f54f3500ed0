//! Minimal reader for Ansible configuration files.
//!
//! Supports `[section]` headers, `key = value` and `key: value` options and
//! full line `#`/`;` comments. Options before the first section are dropped.
//! Option names are case-insensitive, section names are not.
use crate::error::Result;

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use log::{debug, trace};

const ANSIBLE_CONFIG_ENV: &str = "ANSIBLE_CONFIG";
const SYSTEM_CONFIG: &str = "/etc/ansible/ansible.cfg";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ini {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Ini {
    pub fn parse(content: &str) -> Self {
        let mut ini = Ini::default();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let section = trimmed[1..trimmed.len() - 1].trim().to_string();
                ini.sections.entry(section.clone()).or_default();
                current_section = Some(section);
                continue;
            }

            let Some(section) = &current_section else {
                trace!("option outside of any section: {trimmed}");
                continue;
            };

            if let Some(pos) = trimmed.find(['=', ':']) {
                let option = trimmed[..pos].trim().to_lowercase();
                let value = trimmed[pos + 1..].trim().to_string();
                ini.sections
                    .entry(section.clone())
                    .or_default()
                    .insert(option, value);
            }
        }

        ini
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("reading configuration from: {path:?}");
        Ok(Self::parse(&read_to_string(path)?))
    }

    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|options| options.get(&option.to_lowercase()))
            .map(String::as_str)
    }
}

fn expand_home(path: &str, env: &HashMap<String, String>) -> PathBuf {
    match (path.strip_prefix("~/"), env.get("HOME")) {
        (Some(rest), Some(home)) => Path::new(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Candidate configuration files in Ansible lookup order.
pub fn candidates(env: &HashMap<String, String>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = env.get(ANSIBLE_CONFIG_ENV).filter(|p| !p.is_empty()) {
        paths.push(expand_home(path, env));
    }
    paths.push(cwd.join("ansible.cfg"));
    if let Some(home) = env.get("HOME") {
        paths.push(Path::new(home).join(".ansible.cfg"));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG));
    paths
}

/// Load the first existing configuration file, if any.
pub fn load(env: &HashMap<String, String>, cwd: &Path) -> Result<Option<Ini>> {
    match candidates(env, cwd).into_iter().find(|path| path.is_file()) {
        Some(path) => Ok(Some(Ini::from_file(&path)?)),
        None => {
            debug!("no ansible configuration file found");
            Ok(None)
        }
    }
}
