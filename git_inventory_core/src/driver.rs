use crate::config::{self, Source};
use crate::error::Result;
use crate::ini;
use crate::inventory::{self, Inventory};
use crate::repository::{Cloner, GitCli};
use crate::workspace::Workspace;

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};

/// What to print on stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `--list`, the whole inventory.
    List,
    /// `--host <HOST>`, variables of one host.
    Host(String),
}

/// Fetch and convert the inventory described by `source`.
pub fn run(source: &Source, cloner: &dyn Cloner) -> Result<Inventory> {
    match source {
        Source::Local(path) => {
            info!("parsing local inventory {}", path.display());
            inventory::parse(path)
        }
        Source::Remote {
            repository,
            inventory: relative,
        } => {
            let workspace = Workspace::new()?;
            cloner.clone_repository(repository, workspace.path())?;
            info!("cloned {} into {}", repository.url, workspace.path().display());

            let inventory = inventory::parse(&workspace.locate(relative)?)?;
            workspace.close();
            Ok(inventory)
        }
    }
}

pub fn render(inventory: &Inventory, request: &Request) -> Result<String> {
    match request {
        Request::List => inventory.to_pretty_string(),
        Request::Host(hostname) => inventory::to_pretty_string(&inventory.host(hostname)),
    }
}

/// Whole invocation: settings from `env` and the Ansible configuration file
/// found from `cwd`, clone with git, parse and render.
pub fn execute(env: &HashMap<String, String>, cwd: &Path, request: &Request) -> Result<String> {
    let config_file = ini::load(env, cwd)?;
    let settings = config::resolve(env, config_file.as_ref())?;
    debug!("clone timeout: {:?}", settings.clone_timeout);

    let inventory = run(&settings.source, &GitCli::new(settings.clone_timeout))?;
    render(&inventory, request)
}
