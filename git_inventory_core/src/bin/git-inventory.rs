use git_inventory_core::driver::{self, Request};
use git_inventory_core::error::{Error, ErrorKind};
use git_inventory_core::logger;

use std::collections::HashMap;
use std::env;
use std::error::Error as StdError;
use std::io::{self, Write};
use std::process::exit;

use clap::{ArgAction, Parser, crate_authors, crate_description, crate_version};
use log::{error, trace};

const LOG_LEVEL_ENV: &str = "GIT_INVENTORY_LOG_LEVEL";

/// Settings are read from the environment (`DEBUG_TEST_PATH`, `URL`,
/// `INVENTORY`, `SSHKEY`, `COMMIT`, `CLONE_TIMEOUT`) or from the
/// `[git-inventory]` section of the Ansible configuration file.
#[derive(Parser, Debug)]
#[command(
    name = "git-inventory",
    about = crate_description!(),
    version = crate_version!(),
    author = crate_authors!("\n"),
)]
struct Args {
    /// Print the whole inventory (default)
    #[arg(long, conflicts_with = "host")]
    list: bool,
    /// Print the variables of a single host
    #[arg(long, value_name = "HOST")]
    host: Option<String>,
    /// Verbose mode (-vv for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Trace all errors recursively
fn trace_all(e: &dyn StdError) {
    trace!(target: "error", "{}", e);
    if let Some(source_error) = e.source() {
        trace_all(source_error)
    }
}

/// End the program with failure, printing [`Error`] on stderr and returning 1.
fn crash_error(e: Error) -> ! {
    error!("{}", e);
    if let Some(inner_error) = e.into_inner()
        && let Some(source_error) = inner_error.source()
    {
        trace_all(source_error)
    }
    exit(1)
}

fn verbosity(args: &Args) -> u8 {
    if args.verbose > 0 {
        return args.verbose;
    }
    match env::var(LOG_LEVEL_ENV) {
        Ok(s) => match s.as_ref() {
            "INFO" => 1,
            "DEBUG" => 2,
            "TRACE" => 3,
            _ => 0,
        },
        _ => 0,
    }
}

fn main() {
    let args: Args = Args::parse();

    logger::setup_logging(verbosity(&args)).expect("failed to initialize logging.");
    trace!("start logger");
    trace!("{:?}", &args);

    let request = match args.host {
        Some(host) if !args.list => Request::Host(host),
        _ => Request::List,
    };

    // non UTF-8 variables can't be any of ours
    let env: HashMap<String, String> = env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => crash_error(Error::from(e)),
    };

    let output = match driver::execute(&env, &cwd, &request) {
        Ok(output) => output,
        Err(e) => crash_error(e),
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{output}").and_then(|_| stdout.flush()) {
        crash_error(Error::new(ErrorKind::IOError, e));
    }
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert()
}
