use crate::error::{Error, ErrorKind, Result};

use std::fmt;
use std::io;

use fern::FormatCallback;
use fern::colors::Color;

fn log_header(level: log::Level, target: &str) -> String {
    match (level, target) {
        (log::Level::Warn, _) => "[WARNING] ".to_owned(),
        (log::Level::Error, _) => "[ERROR] ".to_owned(),
        (log::Level::Info, _) | (log::Level::Debug, _) => "".to_owned(),
        (log::Level::Trace, s) => s.to_owned() + " - ",
    }
}

fn level_color(level: log::Level, target: &str) -> Color {
    match (level, target) {
        (log::Level::Trace, "error") => Color::Red,
        (log::Level::Trace, _) => Color::BrightBlack,
        (log::Level::Debug, _) => Color::BrightBlue,
        (log::Level::Info, _) => Color::White,
        (log::Level::Warn, _) => Color::Magenta,
        (log::Level::Error, _) => Color::Red,
    }
}

fn colored_format(out: FormatCallback, message: &fmt::Arguments, record: &log::Record) {
    out.finish(format_args!(
        "\x1B[{color}m{header}{message}\x1B[0m",
        color = level_color(record.level(), record.target()).to_fg_str(),
        header = log_header(record.level(), record.target()),
    ))
}

fn plain_format(out: FormatCallback, message: &fmt::Arguments, record: &log::Record) {
    out.finish(format_args!(
        "{header}{message}",
        header = log_header(record.level(), record.target()),
    ))
}

fn level_filter(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Setup logging in function of verbosity.
///
/// Records are always written to stderr: stdout carries the inventory document
/// and nothing else.
pub fn setup_logging(verbosity: u8) -> Result<()> {
    let stderr_config = if console::user_attended_stderr() {
        fern::Dispatch::new().format(colored_format)
    } else {
        fern::Dispatch::new().format(plain_format)
    }
    .chain(io::stderr());

    fern::Dispatch::new()
        .level(level_filter(verbosity))
        .chain(stderr_config)
        .apply()
        .map_err(|e| Error::new(ErrorKind::Other, e))?;

    Ok(())
}
