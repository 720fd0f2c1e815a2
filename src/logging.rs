//! Global logger setup for programs built on the library.
//!
//! The structure algorithms only talk to the `log` facade; this installs a
//! `fern` dispatcher that writes to stdout and, optionally, a file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{Level, LevelFilter};

use crate::FailResult;

/// Builder-style setup for logging
#[derive(Debug, Clone, Default)]
pub struct GlobalLogger {
    path: Option<PathBuf>,
    verbosity: Verbosity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity { Default, Loud }

impl Default for Verbosity {
    fn default() -> Self { Verbosity::Default }
}

impl GlobalLogger {
    /// Also append to this file.
    pub fn path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self
    { self.path = Some(path.as_ref().to_owned()); self }

    /// Positive values turn on trace output from the search loops.
    pub fn verbosity(&mut self, level: i32) -> &mut Self {
        self.verbosity = match level > 0 {
            true => Verbosity::Loud,
            false => Verbosity::Default,
        };
        self
    }

    /// Install the logger.  Fails if a global logger already exists.
    pub fn apply(&mut self) -> FailResult<()> {
        let start = Instant::now();
        let mut fern = fern::Dispatch::new()
            .format(move |out, message, record| {
                let t = start.elapsed();
                out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                    t.as_secs(),
                    t.subsec_millis(),
                    record.target(),
                    ColorizedLevel(record.level()),
                    message))
            })
            .level(LevelFilter::Info)
            .level_for("xtal", LevelFilter::Debug)
            .level_for("xtal_structure", match self.verbosity {
                Verbosity::Default => LevelFilter::Debug,
                Verbosity::Loud => LevelFilter::Trace,
            })
            .chain(std::io::stdout());

        if let Some(path) = self.path.as_ref() {
            fern = fern.chain(fern::log_file(path)?);
        }

        fern.apply()?;
        Ok(())
    }
}

/// Log to stdout, and to a file if one is given.
pub fn setup_global_logger(path: Option<&Path>) -> FailResult<()> {
    let mut logger = GlobalLogger::default();
    if let Some(path) = path {
        logger.path(path);
    }
    logger.apply()
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);

impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(format!("{:<5}", self.0)))
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn level_text_survives_colouring() {
        let text = ColorizedLevel(Level::Warn).to_string();
        assert!(text.contains("WARN"));
    }

    #[test]
    fn builder() {
        let mut logger = GlobalLogger::default();
        logger.path("out.log").verbosity(2);
        assert_eq!(logger.path, Some(PathBuf::from("out.log")));
        assert_eq!(logger.verbosity, Verbosity::Loud);
    }
}
