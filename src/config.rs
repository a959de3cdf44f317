use std::path::PathBuf;

/// The database file used when none is configured.
pub const DEFAULT_DATABASE: &str = "database.txt";

/// The environment variable that can name the database file.
pub const DATABASE_ENV: &str = "KV_DATABASE";

/// Runtime configuration for a batch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Path of the database file.
    pub database: PathBuf,

    /// How much to log to stderr.
    pub verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from(DEFAULT_DATABASE),
            verbosity: Verbosity::default(),
        }
    }
}

/// How much to log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Only critical errors.
    Quiet,

    /// Warnings and errors. The default.
    Normal,

    /// Each `-v` flag raises the level by one, up to trace.
    Verbose(u64),
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Normal
    }
}

impl Verbosity {
    /// Combine the `-q` flag and number of `-v` flags; `-q` wins.
    pub fn from_flags(quiet: bool, verbose: u64) -> Verbosity {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, 0) => Verbosity::Normal,
            (false, n) => Verbosity::Verbose(n),
        }
    }

    /// The most verbose level to log at.
    pub fn level(self) -> slog::Level {
        match self {
            Verbosity::Quiet => slog::Level::Critical,
            Verbosity::Normal => slog::Level::Warning,
            Verbosity::Verbose(1) => slog::Level::Info,
            Verbosity::Verbose(2) => slog::Level::Debug,
            Verbosity::Verbose(_) => slog::Level::Trace,
        }
    }
}
