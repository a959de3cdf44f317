use crate::command::ParseError;

/// An enum representing the errors that can occur when loading, saving or driving a `Store`.
#[derive(Debug)]
pub enum Error {
    /// Wraps IO errors that occur when trying to read or write the database file.
    Io(std::io::Error),

    /// Wraps errors that occur when moving a freshly written database over the old one.
    Persist(tempfile::PersistError),

    /// Indicates that a command argument could not be parsed.
    Parse(ParseError),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "Database IO error: {}", err),
            Error::Persist(err) => write!(f, "Database persist error: {}", err),
            Error::Parse(err) => write!(f, "Command parse error: {}", err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Error {
        Error::Persist(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

/// A convenience `Result` alias that pins the error to our own.
pub type Result<V> = std::result::Result<V, Error>;
