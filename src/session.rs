use slog::{debug, trace};
use std::io::Write;

use crate::command::{Command, ParseError};
use crate::error::Result;
use crate::store::Store;

/// The result of handling one raw command argument.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The argument was valid and its command was applied.
    Applied,

    /// The argument was rejected; the store was not touched.
    Rejected(ParseError),
}

/// Applies commands to a [`Store`], writing any output to a sink.
///
/// Query output is one line per result: `<key>,<value>` for a found key or an entry, and
/// `<key> not found` for a `get` or `delete` of a missing key.
///
/// ```
/// use kv::{Outcome, Session, Store};
/// # use slog::o;
/// # let log = slog::Logger::root(slog::Discard, o!());
///
/// let mut store = Store::new();
/// let mut output = Vec::new();
/// let mut session = Session::new(log, &mut store, &mut output);
///
/// session.run_arg("p,5,hello").unwrap();
/// session.run_arg("g,5").unwrap();
/// assert!(matches!(session.run_arg("g,five").unwrap(), Outcome::Rejected(_)));
/// drop(session);
///
/// assert_eq!(output, b"5,hello\n");
/// ```
///
/// [`Store`]: struct.Store.html
pub struct Session<'a, W> {
    log: slog::Logger,
    store: &'a mut Store,
    output: W,
    rejected: usize,
}

impl<'a, W: Write> Session<'a, W> {
    /// Start a session over `store` that writes to `output`.
    pub fn new(log: slog::Logger, store: &'a mut Store, output: W) -> Self {
        Session {
            log,
            store,
            output,
            rejected: 0,
        }
    }

    /// Parse a raw argument and, if it's valid, apply it.
    ///
    /// Rejections are counted and returned rather than treated as errors. Errors are only
    /// returned when writing output fails.
    pub fn run_arg(&mut self, raw: &str) -> Result<Outcome> {
        match raw.parse() {
            Ok(command) => {
                self.execute(command)?;
                Ok(Outcome::Applied)
            },
            Err(err) => {
                debug!(self.log, "Rejected argument: {}", err; "argument" => raw);
                self.rejected += 1;
                Ok(Outcome::Rejected(err))
            },
        }
    }

    /// Apply a command to the store.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        trace!(self.log, "Executing"; "command" => %command);

        match command {
            Command::Put { key, value } => {
                self.store.put(key, value);
            },
            Command::Get { key } => match self.store.get(key) {
                Some(value) => {
                    write!(self.output, "{},", key)?;
                    self.output.write_all(value)?;
                    self.output.write_all(b"\n")?;
                },
                None => self.not_found(key)?,
            },
            Command::Delete { key } => {
                if self.store.delete(key).is_none() {
                    self.not_found(key)?;
                }
            },
            Command::Clear => self.store.clear(),
            Command::All => {
                for entry in self.store.iter() {
                    entry.write_line(&mut self.output)?;
                }
            },
        }

        Ok(())
    }

    /// The number of arguments rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Flush the output sink.
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    fn not_found(&mut self, key: i32) -> Result<()> {
        writeln!(self.output, "{} not found", key)?;
        Ok(())
    }
}
