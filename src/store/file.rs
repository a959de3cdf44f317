use std::fmt;
use std::io::{BufRead, Write};
use std::num::ParseIntError;

use crate::error::Result;
use super::Entry;

const FIELD_SEPARATOR: u8 = b',';
const LINE_TERMINATOR: u8 = b'\n';

/// Why a line of the database file could not be read as an entry.
#[derive(Debug)]
pub enum Malformed {
    /// The line had no `,` between key and value (this includes blank lines).
    MissingSeparator,

    /// The key was not valid UTF-8.
    NonUtf8Key,

    /// The key was not a base 10 `i32`.
    InvalidKey(ParseIntError),
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Malformed::MissingSeparator => write!(f, "missing ',' separator"),
            Malformed::NonUtf8Key => write!(f, "key is not UTF-8"),
            Malformed::InvalidKey(err) => write!(f, "invalid key: {}", err),
        }
    }
}

/// An iterator over the `(key, value)` pairs in a database file.
///
/// Values are returned as the raw bytes between the first `,` and the end of the line.
///
/// Iteration ends at the end of the stream, or at the first malformed line. Lines after a
/// malformed line are never read; [`Reader::stopped`] reports where and why iteration ended early.
///
/// [`Reader::stopped`]: #method.stopped
pub struct Reader<R> {
    reader: R,
    line: usize,
    buf: Vec<u8>,
    stopped: Option<(usize, Malformed)>,
}

impl<R: BufRead> Reader<R> {
    pub fn new(reader: R) -> Reader<R> {
        Reader {
            reader,
            line: 0,
            buf: Vec::new(),
            stopped: None,
        }
    }

    /// The (1-based) line number and reason for a load that stopped at a malformed line.
    pub fn stopped(&self) -> Option<&(usize, Malformed)> {
        self.stopped.as_ref()
    }

    fn read_line(&mut self) -> Result<Option<std::result::Result<(i32, Vec<u8>), Malformed>>> {
        self.buf.clear();
        if self.reader.read_until(LINE_TERMINATOR, &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;

        let mut line = &self.buf[..];
        if line.last() == Some(&LINE_TERMINATOR) {
            line = &line[..line.len() - 1];
        }
        Ok(Some(parse_line(line)))
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<(i32, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped.is_some() {
            return None;
        }
        match self.read_line() {
            Ok(Some(Ok(entry))) => Some(Ok(entry)),
            Ok(Some(Err(malformed))) => {
                self.stopped = Some((self.line, malformed));
                None
            },
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Split a line (without its terminator) at the first `,` into a key and a value.
fn parse_line(line: &[u8]) -> std::result::Result<(i32, Vec<u8>), Malformed> {
    let separator = line
        .iter()
        .position(|&b| b == FIELD_SEPARATOR)
        .ok_or(Malformed::MissingSeparator)?;
    let key = std::str::from_utf8(&line[..separator]).map_err(|_| Malformed::NonUtf8Key)?;
    let key = key.parse().map_err(Malformed::InvalidKey)?;
    Ok((key, line[separator + 1..].to_vec()))
}

/// Write `entries` as `<key>,<value>` lines, skipping any entry without a value.
///
/// Returns the number of lines written.
pub fn write<'a, W, I>(mut writer: W, entries: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Entry>,
{
    let mut written = 0;
    for entry in entries.into_iter().filter(|entry| !entry.value().is_empty()) {
        entry.write_line(&mut writer)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
