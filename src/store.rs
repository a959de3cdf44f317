mod file;

use slog::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind::NotFound, Write};
use std::path::{Path, PathBuf};
use std::slice;

use tempfile::NamedTempFile;

use crate::error::Result;
use self::file::Reader;

/// A single key-value record.
///
/// Values are kept as raw bytes so that a database written by another tool, in any encoding,
/// survives a load and save unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    key: i32,
    value: Vec<u8>,
}

impl Entry {
    /// Construct an entry.
    pub fn new<V: Into<Vec<u8>>>(key: i32, value: V) -> Entry {
        Entry { key, value: value.into() }
    }

    /// The entry's key.
    pub fn key(&self) -> i32 {
        self.key
    }

    /// The entry's value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Write the entry as a `<key>,<value>` line, with the value bytes as they are.
    pub fn write_line<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{},", self.key)?;
        writer.write_all(&self.value)?;
        writer.write_all(b"\n")
    }
}

/// Formats as `<key>,<value>`, replacing any invalid UTF-8 in the value.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.key, String::from_utf8_lossy(&self.value))
    }
}

/// An ordered, in-memory key value store that is loaded from and saved to a flat text file.
///
/// Entries are kept in insertion order: new keys are appended, updates keep their position and
/// loading preserves the order of the file. Keys are unique.
///
/// The database file holds one `<key>,<value>` line per entry. There is no escaping, so values
/// containing `,` or a newline will not survive a save and load.
///
/// ```
/// use kv::Store;
///
/// let mut store = Store::new();
/// store.put(5, "hello");
/// store.put(3, "world");
/// assert_eq!(store.get(5), Some(&b"hello"[..]));
///
/// assert_eq!(store.delete(3), Some(b"world".to_vec()));
/// assert_eq!(store.get(3), None);
///
/// let mut saved = Vec::new();
/// store.save(&mut saved).unwrap();
/// assert_eq!(saved, b"5,hello\n");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Store {
    entries: Vec<Entry>,
    index: HashMap<i32, usize>,
}

impl Store {
    /// Construct a new, empty store.
    pub fn new() -> Store {
        Store::default()
    }

    /// Load a store from the database file at `path`.
    ///
    /// A missing file gives an empty store. Any other failure to open or read the file is an
    /// error.
    pub fn open<P: AsRef<Path>>(path: P, log: &slog::Logger) -> Result<Store> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(ref err) if err.kind() == NotFound => {
                debug!(log, "No database file, starting empty"; "path" => %path.display());
                return Ok(Store::new());
            },
            Err(err) => return Err(err.into()),
        };

        let store = Store::load(BufReader::new(file), log)?;
        info!(log, "Loaded database"; "path" => %path.display(), "entries" => store.len());
        Ok(store)
    }

    /// Load a store from `<key>,<value>` lines.
    ///
    /// Loading stops, with a warning, at the first malformed line: one without a `,` or with a
    /// key that isn't an `i32`. Values are taken byte for byte. Lines with an empty value are
    /// skipped. A repeated key updates the earlier entry.
    pub fn load<R: BufRead>(reader: R, log: &slog::Logger) -> Result<Store> {
        let mut store = Store::new();
        let mut reader = Reader::new(reader);

        for entry in reader.by_ref() {
            let (key, value) = entry?;
            if value.is_empty() {
                debug!(log, "Skipping entry without a value"; "key" => key);
                continue;
            }
            if store.put(key, value).is_some() {
                debug!(log, "Duplicate key in database"; "key" => key);
            }
        }

        if let Some((line, reason)) = reader.stopped() {
            warn!(log, "Ignoring rest of database after malformed line";
                "line" => line,
                "reason" => %reason);
        }

        Ok(store)
    }

    /// Write every entry as a `<key>,<value>` line, in store order.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        file::write(writer, &self.entries)?;
        Ok(())
    }

    /// Save the store to the database file at `path`.
    ///
    /// The store is written and synced to a temporary file next to `path` which then replaces
    /// it, so an interrupted save leaves the previous database intact. If `path` is a symlink the
    /// file it points to is replaced, not the link. There is no locking: concurrent saves to the
    /// same path are last-writer-wins.
    pub fn persist<P: AsRef<Path>>(&self, path: P, log: &slog::Logger) -> Result<()> {
        let path = resolve(path.as_ref())?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        if let Ok(metadata) = fs::metadata(&path) {
            temp.as_file().set_permissions(metadata.permissions())?;
        }

        let written = file::write(BufWriter::new(temp.as_file_mut()), &self.entries)?;
        temp.as_file().sync_all()?;
        temp.persist(&path)?;

        info!(log, "Saved database"; "path" => %path.display(), "entries" => written);
        Ok(())
    }

    /// Get the value of a key.
    pub fn get(&self, key: i32) -> Option<&[u8]> {
        self.index.get(&key).map(|&position| self.entries[position].value())
    }

    /// Whether the store holds a key.
    pub fn contains_key(&self, key: i32) -> bool {
        self.index.contains_key(&key)
    }

    /// Set a key to a value, returning the previous value if the key was already present.
    ///
    /// An existing entry keeps its position; a new one is appended.
    pub fn put<V: Into<Vec<u8>>>(&mut self, key: i32, value: V) -> Option<Vec<u8>> {
        let value = value.into();
        match self.index.get(&key) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].value, value)),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(Entry { key, value });
                None
            },
        }
    }

    /// Remove a key (and its value), returning the value if the key was present.
    pub fn delete(&mut self, key: i32) -> Option<Vec<u8>> {
        let position = self.index.remove(&key)?;
        let entry = self.entries.remove(position);

        // Everything after the removed entry shifted down by one.
        for later in &self.entries[position..] {
            if let Some(index) = self.index.get_mut(&later.key) {
                *index -= 1;
            }
        }

        Some(entry.value)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in store order.
    pub fn iter(&self) -> slice::Iter<Entry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = &'a Entry;
    type IntoIter = slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Follow symlinks to the file a save should replace. A path that doesn't exist yet is used as is.
fn resolve(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(ref err) if err.kind() == NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(err.into()),
    }
}
