use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// The separator between the fields of a command argument.
const FIELD_SEPARATOR: char = ',';

/// The most fields a command argument may have (`p,<key>,<value>`).
const MAX_FIELDS: usize = 3;

/// An enum representing the available store commands.
///
/// Commands are given on the command line as comma separated fields:
///
/// ```text
/// a                    -> enumerate all
/// c                    -> clear
/// g,<key>              -> get
/// d,<key>              -> delete
/// p,<key>,<value>      -> put
/// ```
///
/// ```
/// use kv::Command;
///
/// let command: Command = "p,5,hello".parse().unwrap();
/// assert_eq!(command, Command::Put { key: 5, value: "hello".to_owned() });
/// assert_eq!(command.to_string(), "p,5,hello");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Set a given `key` to a given `value`, inserting it if it doesn't exist.
    Put {
        /// The key to set.
        key: i32,

        /// The value to set. Never empty.
        value: String,
    },

    /// Print the value of a given `key`.
    Get {
        /// The key whose value to print.
        key: i32,
    },

    /// Remove a given `key` (and its value).
    Delete {
        /// The key to remove.
        key: i32,
    },

    /// Remove every entry.
    Clear,

    /// Print every entry.
    All,
}

/// The reasons a command argument can be rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The argument had more than three comma separated fields.
    TooManyFields,

    /// The command token wasn't one of `a`, `c`, `g`, `d` or `p`.
    UnknownCommand(String),

    /// A field was given that the command doesn't take.
    UnexpectedField,

    /// `g`, `d` or `p` was given without a key.
    MissingKey,

    /// `p` was given without a value.
    MissingValue,

    /// `p` was given an empty value.
    EmptyValue,

    /// The key was not a base 10 integer in the `i32` range.
    InvalidKey(ParseIntError),
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::TooManyFields => write!(f, "too many fields (at most {})", MAX_FIELDS),
            ParseError::UnknownCommand(token) => write!(f, "unknown command '{}'", token),
            ParseError::UnexpectedField => write!(f, "unexpected field"),
            ParseError::MissingKey => write!(f, "missing key"),
            ParseError::MissingValue => write!(f, "missing value"),
            ParseError::EmptyValue => write!(f, "empty value"),
            ParseError::InvalidKey(err) => write!(f, "invalid key: {}", err),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
        if fields.len() > MAX_FIELDS {
            return Err(ParseError::TooManyFields);
        }

        let key = fields.get(1).copied();
        let value = fields.get(2).copied();

        match fields[0] {
            "a" | "c" => {
                if key.is_some() {
                    return Err(ParseError::UnexpectedField);
                }
                Ok(if fields[0] == "a" { Command::All } else { Command::Clear })
            },
            "g" | "d" => {
                if value.is_some() {
                    return Err(ParseError::UnexpectedField);
                }
                let key = parse_key(key)?;
                Ok(if fields[0] == "g" { Command::Get { key } } else { Command::Delete { key } })
            },
            "p" => {
                let key = parse_key(key)?;
                match value {
                    None => Err(ParseError::MissingValue),
                    Some("") => Err(ParseError::EmptyValue),
                    Some(value) => Ok(Command::Put { key, value: value.to_owned() }),
                }
            },
            token => Err(ParseError::UnknownCommand(token.to_owned())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Put { key, value } => write!(f, "p,{},{}", key, value),
            Command::Get { key } => write!(f, "g,{}", key),
            Command::Delete { key } => write!(f, "d,{}", key),
            Command::Clear => write!(f, "c"),
            Command::All => write!(f, "a"),
        }
    }
}

/// Parse a key field.
///
/// Leading whitespace is skipped (as C's `strtol` does, so existing scripts keep working) but
/// anything else around the digits is rejected.
fn parse_key(field: Option<&str>) -> Result<i32, ParseError> {
    let field = field.ok_or(ParseError::MissingKey)?;
    let digits = field.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    digits.parse().map_err(ParseError::InvalidKey)
}
