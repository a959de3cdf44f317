//! A tiny, batch-driven key value store mapping `i32` keys to `String` values (see [`Store`]).
//!
//! Each run of the `kv` binary loads the store from a flat text database file, applies the
//! [`Command`]s given as arguments in order, and saves the store back before exiting.
//!
//! [`Store`]: struct.Store.html
//! [`Command`]: enum.Command.html

#![deny(missing_docs)]

mod command;
mod config;
mod error;
mod session;
mod store;

pub use crate::command::{Command, ParseError};
pub use crate::config::{Config, Verbosity, DATABASE_ENV, DEFAULT_DATABASE};
pub use crate::error::{Error, Result};
pub use crate::session::{Outcome, Session};
pub use crate::store::{Entry, Store};
