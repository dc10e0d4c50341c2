//! Database layer (SQLite).

pub mod migrations;
pub mod sqlite;

pub use sqlite::{Db, OverdueBreak, UserRef};
