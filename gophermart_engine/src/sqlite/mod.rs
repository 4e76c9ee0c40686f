//! SQLite backend for the Gophermart engine.
//!
//! SQLite locks at database granularity, so the per-user row locks the ledger asks for are provided by taking the
//! database write lock at the start of each ledger transaction. This serializes more than strictly necessary, but
//! never less.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
