//! SQLite database module for the vendor payment engine.
//!
//! The schema lives in `migrations/` and is embedded into the binary, so that the server and tests can bring a fresh
//! database up to date with [`SqliteDatabase::run_migrations`].
mod errors;
mod sqlite_impl;

pub mod db;
pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;
