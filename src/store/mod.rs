//! Local, file-backed [`NotebookClient`](crate::client::NotebookClient).
//!
//! Plays the service's part: assigns ids, owners, creation times and default
//! checkpoint names, and keeps checkpoint content as opaque bytes.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;
