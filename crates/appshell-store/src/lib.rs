//! appshell-store: persistence collaborators for the app shell.
//! A session store for the credential token and a SQLite cache database.
//! Everything here blocks; the runtime calls it from the blocking pool.

pub mod database;
pub mod error;
pub mod session;

pub use database::{LocalDatabase, SqliteDatabase};
pub use error::StoreError;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
