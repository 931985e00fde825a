//! Local storage for Clinica.
//!
//! A tiny key/value table in a SQLite file, playing the role browser local
//! storage plays for a web client. Only two keys are ever written: the
//! bearer token and the JSON-encoded user record. The session writes them on
//! login and logout, and the gateway reads the token before each request.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The name of the storage file inside the data directory.
pub const STORAGE_FILE: &str = "clinica.db";

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the JSON-encoded [`crate::models::User`].
pub const USER_KEY: &str = "user";

/// Handle to the storage file. Cheap to clone; every operation opens its own
/// connection.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Opens (creating if needed) the storage file at `path` and applies the
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// executed.
    pub fn open(path: impl Into<PathBuf>) -> rusqlite::Result<Self> {
        let storage = Self { path: path.into() };
        let conn = storage.connect()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        debug!(path = %storage.path.display(), "local storage ready");
        Ok(storage)
    }

    /// Opens the storage file inside `dir`.
    pub fn in_dir(dir: &Path) -> rusqlite::Result<Self> {
        Self::open(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }

    /// Reads the value stored under `key`, if any.
    pub fn get_item(&self, key: &str) -> rusqlite::Result<Option<String>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT value FROM local_storage WHERE key = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_item(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes `key`. Removing an absent key is not an error.
    pub fn remove_item(&self, key: &str) -> rusqlite::Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?", params![key])?;
        Ok(())
    }

    /// The persisted bearer token, if any.
    pub fn token(&self) -> rusqlite::Result<Option<String>> {
        self.get_item(TOKEN_KEY)
    }
}
