//! Durable key-value storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Store whole structured-text values under fixed logical keys.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - A write replaces the full value for its key.
//! - `set_values` writes all entries or none.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer error for key-value reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A collection could not be serialized for storage.
    Encode(serde_json::Error),
    /// A stored value exists but cannot be decoded.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode stored value: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key-value store holding structured-text values.
pub trait KvRepository {
    /// Reads the value under `key`, `None` when never written.
    fn get_value(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the value under `key`.
    fn set_value(&mut self, key: &str, value: &str) -> RepoResult<()>;
    /// Replaces several values in one atomic write.
    fn set_values(&mut self, entries: &[(&str, &str)]) -> RepoResult<()>;
}

/// SQLite-backed key-value store over the `kv_entries` table.
pub struct SqliteKvRepository {
    conn: Connection,
}

impl SqliteKvRepository {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

const UPSERT_SQL: &str = "INSERT INTO kv_entries (key, value, updated_at)
     VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

impl KvRepository for SqliteKvRepository {
    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_value(&mut self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn set_values(&mut self, entries: &[(&str, &str)]) -> RepoResult<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(UPSERT_SQL, params![key, value])?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KvRepository, SqliteKvRepository};
    use crate::db::open_db_in_memory;

    fn repo() -> SqliteKvRepository {
        SqliteKvRepository::new(open_db_in_memory().expect("in-memory db"))
    }

    #[test]
    fn missing_key_reads_as_none() {
        assert_eq!(repo().get_value("units").expect("read"), None);
    }

    #[test]
    fn set_value_overwrites_previous_value() {
        let mut repo = repo();
        repo.set_value("units", "[]").expect("first write");
        repo.set_value("units", "[1]").expect("second write");
        assert_eq!(repo.get_value("units").expect("read").as_deref(), Some("[1]"));
    }

    #[test]
    fn set_values_writes_every_entry() {
        let mut repo = repo();
        repo.set_values(&[("a", "1"), ("b", "2")]).expect("batch write");
        assert_eq!(repo.get_value("a").expect("read a").as_deref(), Some("1"));
        assert_eq!(repo.get_value("b").expect("read b").as_deref(), Some("2"));
    }
}
