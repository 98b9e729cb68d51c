//! Durable key-value slot area.
//!
//! # Responsibility
//! - Store whole serialized records under fixed string keys.
//! - Write several slots atomically when one mutation touches them all.
//!
//! # Invariants
//! - `write_slots` either stores every entry or none of them.

use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::BTreeMap;

/// Contract for the durable area board records are persisted into.
pub trait SlotStore {
    /// Reads the raw record stored under `key`, if any.
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the records stored under every given key.
    fn write_slots(&mut self, entries: &[(&str, String)]) -> RepoResult<()>;
}

/// SQLite-backed slot store over the `board_slots` table.
pub struct SqliteSlotStore {
    conn: Connection,
}

impl SqliteSlotStore {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'board_slots'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable("board_slots"));
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl SlotStore for SqliteSlotStore {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM board_slots WHERE key = ?1;")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }

        Ok(None)
    }

    fn write_slots(&mut self, entries: &[(&str, String)]) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO board_slots (key, value)
                 VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Process-local slot store for hosts without durable storage and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: BTreeMap<String, String>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one raw record, e.g. to simulate a previous session.
    pub fn with_slot(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    pub fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }
}

impl SlotStore for MemorySlotStore {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write_slots(&mut self, entries: &[(&str, String)]) -> RepoResult<()> {
        for (key, value) in entries {
            self.slots.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
