//! Other entry model
//!
//! Free-form catch-all for observations that do not fit the structured
//! entry types (energy level, mood, sleep quality, ...).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// An "other" entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherEntry {
    pub id: i64,
    pub entry_type: String,
    pub sub_type: String,
    pub value: String,
    pub notes: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Data for creating an "other" entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherEntryCreate {
    pub entry_type: String,
    /// Defaults to the empty string
    pub sub_type: Option<String>,
    /// Defaults to the empty string
    pub value: Option<String>,
    /// Defaults to the empty string
    pub notes: Option<String>,
    /// Epoch milliseconds; defaults to now
    pub timestamp: Option<i64>,
}

impl OtherEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            entry_type: row.get("entry_type")?,
            sub_type: row.get("sub_type")?,
            value: row.get("value")?,
            notes: row.get("notes")?,
            timestamp: row.get("timestamp")?,
        })
    }

    /// Create a new "other" entry
    pub fn create(conn: &Connection, data: &OtherEntryCreate) -> DbResult<Self> {
        let timestamp = data
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        conn.execute(
            r#"
            INSERT INTO other_entries (entry_type, sub_type, value, notes, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.entry_type,
                data.sub_type.clone().unwrap_or_default(),
                data.value.clone().unwrap_or_default(),
                data.notes.clone().unwrap_or_default(),
                timestamp,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get an "other" entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM other_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List "other" entries ordered by timestamp descending
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM other_entries ORDER BY timestamp DESC LIMIT {}",
                n
            ),
            None => "SELECT * FROM other_entries ORDER BY timestamp DESC".to_string(),
        };

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Replace an "other" entry by ID
    pub fn update(conn: &Connection, entry: &OtherEntry) -> DbResult<()> {
        conn.execute(
            r#"
            UPDATE other_entries
            SET entry_type = ?1, sub_type = ?2, value = ?3, notes = ?4, timestamp = ?5
            WHERE id = ?6
            "#,
            params![
                entry.entry_type,
                entry.sub_type,
                entry.value,
                entry.notes,
                entry.timestamp,
                entry.id,
            ],
        )?;
        Ok(())
    }

    /// Delete an "other" entry by ID
    ///
    /// Returns false if no such entry existed.
    pub fn delete_by_id(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM other_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
