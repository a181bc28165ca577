//! Symptom entry model
//!
//! A symptom observation with a bounded severity scale. A NULL end time
//! means the symptom is still ongoing.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Severity is recorded on a 1-10 scale
pub(crate) const SEVERITY_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// A symptom entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomEntry {
    pub id: i64,
    pub name: String,
    pub severity: i64,
    pub notes: String,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds; None while the symptom is ongoing
    pub end_time: Option<i64>,
}

/// Data for creating a symptom entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomEntryCreate {
    pub name: String,
    pub severity: i64,
    /// Defaults to the empty string
    pub notes: Option<String>,
    /// Epoch milliseconds; defaults to now
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

fn validate(severity: i64, start_time: i64, end_time: Option<i64>) -> DbResult<()> {
    if !SEVERITY_RANGE.contains(&severity) {
        return Err(DbError::Validation(format!(
            "severity must be between {} and {}, got {severity}",
            SEVERITY_RANGE.start(),
            SEVERITY_RANGE.end()
        )));
    }
    if let Some(end) = end_time {
        if end < start_time {
            return Err(DbError::Validation(format!(
                "end_time {end} is before start_time {start_time}"
            )));
        }
    }
    Ok(())
}

impl SymptomEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            severity: row.get("severity")?,
            notes: row.get("notes")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
        })
    }

    /// Create a new symptom entry
    pub fn create(conn: &Connection, data: &SymptomEntryCreate) -> DbResult<Self> {
        let start_time = data
            .start_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        validate(data.severity, start_time, data.end_time)?;

        conn.execute(
            r#"
            INSERT INTO symptom_entries (name, severity, notes, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.name,
                data.severity,
                data.notes.clone().unwrap_or_default(),
                start_time,
                data.end_time,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a symptom entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM symptom_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List symptom entries ordered by start time descending
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM symptom_entries ORDER BY start_time DESC LIMIT {}",
                n
            ),
            None => "SELECT * FROM symptom_entries ORDER BY start_time DESC".to_string(),
        };

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// List ongoing symptoms (no end time), newest first
    pub fn list_ongoing(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM symptom_entries WHERE end_time IS NULL ORDER BY start_time DESC",
        )?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Replace a symptom entry by ID
    pub fn update(conn: &Connection, entry: &SymptomEntry) -> DbResult<()> {
        validate(entry.severity, entry.start_time, entry.end_time)?;

        conn.execute(
            r#"
            UPDATE symptom_entries
            SET name = ?1, severity = ?2, notes = ?3, start_time = ?4, end_time = ?5
            WHERE id = ?6
            "#,
            params![
                entry.name,
                entry.severity,
                entry.notes,
                entry.start_time,
                entry.end_time,
                entry.id,
            ],
        )?;
        Ok(())
    }

    /// Set only the end time, leaving every other field untouched
    ///
    /// Returns false if no such symptom existed.
    pub fn set_end_time(conn: &Connection, id: i64, end_time: i64) -> DbResult<bool> {
        let Some(entry) = Self::get_by_id(conn, id)? else {
            return Ok(false);
        };
        if end_time < entry.start_time {
            return Err(DbError::Validation(format!(
                "end_time {end_time} is before start_time {}",
                entry.start_time
            )));
        }

        conn.execute(
            "UPDATE symptom_entries SET end_time = ?1 WHERE id = ?2",
            params![end_time, id],
        )?;
        Ok(true)
    }

    /// Delete a symptom entry by ID
    ///
    /// Returns false if no such entry existed.
    pub fn delete_by_id(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM symptom_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
