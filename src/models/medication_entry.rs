//! Medication entry model
//!
//! A medication taken at a point in time. Dosage is free text ("500 mg",
//! "2 tablets") since the journal only replays what the user wrote.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// A medication entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub notes: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Data for creating a medication entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationCreate {
    pub name: String,
    /// Defaults to the empty string
    pub dosage: Option<String>,
    /// Defaults to the empty string
    pub notes: Option<String>,
    /// Epoch milliseconds; defaults to now
    pub timestamp: Option<i64>,
}

impl MedicationEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            dosage: row.get("dosage")?,
            notes: row.get("notes")?,
            timestamp: row.get("timestamp")?,
        })
    }

    /// Create a new medication entry
    pub fn create(conn: &Connection, data: &MedicationCreate) -> DbResult<Self> {
        let timestamp = data
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        conn.execute(
            r#"
            INSERT INTO medication_entries (name, dosage, notes, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.name,
                data.dosage.clone().unwrap_or_default(),
                data.notes.clone().unwrap_or_default(),
                timestamp,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a medication entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM medication_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List medication entries ordered by timestamp descending
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM medication_entries ORDER BY timestamp DESC LIMIT {}",
                n
            ),
            None => "SELECT * FROM medication_entries ORDER BY timestamp DESC".to_string(),
        };

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// List distinct medication names, sorted (used for autocomplete)
    pub fn list_names(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT DISTINCT name FROM medication_entries ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names)
    }

    /// Replace a medication entry by ID
    pub fn update(conn: &Connection, entry: &MedicationEntry) -> DbResult<()> {
        conn.execute(
            r#"
            UPDATE medication_entries
            SET name = ?1, dosage = ?2, notes = ?3, timestamp = ?4
            WHERE id = ?5
            "#,
            params![entry.name, entry.dosage, entry.notes, entry.timestamp, entry.id],
        )?;
        Ok(())
    }

    /// Delete a medication entry by ID
    ///
    /// Returns false if no such entry existed.
    pub fn delete_by_id(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM medication_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_names_are_distinct_and_sorted() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            for (name, ts) in [("Ibuprofen", 1), ("Antacid", 2), ("Ibuprofen", 3)] {
                MedicationEntry::create(
                    conn,
                    &MedicationCreate {
                        name: name.to_string(),
                        dosage: Some("200 mg".to_string()),
                        notes: None,
                        timestamp: Some(ts),
                    },
                )?;
            }

            assert_eq!(MedicationEntry::list_names(conn)?, ["Antacid", "Ibuprofen"]);
            assert_eq!(MedicationEntry::list(conn, None)?.len(), 3);
            assert_eq!(MedicationEntry::list(conn, Some(2))?.len(), 2);
            Ok(())
        })
        .unwrap();
    }
}
