//! Bowel movement entry model
//!
//! Observations recorded on the Bristol stool scale with an urgency rating.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Urgency is recorded on a 1-5 scale
pub(crate) const URGENCY_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

/// Bristol stool scale type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BristolType {
    Type1,
    Type2,
    Type3,
    Type4,
    Type5,
    Type6,
    Type7,
}

impl BristolType {
    pub fn as_i64(&self) -> i64 {
        match self {
            BristolType::Type1 => 1,
            BristolType::Type2 => 2,
            BristolType::Type3 => 3,
            BristolType::Type4 => 4,
            BristolType::Type5 => 5,
            BristolType::Type6 => 6,
            BristolType::Type7 => 7,
        }
    }

    pub fn from_i64(n: i64) -> Option<Self> {
        match n {
            1 => Some(BristolType::Type1),
            2 => Some(BristolType::Type2),
            3 => Some(BristolType::Type3),
            4 => Some(BristolType::Type4),
            5 => Some(BristolType::Type5),
            6 => Some(BristolType::Type6),
            7 => Some(BristolType::Type7),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BristolType::Type1 => "Type 1 - Separate hard lumps",
            BristolType::Type2 => "Type 2 - Lumpy and sausage-like",
            BristolType::Type3 => "Type 3 - Sausage with surface cracks",
            BristolType::Type4 => "Type 4 - Smooth, soft sausage",
            BristolType::Type5 => "Type 5 - Soft blobs with clear edges",
            BristolType::Type6 => "Type 6 - Mushy with ragged edges",
            BristolType::Type7 => "Type 7 - Liquid, no solid pieces",
        }
    }
}

/// A bowel movement entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BowelMovementEntry {
    pub id: i64,
    pub bristol_type: BristolType,
    pub urgency: i64,
    pub notes: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Data for creating a bowel movement entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BowelMovementCreate {
    pub bristol_type: BristolType,
    pub urgency: i64,
    /// Defaults to the empty string
    pub notes: Option<String>,
    /// Epoch milliseconds; defaults to now
    pub timestamp: Option<i64>,
}

fn validate_urgency(urgency: i64) -> DbResult<()> {
    if !URGENCY_RANGE.contains(&urgency) {
        return Err(DbError::Validation(format!(
            "urgency must be between {} and {}, got {urgency}",
            URGENCY_RANGE.start(),
            URGENCY_RANGE.end()
        )));
    }
    Ok(())
}

impl BowelMovementEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let bristol: i64 = row.get("bristol_type")?;
        let bristol_type = BristolType::from_i64(bristol).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Integer,
                format!("unknown bristol type: {bristol}").into(),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            bristol_type,
            urgency: row.get("urgency")?,
            notes: row.get("notes")?,
            timestamp: row.get("timestamp")?,
        })
    }

    /// Create a new bowel movement entry
    pub fn create(conn: &Connection, data: &BowelMovementCreate) -> DbResult<Self> {
        validate_urgency(data.urgency)?;
        let timestamp = data
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        conn.execute(
            r#"
            INSERT INTO bowel_movement_entries (bristol_type, urgency, notes, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.bristol_type.as_i64(),
                data.urgency,
                data.notes.clone().unwrap_or_default(),
                timestamp,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a bowel movement entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM bowel_movement_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List bowel movement entries ordered by timestamp descending
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM bowel_movement_entries ORDER BY timestamp DESC LIMIT {}",
                n
            ),
            None => "SELECT * FROM bowel_movement_entries ORDER BY timestamp DESC".to_string(),
        };

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Replace a bowel movement entry by ID
    pub fn update(conn: &Connection, entry: &BowelMovementEntry) -> DbResult<()> {
        validate_urgency(entry.urgency)?;

        conn.execute(
            r#"
            UPDATE bowel_movement_entries
            SET bristol_type = ?1, urgency = ?2, notes = ?3, timestamp = ?4
            WHERE id = ?5
            "#,
            params![
                entry.bristol_type.as_i64(),
                entry.urgency,
                entry.notes,
                entry.timestamp,
                entry.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a bowel movement entry by ID
    ///
    /// Returns false if no such entry existed.
    pub fn delete_by_id(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM bowel_movement_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_create_and_update() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let entry = BowelMovementEntry::create(
                conn,
                &BowelMovementCreate {
                    bristol_type: BristolType::Type4,
                    urgency: 2,
                    notes: None,
                    timestamp: Some(1_000),
                },
            )?;
            assert_eq!(entry.bristol_type, BristolType::Type4);
            assert_eq!(entry.notes, "");

            let mut changed = entry.clone();
            changed.bristol_type = BristolType::Type6;
            changed.urgency = 5;
            BowelMovementEntry::update(conn, &changed)?;

            let fetched = BowelMovementEntry::get_by_id(conn, entry.id)?.unwrap();
            assert_eq!(fetched.bristol_type, BristolType::Type6);
            assert_eq!(fetched.urgency, 5);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_urgency_out_of_range_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let result = BowelMovementEntry::create(
                conn,
                &BowelMovementCreate {
                    bristol_type: BristolType::Type1,
                    urgency: 9,
                    notes: None,
                    timestamp: Some(1_000),
                },
            );
            assert!(matches!(result, Err(DbError::Validation(_))));
            Ok(())
        })
        .unwrap();
    }
}
