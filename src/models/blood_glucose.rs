//! Blood glucose entry model
//!
//! Glucose readings in mg/dL or mmol/L with an optional meal context.
//! The clinical band (low/normal/elevated/high) is computed for display
//! and never stored.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Glucose measurement unit enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseUnit {
    MgDl,
    MmolL,
}

impl GlucoseUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseUnit::MgDl => "mg_dl",
            GlucoseUnit::MmolL => "mmol_l",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['/', '-'], "_").as_str() {
            "mg_dl" | "mgdl" => Some(GlucoseUnit::MgDl),
            "mmol_l" | "mmoll" => Some(GlucoseUnit::MmolL),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GlucoseUnit::MgDl => "mg/dL",
            GlucoseUnit::MmolL => "mmol/L",
        }
    }

    /// Band thresholds: upper bounds for low, normal, and elevated
    fn thresholds(&self) -> (f64, f64, f64) {
        match self {
            GlucoseUnit::MgDl => (70.0, 99.0, 125.0),
            GlucoseUnit::MmolL => (3.9, 5.5, 6.9),
        }
    }

    /// Classify a level into its clinical band
    pub fn band(&self, level: f64) -> GlucoseBand {
        let (low, normal, elevated) = self.thresholds();
        if level < low {
            GlucoseBand::Low
        } else if level <= normal {
            GlucoseBand::Normal
        } else if level <= elevated {
            GlucoseBand::Elevated
        } else {
            GlucoseBand::High
        }
    }
}

/// Meal context enum for a glucose reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseMealContext {
    Fasting,
    BeforeMeal,
    AfterMeal,
    Bedtime,
}

impl GlucoseMealContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseMealContext::Fasting => "fasting",
            GlucoseMealContext::BeforeMeal => "before_meal",
            GlucoseMealContext::AfterMeal => "after_meal",
            GlucoseMealContext::Bedtime => "bedtime",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "fasting" => Some(GlucoseMealContext::Fasting),
            "before_meal" => Some(GlucoseMealContext::BeforeMeal),
            "after_meal" => Some(GlucoseMealContext::AfterMeal),
            "bedtime" => Some(GlucoseMealContext::Bedtime),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GlucoseMealContext::Fasting => "Fasting",
            GlucoseMealContext::BeforeMeal => "Before Meal",
            GlucoseMealContext::AfterMeal => "After Meal",
            GlucoseMealContext::Bedtime => "Bedtime",
        }
    }
}

/// Clinical severity band of a reading, computed at display time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlucoseBand {
    Low,
    Normal,
    Elevated,
    High,
}

/// A blood glucose entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodGlucoseEntry {
    pub id: i64,
    pub glucose_level: f64,
    pub unit: GlucoseUnit,
    pub meal_context: Option<GlucoseMealContext>,
    pub notes: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Data for creating a blood glucose entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodGlucoseCreate {
    pub glucose_level: f64,
    pub unit: GlucoseUnit,
    pub meal_context: Option<GlucoseMealContext>,
    /// Defaults to the empty string
    pub notes: Option<String>,
    /// Epoch milliseconds; defaults to now
    pub timestamp: Option<i64>,
}

fn validate_level(level: f64) -> DbResult<()> {
    if !(level.is_finite() && level > 0.0) {
        return Err(DbError::Validation(format!(
            "glucose level must be a positive number, got {level}"
        )));
    }
    Ok(())
}

impl BloodGlucoseEntry {
    /// Clinical band for this reading
    pub fn band(&self) -> GlucoseBand {
        self.unit.band(self.glucose_level)
    }

    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let unit_str: String = row.get("unit")?;
        let unit = GlucoseUnit::from_str(&unit_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown glucose unit: {unit_str}").into(),
            )
        })?;

        let context_str: Option<String> = row.get("meal_context")?;
        let meal_context = match context_str {
            Some(s) => Some(GlucoseMealContext::from_str(&s).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("unknown meal context: {s}").into(),
                )
            })?),
            None => None,
        };

        Ok(Self {
            id: row.get("id")?,
            glucose_level: row.get("glucose_level")?,
            unit,
            meal_context,
            notes: row.get("notes")?,
            timestamp: row.get("timestamp")?,
        })
    }

    /// Create a new blood glucose entry
    pub fn create(conn: &Connection, data: &BloodGlucoseCreate) -> DbResult<Self> {
        validate_level(data.glucose_level)?;
        let timestamp = data
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        conn.execute(
            r#"
            INSERT INTO blood_glucose_entries (glucose_level, unit, meal_context, notes, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.glucose_level,
                data.unit.as_str(),
                data.meal_context.map(|c| c.as_str()),
                data.notes.clone().unwrap_or_default(),
                timestamp,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a blood glucose entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM blood_glucose_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List blood glucose entries ordered by timestamp descending
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM blood_glucose_entries ORDER BY timestamp DESC LIMIT {}",
                n
            ),
            None => "SELECT * FROM blood_glucose_entries ORDER BY timestamp DESC".to_string(),
        };

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Replace a blood glucose entry by ID
    pub fn update(conn: &Connection, entry: &BloodGlucoseEntry) -> DbResult<()> {
        validate_level(entry.glucose_level)?;

        conn.execute(
            r#"
            UPDATE blood_glucose_entries
            SET glucose_level = ?1, unit = ?2, meal_context = ?3, notes = ?4, timestamp = ?5
            WHERE id = ?6
            "#,
            params![
                entry.glucose_level,
                entry.unit.as_str(),
                entry.meal_context.map(|c| c.as_str()),
                entry.notes,
                entry.timestamp,
                entry.id,
            ],
        )?;
        Ok(())
    }

    /// Delete a blood glucose entry by ID
    ///
    /// Returns false if no such entry existed.
    pub fn delete_by_id(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM blood_glucose_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_mg_dl_bands() {
        assert_eq!(GlucoseUnit::MgDl.band(65.0), GlucoseBand::Low);
        assert_eq!(GlucoseUnit::MgDl.band(70.0), GlucoseBand::Normal);
        assert_eq!(GlucoseUnit::MgDl.band(95.0), GlucoseBand::Normal);
        assert_eq!(GlucoseUnit::MgDl.band(99.0), GlucoseBand::Normal);
        assert_eq!(GlucoseUnit::MgDl.band(110.0), GlucoseBand::Elevated);
        assert_eq!(GlucoseUnit::MgDl.band(125.0), GlucoseBand::Elevated);
        assert_eq!(GlucoseUnit::MgDl.band(130.0), GlucoseBand::High);
    }

    #[test]
    fn test_mmol_l_bands() {
        assert_eq!(GlucoseUnit::MmolL.band(3.2), GlucoseBand::Low);
        assert_eq!(GlucoseUnit::MmolL.band(5.0), GlucoseBand::Normal);
        assert_eq!(GlucoseUnit::MmolL.band(6.0), GlucoseBand::Elevated);
        assert_eq!(GlucoseUnit::MmolL.band(7.2), GlucoseBand::High);
    }

    #[test]
    fn test_unit_aliases() {
        assert_eq!(GlucoseUnit::from_str("mg/dL"), Some(GlucoseUnit::MgDl));
        assert_eq!(GlucoseUnit::from_str("mmol/l"), Some(GlucoseUnit::MmolL));
        assert_eq!(GlucoseUnit::from_str("lbs"), None);
    }

    #[test]
    fn test_non_positive_level_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            for level in [0.0, -12.5, f64::NAN] {
                let result = BloodGlucoseEntry::create(
                    conn,
                    &BloodGlucoseCreate {
                        glucose_level: level,
                        unit: GlucoseUnit::MgDl,
                        meal_context: None,
                        notes: None,
                        timestamp: Some(1_000),
                    },
                );
                assert!(matches!(result, Err(DbError::Validation(_))));
            }
            assert!(BloodGlucoseEntry::list(conn, None)?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_round_trip_with_context() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let entry = BloodGlucoseEntry::create(
                conn,
                &BloodGlucoseCreate {
                    glucose_level: 95.0,
                    unit: GlucoseUnit::MgDl,
                    meal_context: Some(GlucoseMealContext::Fasting),
                    notes: None,
                    timestamp: Some(1_000),
                },
            )?;
            assert_eq!(entry.band(), GlucoseBand::Normal);

            let fetched = BloodGlucoseEntry::get_by_id(conn, entry.id)?.unwrap();
            assert_eq!(fetched.unit, GlucoseUnit::MgDl);
            assert_eq!(fetched.meal_context, Some(GlucoseMealContext::Fasting));
            Ok(())
        })
        .unwrap();
    }
}
