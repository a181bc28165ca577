//! Export snapshot model
//!
//! A versioned, point-in-time copy of the journal flattened into plain
//! values for serialization. Exported meals inline their food and tag
//! names instead of carrying foreign keys, so the artifact is
//! self-contained. Export is one-directional: there is no importer.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::models::{MealEntry, MedicationEntry, OtherEntry, SymptomEntry};

/// Version written into every snapshot
pub const EXPORT_VERSION: u32 = 1;

/// A full journal snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: u32,
    /// Epoch milliseconds at collection time
    pub exported_at: i64,
    pub meals: Vec<ExportedMeal>,
    pub symptoms: Vec<ExportedSymptom>,
    pub medications: Vec<ExportedMedication>,
    pub other_entries: Vec<ExportedOtherEntry>,
}

/// A meal with its food and tag names inlined, ordered as displayed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMeal {
    pub meal_type: String,
    pub notes: String,
    pub timestamp: i64,
    pub foods: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSymptom {
    pub name: String,
    pub severity: i64,
    pub notes: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMedication {
    pub name: String,
    pub dosage: String,
    pub notes: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedOtherEntry {
    pub entry_type: String,
    pub sub_type: String,
    pub value: String,
    pub notes: String,
    pub timestamp: i64,
}

impl ExportData {
    /// Collect a snapshot of the current journal state
    pub fn collect(conn: &Connection) -> DbResult<Self> {
        let meals = MealEntry::list_with_details(conn, None)?
            .into_iter()
            .map(|detail| ExportedMeal {
                meal_type: detail.meal.meal_type.as_str().to_string(),
                notes: detail.meal.notes,
                timestamp: detail.meal.timestamp,
                foods: detail.foods.into_iter().map(|f| f.name).collect(),
                tags: detail.tags.into_iter().map(|t| t.name).collect(),
            })
            .collect();

        let symptoms = SymptomEntry::list(conn, None)?
            .into_iter()
            .map(|entry| ExportedSymptom {
                name: entry.name,
                severity: entry.severity,
                notes: entry.notes,
                start_time: entry.start_time,
                end_time: entry.end_time,
            })
            .collect();

        let medications = MedicationEntry::list(conn, None)?
            .into_iter()
            .map(|entry| ExportedMedication {
                name: entry.name,
                dosage: entry.dosage,
                notes: entry.notes,
                timestamp: entry.timestamp,
            })
            .collect();

        let other_entries = OtherEntry::list(conn, None)?
            .into_iter()
            .map(|entry| ExportedOtherEntry {
                entry_type: entry.entry_type,
                sub_type: entry.sub_type,
                value: entry.value,
                notes: entry.notes,
                timestamp: entry.timestamp,
            })
            .collect();

        Ok(Self {
            version: EXPORT_VERSION,
            exported_at: chrono::Utc::now().timestamp_millis(),
            meals,
            symptoms,
            medications,
            other_entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{MealEntryCreate, MealType, MedicationCreate, SymptomEntryCreate};

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_snapshot_matches_live_join() {
        let db = Database::open_in_memory().unwrap();
        let meal_id = db
            .with_conn_mut(|conn| {
                MealEntry::create_with_details(
                    conn,
                    &MealEntryCreate {
                        meal_type: MealType::Breakfast,
                        notes: Some("quick".to_string()),
                        timestamp: Some(1_000),
                    },
                    &strings(&["Eggs", "Toast"]),
                    &strings(&["High-Fat"]),
                )
            })
            .unwrap();

        db.with_conn(|conn| {
            SymptomEntry::create(
                conn,
                &SymptomEntryCreate {
                    name: "Bloating".to_string(),
                    severity: 4,
                    notes: None,
                    start_time: Some(2_000),
                    end_time: None,
                },
            )?;
            MedicationEntry::create(
                conn,
                &MedicationCreate {
                    name: "Antacid".to_string(),
                    dosage: Some("10 ml".to_string()),
                    notes: None,
                    timestamp: Some(3_000),
                },
            )?;

            let snapshot = ExportData::collect(conn)?;
            assert_eq!(snapshot.version, EXPORT_VERSION);
            assert_eq!(snapshot.meals.len(), 1);
            assert_eq!(snapshot.symptoms.len(), 1);
            assert_eq!(snapshot.medications.len(), 1);
            assert!(snapshot.other_entries.is_empty());

            // Exported meal mirrors the relational join
            let live = MealEntry::get_with_details_by_id(conn, meal_id)?.unwrap();
            let exported = &snapshot.meals[0];
            assert_eq!(exported.meal_type, live.meal.meal_type.as_str());
            let live_foods: Vec<_> = live.foods.iter().map(|f| f.name.clone()).collect();
            let live_tags: Vec<_> = live.tags.iter().map(|t| t.name.clone()).collect();
            assert_eq!(exported.foods, live_foods);
            assert_eq!(exported.tags, live_tags);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_json_round_trip_and_field_casing() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| {
            MealEntry::create_with_details(
                conn,
                &MealEntryCreate {
                    meal_type: MealType::Dinner,
                    notes: None,
                    timestamp: Some(9_000),
                },
                &strings(&["Rice"]),
                &strings(&["Spicy"]),
            )?;
            Ok(())
        })
        .unwrap();

        let snapshot = db.with_conn(|conn| ExportData::collect(conn)).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"exportedAt\""));
        assert!(json.contains("\"mealType\""));
        assert!(json.contains("\"otherEntries\""));

        let parsed: ExportData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, snapshot.version);
        assert_eq!(parsed.meals[0].foods, snapshot.meals[0].foods);
        assert_eq!(parsed.meals[0].tags, snapshot.meals[0].tags);
    }
}
