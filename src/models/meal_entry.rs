//! Meal entry model
//!
//! A logged meal together with its food items and tags. A meal spans three
//! tables, so every write goes through a composite transaction: either the
//! meal row, its food items, and its tag links all commit, or none do.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

use super::{FoodItem, MealTagCrossRef, Tag};

/// Meal type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

/// A meal entry row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub meal_type: MealType,
    pub notes: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Data for creating a meal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntryCreate {
    pub meal_type: MealType,
    /// Defaults to the empty string
    pub notes: Option<String>,
    /// Epoch milliseconds; defaults to now
    pub timestamp: Option<i64>,
}

/// A meal joined with its food items and tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealWithDetails {
    pub meal: MealEntry,
    /// Insertion order preserved
    pub foods: Vec<FoodItem>,
    /// Ordered by name; deduplicated by the unique tag constraint
    pub tags: Vec<Tag>,
}

impl MealEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_type_str: String = row.get("meal_type")?;
        let meal_type = MealType::from_str(&meal_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown meal type: {meal_type_str}").into(),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            meal_type,
            notes: row.get("notes")?,
            timestamp: row.get("timestamp")?,
        })
    }

    /// Insert a meal together with its food items and tags
    ///
    /// Food names keep their order (duplicates allowed); tag names are
    /// resolved to existing tags or created, then linked. The whole write
    /// commits as one transaction.
    pub fn create_with_details(
        conn: &mut Connection,
        data: &MealEntryCreate,
        foods: &[String],
        tags: &[String],
    ) -> DbResult<i64> {
        let notes = data.notes.clone().unwrap_or_default();
        let timestamp = data
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO meal_entries (meal_type, notes, timestamp) VALUES (?1, ?2, ?3)",
            params![data.meal_type.as_str(), notes, timestamp],
        )?;
        let meal_id = tx.last_insert_rowid();

        for name in foods {
            FoodItem::insert_for_meal(&tx, meal_id, name)?;
        }
        for name in tags {
            let tag = Tag::get_or_create(&tx, name)?;
            MealTagCrossRef::link(&tx, meal_id, tag.id)?;
        }

        tx.commit()?;
        Ok(meal_id)
    }

    /// Replace a meal row and all of its food items and tag links
    ///
    /// Prior details are deleted and fresh ones inserted from the given
    /// lists, atomically. A missing meal id is a no-op.
    pub fn update_with_details(
        conn: &mut Connection,
        meal: &MealEntry,
        foods: &[String],
        tags: &[String],
    ) -> DbResult<()> {
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE meal_entries SET meal_type = ?1, notes = ?2, timestamp = ?3 WHERE id = ?4",
            params![meal.meal_type.as_str(), meal.notes, meal.timestamp, meal.id],
        )?;
        if rows == 0 {
            return Ok(());
        }

        FoodItem::delete_for_meal(&tx, meal.id)?;
        MealTagCrossRef::clear_for_meal(&tx, meal.id)?;

        for name in foods {
            FoodItem::insert_for_meal(&tx, meal.id, name)?;
        }
        for name in tags {
            let tag = Tag::get_or_create(&tx, name)?;
            MealTagCrossRef::link(&tx, meal.id, tag.id)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a meal by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(meal) => Ok(Some(meal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List meals ordered by timestamp descending
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM meal_entries ORDER BY timestamp DESC LIMIT {}",
                n
            ),
            None => "SELECT * FROM meal_entries ORDER BY timestamp DESC".to_string(),
        };

        let mut stmt = conn.prepare(&sql)?;
        let meals = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(meals)
    }

    /// Get a meal joined with its food items and tags
    pub fn get_with_details_by_id(
        conn: &Connection,
        id: i64,
    ) -> DbResult<Option<MealWithDetails>> {
        let Some(meal) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let foods = FoodItem::list_for_meal(conn, meal.id)?;
        let tags = Tag::list_for_meal(conn, meal.id)?;

        Ok(Some(MealWithDetails { meal, foods, tags }))
    }

    /// List meals joined with their details, newest first
    pub fn list_with_details(
        conn: &Connection,
        limit: Option<i64>,
    ) -> DbResult<Vec<MealWithDetails>> {
        let meals = Self::list(conn, limit)?;
        let mut detailed = Vec::with_capacity(meals.len());

        for meal in meals {
            let foods = FoodItem::list_for_meal(conn, meal.id)?;
            let tags = Tag::list_for_meal(conn, meal.id)?;
            detailed.push(MealWithDetails { meal, foods, tags });
        }

        Ok(detailed)
    }

    /// Delete a meal by ID; food items and tag links cascade
    ///
    /// Returns false if no such meal existed.
    pub fn delete_by_id(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn breakfast(timestamp: i64) -> MealEntryCreate {
        MealEntryCreate {
            meal_type: MealType::Breakfast,
            notes: None,
            timestamp: Some(timestamp),
        }
    }

    fn count(conn: &Connection, sql: &str, id: i64) -> i64 {
        conn.query_row(sql, [id], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_create_with_details_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .with_conn_mut(|conn| {
                MealEntry::create_with_details(
                    conn,
                    &breakfast(1_000),
                    &strings(&["Eggs", "Toast"]),
                    &strings(&["High-Fat"]),
                )
            })
            .unwrap();

        let details = db
            .with_conn(|conn| MealEntry::get_with_details_by_id(conn, id))
            .unwrap()
            .unwrap();

        assert_eq!(details.meal.meal_type, MealType::Breakfast);
        assert_eq!(details.meal.notes, "");
        let food_names: Vec<_> = details.foods.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(food_names, ["Eggs", "Toast"]);
        let tag_names: Vec<_> = details.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, ["High-Fat"]);
    }

    #[test]
    fn test_food_order_preserved_and_duplicates_allowed() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .with_conn_mut(|conn| {
                MealEntry::create_with_details(
                    conn,
                    &breakfast(1_000),
                    &strings(&["Toast", "Eggs", "Toast"]),
                    &[],
                )
            })
            .unwrap();

        let details = db
            .with_conn(|conn| MealEntry::get_with_details_by_id(conn, id))
            .unwrap()
            .unwrap();
        let food_names: Vec<_> = details.foods.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(food_names, ["Toast", "Eggs", "Toast"]);
    }

    #[test]
    fn test_tags_deduplicated_and_reused_across_meals() {
        let db = Database::open_in_memory().unwrap();
        let (first, second) = db
            .with_conn_mut(|conn| {
                let first = MealEntry::create_with_details(
                    conn,
                    &breakfast(1_000),
                    &[],
                    &strings(&["Dairy", "Dairy", "Spicy"]),
                )?;
                let second = MealEntry::create_with_details(
                    conn,
                    &breakfast(2_000),
                    &[],
                    &strings(&["Dairy"]),
                )?;
                Ok((first, second))
            })
            .unwrap();

        db.with_conn(|conn| {
            let first_tags = Tag::list_for_meal(conn, first)?;
            let names: Vec<_> = first_tags.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, ["Dairy", "Spicy"]);

            let second_tags = Tag::list_for_meal(conn, second)?;
            assert_eq!(second_tags.len(), 1);
            // Same tag row, not a duplicate
            assert_eq!(second_tags[0].id, first_tags[0].id);

            assert_eq!(Tag::list(conn)?.len(), 2);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_with_details_fully_replaces_associations() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .with_conn_mut(|conn| {
                MealEntry::create_with_details(
                    conn,
                    &breakfast(1_000),
                    &strings(&["Eggs", "Toast"]),
                    &strings(&["High-Fat", "Gluten"]),
                )
            })
            .unwrap();

        let updated = MealEntry {
            id,
            meal_type: MealType::Lunch,
            notes: "leftovers".to_string(),
            timestamp: 5_000,
        };
        db.with_conn_mut(|conn| {
            MealEntry::update_with_details(conn, &updated, &strings(&["Soup"]), &strings(&["Warm"]))
        })
        .unwrap();

        let details = db
            .with_conn(|conn| MealEntry::get_with_details_by_id(conn, id))
            .unwrap()
            .unwrap();
        assert_eq!(details.meal.meal_type, MealType::Lunch);
        assert_eq!(details.meal.notes, "leftovers");
        assert_eq!(details.meal.timestamp, 5_000);
        let food_names: Vec<_> = details.foods.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(food_names, ["Soup"]);
        let tag_names: Vec<_> = details.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, ["Warm"]);

        // No leftover rows from the first write
        db.with_conn(|conn| {
            assert_eq!(
                count(conn, "SELECT COUNT(*) FROM food_items WHERE meal_id = ?1", id),
                1
            );
            assert_eq!(
                count(
                    conn,
                    "SELECT COUNT(*) FROM meal_tag_cross_refs WHERE meal_id = ?1",
                    id
                ),
                1
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_missing_meal_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let ghost = MealEntry {
            id: 999,
            meal_type: MealType::Dinner,
            notes: String::new(),
            timestamp: 1_000,
        };
        db.with_conn_mut(|conn| {
            MealEntry::update_with_details(conn, &ghost, &strings(&["Pasta"]), &[])
        })
        .unwrap();

        db.with_conn(|conn| {
            assert!(MealEntry::get_by_id(conn, 999)?.is_none());
            assert_eq!(
                count(conn, "SELECT COUNT(*) FROM food_items WHERE meal_id = ?1", 999),
                0
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_delete_cascades_to_foods_and_cross_refs() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .with_conn_mut(|conn| {
                MealEntry::create_with_details(
                    conn,
                    &breakfast(1_000),
                    &strings(&["Eggs"]),
                    &strings(&["High-Fat"]),
                )
            })
            .unwrap();

        db.with_conn(|conn| {
            assert!(MealEntry::delete_by_id(conn, id)?);
            assert_eq!(
                count(conn, "SELECT COUNT(*) FROM food_items WHERE meal_id = ?1", id),
                0
            );
            assert_eq!(
                count(
                    conn,
                    "SELECT COUNT(*) FROM meal_tag_cross_refs WHERE meal_id = ?1",
                    id
                ),
                0
            );
            // Tag itself survives for reuse
            assert_eq!(Tag::list(conn)?.len(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_delete_missing_meal_is_noop() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            assert!(!MealEntry::delete_by_id(conn, 42)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_with_details_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn_mut(|conn| {
            MealEntry::create_with_details(conn, &breakfast(1_000), &[], &[])?;
            MealEntry::create_with_details(
                conn,
                &MealEntryCreate {
                    meal_type: MealType::Dinner,
                    notes: None,
                    timestamp: Some(3_000),
                },
                &[],
                &[],
            )?;
            MealEntry::create_with_details(
                conn,
                &MealEntryCreate {
                    meal_type: MealType::Lunch,
                    notes: None,
                    timestamp: Some(2_000),
                },
                &[],
                &[],
            )?;
            Ok(())
        })
        .unwrap();

        db.with_conn(|conn| {
            let all = MealEntry::list_with_details(conn, None)?;
            let stamps: Vec<_> = all.iter().map(|m| m.meal.timestamp).collect();
            assert_eq!(stamps, [3_000, 2_000, 1_000]);

            let recent = MealEntry::list_with_details(conn, Some(2))?;
            assert_eq!(recent.len(), 2);
            assert_eq!(recent[0].meal.timestamp, 3_000);
            Ok(())
        })
        .unwrap();
    }
}
