//! Food item model
//!
//! A single food eaten as part of a meal. Rows are owned by their meal and
//! are only ever written inside a meal's composite transaction.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A food item belonging to one meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub meal_id: i64,
    pub name: String,
}

impl FoodItem {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            meal_id: row.get("meal_id")?,
            name: row.get("name")?,
        })
    }

    /// Insert a food item for a meal
    pub fn insert_for_meal(conn: &Connection, meal_id: i64, name: &str) -> DbResult<i64> {
        conn.execute(
            "INSERT INTO food_items (meal_id, name) VALUES (?1, ?2)",
            params![meal_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a meal's food items in insertion order
    pub fn list_for_meal(conn: &Connection, meal_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM food_items WHERE meal_id = ?1 ORDER BY id")?;
        let items = stmt
            .query_map([meal_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Delete all food items for a meal, returning the number removed
    pub fn delete_for_meal(conn: &Connection, meal_id: i64) -> DbResult<usize> {
        let rows = conn.execute("DELETE FROM food_items WHERE meal_id = ?1", [meal_id])?;
        Ok(rows)
    }
}
