//! Tag model
//!
//! Case-sensitive unique labels attached to meals through a cross-reference
//! table. Tags are created on first use and shared across meals.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A meal tag, unique by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Join row linking a meal to a tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MealTagCrossRef {
    pub meal_id: i64,
    pub tag_id: i64,
}

impl Tag {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }

    /// Look a tag up by name, creating it if absent
    ///
    /// Callers composing multi-table writes must invoke this inside their
    /// transaction so the lookup and insert commit together.
    pub fn get_or_create(conn: &Connection, name: &str) -> DbResult<Self> {
        let mut stmt = conn.prepare("SELECT * FROM tags WHERE name = ?1")?;
        match stmt.query_row([name], Self::from_row) {
            Ok(tag) => Ok(tag),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                conn.execute("INSERT INTO tags (name) VALUES (?1)", [name])?;
                let id = conn.last_insert_rowid();
                Ok(Self {
                    id,
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a tag by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM tags WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all tags ordered by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// List the tags linked to a meal, ordered by name
    pub fn list_for_meal(conn: &Connection, meal_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id AS id, t.name AS name
            FROM tags t
            JOIN meal_tag_cross_refs x ON x.tag_id = t.id
            WHERE x.meal_id = ?1
            ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([meal_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }
}

impl MealTagCrossRef {
    /// Link a meal to a tag
    ///
    /// Duplicate links are ignored, so a tag name repeated in the input
    /// list collapses to a single association.
    pub fn link(conn: &Connection, meal_id: i64, tag_id: i64) -> DbResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO meal_tag_cross_refs (meal_id, tag_id) VALUES (?1, ?2)",
            params![meal_id, tag_id],
        )?;
        Ok(())
    }

    /// Remove all tag links for a meal, returning the number removed
    pub fn clear_for_meal(conn: &Connection, meal_id: i64) -> DbResult<usize> {
        let rows = conn.execute(
            "DELETE FROM meal_tag_cross_refs WHERE meal_id = ?1",
            [meal_id],
        )?;
        Ok(rows)
    }
}
