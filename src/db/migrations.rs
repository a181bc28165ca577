//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- MEAL ENTRIES
        -- One row per logged meal; food items and tag
        -- links hang off this table
        -- ============================================
        CREATE TABLE meal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack')),
            notes TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL               -- epoch milliseconds
        );

        CREATE INDEX idx_meal_entries_timestamp ON meal_entries(timestamp);

        -- ============================================
        -- FOOD ITEMS
        -- Foods eaten in a meal, insertion order matters
        -- ============================================
        CREATE TABLE food_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES meal_entries(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        );

        CREATE INDEX idx_food_items_meal ON food_items(meal_id);

        -- ============================================
        -- TAGS
        -- Case-sensitive unique names, reused across meals
        -- ============================================
        CREATE TABLE tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        -- ============================================
        -- MEAL <-> TAG CROSS REFERENCES
        -- ============================================
        CREATE TABLE meal_tag_cross_refs (
            meal_id INTEGER NOT NULL REFERENCES meal_entries(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id),
            PRIMARY KEY (meal_id, tag_id)
        );

        CREATE INDEX idx_meal_tag_cross_refs_tag ON meal_tag_cross_refs(tag_id);

        -- ============================================
        -- SYMPTOM ENTRIES
        -- NULL end_time means the symptom is ongoing
        -- ============================================
        CREATE TABLE symptom_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            severity INTEGER NOT NULL CHECK(severity BETWEEN 1 AND 10),
            notes TEXT NOT NULL DEFAULT '',
            start_time INTEGER NOT NULL,             -- epoch milliseconds
            end_time INTEGER,
            CHECK(end_time IS NULL OR end_time >= start_time)
        );

        CREATE INDEX idx_symptom_entries_start ON symptom_entries(start_time);

        -- ============================================
        -- BOWEL MOVEMENT ENTRIES
        -- ============================================
        CREATE TABLE bowel_movement_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bristol_type INTEGER NOT NULL CHECK(bristol_type BETWEEN 1 AND 7),
            urgency INTEGER NOT NULL CHECK(urgency BETWEEN 1 AND 5),
            notes TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL
        );

        CREATE INDEX idx_bowel_movement_entries_timestamp ON bowel_movement_entries(timestamp);

        -- ============================================
        -- MEDICATION ENTRIES
        -- ============================================
        CREATE TABLE medication_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            dosage TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL
        );

        CREATE INDEX idx_medication_entries_timestamp ON medication_entries(timestamp);
        CREATE INDEX idx_medication_entries_name ON medication_entries(name);

        -- ============================================
        -- OTHER ENTRIES
        -- Free-form catch-all (energy, mood, sleep, ...)
        -- ============================================
        CREATE TABLE other_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_type TEXT NOT NULL,
            sub_type TEXT NOT NULL DEFAULT '',
            value TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL
        );

        CREATE INDEX idx_other_entries_timestamp ON other_entries(timestamp);

        -- ============================================
        -- BLOOD GLUCOSE ENTRIES
        -- Severity band is computed at display time, never stored
        -- ============================================
        CREATE TABLE blood_glucose_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            glucose_level REAL NOT NULL CHECK(glucose_level > 0),
            unit TEXT NOT NULL CHECK(unit IN ('mg_dl', 'mmol_l')),
            meal_context TEXT CHECK(meal_context IN ('fasting', 'before_meal', 'after_meal', 'bedtime')),
            notes TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL
        );

        CREATE INDEX idx_blood_glucose_entries_timestamp ON blood_glucose_entries(timestamp);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            run_migrations(conn)?;
            assert_eq!(get_schema_version(conn)?, SCHEMA_VERSION);
            Ok(())
        })
        .unwrap();
    }
}
