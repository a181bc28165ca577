//! Repository façade
//!
//! Aggregates the per-entity data access into one surface: continuous
//! watch views for the presentation layer plus one-shot mutations.
//! Mutations announce their tables on the change channel only after the
//! write has committed, so a watcher observes either the pre-write or the
//! fully-post-write state, never an intermediate one.

use rusqlite::Connection;
use tokio::sync::{broadcast, watch};

use crate::db::{Database, DbResult, Table};
use crate::export::ExportData;
use crate::models::{
    BloodGlucoseCreate, BloodGlucoseEntry, BowelMovementCreate, BowelMovementEntry, MealEntry,
    MealEntryCreate, MealType, MealWithDetails, MedicationCreate, MedicationEntry, OtherEntry,
    OtherEntryCreate, SymptomEntry, SymptomEntryCreate, Tag,
};

/// Default number of rows in the "recent" views
pub const DEFAULT_RECENT_LIMIT: i64 = 5;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Façade over the data access layer
///
/// The mutation API is synchronous over the pooled connection; callers on
/// an async executor should invoke it from a blocking-friendly context.
/// Watch methods spawn a refresh task and must be called within a Tokio
/// runtime.
#[derive(Clone)]
pub struct LogRepository {
    db: Database,
}

impl LogRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run a query now and re-run it whenever one of `tables` changes
    ///
    /// Returns a watch receiver seeded with the current result. The
    /// refresh task exits once every receiver has been dropped; detaching
    /// has no other side effects.
    fn watch_table_query<T, F>(
        &self,
        tables: &'static [Table],
        query: F,
    ) -> DbResult<watch::Receiver<Vec<T>>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Connection) -> DbResult<Vec<T>> + Send + 'static,
    {
        let initial = self.db.with_conn(|conn| query(conn))?;
        let (tx, rx) = watch::channel(initial);

        // Subscribe before returning so no committed change slips between
        // the seed query and the refresh loop
        let mut changes = self.db.subscribe_changes();
        let db = self.db.clone();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(table) if tables.contains(&table) => {}
                    Ok(_) => continue,
                    // Missed notifications only mean we re-query late
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                if tx.is_closed() {
                    break;
                }
                match db.with_conn(|conn| query(conn)) {
                    Ok(rows) => {
                        if tx.send(rows).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("watch query failed: {e}"),
                }
            }
        });

        Ok(rx)
    }

    // --- Meals ---

    pub fn watch_meals(&self) -> DbResult<watch::Receiver<Vec<MealWithDetails>>> {
        self.watch_table_query(&[Table::Meals], |conn| MealEntry::list_with_details(conn, None))
    }

    pub fn watch_recent_meals(
        &self,
        limit: i64,
    ) -> DbResult<watch::Receiver<Vec<MealWithDetails>>> {
        self.watch_table_query(&[Table::Meals], move |conn| {
            MealEntry::list_with_details(conn, Some(limit))
        })
    }

    pub fn watch_tags(&self) -> DbResult<watch::Receiver<Vec<Tag>>> {
        self.watch_table_query(&[Table::Tags], Tag::list)
    }

    /// Insert a meal with its foods and tags as one atomic write
    ///
    /// Missing timestamp defaults to now; missing notes to the empty
    /// string. Returns the new meal id.
    pub fn insert_meal(
        &self,
        meal_type: MealType,
        foods: &[String],
        tags: &[String],
        notes: Option<String>,
        timestamp: Option<i64>,
    ) -> DbResult<i64> {
        let data = MealEntryCreate {
            meal_type,
            notes,
            timestamp: Some(timestamp.unwrap_or_else(now_millis)),
        };
        let id = self
            .db
            .with_conn_mut(|conn| MealEntry::create_with_details(conn, &data, foods, tags))?;
        tracing::debug!(meal_id = id, "inserted meal");
        self.db.notify_change(Table::Meals);
        self.db.notify_change(Table::Tags);
        Ok(id)
    }

    /// Replace a meal and its food/tag associations atomically
    pub fn update_meal(
        &self,
        meal: &MealEntry,
        foods: &[String],
        tags: &[String],
    ) -> DbResult<()> {
        self.db
            .with_conn_mut(|conn| MealEntry::update_with_details(conn, meal, foods, tags))?;
        self.db.notify_change(Table::Meals);
        self.db.notify_change(Table::Tags);
        Ok(())
    }

    pub fn delete_meal(&self, meal: &MealEntry) -> DbResult<bool> {
        self.delete_meal_by_id(meal.id)
    }

    pub fn delete_meal_by_id(&self, id: i64) -> DbResult<bool> {
        let deleted = self.db.with_conn(|conn| MealEntry::delete_by_id(conn, id))?;
        if deleted {
            self.db.notify_change(Table::Meals);
        }
        Ok(deleted)
    }

    pub fn get_meal_with_details_by_id(&self, id: i64) -> DbResult<Option<MealWithDetails>> {
        self.db
            .with_conn(|conn| MealEntry::get_with_details_by_id(conn, id))
    }

    // --- Symptoms ---

    pub fn watch_symptoms(&self) -> DbResult<watch::Receiver<Vec<SymptomEntry>>> {
        self.watch_table_query(&[Table::Symptoms], |conn| SymptomEntry::list(conn, None))
    }

    pub fn watch_recent_symptoms(
        &self,
        limit: i64,
    ) -> DbResult<watch::Receiver<Vec<SymptomEntry>>> {
        self.watch_table_query(&[Table::Symptoms], move |conn| {
            SymptomEntry::list(conn, Some(limit))
        })
    }

    pub fn watch_ongoing_symptoms(&self) -> DbResult<watch::Receiver<Vec<SymptomEntry>>> {
        self.watch_table_query(&[Table::Symptoms], SymptomEntry::list_ongoing)
    }

    pub fn insert_symptom(&self, data: &SymptomEntryCreate) -> DbResult<i64> {
        let entry = self.db.with_conn(|conn| SymptomEntry::create(conn, data))?;
        self.db.notify_change(Table::Symptoms);
        Ok(entry.id)
    }

    pub fn update_symptom(&self, entry: &SymptomEntry) -> DbResult<()> {
        self.db.with_conn(|conn| SymptomEntry::update(conn, entry))?;
        self.db.notify_change(Table::Symptoms);
        Ok(())
    }

    /// Mark a symptom as ended, defaulting the end time to now
    ///
    /// Leaves every other field untouched. Missing ids are a no-op.
    pub fn end_symptom(&self, id: i64, end_time: Option<i64>) -> DbResult<bool> {
        let end_time = end_time.unwrap_or_else(now_millis);
        let updated = self
            .db
            .with_conn(|conn| SymptomEntry::set_end_time(conn, id, end_time))?;
        if updated {
            self.db.notify_change(Table::Symptoms);
        }
        Ok(updated)
    }

    pub fn delete_symptom(&self, entry: &SymptomEntry) -> DbResult<bool> {
        self.delete_symptom_by_id(entry.id)
    }

    pub fn delete_symptom_by_id(&self, id: i64) -> DbResult<bool> {
        let deleted = self
            .db
            .with_conn(|conn| SymptomEntry::delete_by_id(conn, id))?;
        if deleted {
            self.db.notify_change(Table::Symptoms);
        }
        Ok(deleted)
    }

    pub fn get_symptom_by_id(&self, id: i64) -> DbResult<Option<SymptomEntry>> {
        self.db.with_conn(|conn| SymptomEntry::get_by_id(conn, id))
    }

    // --- Bowel movements ---

    pub fn watch_bowel_movements(&self) -> DbResult<watch::Receiver<Vec<BowelMovementEntry>>> {
        self.watch_table_query(&[Table::BowelMovements], |conn| {
            BowelMovementEntry::list(conn, None)
        })
    }

    pub fn watch_recent_bowel_movements(
        &self,
        limit: i64,
    ) -> DbResult<watch::Receiver<Vec<BowelMovementEntry>>> {
        self.watch_table_query(&[Table::BowelMovements], move |conn| {
            BowelMovementEntry::list(conn, Some(limit))
        })
    }

    pub fn insert_bowel_movement(&self, data: &BowelMovementCreate) -> DbResult<i64> {
        let entry = self
            .db
            .with_conn(|conn| BowelMovementEntry::create(conn, data))?;
        self.db.notify_change(Table::BowelMovements);
        Ok(entry.id)
    }

    pub fn update_bowel_movement(&self, entry: &BowelMovementEntry) -> DbResult<()> {
        self.db
            .with_conn(|conn| BowelMovementEntry::update(conn, entry))?;
        self.db.notify_change(Table::BowelMovements);
        Ok(())
    }

    pub fn delete_bowel_movement(&self, entry: &BowelMovementEntry) -> DbResult<bool> {
        self.delete_bowel_movement_by_id(entry.id)
    }

    pub fn delete_bowel_movement_by_id(&self, id: i64) -> DbResult<bool> {
        let deleted = self
            .db
            .with_conn(|conn| BowelMovementEntry::delete_by_id(conn, id))?;
        if deleted {
            self.db.notify_change(Table::BowelMovements);
        }
        Ok(deleted)
    }

    pub fn get_bowel_movement_by_id(&self, id: i64) -> DbResult<Option<BowelMovementEntry>> {
        self.db
            .with_conn(|conn| BowelMovementEntry::get_by_id(conn, id))
    }

    // --- Medications ---

    pub fn watch_medications(&self) -> DbResult<watch::Receiver<Vec<MedicationEntry>>> {
        self.watch_table_query(&[Table::Medications], |conn| {
            MedicationEntry::list(conn, None)
        })
    }

    pub fn watch_recent_medications(
        &self,
        limit: i64,
    ) -> DbResult<watch::Receiver<Vec<MedicationEntry>>> {
        self.watch_table_query(&[Table::Medications], move |conn| {
            MedicationEntry::list(conn, Some(limit))
        })
    }

    /// Distinct medication names, sorted; feeds the entry form autocomplete
    pub fn watch_medication_names(&self) -> DbResult<watch::Receiver<Vec<String>>> {
        self.watch_table_query(&[Table::Medications], MedicationEntry::list_names)
    }

    pub fn insert_medication(&self, data: &MedicationCreate) -> DbResult<i64> {
        let entry = self
            .db
            .with_conn(|conn| MedicationEntry::create(conn, data))?;
        self.db.notify_change(Table::Medications);
        Ok(entry.id)
    }

    pub fn update_medication(&self, entry: &MedicationEntry) -> DbResult<()> {
        self.db
            .with_conn(|conn| MedicationEntry::update(conn, entry))?;
        self.db.notify_change(Table::Medications);
        Ok(())
    }

    pub fn delete_medication(&self, entry: &MedicationEntry) -> DbResult<bool> {
        self.delete_medication_by_id(entry.id)
    }

    pub fn delete_medication_by_id(&self, id: i64) -> DbResult<bool> {
        let deleted = self
            .db
            .with_conn(|conn| MedicationEntry::delete_by_id(conn, id))?;
        if deleted {
            self.db.notify_change(Table::Medications);
        }
        Ok(deleted)
    }

    pub fn get_medication_by_id(&self, id: i64) -> DbResult<Option<MedicationEntry>> {
        self.db
            .with_conn(|conn| MedicationEntry::get_by_id(conn, id))
    }

    // --- Other entries ---

    pub fn watch_other_entries(&self) -> DbResult<watch::Receiver<Vec<OtherEntry>>> {
        self.watch_table_query(&[Table::OtherEntries], |conn| OtherEntry::list(conn, None))
    }

    pub fn watch_recent_other_entries(
        &self,
        limit: i64,
    ) -> DbResult<watch::Receiver<Vec<OtherEntry>>> {
        self.watch_table_query(&[Table::OtherEntries], move |conn| {
            OtherEntry::list(conn, Some(limit))
        })
    }

    pub fn insert_other_entry(&self, data: &OtherEntryCreate) -> DbResult<i64> {
        let entry = self.db.with_conn(|conn| OtherEntry::create(conn, data))?;
        self.db.notify_change(Table::OtherEntries);
        Ok(entry.id)
    }

    pub fn update_other_entry(&self, entry: &OtherEntry) -> DbResult<()> {
        self.db.with_conn(|conn| OtherEntry::update(conn, entry))?;
        self.db.notify_change(Table::OtherEntries);
        Ok(())
    }

    pub fn delete_other_entry(&self, entry: &OtherEntry) -> DbResult<bool> {
        self.delete_other_entry_by_id(entry.id)
    }

    pub fn delete_other_entry_by_id(&self, id: i64) -> DbResult<bool> {
        let deleted = self
            .db
            .with_conn(|conn| OtherEntry::delete_by_id(conn, id))?;
        if deleted {
            self.db.notify_change(Table::OtherEntries);
        }
        Ok(deleted)
    }

    pub fn get_other_entry_by_id(&self, id: i64) -> DbResult<Option<OtherEntry>> {
        self.db.with_conn(|conn| OtherEntry::get_by_id(conn, id))
    }

    // --- Blood glucose ---

    pub fn watch_blood_glucose(&self) -> DbResult<watch::Receiver<Vec<BloodGlucoseEntry>>> {
        self.watch_table_query(&[Table::BloodGlucose], |conn| {
            BloodGlucoseEntry::list(conn, None)
        })
    }

    pub fn watch_recent_blood_glucose(
        &self,
        limit: i64,
    ) -> DbResult<watch::Receiver<Vec<BloodGlucoseEntry>>> {
        self.watch_table_query(&[Table::BloodGlucose], move |conn| {
            BloodGlucoseEntry::list(conn, Some(limit))
        })
    }

    pub fn insert_blood_glucose(&self, data: &BloodGlucoseCreate) -> DbResult<i64> {
        let entry = self
            .db
            .with_conn(|conn| BloodGlucoseEntry::create(conn, data))?;
        self.db.notify_change(Table::BloodGlucose);
        Ok(entry.id)
    }

    pub fn update_blood_glucose(&self, entry: &BloodGlucoseEntry) -> DbResult<()> {
        self.db
            .with_conn(|conn| BloodGlucoseEntry::update(conn, entry))?;
        self.db.notify_change(Table::BloodGlucose);
        Ok(())
    }

    pub fn delete_blood_glucose(&self, entry: &BloodGlucoseEntry) -> DbResult<bool> {
        self.delete_blood_glucose_by_id(entry.id)
    }

    pub fn delete_blood_glucose_by_id(&self, id: i64) -> DbResult<bool> {
        let deleted = self
            .db
            .with_conn(|conn| BloodGlucoseEntry::delete_by_id(conn, id))?;
        if deleted {
            self.db.notify_change(Table::BloodGlucose);
        }
        Ok(deleted)
    }

    pub fn get_blood_glucose_by_id(&self, id: i64) -> DbResult<Option<BloodGlucoseEntry>> {
        self.db
            .with_conn(|conn| BloodGlucoseEntry::get_by_id(conn, id))
    }

    // --- Export ---

    /// Collect a point-in-time export snapshot of the whole journal
    pub fn export(&self) -> DbResult<ExportData> {
        self.db.with_conn(ExportData::collect)
    }
}
