//! Data models
//!
//! Rust structs representing database entities. Each model owns its SQL.

mod blood_glucose;
mod bowel_movement;
mod food_item;
mod meal_entry;
mod medication_entry;
mod other_entry;
mod symptom_entry;
mod tag;

pub use blood_glucose::{
    BloodGlucoseCreate, BloodGlucoseEntry, GlucoseBand, GlucoseMealContext, GlucoseUnit,
};
pub use bowel_movement::{BowelMovementCreate, BowelMovementEntry, BristolType};
pub use food_item::FoodItem;
pub use meal_entry::{MealEntry, MealEntryCreate, MealType, MealWithDetails};
pub use medication_entry::{MedicationCreate, MedicationEntry};
pub use other_entry::{OtherEntry, OtherEntryCreate};
pub use symptom_entry::{SymptomEntry, SymptomEntryCreate};
pub use tag::{MealTagCrossRef, Tag};
