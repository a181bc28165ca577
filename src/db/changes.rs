//! Committed-change notification
//!
//! After a mutation commits, the repository announces the touched tables on
//! a broadcast channel. Watch queries subscribe and re-run whenever one of
//! their source tables is announced.

/// Tables that continuous queries can watch.
///
/// Food items and tag cross references are only ever written as part of a
/// meal's composite write, so they are folded into [`Table::Meals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Meals,
    Tags,
    Symptoms,
    BowelMovements,
    Medications,
    OtherEntries,
    BloodGlucose,
}

/// Capacity of the change broadcast channel.
///
/// A lagged subscriber re-runs its query anyway, so a small buffer is
/// sufficient.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;
