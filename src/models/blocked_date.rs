use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar date the business is fully closed, regardless of the weekly
/// schedule. Duplicates are harmless; the set semantics win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedDate {
    pub date: NaiveDate,
    pub reason: Option<String>,
}
