// file: src/models/calendar.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Local mirror of a remote calendar. `remote_id` is only unique within
/// one user's calendars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Calendar {
    pub id: i64,
    pub remote_id: String,
    pub user_id: i64,
    pub name: String,
    pub active: bool,
}
