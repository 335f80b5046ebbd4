use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Archived (soft-deleted) employee. Exists only between delete and
/// restore/permanent removal.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ExEmployee {
    pub id: u64,
    pub name: String,
    pub fingerprint_id: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub phone: String,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub deleted_date: NaiveDate,
}
