use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per (employee, calendar date). `employee_id` is a weak reference;
/// archiving the employee keeps the history.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:12:40", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "18:03:05", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
}
