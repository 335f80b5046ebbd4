use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "John Doe",
        "fingerprint_id": "FP001",
        "email": "john.doe@company.com",
        "department": "IT",
        "phone": "+919876543210"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    /// Tag assigned by the fingerprint terminal; unique among active employees
    #[schema(example = "FP001", nullable = true)]
    pub fingerprint_id: Option<String>,

    #[schema(example = "john.doe@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "IT", nullable = true)]
    pub department: Option<String>,

    /// Notification target
    #[schema(example = "+919876543210")]
    pub phone: String,
}
