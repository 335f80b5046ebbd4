use crate::error::ApiError;
use crate::model::attendance::Attendance;
use crate::service::attendance::{self, ReportRow, StatusFilter};
use crate::service::whatsapp::WhatsAppService;
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    #[schema(example = "FP001")]
    pub fingerprint_id: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkByFaceRequest {
    /// Label emitted by the face-recognition model; equals the employee id
    #[schema(example = 1)]
    pub face_label: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RecordsQuery {
    /// Restrict rows to one employee
    pub employee_id: Option<u64>,
    /// Defaults to today
    #[param(example = "2024-01-01", value_type = String)]
    pub date_from: Option<NaiveDate>,
    /// Defaults to today
    #[param(example = "2024-01-02", value_type = String)]
    pub date_to: Option<NaiveDate>,
    /// PRESENT, ABSENT or anything else for both
    pub status: Option<String>,
}

/// Mark attendance by fingerprint scan
#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Attendance marked", body = Attendance),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Attendance"
)]
pub async fn mark(
    pool: web::Data<MySqlPool>,
    whatsapp: web::Data<WhatsAppService>,
    body: web::Json<MarkRequest>,
) -> Result<HttpResponse, ApiError> {
    let record = attendance::mark_by_fingerprint(
        pool.get_ref(),
        whatsapp.get_ref(),
        body.fingerprint_id.trim(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Mark attendance by face-recognition label
#[utoipa::path(
    post,
    path = "/api/attendance/markByFace",
    request_body = MarkByFaceRequest,
    responses(
        (status = 200, description = "Attendance marked", body = Attendance),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance"
)]
pub async fn mark_by_face(
    pool: web::Data<MySqlPool>,
    whatsapp: web::Data<WhatsAppService>,
    body: web::Json<MarkByFaceRequest>,
) -> Result<HttpResponse, ApiError> {
    let record =
        attendance::mark_by_face_label(pool.get_ref(), whatsapp.get_ref(), body.face_label).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Attendance records with absentees
///
/// One PRESENT row per record in the range; one ABSENT row per employee with
/// no record in the whole range.
#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Present and absent rows", body = [ReportRow]),
        (status = 400, description = "Invalid date range")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn records(
    pool: web::Data<MySqlPool>,
    query: web::Query<RecordsQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = Local::now().date_naive();
    let from = query.date_from.unwrap_or(today);
    let to = query.date_to.unwrap_or(today);

    if from > to {
        return Err(ApiError::Validation(
            "dateFrom must not be after dateTo".to_string(),
        ));
    }

    let status = StatusFilter::parse(query.status.as_deref());

    let rows =
        attendance::attendance_with_absentees(pool.get_ref(), from, to, status, query.employee_id)
            .await?;

    Ok(HttpResponse::Ok().json(rows))
}
