use crate::error::ApiError;
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::service::attendance;
use crate::service::whatsapp::{AbsentLine, PresentLine, WhatsAppService, compose_daily_report};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyReportRequest {
    #[schema(example = "9876543210")]
    pub phone_number: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbsentAlertsRequest {
    #[schema(example = "9876543210")]
    pub manager_phone: Option<String>,
}

fn required_phone(raw: &Option<String>, what: &str) -> Result<String, ApiError> {
    raw.as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Validation(format!("{what} is required")))
}

/// Send today's attendance summary
#[utoipa::path(
    post,
    path = "/api/whatsapp/send-daily-report",
    request_body = DailyReportRequest,
    responses(
        (status = 200, description = "Send attempted", body = Object, example = json!({
            "success": true,
            "message": "Daily report sent successfully!"
        })),
        (status = 400, description = "Phone number missing")
    ),
    tag = "WhatsApp",
    security(("bearer_auth" = []))
)]
pub async fn send_daily_report(
    pool: web::Data<MySqlPool>,
    whatsapp: web::Data<WhatsAppService>,
    body: web::Json<DailyReportRequest>,
) -> Result<HttpResponse, ApiError> {
    let phone = required_phone(&body.phone_number, "Phone number")?;

    let today = Local::now().date_naive();
    let present = attendance::present_between(pool.get_ref(), today, today).await?;
    let absent = attendance::absent_employees_on(pool.get_ref(), today).await?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
        .fetch_one(pool.get_ref())
        .await? as usize;

    let present_lines: Vec<PresentLine> = present
        .into_iter()
        .map(|r| PresentLine {
            name: r.name,
            check_in: r.check_in,
        })
        .collect();
    let absent_lines: Vec<AbsentLine> = absent
        .into_iter()
        .map(|e| AbsentLine {
            name: e.name,
            department: e.department,
        })
        .collect();

    let report = compose_daily_report(total, &present_lines, &absent_lines);
    let sent = whatsapp.send_daily_report(&phone, &report).await;

    let message = if sent {
        "Daily report sent successfully!"
    } else {
        "Failed to send daily report"
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": sent,
        "message": message
    })))
}

/// Send one absence alert per absent employee
#[utoipa::path(
    post,
    path = "/api/whatsapp/send-absent-alerts",
    request_body = AbsentAlertsRequest,
    responses(
        (status = 200, description = "Alerts attempted", body = Object, example = json!({
            "success": true,
            "message": "Sent 2 absent alerts out of 2 absent employees",
            "absentCount": 2,
            "alertsSent": 2
        })),
        (status = 400, description = "Manager phone missing")
    ),
    tag = "WhatsApp",
    security(("bearer_auth" = []))
)]
pub async fn send_absent_alerts(
    pool: web::Data<MySqlPool>,
    whatsapp: web::Data<WhatsAppService>,
    body: web::Json<AbsentAlertsRequest>,
) -> Result<HttpResponse, ApiError> {
    let manager_phone = required_phone(&body.manager_phone, "Manager phone number")?;

    let absent = attendance::absent_employees_on(pool.get_ref(), Local::now().date_naive()).await?;

    let mut alerts_sent = 0usize;
    for employee in &absent {
        if whatsapp.send_absent_alert(&manager_phone, employee).await {
            alerts_sent += 1;
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!(
            "Sent {alerts_sent} absent alerts out of {} absent employees",
            absent.len()
        ),
        "absentCount": absent.len(),
        "alertsSent": alerts_sent,
    })))
}

/// Send a synthetic confirmation to verify provider connectivity
#[utoipa::path(
    get,
    path = "/api/whatsapp/test-connection",
    responses(
        (status = 200, description = "Test attempted", body = Object, example = json!({
            "success": true,
            "message": "WhatsApp service is working!"
        }))
    ),
    tag = "WhatsApp",
    security(("bearer_auth" = []))
)]
pub async fn test_connection(whatsapp: web::Data<WhatsAppService>) -> HttpResponse {
    let now = Local::now();
    let employee = Employee {
        id: 0,
        name: "Test Employee".to_string(),
        fingerprint_id: None,
        email: Some("test@example.com".to_string()),
        department: Some("IT".to_string()),
        phone: whatsapp.manager_phone().to_string(),
    };
    let record = Attendance {
        id: 0,
        employee_id: 0,
        date: now.date_naive(),
        check_in: Some(now.time()),
        check_out: None,
    };

    let sent = whatsapp.send_attendance_confirmation(&employee, &record).await;

    let message = if sent {
        "WhatsApp service is working!"
    } else {
        "WhatsApp service test failed"
    };

    HttpResponse::Ok().json(json!({
        "success": sent,
        "message": message
    }))
}

/// Gateway configuration with the auth token masked
#[utoipa::path(
    get,
    path = "/api/whatsapp/debug",
    responses((status = 200, description = "Configuration summary")),
    tag = "WhatsApp",
    security(("bearer_auth" = []))
)]
pub async fn debug_info(whatsapp: web::Data<WhatsAppService>) -> HttpResponse {
    HttpResponse::Ok().json(whatsapp.debug_summary())
}
