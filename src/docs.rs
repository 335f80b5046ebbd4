use crate::api::attendance::{MarkByFaceRequest, MarkRequest};
use crate::api::employee::CreateEmployee;
use crate::api::whatsapp::{AbsentAlertsRequest, DailyReportRequest};
use crate::auth::handlers::LoginResponse;
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::ex_employee::ExEmployee;
use crate::models::LoginReqDto;
use crate::service::attendance::{ReportRow, RowStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Management System API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

REST API for employee registration, fingerprint/face attendance marking,
present/absent reporting, archive/restore of departed employees, and
best-effort WhatsApp notifications.

### 🔹 Key Features
- **Employee Directory**
  - Register, list, and look up employees; archive and restore
- **Attendance Marking**
  - Fingerprint and face-recognition scans, first scan = check-in,
    later scans = check-out
- **Reporting**
  - Present/absent rows for any date range
- **Notifications**
  - WhatsApp confirmations, late-arrival and absence alerts, daily summary

### 🔐 Security
Admin endpoints are protected with **JWT Bearer authentication**; the
device-facing mark endpoints are public and rate limited.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::mark,
        crate::api::attendance::mark_by_face,
        crate::api::attendance::records,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee_by_fingerprint,
        crate::api::employee::next_fingerprint,
        crate::api::employee::delete_employee,
        crate::api::employee::list_ex_employees,
        crate::api::employee::delete_ex_employee,
        crate::api::employee::restore_ex_employee,

        crate::api::whatsapp::send_daily_report,
        crate::api::whatsapp::send_absent_alerts,
        crate::api::whatsapp::test_connection,
        crate::api::whatsapp::debug_info
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            MarkRequest,
            MarkByFaceRequest,
            CreateEmployee,
            DailyReportRequest,
            AbsentAlertsRequest,
            Employee,
            ExEmployee,
            Attendance,
            ReportRow,
            RowStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Admin authentication"),
        (name = "Attendance", description = "Attendance marking and reporting APIs"),
        (name = "Employee", description = "Employee directory and archive APIs"),
        (name = "WhatsApp", description = "Notification APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        // safe to unwrap, components are registered above
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
