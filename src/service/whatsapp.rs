use chrono::{Local, NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WhatsAppConfig;
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;

const TWILIO_API_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected message ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Deserialize)]
struct MessageResponse {
    sid: String,
}

/// Best-effort WhatsApp gateway over Twilio's Messages API.
///
/// Built once at startup from configuration; every send converts failure into
/// a logged `false` and never propagates to the caller.
pub struct WhatsAppService {
    client: Client,
    config: WhatsAppConfig,
}

impl WhatsAppService {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn manager_phone(&self) -> &str {
        &self.config.manager_phone
    }

    /// Configuration summary for the debug endpoint, auth token masked.
    pub fn debug_summary(&self) -> Value {
        json!({
            "enabled": self.config.enabled,
            "account_sid": self.config.account_sid,
            "auth_token": if self.config.auth_token.is_empty() { "NULL" } else { "***SET***" },
            "from_number": self.config.from_number,
            "manager_phone": self.config.manager_phone,
        })
    }

    async fn deliver(&self, to: &str, body: &str) -> Result<String, DeliveryError> {
        let url = format!(
            "{TWILIO_API_BASE_URL}/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let params = [
            ("To", format!("whatsapp:{}", normalize_phone(to))),
            ("From", self.config.from_number.clone()),
            ("Body", body.to_owned()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status, body });
        }

        Ok(response.json::<MessageResponse>().await?.sid)
    }

    /// Confirmation of a first check-in, sent to the configured manager number.
    pub async fn send_attendance_confirmation(
        &self,
        employee: &Employee,
        attendance: &Attendance,
    ) -> bool {
        if !self.config.enabled {
            debug!("whatsapp disabled, skipping attendance confirmation");
            return false;
        }

        let body = confirmation_message(employee, attendance);
        match self.deliver(&self.config.manager_phone, &body).await {
            Ok(sid) => {
                info!(%sid, employee = %employee.name, "attendance confirmation sent");
                true
            }
            Err(e) => {
                warn!(error = %e, employee = %employee.name, "failed to send attendance confirmation");
                false
            }
        }
    }

    /// Late-arrival notice, sent to the employee's own number.
    pub async fn send_late_arrival_alert(&self, employee: &Employee) -> bool {
        if !self.config.enabled {
            debug!("whatsapp disabled, skipping late arrival alert");
            return false;
        }

        let now = Local::now();
        let body = late_arrival_message(employee, now.date_naive(), now.time());
        match self.deliver(&employee.phone, &body).await {
            Ok(sid) => {
                info!(%sid, employee = %employee.name, "late arrival alert sent");
                true
            }
            Err(e) => {
                warn!(error = %e, employee = %employee.name, "failed to send late arrival alert");
                false
            }
        }
    }

    /// Absence alert for one employee, sent to the given manager number.
    pub async fn send_absent_alert(&self, manager_phone: &str, employee: &Employee) -> bool {
        if !self.config.enabled {
            debug!("whatsapp disabled, skipping absent alert");
            return false;
        }

        let body = absent_alert_message(employee, Local::now().date_naive());
        match self.deliver(manager_phone, &body).await {
            Ok(sid) => {
                info!(%sid, employee = %employee.name, "absent alert sent");
                true
            }
            Err(e) => {
                warn!(error = %e, employee = %employee.name, "failed to send absent alert");
                false
            }
        }
    }

    /// Daily summary, sent to the given number.
    pub async fn send_daily_report(&self, phone_number: &str, report_data: &str) -> bool {
        if !self.config.enabled {
            debug!("whatsapp disabled, skipping daily report");
            return false;
        }

        let body = daily_report_message(report_data, Local::now().date_naive());
        match self.deliver(phone_number, &body).await {
            Ok(sid) => {
                info!(%sid, "daily report sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to send daily report");
                false
            }
        }
    }
}

/// Normalizes a phone number for the provider: strips whitespace; a bare
/// 12-digit number starting with country code 91 gets a `+`, a bare 10-digit
/// number gets `+91`, anything else is left as-is.
pub fn normalize_phone(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.starts_with('+') {
        return cleaned;
    }
    if cleaned.len() == 12 && cleaned.starts_with("91") {
        return format!("+{cleaned}");
    }
    if cleaned.len() == 10 {
        return format!("+91{cleaned}");
    }
    cleaned
}

fn department_or_default(employee: &Employee) -> &str {
    employee.department.as_deref().unwrap_or("Not specified")
}

pub fn confirmation_message(employee: &Employee, attendance: &Attendance) -> String {
    format!(
        "🎉 *Attendance Confirmed!*\n\n\
         👤 *Employee:* {}\n\
         📅 *Date:* {}\n\
         🕐 *Check-in Time:* {}\n\
         🏢 *Department:* {}\n\n\
         ✅ Your attendance has been successfully recorded.\n\n\
         _Attendance Management System_",
        employee.name,
        attendance.date.format("%d %b %Y"),
        attendance
            .check_in
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        department_or_default(employee),
    )
}

pub fn late_arrival_message(employee: &Employee, date: NaiveDate, time: NaiveTime) -> String {
    format!(
        "⚠️ *Late Arrival Notice*\n\n\
         👤 *Employee:* {}\n\
         📅 *Date:* {}\n\
         🕐 *Time:* {}\n\n\
         You have been marked as late today. Please ensure to arrive on time.\n\n\
         _Attendance Management System_",
        employee.name,
        date.format("%d %b %Y"),
        time.format("%H:%M"),
    )
}

pub fn absent_alert_message(employee: &Employee, date: NaiveDate) -> String {
    format!(
        "🚨 *Absence Alert*\n\n\
         👤 *Employee:* {}\n\
         🏢 *Department:* {}\n\
         📅 *Date:* {}\n\n\
         This employee has not marked attendance today.\n\n\
         _Attendance Management System_",
        employee.name,
        department_or_default(employee),
        date.format("%d %b %Y"),
    )
}

pub fn daily_report_message(report_data: &str, date: NaiveDate) -> String {
    format!(
        "📊 *Daily Attendance Report*\n\n\
         📅 *Date:* {}\n\n\
         {}\n\n\
         📱 _Generated by Attendance Management System_",
        date.format("%d %b %Y"),
        report_data,
    )
}

pub struct PresentLine {
    pub name: String,
    pub check_in: Option<NaiveTime>,
}

pub struct AbsentLine {
    pub name: String,
    pub department: Option<String>,
}

/// Body of the daily summary: counts followed by present and absent listings.
pub fn compose_daily_report(
    total_employees: usize,
    present: &[PresentLine],
    absent: &[AbsentLine],
) -> String {
    let mut report = String::new();
    report.push_str("📈 *Summary:*\n");
    report.push_str(&format!("👥 Total Employees: {total_employees}\n"));
    report.push_str(&format!("✅ Present: {}\n", present.len()));
    report.push_str(&format!("❌ Absent: {}\n", absent.len()));

    if !present.is_empty() {
        report.push_str("\n👥 *Present Employees:*\n");
        for line in present {
            let check_in = line
                .check_in
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "N/A".to_string());
            report.push_str(&format!("• {} ({check_in})\n", line.name));
        }
    }

    if !absent.is_empty() {
        report.push_str("\n❌ *Absent Employees:*\n");
        for line in absent {
            report.push_str(&format!(
                "• {} ({})\n",
                line.name,
                line.department.as_deref().unwrap_or("No Dept")
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, department: Option<&str>, phone: &str) -> Employee {
        Employee {
            id: 7,
            name: name.to_string(),
            fingerprint_id: Some("FP007".to_string()),
            email: None,
            department: department.map(str::to_string),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn bare_ten_digit_number_gets_country_code() {
        assert_eq!(normalize_phone("9876543210"), "+919876543210");
    }

    #[test]
    fn twelve_digit_number_with_country_code_gets_plus() {
        assert_eq!(normalize_phone("919876543210"), "+919876543210");
    }

    #[test]
    fn plus_prefixed_number_is_unchanged() {
        assert_eq!(normalize_phone("+1234567890"), "+1234567890");
    }

    #[test]
    fn whitespace_is_stripped_before_rules_apply() {
        assert_eq!(normalize_phone(" 98765 43210 "), "+919876543210");
    }

    #[test]
    fn unrecognized_shapes_are_left_as_is() {
        assert_eq!(normalize_phone("12345678901"), "12345678901");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn confirmation_message_carries_employee_and_times() {
        let emp = employee("Asha", Some("IT"), "9876543210");
        let att = Attendance {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            check_in: Some(NaiveTime::from_hms_opt(9, 5, 30).unwrap()),
            check_out: None,
        };

        let body = confirmation_message(&emp, &att);
        assert!(body.contains("Asha"));
        assert!(body.contains("02 Jan 2024"));
        assert!(body.contains("09:05:30"));
        assert!(body.contains("IT"));
    }

    #[test]
    fn missing_department_falls_back_in_messages() {
        let emp = employee("Ravi", None, "9876543210");
        let body = absent_alert_message(&emp, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(body.contains("Not specified"));
        assert!(body.contains("01 Mar 2024"));
    }

    #[test]
    fn daily_report_lists_counts_and_sections() {
        let present = vec![PresentLine {
            name: "Asha".to_string(),
            check_in: NaiveTime::from_hms_opt(9, 2, 0),
        }];
        let absent = vec![AbsentLine {
            name: "Ravi".to_string(),
            department: None,
        }];

        let report = compose_daily_report(3, &present, &absent);
        assert!(report.contains("Total Employees: 3"));
        assert!(report.contains("Present: 1"));
        assert!(report.contains("Absent: 1"));
        assert!(report.contains("• Asha (09:02)"));
        assert!(report.contains("• Ravi (No Dept)"));
    }

    #[test]
    fn daily_report_omits_empty_sections() {
        let report = compose_daily_report(0, &[], &[]);
        assert!(!report.contains("Present Employees"));
        assert!(!report.contains("Absent Employees"));
    }
}
