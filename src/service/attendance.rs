use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::MySqlPool;
use strum::EnumString;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::service::whatsapp::WhatsAppService;

/// Arrivals strictly after this local time trigger a late notice.
pub fn late_threshold() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

pub fn is_late(check_in: NaiveTime) -> bool {
    check_in > late_threshold()
}

#[derive(Debug, PartialEq, Eq)]
pub enum ScanBranch {
    FirstCheckIn,
    CheckOut,
}

impl ScanBranch {
    /// MySQL reports 1 affected row for a fresh insert, 2 when the duplicate
    /// key update changed the stored row, and 0 when the update matched the
    /// stored value (two scans within the same second).
    pub fn from_affected_rows(rows: u64) -> Self {
        if rows == 1 {
            ScanBranch::FirstCheckIn
        } else {
            ScanBranch::CheckOut
        }
    }
}

/// Resolve a fingerprint tag to an active employee and apply today's scan.
pub async fn mark_by_fingerprint(
    pool: &MySqlPool,
    whatsapp: &WhatsAppService,
    fingerprint_id: &str,
) -> Result<Attendance, ApiError> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone \
         FROM employees WHERE fingerprint_id = ?",
    )
    .bind(fingerprint_id)
    .fetch_optional(pool)
    .await?;

    match employee {
        Some(employee) => mark_for_employee(pool, whatsapp, &employee).await,
        None => {
            debug!(fingerprint_id, "scan for unknown fingerprint tag");
            Err(ApiError::not_found("Employee"))
        }
    }
}

/// Resolve a face-recognition label (the employee id) and apply today's scan.
pub async fn mark_by_face_label(
    pool: &MySqlPool,
    whatsapp: &WhatsAppService,
    face_label: u64,
) -> Result<Attendance, ApiError> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone \
         FROM employees WHERE id = ?",
    )
    .bind(face_label)
    .fetch_optional(pool)
    .await?;

    match employee {
        Some(employee) => mark_for_employee(pool, whatsapp, &employee).await,
        None => {
            debug!(face_label, "scan for unknown face label");
            Err(ApiError::not_found("Employee"))
        }
    }
}

/// Applies one scan for the employee's current local day.
///
/// The write is a single statement against the (`employee_id`, `date`) unique
/// key, so two concurrent first scans cannot create two rows: the first scan
/// of the day inserts the check-in, every later scan overwrites check-out
/// with the latest time.
async fn mark_for_employee(
    pool: &MySqlPool,
    whatsapp: &WhatsAppService,
    employee: &Employee,
) -> Result<Attendance, ApiError> {
    let now = Local::now();
    let today = now.date_naive();
    let time = now.time();

    let result = sqlx::query(
        "INSERT INTO attendance (employee_id, date, check_in) \
         VALUES (?, ?, ?) \
         ON DUPLICATE KEY UPDATE check_out = ?",
    )
    .bind(employee.id)
    .bind(today)
    .bind(time)
    .bind(time)
    .execute(pool)
    .await?;

    let branch = ScanBranch::from_affected_rows(result.rows_affected());
    let first_check_in = branch == ScanBranch::FirstCheckIn;

    let attendance = sqlx::query_as::<_, Attendance>(
        "SELECT id, employee_id, date, check_in, check_out \
         FROM attendance WHERE employee_id = ? AND date = ?",
    )
    .bind(employee.id)
    .bind(today)
    .fetch_one(pool)
    .await?;

    info!(
        employee_id = employee.id,
        date = %today,
        first_check_in,
        "attendance marked"
    );

    if first_check_in {
        if is_late(time) {
            whatsapp.send_late_arrival_alert(employee).await;
        }
        whatsapp.send_attendance_confirmation(employee, &attendance).await;
    }

    Ok(attendance)
}

/// `status` query values. Anything unrecognized means "both".
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StatusFilter {
    Present,
    Absent,
    All,
}

impl StatusFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or(StatusFilter::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RowStatus {
    Present,
    Absent,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportRow {
    pub employee_id: u64,
    pub name: String,
    pub department: Option<String>,
    /// Record date for PRESENT rows, the literal `"{from} - {to}"` range for
    /// ABSENT rows.
    pub date: String,
    #[schema(example = "09:12:40", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "18:03:05", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
    pub status: RowStatus,
}

/// Ledger record joined with its owner, as fetched for reporting.
#[derive(Debug, sqlx::FromRow)]
pub struct PresentRecord {
    pub employee_id: u64,
    pub name: String,
    pub department: Option<String>,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
}

/// Derives the report rows: one PRESENT row per ledger record in range, one
/// ABSENT row per directory member with zero records in the whole range. An
/// employee present on any day of the range never yields an ABSENT row.
pub fn with_absentees(
    present: Vec<PresentRecord>,
    directory: &[Employee],
    from: NaiveDate,
    to: NaiveDate,
    status: StatusFilter,
    employee_id: Option<u64>,
) -> Vec<ReportRow> {
    let present: Vec<PresentRecord> = present
        .into_iter()
        .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
        .collect();

    let absent_rows: Vec<ReportRow> = directory
        .iter()
        .filter(|e| employee_id.is_none_or(|id| e.id == id))
        .filter(|e| !present.iter().any(|r| r.employee_id == e.id))
        .map(|e| ReportRow {
            employee_id: e.id,
            name: e.name.clone(),
            department: e.department.clone(),
            date: format!("{from} - {to}"),
            check_in: None,
            check_out: None,
            status: RowStatus::Absent,
        })
        .collect();

    let present_rows: Vec<ReportRow> = present
        .into_iter()
        .map(|r| ReportRow {
            employee_id: r.employee_id,
            name: r.name,
            department: r.department,
            date: r.date.to_string(),
            check_in: r.check_in,
            check_out: r.check_out,
            status: RowStatus::Present,
        })
        .collect();

    match status {
        StatusFilter::Present => present_rows,
        StatusFilter::Absent => absent_rows,
        StatusFilter::All => present_rows.into_iter().chain(absent_rows).collect(),
    }
}

pub async fn attendance_with_absentees(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
    status: StatusFilter,
    employee_id: Option<u64>,
) -> Result<Vec<ReportRow>, ApiError> {
    let present = present_between(pool, from, to).await?;

    let directory = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone \
         FROM employees ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(with_absentees(
        present,
        &directory,
        from,
        to,
        status,
        employee_id,
    ))
}

pub async fn present_between(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PresentRecord>, ApiError> {
    let records = sqlx::query_as::<_, PresentRecord>(
        "SELECT a.employee_id, e.name, e.department, a.date, a.check_in, a.check_out \
         FROM attendance a \
         JOIN employees e ON e.id = a.employee_id \
         WHERE a.date BETWEEN ? AND ? \
         ORDER BY a.date DESC, a.check_in DESC",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Directory members with no ledger entry on the given date.
pub async fn absent_employees_on(
    pool: &MySqlPool,
    date: NaiveDate,
) -> Result<Vec<Employee>, ApiError> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT e.id, e.name, e.fingerprint_id, e.email, e.department, e.phone \
         FROM employees e \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM attendance a \
             WHERE a.employee_id = e.id AND a.date = ? \
         ) \
         ORDER BY e.id",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(employees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: u64, name: &str) -> Employee {
        Employee {
            id,
            name: name.to_string(),
            fingerprint_id: Some(format!("FP{id:03}")),
            email: None,
            department: Some("IT".to_string()),
            phone: "9876543210".to_string(),
        }
    }

    fn record(employee_id: u64, name: &str, date: NaiveDate) -> PresentRecord {
        PresentRecord {
            employee_id,
            name: name.to_string(),
            department: Some("IT".to_string()),
            date,
            check_in: NaiveTime::from_hms_opt(9, 0, 0),
            check_out: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nine_thirty_exactly_is_not_late() {
        assert!(!is_late(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert!(is_late(NaiveTime::from_hms_opt(9, 30, 1).unwrap()));
        assert!(!is_late(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert!(is_late(NaiveTime::from_hms_opt(14, 0, 0).unwrap()));
    }

    #[test]
    fn one_affected_row_means_first_check_in() {
        assert_eq!(ScanBranch::from_affected_rows(1), ScanBranch::FirstCheckIn);
        assert_eq!(ScanBranch::from_affected_rows(2), ScanBranch::CheckOut);
        // update that matched the stored value (same-second rescan)
        assert_eq!(ScanBranch::from_affected_rows(0), ScanBranch::CheckOut);
    }

    #[test]
    fn status_filter_parsing_is_case_insensitive_and_defaults_to_all() {
        assert_eq!(StatusFilter::parse(Some("PRESENT")), StatusFilter::Present);
        assert_eq!(StatusFilter::parse(Some("absent")), StatusFilter::Absent);
        assert_eq!(StatusFilter::parse(Some("All")), StatusFilter::All);
        assert_eq!(StatusFilter::parse(Some("whatever")), StatusFilter::All);
        assert_eq!(StatusFilter::parse(None), StatusFilter::All);
    }

    #[test]
    fn absentees_get_one_row_for_the_whole_range() {
        // Directory {A, B, C}; A present on both days of the range.
        let directory = vec![employee(1, "A"), employee(2, "B"), employee(3, "C")];
        let present = vec![
            record(1, "A", date(2024, 1, 1)),
            record(1, "A", date(2024, 1, 2)),
        ];

        let rows = with_absentees(
            present,
            &directory,
            date(2024, 1, 1),
            date(2024, 1, 2),
            StatusFilter::All,
            None,
        );

        let present_rows: Vec<_> = rows
            .iter()
            .filter(|r| r.status == RowStatus::Present)
            .collect();
        let absent_rows: Vec<_> = rows
            .iter()
            .filter(|r| r.status == RowStatus::Absent)
            .collect();

        assert_eq!(present_rows.len(), 2);
        assert!(present_rows.iter().all(|r| r.employee_id == 1));

        assert_eq!(absent_rows.len(), 2);
        let absent_ids: Vec<u64> = absent_rows.iter().map(|r| r.employee_id).collect();
        assert_eq!(absent_ids, vec![2, 3]);
        assert!(
            absent_rows
                .iter()
                .all(|r| r.date == "2024-01-01 - 2024-01-02")
        );
    }

    #[test]
    fn partial_presence_never_yields_an_absent_row() {
        // Present on one day of a two-day range: PRESENT rows only.
        let directory = vec![employee(1, "A")];
        let present = vec![record(1, "A", date(2024, 1, 1))];

        let rows = with_absentees(
            present,
            &directory,
            date(2024, 1, 1),
            date(2024, 1, 2),
            StatusFilter::All,
            None,
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RowStatus::Present);
        assert_eq!(rows[0].date, "2024-01-01");
    }

    #[test]
    fn status_filter_restricts_row_kinds() {
        let directory = vec![employee(1, "A"), employee(2, "B")];
        let present = vec![record(1, "A", date(2024, 1, 1))];

        let only_present = with_absentees(
            vec![record(1, "A", date(2024, 1, 1))],
            &directory,
            date(2024, 1, 1),
            date(2024, 1, 1),
            StatusFilter::Present,
            None,
        );
        assert_eq!(only_present.len(), 1);
        assert_eq!(only_present[0].status, RowStatus::Present);

        let only_absent = with_absentees(
            present,
            &directory,
            date(2024, 1, 1),
            date(2024, 1, 1),
            StatusFilter::Absent,
            None,
        );
        assert_eq!(only_absent.len(), 1);
        assert_eq!(only_absent[0].employee_id, 2);
    }

    #[test]
    fn employee_filter_applies_to_both_row_kinds() {
        let directory = vec![employee(1, "A"), employee(2, "B")];
        let present = vec![record(1, "A", date(2024, 1, 1))];

        let rows = with_absentees(
            present,
            &directory,
            date(2024, 1, 1),
            date(2024, 1, 1),
            StatusFilter::All,
            Some(2),
        );

        // B never scanned: a single ABSENT row, no rows borrowed from A.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, 2);
        assert_eq!(rows[0].status, RowStatus::Absent);
    }
}
