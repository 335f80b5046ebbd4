use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::ex_employee::ExEmployee;
use crate::utils::{fingerprint_cache, fingerprint_filter};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "FP001", nullable = true)]
    pub fingerprint_id: Option<String>,
    #[schema(example = "john@email.com", format = "email", nullable = true)]
    pub email: Option<String>,
    #[schema(example = "IT", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "9876543210")]
    pub phone: String,
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Sequential device tags: FP001, FP002, ...
pub fn next_fingerprint_tag(count: i64) -> String {
    format!("FP{:03}", count + 1)
}

/// true  => tag AVAILABLE
/// false => tag TAKEN by an active employee
pub async fn is_tag_available(tag: &str, pool: &MySqlPool) -> bool {
    // 1. Cuckoo filter — fast negative
    if !fingerprint_filter::might_exist(tag) {
        return true;
    }

    // 2. Moka cache — fast positive
    if fingerprint_cache::is_taken(tag).await {
        return false;
    }

    // 3. Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE fingerprint_id = ? LIMIT 1)",
    )
    .bind(tag)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

async fn email_in_use(email: &str, pool: &MySqlPool) -> Result<bool, ApiError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Register an employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee registered", body = Employee),
        (status = 400, description = "Missing required field"),
        (status = 409, description = "Duplicate fingerprint tag or email")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    let phone = payload.phone.trim();
    if phone.is_empty() {
        return Err(ApiError::Validation("phone is required".to_string()));
    }

    let fingerprint_id = non_empty(&payload.fingerprint_id);
    let email = non_empty(&payload.email);
    let department = non_empty(&payload.department);

    if let Some(tag) = &fingerprint_id {
        if !is_tag_available(tag, pool.get_ref()).await {
            return Err(ApiError::Conflict(format!(
                "Employee with fingerprintId '{tag}' already exists"
            )));
        }
    }
    if let Some(email) = &email {
        if email_in_use(email, pool.get_ref()).await? {
            return Err(ApiError::Conflict(format!(
                "Employee with email '{email}' already exists"
            )));
        }
    }

    let result = sqlx::query(
        "INSERT INTO employees (name, fingerprint_id, email, department, phone) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(&fingerprint_id)
    .bind(&email)
    .bind(&department)
    .bind(phone)
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(res) => res.last_insert_id(),
        // lost the race against a concurrent insert; the unique keys win
        Err(e) if is_duplicate_key(&e) => {
            warn!(name, "duplicate key on employee insert");
            return Err(ApiError::Conflict(
                "Fingerprint tag or email already in use".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(tag) = &fingerprint_id {
        fingerprint_filter::insert(tag);
        fingerprint_cache::mark_taken(tag).await;
    }

    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone FROM employees WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(employee_id = id, "employee registered");
    Ok(HttpResponse::Ok().json(employee))
}

/// List active employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses((status = 200, description = "Active directory", body = [Employee])),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone FROM employees ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Lookup by fingerprint tag
#[utoipa::path(
    get,
    path = "/api/employees/fingerprint/{tag}",
    params(("tag", Path, description = "Fingerprint tag")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee_by_fingerprint(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tag = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone \
         FROM employees WHERE fingerprint_id = ?",
    )
    .bind(&tag)
    .fetch_optional(pool.get_ref())
    .await?;

    match employee {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(ApiError::not_found("Employee")),
    }
}

/// Next sequential fingerprint tag for enrollment
#[utoipa::path(
    get,
    path = "/api/employees/next-fingerprint",
    responses((status = 200, description = "Next tag", body = String, example = json!("FP004"))),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn next_fingerprint(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
        .fetch_one(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(next_fingerprint_tag(count)))
}

/// Archive an employee (soft delete)
///
/// Attendance history is retained; only the directory entry moves to the
/// archive.
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee archived"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee already in archive")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Employee"))?;

    let archived = sqlx::query(
        "INSERT INTO ex_employees (name, fingerprint_id, email, department, phone, deleted_date) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&employee.name)
    .bind(&employee.fingerprint_id)
    .bind(&employee.email)
    .bind(&employee.department)
    .bind(&employee.phone)
    .bind(Local::now().date_naive())
    .execute(&mut *tx)
    .await;

    if let Err(e) = archived {
        if is_duplicate_key(&e) {
            return Err(ApiError::Conflict("Employee already in archive".to_string()));
        }
        return Err(e.into());
    }

    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if let Some(tag) = &employee.fingerprint_id {
        fingerprint_filter::remove(tag);
        fingerprint_cache::invalidate(tag).await;
    }

    info!(employee_id, "employee archived");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted and archived successfully"
    })))
}

/// List archived employees
#[utoipa::path(
    get,
    path = "/api/ex-employees",
    responses((status = 200, description = "Archive", body = [ExEmployee])),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_ex_employees(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let archived = sqlx::query_as::<_, ExEmployee>(
        "SELECT id, name, fingerprint_id, email, department, phone, deleted_date \
         FROM ex_employees ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(archived))
}

/// Permanently remove an archived employee
#[utoipa::path(
    delete,
    path = "/api/ex-employees/{id}",
    params(("id", Path, description = "Archived employee ID")),
    responses(
        (status = 200, description = "Removed from archive"),
        (status = 404, description = "Archived employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_ex_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM ex_employees WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Archived employee"));
    }

    info!(ex_employee_id = id, "archived employee removed permanently");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Ex-Employee deleted successfully"
    })))
}

/// Restore an archived employee into the active directory
///
/// Re-validates fingerprint tag and email uniqueness; a conflict leaves both
/// the archive entry and the active directory unchanged.
#[utoipa::path(
    post,
    path = "/api/ex-employees/restore/{id}",
    params(("id", Path, description = "Archived employee ID")),
    responses(
        (status = 200, description = "Employee restored", body = Employee),
        (status = 404, description = "Archived employee not found"),
        (status = 409, description = "Fingerprint tag or email collides with an active employee")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn restore_ex_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let mut tx = pool.begin().await?;

    let archived = sqlx::query_as::<_, ExEmployee>(
        "SELECT id, name, fingerprint_id, email, department, phone, deleted_date \
         FROM ex_employees WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Archived employee"))?;

    if let Some(tag) = &archived.fingerprint_id {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE fingerprint_id = ? LIMIT 1)",
        )
        .bind(tag)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(ApiError::Conflict(
                "Cannot restore. Fingerprint tag already exists in active employees.".to_string(),
            ));
        }
    }

    if let Some(email) = &archived.email {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? LIMIT 1)",
        )
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(ApiError::Conflict(
                "Cannot restore. Email already exists in active employees.".to_string(),
            ));
        }
    }

    let result = sqlx::query(
        "INSERT INTO employees (name, fingerprint_id, email, department, phone) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&archived.name)
    .bind(&archived.fingerprint_id)
    .bind(&archived.email)
    .bind(&archived.department)
    .bind(&archived.phone)
    .execute(&mut *tx)
    .await;

    let restored_id = match result {
        Ok(res) => res.last_insert_id(),
        Err(e) if is_duplicate_key(&e) => {
            warn!(ex_employee_id = id, "duplicate key while restoring");
            return Err(ApiError::Conflict(
                "Fingerprint tag or email already in use".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    sqlx::query("DELETE FROM ex_employees WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if let Some(tag) = &archived.fingerprint_id {
        fingerprint_filter::insert(tag);
        fingerprint_cache::mark_taken(tag).await;
    }

    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, fingerprint_id, email, department, phone FROM employees WHERE id = ?",
    )
    .bind(restored_id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(ex_employee_id = id, employee_id = restored_id, "employee restored");
    Ok(HttpResponse::Ok().json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_sequential_and_zero_padded() {
        assert_eq!(next_fingerprint_tag(0), "FP001");
        assert_eq!(next_fingerprint_tag(3), "FP004");
        assert_eq!(next_fingerprint_tag(99), "FP100");
        assert_eq!(next_fingerprint_tag(999), "FP1000");
    }

    #[test]
    fn blank_optional_fields_become_none() {
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(" FP001 ".to_string())), Some("FP001".to_string()));
    }
}
