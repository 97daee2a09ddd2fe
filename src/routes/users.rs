/// User Routes
///
/// Admin listing, the public teachers directory, and profile management.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{hash_password, Claims, Role, UserStatus};
use crate::error::{AppError, DatabaseError};
use crate::query::{calculate, FilterSpec, ListMeta, ListResponse, PaginationQuery};
use crate::validators::is_valid_name;

/// Fields a caller may filter on; everything else on the query string is
/// dropped by the filter builder.
const FILTERABLE_FIELDS: &[&str] = &["email", "role", "status"];
const SEARCHABLE_FIELDS: &[&str] = &["name", "email"];
const SORTABLE_FIELDS: &[&str] = &["created_at", "updated_at", "name", "email"];

type UserRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

#[derive(Serialize)]
pub struct UserListItem {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRow> for UserListItem {
    fn from(row: UserRow) -> Self {
        let (id, name, email, role, status, avatar_url, created_at, updated_at) = row;
        Self {
            id: id.to_string(),
            name,
            email,
            role,
            status,
            avatar_url,
            created_at: created_at.to_rfc3339(),
            updated_at: updated_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status: UserStatus,
}

async fn list_with_filter(
    pool: &PgPool,
    filter: &FilterSpec,
    options: &PaginationQuery,
) -> Result<HttpResponse, AppError> {
    let pagination = calculate(options, SORTABLE_FIELDS);
    let (where_clause, binds) = filter.where_clause();

    let sql = format!(
        "SELECT id, name, email, role, status, avatar_url, created_at, updated_at FROM users {} {}",
        where_clause,
        pagination.order_limit_clause()
    );
    let mut query = sqlx::query_as::<_, UserRow>(&sql);
    for bind in &binds {
        query = query.bind(bind.as_str());
    }
    let rows = query.fetch_all(pool).await?;

    let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind.as_str());
    }
    let (total,) = count_query.fetch_one(pool).await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        meta: ListMeta::new(&pagination, total),
        data: rows.into_iter().map(UserListItem::from).collect(),
    }))
}

/// GET /api/users (ADMIN)
///
/// Filtered, paginated listing of every account.
pub async fn list_users(
    params: web::Query<HashMap<String, String>>,
    options: web::Query<PaginationQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let filter = FilterSpec::from_params(&params, FILTERABLE_FIELDS, SEARCHABLE_FIELDS);
    list_with_filter(pool.get_ref(), &filter, &options).await
}

/// GET /api/users/teachers (public)
///
/// Teachers directory: the role predicate is pinned server-side, on top of
/// whatever filters the caller supplies.
pub async fn list_teachers(
    params: web::Query<HashMap<String, String>>,
    options: web::Query<PaginationQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let filter = FilterSpec::from_params(&params, FILTERABLE_FIELDS, SEARCHABLE_FIELDS)
        .pin("role", Role::Teacher.as_str());
    list_with_filter(pool.get_ref(), &filter, &options).await
}

/// GET /api/users/me (authenticated)
pub async fn get_my_profile(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, role, status, avatar_url, created_at, updated_at FROM users WHERE id = $1 AND is_deleted = false",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))?;

    Ok(HttpResponse::Ok().json(UserListItem::from(row)))
}

/// PUT /api/users/me (authenticated)
///
/// Partial profile update; a password in the payload is re-hashed before it
/// is stored.
pub async fn update_my_profile(
    claims: web::ReqData<Claims>,
    form: web::Json<UpdateProfileRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    apply_profile_update(pool.get_ref(), user_id, &form).await
}

/// PATCH /api/users/{id} (ADMIN)
pub async fn update_user(
    path: web::Path<Uuid>,
    form: web::Json<UpdateProfileRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    apply_profile_update(pool.get_ref(), path.into_inner(), &form).await
}

async fn apply_profile_update(
    pool: &PgPool,
    user_id: Uuid,
    form: &UpdateProfileRequest,
) -> Result<HttpResponse, AppError> {
    let name = match &form.name {
        Some(name) => Some(is_valid_name(name)?),
        None => None,
    };
    let password_hash = match &form.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET name = COALESCE($1, name),
            avatar_url = COALESCE($2, avatar_url),
            password_hash = COALESCE($3, password_hash),
            updated_at = $4
        WHERE id = $5 AND is_deleted = false
        RETURNING id, name, email, role, status, avatar_url, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(&form.avatar_url)
    .bind(password_hash)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))?;

    tracing::info!(user_id = %user_id, "User profile updated");

    Ok(HttpResponse::Ok().json(UserListItem::from(row)))
}

/// PATCH /api/users/{id}/status (ADMIN)
pub async fn change_user_status(
    path: web::Path<Uuid>,
    form: web::Json<ChangeStatusRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET status = $1, updated_at = $2
        WHERE id = $3
        RETURNING id, name, email, role, status, avatar_url, created_at, updated_at
        "#,
    )
    .bind(form.status.as_str())
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))?;

    tracing::info!(user_id = %user_id, status = %form.status, "User status changed");

    Ok(HttpResponse::Ok().json(UserListItem::from(row)))
}

/// DELETE /api/users/{id} (ADMIN)
///
/// Soft delete: the record stays for referential integrity but the account
/// can no longer authenticate.
pub async fn delete_user(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE users SET is_deleted = true, updated_at = $1 WHERE id = $2 AND is_deleted = false",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "User not found".to_string(),
        )));
    }

    tracing::info!(user_id = %user_id, "User deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User data deleted!"
    })))
}
