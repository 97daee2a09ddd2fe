/// Session Routes
///
/// Tutoring sessions booked by learners against a teacher's skill. Listing
/// is ownership-scoped: learners see their own bookings, teachers their own
/// teaching slots, admins everything.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::error::{AppError, DatabaseError, ValidationError};
use crate::query::{calculate, FilterSpec, ListMeta, ListResponse, PaginationQuery};

const FILTERABLE_FIELDS: &[&str] = &["teacher_id", "learner_id", "skill_id", "status"];
const SEARCHABLE_FIELDS: &[&str] = &["status"];
const SORTABLE_FIELDS: &[&str] = &["created_at", "updated_at", "date"];

type SessionRow = (
    Uuid,
    Uuid,
    Uuid,
    Uuid,
    DateTime<Utc>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub teacher_id: String,
    pub learner_id: String,
    pub skill_id: String,
    pub date: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SessionRow> for SessionResponse {
    fn from(row: SessionRow) -> Self {
        let (id, teacher_id, learner_id, skill_id, date, status, created_at, updated_at) = row;
        Self {
            id: id.to_string(),
            teacher_id: teacher_id.to_string(),
            learner_id: learner_id.to_string(),
            skill_id: skill_id.to_string(),
            date: date.to_rfc3339(),
            status,
            created_at: created_at.to_rfc3339(),
            updated_at: updated_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub teacher_id: Uuid,
    pub skill_id: Uuid,
    pub date: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct UpdateSessionRequest {
    pub date: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

/// POST /api/sessions (LEARNER, TEACHER)
///
/// Book a session. The learner is always the caller. A teacher can hold at
/// most one session per date, and the skill must exist.
pub async fn create_session(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateSessionRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let learner_id = claims.user_id()?;

    let existing = sqlx::query_as::<_, (Uuid,)>(
        "SELECT id FROM sessions WHERE teacher_id = $1 AND date = $2",
    )
    .bind(form.teacher_id)
    .bind(form.date)
    .fetch_optional(pool.get_ref())
    .await?;

    if existing.is_some() {
        return Err(AppError::Validation(ValidationError::BusinessRule(
            "a session already exists for this teacher on this date".to_string(),
        )));
    }

    let skill = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM skills WHERE id = $1")
        .bind(form.skill_id)
        .fetch_optional(pool.get_ref())
        .await?;

    if skill.is_none() {
        return Err(AppError::Validation(ValidationError::BusinessRule(
            "skill_id does not reference an existing skill".to_string(),
        )));
    }

    let session_id = Uuid::new_v4();
    let now = Utc::now();
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO sessions (id, teacher_id, learner_id, skill_id, date, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, teacher_id, learner_id, skill_id, date, status, created_at, updated_at
        "#,
    )
    .bind(session_id)
    .bind(form.teacher_id)
    .bind(learner_id)
    .bind(form.skill_id)
    .bind(form.date)
    .bind("BOOKED")
    .bind(now)
    .bind(now)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(
        session_id = %session_id,
        learner_id = %learner_id,
        teacher_id = %form.teacher_id,
        "Session created"
    );

    Ok(HttpResponse::Created().json(SessionResponse::from(row)))
}

/// GET /api/sessions (TEACHER, LEARNER, ADMIN)
///
/// Learners are pinned to their own bookings and teachers to their own
/// teaching slots; admins see every session.
pub async fn list_sessions(
    claims: web::ReqData<Claims>,
    params: web::Query<HashMap<String, String>>,
    options: web::Query<PaginationQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let mut filter = FilterSpec::from_params(&params, FILTERABLE_FIELDS, SEARCHABLE_FIELDS);
    match claims.role {
        Role::Learner => filter = filter.scope_to_owner("learner_id", &claims.user_id()?),
        Role::Teacher => filter = filter.scope_to_owner("teacher_id", &claims.user_id()?),
        _ => {}
    }

    let pagination = calculate(&options, SORTABLE_FIELDS);
    let (where_clause, binds) = filter.where_clause();

    let sql = format!(
        "SELECT id, teacher_id, learner_id, skill_id, date, status, created_at, updated_at FROM sessions {} {}",
        where_clause,
        pagination.order_limit_clause()
    );
    let mut query = sqlx::query_as::<_, SessionRow>(&sql);
    for bind in &binds {
        query = query.bind(bind.as_str());
    }
    let rows = query.fetch_all(pool.get_ref()).await?;

    let count_sql = format!("SELECT COUNT(*) FROM sessions {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind.as_str());
    }
    let (total,) = count_query.fetch_one(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        meta: ListMeta::new(&pagination, total),
        data: rows
            .into_iter()
            .map(SessionResponse::from)
            .collect::<Vec<_>>(),
    }))
}

/// GET /api/sessions/{id} (public)
pub async fn get_session(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT id, teacher_id, learner_id, skill_id, date, status, created_at, updated_at FROM sessions WHERE id = $1",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Session not found".to_string())))?;

    Ok(HttpResponse::Ok().json(SessionResponse::from(row)))
}

/// PATCH /api/sessions/{id} (TEACHER, LEARNER)
pub async fn update_session(
    path: web::Path<Uuid>,
    form: web::Json<UpdateSessionRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();

    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        UPDATE sessions
        SET date = COALESCE($1, date),
            status = COALESCE($2, status),
            updated_at = $3
        WHERE id = $4
        RETURNING id, teacher_id, learner_id, skill_id, date, status, created_at, updated_at
        "#,
    )
    .bind(form.date)
    .bind(&form.status)
    .bind(Utc::now())
    .bind(session_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Session not found".to_string())))?;

    tracing::info!(session_id = %session_id, "Session updated");

    Ok(HttpResponse::Ok().json(SessionResponse::from(row)))
}

/// DELETE /api/sessions/{id} (ADMIN)
pub async fn delete_session(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();

    let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "Session not found".to_string(),
        )));
    }

    tracing::info!(session_id = %session_id, "Session deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Session deleted!"
    })))
}
