/// Availability Routes
///
/// Weekly time windows a teacher is open for booking. Teachers manage and
/// see only their own windows; learners and admins can browse all of them.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::error::{AppError, DatabaseError};
use crate::query::{calculate, FilterSpec, ListMeta, ListResponse, PaginationQuery};

const FILTERABLE_FIELDS: &[&str] = &["teacher_id", "day_of_week"];
const SEARCHABLE_FIELDS: &[&str] = &["day_of_week"];
const SORTABLE_FIELDS: &[&str] = &["created_at", "day_of_week", "start_time"];

type AvailabilityRow = (Uuid, Uuid, String, String, String, DateTime<Utc>);

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub id: String,
    pub teacher_id: String,
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
}

impl From<AvailabilityRow> for AvailabilityResponse {
    fn from(row: AvailabilityRow) -> Self {
        let (id, teacher_id, day_of_week, start_time, end_time, created_at) = row;
        Self {
            id: id.to_string(),
            teacher_id: teacher_id.to_string(),
            day_of_week,
            start_time,
            end_time,
            created_at: created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub day_of_week: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// POST /api/availability (TEACHER)
pub async fn create_availability(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateAvailabilityRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let teacher_id = claims.user_id()?;

    let availability_id = Uuid::new_v4();
    let row = sqlx::query_as::<_, AvailabilityRow>(
        r#"
        INSERT INTO availability (id, teacher_id, day_of_week, start_time, end_time, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, teacher_id, day_of_week, start_time, end_time, created_at
        "#,
    )
    .bind(availability_id)
    .bind(teacher_id)
    .bind(&form.day_of_week)
    .bind(&form.start_time)
    .bind(&form.end_time)
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(
        teacher_id = %teacher_id,
        availability_id = %availability_id,
        "Availability window created"
    );

    Ok(HttpResponse::Created().json(AvailabilityResponse::from(row)))
}

/// GET /api/availability (TEACHER, LEARNER, ADMIN)
pub async fn list_availability(
    claims: web::ReqData<Claims>,
    params: web::Query<HashMap<String, String>>,
    options: web::Query<PaginationQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let mut filter = FilterSpec::from_params(&params, FILTERABLE_FIELDS, SEARCHABLE_FIELDS);
    if claims.role == Role::Teacher {
        filter = filter.scope_to_owner("teacher_id", &claims.user_id()?);
    }

    let pagination = calculate(&options, SORTABLE_FIELDS);
    let (where_clause, binds) = filter.where_clause();

    let sql = format!(
        "SELECT id, teacher_id, day_of_week, start_time, end_time, created_at FROM availability {} {}",
        where_clause,
        pagination.order_limit_clause()
    );
    let mut query = sqlx::query_as::<_, AvailabilityRow>(&sql);
    for bind in &binds {
        query = query.bind(bind.as_str());
    }
    let rows = query.fetch_all(pool.get_ref()).await?;

    let count_sql = format!("SELECT COUNT(*) FROM availability {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind.as_str());
    }
    let (total,) = count_query.fetch_one(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        meta: ListMeta::new(&pagination, total),
        data: rows
            .into_iter()
            .map(AvailabilityResponse::from)
            .collect::<Vec<_>>(),
    }))
}

/// GET /api/availability/{id} (public)
pub async fn get_availability(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let row = sqlx::query_as::<_, AvailabilityRow>(
        "SELECT id, teacher_id, day_of_week, start_time, end_time, created_at FROM availability WHERE id = $1",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        AppError::Database(DatabaseError::NotFound(
            "Availability window not found".to_string(),
        ))
    })?;

    Ok(HttpResponse::Ok().json(AvailabilityResponse::from(row)))
}

/// PATCH /api/availability/{id} (TEACHER)
pub async fn update_availability(
    path: web::Path<Uuid>,
    form: web::Json<UpdateAvailabilityRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let availability_id = path.into_inner();

    let row = sqlx::query_as::<_, AvailabilityRow>(
        r#"
        UPDATE availability
        SET day_of_week = COALESCE($1, day_of_week),
            start_time = COALESCE($2, start_time),
            end_time = COALESCE($3, end_time)
        WHERE id = $4
        RETURNING id, teacher_id, day_of_week, start_time, end_time, created_at
        "#,
    )
    .bind(&form.day_of_week)
    .bind(&form.start_time)
    .bind(&form.end_time)
    .bind(availability_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        AppError::Database(DatabaseError::NotFound(
            "Availability window not found".to_string(),
        ))
    })?;

    tracing::info!(availability_id = %availability_id, "Availability window updated");

    Ok(HttpResponse::Ok().json(AvailabilityResponse::from(row)))
}

/// DELETE /api/availability/{id} (TEACHER)
pub async fn delete_availability(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let availability_id = path.into_inner();

    let result = sqlx::query("DELETE FROM availability WHERE id = $1")
        .bind(availability_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "Availability window not found".to_string(),
        )));
    }

    tracing::info!(availability_id = %availability_id, "Availability window deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Availability window deleted!"
    })))
}
