/// Review Routes
///
/// Learner feedback on completed sessions. Learners write and see their own
/// reviews; teachers and admins browse everything.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::error::{AppError, DatabaseError, ValidationError};
use crate::query::{calculate, FilterSpec, ListMeta, ListResponse, PaginationQuery};

const FILTERABLE_FIELDS: &[&str] = &["session_id", "learner_id", "rating"];
const SEARCHABLE_FIELDS: &[&str] = &["comment"];
const SORTABLE_FIELDS: &[&str] = &["created_at", "rating"];

type ReviewRow = (Uuid, Uuid, Uuid, i32, String, DateTime<Utc>);

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub session_id: String,
    pub learner_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
}

impl From<ReviewRow> for ReviewResponse {
    fn from(row: ReviewRow) -> Self {
        let (id, session_id, learner_id, rating, comment, created_at) = row;
        Self {
            id: id.to_string(),
            session_id: session_id.to_string(),
            learner_id: learner_id.to_string(),
            rating,
            comment,
            created_at: created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub session_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(ValidationError::BusinessRule(
            "rating must be between 1 and 5".to_string(),
        )));
    }
    Ok(())
}

/// POST /api/reviews (LEARNER)
///
/// The reviewing learner is always the caller; the session must exist.
pub async fn create_review(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateReviewRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let learner_id = claims.user_id()?;
    validate_rating(form.rating)?;

    let session = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM sessions WHERE id = $1")
        .bind(form.session_id)
        .fetch_optional(pool.get_ref())
        .await?;

    if session.is_none() {
        return Err(AppError::Validation(ValidationError::BusinessRule(
            "session_id does not reference an existing session".to_string(),
        )));
    }

    let review_id = Uuid::new_v4();
    let row = sqlx::query_as::<_, ReviewRow>(
        r#"
        INSERT INTO reviews (id, session_id, learner_id, rating, comment, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, session_id, learner_id, rating, comment, created_at
        "#,
    )
    .bind(review_id)
    .bind(form.session_id)
    .bind(learner_id)
    .bind(form.rating)
    .bind(form.comment.clone().unwrap_or_default())
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(
        review_id = %review_id,
        learner_id = %learner_id,
        session_id = %form.session_id,
        "Review created"
    );

    Ok(HttpResponse::Created().json(ReviewResponse::from(row)))
}

/// GET /api/reviews (TEACHER, LEARNER, ADMIN)
///
/// Learners are pinned to their own reviews; other permitted roles browse
/// everything.
pub async fn list_reviews(
    claims: web::ReqData<Claims>,
    params: web::Query<HashMap<String, String>>,
    options: web::Query<PaginationQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let mut filter = FilterSpec::from_params(&params, FILTERABLE_FIELDS, SEARCHABLE_FIELDS);
    if claims.role == Role::Learner {
        filter = filter.scope_to_owner("learner_id", &claims.user_id()?);
    }

    let pagination = calculate(&options, SORTABLE_FIELDS);
    let (where_clause, binds) = filter.where_clause();

    let sql = format!(
        "SELECT id, session_id, learner_id, rating, comment, created_at FROM reviews {} {}",
        where_clause,
        pagination.order_limit_clause()
    );
    let mut query = sqlx::query_as::<_, ReviewRow>(&sql);
    for bind in &binds {
        query = query.bind(bind.as_str());
    }
    let rows = query.fetch_all(pool.get_ref()).await?;

    let count_sql = format!("SELECT COUNT(*) FROM reviews {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind.as_str());
    }
    let (total,) = count_query.fetch_one(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        meta: ListMeta::new(&pagination, total),
        data: rows
            .into_iter()
            .map(ReviewResponse::from)
            .collect::<Vec<_>>(),
    }))
}

/// GET /api/reviews/{id} (public)
pub async fn get_review(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, session_id, learner_id, rating, comment, created_at FROM reviews WHERE id = $1",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Review not found".to_string())))?;

    Ok(HttpResponse::Ok().json(ReviewResponse::from(row)))
}

/// PATCH /api/reviews/{id} (LEARNER)
pub async fn update_review(
    path: web::Path<Uuid>,
    form: web::Json<UpdateReviewRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let review_id = path.into_inner();
    if let Some(rating) = form.rating {
        validate_rating(rating)?;
    }

    let row = sqlx::query_as::<_, ReviewRow>(
        r#"
        UPDATE reviews
        SET rating = COALESCE($1, rating),
            comment = COALESCE($2, comment)
        WHERE id = $3
        RETURNING id, session_id, learner_id, rating, comment, created_at
        "#,
    )
    .bind(form.rating)
    .bind(&form.comment)
    .bind(review_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Review not found".to_string())))?;

    tracing::info!(review_id = %review_id, "Review updated");

    Ok(HttpResponse::Ok().json(ReviewResponse::from(row)))
}

/// DELETE /api/reviews/{id} (LEARNER, ADMIN)
pub async fn delete_review(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let review_id = path.into_inner();

    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "Review not found".to_string(),
        )));
    }

    tracing::info!(review_id = %review_id, "Review deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Review deleted!"
    })))
}
