/// Skill Routes
///
/// Skills a teacher offers. Teachers manage their own records; listing is
/// scoped so a teacher only sees their own entries while admins and
/// learners browse everything.

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::error::{AppError, DatabaseError};
use crate::query::{calculate, FilterSpec, ListMeta, ListResponse, PaginationQuery};
use crate::validators::is_valid_name;

const FILTERABLE_FIELDS: &[&str] = &["teacher_id", "name"];
const SEARCHABLE_FIELDS: &[&str] = &["name"];
const SORTABLE_FIELDS: &[&str] = &["created_at", "updated_at", "name"];

type SkillRow = (Uuid, Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

#[derive(Serialize)]
pub struct SkillResponse {
    pub id: String,
    pub teacher_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SkillRow> for SkillResponse {
    fn from(row: SkillRow) -> Self {
        let (id, teacher_id, name, description, created_at, updated_at) = row;
        Self {
            id: id.to_string(),
            teacher_id: teacher_id.to_string(),
            name,
            description,
            created_at: created_at.to_rfc3339(),
            updated_at: updated_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSkillRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// POST /api/skills (TEACHER)
///
/// The owning teacher is always the caller, never taken from the payload.
pub async fn create_skill(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateSkillRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let teacher_id = claims.user_id()?;
    let name = is_valid_name(&form.name)?;

    let skill_id = Uuid::new_v4();
    let now = Utc::now();
    let row = sqlx::query_as::<_, SkillRow>(
        r#"
        INSERT INTO skills (id, teacher_id, name, description, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, teacher_id, name, description, created_at, updated_at
        "#,
    )
    .bind(skill_id)
    .bind(teacher_id)
    .bind(&name)
    .bind(form.description.clone().unwrap_or_default())
    .bind(now)
    .bind(now)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(teacher_id = %teacher_id, skill_id = %skill_id, "Skill created");

    Ok(HttpResponse::Created().json(SkillResponse::from(row)))
}

/// GET /api/skills (TEACHER, LEARNER, ADMIN)
pub async fn list_skills(
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
        "SELECT id, teacher_id, name, description, created_at, updated_at FROM skills {} {}",
        where_clause,
        pagination.order_limit_clause()
    );
    let mut query = sqlx::query_as::<_, SkillRow>(&sql);
    for bind in &binds {
        query = query.bind(bind.as_str());
    }
    let rows = query.fetch_all(pool.get_ref()).await?;

    let count_sql = format!("SELECT COUNT(*) FROM skills {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind.as_str());
    }
    let (total,) = count_query.fetch_one(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ListResponse {
        meta: ListMeta::new(&pagination, total),
        data: rows.into_iter().map(SkillResponse::from).collect::<Vec<_>>(),
    }))
}

/// GET /api/skills/{id} (public)
pub async fn get_skill(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let row = sqlx::query_as::<_, SkillRow>(
        "SELECT id, teacher_id, name, description, created_at, updated_at FROM skills WHERE id = $1",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Skill not found".to_string())))?;

    Ok(HttpResponse::Ok().json(SkillResponse::from(row)))
}

/// PATCH /api/skills/{id} (TEACHER)
pub async fn update_skill(
    path: web::Path<Uuid>,
    form: web::Json<UpdateSkillRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let skill_id = path.into_inner();
    let name = match &form.name {
        Some(name) => Some(is_valid_name(name)?),
        None => None,
    };

    let row = sqlx::query_as::<_, SkillRow>(
        r#"
        UPDATE skills
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            updated_at = $3
        WHERE id = $4
        RETURNING id, teacher_id, name, description, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(&form.description)
    .bind(Utc::now())
    .bind(skill_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Skill not found".to_string())))?;

    tracing::info!(skill_id = %skill_id, "Skill updated");

    Ok(HttpResponse::Ok().json(SkillResponse::from(row)))
}

/// DELETE /api/skills/{id} (TEACHER)
pub async fn delete_skill(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let skill_id = path.into_inner();

    let result = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(skill_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "Skill not found".to_string(),
        )));
    }

    tracing::info!(skill_id = %skill_id, "Skill deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Skill deleted!"
    })))
}
