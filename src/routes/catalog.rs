//! Catalog update path. Saving or deleting a course overview also syncs the
//! degrees built from it, in the same transaction.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::RequireAdmin;
use crate::catalog::{self, CourseOverview, CourseOverviewInput};
use crate::degree_track::SyncOutcome;
use crate::error::ApiError;
use crate::models::MessageResponse;
use crate::routes::helpers::parse_course_key;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CourseSyncResponse {
    pub course: CourseOverview,
    /// `created` or `updated`, describing what happened to the course's degree.
    pub degree: String,
}

#[openapi(tag = "Catalog")]
#[get("/admin/catalog/courses/<course_id>")]
pub async fn get_course(
    _admin: RequireAdmin,
    course_id: String,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<CourseOverview>, ApiError> {
    let key = parse_course_key(&course_id)?;
    let mut conn = pool.acquire().await?;
    catalog::find_course(&mut conn, key.as_str())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Course '{key}' not found")))
}

/// Save a course overview published by the content store.
#[openapi(tag = "Catalog")]
#[put("/admin/catalog/courses/<course_id>", data = "<payload>")]
pub async fn save_course(
    _admin: RequireAdmin,
    course_id: String,
    payload: Json<CourseOverviewInput>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<CourseSyncResponse>, ApiError> {
    let key = parse_course_key(&course_id)?;
    let overview = payload
        .into_inner()
        .into_overview(&key)
        .map_err(ApiError::BadRequest)?;

    let mut tx = pool.begin().await?;
    let outcome = catalog::save_course_overview(&mut tx, &overview).await?;
    tx.commit().await?;

    let degree = match outcome {
        SyncOutcome::Created => "created",
        _ => "updated",
    };
    Ok(Json(CourseSyncResponse {
        course: overview,
        degree: degree.to_string(),
    }))
}

/// Remove a course from the catalog along with its degrees.
#[openapi(tag = "Catalog")]
#[delete("/admin/catalog/courses/<course_id>")]
pub async fn delete_course(
    _admin: RequireAdmin,
    course_id: String,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    let key = parse_course_key(&course_id)?;

    let mut tx = pool.begin().await?;
    let Some(outcome) = catalog::delete_course_overview(&mut tx, key.as_str()).await? else {
        return Err(ApiError::NotFound(format!("Course '{key}' not found")));
    };
    tx.commit().await?;

    let removed = match outcome {
        SyncOutcome::Removed(n) => n,
        _ => 0,
    };
    Ok(Json(MessageResponse {
        message: format!("Deleted course {key} and {removed} degree(s)"),
    }))
}
