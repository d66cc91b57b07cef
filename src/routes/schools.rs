//! Admin management of the school lookup table.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::models::{DataResponse, MessageResponse};
use crate::routes::helpers::search_term;
use crate::school::{self, School, normalize_school_name};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SchoolRequest {
    pub name: String,
}

/// List schools ordered by name, optionally filtered by name.
#[openapi(tag = "Schools")]
#[get("/admin/schools?<search>")]
pub async fn list_schools(
    _admin: RequireAdmin,
    search: Option<String>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<School>>>, ApiError> {
    let mut conn = pool.acquire().await?;
    let schools = school::list_schools(&mut conn, search_term(&search)).await?;
    Ok(Json(DataResponse { data: schools }))
}

/// Get or create a school by name.
#[openapi(tag = "Schools")]
#[post("/admin/schools", data = "<payload>")]
pub async fn create_school(
    _admin: RequireAdmin,
    payload: Json<SchoolRequest>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<School>, ApiError> {
    let name = normalize_school_name(&payload.name).map_err(ApiError::BadRequest)?;
    let mut conn = pool.acquire().await?;
    let school = school::get_or_create_school(&mut conn, name).await?;
    Ok(Json(school))
}

/// Delete a school; its members keep their accounts.
#[openapi(tag = "Schools")]
#[delete("/admin/schools/<id>")]
pub async fn delete_school(
    _admin: RequireAdmin,
    id: Uuid,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut conn = pool.acquire().await?;
    if !school::delete_school(&mut conn, id).await? {
        return Err(ApiError::NotFound(format!("School '{id}' not found")));
    }
    Ok(Json(MessageResponse {
        message: format!("Deleted school {id}"),
    }))
}
