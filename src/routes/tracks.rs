//! Degree track pages and their admin editing endpoints.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::degree_track::store::{self, ObjectiveInput, TrackInput};
use crate::degree_track::{Degree, DegreeTrack, DegreeTrackDetail, ObjectiveWithPoints};
use crate::error::ApiError;
use crate::models::{DataResponse, MessageResponse};
use crate::routes::helpers::search_term;

/// List all degree tracks ordered by name.
#[openapi(tag = "Degree Tracks")]
#[get("/tracks")]
pub async fn track_list(
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<DegreeTrack>>>, ApiError> {
    let mut conn = pool.acquire().await?;
    let tracks = store::list_tracks(&mut conn).await?;
    Ok(Json(DataResponse { data: tracks }))
}

/// Get a track with its courses.
#[openapi(tag = "Degree Tracks")]
#[get("/tracks/<id>")]
pub async fn about_track(
    id: Uuid,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DegreeTrackDetail>, ApiError> {
    let mut conn = pool.acquire().await?;
    store::get_track(&mut conn, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Degree track '{id}' not found")))
}

/// Create a track from a set of degrees.
#[openapi(tag = "Degree Tracks")]
#[post("/admin/tracks", data = "<payload>")]
pub async fn create_track(
    _admin: RequireAdmin,
    payload: Json<TrackInput>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DegreeTrackDetail>, ApiError> {
    let mut tx = pool.begin().await?;
    let track = store::create_track(&mut tx, &payload).await?;
    tx.commit().await?;

    log::info!("created degree track '{}' ({})", track.track.name, track.track.id);
    Ok(Json(track))
}

/// Replace a track's fields and course set.
#[openapi(tag = "Degree Tracks")]
#[put("/admin/tracks/<id>", data = "<payload>")]
pub async fn update_track(
    _admin: RequireAdmin,
    id: Uuid,
    payload: Json<TrackInput>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DegreeTrackDetail>, ApiError> {
    let mut tx = pool.begin().await?;
    let Some(track) = store::update_track(&mut tx, id, &payload).await? else {
        return Err(ApiError::NotFound(format!("Degree track '{id}' not found")));
    };
    tx.commit().await?;
    Ok(Json(track))
}

#[openapi(tag = "Degree Tracks")]
#[delete("/admin/tracks/<id>")]
pub async fn delete_track(
    _admin: RequireAdmin,
    id: Uuid,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut conn = pool.acquire().await?;
    if !store::delete_track(&mut conn, id).await? {
        return Err(ApiError::NotFound(format!("Degree track '{id}' not found")));
    }
    Ok(Json(MessageResponse {
        message: format!("Deleted degree track {id}"),
    }))
}

/// List degrees, optionally filtered by name or course id.
#[openapi(tag = "Degree Tracks")]
#[get("/admin/degrees?<search>")]
pub async fn list_degrees(
    _admin: RequireAdmin,
    search: Option<String>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<Degree>>>, ApiError> {
    let mut conn = pool.acquire().await?;
    let degrees = store::list_degrees(&mut conn, search_term(&search)).await?;
    Ok(Json(DataResponse { data: degrees }))
}

/// Objectives of a degree, each with its points.
#[openapi(tag = "Degree Tracks")]
#[get("/degrees/<id>/objectives")]
pub async fn list_objectives(
    id: i32,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<ObjectiveWithPoints>>>, ApiError> {
    let mut conn = pool.acquire().await?;
    if store::get_degree(&mut conn, id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Degree {id} not found")));
    }
    let objectives = store::list_objectives(&mut conn, id).await?;
    Ok(Json(DataResponse { data: objectives }))
}

#[openapi(tag = "Degree Tracks")]
#[post("/admin/degrees/<id>/objectives", data = "<payload>")]
pub async fn create_objective(
    _admin: RequireAdmin,
    id: i32,
    payload: Json<ObjectiveInput>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<ObjectiveWithPoints>, ApiError> {
    let mut tx = pool.begin().await?;
    let Some(objective) = store::create_objective(&mut tx, id, &payload).await? else {
        return Err(ApiError::NotFound(format!("Degree {id} not found")));
    };
    tx.commit().await?;
    Ok(Json(objective))
}

/// Replace an objective and its full list of points.
#[openapi(tag = "Degree Tracks")]
#[put("/admin/objectives/<id>", data = "<payload>")]
pub async fn update_objective(
    _admin: RequireAdmin,
    id: i32,
    payload: Json<ObjectiveInput>,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<ObjectiveWithPoints>, ApiError> {
    let mut tx = pool.begin().await?;
    let Some(objective) = store::update_objective(&mut tx, id, &payload).await? else {
        return Err(ApiError::NotFound(format!("Objective {id} not found")));
    };
    tx.commit().await?;
    Ok(Json(objective))
}

#[openapi(tag = "Degree Tracks")]
#[delete("/admin/objectives/<id>")]
pub async fn delete_objective(
    _admin: RequireAdmin,
    id: i32,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut conn = pool.acquire().await?;
    if !store::delete_objective(&mut conn, id).await? {
        return Err(ApiError::NotFound(format!("Objective {id} not found")));
    }
    Ok(Json(MessageResponse {
        message: format!("Deleted objective {id}"),
    }))
}
