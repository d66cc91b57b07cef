//! Liveness and readiness endpoints used by probes and tests.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Basic response payload describing API health.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Static status string reporting application readiness.
    pub status: String,
}

/// Liveness check returning a trivial JSON payload.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check: succeeds once the database answers a trivial query.
#[openapi(tag = "Health")]
#[get("/health/ready")]
pub async fn readiness(pool: &State<sqlx::PgPool>) -> Result<Json<HealthResponse>, ApiError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool.inner())
        .await?;

    Ok(Json(HealthResponse {
        status: "ready".to_string(),
    }))
}
