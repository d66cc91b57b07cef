//! Coach dashboard and grade reports, scoped to the caller's school.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;

use crate::coach::{self, CoachContext, CourseReport, Dashboard, GradeBook, StudentProgress};
use crate::error::ApiError;
use crate::routes::helpers::parse_course_key;

/// Students of the coach's school and the courses they are enrolled in.
#[openapi(tag = "Coach")]
#[get("/coach")]
pub async fn dashboard(
    ctx: CoachContext,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<Dashboard>, ApiError> {
    let mut conn = pool.acquire().await?;
    let dashboard = coach::reports::dashboard(&mut conn, ctx.school_id).await?;
    Ok(Json(dashboard))
}

/// Grade summary of every enrolled student of the coach's school.
#[openapi(tag = "Coach")]
#[get("/coach/reports/<course_id>")]
pub async fn reports(
    ctx: CoachContext,
    course_id: String,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<CourseReport>, ApiError> {
    let key = parse_course_key(&course_id)?;
    let mut conn = pool.acquire().await?;
    let grades = GradeBook::new();

    coach::reports::course_report(&mut conn, &grades, ctx.school_id, key.as_str())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Course '{key}' not found")))
}

/// Chapter by chapter progress of one student.
#[openapi(tag = "Coach")]
#[get("/coach/reports/<course_id>/<student_id>")]
pub async fn student_progress(
    ctx: CoachContext,
    course_id: String,
    student_id: i32,
    pool: &State<sqlx::PgPool>,
) -> Result<Json<StudentProgress>, ApiError> {
    let key = parse_course_key(&course_id)?;
    let mut conn = pool.acquire().await?;
    let grades = GradeBook::new();

    coach::reports::student_progress(&mut conn, &grades, ctx.school_id, key.as_str(), student_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No student {student_id} enrolled in '{key}' at your school"
            ))
        })
}
