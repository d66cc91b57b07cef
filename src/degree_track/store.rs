//! Queries behind the track pages and the admin editing endpoints.

use std::collections::{BTreeSet, HashMap};

use rocket_db_pools::sqlx::{self, PgConnection};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::degree_track::models::{
    CourseObjective, Degree, DegreeTrack, DegreeTrackDetail, ObjectivePoint, ObjectiveWithPoints,
};
use crate::school::escape_like;

const MAX_NAME_LEN: usize = 255;
const MAX_IMAGE_LEN: usize = 100;
const IMAGE_UPLOAD_DIR: &str = "tracks/";

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("{0}")]
    Invalid(String),
    #[error("unknown degree ids: {0:?}")]
    UnknownDegrees(Vec<i32>),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Admin payload for creating or replacing a degree track.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TrackInput {
    pub name: String,
    pub short_description: String,
    /// Image path; stored under `tracks/`.
    pub image: String,
    /// Degree ids making up the track.
    #[serde(default)]
    pub course_ids: Vec<i32>,
}

impl TrackInput {
    /// Trim and check field limits, returning the cleaned input.
    pub fn validate(&self) -> Result<TrackInput, TrackError> {
        let name = required_field("name", &self.name, MAX_NAME_LEN)?;
        let short_description =
            required_field("short_description", &self.short_description, MAX_NAME_LEN)?;
        let image = required_field("image", &self.image, MAX_IMAGE_LEN)?;
        let image = if image.starts_with(IMAGE_UPLOAD_DIR) {
            image
        } else {
            format!("{IMAGE_UPLOAD_DIR}{}", image.trim_start_matches('/'))
        };
        if image.chars().count() > MAX_IMAGE_LEN {
            return Err(TrackError::Invalid(format!(
                "image must be at most {MAX_IMAGE_LEN} characters"
            )));
        }

        let course_ids: BTreeSet<i32> = self.course_ids.iter().copied().collect();

        Ok(TrackInput {
            name,
            short_description,
            image,
            course_ids: course_ids.into_iter().collect(),
        })
    }
}

/// Admin payload for an objective with its inline points.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ObjectiveInput {
    pub title: String,
    pub number: u16,
    #[serde(default)]
    pub points: Vec<String>,
}

impl ObjectiveInput {
    pub fn validate(&self) -> Result<ObjectiveInput, TrackError> {
        let title = required_field("title", &self.title, MAX_NAME_LEN)?;
        let points = self
            .points
            .iter()
            .filter(|point| !point.trim().is_empty())
            .map(|point| required_field("point", point, MAX_NAME_LEN))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObjectiveInput {
            title,
            number: self.number,
            points,
        })
    }
}

fn required_field(field: &str, value: &str, max: usize) -> Result<String, TrackError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrackError::Invalid(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(TrackError::Invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

// ===== Tracks =====

pub async fn list_tracks(conn: &mut PgConnection) -> Result<Vec<DegreeTrack>, sqlx::Error> {
    sqlx::query_as::<_, DegreeTrack>(
        "SELECT id, name, short_description, image FROM degree_tracks ORDER BY name ASC",
    )
    .fetch_all(conn)
    .await
}

pub async fn get_track(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<DegreeTrackDetail>, sqlx::Error> {
    let track = sqlx::query_as::<_, DegreeTrack>(
        "SELECT id, name, short_description, image FROM degree_tracks WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(track) = track else {
        return Ok(None);
    };

    let courses = sqlx::query_as::<_, Degree>(
        r#"SELECT d.id, d.course_id, d.name, d.image_url, d.short_description
           FROM degrees d
           JOIN degree_track_courses tc ON tc.degree_id = d.id
           WHERE tc.track_id = $1
           ORDER BY d.name ASC, d.id ASC"#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(DegreeTrackDetail { track, courses }))
}

/// Insert a track and its course memberships. Run inside a transaction.
pub async fn create_track(
    conn: &mut PgConnection,
    input: &TrackInput,
) -> Result<DegreeTrackDetail, TrackError> {
    let input = input.validate()?;
    ensure_degrees_exist(conn, &input.course_ids).await?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO degree_tracks (id, name, short_description, image) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.short_description)
    .bind(&input.image)
    .execute(&mut *conn)
    .await?;

    replace_track_courses(conn, id, &input.course_ids).await?;

    get_track(conn, id)
        .await?
        .ok_or(TrackError::Database(sqlx::Error::RowNotFound))
}

/// Replace a track's fields and course set. Returns `None` for unknown tracks.
pub async fn update_track(
    conn: &mut PgConnection,
    id: Uuid,
    input: &TrackInput,
) -> Result<Option<DegreeTrackDetail>, TrackError> {
    let input = input.validate()?;
    ensure_degrees_exist(conn, &input.course_ids).await?;

    let updated = sqlx::query(
        "UPDATE degree_tracks SET name = $2, short_description = $3, image = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.short_description)
    .bind(&input.image)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    replace_track_courses(conn, id, &input.course_ids).await?;
    Ok(get_track(conn, id).await?)
}

pub async fn delete_track(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM degree_tracks WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn ensure_degrees_exist(conn: &mut PgConnection, ids: &[i32]) -> Result<(), TrackError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i32> = sqlx::query_scalar("SELECT id FROM degrees WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

    let found: BTreeSet<i32> = found.into_iter().collect();
    let missing: Vec<i32> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TrackError::UnknownDegrees(missing))
    }
}

async fn replace_track_courses(
    conn: &mut PgConnection,
    track_id: Uuid,
    degree_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM degree_track_courses WHERE track_id = $1")
        .bind(track_id)
        .execute(&mut *conn)
        .await?;

    if !degree_ids.is_empty() {
        sqlx::query(
            r#"INSERT INTO degree_track_courses (track_id, degree_id)
               SELECT $1, unnest($2::int4[])"#,
        )
        .bind(track_id)
        .bind(degree_ids)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// ===== Degrees =====

pub async fn list_degrees(
    conn: &mut PgConnection,
    search: Option<&str>,
) -> Result<Vec<Degree>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", escape_like(term)));

    sqlx::query_as::<_, Degree>(
        r#"SELECT id, course_id, name, image_url, short_description
           FROM degrees
           WHERE $1::text IS NULL OR name ILIKE $1 OR course_id ILIKE $1
           ORDER BY name ASC, id ASC"#,
    )
    .bind(pattern)
    .fetch_all(conn)
    .await
}

pub async fn get_degree(conn: &mut PgConnection, id: i32) -> Result<Option<Degree>, sqlx::Error> {
    sqlx::query_as::<_, Degree>(
        "SELECT id, course_id, name, image_url, short_description FROM degrees WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

// ===== Objectives =====

/// Objectives of a degree ordered by number, each with its points ordered by text.
pub async fn list_objectives(
    conn: &mut PgConnection,
    degree_id: i32,
) -> Result<Vec<ObjectiveWithPoints>, sqlx::Error> {
    let objectives = sqlx::query_as::<_, CourseObjective>(
        r#"SELECT id, degree_id, title, number
           FROM course_objectives
           WHERE degree_id = $1
           ORDER BY number ASC, id ASC"#,
    )
    .bind(degree_id)
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<i32> = objectives.iter().map(|objective| objective.id).collect();
    let points = fetch_points(conn, &ids).await?;
    Ok(attach_points(objectives, points))
}

pub async fn get_objective(
    conn: &mut PgConnection,
    id: i32,
) -> Result<Option<ObjectiveWithPoints>, sqlx::Error> {
    let objective = sqlx::query_as::<_, CourseObjective>(
        "SELECT id, degree_id, title, number FROM course_objectives WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(objective) = objective else {
        return Ok(None);
    };

    let points = fetch_points(conn, &[objective.id]).await?;
    Ok(attach_points(vec![objective], points).pop())
}

/// Add an objective with points to a degree. Returns `None` for unknown degrees.
pub async fn create_objective(
    conn: &mut PgConnection,
    degree_id: i32,
    input: &ObjectiveInput,
) -> Result<Option<ObjectiveWithPoints>, TrackError> {
    let input = input.validate()?;
    if get_degree(conn, degree_id).await?.is_none() {
        return Ok(None);
    }

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO course_objectives (degree_id, title, number) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(degree_id)
    .bind(&input.title)
    .bind(i32::from(input.number))
    .fetch_one(&mut *conn)
    .await?;

    insert_points(conn, id, &input.points).await?;
    Ok(get_objective(conn, id).await?)
}

/// Replace an objective's title, number and full point list.
pub async fn update_objective(
    conn: &mut PgConnection,
    id: i32,
    input: &ObjectiveInput,
) -> Result<Option<ObjectiveWithPoints>, TrackError> {
    let input = input.validate()?;

    let updated = sqlx::query("UPDATE course_objectives SET title = $2, number = $3 WHERE id = $1")
        .bind(id)
        .bind(&input.title)
        .bind(i32::from(input.number))
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    sqlx::query("DELETE FROM objective_points WHERE objective_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    insert_points(conn, id, &input.points).await?;

    Ok(get_objective(conn, id).await?)
}

pub async fn delete_objective(conn: &mut PgConnection, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM course_objectives WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_points(
    conn: &mut PgConnection,
    objective_id: i32,
    points: &[String],
) -> Result<(), sqlx::Error> {
    if points.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"INSERT INTO objective_points (objective_id, point)
           SELECT $1, unnest($2::text[])"#,
    )
    .bind(objective_id)
    .bind(points)
    .execute(conn)
    .await?;
    Ok(())
}

async fn fetch_points(
    conn: &mut PgConnection,
    objective_ids: &[i32],
) -> Result<Vec<ObjectivePoint>, sqlx::Error> {
    if objective_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, ObjectivePoint>(
        r#"SELECT id, objective_id, point
           FROM objective_points
           WHERE objective_id = ANY($1)
           ORDER BY point ASC, id ASC"#,
    )
    .bind(objective_ids)
    .fetch_all(conn)
    .await
}

fn attach_points(
    objectives: Vec<CourseObjective>,
    points: Vec<ObjectivePoint>,
) -> Vec<ObjectiveWithPoints> {
    let mut by_objective: HashMap<i32, Vec<ObjectivePoint>> = HashMap::new();
    for point in points {
        by_objective.entry(point.objective_id).or_default().push(point);
    }

    objectives
        .into_iter()
        .map(|objective| ObjectiveWithPoints {
            points: by_objective.remove(&objective.id).unwrap_or_default(),
            objective,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_input(image: &str) -> TrackInput {
        TrackInput {
            name: "  Data Science ".into(),
            short_description: "Numbers".into(),
            image: image.into(),
            course_ids: vec![3, 1, 3],
        }
    }

    #[test]
    fn track_input_is_trimmed_and_deduplicated() {
        let cleaned = track_input("tracks/ds.png").validate().expect("valid input");
        assert_eq!(cleaned.name, "Data Science");
        assert_eq!(cleaned.image, "tracks/ds.png");
        assert_eq!(cleaned.course_ids, vec![1, 3]);
    }

    #[test]
    fn track_images_land_in_upload_dir() {
        let cleaned = track_input("/ds.png").validate().expect("valid input");
        assert_eq!(cleaned.image, "tracks/ds.png");
    }

    #[test]
    fn track_input_rejects_blank_and_long_fields() {
        let mut input = track_input("ds.png");
        input.name = "   ".into();
        assert!(matches!(input.validate(), Err(TrackError::Invalid(_))));

        let mut input = track_input("ds.png");
        input.short_description = "d".repeat(256);
        assert!(matches!(input.validate(), Err(TrackError::Invalid(_))));

        let input = track_input(&"i".repeat(95));
        assert!(matches!(input.validate(), Err(TrackError::Invalid(_))));
    }

    #[test]
    fn objective_input_drops_blank_points() {
        let input = ObjectiveInput {
            title: "Understand cells".into(),
            number: 1,
            points: vec!["Membranes".into(), "  ".into(), " Nucleus ".into()],
        };
        let cleaned = input.validate().expect("valid input");
        assert_eq!(cleaned.points, vec!["Membranes", "Nucleus"]);
    }

    #[test]
    fn points_attach_to_their_objectives_in_order() {
        let objectives = vec![
            CourseObjective { id: 1, degree_id: 9, title: "A".into(), number: 1 },
            CourseObjective { id: 2, degree_id: 9, title: "B".into(), number: 2 },
        ];
        let points = vec![
            ObjectivePoint { id: 10, objective_id: 2, point: "alpha".into() },
            ObjectivePoint { id: 11, objective_id: 1, point: "beta".into() },
            ObjectivePoint { id: 12, objective_id: 2, point: "gamma".into() },
        ];

        let attached = attach_points(objectives, points);
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].points.len(), 1);
        assert_eq!(attached[0].points[0].point, "beta");
        let second: Vec<&str> = attached[1].points.iter().map(|p| p.point.as_str()).collect();
        assert_eq!(second, vec!["alpha", "gamma"]);
    }
}
