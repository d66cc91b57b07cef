//! Course catalog overviews.
//!
//! The course content store owns these rows; this service writes them only
//! through the catalog update path, which also keeps degrees in sync.

use std::collections::BTreeMap;

use rocket_db_pools::sqlx::{self, PgConnection, Row, postgres::PgRow, types::Json};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::course_key::CourseKey;
use crate::degree_track::{SyncError, SyncOutcome, sync_course_removed, sync_course_saved};

/// Catalog entry owned by the course content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CourseOverview {
    pub id: String,
    pub display_name: String,
    pub course_image_url: String,
    pub short_description: Option<String>,
    /// Letter grade to minimum fraction, e.g. `{"A": 0.9, "Pass": 0.5}`.
    pub grade_cutoffs: BTreeMap<String, f64>,
}

impl CourseOverview {
    /// Grade cutoffs from the highest threshold to the lowest.
    pub fn ordered_grades(&self) -> Vec<(String, f64)> {
        let mut grades: Vec<(String, f64)> = self
            .grade_cutoffs
            .iter()
            .map(|(letter, cutoff)| (letter.clone(), *cutoff))
            .collect();
        grades.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        grades
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let Json(grade_cutoffs): Json<BTreeMap<String, f64>> = row.try_get("grade_cutoffs")?;
        Ok(Self {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            course_image_url: row.try_get("course_image_url")?,
            short_description: row.try_get("short_description")?,
            grade_cutoffs,
        })
    }
}

/// Payload published by the content store when a course is saved.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CourseOverviewInput {
    pub display_name: String,
    #[serde(default)]
    pub course_image_url: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default = "default_grade_cutoffs")]
    pub grade_cutoffs: BTreeMap<String, f64>,
}

fn default_grade_cutoffs() -> BTreeMap<String, f64> {
    BTreeMap::from([("Pass".to_string(), 0.5)])
}

impl CourseOverviewInput {
    pub fn into_overview(self, key: &CourseKey) -> Result<CourseOverview, String> {
        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err("display_name must not be empty".to_string());
        }
        if let Some((letter, cutoff)) = self
            .grade_cutoffs
            .iter()
            .find(|(_, cutoff)| !(0.0..=1.0).contains(*cutoff))
        {
            return Err(format!(
                "grade cutoff for '{letter}' must be between 0 and 1, got {cutoff}"
            ));
        }
        Ok(CourseOverview {
            id: key.as_str().to_string(),
            display_name,
            course_image_url: self.course_image_url.trim().to_string(),
            short_description: self
                .short_description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            grade_cutoffs: self.grade_cutoffs,
        })
    }
}

const OVERVIEW_COLUMNS: &str =
    "id, display_name, course_image_url, short_description, grade_cutoffs";

pub async fn find_course(
    conn: &mut PgConnection,
    course_id: &str,
) -> Result<Option<CourseOverview>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {OVERVIEW_COLUMNS} FROM course_overviews WHERE id = $1"
    ))
    .bind(course_id)
    .fetch_optional(conn)
    .await?;

    row.as_ref().map(CourseOverview::from_row).transpose()
}

/// Exact display-name match. When several courses share a name the oldest wins.
pub async fn find_course_by_display_name(
    conn: &mut PgConnection,
    display_name: &str,
) -> Result<Option<CourseOverview>, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"SELECT {OVERVIEW_COLUMNS} FROM course_overviews
           WHERE display_name = $1
           ORDER BY created_at ASC, id ASC
           LIMIT 1"#
    ))
    .bind(display_name)
    .fetch_optional(conn)
    .await?;

    row.as_ref().map(CourseOverview::from_row).transpose()
}

/// Upsert a catalog entry and refresh its degrees. Run inside a transaction.
pub async fn save_course_overview(
    conn: &mut PgConnection,
    overview: &CourseOverview,
) -> Result<SyncOutcome, SyncError> {
    sqlx::query(
        r#"INSERT INTO course_overviews
               (id, display_name, course_image_url, short_description, grade_cutoffs)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (id) DO UPDATE SET
               display_name = EXCLUDED.display_name,
               course_image_url = EXCLUDED.course_image_url,
               short_description = EXCLUDED.short_description,
               grade_cutoffs = EXCLUDED.grade_cutoffs,
               modified_at = NOW()"#,
    )
    .bind(&overview.id)
    .bind(&overview.display_name)
    .bind(&overview.course_image_url)
    .bind(overview.short_description.as_deref())
    .bind(Json(&overview.grade_cutoffs))
    .execute(&mut *conn)
    .await?;

    sync_course_saved(conn, overview).await
}

/// Remove a catalog entry and its degrees. Returns `None` when the course was unknown.
pub async fn delete_course_overview(
    conn: &mut PgConnection,
    course_id: &str,
) -> Result<Option<SyncOutcome>, SyncError> {
    let deleted = sqlx::query("DELETE FROM course_overviews WHERE id = $1")
        .bind(course_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Ok(None);
    }

    sync_course_removed(conn, course_id).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overview(cutoffs: &[(&str, f64)]) -> CourseOverview {
        CourseOverview {
            id: "course-v1:Org+Math+2024".into(),
            display_name: "Math".into(),
            course_image_url: String::new(),
            short_description: None,
            grade_cutoffs: cutoffs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn orders_grades_by_cutoff_descending() {
        let course = overview(&[("C", 0.5), ("A", 0.9), ("B", 0.7)]);
        let letters: Vec<String> = course.ordered_grades().into_iter().map(|(l, _)| l).collect();
        assert_eq!(letters, vec!["A", "B", "C"]);
    }

    #[test]
    fn input_validation_trims_and_checks_cutoffs() {
        let key = CourseKey::parse("course-v1:Org+Math+2024").expect("valid key");
        let input = CourseOverviewInput {
            display_name: "  Algebra ".into(),
            course_image_url: "/img.png".into(),
            short_description: Some("   ".into()),
            grade_cutoffs: default_grade_cutoffs(),
        };
        let course = input.into_overview(&key).expect("valid overview");
        assert_eq!(course.display_name, "Algebra");
        assert_eq!(course.short_description, None);
        assert_eq!(course.grade_cutoffs.get("Pass"), Some(&0.5));

        let bad = CourseOverviewInput {
            display_name: "Algebra".into(),
            course_image_url: String::new(),
            short_description: None,
            grade_cutoffs: BTreeMap::from([("A".to_string(), 1.5)]),
        };
        assert!(bad.into_overview(&key).is_err());
    }
}
