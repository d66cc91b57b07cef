//! Keeps degrees aligned with the course catalog.
//!
//! Both functions run on the caller's connection so the catalog write and
//! the degree update commit or roll back together.

use rocket_db_pools::sqlx::{self, PgConnection};
use thiserror::Error;

use crate::catalog::CourseOverview;

const MAX_DEGREE_FIELD_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No degree existed for the course; one was created.
    Created,
    /// Existing degrees for the course were refreshed.
    Updated(u64),
    /// Degrees for a removed course were deleted.
    Removed(u64),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Copy display name, image and description from a saved catalog entry into
/// its degrees, creating the degree when the course is new.
pub async fn sync_course_saved(
    conn: &mut PgConnection,
    overview: &CourseOverview,
) -> Result<SyncOutcome, SyncError> {
    let name = truncate_chars(&overview.display_name, MAX_DEGREE_FIELD_LEN);
    let image_url = truncate_chars(&overview.course_image_url, MAX_DEGREE_FIELD_LEN);

    let updated = sqlx::query(
        r#"UPDATE degrees
           SET name = $2, image_url = $3, short_description = $4
           WHERE course_id = $1"#,
    )
    .bind(&overview.id)
    .bind(name)
    .bind(image_url)
    .bind(overview.short_description.as_deref())
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated > 0 {
        log::debug!("refreshed {} degree(s) for {}", updated, overview.id);
        return Ok(SyncOutcome::Updated(updated));
    }

    sqlx::query(
        r#"INSERT INTO degrees (course_id, name, image_url, short_description)
           VALUES ($1, $2, $3, $4)"#,
    )
    .bind(&overview.id)
    .bind(name)
    .bind(image_url)
    .bind(overview.short_description.as_deref())
    .execute(&mut *conn)
    .await?;

    log::info!("created degree for course {}", overview.id);
    Ok(SyncOutcome::Created)
}

/// Delete every degree for a course removed from the catalog. Objectives,
/// points and track memberships cascade.
pub async fn sync_course_removed(
    conn: &mut PgConnection,
    course_id: &str,
) -> Result<SyncOutcome, SyncError> {
    let removed = sqlx::query("DELETE FROM degrees WHERE course_id = $1")
        .bind(course_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if removed > 0 {
        log::info!("removed {} degree(s) for course {}", removed, course_id);
    }
    Ok(SyncOutcome::Removed(removed))
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 255), "short");
    }
}
