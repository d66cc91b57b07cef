//! School lookup table.
//!
//! Schools are keyed by name. Creation always goes through
//! [`get_or_create_school`], which relies on the `schools_name_key` unique
//! constraint so that concurrent imports naming the same new school converge
//! on a single row.

use rocket_db_pools::sqlx::{self, FromRow, PgConnection};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_SCHOOL_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct School {
    pub id: Uuid,
    pub name: String,
}

impl std::fmt::Display for School {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validate a school name, returning the trimmed value.
pub fn normalize_school_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("School name must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_SCHOOL_NAME_LEN {
        return Err(format!(
            "School name must be at most {MAX_SCHOOL_NAME_LEN} characters"
        ));
    }
    Ok(trimmed)
}

/// Look up a school by name, inserting it when absent.
///
/// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on conflict,
/// so lookup and insert are a single atomic statement.
pub async fn get_or_create_school(
    conn: &mut PgConnection,
    name: &str,
) -> Result<School, sqlx::Error> {
    sqlx::query_as::<_, School>(
        r#"INSERT INTO schools (id, name)
           VALUES ($1, $2)
           ON CONFLICT ON CONSTRAINT schools_name_key
           DO UPDATE SET name = EXCLUDED.name
           RETURNING id, name"#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(conn)
    .await
}

/// All schools ordered by name, optionally filtered by a case-insensitive substring.
pub async fn list_schools(
    conn: &mut PgConnection,
    search: Option<&str>,
) -> Result<Vec<School>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", escape_like(term)));

    sqlx::query_as::<_, School>(
        r#"SELECT id, name FROM schools
           WHERE $1::text IS NULL OR name ILIKE $1
           ORDER BY name ASC"#,
    )
    .bind(pattern)
    .fetch_all(conn)
    .await
}

/// Delete a school. Profiles referencing it keep their user but lose the school.
pub async fn delete_school(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM schools WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
