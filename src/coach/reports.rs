//! Enrollment and grade reports for a coach's school.

use std::collections::BTreeMap;

use rocket_db_pools::sqlx::{self, FromRow, PgConnection};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{CourseOverview, find_course};
use crate::coach::grades::{ChapterGrade, GradeBook, GradeError, GradeSummary};
use crate::models::StudentSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct CourseSummary {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Dashboard {
    pub students: Vec<StudentSummary>,
    pub courses: Vec<CourseSummary>,
    /// Active enrollments per course display name.
    pub enrollments: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StudentGrade {
    pub username: String,
    pub id: i32,
    pub email: String,
    pub grade_summary: GradeSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GradeCutoff {
    pub letter: String,
    pub cutoff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CourseReport {
    pub course: CourseOverview,
    pub students: Vec<StudentGrade>,
    pub ordered_grades: Vec<GradeCutoff>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StudentProgress {
    pub student: StudentSummary,
    pub course: CourseOverview,
    pub courseware_summary: Vec<ChapterGrade>,
}

#[derive(Debug, Clone, FromRow)]
struct EnrollmentCount {
    course_id: String,
    display_name: String,
    enrollments: i64,
}

const STUDENT_COLUMNS: &str = r#"u.id, u.username, u.email, p.name, p.level_of_education,
       p.section, p.external_id"#;

/// Students of a school (coaches excluded) with their active enrollments.
pub async fn dashboard(conn: &mut PgConnection, school_id: Uuid) -> Result<Dashboard, sqlx::Error> {
    let students = sqlx::query_as::<_, StudentSummary>(&format!(
        r#"SELECT {STUDENT_COLUMNS}
           FROM users u
           JOIN user_profiles p ON p.user_id = u.id
           WHERE p.school_id = $1 AND NOT p.is_coach
           ORDER BY u.username ASC"#
    ))
    .bind(school_id)
    .fetch_all(&mut *conn)
    .await?;

    let counts = sqlx::query_as::<_, EnrollmentCount>(
        r#"SELECT c.id AS course_id, c.display_name, COUNT(*) AS enrollments
           FROM course_enrollments e
           JOIN course_overviews c ON c.id = e.course_id
           JOIN user_profiles p ON p.user_id = e.user_id
           WHERE e.is_active AND p.school_id = $1 AND NOT p.is_coach
           GROUP BY c.id, c.display_name
           ORDER BY c.display_name ASC, c.id ASC"#,
    )
    .bind(school_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(summarize_enrollments(students, counts))
}

fn summarize_enrollments(students: Vec<StudentSummary>, counts: Vec<EnrollmentCount>) -> Dashboard {
    let mut enrollments: BTreeMap<String, i64> = BTreeMap::new();
    let mut courses = Vec::with_capacity(counts.len());

    for count in counts {
        // Courses sharing a display name are counted together.
        *enrollments.entry(count.display_name.clone()).or_default() += count.enrollments;
        courses.push(CourseSummary {
            id: count.course_id,
            display_name: count.display_name,
        });
    }

    Dashboard {
        students,
        courses,
        enrollments,
    }
}

/// Grade report for one course, limited to the coach's school.
/// Returns `None` when the course is not in the catalog.
pub async fn course_report(
    conn: &mut PgConnection,
    grades: &GradeBook,
    school_id: Uuid,
    course_id: &str,
) -> Result<Option<CourseReport>, GradeError> {
    let Some(course) = find_course(conn, course_id).await? else {
        return Ok(None);
    };

    let enrolled = sqlx::query_as::<_, StudentSummary>(&format!(
        r#"SELECT {STUDENT_COLUMNS}
           FROM users u
           JOIN user_profiles p ON p.user_id = u.id
           JOIN course_enrollments e ON e.user_id = u.id
           WHERE e.course_id = $1 AND e.is_active
             AND p.school_id = $2 AND NOT p.is_coach
           ORDER BY u.username ASC"#
    ))
    .bind(&course.id)
    .bind(school_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut students = Vec::with_capacity(enrolled.len());
    for student in enrolled {
        let grade_summary = grades.summary(conn, student.id, &course).await?;
        students.push(StudentGrade {
            username: student.username,
            id: student.id,
            email: student.email,
            grade_summary,
        });
    }

    let ordered_grades = course
        .ordered_grades()
        .into_iter()
        .map(|(letter, cutoff)| GradeCutoff { letter, cutoff })
        .collect();

    Ok(Some(CourseReport {
        course,
        students,
        ordered_grades,
    }))
}

/// Courseware progress of one student. `None` when the course is unknown or
/// the student is not a learner of the coach's school.
pub async fn student_progress(
    conn: &mut PgConnection,
    grades: &GradeBook,
    school_id: Uuid,
    course_id: &str,
    student_id: i32,
) -> Result<Option<StudentProgress>, GradeError> {
    let student = sqlx::query_as::<_, StudentSummary>(&format!(
        r#"SELECT {STUDENT_COLUMNS}
           FROM users u
           JOIN user_profiles p ON p.user_id = u.id
           WHERE u.id = $1 AND p.school_id = $2 AND NOT p.is_coach"#
    ))
    .bind(student_id)
    .bind(school_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(student) = student else {
        return Ok(None);
    };
    let Some(course) = find_course(conn, course_id).await? else {
        return Ok(None);
    };

    let courseware_summary = grades.chapter_grades(conn, student.id, &course.id).await?;
    Ok(Some(StudentProgress {
        student,
        course,
        courseware_summary,
    }))
}
