//! Read side of the grading engine.
//!
//! Grades are computed elsewhere and persisted per course and per subsection.
//! [`GradeBook`] turns those rows into the summaries shown to coaches.

use rocket_db_pools::sqlx::{self, FromRow, PgConnection};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CourseOverview;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One graded subsection in a course grade summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionBreakdown {
    pub chapter: String,
    pub label: String,
    pub category: Option<String>,
    pub percent: f64,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GradeSummary {
    pub percent: f64,
    /// Letter grade reached, `None` when below every cutoff.
    pub grade: Option<String>,
    pub passed: bool,
    pub section_breakdown: Vec<SectionBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubsectionGrade {
    pub display_name: String,
    pub format: Option<String>,
    pub graded: bool,
    pub earned: f64,
    pub possible: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChapterGrade {
    pub display_name: String,
    pub sections: Vec<SubsectionGrade>,
}

#[derive(Debug, Clone, FromRow)]
struct CourseGradeRow {
    percent_grade: f64,
    letter_grade: String,
}

#[derive(Debug, Clone, FromRow)]
struct SubsectionGradeRow {
    chapter_position: i32,
    chapter_name: String,
    subsection_name: String,
    format: Option<String>,
    graded: bool,
    earned_graded: f64,
    possible_graded: f64,
}

/// Reads grades persisted by the grading engine for one course at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct GradeBook;

impl GradeBook {
    pub fn new() -> Self {
        Self
    }

    /// Course grade summary for a student. Students without a persisted grade
    /// read as zero with no letter grade.
    pub async fn summary(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        course: &CourseOverview,
    ) -> Result<GradeSummary, GradeError> {
        let grade = sqlx::query_as::<_, CourseGradeRow>(
            r#"SELECT percent_grade, letter_grade
               FROM persistent_course_grades
               WHERE user_id = $1 AND course_id = $2"#,
        )
        .bind(user_id)
        .bind(&course.id)
        .fetch_optional(&mut *conn)
        .await?;

        let subsections = self.subsection_rows(conn, user_id, &course.id).await?;
        Ok(build_summary(course, grade, &subsections))
    }

    /// Chapter-by-chapter courseware summary in course order.
    pub async fn chapter_grades(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        course_id: &str,
    ) -> Result<Vec<ChapterGrade>, GradeError> {
        let rows = self.subsection_rows(conn, user_id, course_id).await?;
        Ok(group_chapters(rows))
    }

    async fn subsection_rows(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        course_id: &str,
    ) -> Result<Vec<SubsectionGradeRow>, sqlx::Error> {
        sqlx::query_as::<_, SubsectionGradeRow>(
            r#"SELECT chapter_position, chapter_name, subsection_name, format, graded,
                      earned_graded, possible_graded
               FROM persistent_subsection_grades
               WHERE user_id = $1 AND course_id = $2
               ORDER BY chapter_position ASC, subsection_position ASC, id ASC"#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(conn)
        .await
    }
}

fn build_summary(
    course: &CourseOverview,
    grade: Option<CourseGradeRow>,
    subsections: &[SubsectionGradeRow],
) -> GradeSummary {
    let percent = grade.as_ref().map(|g| g.percent_grade).unwrap_or(0.0);
    let letter = grade
        .map(|g| g.letter_grade)
        .filter(|letter| !letter.is_empty())
        .or_else(|| letter_for(course, percent));
    let passed = course
        .grade_cutoffs
        .values()
        .copied()
        .reduce(f64::min)
        .is_some_and(|lowest| percent >= lowest);

    let section_breakdown = subsections
        .iter()
        .filter(|row| row.graded)
        .map(|row| {
            let percent = fraction(row.earned_graded, row.possible_graded);
            SectionBreakdown {
                chapter: row.chapter_name.clone(),
                label: row.subsection_name.clone(),
                category: row.format.clone(),
                percent,
                detail: format!(
                    "{} = {:.0}% ({}/{})",
                    row.subsection_name,
                    percent * 100.0,
                    row.earned_graded,
                    row.possible_graded
                ),
            }
        })
        .collect();

    GradeSummary {
        percent,
        grade: letter,
        passed,
        section_breakdown,
    }
}

/// Highest letter whose cutoff the percentage reaches.
fn letter_for(course: &CourseOverview, percent: f64) -> Option<String> {
    course
        .ordered_grades()
        .into_iter()
        .find(|(_, cutoff)| percent >= *cutoff)
        .map(|(letter, _)| letter)
}

fn fraction(earned: f64, possible: f64) -> f64 {
    if possible > 0.0 { earned / possible } else { 0.0 }
}

fn group_chapters(rows: Vec<SubsectionGradeRow>) -> Vec<ChapterGrade> {
    let mut chapters: Vec<ChapterGrade> = Vec::new();
    let mut current_position = None;

    for row in rows {
        if current_position != Some(row.chapter_position) {
            current_position = Some(row.chapter_position);
            chapters.push(ChapterGrade {
                display_name: row.chapter_name.clone(),
                sections: Vec::new(),
            });
        }
        if let Some(chapter) = chapters.last_mut() {
            chapter.sections.push(SubsectionGrade {
                display_name: row.subsection_name,
                format: row.format,
                graded: row.graded,
                earned: row.earned_graded,
                possible: row.possible_graded,
            });
        }
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn course() -> CourseOverview {
        CourseOverview {
            id: "course-v1:Org+Bio+2024".into(),
            display_name: "Biology".into(),
            course_image_url: String::new(),
            short_description: None,
            grade_cutoffs: BTreeMap::from([("A".to_string(), 0.9), ("B".to_string(), 0.6)]),
        }
    }

    fn subsection(chapter: i32, name: &str, graded: bool, earned: f64) -> SubsectionGradeRow {
        SubsectionGradeRow {
            chapter_position: chapter,
            chapter_name: format!("Chapter {chapter}"),
            subsection_name: name.into(),
            format: graded.then(|| "Homework".to_string()),
            graded,
            earned_graded: earned,
            possible_graded: 4.0,
        }
    }

    #[test]
    fn missing_grade_reads_as_zero() {
        let summary = build_summary(&course(), None, &[]);
        assert_eq!(summary.percent, 0.0);
        assert_eq!(summary.grade, None);
        assert!(!summary.passed);
        assert!(summary.section_breakdown.is_empty());
    }

    #[test]
    fn derives_letter_when_engine_left_it_blank() {
        let grade = CourseGradeRow {
            percent_grade: 0.75,
            letter_grade: String::new(),
        };
        let summary = build_summary(&course(), Some(grade), &[]);
        assert_eq!(summary.grade.as_deref(), Some("B"));
        assert!(summary.passed);
    }

    #[test]
    fn breakdown_only_lists_graded_subsections() {
        let rows = vec![
            subsection(1, "Quiz 1", true, 3.0),
            subsection(1, "Reading", false, 0.0),
        ];
        let summary = build_summary(&course(), None, &rows);
        assert_eq!(summary.section_breakdown.len(), 1);
        assert_eq!(summary.section_breakdown[0].percent, 0.75);
        assert_eq!(summary.section_breakdown[0].detail, "Quiz 1 = 75% (3/4)");
    }

    #[test]
    fn groups_subsections_by_chapter_in_order() {
        let rows = vec![
            subsection(1, "Intro", false, 0.0),
            subsection(1, "Quiz 1", true, 4.0),
            subsection(2, "Quiz 2", true, 2.0),
        ];
        let chapters = group_chapters(rows);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].display_name, "Chapter 1");
        assert_eq!(chapters[0].sections.len(), 2);
        assert_eq!(chapters[1].sections[0].display_name, "Quiz 2");
        assert_eq!(chapters[1].sections[0].earned, 2.0);
    }
}
