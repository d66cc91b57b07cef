use csv::StringRecord;

use crate::import::error::RowError;

pub const FIELD_COUNT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    Student,
    Coach,
}

impl RowRole {
    /// `student` marks a learner; any other marker makes the user a coach.
    pub fn from_marker(marker: &str) -> Self {
        if marker == "student" {
            RowRole::Student
        } else {
            RowRole::Coach
        }
    }

    pub fn is_coach(&self) -> bool {
        matches!(self, RowRole::Coach)
    }
}

/// One line of the user import file, by column position:
///
/// `username, display name, first name, last name, email, password, role,
/// school, level, section, external id, course, city, region, country`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub username: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: RowRole,
    pub school: String,
    pub level: Option<String>,
    pub section: Option<String>,
    pub external_id: Option<String>,
    pub course: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: String,
}

impl UserRow {
    pub fn from_record(record: &StringRecord) -> Result<Self, RowError> {
        if record.len() != FIELD_COUNT {
            return Err(RowError::FieldCount {
                expected: FIELD_COUNT,
                found: record.len(),
            });
        }

        let field = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();
        let optional = |idx: usize| Some(field(idx)).filter(|value| !value.is_empty());
        let required = |idx: usize, name: &'static str| {
            Some(field(idx))
                .filter(|value| !value.is_empty())
                .ok_or(RowError::MissingField(name))
        };

        Ok(Self {
            username: required(0, "username")?,
            display_name: field(1),
            first_name: field(2),
            last_name: field(3),
            email: field(4),
            password: required(5, "password")?,
            role: RowRole::from_marker(&field(6)),
            school: required(7, "school")?,
            level: optional(8),
            section: optional(9),
            external_id: optional(10),
            course: optional(11),
            city: optional(12),
            region: optional(13),
            country: field(14),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> StringRecord {
        StringRecord::from(line.split(',').collect::<Vec<_>>())
    }

    const VALID: &str = "jdoe,John Doe,John,Doe,jdoe@example.com,secret,student,\
                         Riverside High,5,B,S-100,Algebra I,Lahore,Punjab,Pakistan";

    #[test]
    fn maps_positions_to_named_fields() {
        let row = UserRow::from_record(&record(VALID)).expect("valid row");
        assert_eq!(row.username, "jdoe");
        assert_eq!(row.display_name, "John Doe");
        assert_eq!(row.email, "jdoe@example.com");
        assert_eq!(row.role, RowRole::Student);
        assert_eq!(row.school, "Riverside High");
        assert_eq!(row.external_id.as_deref(), Some("S-100"));
        assert_eq!(row.course.as_deref(), Some("Algebra I"));
        assert_eq!(row.country, "Pakistan");
    }

    #[test]
    fn any_other_role_marker_is_a_coach() {
        assert_eq!(RowRole::from_marker("coach"), RowRole::Coach);
        assert_eq!(RowRole::from_marker("Student"), RowRole::Coach);
        assert!(!RowRole::from_marker("student").is_coach());
    }

    #[test]
    fn rejects_wrong_field_counts() {
        let short = record("jdoe,John Doe,John");
        assert!(matches!(
            UserRow::from_record(&short),
            Err(RowError::FieldCount { expected: 15, found: 3 })
        ));
        let long = record(&format!("{VALID},extra"));
        assert!(matches!(
            UserRow::from_record(&long),
            Err(RowError::FieldCount { found: 16, .. })
        ));
    }

    #[test]
    fn empty_optional_fields_become_none() {
        let line = "jdoe,,,,,secret,coach,Riverside High,,,,,,,Pakistan";
        let row = UserRow::from_record(&record(line)).expect("valid row");
        assert_eq!(row.role, RowRole::Coach);
        assert_eq!(row.level, None);
        assert_eq!(row.course, None);
        assert_eq!(row.display_name, "");
    }

    #[test]
    fn requires_username_password_and_school() {
        let line = " ,,,,,secret,student,Riverside High,,,,,,,Pakistan";
        assert!(matches!(
            UserRow::from_record(&record(line)),
            Err(RowError::MissingField("username"))
        ));
        let line = "jdoe,,,,,secret,student,,,,,,,,Pakistan";
        assert!(matches!(
            UserRow::from_record(&record(line)),
            Err(RowError::MissingField("school"))
        ));
    }
}
