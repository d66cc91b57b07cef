//! Shared helper functions for Rocket route handlers.

use crate::course_key::CourseKey;
use crate::error::ApiError;

/// Parse a course key path segment, mapping failures to `400 Bad Request`.
pub fn parse_course_key(raw: &str) -> Result<CourseKey, ApiError> {
    CourseKey::parse(raw).map_err(|err| ApiError::BadRequest(err.to_string()))
}

/// Normalize an optional `?search=` term: blank means no filter.
pub fn search_term(search: &Option<String>) -> Option<&str> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_terms_are_ignored() {
        assert_eq!(search_term(&None), None);
        assert_eq!(search_term(&Some("   ".into())), None);
        assert_eq!(search_term(&Some(" high ".into())), Some("high"));
    }

    #[test]
    fn invalid_course_keys_are_bad_requests() {
        assert!(matches!(
            parse_course_key("not-a-key"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(parse_course_key("course-v1:Org+Num+Run").is_ok());
    }
}
