//! Opaque course identifiers in the `course-v1:Org+Course+Run` form.

use regex::Regex;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_COURSE_KEY_LEN: usize = 255;

static COURSE_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^course-v1:([\w\-~.:]+)\+([\w\-~.:]+)\+([\w\-~.:]+)$")
        .unwrap_or_else(|err| panic!("course key pattern is valid: {err}"))
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CourseKeyError {
    #[error("invalid course key '{0}'")]
    Invalid(String),
    #[error("course key exceeds {MAX_COURSE_KEY_LEN} characters")]
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CourseKey(String);

impl CourseKey {
    pub fn parse(raw: &str) -> Result<Self, CourseKeyError> {
        let raw = raw.trim();
        if raw.len() > MAX_COURSE_KEY_LEN {
            return Err(CourseKeyError::TooLong);
        }
        if !COURSE_KEY_PATTERN.is_match(raw) {
            return Err(CourseKeyError::Invalid(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The organization, course number and run components.
    pub fn parts(&self) -> (&str, &str, &str) {
        let body = self.0.trim_start_matches("course-v1:");
        let mut parts = body.splitn(3, '+');
        (
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
        )
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CourseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
