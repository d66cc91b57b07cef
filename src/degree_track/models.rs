use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog course as it appears inside degree tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct Degree {
    pub id: i32,
    pub course_id: String,
    pub name: String,
    pub image_url: String,
    pub short_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct DegreeTrack {
    pub id: Uuid,
    pub name: String,
    pub short_description: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DegreeTrackDetail {
    #[serde(flatten)]
    pub track: DegreeTrack,
    pub courses: Vec<Degree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct CourseObjective {
    pub id: i32,
    pub degree_id: i32,
    pub title: String,
    pub number: i32,
}

impl CourseObjective {
    /// Admin label, e.g. `Intro to Biology - 2`.
    pub fn label(&self, degree: &Degree) -> String {
        format!("{} - {}", degree.name, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, JsonSchema)]
pub struct ObjectivePoint {
    pub id: i32,
    pub objective_id: i32,
    pub point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectiveWithPoints {
    #[serde(flatten)]
    pub objective: CourseObjective,
    pub points: Vec<ObjectivePoint>,
}
