//! Degree tracks: named bundles of catalog courses with objectives.
//!
//! - **`models`**: row types for degrees, tracks, objectives and points.
//! - **`store`**: queries backing the public track pages and admin editing.
//! - **`sync`**: copies course catalog metadata into degrees. The catalog
//!   update path calls it explicitly inside its own transaction.

pub mod models;
pub mod store;
pub mod sync;

pub use models::{
    CourseObjective, Degree, DegreeTrack, DegreeTrackDetail, ObjectivePoint,
    ObjectiveWithPoints,
};
pub use sync::{SyncError, SyncOutcome, sync_course_removed, sync_course_saved};
