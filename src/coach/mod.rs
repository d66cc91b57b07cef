//! Coach reporting: dashboards and grade reports scoped to the coach's school.

pub mod grades;
pub mod guard;
pub mod reports;

pub use grades::{GradeBook, GradeError, GradeSummary};
pub use guard::CoachContext;
pub use reports::{CourseReport, Dashboard, StudentProgress};
