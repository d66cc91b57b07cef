//! CSV bulk import of user accounts with profiles, schools and enrollments.

pub mod config;
pub mod countries;
pub mod error;
pub mod importer;
pub mod row;

pub use config::ImportConfig;
pub use error::{ImportError, RowError};
pub use importer::{ImportCaller, ImportReport, UserImporter};
