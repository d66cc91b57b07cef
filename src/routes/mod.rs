//! HTTP route handlers grouped by resource domain.
//!
//! Handlers are annotated with `#[openapi]` so `rocket_okapi` can derive the
//! OpenAPI document. The CSV upload takes a raw request body and is mounted
//! as a plain Rocket route.

pub mod catalog;
pub mod coach;
pub mod health;
pub(crate) mod helpers;
pub mod import;
pub mod schools;
pub mod tracks;
