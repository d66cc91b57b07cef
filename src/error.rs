use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;
use std::io::Cursor;

use crate::coach::GradeError;
use crate::degree_track::SyncError;
use crate::degree_track::store::TrackError;
use crate::import::ImportError;

#[derive(Debug)]
pub enum ApiError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    PayloadTooLarge(String),
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let (status, error_type, message) = match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error: {}", e);
                (Status::InternalServerError, "DatabaseError", e.to_string())
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                (Status::NotFound, "NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                (Status::BadRequest, "BadRequest", msg)
            }
            ApiError::Forbidden(msg) => {
                log::debug!("forbidden: {}", msg);
                (Status::Forbidden, "Forbidden", msg)
            }
            ApiError::PayloadTooLarge(msg) => {
                log::debug!("payload too large: {}", msg);
                (Status::PayloadTooLarge, "PayloadTooLarge", msg)
            }
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                (Status::InternalServerError, "InternalError", msg)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        let json = serde_json::to_string(&error_response).unwrap_or_else(|_| {
            r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(Responses::default())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<TrackError> for ApiError {
    fn from(err: TrackError) -> Self {
        match err {
            TrackError::Invalid(msg) => ApiError::BadRequest(msg),
            TrackError::UnknownDegrees(ids) => {
                ApiError::BadRequest(format!("Unknown degree ids: {ids:?}"))
            }
            TrackError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<GradeError> for ApiError {
    fn from(err: GradeError) -> Self {
        match err {
            GradeError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::AccessDenied => {
                ApiError::Forbidden("Administrator privilege required".to_string())
            }
            ImportError::Decode(e) => {
                ApiError::BadRequest(format!("Upload is not valid UTF-8 text: {e}"))
            }
            ImportError::Database(e) => ApiError::DatabaseError(e),
            aborted @ ImportError::Aborted { .. } => ApiError::InternalError(aborted.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(sqlx::Error::PoolClosed),
            ApiError::DatabaseError(_)
        ));
    }

    #[test]
    fn import_access_denied_is_forbidden() {
        assert!(matches!(
            ApiError::from(ImportError::AccessDenied),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn track_validation_errors_are_bad_requests() {
        assert!(matches!(
            ApiError::from(TrackError::UnknownDegrees(vec![4, 9])),
            ApiError::BadRequest(msg) if msg.contains("[4, 9]")
        ));
        assert!(matches!(
            ApiError::from(TrackError::Invalid("name is required".into())),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn aborted_import_is_internal_error() {
        let err = ImportError::Aborted {
            line: 7,
            source: crate::import::RowError::Database(sqlx::Error::PoolClosed),
        };
        assert!(matches!(
            ApiError::from(err),
            ApiError::InternalError(msg) if msg.contains("line 7")
        ));
    }
}
