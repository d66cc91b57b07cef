//! CSV bulk user import.
//!
//! The request guard rejects non-admin callers before the body is read. The
//! body is the raw file, capped at `ImportConfig::max_bytes`.

use rocket::State;
use rocket::data::Data;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;

use crate::auth::{AuthState, RequireAdmin};
use crate::error::ApiError;
use crate::import::{ImportCaller, ImportConfig, ImportReport, UserImporter};

#[post("/admin/users/import", data = "<upload>")]
pub async fn import_users(
    admin: RequireAdmin,
    upload: Data<'_>,
    pool: &State<sqlx::PgPool>,
    auth: &State<AuthState>,
    config: &State<ImportConfig>,
) -> Result<Json<ImportReport>, ApiError> {
    let capped = upload
        .open(config.limit())
        .into_bytes()
        .await
        .map_err(|err| ApiError::BadRequest(format!("Could not read upload: {err}")))?;

    if !capped.is_complete() {
        return Err(ApiError::PayloadTooLarge(format!(
            "Upload exceeds the {} limit",
            config.limit()
        )));
    }

    let caller = ImportCaller::from(&admin.0);
    let importer = UserImporter::new(pool.inner(), &auth.password_service);
    let report = importer.import_bytes(&caller, capped.into_inner()).await?;

    log::info!(
        "user {} imported {} row(s) with {} error(s)",
        admin.0.username,
        report.imported,
        report.error.len()
    );
    Ok(Json(report))
}
