use rocket_db_pools::sqlx::{self, PgPool, migrate::Migrator};
use rocket_db_pools::Database;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Database)]
#[database("coach_db")]
pub struct CoachDb(sqlx::PgPool);

/// Apply pending migrations. Already-applied migrations are skipped, and a
/// checksum mismatch aborts startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}
