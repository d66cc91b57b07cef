use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use coach_api::auth::PasswordService;
use coach_api::import::{ImportCaller, UserImporter};

#[derive(Parser, Debug)]
#[command(name = "import_users", about = "Bulk import users from a CSV file")]
struct Args {
    /// CSV file with a header row and 15 columns per line.
    file: PathBuf,

    /// Administrator account the import runs as.
    #[arg(long)]
    admin: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let upload = std::fs::read(&args.file)?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let caller = sqlx::query_as::<_, (i32, String)>(
        "SELECT id, role FROM users WHERE username = $1 AND is_active",
    )
    .bind(args.admin.trim())
    .fetch_optional(&pool)
    .await?
    .map(|(user_id, role)| ImportCaller {
        user_id,
        is_admin: role == "admin",
    });

    let Some(caller) = caller else {
        writeln!(io::stderr(), "error: no active user named '{}'", args.admin)?;
        std::process::exit(1);
    };

    let passwords = PasswordService::new()?;
    let report = UserImporter::new(&pool, &passwords)
        .import_bytes(&caller, upload)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_success() {
        std::process::exit(2);
    }
    Ok(())
}
