use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use coach_api::auth::{AuthConfig, JwtService, PasswordService, Role};

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create a local account for the coach service")]
struct Args {
    /// Unique username for the account.
    #[arg(long)]
    username: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    #[arg(long, default_value = "")]
    email: String,

    /// Role to assign (`user` or `admin`).
    #[arg(long, default_value = "user")]
    role: String,

    /// Print an access token for the new account. Needs `COACH_JWT_SECRET`.
    #[arg(long)]
    print_token: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let username = args.username.trim().to_string();

    if username.is_empty() || username.chars().count() > 150 {
        writeln!(io::stderr(), "error: username must be 1 to 150 characters")?;
        std::process::exit(1);
    }

    let role = match args.role.trim().to_lowercase().as_str() {
        "admin" => Role::Admin,
        "user" => Role::User,
        other => {
            writeln!(
                io::stderr(),
                "error: unsupported role '{other}'. Use 'user' or 'admin'."
            )?;
            std::process::exit(1);
        }
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&username)
        .fetch_one(&mut *tx)
        .await?;

    if existing > 0 {
        writeln!(
            io::stderr(),
            "error: a user named '{username}' already exists."
        )?;
        std::process::exit(1);
    }

    let password_hash = PasswordService::new()?.hash_password(&args.password)?;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&username)
    .bind(args.email.trim())
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    println!("Created {} user '{username}' with id {user_id}", role.as_str());

    if args.print_token {
        let config = AuthConfig::from_env()?;
        let token = JwtService::from_config(&config)?.issue_access_token(user_id, &username, role)?;
        println!("{}", token.token);
    }
    Ok(())
}
