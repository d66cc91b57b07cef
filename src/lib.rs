#[macro_use]
extern crate rocket;

pub mod auth;
pub mod catalog;
pub mod coach;
pub mod course_key;
pub mod db;
pub mod degree_track;
pub mod error;
pub mod import;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod school;

use crate::auth::AuthState;
use crate::db::CoachDb;
use crate::import::ImportConfig;
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket, Route};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Every route served under `/api/v1`, including the generated `openapi.json`.
pub fn api_routes() -> Vec<Route> {
    let mut api = openapi_get_routes![
        routes::health::health_check,
        routes::health::readiness,
        routes::schools::list_schools,
        routes::schools::create_school,
        routes::schools::delete_school,
        routes::catalog::get_course,
        routes::catalog::save_course,
        routes::catalog::delete_course,
        routes::tracks::track_list,
        routes::tracks::about_track,
        routes::tracks::create_track,
        routes::tracks::update_track,
        routes::tracks::delete_track,
        routes::tracks::list_degrees,
        routes::tracks::list_objectives,
        routes::tracks::create_objective,
        routes::tracks::update_objective,
        routes::tracks::delete_objective,
        routes::coach::dashboard,
        routes::coach::reports,
        routes::coach::student_progress,
    ];
    // Raw upload body, kept out of the generated document.
    api.extend(routes![routes::import::import_users]);
    api
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(CoachDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match CoachDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        match db::run_migrations(&pool).await {
                            Ok(_) => {
                                log::info!("database migrations successful");
                                Ok(rocket)
                            }
                            Err(e) => {
                                log::error!("database migrations failed: {}", e);
                                Err(rocket)
                            }
                        }
                    }
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite("Manage DB Pool", |rocket| async move {
            match CoachDb::fetch(&rocket) {
                Some(db) => {
                    let pool = (**db).clone();
                    Ok(rocket.manage(pool))
                }
                None => Err(rocket),
            }
        }))
        .attach(AdHoc::try_on_ignite(
            "Auth Configuration",
            |rocket| async move {
                match AuthState::from_env() {
                    Ok(state) => {
                        log::info!(
                            "accepting access tokens from issuer {} for audience {}",
                            state.config.issuer,
                            state.config.audience
                        );
                        Ok(rocket.manage(state))
                    }
                    Err(err) => {
                        log::error!("auth configuration failed: {}", err);
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::on_ignite("Import Configuration", |rocket| async move {
            let config = ImportConfig::from_env();
            log::info!("bulk import uploads capped at {} bytes", config.max_bytes);
            rocket.manage(config)
        }))
        .mount("/api/v1", api_routes())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Coach API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::http::Header;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};
    use uuid::Uuid;

    use crate::auth::{AuthConfig, AuthState, JwtService, PasswordService, Role};
    use crate::import::ImportConfig;
    use crate::models::{User, UserProfile};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Provision a test database, or report why the calling test is skipped.
    /// Migration failures are bugs and panic.
    pub async fn database_or_skip(test: &str) -> Option<TestDatabase> {
        match TestDatabase::new_from_env().await {
            Ok(db) => Some(db),
            Err(TestDatabaseError::Migration(err)) => panic!("migrations failed: {err}"),
            Err(err) => {
                eprintln!("skipping {test}: no test database available ({err})");
                None
            }
        }
    }

    /// Auth state with a fixed secret and cheap Argon2 parameters.
    pub fn test_auth_state() -> AuthState {
        let config = AuthConfig {
            issuer: "http://localhost".into(),
            audience: "coach-api".into(),
            access_token_ttl_secs: 900,
            jwt_secret: "integration-test-secret".into(),
            jwt_kid: None,
        };
        let jwt = JwtService::from_config(&config).expect("jwt service");
        let passwords = PasswordService::with_cost(64, 1).expect("password service");
        AuthState::new(config, passwords, jwt)
    }

    /// `Authorization` header carrying a freshly minted access token.
    pub fn bearer(auth: &AuthState, user_id: i32, username: &str, role: Role) -> Header<'static> {
        let token = auth
            .jwt_service
            .issue_access_token(user_id, username, role)
            .expect("token issued");
        Header::new("Authorization", format!("Bearer {}", token.token))
    }

    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        pub async fn insert_user(
            &self,
            username: &str,
            role: Role,
            password_hash: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(username)
            .bind(format!("{username}@example.com"))
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await
        }

        pub async fn insert_profile(
            &self,
            user_id: i32,
            name: &str,
            is_coach: bool,
            school_id: Option<Uuid>,
        ) -> Result<(), sqlx::Error> {
            sqlx::query(
                "INSERT INTO user_profiles (user_id, name, is_coach, school_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(name)
            .bind(is_coach)
            .bind(school_id)
            .execute(self.pool)
            .await?;
            Ok(())
        }

        pub async fn insert_course(&self, id: &str, display_name: &str) -> Result<(), sqlx::Error> {
            sqlx::query(
                r#"INSERT INTO course_overviews (id, display_name, grade_cutoffs)
                   VALUES ($1, $2, '{"A": 0.9, "B": 0.8, "Pass": 0.5}'::jsonb)"#,
            )
            .bind(id)
            .bind(display_name)
            .execute(self.pool)
            .await?;
            Ok(())
        }

        pub async fn enroll(&self, user_id: i32, course_id: &str) -> Result<(), sqlx::Error> {
            sqlx::query("INSERT INTO course_enrollments (user_id, course_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(course_id)
                .execute(self.pool)
                .await?;
            Ok(())
        }

        pub async fn insert_course_grade(
            &self,
            user_id: i32,
            course_id: &str,
            percent: f64,
            letter: &str,
        ) -> Result<(), sqlx::Error> {
            sqlx::query(
                "INSERT INTO persistent_course_grades (user_id, course_id, percent_grade, letter_grade) VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(course_id)
            .bind(percent)
            .bind(letter)
            .execute(self.pool)
            .await?;
            Ok(())
        }

        #[allow(clippy::too_many_arguments)]
        pub async fn insert_subsection_grade(
            &self,
            user_id: i32,
            course_id: &str,
            chapter: (i32, &str),
            subsection: (i32, &str),
            format: Option<&str>,
            earned: f64,
            possible: f64,
        ) -> Result<(), sqlx::Error> {
            sqlx::query(
                r#"INSERT INTO persistent_subsection_grades
                   (user_id, course_id, chapter_position, chapter_name, subsection_position,
                    subsection_name, format, graded, earned_graded, possible_graded)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
            )
            .bind(user_id)
            .bind(course_id)
            .bind(chapter.0)
            .bind(chapter.1)
            .bind(subsection.0)
            .bind(subsection.1)
            .bind(format)
            .bind(format.is_some())
            .bind(earned)
            .bind(possible)
            .execute(self.pool)
            .await?;
            Ok(())
        }

        pub async fn fetch_user(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
            sqlx::query_as::<_, User>(
                r#"SELECT id, username, email, first_name, last_name, role, is_active, date_joined
                   FROM users WHERE username = $1"#,
            )
            .bind(username)
            .fetch_optional(self.pool)
            .await
        }

        pub async fn fetch_profile(&self, user_id: i32) -> Result<Option<UserProfile>, sqlx::Error> {
            sqlx::query_as::<_, UserProfile>(
                r#"SELECT id, user_id, name, is_coach, school_id, level_of_education, section,
                          external_id, city, region, country
                   FROM user_profiles WHERE user_id = $1"#,
            )
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
        }

        pub async fn count(&self, table: &str) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(self.pool)
                .await
        }
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{GenericImage, ImageExt, core::WaitFor};
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<GenericImage>>,
        }

        impl TestDatabase {
            /// Provision a fresh database on the server named by
            /// `TEST_DATABASE_URL`, or in a disposable Postgres container when
            /// the variable is unset.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                match std::env::var("TEST_DATABASE_URL") {
                    Ok(url) if !url.trim().is_empty() => Self::with_base_url(&url, None).await,
                    _ => Self::new().await,
                }
            }

            /// Provision a fresh database in a disposable Postgres container.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let image = GenericImage::new("postgres", "16-alpine").with_wait_for(
                    WaitFor::message_on_stderr("database system is ready to accept connections"),
                );

                let request = image
                    .with_env_var("POSTGRES_DB", "postgres")
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres");

                let container = request.start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let admin_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                Self::with_base_url(&admin_url, Some(container)).await
            }

            async fn with_base_url(
                base_url: &str,
                container: Option<ContainerAsync<GenericImage>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions =
                    base_url.parse().map_err(TestDatabaseError::Sqlx)?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let base_name = base_options
                    .get_database()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "postgres".to_string());

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                let new_db_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", new_db_name);
                sqlx::query(&create_sql)
                    .execute(&admin_pool)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.clone().database(&new_db_name))
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name: new_db_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            pub fn migrator() -> &'static sqlx::migrate::Migrator {
                &MIGRATOR
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database_with_fallback(self.admin_options.clone(), &self.database_name)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }

        async fn drop_database_with_fallback(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_force = format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name);
            match sqlx::query(&drop_force).execute(&admin_pool).await {
                Ok(_) => Ok(()),
                Err(err) if force_drop_unsupported(&err) => {
                    let drop_sql = format!("DROP DATABASE \"{}\"", database_name);
                    sqlx::query(&drop_sql).execute(&admin_pool).await?;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }

        fn force_drop_unsupported(err: &sqlx::Error) -> bool {
            matches!(
                err,
                sqlx::Error::Database(db_err)
                    if db_err
                        .code()
                        .map(|code| code == "42601" || code == "0A000")
                        .unwrap_or(false)
            )
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database_with_fallback(admin_options, &db_name).await;
                        });
                    } else {
                        std::thread::spawn(move || {
                            if let Ok(rt) = tokio::runtime::Runtime::new() {
                                rt.block_on(async move {
                                    pool.close().await;
                                    let _ =
                                        drop_database_with_fallback(admin_options, &db_name).await;
                                });
                            }
                        });
                    }
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        auth: Option<AuthState>,
        import_config: Option<ImportConfig>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Default::default()
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        pub fn manage_auth(mut self, auth: AuthState) -> Self {
            self.auth = Some(auth);
            self
        }

        pub fn manage_import_config(mut self, config: ImportConfig) -> Self {
            self.import_config = Some(config);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }
            if let Some(auth) = self.auth {
                rocket = rocket.manage(auth);
            }
            rocket = rocket.manage(self.import_config.unwrap_or_default());

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
