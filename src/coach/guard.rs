use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_db_pools::sqlx::{self, Row};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use uuid::Uuid;

use crate::auth::guards::bearer_request_input;
use crate::auth::{AuthError, AuthUser};

/// A caller whose profile carries the coach flag and a school.
#[derive(Debug, Clone)]
pub struct CoachContext {
    pub user: AuthUser,
    pub school_id: Uuid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CoachContext {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user = match AuthUser::from_request(request).await {
            Outcome::Success(user) => user,
            Outcome::Error(err) => return Outcome::Error(err),
            Outcome::Forward(_) => {
                return Outcome::Error((Status::Unauthorized, AuthError::Unauthorized));
            }
        };

        match coach_school(request, user.id).await {
            Ok(Some(school_id)) => Outcome::Success(CoachContext { user, school_id }),
            Ok(None) => {
                log::debug!("user {} is not a coach with a school", user.username);
                Outcome::Error((Status::Forbidden, AuthError::Forbidden))
            }
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

impl<'r> OpenApiFromRequest<'r> for CoachContext {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_request_input()
    }
}

async fn coach_school(request: &Request<'_>, user_id: i32) -> Result<Option<Uuid>, AuthError> {
    let pool = request
        .guard::<&State<sqlx::PgPool>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("database pool missing from state".into()))?;

    let row = sqlx::query("SELECT is_coach, school_id FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool.inner())
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let is_coach: bool = row.try_get("is_coach")?;
    let school_id: Option<Uuid> = row.try_get("school_id")?;
    Ok(school_id.filter(|_| is_coach))
}
