use chrono::Utc;
use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_db_pools::sqlx::{self, Row};
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{
    Object, SecurityRequirement, SecurityScheme, SecuritySchemeData,
};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::auth::jwt::AccessTokenClaims;
use crate::auth::{AuthError, AuthResult, AuthState, Role};

const BEARER_SCHEME_NAME: &str = "BearerAuth";

/// The authenticated caller, resolved from a bearer token and the users table.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequireAdmin {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthUser::from_request(request).await {
            Outcome::Success(user) => {
                if user.is_admin() {
                    Outcome::Success(RequireAdmin(user))
                } else {
                    log::debug!("user {} denied admin access", user.username);
                    Outcome::Error((Status::Forbidden, AuthError::Forbidden))
                }
            }
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Forward(_) => {
                Outcome::Error((Status::Unauthorized, AuthError::Unauthorized))
            }
        }
    }
}

/// Documents bearer authentication for every route using an auth guard.
pub(crate) fn bearer_request_input() -> rocket_okapi::Result<RequestHeaderInput> {
    let scheme = SecurityScheme {
        description: Some("Access token issued by the platform identity provider.".to_owned()),
        data: SecuritySchemeData::Http {
            scheme: "bearer".to_owned(),
            bearer_format: Some("JWT".to_owned()),
        },
        extensions: Object::default(),
    };
    let mut requirement = SecurityRequirement::new();
    requirement.insert(BEARER_SCHEME_NAME.to_owned(), Vec::new());
    Ok(RequestHeaderInput::Security(
        BEARER_SCHEME_NAME.to_owned(),
        scheme,
        requirement,
    ))
}

impl<'r> OpenApiFromRequest<'r> for AuthUser {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_request_input()
    }
}

impl<'r> OpenApiFromRequest<'r> for RequireAdmin {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        bearer_request_input()
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let pool = request
        .guard::<&State<sqlx::PgPool>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("database pool missing from state".into()))?;

    let claims = auth_state.jwt_service.decode_access_token(token)?;
    validate_claims(&claims)?;

    let user_id: i32 = claims.sub.parse().map_err(|_| AuthError::Unauthorized)?;

    let row = sqlx::query("SELECT username, email, role, is_active FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool.inner())
        .await?;

    let row = row.ok_or(AuthError::Unauthorized)?;
    let username: String = row.try_get("username")?;
    let email: String = row.try_get("email")?;
    let role_str: String = row.try_get("role")?;
    let is_active: bool = row.try_get("is_active")?;

    if !is_active {
        return Err(AuthError::AccountDisabled);
    }

    let role = Role::parse(&role_str);
    if role.as_str() != claims.role {
        return Err(AuthError::TokenInvalid);
    }

    Ok(AuthUser {
        id: user_id,
        username,
        email,
        role,
    })
}

fn bearer_token_from_request<'a>(request: &'a Request<'_>) -> AuthResult<&'a str> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::Unauthorized)?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::Unauthorized)
    }
}

fn validate_claims(claims: &AccessTokenClaims) -> AuthResult<()> {
    let now = Utc::now().timestamp();
    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}
