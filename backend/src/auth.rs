use axum::{extract::State, http::StatusCode, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use common::{Credentials, RegisterPayload, TokenResponse, UserDto};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::web_server::AppState;
use validator::Validate;

/// bcrypt ignores everything past 72 bytes; truncate explicitly so the
/// behavior does not depend on the hashing backend.
const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (username)
    pub user_id: i64, // Database id of the user
    pub exp: usize,   // Expiration time
}

#[derive(sqlx::FromRow, Debug)]
struct UserRecord {
    id: i64,
    username: String,
    hashed_password: String,
}

fn truncate_password(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(BCRYPT_MAX_PASSWORD_BYTES)]
}

/// Create a signed access token embedding the username and user id.
pub fn issue_access_token(
    user_id: i64,
    username: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::minutes(jwt_config.access_token_expires_minutes))
        .timestamp() as usize;
    let claims = Claims {
        sub: username.to_owned(),
        user_id,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_ref()),
    )?;
    Ok(token)
}

/// ## Register a new user
/// Stores the password only as a salted bcrypt hash.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User created successfully", body = UserDto),
        (status = 409, description = "Username or email already taken"),
        (status = 422, description = "Invalid data provided"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    payload.validate()?;

    tracing::info!("Registering user {}", &payload.username);

    let username_taken: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(&payload.username)
            .fetch_optional(&state.db_pool)
            .await?;
    if username_taken.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let email_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db_pool)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let hashed_password = hash(truncate_password(&payload.password), DEFAULT_COST)?;

    let user: UserDto = sqlx::query_as(
        "INSERT INTO users (username, email, hashed_password) VALUES ($1, $2, $3)
         RETURNING id, username, email, created_at",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// ## Exchange credentials for a bearer token
/// Verifies the password and returns a signed, time-limited access token.
#[utoipa::path(
    post,
    path = "/token",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    tracing::info!("Logging in user {}", &payload.username);

    let user: UserRecord = sqlx::query_as(
        "SELECT id, username, hashed_password FROM users WHERE username = $1",
    )
    .bind(&payload.username)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !verify(truncate_password(&payload.password), &user.hashed_password)? {
        return Err(AppError::Unauthorized);
    }

    let access_token = issue_access_token(user.id, &user.username, &state.app_config.jwt)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
