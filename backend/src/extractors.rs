use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{auth::Claims, error::AppError, web_server::AppState};

/// The authenticated caller, resolved from the bearer token.
///
/// Extracting this on a handler makes the route protected: a missing header,
/// a bad signature, an expired token, or a token whose user has since been
/// deleted all reject with 401 before the handler body runs.
#[derive(sqlx::FromRow, Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(
            bearer.token(),
            &DecodingKey::from_secret(state.app_config.jwt.secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::Unauthorized)?;

        // The token is only as good as the user it points at.
        let user: AuthUser =
            sqlx::query_as("SELECT id, username, email FROM users WHERE id = $1")
                .bind(token_data.claims.user_id)
                .fetch_optional(&state.db_pool)
                .await?
                .ok_or(AppError::Unauthorized)?;

        Ok(user)
    }
}
