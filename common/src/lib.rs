use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- Auth payloads ---

#[derive(Serialize, Deserialize, Clone, Debug, Validate, ToSchema)]
pub struct RegisterPayload {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Validate, ToSchema)]
pub struct Credentials {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Public view of a user. The password hash never leaves the backend.
#[derive(FromRow, Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// --- Listings ---

/// Fields a client may set on an item. Ownership and activity flags are
/// controlled by the backend.
#[derive(Serialize, Deserialize, Clone, Debug, Validate, ToSchema)]
pub struct ItemPayload {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 50))]
    pub condition: String,
    pub category_id: Option<i64>,
    #[validate(length(max = 300))]
    pub photo_url: Option<String>,
}

#[derive(FromRow, Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct ItemDto {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub photo_url: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// --- Categories ---

#[derive(Serialize, Deserialize, Clone, Debug, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

#[derive(FromRow, Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}
