use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use common::{ItemDto, ItemPayload};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::db::DbPool;
use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::web_server::AppState;

/// Hard cap on page size, applied silently.
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Lower price bound, inclusive.
    pub min_price: Option<f64>,
    /// Upper price bound, inclusive.
    pub max_price: Option<f64>,
    /// Case-insensitive substring match on the condition field.
    pub condition: Option<String>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_size")]
    pub limit: u32,
}

fn default_page_size() -> u32 {
    10
}

/// Look up an item and check that `user` owns it. Update and delete share
/// this path, so the ownership rule lives in exactly one place.
async fn fetch_owned_item(db_pool: &DbPool, id: i64, user: &AuthUser) -> Result<ItemDto, AppError> {
    let item: ItemDto = sqlx::query_as(
        "SELECT id, owner_id, category_id, title, description, price, condition,
                photo_url, is_active, created_at, updated_at
         FROM items WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    if item.owner_id != Some(user.id) {
        return Err(AppError::Forbidden);
    }

    Ok(item)
}

/// ## Create a listing
/// The owner is always the authenticated caller; clients cannot pick one.
#[utoipa::path(
    post,
    path = "/items",
    request_body = ItemPayload,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Item created", body = ItemDto),
        (status = 401, description = "Authentication required"),
        (status = 422, description = "Invalid data provided"),
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ItemPayload>,
) -> Result<(StatusCode, Json<ItemDto>), AppError> {
    payload.validate()?;

    tracing::info!("User {} creating item {:?}", user.id, &payload.title);

    let item: ItemDto = sqlx::query_as(
        "INSERT INTO items (owner_id, category_id, title, description, price, condition, photo_url)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, owner_id, category_id, title, description, price, condition,
                   photo_url, is_active, created_at, updated_at",
    )
    .bind(user.id)
    .bind(payload.category_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.condition)
    .bind(&payload.photo_url)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// ## List all items
#[utoipa::path(
    get,
    path = "/items",
    responses((status = 200, description = "All items", body = [ItemDto])),
    tag = "items"
)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemDto>>, AppError> {
    let items: Vec<ItemDto> = sqlx::query_as(
        "SELECT id, owner_id, category_id, title, description, price, condition,
                photo_url, is_active, created_at, updated_at
         FROM items ORDER BY id",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(items))
}

/// ## Filter items
/// All filters are conjunctive; substring matches are case-insensitive.
#[utoipa::path(
    get,
    path = "/items/filter",
    params(FilterParams),
    responses((status = 200, description = "Matching items", body = [ItemDto])),
    tag = "items"
)]
pub async fn filter_items(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<ItemDto>>, AppError> {
    let items: Vec<ItemDto> = sqlx::query_as(
        "SELECT id, owner_id, category_id, title, description, price, condition,
                photo_url, is_active, created_at, updated_at
         FROM items
         WHERE ($1 IS NULL OR price >= $1)
           AND ($2 IS NULL OR price <= $2)
           AND ($3 IS NULL OR LOWER(condition) LIKE '%' || LOWER($3) || '%')
           AND ($4 IS NULL OR LOWER(title) LIKE '%' || LOWER($4) || '%')
         ORDER BY id",
    )
    .bind(params.min_price)
    .bind(params.max_price)
    .bind(&params.condition)
    .bind(&params.search)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(items))
}

/// ## Page through items
/// `limit` is silently clamped to 50.
#[utoipa::path(
    get,
    path = "/items/paginated",
    params(PageParams),
    responses((status = 200, description = "One page of items", body = [ItemDto])),
    tag = "items"
)]
pub async fn paginated_items(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ItemDto>>, AppError> {
    let limit = params.limit.min(MAX_PAGE_SIZE);

    let items: Vec<ItemDto> = sqlx::query_as(
        "SELECT id, owner_id, category_id, title, description, price, condition,
                photo_url, is_active, created_at, updated_at
         FROM items ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(i64::from(limit))
    .bind(i64::from(params.skip))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(items))
}

/// ## Fetch one item
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "The item", body = ItemDto),
        (status = 404, description = "No such item"),
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemDto>, AppError> {
    let item: ItemDto = sqlx::query_as(
        "SELECT id, owner_id, category_id, title, description, price, condition,
                photo_url, is_active, created_at, updated_at
         FROM items WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(item))
}

/// ## Replace a listing
/// Full-replace semantics: every mutable field is taken from the payload.
/// The owner and the activity flag are not client-controlled.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = ItemPayload,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated item", body = ItemDto),
        (status = 403, description = "Caller does not own the item"),
        (status = 404, description = "No such item"),
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ItemDto>, AppError> {
    payload.validate()?;

    fetch_owned_item(&state.db_pool, id, &user).await?;

    tracing::info!("User {} updating item {}", user.id, id);

    let item: ItemDto = sqlx::query_as(
        "UPDATE items
         SET title = $1, description = $2, price = $3, condition = $4,
             category_id = $5, photo_url = $6, updated_at = CURRENT_TIMESTAMP
         WHERE id = $7
         RETURNING id, owner_id, category_id, title, description, price, condition,
                   photo_url, is_active, created_at, updated_at",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.condition)
    .bind(payload.category_id)
    .bind(&payload.photo_url)
    .bind(id)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(item))
}

/// ## Delete a listing
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 403, description = "Caller does not own the item"),
        (status = 404, description = "No such item"),
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    fetch_owned_item(&state.db_pool, id, &user).await?;

    tracing::info!("User {} deleting item {}", user.id, id);

    sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
