use axum::{extract::State, http::StatusCode, Json};
use common::{CategoryDto, CategoryPayload};
use validator::Validate;

use crate::error::AppError;
use crate::web_server::AppState;

/// ## Create a category
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 409, description = "Category name already exists"),
        (status = 422, description = "Invalid data provided"),
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryDto>), AppError> {
    payload.validate()?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE name = $1")
        .bind(&payload.name)
        .fetch_optional(&state.db_pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    tracing::info!("Creating category {}", &payload.name);

    let category: CategoryDto = sqlx::query_as(
        "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(&payload.name)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// ## List categories
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [CategoryDto])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryDto>>, AppError> {
    let categories: Vec<CategoryDto> =
        sqlx::query_as("SELECT id, name, created_at FROM categories ORDER BY id")
            .fetch_all(&state.db_pool)
            .await?;

    Ok(Json(categories))
}
