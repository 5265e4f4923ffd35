use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use common::{
    CategoryDto, CategoryPayload, Credentials, ItemDto, ItemPayload, RegisterPayload,
    TokenResponse, UserDto,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::{auth, categories, items};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub app_config: AppConfig,
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Marketplace listings API",
        description = "User accounts, bearer-token auth, and CRUD over item listings grouped by category."
    ),
    paths(
        crate::auth::register,
        crate::auth::login,
        crate::items::create_item,
        crate::items::list_items,
        crate::items::filter_items,
        crate::items::paginated_items,
        crate::items::get_item,
        crate::items::update_item,
        crate::items::delete_item,
        crate::categories::create_category,
        crate::categories::list_categories,
    ),
    components(schemas(
        RegisterPayload,
        Credentials,
        UserDto,
        TokenResponse,
        ItemPayload,
        ItemDto,
        CategoryPayload,
        CategoryDto,
    )),
    tags(
        (name = "auth"),
        (name = "items"),
        (name = "categories"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub async fn run_server(app_state: AppState) {
    let addr: SocketAddr = format!(
        "{}:{}",
        app_state.app_config.web.addr, app_state.app_config.web.port
    )
    .parse()
    .expect("invalid web.addr / web.port configuration");

    let app = create_router(app_state);

    tracing::info!("Serving API at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

pub fn create_router(app_state: AppState) -> Router {
    let cors_origin = app_state
        .app_config
        .web
        .cors_origin
        .parse::<HeaderValue>()
        .expect("invalid web.cors_origin configuration");

    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::login))
        .route(
            "/items",
            get(items::list_items).post(items::create_item),
        )
        .route("/items/filter", get(items::filter_items))
        .route("/items/paginated", get(items::paginated_items))
        .route(
            "/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
