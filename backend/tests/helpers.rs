// backend/tests/helpers.rs
use backend::config::{AppConfig, DatabaseConfig, JwtConfig, WebConfig};
use backend::web_server::AppState;
use common::{Credentials, RegisterPayload, TokenResponse};
use reqwest::StatusCode;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::net::TcpListener;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Spawn a test server over a fresh in-memory database and return the
/// address, a reqwest client, and the pool.
pub async fn spawn_app() -> (SocketAddr, reqwest::Client, SqlitePool) {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    // One connection: every handle must see the same in-memory database,
    // and foreign keys must actually be enforced.
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create in-memory database pool.");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations on test database.");

    let config = AppConfig {
        web: WebConfig {
            addr: "127.0.0.1".to_string(),
            port: addr.port(),
            cors_origin: "http://localhost:5173".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expires_minutes: 60,
        },
    };

    let app_state = AppState {
        db_pool: db_pool.clone(),
        app_config: config,
    };

    let app = backend::web_server::create_router(app_state);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    (addr, client, db_pool)
}

/// Register `username` with a derived email and the default test password.
pub async fn register_user(addr: &SocketAddr, client: &reqwest::Client, username: &str) {
    let register_url = format!("http://{addr}/register");
    let payload = RegisterPayload {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "password123".to_string(),
    };

    let res = client
        .post(&register_url)
        .json(&payload)
        .send()
        .await
        .expect("Failed to register user");
    assert_eq!(res.status(), StatusCode::CREATED, "Registration failed");
}

/// Register and log in `username`, returning their bearer token.
pub async fn get_auth_token(addr: &SocketAddr, client: &reqwest::Client, username: &str) -> String {
    register_user(addr, client, username).await;

    let token_url = format!("http://{addr}/token");
    let credentials = Credentials {
        username: username.to_string(),
        password: "password123".to_string(),
    };

    let response = client
        .post(&token_url)
        .json(&credentials)
        .send()
        .await
        .expect("Failed to log in user");
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Token request did not return 200 OK"
    );

    let token_response: TokenResponse = response
        .json()
        .await
        .expect("Failed to parse token response");

    token_response.access_token
}
