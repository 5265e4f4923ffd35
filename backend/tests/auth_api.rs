use common::{Credentials, RegisterPayload, TokenResponse, UserDto};
use reqwest::StatusCode;
mod helpers;
use crate::helpers::TEST_JWT_SECRET;
use backend::auth::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use serde_json::json;

static TRACING: Lazy<()> = Lazy::new(|| {
    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO);
    subscriber.init();
});

#[tokio::test]
async fn test_register_and_token_flow() {
    Lazy::force(&TRACING);

    let (addr, client, _db_pool) = helpers::spawn_app().await;

    let register_url = format!("http://{addr}/register");
    let token_url = format!("http://{addr}/token");

    let payload = RegisterPayload {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "password123".to_string(),
    };

    // 1. Register a new user; the response is the public user view.
    let response = client
        .post(&register_url)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute register request.");

    assert_eq!(response.status(), StatusCode::CREATED);
    let user: UserDto = response.json().await.expect("Failed to parse user");
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");

    // 2. The same username again is a conflict, even with a fresh email.
    let response = client
        .post(&register_url)
        .json(&json!({
            "username": "alice",
            "email": "alice2@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute second register request.");
    assert_eq!(
        response.status(),
        StatusCode::CONFLICT,
        "Duplicate username should conflict"
    );

    // 3. The same email under a new username is also a conflict.
    let response = client
        .post(&register_url)
        .json(&json!({
            "username": "alice_again",
            "email": "alice@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute third register request.");
    assert_eq!(
        response.status(),
        StatusCode::CONFLICT,
        "Duplicate email should conflict"
    );

    // 4. Exchange credentials for a bearer token.
    let response = client
        .post(&token_url)
        .json(&Credentials {
            username: "alice".to_string(),
            password: "password123".to_string(),
        })
        .send()
        .await
        .expect("Failed to execute token request.");
    assert_eq!(response.status(), StatusCode::OK);
    let tokens: TokenResponse = response.json().await.unwrap();
    assert!(!tokens.access_token.is_empty());
    assert_eq!(tokens.token_type, "bearer");

    // 5. A wrong password is rejected.
    let response = client
        .post(&token_url)
        .json(&Credentials {
            username: "alice".to_string(),
            password: "wrongpassword".to_string(),
        })
        .send()
        .await
        .expect("Failed to execute bad token request.");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 6. So is a user that does not exist.
    let response = client
        .post(&token_url)
        .json(&Credentials {
            username: "nobody99".to_string(),
            password: "password123".to_string(),
        })
        .send()
        .await
        .expect("Failed to execute unknown-user token request.");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_and_expired_tokens() {
    Lazy::force(&TRACING);

    let (addr, client, _db_pool) = helpers::spawn_app().await;
    let protected_url = format!("http://{addr}/items");
    let item = json!({
        "title": "Desk lamp",
        "description": "Works fine",
        "price": 12.0,
        "condition": "used",
        "category_id": null,
        "photo_url": null
    });

    // No token at all.
    let response = client.post(&protected_url).json(&item).send().await.unwrap();
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Mutations should require a bearer token"
    );

    // A malformed token.
    let response = client
        .post(&protected_url)
        .bearer_auth("this-is-not-a-valid-jwt")
        .json(&item)
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Should reject a malformed JWT"
    );

    // A valid-looking but expired token for a real user.
    helpers::register_user(&addr, &client, "expired_user").await;

    let expiration = Utc::now()
        .checked_sub_signed(Duration::seconds(30))
        .expect("Failed to create timestamp")
        .timestamp();
    let claims = Claims {
        sub: "expired_user".to_string(),
        user_id: 1,
        exp: expiration as usize,
    };
    let secret = EncodingKey::from_secret(TEST_JWT_SECRET.as_ref());
    let expired_token = encode(&Header::default(), &claims, &secret).unwrap();

    let response = client
        .post(&protected_url)
        .bearer_auth(expired_token)
        .json(&item)
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Should reject an expired JWT"
    );

    // A fresh token signed with the wrong secret.
    let claims = Claims {
        sub: "expired_user".to_string(),
        user_id: 1,
        exp: (Utc::now() + Duration::minutes(60)).timestamp() as usize,
    };
    let wrong_secret = EncodingKey::from_secret("some-other-secret".as_ref());
    let forged_token = encode(&Header::default(), &claims, &wrong_secret).unwrap();

    let response = client
        .post(&protected_url)
        .bearer_auth(forged_token)
        .json(&item)
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::UNAUTHORIZED,
        "Should reject a JWT signed with the wrong secret"
    );
}

#[tokio::test]
async fn test_password_truncated_at_72_bytes() {
    Lazy::force(&TRACING);

    let (addr, client, _db_pool) = helpers::spawn_app().await;
    let register_url = format!("http://{addr}/register");
    let token_url = format!("http://{addr}/token");

    // 100-byte password; only the first 72 bytes count.
    let long_password = "a".repeat(100);
    let response = client
        .post(&register_url)
        .json(&json!({
            "username": "longpass",
            "email": "longpass@example.com",
            "password": long_password
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same first 72 bytes, different tail: accepted.
    let same_prefix = format!("{}{}", "a".repeat(72), "b".repeat(28));
    let response = client
        .post(&token_url)
        .json(&json!({ "username": "longpass", "password": same_prefix }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Bytes past 72 must not affect verification"
    );

    // A difference inside the first 72 bytes still fails.
    let changed_prefix = format!("{}b{}", "a".repeat(71), "a".repeat(28));
    let response = client
        .post(&token_url)
        .json(&json!({ "username": "longpass", "password": changed_prefix }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_validation() {
    Lazy::force(&TRACING);

    let (addr, client, _db_pool) = helpers::spawn_app().await;
    let register_url = format!("http://{addr}/register");

    let invalid_email = json!({
        "username": "bob",
        "email": "not-an-email",
        "password": "longenoughpassword"
    });
    let response = client
        .post(&register_url)
        .json(&invalid_email)
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::UNPROCESSABLE_ENTITY,
        "Should fail with invalid email format"
    );

    let short_password = json!({
        "username": "bob",
        "email": "bob@example.com",
        "password": "short"
    });
    let response = client
        .post(&register_url)
        .json(&short_password)
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::UNPROCESSABLE_ENTITY,
        "Should fail with short password"
    );
}
