mod common;

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use educa::router::init_router;
use educa_config::RateLimitConfig;
use educa_models::Role;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn login_request(email: &str, password: &str) -> Request<Body> {
    common::json_request(
        "POST",
        "/api/auth/login",
        None,
        json!({ "email": email, "password": password }),
    )
}

fn login_from(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut request = login_request("ana@escola.br", "password123");
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    if let Some(value) = forwarded_for {
        request
            .headers_mut()
            .insert("x-forwarded-for", value.parse().unwrap());
    }
    request
}

fn limited(burst: u32, trust_proxy_headers: bool) -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        login_per_minute: 1,
        login_burst: burst,
        trust_proxy_headers,
    }
}

#[tokio::test]
async fn test_login_invalid_email_format() {
    let response = common::offline_app()
        .oneshot(login_request("not-an-email", "password123"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_missing_password() {
    let response = common::offline_app()
        .oneshot(common::json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ana@escola.br" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "password is required");
}

#[tokio::test]
async fn test_login_without_json_content_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .body(Body::from(r#"{"email":"ana@escola.br","password":"x"}"#))
        .unwrap();

    let response = common::offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_without_token() {
    let response = common::offline_app()
        .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_invalid_token() {
    let response = common::offline_app()
        .oneshot(common::get("/api/auth/me", "invalid.token.here"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();

    let response = common::offline_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_login_rate_limit_exceeded() {
    let app = init_router(common::state_with(common::unreachable_pool(), limited(1, false)));

    let response = app
        .clone()
        .oneshot(login_from("192.0.2.10:40000", None))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .clone()
        .oneshot(login_from("192.0.2.10:40001", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Other peers keep their own bucket.
    let response = app
        .oneshot(login_from("192.0.2.20:40000", None))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_reset_the_limit() {
    let app = init_router(common::state_with(common::unreachable_pool(), limited(2, false)));

    let mut statuses = Vec::new();
    for i in 0..5 {
        let forwarded = format!("10.9.0.{i}");
        let response = app
            .clone()
            .oneshot(login_from("192.0.2.10:40000", Some(&forwarded)))
            .await
            .unwrap();
        statuses.push(response.status());
    }

    let limited_count = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(limited_count, 3, "{statuses:?}");
    assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forwarded_for_is_used_behind_trusted_proxy() {
    let app = init_router(common::state_with(common::unreachable_pool(), limited(1, true)));

    let response = app
        .clone()
        .oneshot(login_from("10.0.0.1:40000", Some("203.0.113.7")))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .clone()
        .oneshot(login_from("10.0.0.1:40000", Some("203.0.113.7")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Same proxy, different client.
    let response = app
        .oneshot(login_from("10.0.0.1:40000", Some("203.0.113.8")))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success_sets_cookie(pool: PgPool) {
    let email = common::unique_email();
    common::create_user_with(&pool, Role::Student, &email, true).await;

    let response = common::app(pool)
        .oneshot(login_request(&email.to_uppercase(), common::TEST_PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let body = common::body_json(response).await;
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "ALUNO");
    assert!(body["user"].get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_invalid_credentials(pool: PgPool) {
    let email = common::unique_email();
    common::create_user_with(&pool, Role::Teacher, &email, true).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(login_request(&email, "wrong-password"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(login_request("nobody@escola.br", common::TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_inactive_user_cannot_log_in(pool: PgPool) {
    let email = common::unique_email();
    let (_, token) = common::create_user_with(&pool, Role::Teacher, &email, false).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(login_request(&email, common::TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(common::get("/api/auth/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_and_change_password(pool: PgPool) {
    let email = common::unique_email();
    let (user_id, token) = common::create_user_with(&pool, Role::Guardian, &email, true).await;
    let app = common::app(pool);

    let response = app.clone().oneshot(common::get("/api/auth/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["role"], "RESPONSAVEL");

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            json!({ "current_password": "wrong-password", "new_password": "nova-senha-456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/auth/change-password",
            Some(&token),
            json!({ "current_password": common::TEST_PASSWORD, "new_password": "nova-senha-456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(login_request(&email, "nova-senha-456"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
