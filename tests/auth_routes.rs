mod common;

use axum::http::{Method, StatusCode};
use common::{bull, setup_test_app};
use serde_json::json;

#[tokio::test]
async fn health_check_is_public() {
    let app = setup_test_app().await;
    let (status, _) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn first_user_is_admin_and_later_users_are_viewers() {
    let app = setup_test_app().await;

    let first = app.register("first@ranch.test").await;
    let second = app.register("second@ranch.test").await;

    assert_eq!(first["role"], "admin");
    assert_eq!(second["role"], "viewer");
    assert!(first.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = setup_test_app().await;
    app.register("dup@ranch.test").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({"email": "DUP@ranch.test", "password": "long enough", "name": "x"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already exists");
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = setup_test_app().await;
    let (status, _) = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({"email": "a@ranch.test", "password": "short", "name": "x"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = setup_test_app().await;
    app.register("me@ranch.test").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({"email": "me@ranch.test", "password": "not the one"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn session_cookie_grants_access_to_me() {
    let app = setup_test_app().await;
    let cookie = app.admin().await;

    let (status, body) = app.request(Method::GET, "/auth/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "admin@ranch.test");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = setup_test_app().await;

    let (status, _) = app.request(Method::GET, "/cattle", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/cattle", None, Some("herdbook_session=1"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "unsigned cookies are ignored");
}

#[tokio::test]
async fn viewers_can_read_but_not_write() {
    let app = setup_test_app().await;
    let admin = app.admin().await;
    app.register("viewer@ranch.test").await;
    let viewer = app.login("viewer@ranch.test").await;

    let created = app.create_cattle(&admin, bull("B-1")).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .request(Method::GET, &format!("/cattle/{}", id), None, Some(&viewer))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(Method::POST, "/cattle", Some(bull("B-2")), Some(&viewer))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &format!("/cattle/{}", id), None, Some(&viewer))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = setup_test_app().await;
    let cookie = app.admin().await;

    let (status, set_cookie, _) = app
        .request_raw(Method::POST, "/auth/logout", None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    let removal = set_cookie.expect("logout should expire the cookie");
    assert_eq!(removal, "herdbook_session=");
}
