#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use herdbook::migrator::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use tower_cookies::Key;

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// Fresh in-memory database with every migration applied.
pub async fn setup_test_app() -> TestApp {
    // One connection, otherwise every pooled connection gets its own empty database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    TestApp {
        router: herdbook::api::router(db.clone(), Key::generate()),
        db,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value) {
        let (status, _, body) = self.request_raw(method, uri, body, cookie).await;
        (status, body)
    }

    /// Like [`TestApp::request`], also returning the session cookie if one was set.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, set_cookie, json)
    }

    pub async fn register(&self, email: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                Some(json!({"email": email, "password": "correct horse", "name": "Rancher"})),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body
    }

    /// Registers (if needed) and logs in, returning the session cookie.
    pub async fn login(&self, email: &str) -> String {
        let (status, cookie, body) = self
            .request_raw(
                Method::POST,
                "/auth/login",
                Some(json!({"email": email, "password": "correct horse"})),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        cookie.expect("login should set a session cookie")
    }

    /// Session of the first registered user, who is the admin.
    pub async fn admin(&self) -> String {
        self.register("admin@ranch.test").await;
        self.login("admin@ranch.test").await
    }

    pub async fn create_cattle(&self, cookie: &str, body: Value) -> Value {
        let (status, created) = self
            .request(Method::POST, "/cattle", Some(body), Some(cookie))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", created);
        created
    }
}

pub fn cow(ear_tag: &str) -> Value {
    json!({"ear_tag": ear_tag, "sex": "female", "horn_status": "polled"})
}

pub fn bull(ear_tag: &str) -> Value {
    json!({"ear_tag": ear_tag, "sex": "male", "horn_status": "horned"})
}

pub fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
