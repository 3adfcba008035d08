#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use sweep::auth::{generate_token, AuthMiddleware, Role};
use sweep::routes::{self, health};
use sweep::services::AppState;
use sweep::store::InMemoryStore;

pub const SECRET: &str = "integration-test-secret";

pub const EMPLOYER_ID: i32 = 1;
pub const STUDENT_ID: i32 = 2;
pub const OTHER_STUDENT_ID: i32 = 3;

// Helper struct to hold auth details
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

impl TestUser {
    pub fn new(id: i32, role: Role) -> Self {
        let token = generate_token(id, role, SECRET).expect("Failed to generate test token");
        Self { id, token }
    }

    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

/// The full application over a fresh in-memory store, wired like `main.rs`.
pub async fn test_app(
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let state = AppState::new(Arc::new(InMemoryStore::new()));
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(SECRET))
                    .configure(routes::config),
            ),
    )
    .await
}

/// Sends a request and returns the status with the parsed body (`Null` when empty).
pub async fn send<S, B>(app: &S, req: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            panic!(
                "Response body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&bytes)
            )
        })
    };
    (status, body)
}

/// Creates an employer with a profile and one open task; returns the task id.
pub async fn employer_with_task<S, B>(
    app: &S,
    employer: &TestUser,
    complexity: &str,
    requires_experience: bool,
) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, _) = send(
        app,
        test::TestRequest::post()
            .uri("/api/profile/employer")
            .append_header(employer.bearer())
            .set_json(json!({ "company_name": "Northside Grounds" })),
    )
    .await;
    assert!(
        status == StatusCode::CREATED || status == StatusCode::CONFLICT,
        "unexpected status creating employer profile: {}",
        status
    );

    let (status, task) = send(
        app,
        test::TestRequest::post()
            .uri("/api/jobtask")
            .append_header(employer.bearer())
            .set_json(json!({
                "title": "Rake the quad",
                "description": "Leaves around the main building",
                "deadline": Utc::now() + Duration::days(7),
                "complexity": complexity,
                "requires_experience": requires_experience
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", task);
    task["id"].as_str().expect("task id").to_string()
}

pub async fn student_with_profile<S, B>(app: &S, student: &TestUser, has_experience: bool)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/api/profile/student")
            .append_header(student.bearer())
            .set_json(json!({
                "full_name": format!("Student {}", student.id),
                "has_experience": has_experience
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
}
