mod common;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{rt, test, web, App, HttpServer};
use common::{
    employer_with_task, send, student_with_profile, test_app, TestUser, EMPLOYER_ID,
    OTHER_STUDENT_ID, SECRET, STUDENT_ID,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use sweep::auth::{AuthMiddleware, Role};
use sweep::routes::{self, health};
use sweep::services::AppState;
use sweep::store::InMemoryStore;

#[actix_rt::test]
async fn test_assign_unauthorized() {
    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let state = AppState::new(Arc::new(InMemoryStore::new()));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(SECRET))
                    .configure(routes::config),
            )
    })
    .bind(("127.0.0.1", port))
    .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
    .run();
    let server_handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let payload = json!({
        "job_task_id": "00000000-0000-0000-0000-000000000000",
        "student_id": STUDENT_ID
    });

    let resp = client
        .post(format!("http://127.0.0.1:{}/api/taskassignment/assign", port))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.expect("error body is JSON");
    assert_eq!(body["error"], "Missing token");

    let resp = client
        .post(format!("http://127.0.0.1:{}/api/taskassignment/assign", port))
        .bearer_auth("not-a-jwt")
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    // The health check stays public.
    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    server_handle.stop(false).await;
}

#[test_log::test(actix_rt::test)]
async fn test_assignment_lifecycle_flow() {
    let app = test_app().await;
    let employer = TestUser::new(EMPLOYER_ID, Role::Employer);
    let student = TestUser::new(STUDENT_ID, Role::Student);

    let task_id = employer_with_task(&app, &employer, "medium", false).await;
    student_with_profile(&app, &student, false).await;

    // 1. Assign
    let (status, assignment) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/assign")
            .append_header(employer.bearer())
            .set_json(json!({ "job_task_id": task_id, "student_id": student.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", assignment);
    assert_eq!(assignment["status"], "requested");
    assert_eq!(assignment["student_id"], student.id);
    assert!(assignment["accepted_at"].is_null());
    let assignment_id = assignment["id"].as_str().unwrap().to_string();

    // 2. Accept, then accept again
    let accept = || {
        test::TestRequest::post()
            .uri("/api/taskassignment/accept")
            .append_header(student.bearer())
            .set_json(json!({ "assignment_id": assignment_id }))
    };
    let (status, accepted) = send(&app, accept()).await;
    assert_eq!(status, StatusCode::OK, "body: {}", accepted);
    assert_eq!(accepted["status"], "accepted");
    assert!(accepted["accepted_at"].is_string());

    let (status, body) = send(&app, accept()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "assignment already accepted");

    // 3. Complete
    let (status, completed) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/complete")
            .append_header(student.bearer())
            .set_json(json!({ "assignment_id": assignment_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", completed);
    assert_eq!(completed["status"], "completed");

    // 4. Approve with the default reward, then approve again
    let approve = || {
        test::TestRequest::post()
            .uri("/api/taskassignment/approve")
            .append_header(employer.bearer())
            .set_json(json!({ "assignment_id": assignment_id }))
    };
    let (status, approved) = send(&app, approve()).await;
    assert_eq!(status, StatusCode::OK, "body: {}", approved);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["tokens_awarded"], 100);
    assert!(approved["approved_at"].is_string());

    let (status, body) = send(&app, approve()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "assignment already approved");

    // 5. Tokens were credited exactly once
    let (status, profile) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/profile/me")
            .append_header(student.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["kind"], "student");
    assert_eq!(profile["token_balance"], 100);

    // 6. Both sides see the approved assignment
    let (status, mine) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/taskassignment/student")
            .append_header(student.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["status"], "approved");
    assert_eq!(mine[0]["task_title"], "Rake the quad");

    let (status, theirs) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/taskassignment/employer")
            .append_header(employer.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(theirs[0]["id"], assignment_id.as_str());
    assert_eq!(theirs[0]["student_name"], format!("Student {}", STUDENT_ID));

    // 7. An approved assignment cannot be retracted
    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/taskassignment/{}", assignment_id))
            .append_header(employer.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_lifecycle_preconditions() {
    let app = test_app().await;
    let employer = TestUser::new(EMPLOYER_ID, Role::Employer);
    let student = TestUser::new(STUDENT_ID, Role::Student);
    let other = TestUser::new(OTHER_STUDENT_ID, Role::Student);

    let task_id = employer_with_task(&app, &employer, "hard", true).await;
    student_with_profile(&app, &student, true).await;
    student_with_profile(&app, &other, false).await;

    // Experience requirement
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/assign")
            .append_header(employer.bearer())
            .set_json(json!({ "job_task_id": task_id, "student_id": other.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "student does not meet the experience requirement");

    // Students cannot assign
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/assign")
            .append_header(student.bearer())
            .set_json(json!({ "job_task_id": task_id, "student_id": student.id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, assignment) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/assign")
            .append_header(employer.bearer())
            .set_json(json!({ "job_task_id": task_id, "student_id": student.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let assignment_id = assignment["id"].as_str().unwrap().to_string();

    // Duplicate assignment
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/assign")
            .append_header(employer.bearer())
            .set_json(json!({ "job_task_id": task_id, "student_id": student.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "student already assigned to this task");

    // Completing before accepting
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/complete")
            .append_header(student.bearer())
            .set_json(json!({ "assignment_id": assignment_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "assignment has not been accepted yet");

    // Someone else's assignment
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/accept")
            .append_header(other.bearer())
            .set_json(json!({ "assignment_id": assignment_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Approving before completion
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/approve")
            .append_header(employer.bearer())
            .set_json(json!({ "assignment_id": assignment_id, "tokens_awarded": 120 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "assignment has not been completed yet");

    // Out-of-range reward is a validation error
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/approve")
            .append_header(employer.bearer())
            .set_json(json!({ "assignment_id": assignment_id, "tokens_awarded": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown assignment
    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/accept")
            .append_header(student.bearer())
            .set_json(json!({ "assignment_id": "00000000-0000-0000-0000-000000000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_malformed_requests() {
    let app = test_app().await;
    let student = TestUser::new(STUDENT_ID, Role::Student);
    let employer = TestUser::new(EMPLOYER_ID, Role::Employer);

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/accept")
            .append_header(student.bearer())
            .set_json(json!({ "assignment_id": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri("/api/taskassignment/not-a-uuid")
            .append_header(employer.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_unassign_flow() {
    let app = test_app().await;
    let employer = TestUser::new(EMPLOYER_ID, Role::Employer);
    let student = TestUser::new(STUDENT_ID, Role::Student);

    let task_id = employer_with_task(&app, &employer, "easy", false).await;
    student_with_profile(&app, &student, false).await;

    let (_, assignment) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/assign")
            .append_header(employer.bearer())
            .set_json(json!({ "job_task_id": task_id, "student_id": student.id })),
    )
    .await;
    let assignment_id = assignment["id"].as_str().unwrap().to_string();

    // The student cannot retract it
    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/taskassignment/{}", assignment_id))
            .append_header(student.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/taskassignment/{}", assignment_id))
            .append_header(employer.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/taskassignment/accept")
            .append_header(student.bearer())
            .set_json(json!({ "assignment_id": assignment_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // With no assignments left the task can be deleted
    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/jobtask/{}", task_id))
            .append_header(employer.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
