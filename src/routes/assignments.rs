use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ApproveRequest, AssignRequest, AssignmentRef},
    services::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;

/// Assigns a student to one of the caller's job tasks.
///
/// ## Request Body:
/// `{"job_task_id": "<uuid>", "student_id": <int>}`
///
/// ## Responses:
/// - `201 Created`: the new assignment, status `requested`.
/// - `403 Forbidden`: caller is not an employer or does not own the task.
/// - `404 Not Found`: task or student does not exist.
/// - `409 Conflict`: deadline passed, student already assigned, or experience missing.
#[post("/assign")]
pub async fn assign(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AssignRequest>,
) -> Result<impl Responder, AppError> {
    let assignment = state
        .assignments
        .assign(&user, body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(assignment))
}

/// Accepts an assignment as the assigned student.
///
/// ## Responses:
/// - `200 OK`: the updated assignment.
/// - `409 Conflict`: already accepted, or the task deadline has passed.
#[post("/accept")]
pub async fn accept(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AssignmentRef>,
) -> Result<impl Responder, AppError> {
    let assignment = state
        .assignments
        .accept(&user, body.assignment_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

/// Marks an accepted assignment as completed.
#[post("/complete")]
pub async fn complete(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AssignmentRef>,
) -> Result<impl Responder, AppError> {
    let assignment = state
        .assignments
        .complete(&user, body.assignment_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

/// Approves a completed assignment and credits the student's tokens.
///
/// ## Request Body:
/// `{"assignment_id": "<uuid>", "tokens_awarded": 1..=500}`; `tokens_awarded`
/// defaults to the task's complexity reward.
///
/// ## Responses:
/// - `200 OK`: the approved assignment.
/// - `409 Conflict`: not completed yet, or already approved.
/// - `422 Unprocessable Entity`: `tokens_awarded` out of range.
#[post("/approve")]
pub async fn approve(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ApproveRequest>,
) -> Result<impl Responder, AppError> {
    let assignment = state
        .assignments
        .approve(&user, body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(assignment))
}

/// Lists the calling student's assignments.
#[get("/student")]
pub async fn student_assignments(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let assignments = state.assignments.for_student(&user).await?;
    Ok(HttpResponse::Ok().json(assignments))
}

/// Lists assignments on the calling employer's tasks.
#[get("/employer")]
pub async fn employer_assignments(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let assignments = state.assignments.for_employer(&user).await?;
    Ok(HttpResponse::Ok().json(assignments))
}

/// Retracts an assignment that has not been completed.
///
/// ## Responses:
/// - `204 No Content`: the assignment was deleted.
/// - `409 Conflict`: the assignment is already completed.
#[delete("/{assignment_id}")]
pub async fn unassign(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    assignment_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state
        .assignments
        .unassign(&user, assignment_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
