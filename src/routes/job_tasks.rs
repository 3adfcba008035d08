use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{AttachmentInput, JobTaskInput, JobTaskResponse},
    services::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::Utc;
use uuid::Uuid;

/// Lists job tasks visible to the caller.
///
/// Employers get their own tasks, students the tasks whose deadline has not
/// passed, admins every task. Ordered by deadline, soonest first.
#[get("")]
pub async fn list_job_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks: Vec<JobTaskResponse> = state
        .job_tasks
        .list(&user, Utc::now())
        .await?
        .into_iter()
        .map(JobTaskResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(tasks))
}

/// Posts a new job task owned by the calling employer.
///
/// ## Responses:
/// - `201 Created`: the task, including its `token_reward`.
/// - `403 Forbidden`: caller is not an employer with a profile.
/// - `422 Unprocessable Entity`: invalid fields or a deadline in the past.
#[post("")]
pub async fn create_job_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<JobTaskInput>,
) -> Result<impl Responder, AppError> {
    let task = state
        .job_tasks
        .create(&user, body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(JobTaskResponse::from(task)))
}

#[get("/{id}")]
pub async fn get_job_task(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = state.job_tasks.get(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobTaskResponse::from(task)))
}

/// Deletes a job task. Only possible while nobody is assigned to it.
///
/// ## Responses:
/// - `204 No Content`: deleted, together with its attachments.
/// - `403 Forbidden`: caller is neither the owner nor an admin.
/// - `409 Conflict`: the task has assignments.
#[delete("/{id}")]
pub async fn delete_job_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.job_tasks.delete(&user, id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Records an uploaded file against a job task.
///
/// The bytes live in object storage; the body carries the file metadata and
/// the URL storage returned.
#[post("/{id}/attachments")]
pub async fn add_attachment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    body: web::Json<AttachmentInput>,
) -> Result<impl Responder, AppError> {
    let attachment = state
        .job_tasks
        .add_attachment(&user, id.into_inner(), body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(attachment))
}

#[get("/{id}/attachments")]
pub async fn list_attachments(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let attachments = state
        .job_tasks
        .list_attachments(&user, id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(attachments))
}
