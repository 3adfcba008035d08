use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{EmployerProfileInput, StudentProfileInput},
    services::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;

/// Creates the student profile of the calling student.
#[post("/student")]
pub async fn create_student_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<StudentProfileInput>,
) -> Result<impl Responder, AppError> {
    let profile = state
        .profiles
        .create_student(&user, body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(profile))
}

/// Creates the employer profile of the calling employer.
#[post("/employer")]
pub async fn create_employer_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<EmployerProfileInput>,
) -> Result<impl Responder, AppError> {
    let profile = state
        .profiles
        .create_employer(&user, body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(profile))
}

/// Returns the caller's profile, tagged `"kind": "student" | "employer"`.
#[get("/me")]
pub async fn my_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = state.profiles.my_profile(&user).await?;
    Ok(HttpResponse::Ok().json(profile))
}
