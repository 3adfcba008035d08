pub mod assignments;
pub mod health;
pub mod job_tasks;
pub mod profiles;

use actix_web::web;

use crate::error::AppError;

pub fn config(cfg: &mut web::ServiceConfig) {
    // Malformed bodies and paths get the same JSON error shape as everything else.
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/taskassignment")
            .service(assignments::assign)
            .service(assignments::accept)
            .service(assignments::complete)
            .service(assignments::approve)
            .service(assignments::student_assignments)
            .service(assignments::employer_assignments)
            .service(assignments::unassign),
    )
    .service(
        web::scope("/jobtask")
            .service(job_tasks::list_job_tasks)
            .service(job_tasks::create_job_task)
            .service(job_tasks::get_job_task)
            .service(job_tasks::delete_job_task)
            .service(job_tasks::add_attachment)
            .service(job_tasks::list_attachments),
    )
    .service(
        web::scope("/profile")
            .service(profiles::create_student_profile)
            .service(profiles::create_employer_profile)
            .service(profiles::my_profile),
    );
}
