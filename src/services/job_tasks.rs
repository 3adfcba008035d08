use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::AppError;
use crate::models::{AttachmentInput, JobTask, JobTaskInput, TaskAttachment};
use crate::store::{JobTaskFilter, SweepStore};

#[derive(Clone)]
pub struct JobTaskService {
    store: Arc<dyn SweepStore>,
}

impl JobTaskService {
    pub fn new(store: Arc<dyn SweepStore>) -> Self {
        Self { store }
    }

    /// Posts a new task owned by the calling employer.
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        input: JobTaskInput,
        now: DateTime<Utc>,
    ) -> Result<JobTask, AppError> {
        user.require(Role::Employer)?;
        input.validate()?;
        if input.deadline <= now {
            return Err(AppError::ValidationError(
                "deadline: must be in the future".into(),
            ));
        }
        if self.store.find_employer_profile(user.id).await?.is_none() {
            return Err(AppError::Forbidden(
                "Create an employer profile before posting tasks".into(),
            ));
        }

        let task = JobTask::new(input, user.id, now);
        self.store.insert_job_task(&task).await?;
        log::info!("Employer {} posted job task {}", user.id, task.id);
        Ok(task)
    }

    /// Employers see their own tasks, students the ones still open, admins all.
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> Result<Vec<JobTask>, AppError> {
        let filter = match user.role {
            Role::Employer => JobTaskFilter::OwnedBy(user.id),
            Role::Student => JobTaskFilter::OpenAt(now),
            Role::Admin => JobTaskFilter::All,
        };
        Ok(self.store.list_job_tasks(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<JobTask, AppError> {
        self.store
            .find_job_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Job task not found".into()))
    }

    /// Deletes a task that nobody has been assigned to.
    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> Result<(), AppError> {
        let task = self.get(id).await?;
        match user.role {
            Role::Admin => {}
            Role::Employer if task.employer_id == user.id => {}
            _ => return Err(AppError::Forbidden("You do not own this job task".into())),
        }

        if !self.store.delete_job_task_if_unassigned(id).await? {
            log::debug!("Refused to delete job task {}: it has assignments", id);
            return Err(AppError::Conflict(
                "Job task has assignments and cannot be deleted".into(),
            ));
        }
        log::info!("User {} deleted job task {}", user.id, id);
        Ok(())
    }

    /// Records an attachment the storage service already holds.
    pub async fn add_attachment(
        &self,
        user: &AuthenticatedUser,
        job_task_id: Uuid,
        input: AttachmentInput,
        now: DateTime<Utc>,
    ) -> Result<TaskAttachment, AppError> {
        input.validate()?;
        let task = self.get(job_task_id).await?;
        if user.role != Role::Employer || task.employer_id != user.id {
            return Err(AppError::Forbidden("You do not own this job task".into()));
        }

        let attachment = TaskAttachment::new(input, job_task_id, now);
        self.store.insert_attachment(&attachment).await?;
        Ok(attachment)
    }

    /// Visible to the owner, admins, and students assigned to the task.
    pub async fn list_attachments(
        &self,
        user: &AuthenticatedUser,
        job_task_id: Uuid,
    ) -> Result<Vec<TaskAttachment>, AppError> {
        let task = self.get(job_task_id).await?;
        let allowed = match user.role {
            Role::Admin => true,
            Role::Employer => task.employer_id == user.id,
            Role::Student => self
                .store
                .find_assignment_for(job_task_id, user.id)
                .await?
                .is_some(),
        };
        if !allowed {
            return Err(AppError::Forbidden(
                "You cannot view attachments of this job task".into(),
            ));
        }
        Ok(self.store.list_attachments(job_task_id).await?)
    }
}
