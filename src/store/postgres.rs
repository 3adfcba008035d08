use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{AssignmentFilter, JobTaskFilter, StoreError, StoreResult, SweepStore};
use crate::models::{
    AssignmentDetails, AssignmentStatus, EmployerProfile, JobTask, StudentProfile, TaskAssignment,
    TaskAttachment,
};

const JOB_TASK_COLUMNS: &str = "id, employer_id, title, description, deadline, complexity, \
     requires_experience, compensation_cents, created_at";

const ASSIGNMENT_COLUMNS: &str = "id, job_task_id, student_id, status, requested_at, \
     accepted_at, completed_at, approved_at, tokens_awarded";

const ASSIGNMENT_DETAILS_SELECT: &str = "SELECT a.id, a.job_task_id, a.student_id, a.status, \
     a.requested_at, a.accepted_at, a.completed_at, a.approved_at, a.tokens_awarded, \
     t.title AS task_title, t.deadline AS task_deadline, t.complexity, t.employer_id, \
     s.full_name AS student_name \
     FROM task_assignments a \
     JOIN job_tasks t ON t.id = a.job_task_id \
     JOIN student_profiles s ON s.user_id = a.student_id";

/// Opens the connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?.application_name("sweep");

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => StoreError::Duplicate(db.message().to_string()),
                Some("23503") => {
                    StoreError::NotFound("referenced record does not exist".into())
                }
                _ => StoreError::Persistence(error.to_string()),
            },
            _ => StoreError::Persistence(error.to_string()),
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SweepStore for PgStore {
    async fn insert_student_profile(&self, profile: &StudentProfile) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO student_profiles (user_id, full_name, has_experience, token_balance, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(profile.has_experience)
        .bind(profile.token_balance)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_employer_profile(&self, profile: &EmployerProfile) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO employer_profiles (user_id, company_name, created_at) VALUES ($1, $2, $3)",
        )
        .bind(profile.user_id)
        .bind(&profile.company_name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_student_profile(&self, user_id: i32) -> StoreResult<Option<StudentProfile>> {
        let profile = sqlx::query_as::<_, StudentProfile>(
            "SELECT user_id, full_name, has_experience, token_balance, created_at
             FROM student_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn find_employer_profile(&self, user_id: i32) -> StoreResult<Option<EmployerProfile>> {
        let profile = sqlx::query_as::<_, EmployerProfile>(
            "SELECT user_id, company_name, created_at FROM employer_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_job_task(&self, task: &JobTask) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO job_tasks ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            JOB_TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(task.employer_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.deadline)
        .bind(task.complexity)
        .bind(task.requires_experience)
        .bind(task.compensation_cents)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_job_task(&self, id: Uuid) -> StoreResult<Option<JobTask>> {
        let task = sqlx::query_as::<_, JobTask>(&format!(
            "SELECT {} FROM job_tasks WHERE id = $1",
            JOB_TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn list_job_tasks(&self, filter: JobTaskFilter) -> StoreResult<Vec<JobTask>> {
        let base = format!("SELECT {} FROM job_tasks", JOB_TASK_COLUMNS);
        let tasks = match filter {
            JobTaskFilter::All => {
                sqlx::query_as::<_, JobTask>(&format!("{} ORDER BY deadline", base))
                    .fetch_all(&self.pool)
                    .await?
            }
            JobTaskFilter::OwnedBy(employer_id) => {
                sqlx::query_as::<_, JobTask>(&format!(
                    "{} WHERE employer_id = $1 ORDER BY deadline",
                    base
                ))
                .bind(employer_id)
                .fetch_all(&self.pool)
                .await?
            }
            JobTaskFilter::OpenAt(now) => {
                sqlx::query_as::<_, JobTask>(&format!(
                    "{} WHERE deadline > $1 ORDER BY deadline",
                    base
                ))
                .bind(now)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(tasks)
    }

    async fn delete_job_task_if_unassigned(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM job_tasks WHERE id = $1
             AND NOT EXISTS (SELECT 1 FROM task_assignments WHERE job_task_id = $1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_attachment(&self, attachment: &TaskAttachment) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO task_attachments
             (id, job_task_id, file_name, content_type, size_bytes, url, uploaded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(attachment.id)
        .bind(attachment.job_task_id)
        .bind(&attachment.file_name)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .bind(&attachment.url)
        .bind(attachment.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_attachments(&self, job_task_id: Uuid) -> StoreResult<Vec<TaskAttachment>> {
        let attachments = sqlx::query_as::<_, TaskAttachment>(
            "SELECT id, job_task_id, file_name, content_type, size_bytes, url, uploaded_at
             FROM task_attachments WHERE job_task_id = $1 ORDER BY uploaded_at",
        )
        .bind(job_task_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attachments)
    }

    async fn insert_assignment(&self, assignment: &TaskAssignment) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO task_assignments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment.id)
        .bind(assignment.job_task_id)
        .bind(assignment.student_id)
        .bind(assignment.status)
        .bind(assignment.requested_at)
        .bind(assignment.accepted_at)
        .bind(assignment.completed_at)
        .bind(assignment.approved_at)
        .bind(assignment.tokens_awarded)
        .execute(&self.pool)
        .await
        .map_err(|err| match StoreError::from(err) {
            StoreError::Duplicate(_) => {
                StoreError::Duplicate("student already assigned to this task".into())
            }
            other => other,
        })?;
        Ok(())
    }

    async fn find_assignment(&self, id: Uuid) -> StoreResult<Option<TaskAssignment>> {
        let assignment = sqlx::query_as::<_, TaskAssignment>(&format!(
            "SELECT {} FROM task_assignments WHERE id = $1",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn find_assignment_for(
        &self,
        job_task_id: Uuid,
        student_id: i32,
    ) -> StoreResult<Option<TaskAssignment>> {
        let assignment = sqlx::query_as::<_, TaskAssignment>(&format!(
            "SELECT {} FROM task_assignments WHERE job_task_id = $1 AND student_id = $2",
            ASSIGNMENT_COLUMNS
        ))
        .bind(job_task_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
    ) -> StoreResult<Vec<AssignmentDetails>> {
        let (condition, id) = match filter {
            AssignmentFilter::Student(student_id) => ("a.student_id = $1", student_id),
            AssignmentFilter::Employer(employer_id) => ("t.employer_id = $1", employer_id),
        };
        let details = sqlx::query_as::<_, AssignmentDetails>(&format!(
            "{} WHERE {} ORDER BY a.requested_at DESC",
            ASSIGNMENT_DETAILS_SELECT, condition
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(details)
    }

    async fn update_assignment_if(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
    ) -> StoreResult<bool> {
        let result = update_lifecycle(assignment, expected)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn approve_assignment_if(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
    ) -> StoreResult<bool> {
        let tokens = assignment.tokens_awarded.ok_or_else(|| {
            StoreError::Persistence("approved assignment carries no token award".into())
        })?;

        let mut tx = self.pool.begin().await?;

        let updated = update_lifecycle(assignment, expected)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        let credited = sqlx::query(
            "UPDATE student_profiles SET token_balance = token_balance + $1 WHERE user_id = $2",
        )
        .bind(tokens)
        .bind(assignment.student_id)
        .execute(&mut *tx)
        .await?;
        if credited.rows_affected() != 1 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!(
                "student profile for user {}",
                assignment.student_id
            )));
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_assignment_if_retractable(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM task_assignments WHERE id = $1 AND status IN ('requested', 'accepted')",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Compare-and-set of the lifecycle columns on the expected status.
fn update_lifecycle(
    assignment: &TaskAssignment,
    expected: AssignmentStatus,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        "UPDATE task_assignments
         SET status = $2, accepted_at = $3, completed_at = $4, approved_at = $5, tokens_awarded = $6
         WHERE id = $1 AND status = $7",
    )
    .bind(assignment.id)
    .bind(assignment.status)
    .bind(assignment.accepted_at)
    .bind(assignment.completed_at)
    .bind(assignment.approved_at)
    .bind(assignment.tokens_awarded)
    .bind(expected)
}
