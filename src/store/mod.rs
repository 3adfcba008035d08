//! Persistence port for profiles, job tasks, attachments and assignments.
//!
//! Lifecycle writes are compare-and-set on the assignment status: an
//! adapter must apply the write only if the stored status still equals the
//! expected one, and report whether it did. Approval additionally credits
//! the student's balance in the same atomic step.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AssignmentDetails, AssignmentStatus, EmployerProfile, JobTask, StudentProfile, TaskAssignment,
    TaskAttachment,
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("duplicate record: {0}")]
    Duplicate(String),
    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Backend failure.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Which job tasks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTaskFilter {
    All,
    OwnedBy(i32),
    /// Tasks whose deadline is after the given instant.
    OpenAt(DateTime<Utc>),
}

/// Which assignments to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentFilter {
    Student(i32),
    /// Assignments on tasks owned by this employer.
    Employer(i32),
}

#[async_trait]
pub trait SweepStore: Send + Sync {
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if the user already has a student profile.
    async fn insert_student_profile(&self, profile: &StudentProfile) -> StoreResult<()>;

    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if the user already has an employer profile.
    async fn insert_employer_profile(&self, profile: &EmployerProfile) -> StoreResult<()>;

    async fn find_student_profile(&self, user_id: i32) -> StoreResult<Option<StudentProfile>>;

    async fn find_employer_profile(&self, user_id: i32) -> StoreResult<Option<EmployerProfile>>;

    async fn insert_job_task(&self, task: &JobTask) -> StoreResult<()>;

    async fn find_job_task(&self, id: Uuid) -> StoreResult<Option<JobTask>>;

    /// Returns matching tasks ordered by deadline, soonest first.
    async fn list_job_tasks(&self, filter: JobTaskFilter) -> StoreResult<Vec<JobTask>>;

    /// Deletes the task and its attachments unless it has assignments.
    ///
    /// Returns `false` when nothing was deleted.
    async fn delete_job_task_if_unassigned(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_attachment(&self, attachment: &TaskAttachment) -> StoreResult<()>;

    /// Returns attachments of a task, oldest first.
    async fn list_attachments(&self, job_task_id: Uuid) -> StoreResult<Vec<TaskAttachment>>;

    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if the student is already assigned to the task.
    async fn insert_assignment(&self, assignment: &TaskAssignment) -> StoreResult<()>;

    async fn find_assignment(&self, id: Uuid) -> StoreResult<Option<TaskAssignment>>;

    async fn find_assignment_for(
        &self,
        job_task_id: Uuid,
        student_id: i32,
    ) -> StoreResult<Option<TaskAssignment>>;

    /// Returns matching assignments, most recently requested first.
    async fn list_assignments(&self, filter: AssignmentFilter)
        -> StoreResult<Vec<AssignmentDetails>>;

    /// Persists the lifecycle fields of `assignment` if the stored status is
    /// still `expected`. Returns whether the write happened.
    async fn update_assignment_if(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
    ) -> StoreResult<bool>;

    /// Like [`SweepStore::update_assignment_if`], and in the same atomic step
    /// adds `assignment.tokens_awarded` to the student's balance.
    async fn approve_assignment_if(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
    ) -> StoreResult<bool>;

    /// Deletes the assignment if it has not been completed.
    /// Returns whether a row was deleted.
    async fn delete_assignment_if_retractable(&self, id: Uuid) -> StoreResult<bool>;
}
