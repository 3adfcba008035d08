//! Task assignment lifecycle: assign, accept, complete, approve, unassign.
//!
//! Every transition reads the assignment, runs it through
//! [`TaskAssignment::apply`], and writes it back with a compare-and-set on
//! the status it was read with. A writer that loses a race re-reads the row
//! and reports the precondition that now fails, so a transition takes
//! effect at most once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::AppError;
use crate::models::{
    ApproveRequest, AssignRequest, AssignmentAction, AssignmentDetails, AssignmentStatus, JobTask,
    TaskAssignment,
};
use crate::store::{AssignmentFilter, SweepStore};

#[derive(Clone)]
pub struct AssignmentService {
    store: Arc<dyn SweepStore>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn SweepStore>) -> Self {
        Self { store }
    }

    /// Employer asks a student to take one of their tasks.
    pub async fn assign(
        &self,
        user: &AuthenticatedUser,
        request: AssignRequest,
        now: DateTime<Utc>,
    ) -> Result<TaskAssignment, AppError> {
        user.require(Role::Employer)?;
        let task = self.find_task(request.job_task_id).await?;
        ensure_owner(user, &task)?;
        if task.is_expired(now) {
            return Err(deadline_passed());
        }

        let student = self
            .store
            .find_student_profile(request.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".into()))?;
        if self
            .store
            .find_assignment_for(task.id, student.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "student already assigned to this task".into(),
            ));
        }
        if task.requires_experience && !student.has_experience {
            return Err(AppError::Conflict(
                "student does not meet the experience requirement".into(),
            ));
        }

        let assignment = TaskAssignment::new(task.id, student.user_id, now);
        // The unique (task, student) constraint turns a concurrent duplicate into a Conflict.
        self.store.insert_assignment(&assignment).await?;
        log::info!(
            "Employer {} assigned task {} to student {} (assignment {})",
            user.id,
            task.id,
            student.user_id,
            assignment.id
        );
        Ok(assignment)
    }

    /// Assigned student takes the task on, before its deadline.
    pub async fn accept(
        &self,
        user: &AuthenticatedUser,
        assignment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TaskAssignment, AppError> {
        user.require(Role::Student)?;
        let mut assignment = self.find(assignment_id).await?;
        ensure_assigned_student(user, &assignment)?;
        let task = self.find_task(assignment.job_task_id).await?;

        let expected = assignment.status;
        assignment.apply(AssignmentAction::Accept, now)?;
        if task.is_expired(now) {
            return Err(deadline_passed());
        }

        self.persist(&assignment, expected, AssignmentAction::Accept)
            .await?;
        log::info!("Student {} accepted assignment {}", user.id, assignment.id);
        Ok(assignment)
    }

    /// Assigned student reports the work as finished.
    pub async fn complete(
        &self,
        user: &AuthenticatedUser,
        assignment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TaskAssignment, AppError> {
        user.require(Role::Student)?;
        let mut assignment = self.find(assignment_id).await?;
        ensure_assigned_student(user, &assignment)?;

        let expected = assignment.status;
        assignment.apply(AssignmentAction::Complete, now)?;

        self.persist(&assignment, expected, AssignmentAction::Complete)
            .await?;
        log::info!("Student {} completed assignment {}", user.id, assignment.id);
        Ok(assignment)
    }

    /// Task owner signs off and credits the student's tokens in one atomic write.
    pub async fn approve(
        &self,
        user: &AuthenticatedUser,
        request: ApproveRequest,
        now: DateTime<Utc>,
    ) -> Result<TaskAssignment, AppError> {
        user.require(Role::Employer)?;
        let mut assignment = self.find(request.assignment_id).await?;
        let task = self.find_task(assignment.job_task_id).await?;
        ensure_owner(user, &task)?;
        request.validate()?;

        let tokens = request.tokens_awarded.unwrap_or_else(|| task.token_reward());
        let action = AssignmentAction::Approve { tokens };
        let expected = assignment.status;
        assignment.apply(action, now)?;

        let written = self
            .store
            .approve_assignment_if(&assignment, expected)
            .await
            .map_err(|err| {
                log::error!("Approval of assignment {} rolled back: {}", assignment.id, err);
                AppError::from(err)
            })?;
        if !written {
            return Err(self.lost_race(assignment.id, action).await);
        }
        log::info!(
            "Employer {} approved assignment {}; credited {} tokens to student {}",
            user.id,
            assignment.id,
            tokens,
            assignment.student_id
        );
        Ok(assignment)
    }

    /// Retracts an assignment that has not been completed yet.
    pub async fn unassign(&self, user: &AuthenticatedUser, assignment_id: Uuid) -> Result<(), AppError> {
        let assignment = self.find(assignment_id).await?;
        match user.role {
            Role::Admin => {}
            Role::Employer => {
                let task = self.find_task(assignment.job_task_id).await?;
                ensure_owner(user, &task)?;
            }
            Role::Student => {
                return Err(AppError::Forbidden(
                    "Only the task owner can unassign a student".into(),
                ))
            }
        }

        if !assignment.status.is_retractable() {
            log::debug!(
                "Refused to unassign assignment {} in status {}",
                assignment_id,
                assignment.status.as_str()
            );
            return Err(not_retractable());
        }
        if !self.store.delete_assignment_if_retractable(assignment_id).await? {
            // Changed since it was read: gone is NotFound, completed is a Conflict.
            let current = self.find(assignment_id).await?;
            log::debug!(
                "Assignment {} changed concurrently during unassign, now {}",
                assignment_id,
                current.status.as_str()
            );
            return Err(if current.status.is_retractable() {
                modified_concurrently()
            } else {
                not_retractable()
            });
        }
        log::info!("User {} unassigned assignment {}", user.id, assignment_id);
        Ok(())
    }

    pub async fn for_student(&self, user: &AuthenticatedUser) -> Result<Vec<AssignmentDetails>, AppError> {
        user.require(Role::Student)?;
        Ok(self
            .store
            .list_assignments(AssignmentFilter::Student(user.id))
            .await?)
    }

    pub async fn for_employer(&self, user: &AuthenticatedUser) -> Result<Vec<AssignmentDetails>, AppError> {
        user.require(Role::Employer)?;
        Ok(self
            .store
            .list_assignments(AssignmentFilter::Employer(user.id))
            .await?)
    }

    async fn find(&self, id: Uuid) -> Result<TaskAssignment, AppError> {
        self.store
            .find_assignment(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
    }

    async fn find_task(&self, id: Uuid) -> Result<JobTask, AppError> {
        self.store
            .find_job_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Job task not found".into()))
    }

    async fn persist(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
        action: AssignmentAction,
    ) -> Result<(), AppError> {
        if self.store.update_assignment_if(assignment, expected).await? {
            Ok(())
        } else {
            Err(self.lost_race(assignment.id, action).await)
        }
    }

    /// Explains why a compare-and-set found the row changed underneath it.
    async fn lost_race(&self, id: Uuid, action: AssignmentAction) -> AppError {
        log::debug!("Assignment {} changed concurrently during {:?}", id, action);
        match self.find(id).await {
            Ok(current) => match current.status.transition(action) {
                Err(err) => err.into(),
                Ok(_) => modified_concurrently(),
            },
            Err(err) => err,
        }
    }
}

fn ensure_owner(user: &AuthenticatedUser, task: &JobTask) -> Result<(), AppError> {
    if task.employer_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden("You do not own this job task".into()))
    }
}

fn ensure_assigned_student(user: &AuthenticatedUser, assignment: &TaskAssignment) -> Result<(), AppError> {
    if assignment.student_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You are not the student assigned to this task".into(),
        ))
    }
}

fn deadline_passed() -> AppError {
    AppError::Conflict("task deadline has passed".into())
}

fn not_retractable() -> AppError {
    AppError::Conflict("cannot unassign a completed assignment".into())
}

fn modified_concurrently() -> AppError {
    AppError::Conflict("assignment was modified concurrently, retry the request".into())
}
