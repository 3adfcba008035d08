use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::Complexity;

/// Lifecycle state of a task assignment.
/// Corresponds to the `assignment_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    /// The employer has asked the student to take the task.
    Requested,
    /// The student has taken the task on.
    Accepted,
    /// The student reports the work as finished.
    Completed,
    /// The employer has signed off and tokens were credited.
    Approved,
}

/// A state-changing step requested on an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentAction {
    Accept,
    Complete,
    Approve { tokens: i32 },
}

/// Why a requested transition is not allowed from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("assignment already accepted")]
    AlreadyAccepted,
    #[error("assignment has not been accepted yet")]
    NotAccepted,
    #[error("assignment already completed")]
    AlreadyCompleted,
    #[error("assignment has not been completed yet")]
    NotCompleted,
    #[error("assignment already approved")]
    AlreadyApproved,
}

impl AssignmentStatus {
    /// The only place that decides whether a status may change.
    pub fn transition(self, action: AssignmentAction) -> Result<AssignmentStatus, TransitionError> {
        use AssignmentAction::*;
        use AssignmentStatus::*;

        match (self, action) {
            (Requested, Accept) => Ok(Accepted),
            (_, Accept) => Err(TransitionError::AlreadyAccepted),

            (Requested, Complete) => Err(TransitionError::NotAccepted),
            (Accepted, Complete) => Ok(Completed),
            (Completed | Approved, Complete) => Err(TransitionError::AlreadyCompleted),

            (Requested | Accepted, Approve { .. }) => Err(TransitionError::NotCompleted),
            (Completed, Approve { .. }) => Ok(Approved),
            (Approved, Approve { .. }) => Err(TransitionError::AlreadyApproved),
        }
    }

    /// An assignment can be retracted until the student reports it complete.
    pub fn is_retractable(self) -> bool {
        matches!(self, AssignmentStatus::Requested | AssignmentStatus::Accepted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Requested => "requested",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Approved => "approved",
        }
    }
}

/// The binding of one student to one job task.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct TaskAssignment {
    pub id: Uuid,
    pub job_task_id: Uuid,
    pub student_id: i32,
    pub status: AssignmentStatus,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Set only when the assignment is approved.
    pub tokens_awarded: Option<i32>,
}

impl TaskAssignment {
    /// Creates a freshly requested assignment.
    pub fn new(job_task_id: Uuid, student_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_task_id,
            student_id,
            status: AssignmentStatus::Requested,
            requested_at: now,
            accepted_at: None,
            completed_at: None,
            approved_at: None,
            tokens_awarded: None,
        }
    }

    /// Applies `action`, stamping the matching timestamp.
    ///
    /// Timestamps never go backwards: a stamp is at least the previous one,
    /// even if `now` is earlier.
    pub fn apply(&mut self, action: AssignmentAction, now: DateTime<Utc>) -> Result<(), TransitionError> {
        let next = self.status.transition(action)?;
        let stamp = now.max(self.latest_timestamp());
        match action {
            AssignmentAction::Accept => self.accepted_at = Some(stamp),
            AssignmentAction::Complete => self.completed_at = Some(stamp),
            AssignmentAction::Approve { tokens } => {
                self.approved_at = Some(stamp);
                self.tokens_awarded = Some(tokens);
            }
        }
        self.status = next;
        Ok(())
    }

    fn latest_timestamp(&self) -> DateTime<Utc> {
        self.approved_at
            .or(self.completed_at)
            .or(self.accepted_at)
            .unwrap_or(self.requested_at)
    }

    /// Checks that the timestamps agree with the status and never decrease.
    pub fn timestamps_consistent(&self) -> bool {
        let stamps = [self.accepted_at, self.completed_at, self.approved_at];
        let set = match self.status {
            AssignmentStatus::Requested => 0,
            AssignmentStatus::Accepted => 1,
            AssignmentStatus::Completed => 2,
            AssignmentStatus::Approved => 3,
        };
        let mut previous = self.requested_at;
        for (index, stamp) in stamps.iter().enumerate() {
            match (index < set, stamp) {
                (true, Some(stamp)) if *stamp >= previous => previous = *stamp,
                (false, None) => {}
                _ => return false,
            }
        }
        self.tokens_awarded.is_some() == (self.status == AssignmentStatus::Approved)
    }
}

/// Assignment joined with the task and student data the listing screens need.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct AssignmentDetails {
    pub id: Uuid,
    pub job_task_id: Uuid,
    pub student_id: i32,
    pub status: AssignmentStatus,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub tokens_awarded: Option<i32>,
    pub task_title: String,
    pub task_deadline: DateTime<Utc>,
    pub complexity: Complexity,
    pub employer_id: i32,
    pub student_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignRequest {
    pub job_task_id: Uuid,
    pub student_id: i32,
}

/// Body of the accept and complete endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignmentRef {
    pub assignment_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApproveRequest {
    pub assignment_id: Uuid,
    /// Defaults to the task's complexity reward when omitted.
    #[validate(range(min = 1, max = 500))]
    pub tokens_awarded: Option<i32>,
}
