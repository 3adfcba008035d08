//! In-memory store for tests and database-free local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{AssignmentFilter, JobTaskFilter, StoreError, StoreResult, SweepStore};
use crate::models::{
    AssignmentDetails, AssignmentStatus, EmployerProfile, JobTask, StudentProfile, TaskAssignment,
    TaskAttachment,
};

/// Thread-safe in-memory store. Every operation runs under one lock, so
/// compare-and-set writes and the approval credit are atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    students: HashMap<i32, StudentProfile>,
    employers: HashMap<i32, EmployerProfile>,
    tasks: HashMap<Uuid, JobTask>,
    attachments: Vec<TaskAttachment>,
    assignments: HashMap<Uuid, TaskAssignment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|err| StoreError::Persistence(err.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|err| StoreError::Persistence(err.to_string()))
    }
}

impl State {
    fn details(&self, assignment: &TaskAssignment) -> Option<AssignmentDetails> {
        let task = self.tasks.get(&assignment.job_task_id)?;
        let student = self.students.get(&assignment.student_id)?;
        Some(AssignmentDetails {
            id: assignment.id,
            job_task_id: assignment.job_task_id,
            student_id: assignment.student_id,
            status: assignment.status,
            requested_at: assignment.requested_at,
            accepted_at: assignment.accepted_at,
            completed_at: assignment.completed_at,
            approved_at: assignment.approved_at,
            tokens_awarded: assignment.tokens_awarded,
            task_title: task.title.clone(),
            task_deadline: task.deadline,
            complexity: task.complexity,
            employer_id: task.employer_id,
            student_name: student.full_name.clone(),
        })
    }

    /// Overwrites the lifecycle fields if the stored status matches.
    fn compare_and_set(&mut self, assignment: &TaskAssignment, expected: AssignmentStatus) -> bool {
        match self.assignments.get_mut(&assignment.id) {
            Some(stored) if stored.status == expected => {
                stored.status = assignment.status;
                stored.accepted_at = assignment.accepted_at;
                stored.completed_at = assignment.completed_at;
                stored.approved_at = assignment.approved_at;
                stored.tokens_awarded = assignment.tokens_awarded;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl SweepStore for InMemoryStore {
    async fn insert_student_profile(&self, profile: &StudentProfile) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.students.contains_key(&profile.user_id) {
            return Err(StoreError::Duplicate(format!(
                "student profile for user {}",
                profile.user_id
            )));
        }
        state.students.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn insert_employer_profile(&self, profile: &EmployerProfile) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.employers.contains_key(&profile.user_id) {
            return Err(StoreError::Duplicate(format!(
                "employer profile for user {}",
                profile.user_id
            )));
        }
        state.employers.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn find_student_profile(&self, user_id: i32) -> StoreResult<Option<StudentProfile>> {
        Ok(self.read()?.students.get(&user_id).cloned())
    }

    async fn find_employer_profile(&self, user_id: i32) -> StoreResult<Option<EmployerProfile>> {
        Ok(self.read()?.employers.get(&user_id).cloned())
    }

    async fn insert_job_task(&self, task: &JobTask) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.employers.contains_key(&task.employer_id) {
            return Err(StoreError::NotFound(format!(
                "employer profile for user {}",
                task.employer_id
            )));
        }
        state.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_job_task(&self, id: Uuid) -> StoreResult<Option<JobTask>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list_job_tasks(&self, filter: JobTaskFilter) -> StoreResult<Vec<JobTask>> {
        let state = self.read()?;
        let mut tasks: Vec<JobTask> = state
            .tasks
            .values()
            .filter(|task| match filter {
                JobTaskFilter::All => true,
                JobTaskFilter::OwnedBy(employer_id) => task.employer_id == employer_id,
                JobTaskFilter::OpenAt(now) => task.deadline > now,
            })
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.deadline);
        Ok(tasks)
    }

    async fn delete_job_task_if_unassigned(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let assigned = state.assignments.values().any(|a| a.job_task_id == id);
        if assigned || state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        state.attachments.retain(|a| a.job_task_id != id);
        Ok(true)
    }

    async fn insert_attachment(&self, attachment: &TaskAttachment) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&attachment.job_task_id) {
            return Err(StoreError::NotFound(format!(
                "job task {}",
                attachment.job_task_id
            )));
        }
        state.attachments.push(attachment.clone());
        Ok(())
    }

    async fn list_attachments(&self, job_task_id: Uuid) -> StoreResult<Vec<TaskAttachment>> {
        let state = self.read()?;
        let mut attachments: Vec<TaskAttachment> = state
            .attachments
            .iter()
            .filter(|a| a.job_task_id == job_task_id)
            .cloned()
            .collect();
        attachments.sort_by_key(|a| a.uploaded_at);
        Ok(attachments)
    }

    async fn insert_assignment(&self, assignment: &TaskAssignment) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&assignment.job_task_id) {
            return Err(StoreError::NotFound(format!(
                "job task {}",
                assignment.job_task_id
            )));
        }
        if !state.students.contains_key(&assignment.student_id) {
            return Err(StoreError::NotFound(format!(
                "student profile for user {}",
                assignment.student_id
            )));
        }
        let duplicate = state.assignments.values().any(|a| {
            a.job_task_id == assignment.job_task_id && a.student_id == assignment.student_id
        });
        if duplicate {
            return Err(StoreError::Duplicate(
                "student already assigned to this task".into(),
            ));
        }
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn find_assignment(&self, id: Uuid) -> StoreResult<Option<TaskAssignment>> {
        Ok(self.read()?.assignments.get(&id).cloned())
    }

    async fn find_assignment_for(
        &self,
        job_task_id: Uuid,
        student_id: i32,
    ) -> StoreResult<Option<TaskAssignment>> {
        Ok(self
            .read()?
            .assignments
            .values()
            .find(|a| a.job_task_id == job_task_id && a.student_id == student_id)
            .cloned())
    }

    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
    ) -> StoreResult<Vec<AssignmentDetails>> {
        let state = self.read()?;
        let mut details: Vec<AssignmentDetails> = state
            .assignments
            .values()
            .filter_map(|a| state.details(a))
            .filter(|d| match filter {
                AssignmentFilter::Student(student_id) => d.student_id == student_id,
                AssignmentFilter::Employer(employer_id) => d.employer_id == employer_id,
            })
            .collect();
        details.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(details)
    }

    async fn update_assignment_if(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
    ) -> StoreResult<bool> {
        Ok(self.write()?.compare_and_set(assignment, expected))
    }

    async fn approve_assignment_if(
        &self,
        assignment: &TaskAssignment,
        expected: AssignmentStatus,
    ) -> StoreResult<bool> {
        let tokens = assignment.tokens_awarded.ok_or_else(|| {
            StoreError::Persistence("approved assignment carries no token award".into())
        })?;
        let mut state = self.write()?;
        let balance = match state.students.get(&assignment.student_id) {
            Some(student) => student.token_balance,
            None => {
                return Err(StoreError::NotFound(format!(
                    "student profile for user {}",
                    assignment.student_id
                )))
            }
        };
        let stale = state
            .assignments
            .get(&assignment.id)
            .map_or(true, |stored| stored.status != expected);
        if stale {
            return Ok(false);
        }
        // Checked before any write so an overflow leaves both rows untouched.
        let credited = balance.checked_add(tokens).ok_or_else(|| {
            StoreError::Persistence(format!(
                "token balance of user {} would overflow",
                assignment.student_id
            ))
        })?;
        state.compare_and_set(assignment, expected);
        if let Some(student) = state.students.get_mut(&assignment.student_id) {
            student.token_balance = credited;
        }
        Ok(true)
    }

    async fn delete_assignment_if_retractable(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.assignments.get(&id) {
            Some(a) if a.status.is_retractable() => {
                state.assignments.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AssignmentAction, Complexity, EmployerProfileInput, JobTaskInput, StudentProfileInput,
    };
    use chrono::{Duration, Utc};

    async fn seeded() -> (InMemoryStore, JobTask) {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .insert_employer_profile(&EmployerProfile::new(
                1,
                EmployerProfileInput {
                    company_name: "Acme".into(),
                },
                now,
            ))
            .await
            .unwrap();
        store
            .insert_student_profile(&StudentProfile::new(
                5,
                StudentProfileInput {
                    full_name: "Ada".into(),
                    has_experience: false,
                },
                now,
            ))
            .await
            .unwrap();
        let task = JobTask::new(
            JobTaskInput {
                title: "Logo".into(),
                description: None,
                deadline: now + Duration::days(3),
                complexity: Complexity::Easy,
                requires_experience: false,
                compensation_cents: None,
            },
            1,
            now,
        );
        store.insert_job_task(&task).await.unwrap();
        (store, task)
    }

    #[actix_rt::test]
    async fn test_duplicate_assignment_rejected() {
        let (store, task) = seeded().await;
        let now = Utc::now();
        store
            .insert_assignment(&TaskAssignment::new(task.id, 5, now))
            .await
            .unwrap();
        let err = store
            .insert_assignment(&TaskAssignment::new(task.id, 5, now))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[actix_rt::test]
    async fn test_compare_and_set_rejects_stale_status() {
        let (store, task) = seeded().await;
        let original = TaskAssignment::new(task.id, 5, Utc::now());
        store.insert_assignment(&original).await.unwrap();

        let mut accepted = original.clone();
        accepted.apply(AssignmentAction::Accept, Utc::now()).unwrap();
        assert!(store
            .update_assignment_if(&accepted, AssignmentStatus::Requested)
            .await
            .unwrap());
        // Second writer still believes the row is Requested.
        assert!(!store
            .update_assignment_if(&accepted, AssignmentStatus::Requested)
            .await
            .unwrap());
    }

    #[actix_rt::test]
    async fn test_balance_overflow_rejects_approval() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .insert_employer_profile(&EmployerProfile::new(
                1,
                EmployerProfileInput {
                    company_name: "Acme".into(),
                },
                now,
            ))
            .await
            .unwrap();
        let mut rich = StudentProfile::new(
            5,
            StudentProfileInput {
                full_name: "Ada".into(),
                has_experience: false,
            },
            now,
        );
        rich.token_balance = i32::MAX - 10;
        store.insert_student_profile(&rich).await.unwrap();
        let task = JobTask::new(
            JobTaskInput {
                title: "Logo".into(),
                description: None,
                deadline: now + Duration::days(3),
                complexity: Complexity::Easy,
                requires_experience: false,
                compensation_cents: None,
            },
            1,
            now,
        );
        store.insert_job_task(&task).await.unwrap();

        let mut assignment = TaskAssignment::new(task.id, 5, now);
        assignment.status = AssignmentStatus::Completed;
        assignment.accepted_at = Some(now);
        assignment.completed_at = Some(now);
        store.insert_assignment(&assignment).await.unwrap();

        let mut approved = assignment.clone();
        approved
            .apply(AssignmentAction::Approve { tokens: 40 }, now)
            .unwrap();
        let err = store
            .approve_assignment_if(&approved, AssignmentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));

        let stored = store.find_assignment(assignment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AssignmentStatus::Completed);
        assert_eq!(stored.tokens_awarded, None);
        let student = store.find_student_profile(5).await.unwrap().unwrap();
        assert_eq!(student.token_balance, i32::MAX - 10);
    }

    #[actix_rt::test]
    async fn test_task_with_assignment_not_deleted() {
        let (store, task) = seeded().await;
        store
            .insert_assignment(&TaskAssignment::new(task.id, 5, Utc::now()))
            .await
            .unwrap();
        assert!(!store.delete_job_task_if_unassigned(task.id).await.unwrap());
        assert!(store.find_job_task(task.id).await.unwrap().is_some());
    }
}
