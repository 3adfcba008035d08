//! Business rules: role checks, ownership, and lifecycle preconditions.
//!
//! Services take the caller and the current time explicitly so every rule
//! can be exercised without a clock or a database.

pub mod assignments;
pub mod job_tasks;
pub mod profiles;

use std::sync::Arc;

use crate::store::SweepStore;

pub use assignments::AssignmentService;
pub use job_tasks::JobTaskService;
pub use profiles::ProfileService;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    pub job_tasks: JobTaskService,
    pub assignments: AssignmentService,
}

impl AppState {
    pub fn new(store: Arc<dyn SweepStore>) -> Self {
        Self {
            profiles: ProfileService::new(Arc::clone(&store)),
            job_tasks: JobTaskService::new(Arc::clone(&store)),
            assignments: AssignmentService::new(store),
        }
    }
}
