pub mod assignment;
pub mod attachment;
pub mod job_task;
pub mod profile;

pub use assignment::{
    ApproveRequest, AssignRequest, AssignmentAction, AssignmentDetails, AssignmentRef,
    AssignmentStatus, TaskAssignment, TransitionError,
};
pub use attachment::{AttachmentInput, TaskAttachment};
pub use job_task::{Complexity, JobTask, JobTaskInput, JobTaskResponse};
pub use profile::{EmployerProfile, EmployerProfileInput, Profile, StudentProfile, StudentProfileInput};
