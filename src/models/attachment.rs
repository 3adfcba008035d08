use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    // No path separators or control characters; the name is shown to users and used in downloads.
    static ref FILE_NAME_REGEX: regex::Regex = regex::Regex::new(r"^[^/\\\x00-\x1f]+$").unwrap();
}

/// Metadata for a file that the storage service has already accepted.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AttachmentInput {
    #[validate(
        length(min = 1, max = 255),
        regex(
            path = "FILE_NAME_REGEX",
            message = "File name must not contain path separators or control characters"
        )
    )]
    pub file_name: String,
    #[validate(length(min = 1, max = 127))]
    pub content_type: String,
    #[validate(range(min = 0))]
    pub size_bytes: i32,
    /// Location returned by the object storage service.
    #[validate(url)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct TaskAttachment {
    pub id: Uuid,
    pub job_task_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i32,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl TaskAttachment {
    pub fn new(input: AttachmentInput, job_task_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_task_id,
            file_name: input.file_name,
            content_type: input.content_type,
            size_bytes: input.size_bytes,
            url: input.url,
            uploaded_at: now,
        }
    }
}
