use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Difficulty tier of a task; fixes the default token reward.
/// Corresponds to the `task_complexity` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_complexity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

impl Complexity {
    /// Tokens credited for an approved task of this tier.
    pub const fn token_reward(self) -> i32 {
        match self {
            Complexity::Easy => 75,
            Complexity::Medium => 100,
            Complexity::Hard => 150,
        }
    }
}

/// Input structure for posting a job task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct JobTaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 2000 characters if provided.
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub deadline: DateTime<Utc>,

    pub complexity: Complexity,

    #[serde(default)]
    pub requires_experience: bool,

    /// Optional monetary compensation on top of the token reward.
    #[validate(range(min = 0))]
    pub compensation_cents: Option<i32>,
}

/// A unit of work posted by an employer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct JobTask {
    pub id: Uuid,
    pub employer_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub complexity: Complexity,
    pub requires_experience: bool,
    pub compensation_cents: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl JobTask {
    pub fn new(input: JobTaskInput, employer_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            employer_id,
            title: input.title,
            description: input.description,
            deadline: input.deadline,
            complexity: input.complexity,
            requires_experience: input.requires_experience,
            compensation_cents: input.compensation_cents,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline <= now
    }

    pub fn token_reward(&self) -> i32 {
        self.complexity.token_reward()
    }
}

/// API representation of a job task, carrying the derived token reward.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JobTaskResponse {
    #[serde(flatten)]
    pub task: JobTask,
    pub token_reward: i32,
}

impl From<JobTask> for JobTaskResponse {
    fn from(task: JobTask) -> Self {
        let token_reward = task.token_reward();
        Self { task, token_reward }
    }
}
