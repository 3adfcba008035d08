use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct StudentProfile {
    pub user_id: i32,
    pub full_name: String,
    pub has_experience: bool,
    /// Only ever increased, by approved assignments.
    pub token_balance: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct EmployerProfile {
    pub user_id: i32,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StudentProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[serde(default)]
    pub has_experience: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EmployerProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub company_name: String,
}

/// The caller's own profile, tagged by kind.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    Student(StudentProfile),
    Employer(EmployerProfile),
}

impl StudentProfile {
    pub fn new(user_id: i32, input: StudentProfileInput, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            full_name: input.full_name,
            has_experience: input.has_experience,
            token_balance: 0,
            created_at: now,
        }
    }
}

impl EmployerProfile {
    pub fn new(user_id: i32, input: EmployerProfileInput, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            company_name: input.company_name,
            created_at: now,
        }
    }
}
