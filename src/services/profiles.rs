use chrono::{DateTime, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::AppError;
use crate::models::{
    EmployerProfile, EmployerProfileInput, Profile, StudentProfile, StudentProfileInput,
};
use crate::store::{StoreError, SweepStore};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn SweepStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn SweepStore>) -> Self {
        Self { store }
    }

    pub async fn create_student(
        &self,
        user: &AuthenticatedUser,
        input: StudentProfileInput,
        now: DateTime<Utc>,
    ) -> Result<StudentProfile, AppError> {
        user.require(Role::Student)?;
        input.validate()?;
        let profile = StudentProfile::new(user.id, input, now);
        self.store
            .insert_student_profile(&profile)
            .await
            .map_err(already_exists)?;
        log::info!("Created student profile for user {}", user.id);
        Ok(profile)
    }

    pub async fn create_employer(
        &self,
        user: &AuthenticatedUser,
        input: EmployerProfileInput,
        now: DateTime<Utc>,
    ) -> Result<EmployerProfile, AppError> {
        user.require(Role::Employer)?;
        input.validate()?;
        let profile = EmployerProfile::new(user.id, input, now);
        self.store
            .insert_employer_profile(&profile)
            .await
            .map_err(already_exists)?;
        log::info!("Created employer profile for user {}", user.id);
        Ok(profile)
    }

    pub async fn my_profile(&self, user: &AuthenticatedUser) -> Result<Profile, AppError> {
        let profile = match user.role {
            Role::Student => self
                .store
                .find_student_profile(user.id)
                .await?
                .map(Profile::Student),
            Role::Employer => self
                .store
                .find_employer_profile(user.id)
                .await?
                .map(Profile::Employer),
            Role::Admin => {
                return Err(AppError::NotFound(
                    "Admin accounts have no profile".into(),
                ))
            }
        };
        profile.ok_or_else(|| AppError::NotFound("Profile not found".into()))
    }
}

fn already_exists(error: StoreError) -> AppError {
    match error {
        StoreError::Duplicate(_) => AppError::Conflict("Profile already exists".into()),
        other => other.into(),
    }
}
