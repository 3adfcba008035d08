//! Bearer-token authentication.
//!
//! Tokens are issued by the identity service and carry the user id and
//! [`Role`]. This module verifies them ([`AuthMiddleware`]) and exposes the
//! caller to handlers ([`AuthenticatedUser`]).

pub mod extractors;
pub mod middleware;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use token::{generate_token, verify_token, Claims};

/// The kind of account behind a token.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }
}

impl AuthenticatedUser {
    /// Fails with `Forbidden` unless the caller has exactly `role`.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "This action requires the {} role",
                role.as_str()
            )))
        }
    }
}
