//! Authentication collaborator: password hashing, bearer tokens and the
//! account operations built on them.

mod password;
mod service;
mod token;

pub use password::{hash_password, verify_password};
pub use service::AuthService;
pub use token::{Claims, TokenService};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token is required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    WeakPassword(String),

    #[error("{0}")]
    InvalidEmail(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}
