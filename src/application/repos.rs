//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// All rows, in whatever order the store returns them.
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    /// Inserts one row and returns it with the store-assigned id.
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    /// Updates the email of one row. `None` means no row carried that id.
    async fn update_email(&self, id: i64, email: &str) -> Result<Option<UserRecord>, RepoError>;

    /// Unconditional delete; removing an absent id is not an error.
    async fn delete_user(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
