//! User directory service: validation and orchestration over the repository.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, UserServiceError> {
        self.repo.list_users().await.map_err(UserServiceError::from)
    }

    pub async fn get(&self, id: i64) -> Result<Option<UserRecord>, UserServiceError> {
        self.repo.find_by_id(id).await.map_err(UserServiceError::from)
    }

    /// Inserts a new user. Both fields must be present and non-empty; the
    /// values are stored as submitted, without trimming or format checks.
    pub async fn create(&self, command: CreateUserCommand) -> Result<UserRecord, UserServiceError> {
        if command.name.is_empty() {
            return Err(UserServiceError::Validation("name must be non-empty"));
        }
        if command.email.is_empty() {
            return Err(UserServiceError::Validation("email must be non-empty"));
        }

        let params = CreateUserParams {
            name: command.name,
            email: command.email,
        };
        self.repo
            .create_user(params)
            .await
            .map_err(UserServiceError::from)
    }

    /// Replaces the email of one user. `Ok(None)` means the id did not match
    /// any row.
    pub async fn update_email(
        &self,
        id: i64,
        email: &str,
    ) -> Result<Option<UserRecord>, UserServiceError> {
        if email.is_empty() {
            return Err(UserServiceError::Validation("email must be non-empty"));
        }

        self.repo
            .update_email(id, email)
            .await
            .map_err(UserServiceError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        self.repo.delete_user(id).await.map_err(UserServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct CountingRepo {
        calls: AtomicUsize,
    }

    impl CountingRepo {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UsersRepo for CountingRepo {
        async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: i64) -> Result<Option<UserRecord>, RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(UserRecord {
                id: 1,
                name: params.name,
                email: params.email,
            })
        }

        async fn update_email(
            &self,
            id: i64,
            email: &str,
        ) -> Result<Option<UserRecord>, RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(UserRecord {
                id,
                name: "existing".to_string(),
                email: email.to_string(),
            }))
        }

        async fn delete_user(&self, _id: i64) -> Result<(), RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_rejects_empty_name_without_touching_the_repo() {
        let repo = Arc::new(CountingRepo::default());
        let service = UserService::new(repo.clone());

        let result = service
            .create(CreateUserCommand {
                name: String::new(),
                email: "a@b.c".to_string(),
            })
            .await;

        assert!(matches!(result, Err(UserServiceError::Validation(_))));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn create_rejects_empty_email_without_touching_the_repo() {
        let repo = Arc::new(CountingRepo::default());
        let service = UserService::new(repo.clone());

        let result = service
            .create(CreateUserCommand {
                name: "Ada".to_string(),
                email: String::new(),
            })
            .await;

        assert!(matches!(result, Err(UserServiceError::Validation(_))));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn create_passes_submitted_values_through_unchanged() {
        let repo = Arc::new(CountingRepo::default());
        let service = UserService::new(repo.clone());

        let record = service
            .create(CreateUserCommand {
                name: "  Ada ".to_string(),
                email: "ada@x.com".to_string(),
            })
            .await
            .expect("create");

        // Whitespace-only trimming is deliberately not performed.
        assert_eq!(record.name, "  Ada ");
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn update_rejects_empty_email_without_touching_the_repo() {
        let repo = Arc::new(CountingRepo::default());
        let service = UserService::new(repo.clone());

        let result = service.update_email(7, "").await;

        assert!(matches!(result, Err(UserServiceError::Validation(_))));
        assert_eq!(repo.calls(), 0);
    }
}
