use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum UserManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
}

impl From<sqlx::Error> for UserManagementError {
    fn from(e: sqlx::Error) -> Self {
        UserManagementError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates the user and an empty balance for them in a single atomic transaction.
    async fn create_user(&self, user: NewUser) -> Result<User, UserManagementError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, UserManagementError>;
}
