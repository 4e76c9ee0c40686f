use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, User},
    gm_api::errors::AuthApiError,
    helpers::{hash_password, verify_password},
    traits::UserManagement,
};

pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Creates a new user with an empty balance. Logins are unique.
    pub async fn register(&self, login: &str, password: &str) -> Result<User, AuthApiError> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(AuthApiError::InvalidCredentials);
        }
        let password_hash = hash_password(password)?;
        let user = self.db.create_user(NewUser { login: login.to_string(), password_hash }).await?;
        info!("🔑️ Registered new user '{}' (#{})", user.login, user.id);
        Ok(user)
    }

    /// Checks the credentials. An unknown login and a wrong password produce the same error.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthApiError> {
        let user = self.db.fetch_user_by_login(login.trim()).await?.ok_or(AuthApiError::InvalidCredentials)?;
        if verify_password(password, &user.password_hash) {
            debug!("🔑️ User '{}' authenticated", user.login);
            Ok(user)
        } else {
            debug!("🔑️ Wrong password for user '{}'", user.login);
            Err(AuthApiError::InvalidCredentials)
        }
    }
}
