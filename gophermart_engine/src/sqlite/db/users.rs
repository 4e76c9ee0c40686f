use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use super::map_unique_violation;
use crate::{
    db_types::{NewUser, User},
    traits::UserManagementError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserManagementError> {
    let login = user.login.clone();
    let user: User =
        sqlx::query_as("INSERT INTO users (login, password_hash, created_at) VALUES ($1, $2, $3) RETURNING *")
            .bind(user.login)
            .bind(user.password_hash)
            .bind(Utc::now())
            .fetch_one(conn)
            .await
            .map_err(|e| map_unique_violation(e, || UserManagementError::LoginTaken(login)))?;
    debug!("🗃️ User '{}' created with id {}", user.login, user.id);
    Ok(user)
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(user)
}
