use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::Balance;

/// Creates an empty balance for a freshly created user.
pub async fn create_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Balance, sqlx::Error> {
    let balance = sqlx::query_as("INSERT INTO balances (user_id, updated_at) VALUES ($1, $2) RETURNING *")
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    Ok(balance)
}

pub async fn fetch_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance =
        sqlx::query_as("SELECT * FROM balances WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(balance)
}

/// Fetches the balance and takes the database write lock in the same statement. See
/// [`super::orders::lock_order`].
pub async fn lock_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as("UPDATE balances SET user_id = user_id WHERE user_id = $1 RETURNING *")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

pub async fn save_balance(balance: &Balance, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE balances SET current = $1, withdrawn = $2, updated_at = $3 WHERE user_id = $4")
        .bind(balance.current)
        .bind(balance.withdrawn)
        .bind(balance.updated_at)
        .bind(balance.user_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Balance for user #{} is now {} (withdrawn {})", balance.user_id, balance.current, balance.withdrawn);
    Ok(())
}
