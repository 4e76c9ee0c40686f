use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::map_unique_violation;
use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    traits::OrderRegistryError,
};

/// Inserts a new order with status `NEW`. A number that already exists, for any user, is reported as
/// [`OrderRegistryError::OrderAlreadyExists`].
///
/// This is not atomic on its own. Embed the call in a transaction if you need it to be.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderRegistryError> {
    let number = order.number.clone();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (number, user_id, status, uploaded_at, updated_at)
            VALUES ($1, $2, 'NEW', $3, $3)
            RETURNING *;
        "#,
    )
    .bind(order.number)
    .bind(order.user_id)
    .bind(order.uploaded_at)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, || OrderRegistryError::OrderAlreadyExists(number)))?;
    debug!("📝️ Order {} inserted with id {} for user #{}", order.number, order.id, order.user_id);
    Ok(order)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the order and takes the database write lock in the same statement.
///
/// The self-assignment is a no-op write. Within a transaction it stops any other writer from touching the order
/// until the transaction ends.
pub async fn lock_order(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET number = number WHERE number = $1 RETURNING *")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        "SELECT * FROM orders WHERE user_id = $1 AND withdrawn_at IS NOT NULL ORDER BY withdrawn_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Fetches all orders with any of the given statuses, oldest first.
pub async fn fetch_orders_by_status(
    statuses: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE status IN (");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(*status);
    }
    list.push_unseparated(") ORDER BY uploaded_at ASC, id ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Sets the status of a non-terminal order. Returns `None` if the order does not exist, already has the requested
/// status, or has already reached a terminal status.
pub async fn update_order_status(
    number: &OrderNumber,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = $2
            WHERE number = $3 AND status != $1 AND status IN ('NEW', 'PROCESSING')
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(number.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Persists the fields that the balance ledger is allowed to change on an order.
pub async fn save_ledger_fields(order: &Order, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE orders SET status = $1, accrual = $2, withdrawal = $3, withdrawn_at = $4, updated_at = $5
            WHERE id = $6
        "#,
    )
    .bind(order.status)
    .bind(order.accrual)
    .bind(order.withdrawal)
    .bind(order.withdrawn_at)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(conn)
    .await?;
    trace!("📝️ Order {} now has status {}, accrual {}, withdrawal {}", order.number, order.status, order.accrual, order.withdrawal);
    Ok(())
}
