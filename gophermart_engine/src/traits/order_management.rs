use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderRegistryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderNumber),
}

impl From<sqlx::Error> for OrderRegistryError {
    fn from(e: sqlx::Error) -> Self {
        OrderRegistryError::DatabaseError(e.to_string())
    }
}

/// The order registry.
///
/// Orders are created once, in status `NEW`, and are never deleted. Only the accrual poller changes an order's status,
/// and a terminal status (`PROCESSED` or `INVALID`) is never left again.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `NEW`.
    ///
    /// Order numbers are globally unique. If the number has already been claimed, by anyone, this returns
    /// [`OrderRegistryError::OrderAlreadyExists`]; the first writer wins.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderRegistryError>;

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError>;

    /// All orders belonging to `user_id`, most recently uploaded first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError>;

    /// All orders whose status is one of `statuses`, oldest first.
    async fn fetch_orders_by_status(&self, statuses: &[OrderStatusType]) -> Result<Vec<Order>, OrderRegistryError>;

    /// Moves a non-terminal order to `status`.
    ///
    /// Returns the updated order, or `None` if nothing changed: the order does not exist, already has `status`, or is
    /// already in a terminal state.
    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Option<Order>, OrderRegistryError>;
}
