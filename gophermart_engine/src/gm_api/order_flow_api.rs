use std::fmt::Debug;

use log::*;

use crate::{
    accrual::AccrualQueue,
    db_types::{Amount, Balance, NewOrder, Order, OrderNumber, OrderStatusType},
    gm_api::errors::OrderFlowError,
    traits::{BalanceLedger, BalanceMutation, OrderManagement, OrderRegistryError},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: it accepts uploaded orders and hands them to the accrual
/// poller, applies withdrawals, and receives accrual results back from the poller.
#[derive(Clone)]
pub struct OrderFlowApi<B> {
    db: B,
    queue: AccrualQueue,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, queue: AccrualQueue) -> Self {
        Self { db, queue }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Accepts an order uploaded by `user_id` and queues it for accrual polling.
    ///
    /// * The number must pass the Luhn check, or [`OrderFlowError::OrderBadNumber`] is returned.
    /// * If the same user uploaded the number before, [`OrderFlowError::OrderAlreadyAcceptedByUser`] is returned. This
    ///   is an idempotent re-submission, not a failure.
    /// * If another user owns the number, [`OrderFlowError::OrderAlreadyAcceptedByAnotherUser`] is returned. This
    ///   includes losing an insert race for the same number.
    ///
    /// Otherwise, the order is stored as `NEW` and enqueued exactly once. The enqueue waits if the queue is full,
    /// and completes even if this future is dropped.
    pub async fn create_order(&self, user_id: i64, number: OrderNumber) -> Result<Order, OrderFlowError> {
        if !number.is_valid() {
            debug!("🔄️📦️ Order number {number} failed the Luhn check");
            return Err(OrderFlowError::OrderBadNumber(number.as_str().to_string()));
        }
        if let Some(existing) = self.db.fetch_order(&number).await? {
            return if existing.user_id == user_id {
                Err(OrderFlowError::OrderAlreadyAcceptedByUser(number))
            } else {
                Err(OrderFlowError::OrderAlreadyAcceptedByAnotherUser(number))
            };
        }
        let order = self.db.insert_order(NewOrder::new(number.clone(), user_id)).await.map_err(|e| match e {
            OrderRegistryError::OrderAlreadyExists(n) => {
                info!("🔄️📦️ Lost the race to insert order {n}. Another upload got there first");
                OrderFlowError::OrderAlreadyAcceptedByAnotherUser(n)
            },
            e => e.into(),
        })?;
        self.queue.enqueue(number).await?;
        debug!("🔄️📦️ Order {} accepted for user #{user_id} and queued for accrual", order.number);
        Ok(order)
    }

    /// Moves an order to `status`. Unknown orders, unchanged statuses and terminal orders are left alone.
    pub async fn update_order_status(&self, number: &OrderNumber, status: OrderStatusType) -> Result<(), OrderFlowError> {
        match self.db.update_order_status(number, status).await? {
            Some(_) => debug!("🔄️ Order {number} is now {status}"),
            None => trace!("🔄️ Order {number} status not changed to {status}"),
        }
        Ok(())
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + BalanceLedger
{
    /// Spends `amount` points from the balance of `user_id` against one of their orders.
    ///
    /// The order must already exist and belong to `user_id`; anything else is reported as
    /// [`OrderFlowError::OrderBadNumber`]. Returns the balance after the withdrawal.
    pub async fn withdraw(&self, user_id: i64, number: OrderNumber, amount: Amount) -> Result<Balance, OrderFlowError> {
        if !amount.is_positive() {
            return Err(OrderFlowError::InvalidAmount(amount));
        }
        if !number.is_valid() {
            return Err(OrderFlowError::OrderBadNumber(number.as_str().to_string()));
        }
        match self.db.fetch_order(&number).await? {
            Some(order) if order.user_id == user_id => {},
            _ => {
                debug!("🔄️💸️ User #{user_id} tried to withdraw against order {number}, which is not theirs");
                return Err(OrderFlowError::OrderBadNumber(number.as_str().to_string()));
            },
        }
        let balance = self.db.update_balance_by_order(user_id, &number, BalanceMutation::Withdraw(amount)).await?;
        info!("🔄️💸️ User #{user_id} withdrew {amount} against order {number}. {} left", balance.current);
        Ok(balance)
    }

    /// Credits the accrual for a processed order to its owner and marks the order `PROCESSED`.
    pub async fn accrue_external(&self, number: &OrderNumber, amount: Amount) -> Result<Balance, OrderFlowError> {
        let order = self.db.fetch_order(number).await?.ok_or_else(|| OrderFlowError::OrderNotFound(number.clone()))?;
        let balance = self.db.update_balance_by_order(order.user_id, number, BalanceMutation::Accrue(amount)).await?;
        info!("🔄️💰️ Order {number} accrued {amount} for user #{}. Balance is {}", order.user_id, balance.current);
        Ok(balance)
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_updater {
    use super::*;
    use crate::{accrual::AccrualUpdater, SqliteDatabase};

    impl AccrualUpdater for OrderFlowApi<SqliteDatabase> {
        async fn accrue_external(&self, number: &OrderNumber, amount: Amount) -> Result<(), OrderFlowError> {
            OrderFlowApi::accrue_external(self, number, amount).await.map(|_| ())
        }

        async fn update_order_status(&self, number: &OrderNumber, status: OrderStatusType) -> Result<(), OrderFlowError> {
            OrderFlowApi::update_order_status(self, number, status).await
        }
    }
}
