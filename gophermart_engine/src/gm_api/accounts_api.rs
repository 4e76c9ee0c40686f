//! Read-only views of a user's orders, balance and withdrawal history.

use std::fmt::Debug;

use crate::{
    db_types::{Balance, Order, Withdrawal},
    gm_api::errors::AccountApiError,
    traits::{BalanceLedger, OrderManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where B: OrderManagement
{
    /// All orders uploaded by `user_id`, most recent first. An empty list is not an error.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }
}

impl<B> AccountApi<B>
where B: BalanceLedger
{
    /// Every registered user has a balance, so a missing one is reported as [`AccountApiError::BalanceNotFound`].
    pub async fn balance_for_user(&self, user_id: i64) -> Result<Balance, AccountApiError> {
        self.db.fetch_balance(user_id).await?.ok_or(AccountApiError::BalanceNotFound(user_id))
    }

    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let orders = self.db.fetch_withdrawals(user_id).await?;
        Ok(orders.iter().filter_map(Withdrawal::from_order).collect())
    }
}
