//! `SqliteDatabase` is a concrete implementation of a Gophermart engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::{migrate, migrate::MigrateError, SqlitePool};

use super::db::{balances, new_pool, orders, users};
use crate::{
    db_types::{Balance, NewOrder, NewUser, Order, OrderNumber, OrderStatusType, User},
    traits::{
        BalanceLedger,
        BalanceMutation,
        LedgerError,
        LoyaltyDatabase,
        OrderManagement,
        OrderRegistryError,
        UserManagement,
        UserManagementError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Opens a connection pool to `url`, creating the database file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) {
        self.pool.close().await;
        info!("🗃️ Database connection pool closed");
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_orders_by_status(&self, statuses: &[OrderStatusType]) -> Result<Vec<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_by_status(statuses, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> Result<Option<Order>, OrderRegistryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(number, status, &mut conn).await?;
        match &order {
            Some(o) => debug!("🗃️ Order {number} moved to {}", o.status),
            None => trace!("🗃️ Order {number} was not moved to {status}. It is missing, unchanged or final"),
        }
        Ok(order)
    }
}

impl BalanceLedger for SqliteDatabase {
    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    /// Locks the balance, then the order, applies `mutation` and persists both, all in a single transaction.
    ///
    /// Any early return drops `tx` before it is committed, which rolls the transaction back.
    async fn update_balance_by_order(
        &self,
        user_id: i64,
        number: &OrderNumber,
        mutation: BalanceMutation,
    ) -> Result<Balance, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let mut balance = balances::lock_balance(user_id, &mut tx).await?.ok_or(LedgerError::BalanceNotFound(user_id))?;
        let mut order =
            orders::lock_order(number, &mut tx).await?.ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
        if order.user_id != user_id {
            return Err(LedgerError::OrderOwnershipMismatch(number.clone(), user_id));
        }
        trace!("🗃️ Applying {mutation:?} to order {number} and the balance of user #{user_id}");
        mutation.apply(&mut balance, &mut order, Utc::now())?;
        orders::save_ledger_fields(&order, &mut tx).await?;
        balances::save_balance(&balance, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {mutation:?} committed for order {number}");
        let mut conn = self.pool.acquire().await?;
        balances::fetch_balance(user_id, &mut conn).await?.ok_or(LedgerError::BalanceNotFound(user_id))
    }

    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, UserManagementError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        balances::create_balance(user.id, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, UserManagementError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_login(login, &mut conn).await?;
        Ok(user)
    }
}
