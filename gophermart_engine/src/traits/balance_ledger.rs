use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Amount, Balance, Order, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("There is no balance for user #{0}")]
    BalanceNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Order {0} does not belong to user #{1}")]
    OrderOwnershipMismatch(OrderNumber, i64),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { available: Amount, requested: Amount },
    #[error("A withdrawal has already been made against order {0}")]
    DoubleWithdrawal(OrderNumber),
    #[error("Order {0} has already been finalized")]
    OrderAlreadyFinalized(OrderNumber),
    #[error("{0} is not a valid amount for this operation")]
    InvalidAmount(Amount),
    #[error("Arithmetic overflow while updating the balance")]
    ArithmeticOverflow,
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// A change to one user's balance, tied to one of their orders.
///
/// `apply` only touches the in-memory records. The ledger backend locks the rows, calls `apply`, and persists the
/// result in the same transaction, or rolls everything back if `apply` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMutation {
    /// Credit the accrual for an order the accrual service has processed. The order becomes `PROCESSED`.
    Accrue(Amount),
    /// Spend points against an order. Each order can carry one withdrawal only.
    Withdraw(Amount),
}

impl BalanceMutation {
    pub fn apply(&self, balance: &mut Balance, order: &mut Order, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match *self {
            BalanceMutation::Accrue(amount) => {
                if order.status.is_terminal() {
                    return Err(LedgerError::OrderAlreadyFinalized(order.number.clone()));
                }
                if amount < Amount::ZERO {
                    return Err(LedgerError::InvalidAmount(amount));
                }
                let current = balance.current.checked_add(amount).ok_or(LedgerError::ArithmeticOverflow)?;
                balance.current = current;
                order.accrual = amount;
                order.status = OrderStatusType::Processed;
            },
            BalanceMutation::Withdraw(amount) => {
                if !amount.is_positive() {
                    return Err(LedgerError::InvalidAmount(amount));
                }
                if balance.current < amount {
                    return Err(LedgerError::InsufficientBalance { available: balance.current, requested: amount });
                }
                if !order.withdrawal.is_zero() {
                    return Err(LedgerError::DoubleWithdrawal(order.number.clone()));
                }
                let current = balance.current.checked_sub(amount).ok_or(LedgerError::ArithmeticOverflow)?;
                let withdrawn = balance.withdrawn.checked_add(amount).ok_or(LedgerError::ArithmeticOverflow)?;
                balance.current = current;
                balance.withdrawn = withdrawn;
                order.withdrawal = amount;
                order.withdrawn_at = Some(now);
            },
        }
        balance.updated_at = now;
        order.updated_at = now;
        Ok(())
    }
}

/// The balance ledger.
///
/// Every balance change goes through [`BalanceLedger::update_balance_by_order`], which is the only place where
/// balances are written.
#[allow(async_fn_in_trait)]
pub trait BalanceLedger {
    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, LedgerError>;

    /// Applies `mutation` to the balance of `user_id` and the order `number` as a single atomic unit.
    ///
    /// 1. Begin a transaction.
    /// 2. Lock and read the user's balance. Concurrent mutators for the same user block here.
    /// 3. Lock and read the order. It must belong to `user_id`.
    /// 4. Apply the mutation in memory. On error, roll back and return the error unchanged.
    /// 5. Persist the order and balance, and commit.
    /// 6. Return the balance as read back after the commit.
    async fn update_balance_by_order(
        &self,
        user_id: i64,
        number: &OrderNumber,
        mutation: BalanceMutation,
    ) -> Result<Balance, LedgerError>;

    /// Orders of `user_id` that carry a withdrawal, most recent withdrawal first.
    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;
}
