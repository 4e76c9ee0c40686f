use thiserror::Error;

use crate::{
    accrual::AccrualQueueClosed,
    db_types::{Amount, OrderNumber},
    helpers::PasswordHashError,
    traits::{LedgerError, OrderRegistryError, UserManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order number {0} is not valid")]
    OrderBadNumber(String),
    #[error("Order {0} has already been uploaded by this user")]
    OrderAlreadyAcceptedByUser(OrderNumber),
    #[error("Order {0} has already been uploaded by another user")]
    OrderAlreadyAcceptedByAnotherUser(OrderNumber),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("There is no balance for user #{0}")]
    BalanceNotFound(i64),
    #[error("Insufficient balance. Requested {requested}, but only {available} is available")]
    InsufficientBalance { available: Amount, requested: Amount },
    #[error("A withdrawal has already been made against order {0}")]
    DoubleWithdrawal(OrderNumber),
    #[error("Order {0} has already been finalized")]
    OrderAlreadyFinalized(OrderNumber),
    #[error("{0} is not a valid amount")]
    InvalidAmount(Amount),
    #[error("Arithmetic overflow while updating the balance")]
    ArithmeticOverflow,
    #[error("The accrual queue has shut down")]
    QueueClosed,
}

impl From<OrderRegistryError> for OrderFlowError {
    fn from(e: OrderRegistryError) -> Self {
        match e {
            OrderRegistryError::DatabaseError(s) => Self::DatabaseError(s),
            OrderRegistryError::OrderAlreadyExists(n) => Self::OrderAlreadyAcceptedByAnotherUser(n),
        }
    }
}

impl From<LedgerError> for OrderFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
            LedgerError::BalanceNotFound(id) => Self::BalanceNotFound(id),
            LedgerError::OrderNotFound(n) => Self::OrderNotFound(n),
            LedgerError::OrderOwnershipMismatch(n, _) => Self::OrderBadNumber(n.as_str().to_string()),
            LedgerError::InsufficientBalance { available, requested } => {
                Self::InsufficientBalance { available, requested }
            },
            LedgerError::DoubleWithdrawal(n) => Self::DoubleWithdrawal(n),
            LedgerError::OrderAlreadyFinalized(n) => Self::OrderAlreadyFinalized(n),
            LedgerError::InvalidAmount(a) => Self::InvalidAmount(a),
            LedgerError::ArithmeticOverflow => Self::ArithmeticOverflow,
        }
    }
}

impl From<AccrualQueueClosed> for OrderFlowError {
    fn from(_: AccrualQueueClosed) -> Self {
        Self::QueueClosed
    }
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("There is no balance for user #{0}")]
    BalanceNotFound(i64),
}

impl From<OrderRegistryError> for AccountApiError {
    fn from(e: OrderRegistryError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<LedgerError> for AccountApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::BalanceNotFound(id) => Self::BalanceNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("{0}")]
    PasswordHashError(#[from] PasswordHashError),
}

impl From<UserManagementError> for AuthApiError {
    fn from(e: UserManagementError) -> Self {
        match e {
            UserManagementError::DatabaseError(s) => Self::DatabaseError(s),
            UserManagementError::LoginTaken(login) => Self::LoginTaken(login),
        }
    }
}
