use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use gm_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn;

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The external identifier of an order. Globally unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn new<S: Into<String>>(number: S) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the number is made of digits only and passes the Luhn checksum.
    pub fn is_valid(&self) -> bool {
        luhn::is_valid(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been uploaded, but the accrual service has not reported on it yet.
    New,
    /// The accrual service knows about the order and is still calculating the reward.
    Processing,
    /// The accrual has been calculated and credited to the owner's balance. Terminal.
    Processed,
    /// The accrual service rejected the order. Terminal.
    Invalid,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Invalid)
    }

    /// The statuses that still need to be resolved against the accrual service.
    pub fn unfinished() -> [OrderStatusType; 2] {
        [Self::New, Self::Processing]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Processing => "PROCESSING",
            Self::Processed => "PROCESSED",
            Self::Invalid => "INVALID",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "PROCESSED" => Ok(Self::Processed),
            "INVALID" => Ok(Self::Invalid),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    /// The owner. Never changes after the order is created.
    pub user_id: i64,
    pub status: OrderStatusType,
    /// Credited once the order is `PROCESSED`; zero otherwise.
    pub accrual: Amount,
    /// Debited against this order. Set at most once.
    pub withdrawal: Amount,
    pub uploaded_at: DateTime<Utc>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: i64) -> Self {
        Self { number, user_id, uploaded_at: Utc::now() }
    }
}

//--------------------------------------       Balance       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Balance {
    pub user_id: i64,
    /// Spendable points. Never negative.
    pub current: Amount,
    /// Lifetime total of withdrawals.
    pub withdrawn: Amount,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Withdrawal     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Withdrawal {
    pub order: OrderNumber,
    pub sum: Amount,
    pub processed_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Extracts the withdrawal recorded against `order`, if there is one.
    pub fn from_order(order: &Order) -> Option<Self> {
        if order.withdrawal.is_zero() {
            return None;
        }
        let processed_at = order.withdrawn_at.unwrap_or(order.updated_at);
        Some(Self { order: order.number.clone(), sum: order.withdrawal, processed_at })
    }
}

//--------------------------------------         User        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
}
