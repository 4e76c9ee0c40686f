use chrono::{DateTime, Utc};
use gophermart_engine::db_types::{Amount, Balance, Order, OrderStatusType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// One entry of `GET /api/user/orders`. `accrual` is left out until there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Amount>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let accrual = (!order.accrual.is_zero()).then_some(order.accrual);
        Self { number: order.number.as_str().to_string(), status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub current: Amount,
    pub withdrawn: Amount,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self { current: balance.current, withdrawn: balance.withdrawn }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Amount,
}
