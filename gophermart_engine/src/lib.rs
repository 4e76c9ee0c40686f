//! Gophermart Engine
//!
//! The Gophermart engine holds the core logic of a loyalty/cashback service: users upload order numbers, an external
//! accrual service decides how many points each order earns, and users spend those points by withdrawing them
//! against their orders.
//!
//! The library is divided into these sections:
//! 1. Storage ([`traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). Backends implement the
//!    [`OrderManagement`], [`BalanceLedger`] and [`UserManagement`] traits. The ledger owns the atomic
//!    lock-mutate-commit protocol that keeps balances consistent under concurrent requests.
//! 2. The public API (`OrderFlowApi`, `AccountApi`, `AuthApi`). This is what the HTTP server talks to.
//! 3. Accrual reconciliation ([`accrual`]). A pool of workers polls the accrual service for every order that has not
//!    reached a terminal status and pushes results back through the `OrderFlowApi`. A start-up sweep re-queues any
//!    orders that were still in flight when the process last stopped.
pub mod accrual;
pub mod db_types;
pub mod helpers;
mod gm_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use gm_api::{
    accounts_api::AccountApi,
    auth_api::AuthApi,
    errors::{AccountApiError, AuthApiError, OrderFlowError},
    order_flow_api::OrderFlowApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{BalanceLedger, LoyaltyDatabase, OrderManagement, UserManagement};
