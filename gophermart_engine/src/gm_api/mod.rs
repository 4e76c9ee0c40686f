//! # Gophermart engine public API
//!
//! The APIs are modular, so that clients can pick and choose the functionality they want. Each API is created by
//! supplying a storage backend that implements the traits the API needs.
//!
//! * [`order_flow_api`] accepts new orders, applies withdrawals, and receives accrual results from the poller.
//! * [`accounts_api`] provides read-only access to a user's orders, balance and withdrawals.
//! * [`auth_api`] registers users and checks their credentials.
//!
//! ```rust,ignore
//! use gophermart_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/gophermart.db", 5).await?;
//! let api = AccountApi::new(db);
//! let balance = api.balance_for_user(user_id).await?;
//! ```
pub mod accounts_api;
pub mod auth_api;
pub mod errors;
pub mod order_flow_api;
