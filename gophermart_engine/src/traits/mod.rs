//! # Storage contracts
//!
//! This module defines the behaviour that a storage backend needs to expose in order to be supported by the
//! Gophermart engine.
//!
//! * [`OrderManagement`] is the order registry: creating orders, looking them up by number, owner or status, and
//!   moving them through the `NEW -> PROCESSING -> PROCESSED | INVALID` lifecycle.
//! * [`BalanceLedger`] owns user balances and the atomic update protocol that applies accruals and withdrawals.
//! * [`UserManagement`] stores user credentials and creates each user's balance alongside the user record.
//! * [`LoyaltyDatabase`] bundles all of the above for backends that provide the full set.
mod balance_ledger;
mod loyalty_database;
mod order_management;
mod user_management;

pub use balance_ledger::{BalanceLedger, BalanceMutation, LedgerError};
pub use loyalty_database::LoyaltyDatabase;
pub use order_management::{OrderManagement, OrderRegistryError};
pub use user_management::{UserManagement, UserManagementError};
