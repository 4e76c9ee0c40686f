use crate::traits::{BalanceLedger, OrderManagement, UserManagement};

/// The full set of storage behaviour needed to run a Gophermart server.
#[allow(async_fn_in_trait)]
pub trait LoyaltyDatabase: Clone + OrderManagement + BalanceLedger + UserManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection pool.
    async fn close(&mut self) {}
}
