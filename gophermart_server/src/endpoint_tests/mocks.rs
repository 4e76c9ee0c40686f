use chrono::Utc;
use gophermart_engine::{
    db_types::{Amount, Balance, NewOrder, NewUser, Order, OrderNumber, OrderStatusType, User},
    traits::{
        BalanceLedger,
        BalanceMutation,
        LedgerError,
        OrderManagement,
        OrderRegistryError,
        UserManagement,
        UserManagementError,
    },
};
use mockall::mock;

mock! {
    pub LoyaltyDb {}
    impl OrderManagement for LoyaltyDb {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderRegistryError>;
        async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderRegistryError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderRegistryError>;
        async fn fetch_orders_by_status(&self, statuses: &[OrderStatusType]) -> Result<Vec<Order>, OrderRegistryError>;
        async fn update_order_status(&self, number: &OrderNumber, status: OrderStatusType) -> Result<Option<Order>, OrderRegistryError>;
    }
    impl BalanceLedger for LoyaltyDb {
        async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, LedgerError>;
        async fn update_balance_by_order(&self, user_id: i64, number: &OrderNumber, mutation: BalanceMutation) -> Result<Balance, LedgerError>;
        async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;
    }
    impl UserManagement for LoyaltyDb {
        async fn create_user(&self, user: NewUser) -> Result<User, UserManagementError>;
        async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, UserManagementError>;
    }
}

pub fn order(number: &str, user_id: i64, status: OrderStatusType) -> Order {
    let now = Utc::now();
    Order {
        id: 1,
        number: OrderNumber::new(number),
        user_id,
        status,
        accrual: Amount::ZERO,
        withdrawal: Amount::ZERO,
        uploaded_at: now,
        withdrawn_at: None,
        updated_at: now,
    }
}

pub fn balance(user_id: i64, current: Amount, withdrawn: Amount) -> Balance {
    Balance { user_id, current, withdrawn, updated_at: Utc::now() }
}
