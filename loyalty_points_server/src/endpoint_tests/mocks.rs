use loyalty_points_engine::{
    db_types::{Balance, NewOrder, NewWithdrawal, Order, OrderNumber, UserCredentials, Withdrawal},
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        OrderManagement,
        OrderManagementError,
    },
};
use mockall::mock;

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn create_user(&self, login: &str, password_hash: &str) -> Result<i64, AuthApiError>;
        async fn fetch_credentials_for_login(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError>;
        async fn save_token(&self, user_id: i64, token: &str) -> Result<(), AuthApiError>;
        async fn fetch_user_id_for_token(&self, token: &str) -> Result<Option<i64>, AuthApiError>;
    }
}

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, OrderManagementError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError>;
        async fn order_has_withdrawal(&self, order_number: &OrderNumber) -> Result<bool, OrderManagementError>;
    }
}

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_balance(&self, user_id: i64) -> Result<Balance, AccountApiError>;
        async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;
        async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, AccountApiError>;
    }
}
