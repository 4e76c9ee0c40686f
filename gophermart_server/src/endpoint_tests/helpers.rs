use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Duration;
use gm_common::Secret;
use gophermart_engine::{accrual::AccrualQueue, db_types::OrderNumber, OrderFlowApi};
use log::debug;
use tokio::sync::mpsc::Receiver;

use super::mocks::MockLoyaltyDb;
use crate::{auth::TokenIssuer, config::AuthConfig};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-tests-only-endpoint-tests-only-secret".to_string()),
        token_expiry: Duration::hours(1),
    }
}

pub fn issue_token(user_id: i64, login: &str) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, login).expect("Failed to sign token")
}

pub fn bearer(user_id: i64) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {}", issue_token(user_id, "tester")))
}

/// The receiver must be kept alive for as long as the API is used, or enqueueing fails.
pub fn order_flow_api(db: MockLoyaltyDb) -> (OrderFlowApi<MockLoyaltyDb>, Receiver<OrderNumber>) {
    let (queue, receiver) = AccrualQueue::new(8);
    (OrderFlowApi::new(db, queue), receiver)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub authorization: Option<String>,
    pub body: String,
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let signer = TokenIssuer::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(signer)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let authorization = res.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, authorization, body }
}
