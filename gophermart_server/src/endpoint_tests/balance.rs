use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use gophermart_engine::{
    db_types::{Amount, OrderStatusType},
    traits::{BalanceMutation, LedgerError},
    AccountApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{bearer, order_flow_api, send_request},
    mocks::{balance, order, MockLoyaltyDb},
};
use crate::routes::{BalanceWithdrawalsRoute, MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

fn withdraw_request(user_id: i64, body: Value) -> TestRequest {
    TestRequest::post().uri("/balance/withdraw").insert_header(bearer(user_id)).set_json(body)
}

fn withdraw_service(db: MockLoyaltyDb) -> impl FnOnce(&mut ServiceConfig) {
    let (api, rx) = order_flow_api(db);
    move |cfg: &mut ServiceConfig| {
        // Keeps the queue open while the app is alive
        cfg.app_data(web::Data::new(api)).app_data(web::Data::new(rx)).service(WithdrawRoute::<MockLoyaltyDb>::new());
    }
}

fn own_order(db: &mut MockLoyaltyDb) {
    db.expect_fetch_order().returning(|n| Ok(Some(order(n.as_str(), 1, OrderStatusType::Processed))));
}

#[actix_web::test]
async fn balance_is_reported_as_numbers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_balance()
        .withf(|id| *id == 1)
        .returning(|id| Ok(Some(balance(id, "500.5".parse::<Amount>().unwrap(), Amount::from(42)))));
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(AccountApi::new(db))).service(MyBalanceRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(TestRequest::get().uri("/balance").insert_header(bearer(1)), configure).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body, json!({ "current": 500.5, "withdrawn": 42 }));
}

#[actix_web::test]
async fn withdrawals_return_the_new_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    own_order(&mut db);
    db.expect_update_balance_by_order()
        .withf(|id, n, m| *id == 1 && n.as_str() == "2377225624" && *m == BalanceMutation::Withdraw(Amount::from(751)))
        .times(1)
        .returning(|id, _, _| Ok(balance(id, Amount::from(49), Amount::from(751))));
    let res = send_request(withdraw_request(1, json!({ "order": "2377225624", "sum": 751 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::OK, "was: {}", res.body);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body, json!({ "current": 49, "withdrawn": 751 }));
}

#[actix_web::test]
async fn overdrawing_needs_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    own_order(&mut db);
    db.expect_update_balance_by_order().returning(|_, _, _| {
        Err(LedgerError::InsufficientBalance { available: Amount::from(10), requested: Amount::from(751) })
    });
    let res = send_request(withdraw_request(1, json!({ "order": "2377225624", "sum": 751 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn second_withdrawal_on_an_order_conflicts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    own_order(&mut db);
    db.expect_update_balance_by_order().returning(|_, n, _| Err(LedgerError::DoubleWithdrawal(n.clone())));
    let res = send_request(withdraw_request(1, json!({ "order": "2377225624", "sum": 5 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdrawals_need_a_valid_own_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().never();
    let res = send_request(withdraw_request(1, json!({ "order": "2377225625", "sum": 5 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().returning(|n| Ok(Some(order(n.as_str(), 2, OrderStatusType::Processed))));
    db.expect_update_balance_by_order().never();
    let res = send_request(withdraw_request(1, json!({ "order": "2377225624", "sum": 5 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    db.expect_update_balance_by_order().never();
    let res = send_request(withdraw_request(1, json!({ "order": "2377225624", "sum": 5 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn non_positive_sums_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_update_balance_by_order().never();
    let res = send_request(withdraw_request(1, json!({ "order": "2377225624", "sum": 0 })), withdraw_service(db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn no_withdrawals_means_no_content() {
    let _ = env_logger::try_init().ok();
    for path in ["/withdrawals", "/balance/withdrawals"] {
        let mut db = MockLoyaltyDb::new();
        db.expect_fetch_withdrawals().returning(|_| Ok(vec![]));
        let configure = move |cfg: &mut ServiceConfig| {
            cfg.app_data(web::Data::new(AccountApi::new(db)))
                .service(MyWithdrawalsRoute::<MockLoyaltyDb>::new())
                .service(BalanceWithdrawalsRoute::<MockLoyaltyDb>::new());
        };
        let res = send_request(TestRequest::get().uri(path).insert_header(bearer(1)), configure).await;
        assert_eq!(res.status, StatusCode::NO_CONTENT, "for {path}");
    }
}

#[actix_web::test]
async fn withdrawal_history() {
    let _ = env_logger::try_init().ok();
    for path in ["/withdrawals", "/balance/withdrawals"] {
        let mut db = MockLoyaltyDb::new();
        db.expect_fetch_withdrawals().returning(|id| {
            let mut o = order("2377225624", id, OrderStatusType::Processed);
            o.withdrawal = Amount::from(500);
            o.withdrawn_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
            Ok(vec![o])
        });
        let configure = move |cfg: &mut ServiceConfig| {
            cfg.app_data(web::Data::new(AccountApi::new(db)))
                .service(MyWithdrawalsRoute::<MockLoyaltyDb>::new())
                .service(BalanceWithdrawalsRoute::<MockLoyaltyDb>::new());
        };
        let res = send_request(TestRequest::get().uri(path).insert_header(bearer(1)), configure).await;
        assert_eq!(res.status, StatusCode::OK, "for {path}");
        let body: Vec<Value> = serde_json::from_str(&res.body).unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["order"], "2377225624");
        assert_eq!(body[0]["sum"], 500);
        assert_eq!(body[0]["processed_at"], "2024-03-01T10:00:00Z");
    }
}
