use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use gophermart_engine::{
    db_types::{Amount, OrderNumber, OrderStatusType},
    traits::OrderRegistryError,
    AccountApi,
};
use serde_json::Value;

use super::{
    helpers::{bearer, order_flow_api, send_request},
    mocks::{order, MockLoyaltyDb},
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

fn submit(user_id: Option<i64>, body: &str) -> TestRequest {
    let req = TestRequest::post().uri("/orders").insert_header(("Content-Type", "text/plain")).set_payload(body.to_string());
    match user_id {
        Some(id) => req.insert_header(bearer(id)),
        None => req,
    }
}

#[actix_web::test]
async fn new_orders_are_accepted_and_queued() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().times(1).returning(|_| Ok(None));
    db.expect_insert_order().times(1).returning(|o| Ok(order(o.number.as_str(), o.user_id, OrderStatusType::New)));
    let (api, mut rx) = order_flow_api(db);
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(submit(Some(1), "12345678903\n"), configure).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(rx.try_recv().unwrap(), OrderNumber::new("12345678903"));
    assert!(rx.try_recv().is_err());
}

#[actix_web::test]
async fn re_uploading_own_order_is_ok() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().returning(|n| Ok(Some(order(n.as_str(), 1, OrderStatusType::Processing))));
    db.expect_insert_order().never();
    let (api, mut rx) = order_flow_api(db);
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(submit(Some(1), "12345678903"), configure).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(rx.try_recv().is_err(), "A re-upload must not be queued again");
}

#[actix_web::test]
async fn orders_owned_by_someone_else_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().returning(|n| Ok(Some(order(n.as_str(), 2, OrderStatusType::New))));
    db.expect_insert_order().never();
    let (api, _rx) = order_flow_api(db);
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(submit(Some(1), "12345678903"), configure).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert!(res.body.contains("another user"), "was: {}", res.body);
}

#[actix_web::test]
async fn losing_the_insert_race_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    db.expect_insert_order().returning(|o| Err(OrderRegistryError::OrderAlreadyExists(o.number)));
    let (api, mut rx) = order_flow_api(db);
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(submit(Some(1), "79927398713"), configure).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert!(rx.try_recv().is_err());
}

#[actix_web::test]
async fn bad_order_numbers_are_unprocessable() {
    let _ = env_logger::try_init().ok();
    for number in ["79927398710", "12ab", "123"] {
        let mut db = MockLoyaltyDb::new();
        db.expect_fetch_order().never();
        db.expect_insert_order().never();
        let (api, _rx) = order_flow_api(db);
        let configure = move |cfg: &mut ServiceConfig| {
            cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
        };
        let res = send_request(submit(Some(1), number), configure).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "for {number}");
    }
}

#[actix_web::test]
async fn empty_bodies_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let (api, _rx) = order_flow_api(MockLoyaltyDb::new());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(submit(Some(1), "  "), configure).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn uploads_need_a_token() {
    let _ = env_logger::try_init().ok();
    let (api, _rx) = order_flow_api(MockLoyaltyDb::new());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(submit(None, "12345678903"), configure).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.body.contains("No bearer token"), "was: {}", res.body);

    let (api, _rx) = order_flow_api(MockLoyaltyDb::new());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).service(SubmitOrderRoute::<MockLoyaltyDb>::new());
    };
    let req = TestRequest::post().uri("/orders").insert_header(("Authorization", "Bearer made.up.nonsense"));
    let res = send_request(req.set_payload("12345678903"), configure).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn users_without_orders_get_no_content() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_orders_for_user().withf(|id| *id == 3).returning(|_| Ok(vec![]));
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(AccountApi::new(db))).service(MyOrdersRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(TestRequest::get().uri("/orders").insert_header(bearer(3)), configure).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn order_list_reports_accruals_only_when_present() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_orders_for_user().returning(|id| {
        let mut processed = order("79927398713", id, OrderStatusType::Processed);
        processed.accrual = "729.98".parse::<Amount>().unwrap();
        Ok(vec![order("12345678903", id, OrderStatusType::New), processed])
    });
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(AccountApi::new(db))).service(MyOrdersRoute::<MockLoyaltyDb>::new());
    };
    let res = send_request(TestRequest::get().uri("/orders").insert_header(bearer(1)), configure).await;
    assert_eq!(res.status, StatusCode::OK);
    let orders: Vec<Value> = serde_json::from_str(&res.body).unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["number"], "12345678903");
    assert_eq!(orders[0]["status"], "NEW");
    assert!(orders[0].get("accrual").is_none());
    assert!(orders[0]["uploaded_at"].is_string());
    assert_eq!(orders[1]["status"], "PROCESSED");
    assert_eq!(orders[1]["accrual"], 729.98);
}
