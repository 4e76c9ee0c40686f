use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use anyhow::anyhow;
use chrono::Utc;
use gophermart_engine::{
    db_types::User,
    helpers::{hash_password, verify_password},
    traits::UserManagementError,
    AuthApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_auth_config, send_request},
    mocks::MockLoyaltyDb,
};
use crate::{
    auth::{extract_bearer, TokenIssuer},
    routes::{LoginRoute, RegisterRoute},
};

fn auth_service(db: MockLoyaltyDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(AuthApi::new(db)))
            .service(RegisterRoute::<MockLoyaltyDb>::new())
            .service(LoginRoute::<MockLoyaltyDb>::new());
    }
}

fn user(id: i64, login: &str, password: &str) -> User {
    User { id, login: login.into(), password_hash: hash_password(password).unwrap(), created_at: Utc::now() }
}

#[actix_web::test]
async fn registration_logs_the_user_in() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_create_user()
        .withf(|u| u.login == "alice" && verify_password("hunter2", &u.password_hash))
        .times(1)
        .returning(|u| Ok(User { id: 7, login: u.login, password_hash: u.password_hash, created_at: Utc::now() }));
    let req = TestRequest::post().uri("/register").set_json(json!({ "login": "alice", "password": "hunter2" }));
    let res = send_request(req, auth_service(db)).await;
    assert_eq!(res.status, StatusCode::OK, "was: {}", res.body);
    let header = res.authorization.expect("Authorization header missing");
    let token = extract_bearer(&header).unwrap();
    let claims = TokenIssuer::new(&get_auth_config()).verify(token).unwrap();
    assert_eq!(claims.user_id, 7);
    assert_eq!(claims.login, "alice");
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["token"], token);
}

#[actix_web::test]
async fn taken_logins_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_create_user().returning(|u| Err(UserManagementError::LoginTaken(u.login)));
    let req = TestRequest::post().uri("/register").set_json(json!({ "login": "alice", "password": "hunter2" }));
    let res = send_request(req, auth_service(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert!(res.authorization.is_none());
}

#[actix_web::test]
async fn empty_credentials_are_bad_requests() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_create_user().never();
    let req = TestRequest::post().uri("/register").set_json(json!({ "login": "  ", "password": "hunter2" }));
    let res = send_request(req, auth_service(db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_with_correct_password() -> anyhow::Result<()> {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_user_by_login().withf(|l| l == "bob").returning(|l| Ok(Some(user(3, l, "s3cret"))));
    let req = TestRequest::post().uri("/login").set_json(json!({ "login": "bob", "password": "s3cret" }));
    let res = send_request(req, auth_service(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let header = res.authorization.ok_or_else(|| anyhow!("Authorization header missing"))?;
    let token = extract_bearer(&header).ok_or_else(|| anyhow!("Not a bearer token: {header}"))?;
    let claims = TokenIssuer::new(&get_auth_config()).verify(token)?;
    assert_eq!(claims.user_id, 3);
    let body: Value = serde_json::from_str(&res.body)?;
    assert_eq!(body["token"], token);
    Ok(())
}

#[actix_web::test]
async fn bad_credentials_are_unauthorized() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_user_by_login().returning(|l| Ok((l == "bob").then(|| user(3, l, "s3cret"))));
    let req = TestRequest::post().uri("/login").set_json(json!({ "login": "bob", "password": "wrong" }));
    let res = send_request(req, auth_service(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let mut db = MockLoyaltyDb::new();
    db.expect_fetch_user_by_login().returning(|_| Ok(None));
    let req = TestRequest::post().uri("/login").set_json(json!({ "login": "nobody", "password": "s3cret" }));
    let res = send_request(req, auth_service(db)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.authorization.is_none());
}
