//! Request handler definitions
//!
//! Define each route and its handler here. Handlers are generic over the storage backend, so that the endpoint tests
//! can run them against mocks.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database calls, password hashing of a known cost) is
//! expressed as futures so that a worker can serve other requests while it waits.
use actix_web::{get, http::header, web, HttpResponse, Responder};
use gophermart_engine::{
    db_types::OrderNumber,
    traits::{BalanceLedger, OrderManagement, UserManagement},
    AccountApi,
    AuthApi,
    OrderFlowApi,
    OrderFlowError,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{BalanceResponse, Credentials, OrderResponse, TokenResponse, WithdrawRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/register" impl UserManagement);
/// Creates a new user and logs them straight in.
///
/// The access token is returned both in the `Authorization` header and in the body.
pub async fn register<B: UserManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    trace!("💻️ Received registration request for '{login}'");
    if login.trim().is_empty() || password.is_empty() {
        return Err(ServerError::InvalidRequestBody("Login and password must not be empty".into()));
    }
    let user = api.register(&login, &password).await?;
    let token = signer.issue_token(user.id, &user.login)?;
    Ok(token_response(token))
}

route!(login => Post "/login" impl UserManagement);
pub async fn login<B: UserManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    trace!("💻️ Received login request for '{login}'");
    let user = api.authenticate(&login, &password).await?;
    let token = signer.issue_token(user.id, &user.login)?;
    debug!("💻️ Issued access token for user #{}", user.id);
    Ok(token_response(token))
}

fn token_response(token: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .json(TokenResponse { token })
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl OrderManagement);
/// Uploads an order number (plain text body) for accrual.
///
/// * `202 Accepted` - the order is new and has been queued.
/// * `200 OK` - this user already uploaded the order.
pub async fn submit_order<B: OrderManagement>(
    claims: JwtClaims,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("Expected an order number".into()));
    }
    debug!("💻️ POST order {number} for user #{}", claims.user_id);
    match api.create_order(claims.user_id, OrderNumber::new(number)).await {
        Ok(_) => Ok(HttpResponse::Accepted().finish()),
        Err(OrderFlowError::OrderAlreadyAcceptedByUser(n)) => {
            debug!("💻️ Order {n} was already uploaded by user #{}", claims.user_id);
            Ok(HttpResponse::Ok().finish())
        },
        Err(e) => Err(e.into()),
    }
}

route!(my_orders => Get "/orders" impl OrderManagement);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user #{}", claims.user_id);
    let orders = api.orders_for_user(claims.user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl BalanceLedger);
pub async fn my_balance<B: BalanceLedger>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET balance for user #{}", claims.user_id);
    let balance = api.balance_for_user(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

route!(withdraw => Post "/balance/withdraw" impl OrderManagement, BalanceLedger);
/// Spends points against one of the user's orders. Replies with the new balance.
pub async fn withdraw<B: OrderManagement + BalanceLedger>(
    claims: JwtClaims,
    body: web::Json<WithdrawRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let WithdrawRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against order {order} for user #{}", claims.user_id);
    let balance = api.withdraw(claims.user_id, OrderNumber::new(order.trim()), sum).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

route!(my_withdrawals => Get "/withdrawals" impl BalanceLedger);
pub async fn my_withdrawals<B: BalanceLedger>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    withdrawals_for(claims, api.as_ref()).await
}

route!(balance_withdrawals => Get "/balance/withdrawals" impl BalanceLedger);
pub async fn balance_withdrawals<B: BalanceLedger>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    withdrawals_for(claims, api.as_ref()).await
}

async fn withdrawals_for<B: BalanceLedger>(claims: JwtClaims, api: &AccountApi<B>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET withdrawals for user #{}", claims.user_id);
    let withdrawals = api.withdrawals_for_user(claims.user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(withdrawals))
}
