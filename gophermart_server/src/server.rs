use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use gophermart_engine::{
    accrual::{recall_unfinished_orders, AccrualPoller, AccrualQueue, HttpAccrualClient},
    AccountApi,
    AuthApi,
    LoyaltyDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        BalanceWithdrawalsRoute,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
};

/// Runs the whole service until the HTTP server exits.
///
/// The accrual poller is started before the start-up sweep so that the sweep can never block on a full queue, and the
/// sweep completes before the first request is accepted.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let client = HttpAccrualClient::new(&config.accrual_address, config.accrual_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Accrual service is at {}", client.base_url());
    let (queue, receiver) = AccrualQueue::new(config.poller.queue_capacity);
    let orders_api = OrderFlowApi::new(db.clone(), queue.clone());
    let poller = AccrualPoller::new(config.poller.clone(), client, orders_api.clone(), queue.clone(), receiver);
    let shutdown = CancellationToken::new();
    let poller_handle = poller.start(shutdown.clone());

    let recalled = recall_unfinished_orders(&db, &queue).await?;
    info!("🚀️ {recalled} unfinished orders are back in the accrual queue");

    let srv = create_server_instance(config, db.clone(), orders_api)?;
    let result = srv.await.map_err(ServerError::from);

    info!("🚀️ HTTP server stopped. Shutting down the accrual poller");
    shutdown.cancel();
    poller_handle.join().await;
    db.close().await;
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    orders_api: OrderFlowApi<SqliteDatabase>,
) -> Result<Server, ServerError> {
    let signer = TokenIssuer::new(&config.auth);
    let srv = HttpServer::new(move || {
        let accounts_api = AccountApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new())
            .service(BalanceWithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("gophermart::access_log"))
            .app_data(json_config)
            .app_data(web::Data::new(orders_api.clone()))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(signer.clone()))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(config.run_address.as_str())?
    .run();
    info!("🚀️ Listening on {}", config.run_address);
    Ok(srv)
}
