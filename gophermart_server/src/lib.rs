//! # Gophermart server
//! This module hosts the HTTP server for the Gophermart loyalty service. It is responsible for:
//! * Registering and authenticating users, and issuing bearer tokens.
//! * Accepting order uploads and handing them to the accrual poller.
//! * Serving balances, order lists and withdrawal history, and applying withdrawals.
//!
//! Before it accepts requests, the server starts the accrual poller and re-queues any orders that a previous run left
//! unfinished.
//!
//! ## Configuration
//! The server is configured via command-line flags and environment variables. See [cli] and [config].
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register`, `/api/user/login`: issue access tokens.
//! * `/api/user/orders`: upload (POST) or list (GET) orders.
//! * `/api/user/balance`, `/api/user/balance/withdraw`, `/api/user/withdrawals`: points balance and spending.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
