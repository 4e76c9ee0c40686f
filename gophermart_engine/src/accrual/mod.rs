//! Accrual reconciliation.
//!
//! Every uploaded order is resolved against the external accrual service in the background:
//!
//! * [`AccrualQueue`] is the bounded hand-off between the request path and the poller.
//! * [`AccrualPoller`] runs a fixed pool of workers over that queue. It applies results through an [`AccrualUpdater`]
//!   and honours the service's rate limit across the whole pool with a [`PauseGate`].
//! * [`HttpAccrualClient`] is the [`AccrualClient`] that talks to the real service.
//! * [`recall_unfinished_orders`] re-seeds the queue at start-up with orders left in flight by a previous run.
mod client;
mod gate;
mod poller;
mod sweep;

pub use client::{
    normalize_base_url,
    parse_retry_after,
    AccrualClient,
    AccrualClientError,
    AccrualResponse,
    AccrualStatus,
    AccrualStatusResponse,
    HttpAccrualClient,
    DEFAULT_RETRY_AFTER,
};
pub use gate::PauseGate;
pub use poller::{AccrualPoller, AccrualQueue, AccrualQueueClosed, AccrualUpdater, PollerConfig, PollerHandle};
pub use sweep::recall_unfinished_orders;
