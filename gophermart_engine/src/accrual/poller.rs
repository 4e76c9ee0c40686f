use std::{future::Future, sync::Arc};

use log::*;
use thiserror::Error;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{sleep, Duration},
};
use tokio_util::sync::CancellationToken;

use super::{
    client::{AccrualClient, AccrualResponse, AccrualStatus, AccrualStatusResponse},
    gate::PauseGate,
};
use crate::{
    db_types::{Amount, OrderNumber, OrderStatusType},
    gm_api::errors::OrderFlowError,
};

//--------------------------------------     AccrualQueue     ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
#[error("The accrual queue is closed. Order {0} was not queued")]
pub struct AccrualQueueClosed(pub OrderNumber);

/// The sending half of the bounded queue of orders waiting to be polled. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AccrualQueue {
    sender: mpsc::Sender<OrderNumber>,
}

impl AccrualQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OrderNumber>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Waits for space in the queue if it is full.
    ///
    /// The hand-off runs on its own task, so the order is still queued if the caller is dropped while waiting.
    pub async fn enqueue(&self, number: OrderNumber) -> Result<(), AccrualQueueClosed> {
        let sender = self.sender.clone();
        let fallback = number.clone();
        let handoff = tokio::spawn(async move { sender.send(number).await.map_err(|e| AccrualQueueClosed(e.0)) });
        handoff.await.unwrap_or_else(|e| {
            error!("🕰️ The hand-off task for order {fallback} failed: {e}");
            Err(AccrualQueueClosed(fallback))
        })
    }
}

//--------------------------------------    AccrualUpdater    ---------------------------------------------------------
/// Where the poller writes its results.
pub trait AccrualUpdater: Send + Sync + 'static {
    /// Credit `amount` to the owner of the order and mark it `PROCESSED`.
    fn accrue_external(
        &self,
        number: &OrderNumber,
        amount: Amount,
    ) -> impl Future<Output = Result<(), OrderFlowError>> + Send;

    fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
    ) -> impl Future<Output = Result<(), OrderFlowError>> + Send;
}

//--------------------------------------     PollerConfig     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// How long to wait before asking again about an order the accrual service does not know yet.
    pub not_registered_delay: Duration,
    /// Retry delay after a transport error or a failed write. Does not pause the other workers.
    pub error_delay: Duration,
    /// Polling interval for orders the accrual service is still working on.
    pub processing_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 64,
            not_registered_delay: Duration::from_secs(10),
            error_delay: Duration::from_secs(3),
            processing_delay: Duration::from_secs(3),
        }
    }
}

//--------------------------------------     AccrualPoller    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// The order reached a terminal status, or there is nothing more we can do for it.
    Done,
    RetryAfter(Duration),
    RateLimited(Duration),
}

struct PollerCore<C, U> {
    config: PollerConfig,
    client: C,
    updater: U,
    queue: AccrualQueue,
    receiver: Mutex<mpsc::Receiver<OrderNumber>>,
    gate: Arc<PauseGate>,
}

/// A fixed-size pool of workers that resolves the accrual of every queued order.
///
/// Workers share one queue and one [`PauseGate`]. Each order is taken off the queue, the worker waits for the gate to
/// be open, asks the accrual service about it once, and then either records a terminal result or puts the order back
/// on the queue after a delay. A rate-limit reply closes the gate for the whole pool.
///
/// The poller keeps no per-order state. The same order may be in the queue more than once; the ledger serializes the
/// actual balance updates, and a second accrual for a finished order is rejected there.
pub struct AccrualPoller<C, U> {
    core: Arc<PollerCore<C, U>>,
}

/// Handles to the running workers.
pub struct PollerHandle {
    workers: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    /// Waits for every worker to stop. Call this after cancelling the shutdown token.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("🕰️ An accrual worker did not shut down cleanly. {e}");
            }
        }
        info!("🕰️ Accrual poller stopped");
    }
}

impl<C, U> AccrualPoller<C, U>
where
    C: AccrualClient,
    U: AccrualUpdater,
{
    pub fn new(
        config: PollerConfig,
        client: C,
        updater: U,
        queue: AccrualQueue,
        receiver: mpsc::Receiver<OrderNumber>,
    ) -> Self {
        let core = PollerCore {
            config,
            client,
            updater,
            queue,
            receiver: Mutex::new(receiver),
            gate: Arc::new(PauseGate::new()),
        };
        Self { core: Arc::new(core) }
    }

    /// Spawns the workers. They run until `shutdown` is cancelled.
    pub fn start(&self, shutdown: CancellationToken) -> PollerHandle {
        let count = self.core.config.workers.max(1);
        let workers = (0..count)
            .map(|id| {
                let core = Arc::clone(&self.core);
                let shutdown = shutdown.clone();
                tokio::spawn(async move { core.run_worker(id, shutdown).await })
            })
            .collect();
        info!("🕰️ Accrual poller started with {count} workers");
        PollerHandle { workers }
    }
}

impl<C, U> PollerCore<C, U>
where
    C: AccrualClient,
    U: AccrualUpdater,
{
    async fn run_worker(&self, id: usize, shutdown: CancellationToken) {
        debug!("🕰️ Accrual worker #{id} started");
        loop {
            let number = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.next_order() => match next {
                    Some(number) => number,
                    None => {
                        debug!("🕰️ Accrual queue closed");
                        break;
                    },
                },
            };
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.gate.wait_open() => {},
            }
            trace!("🕰️ Worker #{id} is polling order {number}");
            match self.resolve(&number).await {
                Resolution::Done => {},
                Resolution::RetryAfter(delay) => self.requeue_after(number, delay, shutdown.clone()),
                Resolution::RateLimited(retry_after) => {
                    self.gate.pause_for(retry_after);
                    warn!(
                        "🕰️ The accrual service is rate limiting us. All workers are paused for {}s",
                        retry_after.as_secs()
                    );
                    self.requeue_when_open(number, shutdown.clone());
                },
            }
        }
        debug!("🕰️ Accrual worker #{id} stopped");
    }

    async fn next_order(&self) -> Option<OrderNumber> {
        self.receiver.lock().await.recv().await
    }

    async fn resolve(&self, number: &OrderNumber) -> Resolution {
        match self.client.fetch_accrual(number).await {
            Ok(AccrualResponse::Status(status)) => self.apply_status(number, status).await,
            Ok(AccrualResponse::NotRegistered) => {
                debug!("🕰️ Order {number} is not registered with the accrual service yet");
                Resolution::RetryAfter(self.config.not_registered_delay)
            },
            Ok(AccrualResponse::RateLimited { retry_after }) => Resolution::RateLimited(retry_after),
            Err(e) => {
                warn!("🕰️ Could not fetch the accrual for order {number}. {e}");
                Resolution::RetryAfter(self.config.error_delay)
            },
        }
    }

    async fn apply_status(&self, number: &OrderNumber, response: AccrualStatusResponse) -> Resolution {
        if &response.order != number {
            warn!("🕰️ Asked about order {number}, but the accrual service replied about {}", response.order);
        }
        match response.status {
            AccrualStatus::Processed => {
                let amount = response.accrual.unwrap_or(Amount::ZERO);
                match self.updater.accrue_external(number, amount).await {
                    Ok(()) => Resolution::Done,
                    Err(OrderFlowError::OrderAlreadyFinalized(_)) => {
                        debug!("🕰️ Order {number} was already finalized by another worker");
                        Resolution::Done
                    },
                    Err(OrderFlowError::OrderNotFound(_)) => {
                        error!("🕰️ Order {number} has an accrual, but it is not in the database. Dropping it");
                        Resolution::Done
                    },
                    Err(OrderFlowError::InvalidAmount(_)) => {
                        error!("🕰️ The accrual service reported an unusable accrual of {amount} for order {number}");
                        if let Err(e) = self.updater.update_order_status(number, OrderStatusType::Invalid).await {
                            error!("🕰️ Could not mark order {number} as invalid. {e}");
                        }
                        Resolution::Done
                    },
                    Err(e) => {
                        error!("🕰️ Could not credit the accrual of {amount} for order {number}. {e}");
                        Resolution::RetryAfter(self.config.error_delay)
                    },
                }
            },
            AccrualStatus::Invalid => match self.updater.update_order_status(number, OrderStatusType::Invalid).await {
                Ok(()) => {
                    info!("🕰️ Order {number} was rejected by the accrual service");
                    Resolution::Done
                },
                Err(e) => {
                    error!("🕰️ Could not mark order {number} as invalid. {e}");
                    Resolution::RetryAfter(self.config.error_delay)
                },
            },
            AccrualStatus::Registered | AccrualStatus::Processing => {
                if let Err(e) = self.updater.update_order_status(number, OrderStatusType::Processing).await {
                    warn!("🕰️ Could not mark order {number} as processing. {e}");
                }
                Resolution::RetryAfter(self.config.processing_delay)
            },
        }
    }

    /// Puts the order back on the queue after `delay`. Abandoned on shutdown.
    fn requeue_after(&self, number: OrderNumber, delay: Duration, shutdown: CancellationToken) {
        let queue = self.queue.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => trace!("🕰️ Pending retry abandoned"),
                _ = async {
                    sleep(delay).await;
                    requeue(&queue, number).await;
                } => {},
            }
        });
    }

    /// Puts the order back on the queue as soon as the pool-wide pause is over. Abandoned on shutdown.
    fn requeue_when_open(&self, number: OrderNumber, shutdown: CancellationToken) {
        let queue = self.queue.clone();
        let gate = Arc::clone(&self.gate);
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => trace!("🕰️ Pending retry abandoned"),
                _ = async {
                    gate.wait_open().await;
                    requeue(&queue, number).await;
                } => {},
            }
        });
    }
}

async fn requeue(queue: &AccrualQueue, number: OrderNumber) {
    trace!("🕰️ Order {number} is back in the accrual queue");
    if let Err(e) = queue.enqueue(number).await {
        warn!("🕰️ {e}");
    }
}
