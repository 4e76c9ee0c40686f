use log::*;

use super::poller::AccrualQueue;
use crate::{db_types::OrderStatusType, gm_api::errors::OrderFlowError, traits::OrderManagement};

/// Puts every order that has not reached a terminal status back on the accrual queue.
///
/// Run this once at start-up, after the poller has started (so a backlog larger than the queue drains instead of
/// blocking) and before accepting requests. Returns the number of orders queued.
pub async fn recall_unfinished_orders<B: OrderManagement>(db: &B, queue: &AccrualQueue) -> Result<usize, OrderFlowError> {
    let orders = db.fetch_orders_by_status(&OrderStatusType::unfinished()).await?;
    let count = orders.len();
    if count == 0 {
        info!("🧹️ No unfinished orders to recall");
        return Ok(0);
    }
    info!("🧹️ Recalling {count} unfinished orders into the accrual queue");
    for order in orders {
        trace!("🧹️ Recalling order {} ({})", order.number, order.status);
        queue.enqueue(order.number).await?;
    }
    info!("🧹️ Recalled {count} orders");
    Ok(count)
}
