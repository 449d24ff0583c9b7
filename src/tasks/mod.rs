//! Background tasks for the application.
//!
//! Call `spawn_all` once during startup, inside the runtime.

use crate::services::{DeliveryJob, DeliveryWorker};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Spawn the delivery worker that drains post-commit email and push jobs.
pub fn spawn_all(
    delivery_worker: DeliveryWorker,
    delivery_receiver: UnboundedReceiver<DeliveryJob>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        delivery_worker.run(delivery_receiver).await;
    })
}
