//! The discovery loop: scan the order store for orders still waiting on a verdict, queue them, wait for the workers
//! to get through the whole batch, then scan again.
use std::{collections::HashSet, time::Duration};

use log::*;
use tokio::task::JoinHandle;

use super::{
    queue::{DrainBarrier, Job, JobProducer},
    shutdown::ShutdownListener,
};
use crate::traits::AccrualManagement;

#[derive(Debug, Clone, Copy)]
pub struct DiscoverySettings {
    /// The most orders fetched per scan.
    pub batch_size: usize,
    /// How long to wait before rescanning after an empty scan, a failed scan, or a cycle that settled nothing.
    pub poll_interval: Duration,
}

pub fn spawn_discovery<A: AccrualManagement>(
    store: A,
    jobs: JobProducer,
    settings: DiscoverySettings,
    shutdown: ShutdownListener,
) -> JoinHandle<()> {
    tokio::spawn(run_discovery(store, jobs, settings, shutdown))
}

async fn run_discovery<A: AccrualManagement>(
    store: A,
    jobs: JobProducer,
    settings: DiscoverySettings,
    mut shutdown: ShutdownListener,
) {
    info!("🔍️ Accrual discovery loop started. Batch size: {}", settings.batch_size);
    let mut cycle = 0u64;
    while !shutdown.is_shutdown() {
        let batch = match store.list_non_terminal(settings.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("🔍️ Could not fetch pending orders. Retrying in {:?}. {e}", settings.poll_interval);
                pause(settings.poll_interval, &mut shutdown).await;
                continue;
            },
        };
        if batch.is_empty() {
            trace!("🔍️ No pending orders");
            pause(settings.poll_interval, &mut shutdown).await;
            continue;
        }
        cycle += 1;
        let barrier = DrainBarrier::new();
        let mut seen = HashSet::with_capacity(batch.len());
        let mut queued = 0usize;
        for order_number in batch {
            if !seen.insert(order_number.clone()) {
                trace!("🔍️ Order {order_number} was listed twice in cycle {cycle}");
                continue;
            }
            let job = Job::new(order_number, barrier.ticket());
            let sent = tokio::select! {
                _ = shutdown.wait() => break,
                sent = jobs.enqueue(job) => sent,
            };
            if let Err(closed) = sent {
                error!(
                    "🔍️ The accrual work queue has closed, so order {} cannot be processed. No workers are left. The \
                     discovery loop is stopping.",
                    closed.0.order_number
                );
                return;
            }
            queued += 1;
        }
        debug!("🔍️ Cycle {cycle}: {queued} orders queued");
        let report = tokio::select! {
            _ = shutdown.wait() => break,
            report = barrier.wait() => report,
        };
        debug!("🔍️ Cycle {cycle} drained");
        if !report.progressed {
            trace!("🔍️ No order settled in cycle {cycle}");
            pause(settings.poll_interval, &mut shutdown).await;
        }
    }
    info!("🔍️ Accrual discovery loop stopped after {cycle} cycles");
}

/// Sleeps for `period`, or until shutdown, whichever comes first.
async fn pause(period: Duration, shutdown: &mut ShutdownListener) {
    tokio::select! {
        _ = tokio::time::sleep(period) => {},
        _ = shutdown.wait() => {},
    }
}
