//! The accrual worker pool. Each worker takes one job at a time off the shared queue, waits for the governor to
//! admit it, asks the accrual service about the order and writes the verdict back to the order store.
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use log::*;
use tokio::task::JoinHandle;

use super::{
    client::AccrualSource,
    governor::{Admission, RateGovernor},
    queue::JobConsumer,
    shutdown::ShutdownListener,
};
use crate::{db_types::OrderNumber, traits::AccrualManagement};

/// Everything a worker needs. Cheap to clone; every worker in the pool gets its own copy.
pub struct WorkerContext<A, S> {
    pub jobs: JobConsumer,
    pub store: A,
    pub source: Arc<S>,
    pub governor: Arc<RateGovernor>,
    pub shutdown: ShutdownListener,
}

impl<A: Clone, S> Clone for WorkerContext<A, S> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            store: self.store.clone(),
            source: Arc::clone(&self.source),
            governor: Arc::clone(&self.governor),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Spawns `count` workers. They run until shutdown is triggered or the queue is closed.
pub fn spawn_workers<A, S>(count: usize, context: WorkerContext<A, S>) -> Vec<JoinHandle<()>>
where
    A: AccrualManagement,
    S: AccrualSource,
{
    (0..count).map(|id| tokio::spawn(run_worker(id, context.clone()))).collect()
}

async fn run_worker<A, S>(id: usize, context: WorkerContext<A, S>)
where
    A: AccrualManagement,
    S: AccrualSource,
{
    let WorkerContext { jobs, store, source, governor, mut shutdown } = context;
    debug!("👷️ Accrual worker {id} started");
    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            job = jobs.dequeue() => match job {
                Some(job) => job,
                None => break,
            },
        };
        let outcome = AssertUnwindSafe(process(&job.order_number, &store, source.as_ref(), &governor))
            .catch_unwind()
            .await;
        let settled = match outcome {
            Ok(settled) => settled,
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                error!("👷️ Worker {id} panicked while processing order {}: {msg}", job.order_number);
                false
            },
        };
        job.finish(settled);
    }
    debug!("👷️ Accrual worker {id} stopped");
}

/// Returns true if the order reached a terminal state.
async fn process<A, S>(order_number: &OrderNumber, store: &A, source: &S, governor: &RateGovernor) -> bool
where
    A: AccrualManagement,
    S: AccrualSource,
{
    if governor.admit().await == Admission::ShuttingDown {
        debug!("👷️ Shutting down. Order {order_number} will be picked up after restart");
        return false;
    }
    if let Err(e) = store.mark_checked(order_number).await {
        warn!("👷️ Could not record the lookup of order {order_number}. {e}");
    }
    let Some(result) = source.fetch(order_number).await else {
        return false;
    };
    match store.write_result(&result).await {
        Ok(()) => {
            debug!("👷️ Order {order_number} updated to {}", result.status);
            result.status.is_terminal()
        },
        Err(e) => {
            warn!("👷️ Could not save the accrual result for order {order_number}. It will be retried. {e}");
            false
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
