use std::{sync::Arc, time::Duration};

use log::*;
use tokio::task::JoinHandle;

use super::{
    client::{AccrualClient, AccrualClientError, AccrualSource},
    discovery::{spawn_discovery, DiscoverySettings},
    governor::RateGovernor,
    queue::work_queue,
    shutdown::ShutdownSignal,
    worker::{spawn_workers, WorkerContext},
};
use crate::traits::AccrualManagement;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Where the accrual service lives, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Size of the worker pool, and also the size of each discovery batch.
    pub workers: usize,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AccrualConfig {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url), ..Default::default() }
    }
}

/// Adds `http://` to addresses given without a scheme, and strips trailing slashes.
pub fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// Launches the accrual pipeline against the real accrual service: one discovery task and `config.workers` worker
/// tasks, all spawned on the current tokio runtime.
///
/// `shutdown` is handed over to the returned handle. Take listeners from it beforehand if other tasks need to observe
/// the same shutdown.
pub fn start<A: AccrualManagement>(
    config: AccrualConfig,
    store: A,
    shutdown: ShutdownSignal,
) -> Result<AccrualPipelineHandle, AccrualClientError> {
    let governor = Arc::new(RateGovernor::new(shutdown.listener()));
    let client = AccrualClient::new(&config.base_url, config.request_timeout, Arc::clone(&governor))?;
    info!("🧮️ Accrual service is at {}", client.base_url());
    Ok(start_with_source(&config, store, Arc::new(client), governor, shutdown))
}

/// Launches the pipeline with any [`AccrualSource`]. `governor` must be the one the source reports quota changes to.
pub fn start_with_source<A, S>(
    config: &AccrualConfig,
    store: A,
    source: Arc<S>,
    governor: Arc<RateGovernor>,
    shutdown: ShutdownSignal,
) -> AccrualPipelineHandle
where
    A: AccrualManagement,
    S: AccrualSource,
{
    let workers = config.workers.max(1);
    let (producer, consumer) = work_queue(workers);
    let context = WorkerContext {
        jobs: consumer,
        store: store.clone(),
        source,
        governor: Arc::clone(&governor),
        shutdown: shutdown.listener(),
    };
    let worker_handles = spawn_workers(workers, context);
    let settings = DiscoverySettings { batch_size: workers, poll_interval: config.poll_interval };
    let discovery = spawn_discovery(store, producer, settings, shutdown.listener());
    info!("🧮️ Accrual pipeline started with {workers} workers");
    AccrualPipelineHandle { shutdown, governor, discovery, workers: worker_handles }
}

/// Owns the running pipeline. Dropping the handle without calling [`AccrualPipelineHandle::shutdown`] also stops the
/// pipeline, since the shutdown signal goes with it.
#[derive(Debug)]
pub struct AccrualPipelineHandle {
    shutdown: ShutdownSignal,
    governor: Arc<RateGovernor>,
    discovery: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl AccrualPipelineHandle {
    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    /// Asks every pipeline task to stop. Requests already in flight are allowed to finish.
    pub fn shutdown(&self) {
        info!("🧮️ Accrual pipeline shutting down");
        self.shutdown.trigger();
    }

    pub fn is_running(&self) -> bool {
        !self.discovery.is_finished() || self.workers.iter().any(|w| !w.is_finished())
    }

    /// Waits for every pipeline task to end.
    pub async fn join(self) {
        let Self { discovery, workers, .. } = self;
        if let Err(e) = discovery.await {
            error!("🧮️ The accrual discovery task failed: {e}");
        }
        for (i, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("🧮️ Accrual worker {i} failed: {e}");
            }
        }
        info!("🧮️ Accrual pipeline stopped");
    }

    pub async fn shutdown_and_join(self) {
        self.shutdown();
        self.join().await;
    }
}
