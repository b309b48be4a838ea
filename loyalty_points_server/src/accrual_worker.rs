use std::sync::atomic::{AtomicBool, Ordering};

use log::*;
use loyalty_points_engine::{
    accrual::{self, AccrualConfig, AccrualPipelineHandle, ShutdownSignal},
    traits::AccrualManagement,
};

use crate::errors::ServerError;

static PIPELINE_STARTED: AtomicBool = AtomicBool::new(false);

/// Starts the accrual pipeline. Only one pipeline may run per process; a second call fails without touching the
/// running one.
///
/// Call [`AccrualPipelineHandle::shutdown_and_join`] on the returned handle when the server stops.
pub fn start_accrual_worker<A: AccrualManagement>(
    config: AccrualConfig,
    db: A,
) -> Result<AccrualPipelineHandle, ServerError> {
    if PIPELINE_STARTED.swap(true, Ordering::SeqCst) {
        return Err(ServerError::InitializeError("The accrual pipeline has already been started".into()));
    }
    info!("🧮️ Starting accrual pipeline against {}", config.base_url);
    accrual::start(config, db, ShutdownSignal::new()).map_err(|e| {
        PIPELINE_STARTED.store(false, Ordering::SeqCst);
        ServerError::InitializeError(format!("Could not start the accrual pipeline. {e}"))
    })
}
