//! # Accrual reconciliation pipeline
//!
//! Uploaded orders start out as `NEW`. The external accrual service decides, in its own time, whether an order earns
//! points and how many. This module keeps asking it about every order that is still `NEW` or `PROCESSING` until each
//! one reaches a terminal state (`REGISTERED` or `INVALID`), and writes the answers back to the order store.
//!
//! ## Moving parts
//!
//! ```text
//!  discovery loop ──► work queue ──► worker pool ──► accrual client ──► order store
//!                                        │                 │
//!                                        └─ rate governor ◄┘ (429 replies)
//! ```
//!
//! * The **discovery loop** ([`discovery`]) scans the store for up to `workers` pending orders, queues each one once,
//!   and waits on a [`queue::DrainBarrier`] until every queued order has been dealt with before scanning again.
//! * The **work queue** ([`queue`]) is a bounded channel shared by all workers.
//! * The **worker pool** ([`worker`]) is a fixed set of tasks. A worker asks the [`RateGovernor`] for a slot, looks the
//!   order up, and writes the result back. A panic while processing one order is contained to that order.
//! * The **accrual client** ([`AccrualClient`]) makes one HTTP request per lookup. It never retries; an order without
//!   an answer simply comes round again on a later scan.
//! * The **rate governor** ([`RateGovernor`]) spaces requests according to the quota the accrual service last
//!   advertised.
//!
//! Delivery to the accrual service is at-least-once. Write-back is last-write-wins by order number, so repeating a
//! lookup is harmless.
//!
//! ## Starting the pipeline
//!
//! ```rust,ignore
//! let signal = ShutdownSignal::new();
//! let handle = accrual::start(AccrualConfig::new("localhost:8080"), db.clone(), signal)?;
//! // ... later
//! handle.shutdown_and_join().await;
//! ```
mod client;
pub mod discovery;
mod governor;
mod pipeline;
pub mod queue;
mod shutdown;
pub mod worker;

pub use client::{parse_quota_body, AccrualClient, AccrualClientError, AccrualSource};
pub use governor::{Admission, RateBudget, RateGovernor};
pub use pipeline::{
    normalize_base_url,
    start,
    start_with_source,
    AccrualConfig,
    AccrualPipelineHandle,
    DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WORKERS,
};
pub use shutdown::{ShutdownListener, ShutdownSignal};
