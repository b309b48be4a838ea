//! The work queue between the discovery loop and the worker pool, and the per-cycle drain barrier.
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::db_types::OrderNumber;

/// One order to look up, plus the ticket that tells the discovery loop when it has been dealt with.
#[derive(Debug)]
pub struct Job {
    pub order_number: OrderNumber,
    ticket: CompletionTicket,
}

impl Job {
    pub fn new(order_number: OrderNumber, ticket: CompletionTicket) -> Self {
        Self { order_number, ticket }
    }

    /// Marks the job as done. `settled` reports whether the order reached a terminal state.
    pub fn finish(self, settled: bool) {
        self.ticket.complete(settled);
    }
}

/// Creates a bounded FIFO work queue. Producers wait while it is full; consumers wait while it is empty.
pub fn work_queue(capacity: usize) -> (JobProducer, JobConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (JobProducer { tx }, JobConsumer { rx: Arc::new(Mutex::new(rx)) })
}

#[derive(Debug, Clone)]
pub struct JobProducer {
    tx: mpsc::Sender<Job>,
}

/// Returned when every consumer has gone away.
#[derive(Debug)]
pub struct QueueClosed(pub Job);

impl JobProducer {
    pub async fn enqueue(&self, job: Job) -> Result<(), QueueClosed> {
        self.tx.send(job).await.map_err(|e| QueueClosed(e.0))
    }
}

/// The consuming end of the work queue. Clones share the same queue, and each job goes to exactly one of them.
#[derive(Debug, Clone)]
pub struct JobConsumer {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl JobConsumer {
    /// Waits for the next job. `None` means the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<Job> {
        self.rx.lock().await.recv().await
    }
}

//--------------------------------------     DrainBarrier      ---------------------------------------------------------
/// Counts outstanding jobs for one discovery cycle.
///
/// Every job carries a [`CompletionTicket`] issued by the barrier. [`DrainBarrier::wait`] resolves once every ticket
/// has been completed or dropped, so a job whose future is cancelled, or that panics, still releases the barrier.
#[derive(Debug)]
pub struct DrainBarrier {
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
}

/// What the cycle achieved, as reported by the completed tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// At least one order reached a terminal state.
    pub progressed: bool,
}

impl Default for DrainBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl DrainBarrier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }

    pub fn ticket(&self) -> CompletionTicket {
        CompletionTicket { tx: self.tx.clone() }
    }

    /// Waits until every ticket issued by this barrier is gone.
    pub async fn wait(self) -> CycleReport {
        let Self { tx, mut rx } = self;
        drop(tx);
        let mut report = CycleReport::default();
        while rx.recv().await.is_some() {
            report.progressed = true;
        }
        report
    }
}

#[derive(Debug)]
pub struct CompletionTicket {
    tx: mpsc::Sender<()>,
}

impl CompletionTicket {
    pub fn complete(self, settled: bool) {
        if settled {
            // A full channel already carries the news
            let _ = self.tx.try_send(());
        }
    }
}
