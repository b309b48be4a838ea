//! Request pacing for the external accrual service.
//!
//! The accrual service advertises its quota only after it has been exceeded, by replying `429 Too Many Requests`.
//! The [`RateGovernor`] holds the most recently advertised quota and hands out request slots no closer together than
//! `60s / requests_per_minute`. Slots are strictly spaced; there is no burst allowance.
//!
//! A new budget applies to callers that are already waiting too: reservations that have not come due yet are
//! dropped, and every waiter reserves again under the new budget.
use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use log::*;
use tokio::{
    sync::Notify,
    time::{sleep_until, Instant},
};

use super::shutdown::ShutdownListener;

const ONE_MINUTE: Duration = Duration::from_secs(60);

/// The request budget currently in force. `None` means requests are not throttled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    pub requests_per_minute: Option<u32>,
    /// No request is admitted before this instant, whatever the rate.
    pub effective_from: Instant,
}

impl RateBudget {
    pub fn unbounded() -> Self {
        Self { requests_per_minute: None, effective_from: Instant::now() }
    }

    /// A zero or negative rate disables throttling.
    pub fn new(requests_per_minute: i64, effective_from: Instant) -> Self {
        let requests_per_minute = (requests_per_minute > 0).then(|| u32::try_from(requests_per_minute).unwrap_or(u32::MAX));
        Self { requests_per_minute, effective_from }
    }

    /// The minimum gap between two admitted requests.
    pub fn interval(&self) -> Option<Duration> {
        self.requests_per_minute.map(|rpm| ONE_MINUTE / rpm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Proceed,
    ShuttingDown,
}

#[derive(Debug)]
struct Pacing {
    budget: RateBudget,
    /// The latest slot handed out so far.
    last_slot: Option<Instant>,
}

impl Pacing {
    fn reserve(&mut self, now: Instant) -> Instant {
        let mut slot = now.max(self.budget.effective_from);
        if let (Some(interval), Some(last)) = (self.budget.interval(), self.last_slot) {
            slot = slot.max(last + interval);
        }
        self.last_slot = Some(self.last_slot.map_or(slot, |last| last.max(slot)));
        slot
    }

    /// Slots that have already come due are real admissions and keep spacing the next one. Slots still in the future
    /// belong to waiters, who will reserve again.
    fn replace(&mut self, budget: RateBudget, now: Instant) {
        self.budget = budget;
        self.last_slot = self.last_slot.map(|last| last.min(now));
    }
}

/// Admission gate shared by every accrual worker.
///
/// The budget is replaced wholesale by [`RateGovernor::update`]; concurrent updates are last-write-wins. The lock is
/// only held while a slot is reserved or the budget replaced, never while a caller waits for its slot.
#[derive(Debug)]
pub struct RateGovernor {
    pacing: Mutex<Pacing>,
    budget_changed: Notify,
    shutdown: ShutdownListener,
}

impl RateGovernor {
    /// A new governor starts out unthrottled.
    pub fn new(shutdown: ShutdownListener) -> Self {
        let pacing = Pacing { budget: RateBudget::unbounded(), last_slot: None };
        Self { pacing: Mutex::new(pacing), budget_changed: Notify::new(), shutdown }
    }

    /// Waits for the caller's turn under the current budget.
    ///
    /// Returns [`Admission::ShuttingDown`] without waiting out the slot if shutdown is triggered first. If the budget
    /// changes while the caller waits, the slot is given up and a new one is reserved under the new budget.
    pub async fn admit(&self) -> Admission {
        let mut shutdown = self.shutdown.clone();
        loop {
            if shutdown.is_shutdown() {
                return Admission::ShuttingDown;
            }
            let now = Instant::now();
            // The listener is registered under the same lock that budget changes are published under, so no change
            // can slip in between reserving the slot and starting to listen.
            let (slot, budget_changed) = {
                let mut pacing = self.pacing.lock().unwrap_or_else(PoisonError::into_inner);
                (pacing.reserve(now), self.budget_changed.notified())
            };
            if slot <= now {
                return Admission::Proceed;
            }
            trace!("🚦️ Request slot is {}ms away", (slot - now).as_millis());
            tokio::select! {
                _ = sleep_until(slot) => return Admission::Proceed,
                _ = budget_changed => trace!("🚦️ Budget changed while waiting for a slot"),
                _ = shutdown.wait() => return Admission::ShuttingDown,
            }
        }
    }

    /// Replaces the budget, effective immediately.
    pub fn update(&self, requests_per_minute: i64) {
        self.replace(RateBudget::new(requests_per_minute, Instant::now()));
    }

    /// Replaces the budget, but admits nothing until `delay` has passed.
    pub fn update_after(&self, requests_per_minute: i64, delay: Duration) {
        self.replace(RateBudget::new(requests_per_minute, Instant::now() + delay));
    }

    pub fn budget(&self) -> RateBudget {
        self.pacing.lock().unwrap_or_else(PoisonError::into_inner).budget
    }

    fn replace(&self, budget: RateBudget) {
        match budget.requests_per_minute {
            Some(rpm) => info!("🚦️ Accrual service budget is now {rpm} requests per minute"),
            None => info!("🚦️ Accrual service requests are no longer throttled"),
        }
        let mut pacing = self.pacing.lock().unwrap_or_else(PoisonError::into_inner);
        pacing.replace(budget, Instant::now());
        self.budget_changed.notify_waiters();
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::accrual::ShutdownSignal;

    fn governor() -> (ShutdownSignal, Arc<RateGovernor>) {
        let signal = ShutdownSignal::new();
        let governor = Arc::new(RateGovernor::new(signal.listener()));
        (signal, governor)
    }

    #[test]
    fn budget_from_advertised_rate() {
        let now = Instant::now();
        assert_eq!(RateBudget::new(0, now).requests_per_minute, None);
        assert_eq!(RateBudget::new(-5, now).interval(), None);
        assert_eq!(RateBudget::new(5, now).interval(), Some(Duration::from_secs(12)));
        assert_eq!(RateBudget::new(120, now).interval(), Some(Duration::from_millis(500)));
        assert_eq!(RateBudget::new(i64::MAX, now).requests_per_minute, Some(u32::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_admits_immediately() {
        let (_signal, governor) = governor();
        let start = Instant::now();
        for _ in 0..100 {
            assert_eq!(governor.admit().await, Admission::Proceed);
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(governor.budget().requests_per_minute, None);
    }

    #[tokio::test(start_paused = true)]
    async fn admissions_are_spaced_by_the_budget() {
        let (_signal, governor) = governor();
        governor.update(60);
        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(governor.admit().await, Admission::Proceed);
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_budget() {
        let (_signal, governor) = governor();
        governor.update(30);
        let tasks = (0..5)
            .map(|_| {
                let governor = governor.clone();
                tokio::spawn(async move {
                    assert_eq!(governor.admit().await, Admission::Proceed);
                    Instant::now()
                })
            })
            .collect::<Vec<_>>();
        let mut admitted = Vec::new();
        for task in tasks {
            admitted.push(task.await.unwrap());
        }
        admitted.sort();
        for pair in admitted.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2), "admissions too close: {:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slower_budget_applies_from_the_last_slot() {
        let (_signal, governor) = governor();
        // Unthrottled traffic, then the service tells us we have overdone it
        governor.admit().await;
        let last = Instant::now();
        governor.update(6);
        governor.admit().await;
        assert!(last.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_disables_throttling() {
        let (_signal, governor) = governor();
        governor.update(1);
        governor.admit().await;
        governor.update(0);
        let start = Instant::now();
        governor.admit().await;
        governor.admit().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    fn spawn_waiters(governor: &Arc<RateGovernor>, n: usize) -> Vec<tokio::task::JoinHandle<Instant>> {
        (0..n)
            .map(|_| {
                let governor = governor.clone();
                tokio::spawn(async move {
                    assert_eq!(governor.admit().await, Admission::Proceed);
                    Instant::now()
                })
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn lifting_the_throttle_releases_waiting_callers() {
        let (_signal, governor) = governor();
        let start = Instant::now();
        governor.update(1);
        let waiters = spawn_waiters(&governor, 4);
        tokio::time::sleep(Duration::from_secs(1)).await;
        governor.update(0);
        for waiter in waiters {
            let admitted_at = waiter.await.unwrap();
            assert!(admitted_at - start <= Duration::from_secs(1), "admitted after {:?}", admitted_at - start);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn faster_budget_reschedules_waiting_callers() {
        let (_signal, governor) = governor();
        let start = Instant::now();
        governor.update(1);
        governor.admit().await;
        let waiters = spawn_waiters(&governor, 2);
        tokio::time::sleep(Duration::from_secs(1)).await;
        governor.update(60);
        let mut admitted = Vec::new();
        for waiter in waiters {
            admitted.push(waiter.await.unwrap() - start);
        }
        admitted.sort();
        assert!(admitted[0] >= Duration::from_secs(2) && admitted[0] < Duration::from_millis(2100), "{admitted:?}");
        assert!(admitted[1] >= Duration::from_secs(3) && admitted[1] < Duration::from_millis(3100), "{admitted:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_reservations_do_not_delay_a_new_budget() {
        let (_signal, governor) = governor();
        governor.update(1);
        let waiters = spawn_waiters(&governor, 4);
        tokio::time::sleep(Duration::from_secs(1)).await;
        for waiter in waiters {
            waiter.abort();
        }
        governor.update(0);
        let start = Instant::now();
        governor.admit().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        // A tighter budget after an unthrottled stretch spaces from the last real admission
        governor.update(600);
        governor.admit().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(200), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_delays_the_next_admission() {
        let (_signal, governor) = governor();
        let start = Instant::now();
        governor.update_after(10, Duration::from_secs(30));
        assert_eq!(governor.budget().requests_per_minute, Some(10));
        assert_eq!(governor.budget().effective_from, start + Duration::from_secs(30));
        governor.admit().await;
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_a_waiting_admission() {
        let (signal, governor) = governor();
        governor.update(1);
        governor.admit().await;
        let start = Instant::now();
        let waiting = {
            let governor = governor.clone();
            tokio::spawn(async move { governor.admit().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        signal.trigger();
        assert_eq!(waiting.await.unwrap(), Admission::ShuttingDown);
        assert!(start.elapsed() < Duration::from_secs(60));
        assert_eq!(governor.admit().await, Admission::ShuttingDown);
    }
}
