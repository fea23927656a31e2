//! Single-flight token refresh.
//!
//! Any number of requests can fail with 401 at the same time. The first one
//! to reach the [`RefreshCoordinator`] becomes the leader and runs the
//! exchange; everyone arriving while it is in flight queues as a waiter and
//! receives the leader's outcome. Waiters are notified in arrival order and
//! the queue is drained exactly once per refresh.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result of a refresh, as delivered to the leader and every waiter.
#[derive(Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token is available.
    Refreshed(String),
    /// The refresh failed; the session is gone.
    Failed,
}

impl std::fmt::Debug for RefreshOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refreshed(_) => f.write_str("Refreshed(<token>)"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

#[derive(Default)]
struct FlightState {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Serializes refresh attempts for one client.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<FlightState>,
    exchanges: AtomicU64,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of callers waiting on the current refresh.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Number of refresh exchanges started since creation.
    pub fn exchanges_started(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Joins the current refresh, or leads a new one by running `refresh`.
    ///
    /// `refresh` only runs when no refresh is in flight. A waiter whose
    /// leader disappears without settling receives [`RefreshOutcome::Failed`].
    pub async fn request_refresh<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let waiter = {
            let mut state = self.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                debug!(position = state.waiters.len(), "Refresh in flight, queued as waiter");
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            return rx.await.unwrap_or(RefreshOutcome::Failed);
        }

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        debug!("Leading token refresh");

        let flight = Flight {
            coordinator: self,
            settled: false,
        };
        let outcome = refresh().await;
        flight.settle(outcome.clone());
        outcome
    }

    /// Clears the in-flight marker and notifies every queued waiter.
    fn finish(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), outcome = ?outcome, "Refresh settled");
        for waiter in waiters {
            // A waiter whose request was dropped has nobody left to notify.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &state.refreshing)
            .field("waiters", &state.waiters.len())
            .field("exchanges", &self.exchanges_started())
            .finish()
    }
}

/// Leader's hold on the in-flight refresh.
///
/// Dropping it unsettled (the leader's future was cancelled) fails the
/// flight so waiters are not left hanging.
struct Flight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl Flight<'_> {
    fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.coordinator.finish(&outcome);
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Refresh leader dropped before settling, failing waiters");
            self.coordinator.finish(&RefreshOutcome::Failed);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    async fn not_leader() -> RefreshOutcome {
        panic!("waiters never run the exchange")
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        while !condition() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_single_caller_leads() {
        let coordinator = RefreshCoordinator::new();
        let outcome = coordinator
            .request_refresh(|| async { RefreshOutcome::Refreshed("t1".to_string()) })
            .await;

        assert_eq!(outcome, RefreshOutcome::Refreshed("t1".to_string()));
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.exchanges_started(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();
        let gate = Arc::new(tokio::sync::Mutex::new(Some(gate)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let runs = Arc::clone(&runs);
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                coordinator
                    .request_refresh(|| async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        if let Some(gate) = gate.lock().await.take() {
                            let _ = gate.await;
                        }
                        RefreshOutcome::Refreshed("fresh".to_string())
                    })
                    .await
            }));
        }

        wait_until(|| coordinator.waiting() == 7).await;
        release.send(()).unwrap();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                RefreshOutcome::Refreshed("fresh".to_string())
            );
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.exchanges_started(), 1);
        assert_eq!(coordinator.waiting(), 0);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_failure_fans_out_to_all_waiters() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let (release, gate) = oneshot::channel::<()>();

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .request_refresh(|| async move {
                        let _ = gate.await;
                        RefreshOutcome::Failed
                    })
                    .await
            })
        };
        wait_until(|| coordinator.is_refreshing()).await;

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move {
                    coordinator.request_refresh(not_leader).await
                })
            })
            .collect();
        wait_until(|| coordinator.waiting() == 3).await;
        release.send(()).unwrap();

        assert_eq!(leader.await.unwrap(), RefreshOutcome::Failed);
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), RefreshOutcome::Failed);
        }
    }

    #[tokio::test]
    async fn test_waiters_notified_in_arrival_order() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let (release, gate) = oneshot::channel::<()>();

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .request_refresh(|| async move {
                        let _ = gate.await;
                        RefreshOutcome::Refreshed("t".to_string())
                    })
                    .await
            })
        };
        wait_until(|| coordinator.is_refreshing()).await;

        let mut waiters = Vec::new();
        for (position, label) in ["A", "B", "C"].into_iter().enumerate() {
            let waiter = Arc::clone(&coordinator);
            let order = Arc::clone(&order);
            waiters.push(tokio::spawn(async move {
                waiter.request_refresh(not_leader).await;
                order.lock().unwrap().push(label);
            }));
            wait_until(|| coordinator.waiting() == position + 1).await;
        }

        release.send(()).unwrap();
        leader.await.unwrap();
        for waiter in waiters {
            waiter.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_next_refresh_starts_fresh_flight() {
        let coordinator = RefreshCoordinator::new();
        coordinator
            .request_refresh(|| async { RefreshOutcome::Failed })
            .await;
        let second = coordinator
            .request_refresh(|| async { RefreshOutcome::Refreshed("t2".to_string()) })
            .await;

        assert_eq!(second, RefreshOutcome::Refreshed("t2".to_string()));
        assert_eq!(coordinator.exchanges_started(), 2);
    }

    #[tokio::test]
    async fn test_dropped_leader_fails_waiters() {
        let coordinator = Arc::new(RefreshCoordinator::new());

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .request_refresh(|| std::future::pending::<RefreshOutcome>())
                    .await
            })
        };
        wait_until(|| coordinator.is_refreshing()).await;

        let waiter = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator.request_refresh(not_leader).await
            })
        };
        wait_until(|| coordinator.waiting() == 1).await;

        leader.abort();
        assert_eq!(waiter.await.unwrap(), RefreshOutcome::Failed);
        assert!(!coordinator.is_refreshing());
    }
}
