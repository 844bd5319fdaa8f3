//! Lazy Demand CRD watcher.
//!
//! The Demand CRD is optional: it may not be installed when the process
//! starts, and it can appear at any time afterwards. This module polls
//! discovery until the CRD is established, then brings up the demand cache
//! and publishes its handle to consumers.

use crate::backoff::ExponentialBackoff;
use crate::error::ControllerError;
use crds::Demand;
use demand_client::DemandClientTrait;
use kube_runtime::reflector::Store;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Timing knobs for the CRD poll and the cache sync retries.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How often discovery is checked for the Demand CRD
    pub poll_interval: Duration,
    /// Budget for a single cache sync attempt
    pub sync_timeout: Duration,
    /// Sync attempts per poll tick before deferring to the next tick
    pub sync_max_attempts: u32,
    /// First pause between sync attempts; doubles on each retry
    pub sync_initial_backoff: Duration,
    /// Cap on the pause between sync attempts
    pub sync_max_backoff: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            sync_timeout: Duration::from_secs(2),
            sync_max_attempts: 5,
            sync_initial_backoff: Duration::from_millis(500),
            sync_max_backoff: Duration::from_secs(10),
        }
    }
}

/// The demand cache latch. Advances from `Waiting` to `Ready` exactly once,
/// never backward.
enum WatchState {
    /// CRD not yet confirmed; no cache exists
    Waiting,
    /// Cache synced and readable
    Ready(Store<Demand>),
}

/// Outcome of a single discovery poll.
enum PollOutcome {
    Pending,
    Ready,
    Cancelled,
}

/// Lazily starts the demand cache once the Demand CRD exists.
///
/// [`DemandWatcher::start`] polls discovery on a fixed interval. Once the CRD
/// is established and the cache has completed its initial sync, the store
/// handle is published and the readiness signal fires; both stay valid for
/// the rest of the process lifetime.
pub struct DemandWatcher<C> {
    client: Arc<C>,
    config: WatcherConfig,
    state: RwLock<WatchState>,
    ready_tx: watch::Sender<bool>,
}

impl<C: DemandClientTrait> DemandWatcher<C> {
    /// Creates a new watcher. Nothing runs until [`DemandWatcher::start`].
    pub fn new(client: Arc<C>, config: WatcherConfig) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            client,
            config,
            state: RwLock::new(WatchState::Waiting),
            ready_tx,
        }
    }

    /// Returns the demand store handle, or `None` before the cache is ready.
    ///
    /// Safe for concurrent use.
    pub fn store(&self) -> Option<Store<Demand>> {
        match &*self.state.read().expect("watch state lock poisoned") {
            WatchState::Ready(store) => Some(store.clone()),
            WatchState::Waiting => None,
        }
    }

    /// Returns a receiver that observes `true` once the store is ready.
    ///
    /// The flip happens exactly once, strictly after the store handle is
    /// published; any number of waiters may subscribe, before or after the
    /// fact.
    pub fn ready_signal(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }

    /// Waits until the store is ready.
    pub async fn wait_ready(&self) {
        let mut ready = self.ready_tx.subscribe();
        while !*ready.borrow_and_update() {
            if ready.changed().await.is_err() {
                return;
            }
        }
    }

    /// Polls discovery until the Demand CRD is established and the cache has
    /// synced, or `shutdown` fires, whichever comes first.
    ///
    /// Discovery and sync failures are transient: they are logged and retried
    /// on a later tick. Only cancellation ends the loop early, and it does so
    /// cleanly with `Ok(())`.
    pub async fn start(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ControllerError> {
        info!("Starting demand CRD watcher");

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("demand CRD watcher stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }
            match self.poll_once(&mut shutdown).await {
                PollOutcome::Pending => {}
                PollOutcome::Ready => {
                    info!("demand store ready");
                    return Ok(());
                }
                PollOutcome::Cancelled => {
                    info!("demand CRD watcher stopping");
                    return Ok(());
                }
            }
        }
    }

    async fn poll_once(&self, shutdown: &mut watch::Receiver<bool>) -> PollOutcome {
        match self.client.crd_established().await {
            Err(err) => {
                info!(error = %err, "failed to determine whether the demand CRD exists");
                PollOutcome::Pending
            }
            Ok(false) => {
                debug!("demand CRD not yet registered");
                PollOutcome::Pending
            }
            Ok(true) => {
                info!("demand CRD is established, demand resources can now be created");
                self.sync_store(shutdown).await
            }
        }
    }

    /// Brings up the cache and retries the initial sync under a bounded
    /// per-attempt timeout. Exhausting the attempts is not fatal: the CRD may
    /// still be mid-registration, so the outer poll tries again next tick.
    async fn sync_store(&self, shutdown: &mut watch::Receiver<bool>) -> PollOutcome {
        let store = self.client.start_informer();
        let mut backoff = ExponentialBackoff::new(
            self.config.sync_initial_backoff,
            self.config.sync_max_backoff,
        );
        for attempt in 1..=self.config.sync_max_attempts {
            if attempt > 1 {
                let pause = backoff.next_backoff();
                tokio::select! {
                    _ = shutdown.changed() => return PollOutcome::Cancelled,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
            let sync = tokio::time::timeout(self.config.sync_timeout, self.client.wait_synced());
            tokio::select! {
                _ = shutdown.changed() => return PollOutcome::Cancelled,
                result = sync => match result {
                    Ok(Ok(())) => {
                        self.publish(store);
                        return PollOutcome::Ready;
                    }
                    Ok(Err(err)) => warn!(attempt, error = %err, "demand cache sync failed"),
                    Err(_) => warn!(
                        attempt,
                        timeout = ?self.config.sync_timeout,
                        "timed out waiting for demand cache sync"
                    ),
                }
            }
        }
        warn!(
            attempts = self.config.sync_max_attempts,
            "demand cache did not sync, will retry on the next tick"
        );
        PollOutcome::Pending
    }

    /// Publish the handle, then fire the readiness signal. The ordering is
    /// the invariant: a waiter woken by the signal must observe a non-empty
    /// handle.
    fn publish(&self, store: Store<Demand>) {
        {
            let mut state = self.state.write().expect("watch state lock poisoned");
            *state = WatchState::Ready(store);
        }
        self.ready_tx.send_replace(true);
    }
}
