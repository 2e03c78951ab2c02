use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use super::aggregator::{AggregateSnapshot, EntityAggregator};
use super::domain::RankedEntity;
use super::filter::{apply_filters, rank, sort_entities, FilterCriteria, SortOrder};
use crate::geo::{CachePolicy, Coordinate, Geolocator};

/// What happened to a fetch once it resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied {
        entities: usize,
        failed_sources: usize,
    },
    /// A newer fetch was requested while this one was in flight.
    Stale,
    /// The session was unmounted before the fetch resolved.
    Cancelled,
}

#[derive(Debug, Default)]
struct SessionState {
    snapshot: Option<Arc<AggregateSnapshot>>,
    origin: Option<Coordinate>,
}

/// One mounted discovery view: owns the fetched working set and the user origin.
///
/// Only the most recently requested fetch may write its result, and nothing is
/// written after [`DiscoverySession::unmount`].
pub struct DiscoverySession {
    aggregator: EntityAggregator,
    geolocator: Arc<Geolocator>,
    generation: AtomicU64,
    mounted: AtomicBool,
    shutdown: watch::Sender<bool>,
    state: Mutex<SessionState>,
}

impl DiscoverySession {
    pub fn new(aggregator: EntityAggregator, geolocator: Arc<Geolocator>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            aggregator,
            geolocator,
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
            shutdown,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub async fn refresh(&self) -> FetchOutcome {
        if !self.is_mounted() {
            return FetchOutcome::Cancelled;
        }

        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut shutdown = self.shutdown.subscribe();

        let snapshot = tokio::select! {
            snapshot = self.aggregator.fetch_entities() => snapshot,
            _ = shutdown.wait_for(|stopped| *stopped) => return FetchOutcome::Cancelled,
        };

        if !self.is_mounted() {
            return FetchOutcome::Cancelled;
        }
        if self.generation.load(Ordering::Acquire) != ticket {
            debug!(ticket, "discarding superseded fetch result");
            return FetchOutcome::Stale;
        }

        let outcome = FetchOutcome::Applied {
            entities: snapshot.entities.len(),
            failed_sources: snapshot.failures.len(),
        };
        self.lock_state().snapshot = Some(Arc::new(snapshot));
        outcome
    }

    /// Requests the user position; failure leaves distance features disabled.
    pub async fn locate(&self, policy: CachePolicy) -> Option<Coordinate> {
        if !self.is_mounted() {
            return None;
        }

        let mut shutdown = self.shutdown.subscribe();
        let origin = tokio::select! {
            origin = self.geolocator.locate_or_degrade(policy) => origin,
            _ = shutdown.wait_for(|stopped| *stopped) => return None,
        };

        if !self.is_mounted() {
            return None;
        }
        if origin.is_some() {
            self.lock_state().origin = origin;
        }
        origin
    }

    pub fn is_locating(&self) -> bool {
        self.geolocator.is_loading()
    }

    pub fn origin(&self) -> Option<Coordinate> {
        self.lock_state().origin
    }

    pub fn snapshot(&self) -> Option<Arc<AggregateSnapshot>> {
        self.lock_state().snapshot.clone()
    }

    /// Distance sort/filter controls are only meaningful with a known origin.
    pub fn distance_features_enabled(&self) -> bool {
        self.origin().is_some()
    }

    /// Synchronous filter and sort pass over the current working set.
    pub fn results(&self, criteria: &FilterCriteria, order: SortOrder) -> Vec<RankedEntity> {
        let (snapshot, origin) = {
            let state = self.lock_state();
            (state.snapshot.clone(), state.origin)
        };

        let Some(snapshot) = snapshot else {
            return Vec::new();
        };

        let ranked = rank(&snapshot.entities, origin);
        sort_entities(apply_filters(&ranked, criteria), order)
    }

    /// Cancels in-flight work and blocks any later writes. Idempotent.
    pub fn unmount(&self) {
        if self.mounted.swap(false, Ordering::AcqRel) {
            self.shutdown.send_replace(true);
            debug!("discovery session unmounted");
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state mutex poisoned")
    }
}

impl Drop for DiscoverySession {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Collapses bursts of filter edits into the last one.
#[derive(Debug)]
pub struct FilterDebouncer {
    window: Duration,
    latest: AtomicU64,
}

impl FilterDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: AtomicU64::new(0),
        }
    }

    /// Resolves to `Some(value)` only if no newer edit arrived within the window.
    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let ticket = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        tokio::time::sleep(self.window).await;
        (self.latest.load(Ordering::Acquire) == ticket).then_some(value)
    }
}
