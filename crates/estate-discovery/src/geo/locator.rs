use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Coordinate;

/// Typed failure from the platform location API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location request timed out")]
    Timeout,
    #[error("location is not supported on this platform")]
    Unsupported,
}

/// Platform API yielding the device position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// Provider answering with a position known up front, e.g. from request parameters.
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    position: Option<Coordinate>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        self.position.ok_or(GeolocationError::Unsupported)
    }
}

/// Whether a request may be answered from the session cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    PreferCached,
    Refresh,
}

/// Session-scoped wrapper around a [`LocationProvider`].
pub struct Geolocator {
    provider: Arc<dyn LocationProvider>,
    timeout: Duration,
    cached: Mutex<Option<Coordinate>>,
    loading: AtomicBool,
}

struct LoadingFlag<'a>(&'a AtomicBool);

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Geolocator {
    pub fn new(provider: Arc<dyn LocationProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            cached: Mutex::new(None),
            loading: AtomicBool::new(false),
        }
    }

    /// True while a provider request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn cached(&self) -> Option<Coordinate> {
        *self.cached.lock().expect("location cache mutex poisoned")
    }

    pub fn forget(&self) {
        self.cached
            .lock()
            .expect("location cache mutex poisoned")
            .take();
    }

    pub async fn request_location(
        &self,
        policy: CachePolicy,
    ) -> Result<Coordinate, GeolocationError> {
        if policy == CachePolicy::PreferCached {
            if let Some(position) = self.cached() {
                debug!("serving cached user location");
                return Ok(position);
            }
        }

        self.loading.store(true, Ordering::Release);
        let _flag = LoadingFlag(&self.loading);

        let outcome = match tokio::time::timeout(self.timeout, self.provider.current_position())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GeolocationError::Timeout),
        };

        match outcome {
            Ok(position) => {
                *self.cached.lock().expect("location cache mutex poisoned") = Some(position);
                Ok(position)
            }
            Err(err) => {
                warn!(error = %err, "user location unavailable; distance features disabled");
                Err(err)
            }
        }
    }

    /// Resolves to the user position, or `None` when location is unavailable.
    pub async fn locate_or_degrade(&self, policy: CachePolicy) -> Option<Coordinate> {
        self.request_location(policy).await.ok()
    }
}

impl std::fmt::Debug for Geolocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geolocator")
            .field("timeout", &self.timeout)
            .field("cached", &self.cached())
            .finish_non_exhaustive()
    }
}
