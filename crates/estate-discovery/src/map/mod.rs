//! Map controller: surface lifecycle, marker reconciliation, and viewport rules.

mod controller;
pub mod reconcile;
pub mod surface;
pub mod viewport;

#[cfg(test)]
mod tests;

pub use controller::{
    EventLog, FitReason, MapController, MapError, MapEvent, MapEventSink, MapOptions, MapPhase,
    MapViewState, ReconcileReport,
};
pub use reconcile::{reconcile, MarkerDiff};
pub use surface::{HeadlessSurface, MapSurface, MarkerHandle, MarkerSpec, SurfaceError};
pub use viewport::{fit_bounds, Viewport};
