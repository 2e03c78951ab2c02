use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use super::reconcile::reconcile;
use super::surface::{MapSurface, MarkerHandle, MarkerSpec, SurfaceError};
use super::viewport::{fit_bounds, Viewport};
use crate::discovery::domain::{DetailRoute, EntityKey, LocatedEntity, RankedEntity};
use crate::geo::{BoundingBox, Coordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapPhase {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

impl fmt::Display for MapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MapPhase::Uninitialized => "uninitialized",
            MapPhase::Initializing => "initializing",
            MapPhase::Ready => "ready",
            MapPhase::Destroyed => "destroyed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitReason {
    /// First non-empty entity set after mount.
    Initial,
    /// The user changed a filter and asked the map to follow.
    UserFilterChange,
    /// Explicit "fit to results" action.
    Explicit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    PhaseChanged(MapPhase),
    SelectionChanged(Option<LocatedEntity>),
    NavigationRequested(DetailRoute),
    ViewportFitted { viewport: Viewport, reason: FitReason },
}

/// Receiver for controller events; the only way state leaves the controller.
pub trait MapEventSink: Send + Sync {
    fn emit(&self, event: MapEvent);
}

/// Sink that buffers events until drained.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<MapEvent>>,
}

impl EventLog {
    pub fn drain(&self) -> Vec<MapEvent> {
        std::mem::take(&mut *self.events.lock().expect("event log mutex poisoned"))
    }
}

impl MapEventSink for EventLog {
    fn emit(&self, event: MapEvent) {
        self.events
            .lock()
            .expect("event log mutex poisoned")
            .push(event);
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("cannot {operation} while map is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: MapPhase,
    },
    #[error("no marker for {0}")]
    UnknownEntity(EntityKey),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapOptions {
    pub initial_view: Viewport,
    pub fit_padding_px: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            initial_view: Viewport {
                center: Coordinate {
                    latitude: 24.7136,
                    longitude: 46.6753,
                },
                zoom: 6.0,
            },
            fit_padding_px: 50,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveMarker {
    handle: MarkerHandle,
    entity: RankedEntity,
}

/// View state owned by the controller; readable, never mutable from outside.
#[derive(Debug, Clone)]
pub struct MapViewState {
    center: Coordinate,
    zoom: f64,
    has_fitted_initial_bounds: bool,
    active_markers: HashMap<EntityKey, ActiveMarker>,
}

impl MapViewState {
    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn has_fitted_initial_bounds(&self) -> bool {
        self.has_fitted_initial_bounds
    }

    pub fn marker_count(&self) -> usize {
        self.active_markers.len()
    }

    pub fn marker_handle(&self, key: &EntityKey) -> Option<MarkerHandle> {
        self.active_markers.get(key).map(|marker| marker.handle)
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            center: self.center,
            zoom: self.zoom,
        }
    }
}

/// Outcome of applying an entity set to the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    /// Kept markers whose position, category or label is unchanged.
    pub retained: usize,
    /// Kept markers re-placed because what they draw changed.
    pub updated: usize,
    pub fitted: Option<FitReason>,
    /// Stored for later because the surface is not renderable yet.
    pub deferred: bool,
}

/// Owns one map surface and its marker set for the lifetime of a view.
pub struct MapController<S: MapSurface> {
    surface: S,
    sink: Arc<dyn MapEventSink>,
    options: MapOptions,
    phase: MapPhase,
    state: MapViewState,
    selection: Option<EntityKey>,
    pending: Option<Vec<RankedEntity>>,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(surface: S, sink: Arc<dyn MapEventSink>, options: MapOptions) -> Self {
        let state = MapViewState {
            center: options.initial_view.center,
            zoom: options.initial_view.zoom,
            has_fitted_initial_bounds: false,
            active_markers: HashMap::new(),
        };

        Self {
            surface,
            sink,
            options,
            phase: MapPhase::Uninitialized,
            state,
            selection: None,
            pending: None,
        }
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn view_state(&self) -> &MapViewState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn selected(&self) -> Option<&LocatedEntity> {
        self.selection
            .as_ref()
            .and_then(|key| self.state.active_markers.get(key))
            .map(|marker| &marker.entity.entity)
    }

    /// Attaches the surface; the controller becomes `Ready` once it can render.
    pub fn mount(&mut self) -> Result<MapPhase, MapError> {
        self.require(MapPhase::Uninitialized, "mount")?;
        self.surface.attach(self.state.viewport())?;
        self.transition(MapPhase::Initializing);
        self.poll_ready()?;
        Ok(self.phase)
    }

    /// Promotes `Initializing` to `Ready` when the surface reports it can render,
    /// then applies any entity set that arrived in the meantime.
    pub fn poll_ready(&mut self) -> Result<bool, MapError> {
        match self.phase {
            MapPhase::Ready => return Ok(true),
            MapPhase::Initializing => {}
            phase => {
                return Err(MapError::InvalidPhase {
                    operation: "poll readiness",
                    phase,
                })
            }
        }

        if !self.surface.is_renderable() {
            return Ok(false);
        }

        self.transition(MapPhase::Ready);
        if let Some(entities) = self.pending.take() {
            self.apply(&entities)?;
        }
        Ok(true)
    }

    /// Reconciles markers against a new filtered set without moving the viewport,
    /// except for the one-time fit on the first non-empty set.
    pub fn show(&mut self, entities: &[RankedEntity]) -> Result<ReconcileReport, MapError> {
        match self.phase {
            MapPhase::Ready => self.apply(entities),
            MapPhase::Initializing => {
                self.pending = Some(entities.to_vec());
                Ok(ReconcileReport {
                    deferred: true,
                    ..ReconcileReport::default()
                })
            }
            phase => Err(MapError::InvalidPhase {
                operation: "show markers",
                phase,
            }),
        }
    }

    /// Path for filter edits the user made deliberately: reconcile, then re-fit.
    pub fn show_after_user_filter(
        &mut self,
        entities: &[RankedEntity],
    ) -> Result<ReconcileReport, MapError> {
        self.require(MapPhase::Ready, "apply user filter")?;
        let mut report = self.apply(entities)?;
        if report.fitted.is_none() && self.fit_to_markers(FitReason::UserFilterChange).is_some() {
            report.fitted = Some(FitReason::UserFilterChange);
        }
        Ok(report)
    }

    /// Fits the viewport to the current markers on request.
    pub fn refit(&mut self) -> Result<Option<Viewport>, MapError> {
        self.require(MapPhase::Ready, "fit bounds")?;
        Ok(self.fit_to_markers(FitReason::Explicit))
    }

    /// Records a pan/zoom performed by the user on the surface.
    pub fn on_user_viewport(&mut self, center: Coordinate, zoom: f64) {
        if self.phase == MapPhase::Ready {
            self.state.center = center;
            self.state.zoom = zoom;
        }
    }

    pub fn select(&mut self, key: &EntityKey) -> Result<(), MapError> {
        self.require(MapPhase::Ready, "select marker")?;
        let marker = self
            .state
            .active_markers
            .get(key)
            .ok_or_else(|| MapError::UnknownEntity(key.clone()))?;

        if self.selection.as_ref() == Some(key) {
            return Ok(());
        }

        let entity = marker.entity.entity.clone();
        self.selection = Some(key.clone());
        self.sink.emit(MapEvent::SelectionChanged(Some(entity)));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.sink.emit(MapEvent::SelectionChanged(None));
        }
    }

    /// Emits a navigation intent toward the entity's detail view.
    pub fn open_detail(&mut self, key: &EntityKey) -> Result<DetailRoute, MapError> {
        self.require(MapPhase::Ready, "open detail")?;
        let marker = self
            .state
            .active_markers
            .get(key)
            .ok_or_else(|| MapError::UnknownEntity(key.clone()))?;
        let route = marker.entity.entity.detail_route();
        self.sink.emit(MapEvent::NavigationRequested(route.clone()));
        Ok(route)
    }

    /// Releases every marker and the surface. Calling it again does nothing.
    pub fn teardown(&mut self) {
        if self.phase == MapPhase::Destroyed {
            return;
        }

        for (_, marker) in self.state.active_markers.drain() {
            self.surface.remove_marker(marker.handle);
        }
        // A surface that was never attached has nothing to release.
        if self.phase != MapPhase::Uninitialized {
            self.surface.destroy();
        }
        self.selection = None;
        self.pending = None;
        self.transition(MapPhase::Destroyed);
    }

    fn apply(&mut self, entities: &[RankedEntity]) -> Result<ReconcileReport, MapError> {
        let diff = reconcile(&self.state.active_markers, entities);
        let mut report = ReconcileReport {
            added: diff.add.len(),
            removed: diff.remove.len(),
            ..ReconcileReport::default()
        };

        for key in &diff.remove {
            if let Some(marker) = self.state.active_markers.remove(key) {
                self.surface.remove_marker(marker.handle);
            }
            if self.selection.as_ref() == Some(key) {
                self.selection = None;
                self.sink.emit(MapEvent::SelectionChanged(None));
            }
        }

        for entity in diff.retained {
            let key = entity.key();
            let spec = marker_spec(entity);
            let Some(marker) = self.state.active_markers.get_mut(&key) else {
                continue;
            };
            if marker_spec(&marker.entity) == spec {
                marker.entity = entity.clone();
                report.retained += 1;
                continue;
            }

            self.surface.remove_marker(marker.handle);
            self.state.active_markers.remove(&key);
            let handle = self.surface.add_marker(spec)?;
            self.state.active_markers.insert(
                key,
                ActiveMarker {
                    handle,
                    entity: entity.clone(),
                },
            );
            report.updated += 1;
        }

        for entity in diff.add {
            let handle = self.surface.add_marker(marker_spec(entity))?;
            self.state.active_markers.insert(
                entity.key(),
                ActiveMarker {
                    handle,
                    entity: entity.clone(),
                },
            );
        }

        if !self.state.has_fitted_initial_bounds
            && !entities.is_empty()
            && self.fit_to_markers(FitReason::Initial).is_some()
        {
            self.state.has_fitted_initial_bounds = true;
            report.fitted = Some(FitReason::Initial);
        }

        debug!(
            added = report.added,
            removed = report.removed,
            retained = report.retained,
            updated = report.updated,
            "map markers reconciled"
        );
        Ok(report)
    }

    fn fit_to_markers(&mut self, reason: FitReason) -> Option<Viewport> {
        let bounds = BoundingBox::enclosing(
            self.state
                .active_markers
                .values()
                .map(|marker| marker.entity.entity.coordinate),
        )?;

        let viewport = fit_bounds(&bounds, self.surface.size_px(), self.options.fit_padding_px);
        self.surface.set_view(viewport);
        self.state.center = viewport.center;
        self.state.zoom = viewport.zoom;
        self.sink.emit(MapEvent::ViewportFitted { viewport, reason });
        Some(viewport)
    }

    fn require(&self, expected: MapPhase, operation: &'static str) -> Result<(), MapError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(MapError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn transition(&mut self, next: MapPhase) {
        debug!(from = %self.phase, to = %next, "map phase transition");
        self.phase = next;
        self.sink.emit(MapEvent::PhaseChanged(next));
    }
}

impl<S: MapSurface> Drop for MapController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn marker_spec(ranked: &RankedEntity) -> MarkerSpec {
    let entity = &ranked.entity;
    MarkerSpec {
        key: entity.key(),
        coordinate: entity.coordinate,
        category: entity.category,
        color: entity.category.color(),
        label: entity.title().to_string(),
    }
}
