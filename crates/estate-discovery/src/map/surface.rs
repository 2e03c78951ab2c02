use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::viewport::Viewport;
use crate::discovery::domain::{EntityKey, MarkerCategory};
use crate::geo::Coordinate;

/// Opaque id the surface hands out for a placed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerHandle(pub u64);

/// Everything a surface needs to draw one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub key: EntityKey,
    pub coordinate: Coordinate,
    pub category: MarkerCategory,
    pub color: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("map surface could not attach: {0}")]
    Attach(String),
    #[error("marker rejected by map surface: {0}")]
    Marker(String),
}

/// Rendering backend driven by [`MapController`](super::MapController).
///
/// Implementations wrap a concrete map widget with a slippy tile layer.
pub trait MapSurface {
    /// Creates the canvas and base layer at the initial viewport.
    fn attach(&mut self, view: Viewport) -> Result<(), SurfaceError>;
    /// True once tiles are attached and the canvas has a size.
    fn is_renderable(&self) -> bool;
    /// Canvas size in pixels, used for bounds fitting.
    fn size_px(&self) -> (u32, u32);
    fn add_marker(&mut self, spec: MarkerSpec) -> Result<MarkerHandle, SurfaceError>;
    fn remove_marker(&mut self, handle: MarkerHandle);
    fn set_view(&mut self, view: Viewport);
    fn destroy(&mut self);
}

/// Headless surface that keeps its state in memory and counts operations.
///
/// Used by the CLI walkthrough and by tests.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    size: (u32, u32),
    tiles_loaded: Arc<AtomicBool>,
    attached: bool,
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, MarkerSpec>,
    view: Option<Viewport>,
    pub adds: usize,
    pub removes: usize,
    pub view_changes: usize,
    pub destroy_calls: usize,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            tiles_loaded: Arc::new(AtomicBool::new(true)),
            attached: false,
            next_handle: 1,
            markers: BTreeMap::new(),
            view: None,
            adds: 0,
            removes: 0,
            view_changes: 0,
            destroy_calls: 0,
        }
    }

    /// Surface that stays unrenderable until [`HeadlessSurface::finish_loading`].
    pub fn deferred(width: u32, height: u32) -> Self {
        Self {
            tiles_loaded: Arc::new(AtomicBool::new(false)),
            ..Self::new(width, height)
        }
    }

    /// Signals that the tile layer finished loading.
    pub fn finish_loading(&self) {
        self.tiles_loaded.store(true, Ordering::Release);
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerSpec> {
        self.markers.values()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn view(&self) -> Option<Viewport> {
        self.view
    }
}

impl MapSurface for HeadlessSurface {
    fn attach(&mut self, view: Viewport) -> Result<(), SurfaceError> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(SurfaceError::Attach("canvas has no size".to_string()));
        }
        self.attached = true;
        self.view = Some(view);
        Ok(())
    }

    fn is_renderable(&self) -> bool {
        self.attached && self.tiles_loaded.load(Ordering::Acquire)
    }

    fn size_px(&self) -> (u32, u32) {
        self.size
    }

    fn add_marker(&mut self, spec: MarkerSpec) -> Result<MarkerHandle, SurfaceError> {
        if !self.attached {
            return Err(SurfaceError::Marker("surface not attached".to_string()));
        }
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.markers.insert(handle, spec);
        self.adds += 1;
        Ok(handle)
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            self.removes += 1;
        }
    }

    fn set_view(&mut self, view: Viewport) {
        self.view = Some(view);
        self.view_changes += 1;
    }

    fn destroy(&mut self) {
        self.destroy_calls += 1;
        self.markers.clear();
        self.attached = false;
    }
}
