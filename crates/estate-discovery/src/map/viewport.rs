use serde::Serialize;
use std::f64::consts::PI;

use crate::geo::{BoundingBox, Coordinate};

const TILE_SIZE_PX: f64 = 256.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;
pub const MIN_ZOOM: f64 = 0.0;
/// Cap for fits over a single point or a very tight cluster.
pub const MAX_FIT_ZOOM: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
}

fn mercator_y(latitude: f64) -> f64 {
    let phi = latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    (PI / 4.0 + phi / 2.0).tan().ln()
}

fn inverse_mercator_y(y: f64) -> f64 {
    (2.0 * y.exp().atan() - PI / 2.0).to_degrees()
}

/// Largest whole zoom at which `bounds` fits inside the canvas minus padding.
pub fn fit_bounds(bounds: &BoundingBox, size_px: (u32, u32), padding_px: u32) -> Viewport {
    let usable_width = (f64::from(size_px.0) - 2.0 * f64::from(padding_px)).max(1.0);
    let usable_height = (f64::from(size_px.1) - 2.0 * f64::from(padding_px)).max(1.0);

    let north_y = mercator_y(bounds.north);
    let south_y = mercator_y(bounds.south);

    let lon_fraction = (bounds.east - bounds.west) / 360.0;
    let lat_fraction = (north_y - south_y) / (2.0 * PI);

    let zoom_for = |pixels: f64, fraction: f64| {
        if fraction <= 0.0 {
            MAX_FIT_ZOOM
        } else {
            (pixels / TILE_SIZE_PX / fraction).log2()
        }
    };

    let zoom = zoom_for(usable_width, lon_fraction)
        .min(zoom_for(usable_height, lat_fraction))
        .floor()
        .clamp(MIN_ZOOM, MAX_FIT_ZOOM);

    Viewport {
        center: Coordinate {
            latitude: inverse_mercator_y((north_y + south_y) / 2.0),
            longitude: (bounds.west + bounds.east) / 2.0,
        },
        zoom,
    }
}
