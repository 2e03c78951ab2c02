//! Geospatial discovery engine for a real-estate marketplace.
//!
//! Aggregates listings, professional offices, and developer projects into one
//! coordinate-bearing working set, filters and ranks it relative to the user's
//! location, and keeps a map surface's marker set consistent with the result.

pub mod config;
pub mod discovery;
pub mod error;
pub mod finance;
pub mod geo;
pub mod map;
pub mod telemetry;
