//! Read-only feed contracts for the three entity sources.
//!
//! Each source returns its own record shape; the normalizer turns them into
//! [`LocatedEntity`](super::domain::LocatedEntity) values.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which of the three sources a record or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Listings,
    Professionals,
    DeveloperProjects,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Listings => "listings",
            SourceKind::Professionals => "professionals",
            SourceKind::DeveloperProjects => "developer_projects",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),
    #[error("feed returned malformed data: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub title: String,
    pub listing_type: String,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub area_sqm: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub listed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalRecord {
    pub id: String,
    pub office_name: String,
    pub profession: String,
    /// Profile the display name is resolved from.
    #[serde(default)]
    pub owner_profile_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperProjectRecord {
    pub id: String,
    pub name: String,
    pub developer_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub starting_price: Option<f64>,
    #[serde(default)]
    pub unit_count: Option<u32>,
    #[serde(default)]
    pub expected_completion: Option<NaiveDate>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[async_trait]
pub trait ListingFeed: Send + Sync {
    async fn fetch_located_listings(&self) -> Result<Vec<ListingRecord>, FeedError>;
}

#[async_trait]
pub trait ProfessionalFeed: Send + Sync {
    async fn fetch_located_professionals(&self) -> Result<Vec<ProfessionalRecord>, FeedError>;
}

#[async_trait]
pub trait DeveloperProjectFeed: Send + Sync {
    async fn fetch_located_projects(&self) -> Result<Vec<DeveloperProjectRecord>, FeedError>;
}

/// Best-effort lookup of profile display names keyed by profile id.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn display_names(
        &self,
        profile_ids: &[String],
    ) -> Result<HashMap<String, String>, FeedError>;
}
