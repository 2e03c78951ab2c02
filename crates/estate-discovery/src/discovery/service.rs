use serde::{Deserialize, Serialize};

use super::aggregator::{EntityAggregator, SourceFailure};
use super::domain::{EntityKind, MarkerCategory, RankedEntity};
use super::filter::{apply_filters, rank, sort_entities, FilterCriteria, FilterError, SortOrder};
use crate::geo::{BoundingBox, Coordinate, GeoError};

/// Stateless search over a fresh fetch cycle.
#[derive(Debug, Clone)]
pub struct DiscoveryService {
    aggregator: EntityAggregator,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub criteria: FilterCriteria,
    /// User position reported by the client, if it granted location access.
    #[serde(default)]
    pub origin: Option<Coordinate>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub distance_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    pub failures: Vec<SourceFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_warning: Option<String>,
    pub results: Vec<SearchResultView>,
}

/// Result card and marker data for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultView {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    pub city: Option<String>,
    pub category: MarkerCategory,
    pub marker_color: &'static str,
    pub coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub detail_path: String,
}

impl From<&RankedEntity> for SearchResultView {
    fn from(ranked: &RankedEntity) -> Self {
        let entity = &ranked.entity;
        Self {
            kind: entity.kind(),
            id: entity.id.0.clone(),
            title: entity.title().to_string(),
            city: entity.city.clone(),
            category: entity.category,
            marker_color: entity.category.color(),
            coordinate: entity.coordinate,
            distance_km: ranked.distance_km,
            price: entity.price(),
            detail_path: entity.detail_route().path(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid origin: {0}")]
    InvalidOrigin(#[from] GeoError),
}

impl DiscoveryService {
    pub fn new(aggregator: EntityAggregator) -> Self {
        Self { aggregator }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let origin = request
            .origin
            .map(|point| Coordinate::try_new(point.latitude, point.longitude))
            .transpose()?;

        let snapshot = self.aggregator.fetch_entities().await;
        let ranked = rank(&snapshot.entities, origin);
        let filtered = apply_filters(&ranked, &request.criteria);
        let sorted = sort_entities(filtered, request.sort);

        let filter_warning = request
            .criteria
            .validate()
            .err()
            .map(|err: FilterError| err.to_string());

        Ok(SearchResponse {
            total: sorted.len(),
            distance_enabled: origin.is_some(),
            bounds: BoundingBox::enclosing(sorted.iter().map(|ranked| ranked.entity.coordinate)),
            failures: snapshot.failures,
            filter_warning,
            results: sorted.iter().map(SearchResultView::from).collect(),
        })
    }
}
