//! Entity aggregation, filtering, ranking, and the search surface.

pub mod aggregator;
pub mod catalog;
pub mod domain;
pub mod feeds;
pub mod filter;
mod normalizer;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod tests;

pub use aggregator::{AggregateSnapshot, EntityAggregator, SourceFailure};
pub use catalog::{Catalog, CatalogError};
pub use domain::{
    DetailRoute, EntityDetails, EntityId, EntityKey, EntityKind, ListingDetails, ListingType,
    LocatedEntity, MarkerCategory, ProfessionalDetails, Profession, ProjectDetails, PropertyType,
    RankedEntity,
};
pub use feeds::{
    DeveloperProjectFeed, DeveloperProjectRecord, FeedError, ListingFeed, ListingRecord,
    ProfessionalFeed, ProfessionalRecord, ProfileDirectory, SourceKind,
};
pub use filter::{
    apply_filters, rank, rank_by_distance, sort_entities, FilterCriteria, FilterError, SortOrder,
    ValueRange,
};
pub use router::discovery_router;
pub use service::{DiscoveryService, SearchError, SearchRequest, SearchResponse, SearchResultView};
pub use session::{DiscoverySession, FetchOutcome, FilterDebouncer};
