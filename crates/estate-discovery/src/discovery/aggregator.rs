use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::LocatedEntity;
use super::feeds::{
    DeveloperProjectFeed, FeedError, ListingFeed, ProfessionalFeed, ProfessionalRecord,
    ProfileDirectory, SourceKind,
};
use super::normalizer::{normalize_listing, normalize_professional, normalize_project, Rejection};

/// A source that errored during a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub message: String,
}

/// Result of one fetch cycle across all sources.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSnapshot {
    pub entities: Vec<LocatedEntity>,
    pub failures: Vec<SourceFailure>,
    /// Records discarded for lacking a coordinate or a known category.
    pub dropped: usize,
    pub fetched_at: DateTime<Utc>,
}

impl AggregateSnapshot {
    pub fn empty() -> Self {
        Self {
            entities: Vec::new(),
            failures: Vec::new(),
            dropped: 0,
            fetched_at: Utc::now(),
        }
    }

    /// True when every source failed; the shell offers a retry in that case.
    pub fn is_total_failure(&self) -> bool {
        self.failures.len() == SOURCE_COUNT
    }
}

const SOURCE_COUNT: usize = 3;

/// Fetches the three entity sources concurrently and merges them.
#[derive(Clone)]
pub struct EntityAggregator {
    listings: Arc<dyn ListingFeed>,
    professionals: Arc<dyn ProfessionalFeed>,
    projects: Arc<dyn DeveloperProjectFeed>,
    profiles: Option<Arc<dyn ProfileDirectory>>,
}

impl EntityAggregator {
    pub fn new(
        listings: Arc<dyn ListingFeed>,
        professionals: Arc<dyn ProfessionalFeed>,
        projects: Arc<dyn DeveloperProjectFeed>,
    ) -> Self {
        Self {
            listings,
            professionals,
            projects,
            profiles: None,
        }
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileDirectory>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub async fn fetch_entities(&self) -> AggregateSnapshot {
        let (listings, professionals, projects) = tokio::join!(
            self.listings.fetch_located_listings(),
            self.fetch_professionals_with_names(),
            self.projects.fetch_located_projects(),
        );

        let mut snapshot = AggregateSnapshot::empty();

        match listings {
            Ok(records) => {
                for record in records {
                    snapshot.accept(SourceKind::Listings, normalize_listing(record));
                }
            }
            Err(err) => snapshot.record_failure(SourceKind::Listings, err),
        }

        match professionals {
            Ok((records, names)) => {
                for record in records {
                    snapshot.accept(
                        SourceKind::Professionals,
                        normalize_professional(record, &names),
                    );
                }
            }
            Err(err) => snapshot.record_failure(SourceKind::Professionals, err),
        }

        match projects {
            Ok(records) => {
                for record in records {
                    snapshot.accept(SourceKind::DeveloperProjects, normalize_project(record));
                }
            }
            Err(err) => snapshot.record_failure(SourceKind::DeveloperProjects, err),
        }

        debug!(
            entities = snapshot.entities.len(),
            dropped = snapshot.dropped,
            failed_sources = snapshot.failures.len(),
            "entity fetch cycle settled"
        );
        snapshot
    }

    async fn fetch_professionals_with_names(
        &self,
    ) -> Result<(Vec<ProfessionalRecord>, HashMap<String, String>), FeedError> {
        let records = self.professionals.fetch_located_professionals().await?;

        let Some(profiles) = &self.profiles else {
            return Ok((records, HashMap::new()));
        };

        let mut profile_ids: Vec<String> = records
            .iter()
            .filter_map(|record| record.owner_profile_id.clone())
            .collect();
        profile_ids.sort();
        profile_ids.dedup();

        if profile_ids.is_empty() {
            return Ok((records, HashMap::new()));
        }

        let names = match profiles.display_names(&profile_ids).await {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "profile lookup failed; professional names left blank");
                HashMap::new()
            }
        };

        Ok((records, names))
    }
}

impl AggregateSnapshot {
    fn accept(&mut self, source: SourceKind, outcome: Result<LocatedEntity, Rejection>) {
        match outcome {
            Ok(entity) => self.entities.push(entity),
            Err(rejection) => {
                debug!(%source, ?rejection, "record dropped during normalization");
                self.dropped += 1;
            }
        }
    }

    fn record_failure(&mut self, source: SourceKind, err: FeedError) {
        warn!(%source, error = %err, "entity source failed; continuing with remaining sources");
        self.failures.push(SourceFailure {
            source,
            message: err.to_string(),
        });
    }
}

impl std::fmt::Debug for EntityAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityAggregator")
            .field("profiles", &self.profiles.is_some())
            .finish_non_exhaustive()
    }
}
