use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::discovery::aggregator::EntityAggregator;
use crate::discovery::domain::{
    EntityDetails, EntityId, ListingDetails, ListingType, LocatedEntity, MarkerCategory,
    ProfessionalDetails, Profession, ProjectDetails, PropertyType, RankedEntity,
};
use crate::discovery::feeds::{
    DeveloperProjectFeed, DeveloperProjectRecord, FeedError, ListingFeed, ListingRecord,
    ProfessionalFeed, ProfessionalRecord, ProfileDirectory,
};
use crate::geo::Coordinate;

pub(crate) fn riyadh() -> Coordinate {
    Coordinate {
        latitude: 24.7136,
        longitude: 46.6753,
    }
}

pub(crate) fn jeddah() -> Coordinate {
    Coordinate {
        latitude: 21.5433,
        longitude: 39.1728,
    }
}

pub(crate) fn listing(
    id: &str,
    price: f64,
    area_sqm: Option<f64>,
    amenities: &[&str],
) -> LocatedEntity {
    LocatedEntity {
        id: EntityId(id.to_string()),
        coordinate: riyadh(),
        city: Some("Riyadh".to_string()),
        category: MarkerCategory::Sale,
        details: EntityDetails::Listing(ListingDetails {
            title: format!("Apartment {id}"),
            listing_type: ListingType::Sale,
            property_type: Some(PropertyType::Apartment),
            price: Some(price),
            area_sqm,
            bedrooms: Some(3),
            bathrooms: Some(2),
            amenities: amenities.iter().map(|value| value.to_string()).collect(),
            listed_on: None,
        }),
    }
}

pub(crate) fn office(id: &str) -> LocatedEntity {
    LocatedEntity {
        id: EntityId(id.to_string()),
        coordinate: jeddah(),
        city: Some("Jeddah".to_string()),
        category: MarkerCategory::Office,
        details: EntityDetails::Professional(ProfessionalDetails {
            office_name: format!("Office {id}"),
            profession: Profession::Brokerage,
            display_name: "Hala Realty".to_string(),
            phone: None,
        }),
    }
}

pub(crate) fn project(id: &str, starting_price: Option<f64>) -> LocatedEntity {
    LocatedEntity {
        id: EntityId(id.to_string()),
        coordinate: Coordinate {
            latitude: 24.80,
            longitude: 46.72,
        },
        city: Some("Riyadh".to_string()),
        category: MarkerCategory::Developer,
        details: EntityDetails::DeveloperProject(ProjectDetails {
            name: format!("Project {id}"),
            developer_name: "Sedra Developments".to_string(),
            starting_price,
            unit_count: Some(120),
            expected_completion: None,
        }),
    }
}

pub(crate) fn ranked_fixture() -> Vec<RankedEntity> {
    vec![
        RankedEntity::unranked(listing("l-1", 850_000.0, Some(140.0), &["parking", "elevator"])),
        RankedEntity::unranked(office("o-1")),
        RankedEntity::unranked(project("p-1", Some(1_200_000.0))),
        RankedEntity::unranked(listing("l-2", 1_450_000.0, None, &["pool"])),
    ]
}

pub(crate) fn listing_record(
    id: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> ListingRecord {
    ListingRecord {
        id: id.to_string(),
        title: format!("Listing {id}"),
        listing_type: "rent".to_string(),
        property_type: Some("apartment".to_string()),
        city: Some("Riyadh".to_string()),
        price: Some(60_000.0),
        area_sqm: Some(110.0),
        bedrooms: Some(2),
        bathrooms: Some(2),
        amenities: vec!["parking".to_string()],
        latitude,
        longitude,
        listed_on: None,
    }
}

pub(crate) fn professional_record(id: &str, profile_id: &str) -> ProfessionalRecord {
    ProfessionalRecord {
        id: id.to_string(),
        office_name: format!("Office {id}"),
        profession: "financing".to_string(),
        owner_profile_id: Some(profile_id.to_string()),
        city: Some("Jeddah".to_string()),
        phone: None,
        latitude: Some(21.55),
        longitude: Some(39.17),
    }
}

pub(crate) fn project_record(id: &str) -> DeveloperProjectRecord {
    DeveloperProjectRecord {
        id: id.to_string(),
        name: format!("Project {id}"),
        developer_name: "Sedra Developments".to_string(),
        city: Some("Riyadh".to_string()),
        starting_price: Some(900_000.0),
        unit_count: Some(80),
        expected_completion: None,
        latitude: Some(24.8),
        longitude: Some(46.7),
    }
}

/// Source fake answering each feed with a fixed result.
pub(crate) struct FakeSources {
    pub(crate) listings: Result<Vec<ListingRecord>, FeedError>,
    pub(crate) professionals: Result<Vec<ProfessionalRecord>, FeedError>,
    pub(crate) projects: Result<Vec<DeveloperProjectRecord>, FeedError>,
    pub(crate) profiles: Result<HashMap<String, String>, FeedError>,
    pub(crate) profile_calls: AtomicUsize,
}

impl Default for FakeSources {
    fn default() -> Self {
        Self {
            listings: Ok(vec![listing_record("l-1", Some(24.7), Some(46.6))]),
            professionals: Ok(vec![professional_record("o-1", "u-1")]),
            projects: Ok(vec![project_record("p-1")]),
            profiles: Ok(HashMap::from([(
                "u-1".to_string(),
                "Reem Alqahtani".to_string(),
            )])),
            profile_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeSources {
    pub(crate) fn aggregator(self: &Arc<Self>) -> EntityAggregator {
        EntityAggregator::new(self.clone(), self.clone(), self.clone()).with_profiles(self.clone())
    }
}

#[async_trait]
impl ListingFeed for FakeSources {
    async fn fetch_located_listings(&self) -> Result<Vec<ListingRecord>, FeedError> {
        self.listings.clone()
    }
}

#[async_trait]
impl ProfessionalFeed for FakeSources {
    async fn fetch_located_professionals(&self) -> Result<Vec<ProfessionalRecord>, FeedError> {
        self.professionals.clone()
    }
}

#[async_trait]
impl DeveloperProjectFeed for FakeSources {
    async fn fetch_located_projects(&self) -> Result<Vec<DeveloperProjectRecord>, FeedError> {
        self.projects.clone()
    }
}

#[async_trait]
impl ProfileDirectory for FakeSources {
    async fn display_names(
        &self,
        _profile_ids: &[String],
    ) -> Result<HashMap<String, String>, FeedError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles.clone()
    }
}

/// Listing feed whose n-th call sleeps for `delays[n]` and returns one listing
/// tagged with the call number.
pub(crate) struct SequencedListings {
    delays: Mutex<Vec<Duration>>,
    calls: AtomicUsize,
}

impl SequencedListings {
    pub(crate) fn new(delays: Vec<Duration>) -> Self {
        Self {
            delays: Mutex::new(delays),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ListingFeed for SequencedListings {
    async fn fetch_located_listings(&self) -> Result<Vec<ListingRecord>, FeedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays
            .lock()
            .expect("delay mutex")
            .get(call)
            .copied()
            .unwrap_or_default();
        tokio::time::sleep(delay).await;
        Ok(vec![listing_record(
            &format!("call-{call}"),
            Some(24.7),
            Some(46.6),
        )])
    }
}

/// Feeds that return nothing, for wiring a single interesting source.
pub(crate) struct EmptySources;

#[async_trait]
impl ProfessionalFeed for EmptySources {
    async fn fetch_located_professionals(&self) -> Result<Vec<ProfessionalRecord>, FeedError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl DeveloperProjectFeed for EmptySources {
    async fn fetch_located_projects(&self) -> Result<Vec<DeveloperProjectRecord>, FeedError> {
        Ok(Vec::new())
    }
}

pub(crate) fn amenity_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(crate) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
