use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use estate_discovery::discovery::{
    Catalog, DiscoverySession, EntityAggregator, EntityKind, FetchOutcome, FilterCriteria,
    ListingType, SortOrder, ValueRange,
};
use estate_discovery::geo::{CachePolicy, Coordinate, FixedLocationProvider, Geolocator};

const LISTINGS: &str = "\
id,title,listing_type,property_type,city,price,area_sqm,bedrooms,bathrooms,amenities,latitude,longitude,listed_on
A1,Olaya apartment,sale,apartment,Riyadh,780000,130,3,2,parking;elevator,24.6958,46.6849,2026-05-01
A2,Hittin villa,sale,villa,Riyadh,2300000,410,5,5,pool;parking,24.7611,46.6042,
A3,Malqa flat,rent,apartment,Riyadh,65000,,2,1,furnished,24.8065,46.6178,
A4,Corniche floor,sale,floor,Jeddah,1250000,250,4,3,sea view,21.5790,39.1113,
A5,No coordinates,sale,land,Riyadh,400000,800,,,,,,
";

const PROFESSIONALS: &str = "\
id,office_name,profession,owner_profile_id,city,phone,latitude,longitude
A1,Nakheel Realty,brokerage,U-1,Riyadh,,24.7203,46.6722
B2,Precise Valuation,appraiser,U-9,Jeddah,,21.5433,39.1728
";

const PROFILES: &str = "\
profile_id,display_name
U-1,Faisal Alharbi
";

struct CatalogDir(PathBuf);

impl CatalogDir {
    fn create(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "estate-discovery-{name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("create catalog dir");
        fs::write(dir.join("listings.csv"), LISTINGS).expect("write listings");
        fs::write(dir.join("professionals.csv"), PROFESSIONALS).expect("write professionals");
        fs::write(dir.join("profiles.csv"), PROFILES).expect("write profiles");
        Self(dir)
    }
}

impl Drop for CatalogDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn riyadh() -> Coordinate {
    Coordinate::try_new(24.7136, 46.6753).expect("valid coordinate")
}

fn session(catalog: Catalog, position: Option<Coordinate>) -> DiscoverySession {
    let catalog = Arc::new(catalog);
    let aggregator = EntityAggregator::new(catalog.clone(), catalog.clone(), catalog.clone())
        .with_profiles(catalog);
    let geolocator = Arc::new(Geolocator::new(
        Arc::new(FixedLocationProvider::new(position)),
        Duration::from_secs(10),
    ));
    DiscoverySession::new(aggregator, geolocator)
}

#[tokio::test]
async fn catalog_directory_feeds_a_located_session() {
    let dir = CatalogDir::create("located");
    let catalog = Catalog::from_dir(&dir.0).expect("catalog loads");
    assert_eq!(catalog.projects.len(), 0, "missing projects.csv yields an empty source");

    let session = session(catalog, Some(riyadh()));
    let outcome = session.refresh().await;
    assert_eq!(
        outcome,
        FetchOutcome::Applied {
            entities: 6,
            failed_sources: 0
        }
    );
    assert_eq!(session.snapshot().expect("snapshot").dropped, 1);
    assert_eq!(session.locate(CachePolicy::PreferCached).await, Some(riyadh()));

    let nearest = session.results(&FilterCriteria::default(), SortOrder::DistanceAsc);
    assert_eq!(nearest[0].entity.kind(), EntityKind::Professional);
    assert_eq!(nearest[0].entity.id.0, "A1");
    assert_eq!(
        nearest.last().and_then(|ranked| ranked.entity.city.as_deref()),
        Some("Jeddah")
    );

    // Same id in two sources stays two distinct entities.
    let a1_count = nearest
        .iter()
        .filter(|ranked| ranked.entity.id.0 == "A1")
        .count();
    assert_eq!(a1_count, 2);
}

#[tokio::test]
async fn listing_filters_combine_with_distance_radius() {
    let dir = CatalogDir::create("filters");
    let session = session(Catalog::from_dir(&dir.0).expect("catalog loads"), Some(riyadh()));
    session.refresh().await;
    session.locate(CachePolicy::PreferCached).await;

    let criteria = FilterCriteria::default()
        .with_listing_type(ListingType::Sale)
        .with_price(ValueRange::between(500_000.0, 2_500_000.0))
        .with_max_distance_km(50.0);
    let results = session.results(&criteria, SortOrder::PriceAsc);

    let ids: Vec<&str> = results
        .iter()
        .map(|ranked| ranked.entity.id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["A1", "A2"]);
    assert!(results
        .iter()
        .all(|ranked| ranked.entity.kind() == EntityKind::Listing));
}

#[tokio::test]
async fn area_filter_excludes_listings_without_area() {
    let dir = CatalogDir::create("area");
    let session = session(Catalog::from_dir(&dir.0).expect("catalog loads"), None);
    session.refresh().await;

    let criteria = FilterCriteria::default().with_area(ValueRange::at_most(200.0));
    let ids: Vec<String> = session
        .results(&criteria, SortOrder::Relevance)
        .into_iter()
        .map(|ranked| ranked.entity.id.0)
        .collect();

    assert_eq!(ids, vec!["A1".to_string()]);
}

#[tokio::test]
async fn unlocated_session_keeps_source_order_for_distance_sort() {
    let dir = CatalogDir::create("unlocated");
    let session = session(Catalog::from_dir(&dir.0).expect("catalog loads"), None);
    session.refresh().await;
    assert_eq!(session.locate(CachePolicy::Refresh).await, None);

    let relevance = session.results(&FilterCriteria::default(), SortOrder::Relevance);
    let by_distance = session.results(&FilterCriteria::default(), SortOrder::DistanceAsc);
    assert_eq!(relevance, by_distance);
    assert!(!session.distance_features_enabled());

    let radius = FilterCriteria::default().with_max_distance_km(1.0);
    assert_eq!(
        session.results(&radius, SortOrder::Relevance).len(),
        relevance.len(),
        "radius filter is inert without an origin"
    );
}
