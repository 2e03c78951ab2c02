use estate_discovery::discovery::catalog::{
    parse_listings, parse_professionals, parse_profiles, parse_projects,
};
use estate_discovery::discovery::{Catalog, EntityAggregator, EntityKind, SortOrder};
use estate_discovery::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const SEED_LISTINGS: &str = "\
id,title,listing_type,property_type,city,price,area_sqm,bedrooms,bathrooms,amenities,latitude,longitude,listed_on
L-1001,Olaya family apartment,sale,apartment,Riyadh,850000,145,3,2,parking;elevator,24.6958,46.6849,2026-08-02
L-1002,Hittin garden villa,sale,villa,Riyadh,2450000,420,5,5,pool;maid room;parking,24.7611,46.6042,2026-07-19
L-1003,Malqa furnished flat,rent,apartment,Riyadh,72000,110,2,2,furnished;elevator,24.8065,46.6178,2026-09-11
L-1004,Corniche sea view floor,sale,floor,Jeddah,1350000,240,4,3,sea view;parking,21.5790,39.1113,2026-06-30
L-1005,Al Rawdah office unit,rent,office,Jeddah,95000,160,,2,parking,21.5621,39.1561,
L-1006,Unmapped land plot,sale,land,Riyadh,600000,900,,,,,,
";

const SEED_PROFESSIONALS: &str = "\
id,office_name,profession,owner_profile_id,city,phone,latitude,longitude
O-2001,Al Nakheel Realty,brokerage,U-1,Riyadh,+966500000001,24.7203,46.6722
O-2002,Precise Valuation,appraiser,U-2,Jeddah,,21.5433,39.1728
O-2003,Dar Home Finance,financing,U-3,Riyadh,,24.6877,46.7219
";

const SEED_PROJECTS: &str = "\
id,name,developer_name,city,starting_price,unit_count,expected_completion,latitude,longitude
P-3001,Sedra Residences,Roshn,Riyadh,1100000,320,2027-12-31,24.8589,46.7421
P-3002,Marsa Towers,Red Sea Developers,Jeddah,980000,180,,21.6227,39.1067
";

const SEED_PROFILES: &str = "\
profile_id,display_name
U-1,Faisal Alharbi
U-2,Noura Alqahtani
U-3,Majed Alotaibi
";

/// Small Riyadh/Jeddah catalog used when no export directory is configured.
pub(crate) fn demo_catalog() -> Result<Catalog, AppError> {
    Ok(Catalog {
        listings: parse_listings(Cursor::new(SEED_LISTINGS))?,
        professionals: parse_professionals(Cursor::new(SEED_PROFESSIONALS))?,
        projects: parse_projects(Cursor::new(SEED_PROJECTS))?,
        profile_names: parse_profiles(Cursor::new(SEED_PROFILES))?,
    })
}

pub(crate) fn load_catalog(dir: Option<&Path>) -> Result<Catalog, AppError> {
    let catalog = match dir {
        Some(dir) => Catalog::from_dir(dir)?,
        None => demo_catalog()?,
    };
    let source = dir
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "seed".to_string());
    info!(%source, records = catalog.record_count(), "entity catalog loaded");
    Ok(catalog)
}

pub(crate) fn catalog_aggregator(catalog: Catalog) -> EntityAggregator {
    let catalog = Arc::new(catalog);
    EntityAggregator::new(catalog.clone(), catalog.clone(), catalog.clone()).with_profiles(catalog)
}

pub(crate) fn parse_sort(raw: &str) -> Result<SortOrder, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "relevance" => Ok(SortOrder::Relevance),
        "distance" | "distance_asc" | "nearest" => Ok(SortOrder::DistanceAsc),
        "distance_desc" | "farthest" => Ok(SortOrder::DistanceDesc),
        "price" | "price_asc" => Ok(SortOrder::PriceAsc),
        "price_desc" => Ok(SortOrder::PriceDesc),
        other => Err(format!(
            "unknown sort '{other}' (expected relevance, distance_asc, distance_desc, price_asc, price_desc)"
        )),
    }
}

pub(crate) fn parse_kind(raw: &str) -> Result<EntityKind, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "listing" | "listings" => Ok(EntityKind::Listing),
        "professional" | "professionals" | "office" => Ok(EntityKind::Professional),
        "project" | "projects" | "developer_project" => Ok(EntityKind::DeveloperProject),
        other => Err(format!("unknown entity kind '{other}'")),
    }
}
