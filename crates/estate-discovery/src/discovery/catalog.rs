//! CSV-backed catalog that serves all three feeds from local exports.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::feeds::{
    DeveloperProjectFeed, DeveloperProjectRecord, FeedError, ListingFeed, ListingRecord,
    ProfessionalFeed, ProfessionalRecord, ProfileDirectory,
};

pub const LISTINGS_FILE: &str = "listings.csv";
pub const PROFESSIONALS_FILE: &str = "professionals.csv";
pub const PROJECTS_FILE: &str = "projects.csv";
pub const PROFILES_FILE: &str = "profiles.csv";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to open catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog data in {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// In-memory snapshot of every source, answering the feed traits.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub listings: Vec<ListingRecord>,
    pub professionals: Vec<ProfessionalRecord>,
    pub projects: Vec<DeveloperProjectRecord>,
    pub profile_names: HashMap<String, String>,
}

impl Catalog {
    /// Loads every `*.csv` export from `dir`; a missing file yields an empty source.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Catalog::default();

        if let Some(reader) = open_optional(dir, LISTINGS_FILE)? {
            catalog.listings = parse_listings(reader)?;
        }
        if let Some(reader) = open_optional(dir, PROFESSIONALS_FILE)? {
            catalog.professionals = parse_professionals(reader)?;
        }
        if let Some(reader) = open_optional(dir, PROJECTS_FILE)? {
            catalog.projects = parse_projects(reader)?;
        }
        if let Some(reader) = open_optional(dir, PROFILES_FILE)? {
            catalog.profile_names = parse_profiles(reader)?;
        }

        Ok(catalog)
    }

    pub fn record_count(&self) -> usize {
        self.listings.len() + self.professionals.len() + self.projects.len()
    }
}

fn open_optional(dir: &Path, file: &'static str) -> Result<Option<File>, CatalogError> {
    let path = dir.join(file);
    match File::open(&path) {
        Ok(handle) => Ok(Some(handle)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CatalogError::Io { path, source }),
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub fn parse_listings<R: Read>(reader: R) -> Result<Vec<ListingRecord>, CatalogError> {
    let mut records = Vec::new();
    for row in csv_reader(reader).deserialize::<ListingRow>() {
        let row = row.map_err(|source| CatalogError::Csv {
            file: LISTINGS_FILE,
            source,
        })?;
        records.push(row.into_record());
    }
    Ok(records)
}

pub fn parse_professionals<R: Read>(reader: R) -> Result<Vec<ProfessionalRecord>, CatalogError> {
    csv_reader(reader)
        .deserialize::<ProfessionalRow>()
        .map(|row| {
            row.map(ProfessionalRow::into_record)
                .map_err(|source| CatalogError::Csv {
                    file: PROFESSIONALS_FILE,
                    source,
                })
        })
        .collect()
}

pub fn parse_projects<R: Read>(reader: R) -> Result<Vec<DeveloperProjectRecord>, CatalogError> {
    csv_reader(reader)
        .deserialize::<ProjectRow>()
        .map(|row| {
            row.map(ProjectRow::into_record)
                .map_err(|source| CatalogError::Csv {
                    file: PROJECTS_FILE,
                    source,
                })
        })
        .collect()
}

pub fn parse_profiles<R: Read>(reader: R) -> Result<HashMap<String, String>, CatalogError> {
    csv_reader(reader)
        .deserialize::<ProfileRow>()
        .map(|row| {
            row.map(|row| (row.profile_id, row.display_name))
                .map_err(|source| CatalogError::Csv {
                    file: PROFILES_FILE,
                    source,
                })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    id: String,
    title: String,
    listing_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    area_sqm: Option<f64>,
    #[serde(default)]
    bedrooms: Option<u8>,
    #[serde(default)]
    bathrooms: Option<u8>,
    /// Semicolon separated.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    amenities: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    listed_on: Option<String>,
}

impl ListingRow {
    fn into_record(self) -> ListingRecord {
        ListingRecord {
            id: self.id,
            title: self.title,
            listing_type: self.listing_type,
            property_type: self.property_type,
            city: self.city,
            price: self.price,
            area_sqm: self.area_sqm,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            amenities: self
                .amenities
                .map(|raw| raw.split(';').map(str::to_string).collect())
                .unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            listed_on: self.listed_on.as_deref().and_then(parse_date),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfessionalRow {
    id: String,
    office_name: String,
    profession: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    owner_profile_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl ProfessionalRow {
    fn into_record(self) -> ProfessionalRecord {
        ProfessionalRecord {
            id: self.id,
            office_name: self.office_name,
            profession: self.profession,
            owner_profile_id: self.owner_profile_id,
            city: self.city,
            phone: self.phone,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRow {
    id: String,
    name: String,
    developer_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default)]
    starting_price: Option<f64>,
    #[serde(default)]
    unit_count: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    expected_completion: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl ProjectRow {
    fn into_record(self) -> DeveloperProjectRecord {
        DeveloperProjectRecord {
            id: self.id,
            name: self.name,
            developer_name: self.developer_name,
            city: self.city,
            starting_price: self.starting_price,
            unit_count: self.unit_count,
            expected_completion: self.expected_completion.as_deref().and_then(parse_date),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    profile_id: String,
    display_name: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[async_trait]
impl ListingFeed for Catalog {
    async fn fetch_located_listings(&self) -> Result<Vec<ListingRecord>, FeedError> {
        Ok(self.listings.clone())
    }
}

#[async_trait]
impl ProfessionalFeed for Catalog {
    async fn fetch_located_professionals(&self) -> Result<Vec<ProfessionalRecord>, FeedError> {
        Ok(self.professionals.clone())
    }
}

#[async_trait]
impl DeveloperProjectFeed for Catalog {
    async fn fetch_located_projects(&self) -> Result<Vec<DeveloperProjectRecord>, FeedError> {
        Ok(self.projects.clone())
    }
}

#[async_trait]
impl ProfileDirectory for Catalog {
    async fn display_names(
        &self,
        profile_ids: &[String],
    ) -> Result<HashMap<String, String>, FeedError> {
        Ok(profile_ids
            .iter()
            .filter_map(|id| {
                self.profile_names
                    .get(id)
                    .map(|name| (id.clone(), name.clone()))
            })
            .collect())
    }
}
