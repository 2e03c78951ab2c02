use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Listing,
    Professional,
    DeveloperProject,
}

impl EntityKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Listing, Self::Professional, Self::DeveloperProject]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Listing => "Listing",
            Self::Professional => "Professional",
            Self::DeveloperProject => "Developer Project",
        }
    }

    const fn route_segment(self) -> &'static str {
        match self {
            Self::Listing => "listings",
            Self::Professional => "professionals",
            Self::DeveloperProject => "projects",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an entity across sources; ids are only unique within a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.route_segment(), self.id)
    }
}

/// Navigation intent toward an entity's detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRoute {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl DetailRoute {
    pub fn path(&self) -> String {
        format!("/{}/{}", self.kind.route_segment(), self.id)
    }
}

/// Fixed marker styling categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerCategory {
    Sale,
    Rent,
    Office,
    Appraiser,
    Financing,
    Developer,
}

impl MarkerCategory {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Sale,
            Self::Rent,
            Self::Office,
            Self::Appraiser,
            Self::Financing,
            Self::Developer,
        ]
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Sale => "#2563eb",
            Self::Rent => "#16a34a",
            Self::Office => "#9333ea",
            Self::Appraiser => "#ea580c",
            Self::Financing => "#0891b2",
            Self::Developer => "#dc2626",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sale => "For Sale",
            Self::Rent => "For Rent",
            Self::Office => "Real Estate Office",
            Self::Appraiser => "Appraiser",
            Self::Financing => "Financing",
            Self::Developer => "Developer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_label(value).as_str() {
            "sale" | "for sale" | "buy" => Some(Self::Sale),
            "rent" | "for rent" | "lease" => Some(Self::Rent),
            _ => None,
        }
    }

    pub const fn marker_category(self) -> MarkerCategory {
        match self {
            Self::Sale => MarkerCategory::Sale,
            Self::Rent => MarkerCategory::Rent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    Villa,
    Floor,
    Land,
    Building,
    Office,
    Shop,
    Warehouse,
    Chalet,
}

impl PropertyType {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_label(value).as_str() {
            "apartment" | "flat" => Some(Self::Apartment),
            "villa" | "house" => Some(Self::Villa),
            "floor" => Some(Self::Floor),
            "land" | "plot" => Some(Self::Land),
            "building" => Some(Self::Building),
            "office" => Some(Self::Office),
            "shop" | "retail" => Some(Self::Shop),
            "warehouse" => Some(Self::Warehouse),
            "chalet" | "rest house" => Some(Self::Chalet),
            _ => None,
        }
    }
}

/// Line of business for a professional office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profession {
    Brokerage,
    Appraiser,
    Financing,
}

impl Profession {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_label(value).as_str() {
            "office" | "brokerage" | "broker" | "real estate office" => Some(Self::Brokerage),
            "appraiser" | "valuation" => Some(Self::Appraiser),
            "financing" | "finance" | "lender" | "bank" => Some(Self::Financing),
            _ => None,
        }
    }

    pub const fn marker_category(self) -> MarkerCategory {
        match self {
            Self::Brokerage => MarkerCategory::Office,
            Self::Appraiser => MarkerCategory::Appraiser,
            Self::Financing => MarkerCategory::Financing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    pub title: String,
    pub listing_type: ListingType,
    pub property_type: Option<PropertyType>,
    pub price: Option<f64>,
    pub area_sqm: Option<f64>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub amenities: BTreeSet<String>,
    pub listed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalDetails {
    pub office_name: String,
    pub profession: Profession,
    /// Owner's display name; blank when the profile lookup failed.
    pub display_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub name: String,
    pub developer_name: String,
    pub starting_price: Option<f64>,
    pub unit_count: Option<u32>,
    pub expected_completion: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDetails {
    Listing(ListingDetails),
    Professional(ProfessionalDetails),
    DeveloperProject(ProjectDetails),
}

/// Normalized, coordinate-bearing entity in the discovery working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedEntity {
    pub id: EntityId,
    pub coordinate: Coordinate,
    pub city: Option<String>,
    pub category: MarkerCategory,
    pub details: EntityDetails,
}

impl LocatedEntity {
    pub fn kind(&self) -> EntityKind {
        match self.details {
            EntityDetails::Listing(_) => EntityKind::Listing,
            EntityDetails::Professional(_) => EntityKind::Professional,
            EntityDetails::DeveloperProject(_) => EntityKind::DeveloperProject,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey {
            kind: self.kind(),
            id: self.id.clone(),
        }
    }

    pub fn detail_route(&self) -> DetailRoute {
        DetailRoute {
            kind: self.kind(),
            id: self.id.clone(),
        }
    }

    pub fn title(&self) -> &str {
        match &self.details {
            EntityDetails::Listing(listing) => &listing.title,
            EntityDetails::Professional(professional) => &professional.office_name,
            EntityDetails::DeveloperProject(project) => &project.name,
        }
    }

    pub fn listing(&self) -> Option<&ListingDetails> {
        match &self.details {
            EntityDetails::Listing(listing) => Some(listing),
            _ => None,
        }
    }

    pub fn listing_type(&self) -> Option<ListingType> {
        self.listing().map(|listing| listing.listing_type)
    }

    pub fn property_type(&self) -> Option<PropertyType> {
        self.listing().and_then(|listing| listing.property_type)
    }

    /// Asking price for listings, starting price for developer projects.
    pub fn price(&self) -> Option<f64> {
        match &self.details {
            EntityDetails::Listing(listing) => listing.price,
            EntityDetails::DeveloperProject(project) => project.starting_price,
            EntityDetails::Professional(_) => None,
        }
    }

    pub fn area_sqm(&self) -> Option<f64> {
        self.listing().and_then(|listing| listing.area_sqm)
    }

    pub fn bedrooms(&self) -> Option<u8> {
        self.listing().and_then(|listing| listing.bedrooms)
    }

    pub fn bathrooms(&self) -> Option<u8> {
        self.listing().and_then(|listing| listing.bathrooms)
    }

    pub fn amenities(&self) -> Option<&BTreeSet<String>> {
        self.listing().map(|listing| &listing.amenities)
    }

    /// Text the keyword filter searches through.
    pub(crate) fn search_text(&self) -> String {
        let mut text = self.title().to_string();
        if let Some(city) = &self.city {
            text.push(' ');
            text.push_str(city);
        }
        match &self.details {
            EntityDetails::Professional(professional) => {
                text.push(' ');
                text.push_str(&professional.display_name);
            }
            EntityDetails::DeveloperProject(project) => {
                text.push(' ');
                text.push_str(&project.developer_name);
            }
            EntityDetails::Listing(_) => {}
        }
        normalize_label(&text)
    }
}

/// Entity enriched with its distance from the user, when known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntity {
    #[serde(flatten)]
    pub entity: LocatedEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl RankedEntity {
    pub fn unranked(entity: LocatedEntity) -> Self {
        Self {
            entity,
            distance_km: None,
        }
    }

    pub fn key(&self) -> EntityKey {
        self.entity.key()
    }
}

/// Lowercases and collapses whitespace so free-text labels compare reliably.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
