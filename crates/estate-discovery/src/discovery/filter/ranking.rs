use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::discovery::domain::{LocatedEntity, RankedEntity};
use crate::geo::{distance_km, Coordinate};

/// Result ordering. All orders are stable; unknown values sort last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Source order as returned by the aggregator.
    #[default]
    Relevance,
    DistanceAsc,
    DistanceDesc,
    PriceAsc,
    PriceDesc,
}

/// Attaches the distance from `origin` to every entity.
pub fn rank(entities: &[LocatedEntity], origin: Option<Coordinate>) -> Vec<RankedEntity> {
    entities
        .iter()
        .map(|entity| RankedEntity {
            distance_km: origin.map(|origin| distance_km(origin, entity.coordinate)),
            entity: entity.clone(),
        })
        .collect()
}

pub fn rank_by_distance(mut entities: Vec<RankedEntity>, ascending: bool) -> Vec<RankedEntity> {
    entities.sort_by(|a, b| compare_known_last(a.distance_km, b.distance_km, ascending));
    entities
}

pub fn sort_entities(mut entities: Vec<RankedEntity>, order: SortOrder) -> Vec<RankedEntity> {
    match order {
        SortOrder::Relevance => entities,
        SortOrder::DistanceAsc => rank_by_distance(entities, true),
        SortOrder::DistanceDesc => rank_by_distance(entities, false),
        SortOrder::PriceAsc => {
            entities.sort_by(|a, b| compare_known_last(a.entity.price(), b.entity.price(), true));
            entities
        }
        SortOrder::PriceDesc => {
            entities.sort_by(|a, b| compare_known_last(a.entity.price(), b.entity.price(), false));
            entities
        }
    }
}

fn compare_known_last(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.total_cmp(&b);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
