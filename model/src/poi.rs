use serde::{Deserialize, Serialize};

use crate::{Address, CoordinateId, Location};

/// A POI flattened out of the nested export.
#[derive(Clone, Debug, PartialEq)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub topics: Vec<String>,
    pub address: Address,
    pub category: String,
    pub timetable: String,
    pub service: String,
}

/// A POI once every sub-entity has been replaced by a key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanPoi {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub timetable: String,
    pub service: String,
    pub coordinate_id: CoordinateId,
    pub street_id: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: usize,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiTopic {
    #[serde(rename = "POI_id")]
    pub poi_id: String,
    pub topic_id: usize,
}
