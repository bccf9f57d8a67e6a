use std::{collections::BTreeMap, fs, path::Path};

use _model::{Address, Location, Poi};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::{config::Config, error::PipelineError, tables::FlatPoi, utils::parse_number};

const TABLE: &str = "POI export";

/// Reads the export and flattens every element. Depending on
/// `config.skip_invalid`, a bad element either aborts the load or is logged
/// and left out.
pub fn load(path: &Path, config: &Config) -> Result<Vec<Poi>> {
    let elements: Vec<Value> = serde_json::from_str(
        &fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
    )
    .with_context(|| format!("{} isn't a JSON array", path.display()))?;

    let mut output = Vec::new();
    let mut skipped = 0;
    for (index, element) in elements.into_iter().enumerate() {
        match flatten(index, element, &config.language) {
            Ok(x) => output.push(x),
            Err(e) if config.skip_invalid && e.is_record_level() => {
                warn!("Skipping POI #{index}: {e}");
                skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to load {}", path.display())),
        }
    }

    info!(
        "Loaded {} POIs from {} (skipped {skipped})",
        output.len(),
        path.display()
    );
    Ok(output)
}

pub fn flatten(index: usize, element: Value, language: &str) -> Result<Poi, PipelineError> {
    let raw: RawElement = serde_json::from_value(element).map_err(|e| PipelineError::Schema {
        table: TABLE.to_string(),
        detail: format!("element #{index}: {e}"),
    })?;
    raw.refine(language)
}

impl From<&Poi> for FlatPoi {
    fn from(x: &Poi) -> Self {
        Self {
            id: x.id.clone(),
            name: x.name.clone(),
            description: x.description.clone(),
            longitude: x.location.longitude.get().to_string(),
            latitude: x.location.latitude.get().to_string(),
            srs: x.location.srs.clone().unwrap_or_default(),
            topics: x.topics.join(","),
            street: x.address.street.clone(),
            city: x.address.city.clone(),
            postal_code: x.address.postal_code.clone(),
            region: x.address.region.clone(),
            category: x.category.clone(),
            timetable: x.timetable.clone(),
            service: x.service.clone(),
        }
    }
}

type Localized = BTreeMap<String, String>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    domain_id: Scalar,
    content: RawContent,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    poi_data: RawPoiData,
    obj_data: RawObjData,
}

#[derive(Deserialize)]
struct RawPoiData {
    location: RawLocation,
    #[serde(default)]
    timetable: Localized,
}

#[derive(Deserialize)]
struct RawLocation {
    coordinate: RawCoordinate,
    addresses: BTreeMap<String, RawAddress>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoordinate {
    longitude: Scalar,
    latitude: Scalar,
    #[serde(default)]
    srs_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAddress {
    street: String,
    city: String,
    postal_code: Scalar,
    region: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObjData {
    name: Localized,
    description: Localized,
    topics: Vec<String>,
    category: String,
    #[serde(default)]
    service_description: Localized,
}

/// Ids, postcodes and coordinates show up both as strings and as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn text(&self) -> String {
        match self {
            Self::Text(x) => x.clone(),
            Self::Number(x) => x.to_string(),
        }
    }
}

impl RawElement {
    fn refine(self, language: &str) -> Result<Poi, PipelineError> {
        let id = self.domain_id.text();
        let missing = |field: &str| PipelineError::Schema {
            table: TABLE.to_string(),
            detail: format!("{id} has no {language:?} {field}"),
        };

        let RawContent { poi_data, obj_data } = self.content;
        let coordinate = poi_data.location.coordinate;
        let location = Location {
            latitude: parse_number("latitude", &coordinate.latitude.text())?,
            longitude: parse_number("longitude", &coordinate.longitude.text())?,
            srs: coordinate.srs_name.filter(|x| !x.is_empty()),
        };

        let mut addresses = poi_data.location.addresses;
        let address = addresses.remove(language).ok_or_else(|| missing("address"))?;

        let mut name = obj_data.name;
        let mut description = obj_data.description;
        let mut timetable = poi_data.timetable;
        let mut service = obj_data.service_description;

        Ok(Poi {
            name: name.remove(language).ok_or_else(|| missing("name"))?,
            description: description
                .remove(language)
                .ok_or_else(|| missing("description"))?,
            location,
            topics: obj_data.topics,
            address: Address {
                street: address.street,
                city: address.city,
                postal_code: address.postal_code.text(),
                region: address.region,
            },
            category: obj_data.category,
            timetable: timetable.remove(language).unwrap_or_default(),
            service: service.remove(language).unwrap_or_default(),
            id,
        })
    }
}
