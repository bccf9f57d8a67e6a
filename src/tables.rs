//! Delimited tables on disk. Every table has a fixed file name and a header
//! row that is written even when there are no rows.

use std::{
    fs,
    path::{Path, PathBuf},
};

use _model::{
    City, CleanPoi, Coordinate, CoordinateId, Location, PoiTopic, ProximityPair, Region, Street,
    Topic,
};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{error::PipelineError, utils::parse_number};

pub trait Table: Serialize + DeserializeOwned {
    const FILE: &'static str;
    const COLUMNS: &'static [&'static str];
}

pub fn path<T: Table>(dir: &Path) -> PathBuf {
    dir.join(T::FILE)
}

pub fn write<T: Table>(dir: &Path, rows: &[T]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = path::<T>(dir);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(T::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

pub fn read<T: Table>(dir: &Path) -> Result<Vec<T>> {
    let path = path::<T>(dir);
    let mut reader = csv::Reader::from_path(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();
    for column in T::COLUMNS {
        if !headers.iter().any(|x| x == *column) {
            return Err(PipelineError::missing_column(T::FILE, column).into());
        }
    }

    let mut rows = Vec::new();
    for (index, row) in reader.deserialize().enumerate() {
        rows.push(row.with_context(|| format!("{}: invalid row {}", T::FILE, index + 1))?);
    }
    Ok(rows)
}

/// `POI.csv`: the export flattened, before any filtering.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlatPoi {
    pub id: String,
    pub name: String,
    pub description: String,
    pub longitude: String,
    pub latitude: String,
    #[serde(rename = "srsSystem")]
    pub srs: String,
    pub topics: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub region: String,
    pub category: String,
    pub timetable: String,
    pub service: String,
}

impl Table for FlatPoi {
    const FILE: &'static str = "POI.csv";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "longitude",
        "latitude",
        "srsSystem",
        "topics",
        "street",
        "city",
        "postal_code",
        "region",
        "category",
        "timetable",
        "service",
    ];
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoiCoordinate {
    pub coordinate_id: CoordinateId,
    pub longitude: String,
    pub latitude: String,
    #[serde(rename = "srsSystem")]
    pub srs: String,
}

impl Table for PoiCoordinate {
    const FILE: &'static str = "POI_coordinates.csv";
    const COLUMNS: &'static [&'static str] =
        &["coordinate_id", "longitude", "latitude", "srsSystem"];
}

impl From<&Coordinate> for PoiCoordinate {
    fn from(x: &Coordinate) -> Self {
        Self {
            coordinate_id: x.id,
            longitude: x.location.longitude.get().to_string(),
            latitude: x.location.latitude.get().to_string(),
            srs: x.location.srs.clone().unwrap_or_default(),
        }
    }
}

impl PoiCoordinate {
    pub fn parse(self) -> Result<Coordinate, PipelineError> {
        Ok(Coordinate {
            id: self.coordinate_id,
            location: Location {
                latitude: parse_number("latitude", &self.latitude)?,
                longitude: parse_number("longitude", &self.longitude)?,
                srs: Some(self.srs).filter(|x| !x.is_empty()),
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopCoordinate {
    pub coordinate_id: CoordinateId,
    pub stop_lat: String,
    pub stop_lon: String,
}

impl Table for StopCoordinate {
    const FILE: &'static str = "Stops_coordinates.csv";
    const COLUMNS: &'static [&'static str] = &["coordinate_id", "stop_lat", "stop_lon"];
}

impl From<&Coordinate> for StopCoordinate {
    fn from(x: &Coordinate) -> Self {
        Self {
            coordinate_id: x.id,
            stop_lat: x.location.latitude.get().to_string(),
            stop_lon: x.location.longitude.get().to_string(),
        }
    }
}

impl StopCoordinate {
    pub fn parse(self) -> Result<Coordinate, PipelineError> {
        Ok(Coordinate {
            id: self.coordinate_id,
            location: Location {
                latitude: parse_number("stop_lat", &self.stop_lat)?,
                longitude: parse_number("stop_lon", &self.stop_lon)?,
                srs: None,
            },
        })
    }
}

impl Table for CleanPoi {
    const FILE: &'static str = "POI_clean.csv";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "category",
        "timetable",
        "service",
        "coordinate_id",
        "street_id",
    ];
}

impl Table for Topic {
    const FILE: &'static str = "POI_topics.csv";
    const COLUMNS: &'static [&'static str] = &["topic_id", "name"];
}

impl Table for PoiTopic {
    const FILE: &'static str = "POI_topics_relation.csv";
    const COLUMNS: &'static [&'static str] = &["POI_id", "topic_id"];
}

impl Table for Region {
    const FILE: &'static str = "POI_regions.csv";
    const COLUMNS: &'static [&'static str] = &["region_id", "code"];
}

impl Table for City {
    const FILE: &'static str = "POI_cities.csv";
    const COLUMNS: &'static [&'static str] = &["city_id", "city", "postal_code", "region_id"];
}

impl Table for Street {
    const FILE: &'static str = "POI_streets.csv";
    const COLUMNS: &'static [&'static str] = &["street_id", "street", "city_id"];
}

impl Table for ProximityPair {
    const FILE: &'static str = "close_POI_stop.csv";
    const COLUMNS: &'static [&'static str] = &["stop_coordinate_id", "poi_coordinate_id"];
}
