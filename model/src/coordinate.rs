use std::{fmt, str::FromStr};

use anyhow::{bail, Context};
use geo::Point;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use typed_floats::tf64::NonNaN;

use crate::Source;

/// `POI12`, `STOP3`: the source prefix followed by an index.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct CoordinateId {
    pub source: Source,
    pub index: usize,
}

impl CoordinateId {
    pub fn new(source: Source, index: usize) -> Self {
        Self { source, index }
    }
}

impl fmt::Display for CoordinateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.source.prefix(), self.index)
    }
}

impl FromStr for CoordinateId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for source in [Source::Stop, Source::Poi] {
            if let Some(index) = s.strip_prefix(source.prefix()) {
                let index = index
                    .parse()
                    .with_context(|| format!("invalid coordinate index in {s:?}"))?;
                return Ok(Self::new(source, index));
            }
        }
        bail!("Unknown coordinate id: {s:?}")
    }
}

/// The value part of a coordinate. Two records are the same coordinate iff
/// all three fields compare equal, a missing spatial reference included.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub latitude: NonNaN,
    pub longitude: NonNaN,
    pub srs: Option<String>,
}

impl Location {
    pub fn point(&self) -> Point {
        Point::new(self.longitude.get(), self.latitude.get())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coordinate {
    pub id: CoordinateId,
    pub location: Location,
}

impl Coordinate {
    pub fn point(&self) -> Point {
        self.location.point()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProximityPair {
    pub stop_coordinate_id: CoordinateId,
    pub poi_coordinate_id: CoordinateId,
}
