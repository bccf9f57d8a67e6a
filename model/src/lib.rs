use core::fmt;

mod address;
mod coordinate;
mod poi;

pub use address::{Address, City, Region, Street};
pub use coordinate::{Coordinate, CoordinateId, Location, ProximityPair};
pub use poi::{CleanPoi, Poi, PoiTopic, Topic};

/// Where a coordinate came from. Coordinate ids are namespaced by source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Poi,
    Stop,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Poi => "POI",
            Self::Stop => "stop",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Poi => "POI",
            Self::Stop => "STOP",
        }
    }
}
