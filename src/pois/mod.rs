use std::{collections::BTreeSet, path::Path};

use _model::{City, CleanPoi, Coordinate, Poi, PoiTopic, Region, Source, Street, Topic};
use anyhow::Result;

use crate::{
    config::Config,
    dimension,
    tables::{self, FlatPoi, PoiCoordinate},
};

use self::address::extract_addresses;

mod address;
mod raw;
mod topics;

/// Every table the POI export is split into.
#[derive(Debug)]
pub struct Normalized {
    pub pois: Vec<CleanPoi>,
    pub coordinates: Vec<Coordinate>,
    pub topics: Vec<Topic>,
    pub poi_topics: Vec<PoiTopic>,
    pub regions: Vec<Region>,
    pub cities: Vec<City>,
    pub streets: Vec<Street>,
}

pub fn run(input: &Path, output: &Path, config: &Config) -> Result<()> {
    let pois = raw::load(input, config)?;
    let flat: Vec<FlatPoi> = pois.iter().map(FlatPoi::from).collect();
    tables::write(output, &flat)?;

    let pois = filter(pois, &config.categories);
    let normalized = normalize(&pois);
    info!(
        "Normalized {} POIs: {} coordinates, {} topics, {} regions, {} cities, {} streets",
        normalized.pois.len(),
        normalized.coordinates.len(),
        normalized.topics.len(),
        normalized.regions.len(),
        normalized.cities.len(),
        normalized.streets.len()
    );

    let coordinates: Vec<PoiCoordinate> = normalized
        .coordinates
        .iter()
        .map(PoiCoordinate::from)
        .collect();
    tables::write(output, &normalized.pois)?;
    tables::write(output, &coordinates)?;
    tables::write(output, &normalized.topics)?;
    tables::write(output, &normalized.poi_topics)?;
    tables::write(output, &normalized.regions)?;
    tables::write(output, &normalized.cities)?;
    tables::write(output, &normalized.streets)?;
    Ok(())
}

/// Keeps the POIs whose category is listed, preserving order.
pub fn filter(pois: Vec<Poi>, categories: &[String]) -> Vec<Poi> {
    let categories: BTreeSet<&str> = categories.iter().map(|x| x.as_str()).collect();
    let total = pois.len();
    let kept: Vec<Poi> = pois
        .into_iter()
        .filter(|x| categories.contains(x.category.as_str()))
        .collect();
    info!("Kept {} of {total} POIs in the selected categories", kept.len());
    kept
}

pub fn normalize(pois: &[Poi]) -> Normalized {
    let (coordinates, coordinate_ids) =
        dimension::coordinates(Source::Poi, pois.iter().map(|x| x.location.clone()));
    let (topics, poi_topics) = topics::extract(pois);
    let addresses = extract_addresses(pois);

    let clean = pois
        .iter()
        .zip(coordinate_ids)
        .zip(&addresses.street_ids)
        .map(|((x, coordinate_id), street_id)| CleanPoi {
            id: x.id.clone(),
            name: x.name.clone(),
            description: x.description.clone(),
            category: x.category.clone(),
            timetable: x.timetable.clone(),
            service: x.service.clone(),
            coordinate_id,
            street_id: *street_id,
        })
        .collect();

    Normalized {
        pois: clean,
        coordinates,
        topics,
        poi_topics,
        regions: addresses.regions,
        cities: addresses.cities,
        streets: addresses.streets,
    }
}
