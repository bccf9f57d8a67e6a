use std::{collections::BTreeSet, fmt, path::Path};

use _model::{City, CleanPoi, CoordinateId, PoiTopic, ProximityPair, Region, Street, Topic};
use anyhow::{Context, Result};

use crate::{
    error::PipelineError,
    stops::CLEAN_FILE,
    tables::{self, PoiCoordinate, StopCoordinate, Table},
};

/// Checks every foreign key between the written tables. The pairs table is
/// only checked once it exists.
pub fn run(pois_dir: &Path, stops_dir: &Path) -> Result<()> {
    let pois: Vec<CleanPoi> = tables::read(pois_dir)?;
    let poi_coordinates: BTreeSet<CoordinateId> = tables::read::<PoiCoordinate>(pois_dir)?
        .into_iter()
        .map(|x| x.coordinate_id)
        .collect();
    let topics: BTreeSet<usize> = tables::read::<Topic>(pois_dir)?
        .into_iter()
        .map(|x| x.topic_id)
        .collect();
    let poi_topics: Vec<PoiTopic> = tables::read(pois_dir)?;
    let regions: BTreeSet<usize> = tables::read::<Region>(pois_dir)?
        .into_iter()
        .map(|x| x.region_id)
        .collect();
    let cities: Vec<City> = tables::read(pois_dir)?;
    let streets: Vec<Street> = tables::read(pois_dir)?;

    check(
        CleanPoi::FILE,
        PoiCoordinate::FILE,
        &poi_coordinates,
        pois.iter().map(|x| x.coordinate_id),
    )?;
    check(
        CleanPoi::FILE,
        Street::FILE,
        &streets.iter().map(|x| x.street_id).collect(),
        pois.iter().map(|x| x.street_id),
    )?;
    check(
        Street::FILE,
        City::FILE,
        &cities.iter().map(|x| x.city_id).collect(),
        streets.iter().map(|x| x.city_id),
    )?;
    check(
        City::FILE,
        Region::FILE,
        &regions,
        cities.iter().map(|x| x.region_id),
    )?;
    check(
        PoiTopic::FILE,
        CleanPoi::FILE,
        &pois.iter().map(|x| x.id.as_str()).collect(),
        poi_topics.iter().map(|x| x.poi_id.as_str()),
    )?;
    check(
        PoiTopic::FILE,
        Topic::FILE,
        &topics,
        poi_topics.iter().map(|x| x.topic_id),
    )?;

    let stop_coordinates: BTreeSet<CoordinateId> = tables::read::<StopCoordinate>(stops_dir)?
        .into_iter()
        .map(|x| x.coordinate_id)
        .collect();
    check(
        CLEAN_FILE,
        StopCoordinate::FILE,
        &stop_coordinates,
        stop_references(&stops_dir.join(CLEAN_FILE))?,
    )?;

    if tables::path::<ProximityPair>(stops_dir).exists() {
        let pairs: Vec<ProximityPair> = tables::read(stops_dir)?;
        check(
            ProximityPair::FILE,
            StopCoordinate::FILE,
            &stop_coordinates,
            pairs.iter().map(|x| x.stop_coordinate_id),
        )?;
        check(
            ProximityPair::FILE,
            PoiCoordinate::FILE,
            &poi_coordinates,
            pairs.iter().map(|x| x.poi_coordinate_id),
        )?;
        info!("{} close pairs are consistent", pairs.len());
    } else {
        warn!("{} not found, skipping", ProximityPair::FILE);
    }

    info!(
        "All references between {} POIs and {} stop coordinates resolve",
        pois.len(),
        stop_coordinates.len()
    );
    Ok(())
}

fn stop_references(path: &Path) -> Result<Vec<CoordinateId>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;
    let column = reader
        .headers()?
        .iter()
        .position(|x| x == "coordinate_id")
        .ok_or_else(|| PipelineError::missing_column(CLEAN_FILE, "coordinate_id"))?;

    let mut output = Vec::new();
    for record in reader.records() {
        let record = record?;
        let value = record.get(column).unwrap_or_default();
        output.push(value.parse::<CoordinateId>().map_err(|_| PipelineError::Parse {
            field: "coordinate_id",
            value: value.to_string(),
        })?);
    }
    Ok(output)
}

/// Fails on the first id in `references` that isn't in `known`.
pub fn check<K: Ord + fmt::Display>(
    table: &str,
    target: &str,
    known: &BTreeSet<K>,
    references: impl IntoIterator<Item = K>,
) -> Result<(), PipelineError> {
    for id in references {
        if !known.contains(&id) {
            return Err(PipelineError::Referential {
                table: table.to_string(),
                id: id.to_string(),
                target: target.to_string(),
            });
        }
    }
    Ok(())
}
