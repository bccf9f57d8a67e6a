use std::{collections::BTreeSet, path::Path};

use _model::{Coordinate, ProximityPair, Source};
use anyhow::{bail, Context, Result};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::{
    config::Config,
    distance::is_close,
    error::PipelineError,
    tables::{self, PoiCoordinate, StopCoordinate, Table},
    utils::progress_bar,
};

/// Finds every (stop, POI) coordinate pair within `radius_km`. Pairs come out
/// with stops in the outer order and POIs in the inner one.
pub trait Matcher {
    fn matches(
        &self,
        stops: &[Coordinate],
        pois: &[Coordinate],
        radius_km: f64,
    ) -> Vec<ProximityPair>;
}

/// Tests the full cross product.
pub struct CrossJoin;

impl Matcher for CrossJoin {
    fn matches(
        &self,
        stops: &[Coordinate],
        pois: &[Coordinate],
        radius_km: f64,
    ) -> Vec<ProximityPair> {
        stops
            .iter()
            .flat_map(|stop| close_to(stop, pois, radius_km))
            .collect()
    }
}

/// [`CrossJoin`] fanned out over stops on the rayon pool, with a progress bar.
pub struct ParallelCrossJoin;

impl Matcher for ParallelCrossJoin {
    fn matches(
        &self,
        stops: &[Coordinate],
        pois: &[Coordinate],
        radius_km: f64,
    ) -> Vec<ProximityPair> {
        let per_stop: Vec<Vec<ProximityPair>> = stops
            .par_iter()
            .progress_with(progress_bar(stops.len() as u64))
            .map(|stop| close_to(stop, pois, radius_km))
            .collect();
        per_stop.into_iter().flatten().collect()
    }
}

fn close_to(stop: &Coordinate, pois: &[Coordinate], radius_km: f64) -> Vec<ProximityPair> {
    let point = stop.point();
    pois.iter()
        .filter(|poi| is_close(point, poi.point(), radius_km))
        .map(|poi| ProximityPair {
            stop_coordinate_id: stop.id,
            poi_coordinate_id: poi.id,
        })
        .collect()
}

/// Reads both coordinate tables, matches them and writes the close pairs
/// next to the stop tables.
pub fn run(pois_dir: &Path, stops_dir: &Path, config: &Config) -> Result<()> {
    let stops = load(
        tables::read::<StopCoordinate>(stops_dir)?
            .into_iter()
            .map(StopCoordinate::parse),
        Source::Stop,
        StopCoordinate::FILE,
    )?;
    let pois = load(
        tables::read::<PoiCoordinate>(pois_dir)?
            .into_iter()
            .map(PoiCoordinate::parse),
        Source::Poi,
        PoiCoordinate::FILE,
    )?;
    info!(
        "Matching {} stop coordinates against {} POI coordinates within {}km",
        stops.len(),
        pois.len(),
        config.radius_km
    );

    let pairs = match config.threads {
        Some(1) => CrossJoin.matches(&stops, &pois, config.radius_km),
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(|| ParallelCrossJoin.matches(&stops, &pois, config.radius_km)),
        None => ParallelCrossJoin.matches(&stops, &pois, config.radius_km),
    };
    info!("Found {} close pairs", pairs.len());

    tables::write(stops_dir, &pairs)?;
    Ok(())
}

/// Parses a coordinate table. Ids must be unique and belong to `source`.
fn load(
    rows: impl Iterator<Item = Result<Coordinate, PipelineError>>,
    source: Source,
    table: &str,
) -> Result<Vec<Coordinate>> {
    let mut seen = BTreeSet::new();
    let mut output = Vec::new();
    for row in rows {
        let row = row.with_context(|| format!("invalid row in {table}"))?;
        let detail = if row.id.source != source {
            format!("{} is not a {source} coordinate id", row.id)
        } else if !seen.insert(row.id) {
            format!("coordinate id {} is repeated", row.id)
        } else {
            output.push(row);
            continue;
        };
        bail!(PipelineError::Schema {
            table: table.to_string(),
            detail,
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use _model::{CoordinateId, Location};
    use typed_floats::tf64::NonNaN;

    use super::*;

    fn coordinate(source: Source, index: usize, lat: f64, lon: f64) -> Coordinate {
        Coordinate {
            id: CoordinateId::new(source, index),
            location: Location {
                latitude: NonNaN::new(lat).unwrap(),
                longitude: NonNaN::new(lon).unwrap(),
                srs: None,
            },
        }
    }

    fn fixture() -> (Vec<Coordinate>, Vec<Coordinate>) {
        let stops = vec![
            coordinate(Source::Stop, 0, 41.9028, 12.4964),
            coordinate(Source::Stop, 3, 45.4642, 9.19),
        ];
        let pois = vec![
            coordinate(Source::Poi, 0, 41.9029, 12.4534),
            // ~100m from the first stop
            coordinate(Source::Poi, 1, 41.9037, 12.4964),
            coordinate(Source::Poi, 4, 43.7696, 11.2558),
        ];
        (stops, pois)
    }

    #[test]
    fn single_close_pair() {
        let (stops, pois) = fixture();
        let pairs = CrossJoin.matches(&stops, &pois, 0.5);
        assert_eq!(
            pairs,
            vec![ProximityPair {
                stop_coordinate_id: CoordinateId::new(Source::Stop, 0),
                poi_coordinate_id: CoordinateId::new(Source::Poi, 1),
            }]
        );
    }

    #[test]
    fn radius_is_a_parameter() {
        let (stops, pois) = fixture();
        assert_eq!(CrossJoin.matches(&stops, &pois, 5.0).len(), 2);
        assert!(CrossJoin.matches(&stops, &pois, 0.0).is_empty());
        assert_eq!(CrossJoin.matches(&stops, &pois, 20_000.0).len(), 6);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut stops = Vec::new();
        let mut pois = Vec::new();
        for i in 0..60 {
            stops.push(coordinate(Source::Stop, i, 46.0 + i as f64 * 0.001, 11.0));
            pois.push(coordinate(Source::Poi, i, 46.0, 11.0 + i as f64 * 0.002));
        }
        let sequential = CrossJoin.matches(&stops, &pois, 0.5);
        assert!(!sequential.is_empty());
        assert_eq!(ParallelCrossJoin.matches(&stops, &pois, 0.5), sequential);
    }

    #[test]
    fn write_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let (stops, pois) = fixture();
        let stops: Vec<StopCoordinate> = stops.iter().map(StopCoordinate::from).collect();
        let pois: Vec<PoiCoordinate> = pois.iter().map(PoiCoordinate::from).collect();
        tables::write(dir.path(), &stops).unwrap();
        tables::write(dir.path(), &pois).unwrap();

        run(dir.path(), dir.path(), &Config::default()).unwrap();
        let output = fs::read_to_string(dir.path().join(ProximityPair::FILE)).unwrap();
        assert_eq!(output, "stop_coordinate_id,poi_coordinate_id\nSTOP0,POI1\n");
        assert!(!output.contains("lat"));
    }

    #[test]
    fn rejects_foreign_ids() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(StopCoordinate::FILE),
            "coordinate_id,stop_lat,stop_lon\nPOI0,46.0,11.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(PoiCoordinate::FILE),
            "coordinate_id,longitude,latitude,srsSystem\nPOI0,11.0,46.0,\n",
        )
        .unwrap();
        assert!(run(dir.path(), dir.path(), &Config::default()).is_err());
    }
}
