use std::{fs, io, path::Path};

use _model::{Coordinate, CoordinateId, Location, Source};
use anyhow::{Context, Result};
use csv::StringRecord;

use crate::{
    config::Config,
    dimension,
    error::PipelineError,
    tables::{self, StopCoordinate},
    utils::parse_number,
};

pub const CLEAN_FILE: &str = "stops_clean.csv";
const TABLE: &str = "stops.txt";

/// GTFS stops with their position replaced by a coordinate id. Every other
/// column is carried through untouched.
#[derive(Debug)]
pub struct Stops {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub coordinate_ids: Vec<CoordinateId>,
    pub coordinates: Vec<Coordinate>,
}

pub fn run(input: &Path, output: &Path, config: &Config) -> Result<()> {
    let file =
        fs::File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let stops =
        extract(file, config).with_context(|| format!("failed to load {}", input.display()))?;
    info!(
        "Extracted {} coordinates from {} stops",
        stops.coordinates.len(),
        stops.rows.len()
    );

    fs::create_dir_all(output)?;
    let path = output.join(CLEAN_FILE);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(
        stops
            .columns
            .iter()
            .map(|x| x.as_str())
            .chain(["coordinate_id"]),
    )?;
    for (row, id) in stops.rows.iter().zip(&stops.coordinate_ids) {
        let id = id.to_string();
        writer.write_record(row.iter().map(|x| x.as_str()).chain([id.as_str()]))?;
    }
    writer.flush()?;

    let coordinates: Vec<StopCoordinate> = stops
        .coordinates
        .iter()
        .map(StopCoordinate::from)
        .collect();
    tables::write(output, &coordinates)?;
    Ok(())
}

pub fn extract<R: io::Read>(reader: R, config: &Config) -> Result<Stops> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|x| x.trim_start_matches('\u{feff}').to_string())
        .collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|x| x == name)
            .ok_or_else(|| PipelineError::missing_column(TABLE, name))
    };
    let lat = column("stop_lat")?;
    let lon = column("stop_lon")?;

    let mut rows = Vec::new();
    let mut locations = Vec::new();
    let mut skipped = 0;
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("invalid row {}", index + 1))?;
        match location(&record, lat, lon) {
            Ok(x) => locations.push(x),
            Err(e) if config.skip_invalid && e.is_record_level() => {
                warn!("Skipping stop on row {}: {e}", index + 1);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("invalid row {}", index + 1)),
        }
        rows.push(
            record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != lat && *i != lon)
                .map(|(_, x)| x.to_string())
                .collect(),
        );
    }
    if skipped > 0 {
        warn!("Skipped {skipped} stops");
    }

    let (coordinates, coordinate_ids) = dimension::coordinates(Source::Stop, locations);
    let columns = headers
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != lat && *i != lon)
        .map(|(_, x)| x)
        .collect();

    Ok(Stops {
        columns,
        rows,
        coordinate_ids,
        coordinates,
    })
}

fn location(record: &StringRecord, lat: usize, lon: usize) -> Result<Location, PipelineError> {
    let field = |i: usize, name: &'static str| {
        record.get(i).ok_or_else(|| PipelineError::Schema {
            table: TABLE.to_string(),
            detail: format!("row has no {name}"),
        })
    };
    Ok(Location {
        latitude: parse_number("stop_lat", field(lat, "stop_lat")?)?,
        longitude: parse_number("stop_lon", field(lon, "stop_lon")?)?,
        srs: None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const STOPS: &str = "\
stop_id,stop_code,stop_name,stop_lat,stop_lon,zone_id
1,TN01,Trento Stazione,46.0721,11.1195,A
2,TN02,\"Piazza Dante, Trento\",46.0718,11.1210,A
3,TN01b,Trento Stazione,46.0721,11.1195,A
4,BZ01,Bolzano,46.4986,11.3541,B
";

    #[test]
    fn extract_stops() {
        let stops = extract(STOPS.as_bytes(), &Config::default()).unwrap();
        assert_eq!(stops.columns, vec!["stop_id", "stop_code", "stop_name", "zone_id"]);
        assert_eq!(stops.rows[1], vec!["2", "TN02", "Piazza Dante, Trento", "A"]);
        assert_eq!(
            stops
                .coordinate_ids
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>(),
            vec!["STOP0", "STOP1", "STOP0", "STOP3"]
        );
        assert_eq!(stops.coordinates.len(), 3);
        assert_eq!(stops.coordinates[2].location.latitude.get(), 46.4986);
    }

    #[test]
    fn missing_column() {
        let err = extract("stop_id,stop_lat\n1,46.0\n".as_bytes(), &Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn bad_coordinate() {
        let input = "stop_id,stop_lat,stop_lon\n1,46.0,11.0\n2,,11.0\n3,46.1,11.1\n";
        let err = extract(input.as_bytes(), &Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Parse {
                field: "stop_lat",
                ..
            })
        ));

        let config = Config {
            skip_invalid: true,
            ..Config::default()
        };
        let stops = extract(input.as_bytes(), &config).unwrap();
        assert_eq!(stops.rows, vec![vec!["1"], vec!["3"]]);
        assert_eq!(stops.coordinate_ids[1].to_string(), "STOP1");
    }

    #[test]
    fn write_tables() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("stops.txt");
        fs::write(&input, STOPS).unwrap();
        run(&input, dir.path(), &Config::default()).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join(CLEAN_FILE)).unwrap(),
            "\
stop_id,stop_code,stop_name,zone_id,coordinate_id
1,TN01,Trento Stazione,A,STOP0
2,TN02,\"Piazza Dante, Trento\",A,STOP1
3,TN01b,Trento Stazione,A,STOP0
4,BZ01,Bolzano,B,STOP3
"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("Stops_coordinates.csv")).unwrap(),
            "\
coordinate_id,stop_lat,stop_lon
STOP0,46.0721,11.1195
STOP1,46.0718,11.121
STOP3,46.4986,11.3541
"
        );
    }
}
