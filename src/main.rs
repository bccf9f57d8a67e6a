#[macro_use]
extern crate log;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;

mod config;
mod dimension;
mod distance;
mod error;
mod pois;
mod proximity;
mod stops;
mod tables;
mod utils;
mod verify;

#[derive(Debug, Parser)]
struct Cli {
    /// YAML file overriding the built-in settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for the POI tables.
    #[arg(long, global = true, default_value = "data")]
    data: PathBuf,
    /// Directory for the stop tables and the close pairs.
    #[arg(long, global = true, default_value = "GTFS")]
    gtfs: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Flatten and normalize the POI export.
    Pois {
        #[arg(long, default_value = "POI.json")]
        input: PathBuf,
    },
    /// Extract stop coordinates from a GTFS stops.txt.
    Stops {
        /// Defaults to stops.txt in the GTFS directory.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Pair up stop and POI coordinates that are close to each other.
    Close {
        /// Kilometres.
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Check that every id referenced between the tables exists.
    Verify,
    /// Run every stage in order.
    All {
        #[arg(long, default_value = "POI.json")]
        input: PathBuf,
        #[arg(long)]
        stops: Option<PathBuf>,
    },
    /// Print the distance in kilometres between two points.
    Distance {
        #[arg(allow_hyphen_values = true)]
        lat_1: String,
        #[arg(allow_hyphen_values = true)]
        lon_1: String,
        #[arg(allow_hyphen_values = true)]
        lat_2: String,
        #[arg(allow_hyphen_values = true)]
        lon_2: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    let stops_input = |x: Option<PathBuf>| x.unwrap_or_else(|| cli.gtfs.join("stops.txt"));

    match cli.command.clone() {
        Command::Pois { input } => pois::run(&input, &cli.data, &config)?,
        Command::Stops { input } => stops::run(&stops_input(input), &cli.gtfs, &config)?,
        Command::Close { radius, threads } => {
            if let Some(x) = radius {
                config.radius_km = x;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            config.validate()?;
            proximity::run(&cli.data, &cli.gtfs, &config)?
        }
        Command::Verify => verify::run(&cli.data, &cli.gtfs)?,
        Command::All { input, stops } => {
            all(&input, &stops_input(stops), &cli.data, &cli.gtfs, &config)?
        }
        Command::Distance {
            lat_1,
            lon_1,
            lat_2,
            lon_2,
        } => {
            let d = distance::parse_distance(&lat_1, &lon_1, &lat_2, &lon_2)?;
            let close = d <= config.radius_km;
            println!("{d:.3} km ({})", if close { "close" } else { "not close" });
        }
    }

    Ok(())
}

fn all(
    pois_input: &Path,
    stops_input: &Path,
    data: &Path,
    gtfs: &Path,
    config: &Config,
) -> Result<()> {
    pois::run(pois_input, data, config)?;
    stops::run(stops_input, gtfs, config)?;
    proximity::run(data, gtfs, config)?;
    verify::run(data, gtfs)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli() {
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from([
            "poi-transit",
            "distance",
            "-33.8",
            "151.2",
            "-33.9",
            "151.2",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Distance { lat_1, .. } if lat_1 == "-33.8"));
    }

    fn run_all(root: &Path) {
        let poi_input = root.join("POI.json");
        let stops_input = root.join("stops.txt");
        fs::write(&poi_input, pois::tests::export().to_string()).unwrap();
        fs::write(&stops_input, stops::tests::STOPS).unwrap();
        all(
            &poi_input,
            &stops_input,
            &root.join("data"),
            &root.join("GTFS"),
            &Config::default(),
        )
        .unwrap();
    }

    fn outputs(root: &Path) -> Vec<(String, Vec<u8>)> {
        let mut output = Vec::new();
        for dir in ["data", "GTFS"] {
            let mut entries: Vec<_> = fs::read_dir(root.join(dir))
                .unwrap()
                .map(|x| x.unwrap().path())
                .collect();
            entries.sort();
            for path in entries {
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                output.push((name, fs::read(&path).unwrap()));
            }
        }
        output
    }

    #[test]
    fn pipeline() {
        let dir = tempfile::tempdir().unwrap();
        run_all(dir.path());

        let outputs = outputs(dir.path());
        assert_eq!(outputs.len(), 8 + 3);

        let pairs = &outputs
            .iter()
            .find(|(name, _)| name == "close_POI_stop.csv")
            .unwrap()
            .1;
        // both Trento museums sit at one coordinate near the two Trento stops,
        // Bolzano's stop is a few hundred metres from its museum
        assert_eq!(
            String::from_utf8_lossy(pairs),
            "stop_coordinate_id,poi_coordinate_id\nSTOP0,POI0\nSTOP1,POI0\nSTOP3,POI2\n"
        );
    }

    #[test]
    fn idempotent() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        run_all(first.path());
        run_all(second.path());
        run_all(second.path());
        assert_eq!(outputs(first.path()), outputs(second.path()));
    }
}
