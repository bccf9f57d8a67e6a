use geo::Point;

use crate::{error::PipelineError, utils::parse_number};

// kilometres
pub const EARTH_RADIUS_KM: f64 = 6373.0;
pub const CLOSE_RADIUS_KM: f64 = 0.5;

/// Great-circle distance in kilometres between two points given in degrees.
pub fn haversine(lat_1: f64, lon_1: f64, lat_2: f64, lon_2: f64) -> f64 {
    let (lat_1, lon_1, lat_2, lon_2) = (
        lat_1.to_radians(),
        lon_1.to_radians(),
        lat_2.to_radians(),
        lon_2.to_radians(),
    );

    let d_lat = lat_2 - lat_1;
    let d_lon = lon_2 - lon_1;

    let a = (d_lat / 2.0).sin().powi(2) + lat_1.cos() * lat_2.cos() * (d_lon / 2.0).sin().powi(2);

    // rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Same as [`haversine`], for points stored as (lon, lat).
pub fn distance(a: Point, b: Point) -> f64 {
    haversine(a.y(), a.x(), b.y(), b.x())
}

/// [`haversine`] over coordinates that are still text, as read from a table.
pub fn parse_distance(
    lat_1: &str,
    lon_1: &str,
    lat_2: &str,
    lon_2: &str,
) -> Result<f64, PipelineError> {
    Ok(haversine(
        parse_number("latitude", lat_1)?.get(),
        parse_number("longitude", lon_1)?.get(),
        parse_number("latitude", lat_2)?.get(),
        parse_number("longitude", lon_2)?.get(),
    ))
}

pub fn is_close(a: Point, b: Point, radius_km: f64) -> bool {
    distance(a, b) <= radius_km
}

#[cfg(test)]
mod tests {
    use geo::HaversineDistance;

    use super::*;

    const ROME: (f64, f64) = (41.9028, 12.4964);
    const VATICAN: (f64, f64) = (41.9029, 12.4534);

    fn point((lat, lon): (f64, f64)) -> Point {
        Point::new(lon, lat)
    }

    #[test]
    fn rome_to_vatican() {
        let d = haversine(ROME.0, ROME.1, VATICAN.0, VATICAN.1);
        assert!((d - 3.56).abs() < 0.01, "{d}");
        assert!(!is_close(point(ROME), point(VATICAN), CLOSE_RADIUS_KM));
    }

    #[test]
    fn same_point() {
        assert_eq!(distance(point(ROME), point(ROME)), 0.0);
        assert!(is_close(point(ROME), point(ROME), CLOSE_RADIUS_KM));
    }

    #[test]
    fn symmetric() {
        let points = [ROME, VATICAN, (-33.87, 151.21), (51.5, -0.12), (0.0, 180.0)];
        for a in points {
            for b in points {
                let ab = distance(point(a), point(b));
                let ba = distance(point(b), point(a));
                assert!((ab - ba).abs() < 1e-9);
                assert!(ab >= 0.0);
            }
        }
    }

    #[test]
    fn close_iff_within_radius() {
        // ~0.0045 degrees of latitude is ~0.5km
        for step in 0..20 {
            let other = (ROME.0 + step as f64 * 0.0005, ROME.1);
            let d = distance(point(ROME), point(other));
            assert_eq!(is_close(point(ROME), point(other), CLOSE_RADIUS_KM), d <= 0.5);
        }
        assert!(is_close(point(ROME), point(VATICAN), 4.0));
    }

    #[test]
    fn agrees_with_geo() {
        // geo uses the mean radius, so only the scale differs
        let ours = distance(point(ROME), point((-33.87, 151.21)));
        let theirs = point(ROME).haversine_distance(&point((-33.87, 151.21))) / 1000.0;
        let scaled = theirs * EARTH_RADIUS_KM / 6371.0088;
        assert!((ours - scaled).abs() < 1e-3, "{ours} {scaled}");
    }

    #[test]
    fn text_input() {
        let d = parse_distance("41.9028", "12.4964", "41.9029", "12.4534").unwrap();
        assert!((d - 3.56).abs() < 0.01);
        assert!(matches!(
            parse_distance("41.9028", "east", "41.9029", "12.4534"),
            Err(PipelineError::Parse {
                field: "longitude",
                ..
            })
        ));
    }
}
