use _model::{City, Poi, Region, Street};

use crate::dimension::{extract, IdScheme};

pub struct Addresses {
    pub regions: Vec<Region>,
    pub cities: Vec<City>,
    pub streets: Vec<Street>,
    /// Street of every POI, in input order.
    pub street_ids: Vec<usize>,
}

/// Splits POI addresses into region, city and street tables. Regions get
/// sequential ids; cities are grouped by postal code and streets by
/// (street, city), both keyed by the first POI carrying them.
pub fn extract_addresses(pois: &[Poi]) -> Addresses {
    let regions = extract(pois.iter().map(|x| &x.address.region), IdScheme::Sequential);
    let region_ids = regions.assignments;
    let regions = regions
        .members
        .into_iter()
        .map(|x| Region {
            region_id: x.id,
            code: x.key.clone(),
        })
        .collect();

    let cities = extract(
        pois.iter().map(|x| &x.address.postal_code),
        IdScheme::FirstOccurrence,
    );
    let city_ids = cities.assignments;
    let cities: Vec<City> = cities
        .members
        .into_iter()
        .map(|x| City {
            city_id: x.id,
            city: pois[x.first].address.city.clone(),
            postal_code: x.key.clone(),
            region_id: region_ids[x.first],
        })
        .collect();

    for (index, poi) in pois.iter().enumerate() {
        // city ids are first-occurrence indices, so they point back at a POI
        let first = city_ids[index];
        if poi.address.city != pois[first].address.city || region_ids[index] != region_ids[first] {
            warn!(
                "POI {} is in {} ({}) but postal code {} was first seen in {} ({})",
                poi.id,
                poi.address.city,
                poi.address.region,
                poi.address.postal_code,
                pois[first].address.city,
                pois[first].address.region
            );
        }
    }

    let streets = extract(
        pois.iter()
            .zip(&city_ids)
            .map(|(x, city_id)| (&x.address.street, *city_id)),
        IdScheme::FirstOccurrence,
    );
    let street_ids = streets.assignments;
    let streets = streets
        .members
        .into_iter()
        .map(|x| Street {
            street_id: x.id,
            street: x.key.0.clone(),
            city_id: x.key.1,
        })
        .collect();

    Addresses {
        regions,
        cities,
        streets,
        street_ids,
    }
}
