//! Extraction of dimension tables: distinct values pulled out of a list of
//! records, given a surrogate key, and linked back to every record.

use std::collections::BTreeMap;

use _model::{Coordinate, CoordinateId, Location, Source};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdScheme {
    /// Id is the position of the first record holding the value, so ids have
    /// gaps wherever a value repeats.
    FirstOccurrence,
    /// Ids count up from 0 in first-occurrence order.
    Sequential,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member<K> {
    pub id: usize,
    pub key: K,
    /// Index of the record this value was first seen in.
    pub first: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension<K> {
    /// One entry per distinct key, in first-occurrence order.
    pub members: Vec<Member<K>>,
    /// The id assigned to each input record, in input order.
    pub assignments: Vec<usize>,
}

pub fn extract<K: Ord + Clone>(
    keys: impl IntoIterator<Item = K>,
    scheme: IdScheme,
) -> Dimension<K> {
    let mut ids: BTreeMap<K, usize> = BTreeMap::new();
    let mut members = Vec::new();
    let mut assignments = Vec::new();

    for (index, key) in keys.into_iter().enumerate() {
        let id = match ids.get(&key) {
            Some(id) => *id,
            None => {
                let id = match scheme {
                    IdScheme::FirstOccurrence => index,
                    IdScheme::Sequential => members.len(),
                };
                ids.insert(key.clone(), id);
                members.push(Member {
                    id,
                    key,
                    first: index,
                });
                id
            }
        };
        assignments.push(id);
    }

    Dimension {
        members,
        assignments,
    }
}

/// Collapses repeated locations into coordinates with ids namespaced by
/// `source`, returning the coordinate table and the id of every input.
pub fn coordinates(
    source: Source,
    locations: impl IntoIterator<Item = Location>,
) -> (Vec<Coordinate>, Vec<CoordinateId>) {
    let dimension = extract(locations, IdScheme::FirstOccurrence);
    let table = dimension
        .members
        .into_iter()
        .map(|x| Coordinate {
            id: CoordinateId::new(source, x.id),
            location: x.key,
        })
        .collect();
    let ids = dimension
        .assignments
        .into_iter()
        .map(|x| CoordinateId::new(source, x))
        .collect();
    (table, ids)
}
