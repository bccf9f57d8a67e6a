use std::collections::{BTreeMap, BTreeSet};

use _model::{Poi, PoiTopic, Topic};
use itertools::Itertools;

/// Lowercases a topic and drops list punctuation and spaces. A single raw
/// topic may still hold several comma-separated ones.
pub fn clean(topic: &str) -> Vec<String> {
    topic
        .chars()
        .filter(|x| !matches!(x, '[' | ']' | '\'' | ' '))
        .collect::<String>()
        .to_lowercase()
        .split(',')
        .filter(|x| !x.is_empty())
        .map(|x| x.to_string())
        .collect()
}

/// Builds the topic table, sorted by name with ids counting up from 0, and
/// the relation linking each POI to its distinct topics.
pub fn extract(pois: &[Poi]) -> (Vec<Topic>, Vec<PoiTopic>) {
    let per_poi: Vec<Vec<String>> = pois
        .iter()
        .map(|x| {
            x.topics
                .iter()
                .flat_map(|x| clean(x))
                .unique()
                .collect()
        })
        .collect();

    let names: BTreeSet<&String> = per_poi.iter().flatten().collect();
    let ids: BTreeMap<&String, usize> = names
        .into_iter()
        .enumerate()
        .map(|(i, x)| (x, i))
        .collect();

    let topics = ids
        .iter()
        .map(|(name, id)| Topic {
            topic_id: *id,
            name: name.to_string(),
        })
        .collect();

    let mut relations = Vec::new();
    for (poi, names) in pois.iter().zip(&per_poi) {
        for name in names {
            relations.push(PoiTopic {
                poi_id: poi.id.clone(),
                topic_id: ids[name],
            });
        }
    }

    (topics, relations)
}
