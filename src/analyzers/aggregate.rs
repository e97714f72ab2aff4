use std::collections::HashMap;
use std::hash::Hash;

use crate::analyzers::types::Bucket;
use crate::analyzers::utility::modal_label;
use crate::model::{CoordinateKey, SafetyEvent, UNKNOWN, YearMonth};

/// Number of coordinate buckets shown in the deadliest-locations table.
pub const TOP_LOCATIONS: usize = 15;

/// Number of months shown in the deadliest-months view.
pub const TOP_MONTHS: usize = 10;

#[derive(Default)]
struct Group<'a> {
    fatalities: u64,
    incidents: usize,
    event_types: Vec<Option<&'a str>>,
    location_types: Vec<Option<&'a str>>,
}

/// Groups events by `key`, keeping groups in first-encountered order.
///
/// Events for which `key` returns `None` are skipped.
pub fn aggregate_by<K, F>(events: &[SafetyEvent], key: F) -> Vec<Bucket<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&SafetyEvent) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Group<'_>)> = Vec::new();

    for event in events {
        let Some(k) = key(event) else {
            continue;
        };

        let i = match index.get(&k) {
            Some(&i) => i,
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, Group::default()));
                groups.len() - 1
            }
        };

        let group = &mut groups[i].1;
        group.fatalities += u64::from(event.total_fatalities);
        group.incidents += 1;
        group.event_types.push(event.event_type.as_deref());
        group.location_types.push(event.location_type.as_deref());
    }

    groups
        .into_iter()
        .map(|(key, group)| Bucket {
            key,
            fatalities: group.fatalities,
            incidents: group.incidents,
            event_type: modal_label(group.event_types),
            location_type: modal_label(group.location_types),
        })
        .collect()
}

/// Sorts buckets by fatality sum, highest first. The sort is stable, so
/// equal sums stay in first-encountered order.
pub fn rank_by_fatalities<K>(buckets: &mut [Bucket<K>]) {
    buckets.sort_by(|a, b| b.fatalities.cmp(&a.fatalities));
}

/// Sorts buckets by key, ascending.
pub fn chronological<K: Ord>(buckets: &mut [Bucket<K>]) {
    buckets.sort_by(|a, b| a.key.cmp(&b.key));
}

/// The `n` deadliest buckets, without disturbing the input order.
pub fn deadliest<K: Clone>(buckets: &[Bucket<K>], n: usize) -> Vec<Bucket<K>> {
    let mut ranked = buckets.to_vec();
    rank_by_fatalities(&mut ranked);
    ranked.truncate(n);
    ranked
}

/// Buckets by coordinate rounded to three decimals, deadliest first.
pub fn by_coordinate(events: &[SafetyEvent]) -> Vec<Bucket<CoordinateKey>> {
    let mut buckets = aggregate_by(events, |e| Some(CoordinateKey::of(e)));
    rank_by_fatalities(&mut buckets);
    buckets
}

/// Buckets by event type, deadliest first. Missing types group as "Unknown".
pub fn by_event_type(events: &[SafetyEvent]) -> Vec<Bucket<String>> {
    let mut buckets = aggregate_by(events, |e| {
        Some(e.event_type.clone().unwrap_or_else(|| UNKNOWN.to_string()))
    });
    rank_by_fatalities(&mut buckets);
    buckets
}

/// Buckets by calendar month, chronological. Undated events are skipped.
pub fn by_year_month(events: &[SafetyEvent]) -> Vec<Bucket<YearMonth>> {
    let mut buckets = aggregate_by(events, SafetyEvent::year_month);
    chronological(&mut buckets);
    buckets
}

/// Buckets by year, chronological. Undated events are skipped.
pub fn by_year(events: &[SafetyEvent]) -> Vec<Bucket<i32>> {
    let mut buckets = aggregate_by(events, SafetyEvent::year);
    chronological(&mut buckets);
    buckets
}
