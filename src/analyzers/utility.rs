use std::collections::HashMap;

use crate::model::UNKNOWN;

/// Most frequent non-null label. Ties go to the label seen first; all-null
/// (or empty) input yields [`UNKNOWN`].
pub fn modal_label<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> String {
    value_counts(values.into_iter().flatten())
        .into_iter()
        .next()
        .map(|(label, _)| label)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Occurrence counts, most frequent first. Equal counts keep first-seen order.
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}
