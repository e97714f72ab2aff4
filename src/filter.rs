//! Row filters: agency keyword match and fatal-incident selection.

use crate::model::{RawEvent, SafetyEvent};

/// Upper-cases keywords once and drops blank ones.
fn prepare_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn matches_prepared(agency: Option<&str>, keywords: &[String]) -> bool {
    let Some(agency) = agency else {
        return false;
    };
    let agency = agency.to_uppercase();
    keywords.iter().any(|k| agency.contains(k.as_str()))
}

/// Case-insensitive substring match of `agency` against any keyword.
/// A missing agency never matches.
pub fn matches_agency(agency: Option<&str>, keywords: &[String]) -> bool {
    matches_prepared(agency, &prepare_keywords(keywords))
}

/// Keeps the records whose agency matches a keyword, in input order.
pub fn filter_agency(events: Vec<RawEvent>, keywords: &[String]) -> Vec<RawEvent> {
    let keywords = prepare_keywords(keywords);
    events
        .into_iter()
        .filter(|e| matches_prepared(e.agency.as_deref(), &keywords))
        .collect()
}

/// Keeps the events with at least one fatality, in input order.
pub fn select_fatal(events: Vec<SafetyEvent>) -> Vec<SafetyEvent> {
    events.into_iter().filter(SafetyEvent::is_fatal).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_AGENCY_KEYWORDS;

    fn nyc_keywords() -> Vec<String> {
        DEFAULT_AGENCY_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }

    fn raw(agency: Option<&str>) -> RawEvent {
        RawEvent {
            agency: agency.map(str::to_string),
            ..Default::default()
        }
    }

    fn event(fatalities: u32) -> SafetyEvent {
        SafetyEvent {
            agency: None,
            event_type: None,
            incident_date: None,
            latitude: 40.75,
            longitude: -73.98,
            total_fatalities: fatalities,
            total_injuries: 0,
            location_type: None,
            approximate_address: None,
        }
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let keywords = nyc_keywords();
        assert!(matches_agency(Some("MTA New York City Transit"), &keywords));
        assert!(matches_agency(Some("metropolitan transportation authority"), &keywords));
        assert!(matches_agency(Some("Nyc Ferry"), &keywords));
        assert!(!matches_agency(Some("Los Angeles County Metro"), &keywords));
    }

    #[test]
    fn test_null_agency_never_matches() {
        assert!(!matches_agency(None, &nyc_keywords()));

        let kept = filter_agency(vec![raw(None), raw(Some("MTA Bus Company"))], &nyc_keywords());
        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|e| e.agency.is_some()));
    }

    #[test]
    fn test_filter_preserves_order() {
        let events = vec![
            raw(Some("NYC Transit")),
            raw(Some("LA Metro")),
            raw(Some("MTA Long Island Rail Road")),
            raw(Some("New York Waterway")),
        ];
        let kept = filter_agency(events, &nyc_keywords());
        let agencies: Vec<_> = kept.iter().filter_map(|e| e.agency.as_deref()).collect();
        assert_eq!(
            agencies,
            vec!["NYC Transit", "MTA Long Island Rail Road", "New York Waterway"]
        );
    }

    #[test]
    fn test_lowercase_and_blank_keywords() {
        let keywords = vec!["septa".to_string(), "  ".to_string()];
        assert!(matches_agency(Some("SEPTA Regional Rail"), &keywords));
        assert!(!matches_agency(Some("MTA"), &keywords));
        assert!(!matches_agency(Some("anything"), &[]));
    }

    #[test]
    fn test_select_fatal_drops_zero() {
        let kept = select_fatal(vec![event(0), event(2), event(1), event(0)]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| e.total_fatalities >= 1));
    }

    #[test]
    fn test_select_fatal_is_idempotent() {
        let once = select_fatal(vec![event(3), event(0), event(1)]);
        let twice = select_fatal(once.clone());
        assert_eq!(once, twice);
    }
}
