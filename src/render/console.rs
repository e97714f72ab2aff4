//! Fixed-width text tables for stdout.
//!
//! Every function returns the finished text; callers decide where it goes.

use chrono::NaiveDateTime;

use crate::analyzers::summary::DatasetSummary;
use crate::analyzers::types::{Bucket, Totals};
use crate::model::{CoordinateKey, SafetyEvent, YearMonth};

const WIDTH: usize = 70;

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(WIDTH);
    format!("\n{rule}\n{title}\n{rule}")
}

fn rule() -> String {
    "-".repeat(WIDTH)
}

pub fn format_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn totals(totals: &Totals) -> String {
    [
        format!("Total Fatal Incidents: {}", totals.incidents),
        format!("Total Fatalities: {}", totals.fatalities),
        format!("Total Injuries: {}", totals.injuries),
    ]
    .join("\n")
}

pub fn date_range(totals: &Totals) -> String {
    format!(
        "Date Range: {} to {}",
        format_date(totals.first_date),
        format_date(totals.last_date)
    )
}

/// Deadliest coordinate buckets, one row each.
pub fn location_table(buckets: &[Bucket<CoordinateKey>]) -> String {
    let mut lines = vec![
        format!(
            "Top {} Deadliest Locations (by approximate coordinates):",
            buckets.len()
        ),
        rule(),
        format!(
            "{:<12} {:<12} {:<8} {:<10} {:<20}",
            "Latitude", "Longitude", "Deaths", "Incidents", "Type"
        ),
        rule(),
    ];
    lines.extend(buckets.iter().map(|b| {
        format!(
            "{:<12.3} {:<12.3} {:<8} {:<10} {:<20}",
            b.key.latitude(),
            b.key.longitude(),
            b.fatalities,
            b.incidents,
            b.event_type
        )
    }));
    lines.join("\n")
}

/// Full detail block for each incident.
pub fn incident_details(events: &[&SafetyEvent]) -> String {
    let blocks: Vec<String> = events
        .iter()
        .map(|e| {
            let mut lines = vec![
                format!("Date: {}", format_date(e.incident_date)),
                format!("Location: ({:.4}, {:.4})", e.latitude, e.longitude),
                format!("Event Type: {}", e.event_type_label()),
                format!("Location Type: {}", e.location_type_label()),
                format!("Fatalities: {}", e.total_fatalities),
                format!("Injuries: {}", e.total_injuries),
            ];
            if let Some(address) = &e.approximate_address {
                lines.push(format!("Address: {address}"));
            }
            lines.join("\n")
        })
        .collect();
    blocks.join("\n\n")
}

/// Two-line compact form used in the map summary.
pub fn incident_lines(events: &[&SafetyEvent]) -> String {
    events
        .iter()
        .map(|e| {
            format!(
                "  {} | {:<20} | {} deaths\n    -> ({:.4}, {:.4}) {}",
                format_date(e.incident_date),
                truncate(e.event_type_label(), 20),
                e.total_fatalities,
                e.latitude,
                e.longitude,
                truncate(e.approximate_address.as_deref().unwrap_or(""), 50)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn event_type_lines(buckets: &[Bucket<String>]) -> String {
    buckets
        .iter()
        .map(|b| {
            format!(
                "  {}: {} incidents, {} deaths",
                b.key, b.incidents, b.fatalities
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn year_lines(buckets: &[Bucket<i32>]) -> String {
    buckets
        .iter()
        .map(|b| {
            format!(
                "  {}: {} incidents, {} deaths",
                b.key, b.incidents, b.fatalities
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn month_lines(buckets: &[Bucket<YearMonth>]) -> String {
    buckets
        .iter()
        .map(|b| {
            format!(
                "  {}: {} incidents, {} deaths",
                b.key, b.incidents, b.fatalities
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `value: count` lines, as in the incident statistics block.
pub fn count_summary_lines(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(value, count)| format!("  {value}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_lines(counts: &[(String, usize)]) -> String {
    if counts.is_empty() {
        return "  (no values)".to_string();
    }
    counts
        .iter()
        .map(|(value, count)| format!("  {value:<50} {count:>6}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Record count and per-field gaps for the whole download.
pub fn dataset_overview(summary: &DatasetSummary) -> String {
    let mut lines = vec![
        banner("DATASET OVERVIEW"),
        String::new(),
        format!("Total records: {}", summary.records),
        String::new(),
        "Missing values:".to_string(),
    ];
    lines.extend(
        summary
            .missing
            .iter()
            .map(|(field, missing)| format!("  {field:<22} {missing:>6}")),
    );
    lines.join("\n")
}

/// Breakdowns of the agency-matched records.
pub fn new_york_breakdown(summary: &DatasetSummary) -> String {
    let mut sections = vec![
        banner("LOCATION ANALYSIS - NEW YORK TRANSIT SAFETY INCIDENTS"),
        format!("\n--- Incidents by Transit Agency ---\n{}", count_lines(&summary.by_agency)),
        format!("\n--- Incidents by Location Type ---\n{}", count_lines(&summary.by_location_type)),
        format!("\n--- Incidents by City ---\n{}", count_lines(&summary.by_city)),
        banner("INCIDENT TYPE ANALYSIS"),
        format!("\n--- Event Type Distribution ---\n{}", count_lines(&summary.by_event_type)),
        banner("TEMPORAL ANALYSIS"),
    ];

    let years: Vec<String> = summary
        .by_year
        .iter()
        .map(|(year, count)| format!("  {year}: {count} incidents"))
        .collect();
    sections.push(format!("\n--- Incidents by Year ---\n{}", years.join("\n")));
    if summary.undated > 0 {
        sections.push(format!("  ({} records without a usable date)", summary.undated));
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bucket<K>(key: K, fatalities: u64, incidents: usize, event_type: &str) -> Bucket<K> {
        Bucket {
            key,
            fatalities,
            incidents,
            event_type: event_type.to_string(),
            location_type: "Station".to_string(),
        }
    }

    fn event(address: Option<&str>) -> SafetyEvent {
        SafetyEvent {
            agency: None,
            event_type: Some("Rail Collision".to_string()),
            incident_date: NaiveDate::from_ymd_opt(2019, 3, 1).and_then(|d| d.and_hms_opt(8, 0, 0)),
            latitude: 40.75,
            longitude: -73.98,
            total_fatalities: 2,
            total_injuries: 5,
            location_type: None,
            approximate_address: address.map(str::to_string),
        }
    }

    #[test]
    fn test_location_table_fixed_width() {
        let table = location_table(&[bucket(
            CoordinateKey::from_degrees(40.75, -73.98),
            4,
            3,
            "Suicide",
        )]);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines[0], "Top 1 Deadliest Locations (by approximate coordinates):");
        assert!(lines[2].starts_with("Latitude     Longitude    Deaths   Incidents  Type"));
        assert!(lines[4].starts_with("40.750       -73.980      4        3          Suicide"));
    }

    #[test]
    fn test_incident_details_with_and_without_address() {
        let with = event(Some("34th St - Herald Sq"));
        let without = event(None);
        let text = incident_details(&[&with, &without]);

        assert!(text.contains("Date: 2019-03-01"));
        assert!(text.contains("Location: (40.7500, -73.9800)"));
        assert!(text.contains("Location Type: Unknown"));
        assert_eq!(text.matches("Address:").count(), 1);
        assert_eq!(text.matches("Fatalities: 2").count(), 2);
    }

    #[test]
    fn test_incident_lines() {
        let e = event(Some("Broadway"));
        let text = incident_lines(&[&e]);
        assert!(text.starts_with("  2019-03-01 | Rail Collision       | 2 deaths"));
        assert!(text.ends_with("(40.7500, -73.9800) Broadway"));
    }

    #[test]
    fn test_summary_lines() {
        let types = event_type_lines(&[bucket("Suicide".to_string(), 4, 3, "Suicide")]);
        assert_eq!(types, "  Suicide: 3 incidents, 4 deaths");

        let months = month_lines(&[bucket(YearMonth { year: 2019, month: 3 }, 2, 1, "Suicide")]);
        assert_eq!(months, "  2019-03: 1 incidents, 2 deaths");

        let years = year_lines(&[bucket(2019, 2, 1, "Suicide")]);
        assert_eq!(years, "  2019: 1 incidents, 2 deaths");
    }

    #[test]
    fn test_count_summary_lines() {
        let counts = vec![("Station".to_string(), 2), ("Street".to_string(), 1)];
        assert_eq!(count_summary_lines(&counts), "  Station: 2\n  Street: 1");
    }

    #[test]
    fn test_totals_and_range() {
        let t = Totals {
            incidents: 2,
            fatalities: 3,
            injuries: 1,
            first_date: NaiveDate::from_ymd_opt(2015, 1, 2).and_then(|d| d.and_hms_opt(0, 0, 0)),
            last_date: None,
        };
        assert_eq!(
            totals(&t),
            "Total Fatal Incidents: 2\nTotal Fatalities: 3\nTotal Injuries: 1"
        );
        assert_eq!(date_range(&t), "Date Range: 2015-01-02 to Unknown");
    }

    #[test]
    fn test_breakdown_sections() {
        let summary = DatasetSummary {
            records: 2,
            by_agency: vec![("MTA New York City Transit".to_string(), 2)],
            by_year: vec![(2019, 2)],
            ..Default::default()
        };
        let text = new_york_breakdown(&summary);
        assert!(text.contains("--- Incidents by Transit Agency ---"));
        assert!(text.contains("MTA New York City Transit"));
        assert!(text.contains("  2019: 2 incidents"));
        assert!(text.contains("(no values)"));

        let overview = dataset_overview(&summary);
        assert!(overview.contains("Total records: 2"));
    }
}
