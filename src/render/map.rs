//! Interactive Leaflet maps of New York fatal incidents.
//!
//! Incidents are embedded in the page as a GeoJSON feature collection; the
//! page templates only read `properties` and `geometry.coordinates`.
//! Templates are `.html` so `minijinja` escapes every interpolated value,
//! and `tojson` output is safe inside `<script>`.

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use minijinja::{Environment, context};
use serde_json::json;

use crate::analyzers::aggregate::{TOP_MONTHS, by_event_type, by_year, by_year_month, deadliest};
use crate::analyzers::summary::{TOP_INCIDENTS, deadliest_incidents, totals};
use crate::config::PipelineConfig;
use crate::model::SafetyEvent;
use crate::normalize::NormalizeOptions;
use crate::render::{LEGEND, Renderer, Report, console, event_color, marker_radius};

pub const BASEMAP_FILE: &str = "fta_nyc_fatal_incidents_map.html";
pub const TIMELINE_FILE: &str = "fta_nyc_time_slider_map.html";

const NO_ADDRESS: &str = "Address not available";

/// The map page templates, parsed once.
pub struct MapTemplates {
    env: Environment<'static>,
}

impl MapTemplates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("popup.html", include_str!("templates/popup.html"))
            .context("failed to add popup template")?;
        env.add_template("basemap.html", include_str!("templates/basemap.html"))
            .context("failed to add basemap template")?;
        env.add_template("timeline.html", include_str!("templates/timeline.html"))
            .context("failed to add timeline template")?;
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .with_context(|| format!("missing {name} template"))?
            .render(ctx)
            .with_context(|| format!("{name} render failed"))
    }

    /// Popup body for one incident.
    pub fn popup(&self, event: &SafetyEvent) -> Result<String> {
        self.render(
            "popup.html",
            context! {
                event_type => event.event_type_label(),
                date => console::format_date(event.incident_date),
                fatalities => event.total_fatalities,
                injuries => event.total_injuries,
                location_type => event.location_type_label(),
                address => event.approximate_address.as_deref().unwrap_or(NO_ADDRESS),
            },
        )
    }

    fn feature(&self, event: &SafetyEvent) -> Result<Feature> {
        let mut properties = JsonObject::new();
        properties.insert("event_type".into(), json!(event.event_type_label()));
        properties.insert(
            "date".into(),
            json!(event.incident_date.map(|d| d.format("%Y-%m-%d").to_string())),
        );
        properties.insert(
            "month".into(),
            json!(event.year_month().map(|m| m.to_string())),
        );
        properties.insert("fatalities".into(), json!(event.total_fatalities));
        properties.insert("injuries".into(), json!(event.total_injuries));
        properties.insert("location_type".into(), json!(event.location_type_label()));
        properties.insert(
            "address".into(),
            json!(event.approximate_address.as_deref().unwrap_or(NO_ADDRESS)),
        );
        properties.insert("color".into(), json!(event_color(event.event_type_label())));
        properties.insert("radius".into(), json!(marker_radius(event.total_fatalities)));
        properties.insert("popup".into(), json!(self.popup(event)?));

        Ok(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![
                event.longitude,
                event.latitude,
            ]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }

    /// One point feature per incident, in input order.
    pub fn feature_collection(&self, events: &[SafetyEvent]) -> Result<FeatureCollection> {
        Ok(FeatureCollection {
            bbox: None,
            features: events
                .iter()
                .map(|e| self.feature(e))
                .collect::<Result<_>>()?,
            foreign_members: None,
        })
    }

    /// Layered basemap page.
    pub fn basemap(&self, events: &[SafetyEvent], config: &PipelineConfig) -> Result<String> {
        let t = totals(events);
        let (center_lat, center_lon) = config.bounds.center();
        self.render(
            "basemap.html",
            context! {
                incidents => t.incidents,
                fatalities => t.fatalities,
                features => self.feature_collection(events)?,
                legend => LEGEND,
                center_lat => center_lat,
                center_lon => center_lon,
            },
        )
    }

    /// Time-slider page. Months are the chronological set of months that
    /// have at least one incident.
    pub fn timeline(&self, events: &[SafetyEvent], config: &PipelineConfig) -> Result<String> {
        let months: Vec<String> = by_year_month(events)
            .iter()
            .map(|b| b.key.to_string())
            .collect();
        let (center_lat, center_lon) = config.bounds.center();
        self.render(
            "timeline.html",
            context! {
                features => self.feature_collection(events)?,
                months => months,
                legend => LEGEND,
                center_lat => center_lat,
                center_lon => center_lon,
            },
        )
    }
}

fn nyc_only(config: &PipelineConfig, require_date: bool) -> NormalizeOptions {
    NormalizeOptions {
        bounds: Some(config.bounds),
        require_date,
    }
}

/// Layered basemap with popups and a heat layer.
pub struct BasemapReport;

impl Renderer for BasemapReport {
    fn name(&self) -> &'static str {
        "map"
    }

    fn normalize_options(&self, config: &PipelineConfig) -> NormalizeOptions {
        nyc_only(config, false)
    }

    fn render(&self, events: &[SafetyEvent], config: &PipelineConfig) -> Result<Report> {
        let html = MapTemplates::new()?.basemap(events, config)?;

        let text = [
            console::banner("NYC FATAL INCIDENTS SUMMARY"),
            format!("\n{}", console::totals(&totals(events))),
            format!("\nBy Event Type:\n{}", console::event_type_lines(&by_event_type(events))),
            format!("\nBy Year:\n{}", console::year_lines(&by_year(events))),
            format!(
                "\nTop {TOP_INCIDENTS} Deadliest Incidents:\n{}",
                console::incident_lines(&deadliest_incidents(events, TOP_INCIDENTS))
            ),
        ]
        .join("\n");

        let mut report = Report {
            text,
            ..Default::default()
        };
        report.add_file(config.output_path(BASEMAP_FILE), html);
        Ok(report)
    }
}

/// Month-by-month map with a slider. Undated incidents cannot be placed on
/// the timeline and are dropped by the normalizer.
pub struct TimelineReport;

impl Renderer for TimelineReport {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn normalize_options(&self, config: &PipelineConfig) -> NormalizeOptions {
        nyc_only(config, true)
    }

    fn render(&self, events: &[SafetyEvent], config: &PipelineConfig) -> Result<Report> {
        let html = MapTemplates::new()?.timeline(events, config)?;
        let t = totals(events);
        let months = by_year_month(events);

        let text = [
            console::banner("TEMPORAL ANALYSIS"),
            format!("\n{}", console::date_range(&t)),
            console::totals(&t),
            format!("\nBy Year:\n{}", console::year_lines(&by_year(events))),
            format!(
                "\nTop {TOP_MONTHS} Deadliest Months:\n{}",
                console::month_lines(&deadliest(&months, TOP_MONTHS))
            ),
            format!("\nBy Event Type:\n{}", console::event_type_lines(&by_event_type(events))),
        ]
        .join("\n");

        let mut report = Report {
            text,
            ..Default::default()
        };
        report.add_file(config.output_path(TIMELINE_FILE), html);
        Ok(report)
    }
}
