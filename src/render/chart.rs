//! Static chart for the deadliest-locations report.
//!
//! Four panels: incidents graded by fatalities, incident density, incidents
//! by event type, and fatalities per event type.

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::ops::Range;

use crate::analyzers::aggregate::{TOP_LOCATIONS, by_coordinate, by_event_type, by_year};
use crate::analyzers::summary::{
    TOP_INCIDENTS, TOP_LOCATION_TYPES, deadliest_incidents, location_type_counts, totals,
};
use crate::analyzers::types::Bucket;
use crate::config::PipelineConfig;
use crate::model::SafetyEvent;
use crate::normalize::NormalizeOptions;
use crate::render::{Renderer, Report, console, event_color, marker_radius};

pub const CHART_FILE: &str = "fta_deadly_events_map.svg";

const SIZE: (u32, u32) = (1600, 1400);

/// Cells along each axis of the density panel.
pub const DENSITY_GRID: usize = 30;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Parses a `#RRGGBB` colour; anything else is grey.
fn rgb(hex: &str) -> RGBColor {
    let channel = |range: Range<usize>| {
        hex.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(0x80)
    };
    if hex.len() != 7 || !hex.starts_with('#') {
        return RGBColor(0x80, 0x80, 0x80);
    }
    RGBColor(channel(1..3), channel(3..5), channel(5..7))
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Sequential scale through `stops`; `t` is clamped to `[0, 1]`.
fn ramp(stops: &[RGBColor], t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    match stops {
        [] => RGBColor(0x80, 0x80, 0x80),
        [only] => *only,
        _ => {
            let scaled = t * (stops.len() - 1) as f64;
            let i = (scaled.floor() as usize).min(stops.len() - 2);
            lerp(stops[i], stops[i + 1], scaled - i as f64)
        }
    }
}

const REDS: &[RGBColor] = &[RGBColor(0xFC, 0xBB, 0xA1), RGBColor(0xA5, 0x0F, 0x15)];
const YL_OR_RD: &[RGBColor] = &[
    RGBColor(0xFF, 0xFF, 0xB2),
    RGBColor(0xFD, 0x8D, 0x3C),
    RGBColor(0xBD, 0x00, 0x26),
];

fn scale(value: u64, max: u64) -> f64 {
    if max <= 1 {
        1.0
    } else {
        (value.saturating_sub(1)) as f64 / (max - 1) as f64
    }
}

/// Longitude and latitude ranges covering every event, padded so single
/// points still get a visible frame.
fn extent(events: &[SafetyEvent]) -> (Range<f64>, Range<f64>) {
    const PAD: f64 = 0.01;
    if events.is_empty() {
        return (-180.0..180.0, -90.0..90.0);
    }
    let (mut min_lon, mut max_lon) = (f64::MAX, f64::MIN);
    let (mut min_lat, mut max_lat) = (f64::MAX, f64::MIN);
    for e in events {
        min_lon = min_lon.min(e.longitude);
        max_lon = max_lon.max(e.longitude);
        min_lat = min_lat.min(e.latitude);
        max_lat = max_lat.max(e.latitude);
    }
    (min_lon - PAD..max_lon + PAD, min_lat - PAD..max_lat + PAD)
}

fn cell(value: f64, range: &Range<f64>, cells: usize) -> usize {
    let width = (range.end - range.start) / cells as f64;
    let i = ((value - range.start) / width).floor();
    if i.is_finite() && i > 0.0 {
        (i as usize).min(cells - 1)
    } else {
        0
    }
}

/// Incident counts on a `cells` × `cells` grid over `lon` × `lat`, as
/// `(column, row, count)`. Empty cells are left out.
pub fn density_grid(
    events: &[SafetyEvent],
    lon: &Range<f64>,
    lat: &Range<f64>,
    cells: usize,
) -> Vec<(usize, usize, usize)> {
    if cells == 0 {
        return Vec::new();
    }
    let mut counts = vec![0usize; cells * cells];
    for e in events {
        counts[cell(e.latitude, lat, cells) * cells + cell(e.longitude, lon, cells)] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .map(|(i, count)| (i % cells, i / cells, count))
        .collect()
}

fn map_chart<'a, 'b>(
    area: &'a Area<'b>,
    caption: String,
    events: &[SafetyEvent],
) -> Result<ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>> {
    let (lon_range, lat_range) = extent(events);
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lon_range, lat_range)?;
    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()?;
    Ok(chart)
}

/// Incidents coloured and sized by fatalities, one legend entry per count.
fn draw_fatality_scatter(area: &Area<'_>, events: &[SafetyEvent]) -> Result<()> {
    let mut chart = map_chart(
        area,
        format!("Fatal Incidents by Location (n={})", events.len()),
        events,
    )?;

    let mut levels: Vec<u32> = events.iter().map(|e| e.total_fatalities).collect();
    levels.sort_unstable();
    levels.dedup();
    let max = levels.last().copied().map_or(1, u64::from);

    for level in levels {
        let color = ramp(REDS, scale(u64::from(level), max));
        let label = if level == 1 {
            "1 fatality".to_string()
        } else {
            format!("{level} fatalities")
        };
        chart
            .draw_series(
                events
                    .iter()
                    .filter(|e| e.total_fatalities == level)
                    .map(|e| {
                        Circle::new(
                            (e.longitude, e.latitude),
                            marker_radius(e.total_fatalities),
                            color.mix(0.7).filled(),
                        )
                    }),
            )?
            .label(label)
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Binned incident counts, darker cells holding more incidents.
fn draw_density(area: &Area<'_>, events: &[SafetyEvent]) -> Result<()> {
    let (lon_range, lat_range) = extent(events);
    let grid = density_grid(events, &lon_range, &lat_range, DENSITY_GRID);
    let max = grid.iter().map(|(_, _, n)| *n).max().unwrap_or(0);

    let mut chart = map_chart(
        area,
        format!("Incident Density Heatmap (max {max} per cell)"),
        events,
    )?;

    let width = (lon_range.end - lon_range.start) / DENSITY_GRID as f64;
    let height = (lat_range.end - lat_range.start) / DENSITY_GRID as f64;
    chart.draw_series(grid.iter().map(|&(col, row, count)| {
        let x = lon_range.start + col as f64 * width;
        let y = lat_range.start + row as f64 * height;
        Rectangle::new(
            [(x, y), (x + width, y + height)],
            ramp(YL_OR_RD, scale(count as u64, max as u64)).filled(),
        )
    }))?;
    Ok(())
}

/// One series per event type, in first-seen order.
fn draw_type_scatter(area: &Area<'_>, events: &[SafetyEvent]) -> Result<()> {
    let mut chart = map_chart(area, "Fatal Incidents by Event Type".to_string(), events)?;

    let mut event_types: Vec<&str> = Vec::new();
    for e in events {
        if !event_types.contains(&e.event_type_label()) {
            event_types.push(e.event_type_label());
        }
    }

    for event_type in event_types {
        let color = rgb(event_color(event_type));
        chart
            .draw_series(
                events
                    .iter()
                    .filter(|e| e.event_type_label() == event_type)
                    .map(|e| Circle::new((e.longitude, e.latitude), 6, color.mix(0.6).filled())),
            )?
            .label(event_type)
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_type_bars(area: &Area<'_>, by_type: &[Bucket<String>]) -> Result<()> {
    if by_type.is_empty() {
        return Ok(());
    }

    let max = by_type.iter().map(|b| b.fatalities).max().unwrap_or(0);
    let labels: Vec<String> = by_type.iter().map(|b| b.key.clone()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption("Fatalities by Event Type", ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(200)
        .build_cartesian_2d(0u64..max + max / 10 + 1, 0usize..by_type.len())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(by_type.len())
        .y_label_formatter(&|y: &usize| labels.get(*y).cloned().unwrap_or_default())
        .x_desc("Fatalities")
        .draw()?;

    chart.draw_series(by_type.iter().enumerate().map(|(i, b)| {
        Rectangle::new(
            [(0, i), (b.fatalities, i + 1)],
            rgb(event_color(&b.key)).filled(),
        )
    }))?;
    Ok(())
}

/// Draws the four panels and returns the SVG document.
pub fn draw_chart(events: &[SafetyEvent], by_type: &[Bucket<String>]) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            "New York Transit Fatal Incidents - Location Analysis (FTA Data)",
            ("sans-serif", 28),
        )?;

        let panels = root.split_evenly((2, 2));
        draw_fatality_scatter(&panels[0], events)?;
        draw_density(&panels[1], events)?;
        draw_type_scatter(&panels[2], events)?;
        draw_type_bars(&panels[3], by_type)?;

        root.present()?;
    }
    Ok(svg)
}

/// Deadliest locations and incidents, with a static chart. No bounding
/// box: any agency-matched incident with valid coordinates is kept.
pub struct DeadliestReport;

impl Renderer for DeadliestReport {
    fn name(&self) -> &'static str {
        "deadliest"
    }

    fn normalize_options(&self, _config: &PipelineConfig) -> NormalizeOptions {
        NormalizeOptions {
            bounds: None,
            require_date: false,
        }
    }

    fn render(&self, events: &[SafetyEvent], config: &PipelineConfig) -> Result<Report> {
        let mut locations = by_coordinate(events);
        locations.truncate(TOP_LOCATIONS);
        let by_type = by_event_type(events);

        let svg = draw_chart(events, &by_type).context("drawing deadliest-events chart")?;

        let text = [
            console::banner("DEADLIEST LOCATIONS ANALYSIS"),
            format!("\n{}", console::location_table(&locations)),
            console::banner("SINGLE DEADLIEST INCIDENTS"),
            format!(
                "\n{}",
                console::incident_details(&deadliest_incidents(events, TOP_INCIDENTS))
            ),
            console::banner("FATAL INCIDENT STATISTICS"),
            format!("\n{}", console::totals(&totals(events))),
            format!("\nBy Event Type:\n{}", console::event_type_lines(&by_type)),
            format!(
                "\nBy Location Type:\n{}",
                console::count_summary_lines(&location_type_counts(events, TOP_LOCATION_TYPES))
            ),
            format!("\nTemporal Distribution:\n{}", console::year_lines(&by_year(events))),
        ]
        .join("\n");

        let mut report = Report {
            text,
            ..Default::default()
        };
        report.add_file(config.output_path(CHART_FILE), svg);
        Ok(report)
    }
}
