//! Report renderers.
//!
//! All reports share the pipeline; a [`Renderer`] decides how strictly
//! records are normalized and what gets produced from the fatal incidents
//! that survive. Renderers build a whole [`Report`] in memory, so a failure
//! while drawing or templating leaves nothing behind.

pub mod chart;
pub mod console;
pub mod map;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::config::PipelineConfig;
use crate::model::SafetyEvent;
use crate::normalize::NormalizeOptions;

pub use chart::DeadliestReport;
pub use map::{BasemapReport, TimelineReport};

/// A consumer of the pipeline's fatal incidents.
pub trait Renderer {
    fn name(&self) -> &'static str;

    /// Normalization rules this report needs.
    fn normalize_options(&self, config: &PipelineConfig) -> NormalizeOptions;

    /// Builds the console text and output files of the report.
    fn render(&self, events: &[SafetyEvent], config: &PipelineConfig) -> Result<Report>;
}

/// A finished report that has not been printed or written yet.
#[derive(Debug, Default)]
pub struct Report {
    /// Console part, printed to stdout.
    pub text: String,
    /// Output files and their contents, written in order.
    pub files: Vec<(PathBuf, String)>,
}

impl Report {
    pub fn add_file(&mut self, path: PathBuf, contents: String) {
        self.files.push((path, contents));
    }

    /// Creates every output directory, writes the files, then prints the
    /// console text. Directory failures abort before any file is written.
    pub fn publish(self) -> Result<Vec<PathBuf>> {
        for (path, _) in &self.files {
            if let Some(dir) = path.parent()
                && !dir.as_os_str().is_empty()
            {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating output directory {}", dir.display()))?;
            }
        }

        let mut written = Vec::with_capacity(self.files.len());
        for (path, contents) in self.files {
            std::fs::write(&path, contents)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Report file written");
            written.push(path);
        }

        println!("{}", self.text);
        Ok(written)
    }
}

/// Marker colour for an event type.
pub fn event_color(event_type: &str) -> &'static str {
    match event_type {
        "Suicide" => "#9370DB",
        "Rail Collision" => "#DC143C",
        "Non-Rail Collision" => "#FF8C00",
        "Homicide" | "Homicide not against Transit Worker" => "#8B0000",
        _ => "#808080",
    }
}

/// Legend entries in display order.
pub const LEGEND: &[(&str, &str)] = &[
    ("Rail Collision", "#DC143C"),
    ("Suicide", "#9370DB"),
    ("Non-Rail Collision", "#FF8C00"),
    ("Homicide", "#8B0000"),
    ("Other", "#808080"),
];

/// Marker radius in pixels, scaled by fatalities.
pub fn marker_radius(fatalities: u32) -> u32 {
    fatalities.saturating_mul(3).saturating_add(5)
}
