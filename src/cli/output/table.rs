//! Table output formatting for CLI commands
//!
//! Renders grid plans and scan statistics using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::LocationStep;
use crate::services::ScanStatsSnapshot;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format generated grid points, one row per step
    pub fn format_steps(&self, steps: &[LocationStep]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Step").add_attribute(Attribute::Bold),
            Cell::new("Ring").add_attribute(Attribute::Bold),
            Cell::new("Latitude").add_attribute(Attribute::Bold),
            Cell::new("Longitude").add_attribute(Attribute::Bold),
        ]);

        for step in steps {
            let ring = Cell::new(step.ring);
            let ring = if self.use_colors {
                ring.fg(ring_color(step.ring))
            } else {
                ring
            };
            table.add_row(vec![
                Cell::new(step.step),
                ring,
                Cell::new(format!("{:.6}", step.coordinate.latitude)),
                Cell::new(format!("{:.6}", step.coordinate.longitude)),
            ]);
        }

        table.to_string()
    }

    /// Format engine counters as a metric/count table
    pub fn format_stats(&self, stats: &ScanStatsSnapshot) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);

        let rows = [
            ("Iterations completed", stats.iterations_completed),
            ("Iterations failed", stats.iterations_failed),
            ("Tasks processed", stats.tasks_processed),
            ("Tasks drained", stats.tasks_drained),
            ("Tasks abandoned", stats.tasks_abandoned),
            ("Request failures", stats.request_failures),
            ("Persist failures", stats.persist_failures),
            ("Heavy backoffs", stats.heavy_backoffs),
            ("Logins", stats.logins),
        ];
        for (metric, count) in rows {
            let count_cell = Cell::new(count);
            let count_cell = if self.use_colors && count > 0 && is_failure_metric(metric) {
                count_cell.fg(Color::Yellow)
            } else {
                count_cell
            };
            table.add_row(vec![Cell::new(metric), count_cell]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn ring_color(ring: u32) -> Color {
    match ring % 3 {
        0 => Color::Green,
        1 => Color::Cyan,
        _ => Color::Magenta,
    }
}

fn is_failure_metric(metric: &str) -> bool {
    metric.contains("failed") || metric.contains("failures") || metric.contains("abandoned")
}
