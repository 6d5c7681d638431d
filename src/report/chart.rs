//! User distribution chart geometry.
//!
//! Slices are laid out clockwise starting at 90 degrees, in legend order.
//! Categories with no share get neither an arc nor an angle advance.

use crate::models::{ChartSlice, Distribution, LegendEntry};

/// Angle of the first slice, in degrees.
pub const START_ANGLE: f64 = 90.0;

/// Format a fraction as a percentage with one decimal.
pub fn format_percentage(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Legend rows for every charted category, including empty ones.
pub fn legend_entries(distribution: &Distribution) -> Vec<LegendEntry> {
    distribution
        .iter()
        .map(|(category, fraction)| LegendEntry {
            category,
            label: category.legend_label().to_string(),
            color: category.color().to_string(),
            percentage: format_percentage(fraction),
        })
        .collect()
}

/// Pie arcs for the categories with a non-zero share.
pub fn chart_slices(distribution: &Distribution) -> Vec<ChartSlice> {
    let mut slices = Vec::new();
    let mut start_angle = START_ANGLE;

    for (category, fraction) in distribution.iter() {
        if fraction <= 0.0 {
            continue;
        }

        let sweep_angle = 360.0 * fraction;
        slices.push(ChartSlice {
            category,
            color: category.color().to_string(),
            start_angle,
            sweep_angle,
        });
        start_angle += sweep_angle;
    }

    slices
}
