//! Dashboard report generation.
//!
//! This module builds the admin dashboard report from an aggregation
//! result and renders it as Markdown or JSON.

use super::chart::{chart_slices, format_percentage, legend_entries};
use crate::config::ReportConfig;
use crate::models::{
    Category, ChartSlice, DashboardReport, Distribution, LegendEntry, ReportMetadata, RoleTally,
};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Assemble a report from an aggregation result.
pub fn build_report(
    tally: RoleTally,
    distribution: Distribution,
    metadata: ReportMetadata,
    config: &ReportConfig,
) -> DashboardReport {
    let (legend, slices) = if config.include_chart {
        (legend_entries(&distribution), chart_slices(&distribution))
    } else {
        (Vec::new(), Vec::new())
    };

    DashboardReport {
        metadata,
        title: config.title.clone(),
        tally,
        distribution,
        legend,
        slices,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, include_counts: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.title));
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_total_section(&report.tally));

    if include_counts {
        output.push_str(&generate_counts_section(&report.tally));
    }

    if !report.legend.is_empty() {
        output.push_str(&generate_distribution_section(
            &report.legend,
            &report.slices,
        ));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Fetch Duration:** {:.1}s\n",
        metadata.fetch_seconds
    ));
    section.push('\n');

    section
}

/// Generate the Total Users card.
fn generate_total_section(tally: &RoleTally) -> String {
    let mut section = String::new();

    section.push_str("## Total Users\n\n");
    section.push_str(&format!("**{}**\n\n", tally.total()));

    section
}

/// Generate the per-role count table.
fn generate_counts_section(tally: &RoleTally) -> String {
    let mut section = String::new();

    section.push_str("## Users by Role\n\n");
    section.push_str("| Role | Users |\n");
    section.push_str("|:---|:---:|\n");

    for (category, count) in tally.counts() {
        section.push_str(&format!("| {} | {} |\n", category.legend_label(), count));
    }
    section.push_str(&format!("| **Total** | **{}** |\n\n", tally.total()));

    let unclassified = tally.count(Category::Other);
    if unclassified > 0 {
        section.push_str(&format!(
            "_{} unclassified user(s) are counted in the total but not in the distribution._\n\n",
            unclassified
        ));
    }

    section
}

/// Generate the User Distribution legend and slice table.
fn generate_distribution_section(legend: &[LegendEntry], slices: &[ChartSlice]) -> String {
    let mut section = String::new();

    section.push_str("## User Distribution\n\n");
    section.push_str("| Role | Color | Share |\n");
    section.push_str("|:---|:---:|---:|\n");
    for entry in legend {
        section.push_str(&format!(
            "| {} | `{}` | {} |\n",
            entry.label, entry.color, entry.percentage
        ));
    }
    section.push('\n');

    if slices.is_empty() {
        section.push_str("No classified users to chart.\n\n");
        return section;
    }

    section.push_str("### Chart Slices\n\n");
    section.push_str("| Role | Start | Sweep |\n");
    section.push_str("|:---|---:|---:|\n");
    for slice in slices {
        section.push_str(&format!(
            "| {} | {:.1}° | {:.1}° |\n",
            slice.category.legend_label(),
            slice.start_angle,
            slice.sweep_angle
        ));
    }
    section.push('\n');

    section
}

/// Generate the footer.
fn generate_footer() -> String {
    format!(
        "---\n\n_Generated by careconnect-stats v{}_\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}

/// Save a report to a file.
pub fn save_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

/// One-line summary of the distribution for the console.
pub fn summary_line(distribution: &Distribution) -> String {
    distribution
        .iter()
        .map(|(category, fraction)| {
            format!("{}: {}", category.legend_label(), format_percentage(fraction))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::UserRecord;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_report(roles: &[Option<&str>], config: &ReportConfig) -> DashboardReport {
        let records: Vec<UserRecord> = roles
            .iter()
            .map(|r| UserRecord {
                role: r.map(String::from),
            })
            .collect();
        let (tally, distribution) = aggregate(&records);

        let metadata = ReportMetadata {
            source: "file:users.json".to_string(),
            generated_at: Utc::now(),
            fetch_seconds: 0.2,
        };

        build_report(tally, distribution, metadata, config)
    }

    fn sample_roles() -> Vec<Option<&'static str>> {
        vec![
            Some("older_adult"),
            Some("older_adult"),
            Some("older_adult"),
            Some("caregiver"),
            Some("caregiver"),
            Some("family"),
            Some("admin"),
            Some("Manager"),
            Some("Manager"),
            None,
        ]
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(&sample_roles(), &ReportConfig::default());
        let markdown = generate_markdown_report(&report, true);

        assert!(markdown.contains("# CareConnect Admin Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Total Users\n\n**10**"));
        assert!(markdown.contains("| Unclassified | 3 |"));
        assert!(markdown.contains("## User Distribution"));
        assert!(markdown.contains("| Old Adults | `#8A63E9` | 42.9% |"));
        assert!(markdown.contains("| Caregivers | `#FF9680` | 28.6% |"));
        assert!(markdown.contains("| Admins | `#E91E63` | 14.3% |"));
        assert!(markdown.contains("### Chart Slices"));
        assert!(markdown.contains("| Old Adults | 90.0° |"));
    }

    #[test]
    fn test_markdown_without_chart_or_counts() {
        let config = ReportConfig {
            include_chart: false,
            ..ReportConfig::default()
        };
        let report = create_test_report(&sample_roles(), &config);
        let markdown = generate_markdown_report(&report, false);

        assert!(markdown.contains("## Total Users"));
        assert!(!markdown.contains("## Users by Role"));
        assert!(!markdown.contains("## User Distribution"));
    }

    #[test]
    fn test_markdown_for_empty_directory() {
        let report = create_test_report(&[], &ReportConfig::default());
        let markdown = generate_markdown_report(&report, true);

        assert!(markdown.contains("**0**"));
        assert!(markdown.contains("| Family | `#40CFC2` | 0.0% |"));
        assert!(markdown.contains("No classified users to chart."));
        assert!(!markdown.contains("unclassified user(s)"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(&sample_roles(), &ReportConfig::default());
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tally"]["total"], 10);
        assert_eq!(value["tally"]["counts"]["older_adult"], 3);
        assert_eq!(value["tally"]["counts"]["other"], 3);
        assert_eq!(value["distribution"]["admin"], 1.0 / 7.0);
        assert_eq!(value["legend"].as_array().map(|a| a.len()), Some(4));
        assert_eq!(value["slices"][0]["start_angle"], 90.0);
        assert_eq!(value["metadata"]["source"], "file:users.json");
    }

    #[test]
    fn test_json_omits_chart_when_disabled() {
        let config = ReportConfig {
            include_chart: false,
            ..ReportConfig::default()
        };
        let report = create_test_report(&sample_roles(), &config);
        let json = generate_json_report(&report).unwrap();

        assert!(!json.contains("\"legend\""));
        assert!(!json.contains("\"slices\""));
        assert!(json.contains("\"distribution\""));
    }

    #[test]
    fn test_save_report_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports").join("dashboard.md");

        save_report("# Dashboard\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Dashboard\n");
    }

    #[test]
    fn test_summary_line() {
        let report = create_test_report(&[Some("admin"), Some("family")], &ReportConfig::default());
        let line = summary_line(&report.distribution);

        assert_eq!(
            line,
            "Old Adults: 0.0% | Caregivers: 0.0% | Family: 50.0% | Admins: 50.0%"
        );
    }
}
