//! Output tables: CSV export and terminal rendering of the CAC and
//! marginal allocation reports.

use attribution_core::{AttributionError, AttributionResult};
use attribution_engine::{CacReport, MarginalReport};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::path::Path;

/// Sentinel written for non-finite metrics (undefined CAC and the like).
const UNDEFINED: &str = "undefined";

const CAC_HEADER: [&str; 4] = ["channel", "conversions", "total_cost", "cac"];
const MARGINAL_HEADER: [&str; 10] = [
    "channel",
    "tier1_conversions",
    "tier2_conversions",
    "tier3_conversions",
    "marginal_conversion_2",
    "marginal_conversion_3",
    "marginal_spend",
    "marginal_cac_1",
    "marginal_cac_2",
    "marginal_cac_3",
];

/// Fixed-precision metric formatting; non-finite values become the
/// explicit `undefined` sentinel instead of `inf`/`NaN` noise.
pub fn format_metric(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        UNDEFINED.to_string()
    }
}

fn cac_cells(report: &CacReport) -> Vec<[String; 4]> {
    report
        .rows
        .iter()
        .map(|row| {
            [
                row.channel.to_string(),
                format!("{:.4}", row.conversions),
                format!("{:.2}", row.total_cost),
                format_metric(row.cac),
            ]
        })
        .collect()
}

fn marginal_cells(report: &MarginalReport) -> Vec<[String; 10]> {
    report
        .rows
        .iter()
        .map(|row| {
            [
                row.channel.to_string(),
                format!("{:.4}", row.tier_conversions[0]),
                format!("{:.4}", row.tier_conversions[1]),
                format!("{:.4}", row.tier_conversions[2]),
                format!("{:.4}", row.marginal_conversion_2),
                format!("{:.4}", row.marginal_conversion_3),
                format!("{:.2}", row.marginal_spend),
                format_metric(row.marginal_cac[0]),
                format_metric(row.marginal_cac[1]),
                format_metric(row.marginal_cac[2]),
            ]
        })
        .collect()
}

fn export_err(err: csv::Error) -> AttributionError {
    AttributionError::Export(err.to_string())
}

/// Write one policy's CAC table as CSV.
pub fn write_cac_csv(report: &CacReport, path: &Path) -> AttributionResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    writer.write_record(CAC_HEADER).map_err(export_err)?;
    for cells in cac_cells(report) {
        writer.write_record(&cells).map_err(export_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the marginal allocation table as CSV.
pub fn write_marginal_csv(report: &MarginalReport, path: &Path) -> AttributionResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    writer.write_record(MARGINAL_HEADER).map_err(export_err)?;
    for cells in marginal_cells(report) {
        writer.write_record(&cells).map_err(export_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render one policy's CAC table for the terminal.
pub fn render_cac_table(report: &CacReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(CAC_HEADER.to_vec());
    for cells in cac_cells(report) {
        table.add_row(cells.to_vec());
    }
    table.to_string()
}

/// Render the marginal allocation table for the terminal.
pub fn render_marginal_table(report: &MarginalReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(MARGINAL_HEADER.to_vec());
    for cells in marginal_cells(report) {
        table.add_row(cells.to_vec());
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribution_core::{ChannelSet, Customer, Tier, TouchSequence};
    use attribution_engine::{
        AttributionEngine, AttributionModel, CacCalculator, CostModel,
        MarginalAllocationAnalyzer,
    };

    fn converted(id: &str, tier: Tier, touch: &str) -> Customer {
        Customer {
            customer_id: id.to_string(),
            tier,
            converted: true,
            touches: TouchSequence::from_touches([touch]),
        }
    }

    fn sample_cac_report() -> CacReport {
        let customers = vec![
            converted("a", Tier::One, "display"),
            converted("b", Tier::One, "display"),
            converted("c", Tier::One, "display"),
        ];
        let totals = AttributionEngine::new(ChannelSet::standard())
            .run(AttributionModel::LastTouch, &customers)
            .unwrap();
        CacCalculator::new(CostModel::standard()).compute(
            AttributionModel::LastTouch,
            &totals,
            Tier::One,
        )
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(100.0), "100.0000");
        assert_eq!(format_metric(-25.0), "-25.0000");
        assert_eq!(format_metric(f64::INFINITY), "undefined");
        assert_eq!(format_metric(f64::NEG_INFINITY), "undefined");
        assert_eq!(format_metric(f64::NAN), "undefined");
    }

    #[test]
    fn test_cac_csv_round_trip() {
        let report = sample_cac_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cac_last_touch.csv");

        write_cac_csv(&report, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();

        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("channel,conversions,total_cost,cac"));
        assert!(written.contains("display,3.0000,300.00,100.0000"));
        // Channels without conversions surface the sentinel.
        assert!(written.contains("email,0.0000,300.00,undefined"));
    }

    #[test]
    fn test_marginal_csv_contains_every_column() {
        let customers = vec![
            converted("a", Tier::One, "referral"),
            converted("b", Tier::Two, "referral"),
        ];
        let report = MarginalAllocationAnalyzer::new(ChannelSet::standard(), CostModel::standard())
            .analyze(&customers)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marginal_allocation.csv");
        write_marginal_csv(&report, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();

        assert!(written.starts_with(&MARGINAL_HEADER.join(",")));
        assert!(written.contains("referral,1.0000,1.0000,0.0000"));
    }

    #[test]
    fn test_render_cac_table_lists_channels() {
        let rendered = render_cac_table(&sample_cac_report());
        assert!(rendered.contains("display"));
        assert!(rendered.contains("100.0000"));
        assert!(rendered.contains("undefined"));
    }
}
