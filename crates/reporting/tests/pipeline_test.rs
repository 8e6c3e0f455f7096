//! End-to-end pipeline test: CSV fixtures through ingest, attribution,
//! the cost join, and export.

use attribution_core::{Channel, ChannelSet, Tier};
use attribution_engine::{
    AttributionEngine, AttributionModel, CacCalculator, MarginalAllocationAnalyzer,
};
use attribution_reporting::{converted_customers, load_cost_model, load_customers};
use std::fs;
use std::path::PathBuf;

const CUSTOMERS_CSV: &str = "\
customer_id,tier,convert_TF,touch_1,touch_2,touch_3,touch_4,touch_5
c-01,1,True,organic_search,,email,,
c-02,1,True,social,,,,
c-03,1,True,social,,,,
c-04,1,True,display,,,,
c-05,1,True,display,,,,
c-06,1,True,display,,,,
c-07,2,True,referral,,,,
c-08,2,True,referral,,,,
c-09,2,True,referral,,,,
c-10,2,True,referral,,,,
c-11,2,True,referral,,,,
c-12,1,False,paid_search,email,,,
";

const SPEND_CSV: &str = "\
channel,tier_1_spend,tier_2_spend,tier_3_spend
organic_search,0,0,0
direct,0,0,0
display,300,350,400
email,300,350,400
social,300,350,400
paid_search,300,350,400
referral,300,350,400
";

struct Fixture {
    _dir: tempfile::TempDir,
    customers: PathBuf,
    spend: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let customers = dir.path().join("customers.csv");
    let spend = dir.path().join("spend.csv");
    fs::write(&customers, CUSTOMERS_CSV).unwrap();
    fs::write(&spend, SPEND_CSV).unwrap();
    Fixture {
        _dir: dir,
        customers,
        spend,
    }
}

#[test]
fn test_pipeline_produces_cac_tables() {
    let fixture = fixture();
    let customers = load_customers(&fixture.customers).unwrap();
    let cost = load_cost_model(&fixture.spend).unwrap();
    let converted = converted_customers(&customers);
    assert_eq!(converted.len(), 11);

    let engine = AttributionEngine::new(ChannelSet::standard());
    let calculator = CacCalculator::new(cost);

    for model in AttributionModel::ALL {
        let totals = engine.run(model, converted.iter().copied()).unwrap();
        assert!((totals.grand_total() - 11.0).abs() < 1e-9);

        let report = calculator.compute(model, &totals, Tier::One);
        assert_eq!(report.rows.len(), 7);
        assert!(report.missing_cost.is_empty());
    }

    // Three display conversions at 300 spend: CAC 100 under last touch.
    let totals = engine
        .run(AttributionModel::LastTouch, converted.iter().copied())
        .unwrap();
    let report = calculator.compute(AttributionModel::LastTouch, &totals, Tier::One);
    let display = report
        .rows
        .iter()
        .find(|row| row.channel == Channel::new("display"))
        .unwrap();
    assert!((display.cac - 100.0).abs() < 1e-9);

    // The split-path customer lands on email under last touch and on
    // organic_search under first touch.
    assert!((totals.get(&Channel::new("email")) - 1.0).abs() < 1e-9);
    let first = engine
        .run(AttributionModel::FirstTouch, converted.iter().copied())
        .unwrap();
    assert!((first.get(&Channel::new("organic_search")) - 1.0).abs() < 1e-9);
    assert_eq!(first.get(&Channel::new("email")), 0.0);
}

#[test]
fn test_pipeline_marginal_allocation() {
    let fixture = fixture();
    let customers = load_customers(&fixture.customers).unwrap();
    let cost = load_cost_model(&fixture.spend).unwrap();
    let converted = converted_customers(&customers);

    let analyzer = MarginalAllocationAnalyzer::new(ChannelSet::standard(), cost);
    let report = analyzer.analyze(converted.iter().copied()).unwrap();
    assert_eq!(report.rows.len(), 7);

    // Referral converts nobody at tier 1 and five customers at tier 2:
    // a marginal CAC of 50 / 5.
    let referral = report
        .rows
        .iter()
        .find(|row| row.channel == Channel::new("referral"))
        .unwrap();
    assert_eq!(referral.tier_conversions, [0.0, 5.0, 0.0]);
    assert!((referral.marginal_conversion_2 - 5.0).abs() < 1e-9);
    assert!((referral.marginal_cac[1] - 10.0).abs() < 1e-9);
    assert!(referral.marginal_cac[0].is_infinite());

    // Display drops from three conversions to zero at tier 2.
    let display = report
        .rows
        .iter()
        .find(|row| row.channel == Channel::new("display"))
        .unwrap();
    assert!((display.marginal_conversion_2 - (-3.0)).abs() < 1e-9);
    assert!((display.marginal_cac[1] - (-50.0 / 3.0)).abs() < 1e-9);
}

#[test]
fn test_pipeline_exports_csv() {
    let fixture = fixture();
    let customers = load_customers(&fixture.customers).unwrap();
    let cost = load_cost_model(&fixture.spend).unwrap();
    let converted = converted_customers(&customers);

    let engine = AttributionEngine::new(ChannelSet::standard());
    let totals = engine
        .run(AttributionModel::Linear, converted.iter().copied())
        .unwrap();
    let report = CacCalculator::new(cost.clone()).compute(AttributionModel::Linear, &totals, Tier::One);

    let out = fixture._dir.path().join("cac_linear.csv");
    attribution_reporting::write_cac_csv(&report, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("channel,conversions,total_cost,cac"));
    assert_eq!(written.lines().count(), 8);

    let marginal = MarginalAllocationAnalyzer::new(ChannelSet::standard(), cost)
        .analyze(converted.iter().copied())
        .unwrap();
    let out = fixture._dir.path().join("marginal_allocation.csv");
    attribution_reporting::write_marginal_csv(&marginal, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().count(), 8);
}
