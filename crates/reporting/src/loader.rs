//! Ingest of the two source tables: customer touch histories and channel
//! spend per tier.

use attribution_core::{
    AttributionError, AttributionResult, Channel, Customer, Tier, TouchSequence,
};
use attribution_engine::CostModel;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// One row of the customer touch table.
#[derive(Debug, Deserialize)]
struct CustomerRecord {
    #[serde(default)]
    customer_id: String,
    tier: u8,
    #[serde(alias = "convert_TF", deserialize_with = "flexible_bool")]
    converted: bool,
    touch_1: Option<String>,
    touch_2: Option<String>,
    touch_3: Option<String>,
    touch_4: Option<String>,
    touch_5: Option<String>,
}

/// One row of the channel spend table.
#[derive(Debug, Deserialize)]
struct SpendRecord {
    channel: String,
    #[serde(alias = "tier_1")]
    tier_1_spend: f64,
    #[serde(alias = "tier_2")]
    tier_2_spend: f64,
    #[serde(alias = "tier_3")]
    tier_3_spend: f64,
}

/// Accepts the capitalized booleans Python exports write ("True"/"False")
/// alongside the usual spellings.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Ok(true),
        "false" | "f" | "0" | "no" => Ok(false),
        other => Err(serde::de::Error::custom(format!("not a boolean: {other}"))),
    }
}

/// Load customer records from a CSV file.
pub fn load_customers(path: &Path) -> AttributionResult<Vec<Customer>> {
    let file = File::open(path)
        .map_err(|e| AttributionError::Ingest(format!("{}: {e}", path.display())))?;
    let customers = read_customers(file)?;
    info!(count = customers.len(), path = %path.display(), "customer records loaded");
    Ok(customers)
}

/// Read customer records from any CSV source.
///
/// Empty or whitespace-only touch cells become empty slots, as does the
/// literal "nan" that pandas exports use for missing values.
pub fn read_customers<R: Read>(reader: R) -> AttributionResult<Vec<Customer>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut customers = Vec::new();
    for (line, record) in reader.deserialize::<CustomerRecord>().enumerate() {
        let record =
            record.map_err(|e| AttributionError::Ingest(format!("customer row: {e}")))?;
        let tier = Tier::try_from(record.tier).map_err(AttributionError::Ingest)?;
        let customer_id = if record.customer_id.is_empty() {
            format!("row-{}", line + 1)
        } else {
            record.customer_id
        };
        let touches = TouchSequence::new([
            to_slot(record.touch_1),
            to_slot(record.touch_2),
            to_slot(record.touch_3),
            to_slot(record.touch_4),
            to_slot(record.touch_5),
        ]);
        customers.push(Customer {
            customer_id,
            tier,
            converted: record.converted,
            touches,
        });
    }
    Ok(customers)
}

fn to_slot(cell: Option<String>) -> Option<Channel> {
    cell.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("nan"))
        .map(Channel::new)
}

/// Load the channel spend table and build the cost model from it.
pub fn load_cost_model(path: &Path) -> AttributionResult<CostModel> {
    let file = File::open(path)
        .map_err(|e| AttributionError::Ingest(format!("{}: {e}", path.display())))?;
    let model = read_cost_model(file)?;
    info!(channels = model.len(), path = %path.display(), "channel spend table loaded");
    Ok(model)
}

/// Read the spend table from any CSV source.
pub fn read_cost_model<R: Read>(reader: R) -> AttributionResult<CostModel> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.deserialize::<SpendRecord>() {
        let record = record.map_err(|e| AttributionError::Ingest(format!("spend row: {e}")))?;
        rows.push((
            Channel::new(&record.channel),
            [record.tier_1_spend, record.tier_2_spend, record.tier_3_spend],
        ));
    }
    CostModel::from_tier_table(rows)
}

/// Keep only customers that converted; attribution's precondition.
pub fn converted_customers(customers: &[Customer]) -> Vec<&Customer> {
    customers.iter().filter(|customer| customer.converted).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMERS_CSV: &str = "\
customer_id,tier,convert_TF,touch_1,touch_2,touch_3,touch_4,touch_5
c-1,1,True,organic_search,,email,,
c-2,2,False,social,,,,
c-3,3,true,display,display,,,
,1,True,referral,nan,,,
";

    const SPEND_CSV: &str = "\
channel,tier_1_spend,tier_2_spend,tier_3_spend
display,300,350,400
organic_search,0,0,0
";

    #[test]
    fn test_read_customers_parses_rows() {
        let customers = read_customers(CUSTOMERS_CSV.as_bytes()).unwrap();
        assert_eq!(customers.len(), 4);

        let first = &customers[0];
        assert_eq!(first.customer_id, "c-1");
        assert_eq!(first.tier, Tier::One);
        assert!(first.converted);
        assert_eq!(first.touches.effective_touch_count(), 2);
        assert_eq!(first.touches.last_touch(), Some(&Channel::new("email")));

        assert!(!customers[1].converted);
        assert_eq!(customers[2].tier, Tier::Three);
    }

    #[test]
    fn test_missing_id_gets_row_number() {
        let customers = read_customers(CUSTOMERS_CSV.as_bytes()).unwrap();
        assert_eq!(customers[3].customer_id, "row-4");
    }

    #[test]
    fn test_nan_cell_is_an_empty_slot() {
        let customers = read_customers(CUSTOMERS_CSV.as_bytes()).unwrap();
        let touches = &customers[3].touches;
        assert_eq!(touches.effective_touch_count(), 1);
        assert_eq!(touches.first_touch(), Some(&Channel::new("referral")));
    }

    #[test]
    fn test_out_of_range_tier_fails() {
        let csv = "\
customer_id,tier,converted,touch_1,touch_2,touch_3,touch_4,touch_5
c-1,4,true,social,,,,
";
        let err = read_customers(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AttributionError::Ingest(_)));
    }

    #[test]
    fn test_read_cost_model() {
        let model = read_cost_model(SPEND_CSV.as_bytes()).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(
            model.total_spend(&Channel::new("display"), Tier::Two),
            Some(350.0)
        );
        assert_eq!(model.marginal_step(&Channel::new("organic_search")), Some(0.0));
    }

    #[test]
    fn test_converted_filter() {
        let customers = read_customers(CUSTOMERS_CSV.as_bytes()).unwrap();
        let converted = converted_customers(&customers);
        assert_eq!(converted.len(), 3);
        assert!(converted.iter().all(|customer| customer.converted));
    }
}
