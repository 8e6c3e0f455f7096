//! CAC computation: joins credit totals with the cost model.

use crate::cost::CostModel;
use crate::engine::{AttributionModel, CreditTotals};
use attribution_core::{Channel, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// One channel's acquisition cost at a given tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacRow {
    pub channel: Channel,
    /// Attributed conversions; fractional under the linear policy.
    pub conversions: f64,
    pub total_cost: f64,
    /// `total_cost / conversions`; infinite when a channel earned no credit.
    pub cac: f64,
}

/// CAC table for one attribution policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacReport {
    pub report_id: Uuid,
    pub model: AttributionModel,
    pub tier: Tier,
    pub rows: Vec<CacRow>,
    /// Channels that earned credit but have no cost-model entry. Excluded
    /// from `rows`; a data-completeness gap, not a computation failure.
    pub missing_cost: Vec<Channel>,
    pub computed_at: DateTime<Utc>,
}

/// Joins attribution credit with channel spend.
#[derive(Debug, Clone)]
pub struct CacCalculator {
    cost: CostModel,
}

impl CacCalculator {
    pub fn new(cost: CostModel) -> Self {
        Self { cost }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Build the CAC table for one run's credit totals.
    ///
    /// The join is inner on the credit side: every channel in `credits`
    /// is considered, and cost-model channels absent from the totals do
    /// not produce rows. Because totals are seeded from the engine's
    /// channel set, that exclusion only affects channels the run was never
    /// configured to track; zero-conversion known channels stay visible as
    /// rows with infinite CAC.
    pub fn compute(
        &self,
        model: AttributionModel,
        credits: &CreditTotals,
        tier: Tier,
    ) -> CacReport {
        let mut rows = Vec::new();
        let mut missing_cost = Vec::new();

        for (channel, conversions) in credits.iter() {
            let Some(total_cost) = self.cost.total_spend(channel, tier) else {
                warn!(channel = %channel, "no cost entry for channel with credit");
                missing_cost.push(channel.clone());
                continue;
            };
            let cac = if conversions == 0.0 {
                f64::INFINITY
            } else {
                total_cost / conversions
            };
            rows.push(CacRow {
                channel: channel.clone(),
                conversions,
                total_cost,
                cac,
            });
        }

        CacReport {
            report_id: Uuid::new_v4(),
            model,
            tier,
            rows,
            missing_cost,
            computed_at: Utc::now(),
        }
    }
}
