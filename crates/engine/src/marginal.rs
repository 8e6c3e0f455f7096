//! Marginal allocation: last-touch conversions per spend tier and the
//! efficiency of each additional tier of spend.

use crate::cost::CostModel;
use crate::engine::{AttributionEngine, AttributionModel};
use attribution_core::{AttributionResult, Channel, ChannelSet, Customer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;
use uuid::Uuid;

/// Marginal conversions and marginal CAC for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalRow {
    pub channel: Channel,
    /// Last-touch conversions at tiers 1 through 3.
    pub tier_conversions: [f64; 3],
    /// Tier-2 conversions minus tier-1 conversions; may be negative.
    pub marginal_conversion_2: f64,
    /// Tier-3 conversions minus tier-2 conversions; may be negative.
    pub marginal_conversion_3: f64,
    /// Spend added per tier for this channel.
    pub marginal_spend: f64,
    /// Marginal CAC at tiers 1 through 3.
    ///
    /// Tier 1 divides the step by tier-1 conversions, treating the first
    /// tier as a baseline increment from zero spend; tiers 2 and 3 divide
    /// by the true conversion deltas. Infinite when the divisor is zero,
    /// negative when conversions fell as spend rose.
    pub marginal_cac: [f64; 3],
}

/// Marginal allocation table across all tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginalReport {
    pub report_id: Uuid,
    pub rows: Vec<MarginalRow>,
    /// Channels with conversions but no cost-model entry, excluded from
    /// `rows`.
    pub missing_cost: Vec<Channel>,
    pub computed_at: DateTime<Utc>,
}

/// Runs last-touch attribution independently per spend tier and derives
/// marginal conversions and marginal CAC.
pub struct MarginalAllocationAnalyzer {
    engine: AttributionEngine,
    cost: CostModel,
}

impl MarginalAllocationAnalyzer {
    pub fn new(channel_set: ChannelSet, cost: CostModel) -> Self {
        Self {
            engine: AttributionEngine::new(channel_set),
            cost,
        }
    }

    /// Compute the marginal allocation table for a batch of converted
    /// customers.
    ///
    /// A negative or zero marginal conversion flows through as a negative
    /// or infinite marginal CAC; diminishing returns are an analytic
    /// outcome, not an error.
    pub fn analyze<'a, I>(&self, customers: I) -> AttributionResult<MarginalReport>
    where
        I: IntoIterator<Item = &'a Customer>,
    {
        let mut by_tier: [Vec<&Customer>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for customer in customers {
            by_tier[customer.tier.index()].push(customer);
        }

        let per_tier = [
            self.engine
                .run(AttributionModel::LastTouch, by_tier[0].iter().copied())?,
            self.engine
                .run(AttributionModel::LastTouch, by_tier[1].iter().copied())?,
            self.engine
                .run(AttributionModel::LastTouch, by_tier[2].iter().copied())?,
        ];

        // Union of the three runs; under the extend policy a channel may
        // appear in some tiers only.
        let channels: BTreeSet<Channel> = per_tier
            .iter()
            .flat_map(|totals| totals.iter())
            .map(|(channel, _)| channel.clone())
            .collect();

        let mut rows = Vec::new();
        let mut missing_cost = Vec::new();

        for channel in channels {
            let conversions = [
                per_tier[0].get(&channel),
                per_tier[1].get(&channel),
                per_tier[2].get(&channel),
            ];
            let Some(step) = self.cost.marginal_step(&channel) else {
                warn!(channel = %channel, "no cost entry for channel with conversions");
                missing_cost.push(channel);
                continue;
            };

            let marginal_2 = conversions[1] - conversions[0];
            let marginal_3 = conversions[2] - conversions[1];

            rows.push(MarginalRow {
                channel,
                tier_conversions: conversions,
                marginal_conversion_2: marginal_2,
                marginal_conversion_3: marginal_3,
                marginal_spend: step,
                marginal_cac: [
                    ratio(step, conversions[0]),
                    ratio(step, marginal_2),
                    ratio(step, marginal_3),
                ],
            });
        }

        Ok(MarginalReport {
            report_id: Uuid::new_v4(),
            rows,
            missing_cost,
            computed_at: Utc::now(),
        })
    }
}

/// Spend over conversions, with a zero divisor surfaced as undefined rather
/// than a crash or a silent zero.
fn ratio(spend: f64, conversions: f64) -> f64 {
    if conversions == 0.0 {
        f64::INFINITY
    } else {
        spend / conversions
    }
}
