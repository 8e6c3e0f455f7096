//! Channel spend model: tier-1 base spend plus a uniform per-tier step.

use attribution_core::channels::{FREE_CHANNELS, STANDARD_CHANNELS};
use attribution_core::{AttributionError, AttributionResult, Channel, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance when checking that tier deltas agree.
const STEP_TOLERANCE: f64 = 1e-6;

/// Spend figures for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelCost {
    /// Total spend at tier 1.
    pub base_spend: f64,
    /// Additional spend per tier above tier 1.
    pub marginal_step: f64,
}

/// Fixed mapping from channel to spend per tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostModel {
    entries: BTreeMap<Channel, ChannelCost>,
}

impl CostModel {
    pub fn from_entries<I, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, f64, f64)>,
        C: Into<Channel>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(channel, base_spend, marginal_step)| {
                    (
                        channel.into(),
                        ChannelCost {
                            base_spend,
                            marginal_step,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Build from a spend-per-tier table, one row per channel.
    ///
    /// The marginal step is derived from the tier deltas, which must agree
    /// within tolerance: the allocation table reports a single marginal
    /// spend per channel.
    pub fn from_tier_table<I, C>(rows: I) -> AttributionResult<Self>
    where
        I: IntoIterator<Item = (C, [f64; 3])>,
        C: Into<Channel>,
    {
        let mut entries = BTreeMap::new();
        for (channel, spends) in rows {
            let channel = channel.into();
            let step_12 = spends[1] - spends[0];
            let step_23 = spends[2] - spends[1];
            if (step_12 - step_23).abs() > STEP_TOLERANCE {
                return Err(AttributionError::CostModel(format!(
                    "uneven tier spend for {channel}: {step_12} vs {step_23}"
                )));
            }
            entries.insert(
                channel,
                ChannelCost {
                    base_spend: spends[0],
                    marginal_step: step_12,
                },
            );
        }
        Ok(Self { entries })
    }

    /// Default spend table: 300 at tier 1 for every paid channel, 0 for
    /// the free ones, with a 50 step between tiers.
    pub fn standard() -> Self {
        Self::from_entries(STANDARD_CHANNELS.iter().map(|&name| {
            if FREE_CHANNELS.contains(&name) {
                (name, 0.0, 0.0)
            } else {
                (name, 300.0, 50.0)
            }
        }))
    }

    /// Total spend for a channel at a tier: base + (tier - 1) * step.
    pub fn total_spend(&self, channel: &Channel, tier: Tier) -> Option<f64> {
        self.entries
            .get(channel)
            .map(|cost| cost.base_spend + tier.index() as f64 * cost.marginal_step)
    }

    /// Spend added by moving up to `tier` from the tier below. Zero at
    /// tier 1, which has no predecessor.
    pub fn marginal_spend(&self, channel: &Channel, tier: Tier) -> Option<f64> {
        self.entries.get(channel).map(|cost| match tier {
            Tier::One => 0.0,
            Tier::Two | Tier::Three => cost.marginal_step,
        })
    }

    /// The per-channel step itself, independent of tier.
    pub fn marginal_step(&self, channel: &Channel) -> Option<f64> {
        self.entries.get(channel).map(|cost| cost.marginal_step)
    }

    pub fn contains(&self, channel: &Channel) -> bool {
        self.entries.contains_key(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
