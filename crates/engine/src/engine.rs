//! Attribution policies that turn touch histories into per-channel credit.

use attribution_core::{
    AttributionError, AttributionResult, Channel, ChannelSet, Customer, UnknownChannelPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How conversion credit is distributed across a customer's touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    /// Full credit to the most recent touch before conversion.
    LastTouch,
    /// Full credit to the touch that first exposed the customer.
    FirstTouch,
    /// Equal credit to every touch on the way to conversion.
    Linear,
}

impl AttributionModel {
    pub const ALL: [AttributionModel; 3] = [
        AttributionModel::LastTouch,
        AttributionModel::FirstTouch,
        AttributionModel::Linear,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            AttributionModel::LastTouch => "Last Touch",
            AttributionModel::FirstTouch => "First Touch",
            AttributionModel::Linear => "Linear",
        }
    }

    /// Stable lowercase identifier, used in file names.
    pub fn slug(&self) -> &'static str {
        match self {
            AttributionModel::LastTouch => "last_touch",
            AttributionModel::FirstTouch => "first_touch",
            AttributionModel::Linear => "linear",
        }
    }
}

/// Per-channel credit accumulated by a single engine run.
///
/// Seeded with a zero entry for every channel in the configured set, so
/// channels that never receive credit still appear in downstream tables.
/// Owned by the run that produced it; runs never share totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTotals {
    credits: BTreeMap<Channel, f64>,
}

impl CreditTotals {
    pub fn seeded(set: &ChannelSet) -> Self {
        Self {
            credits: set.channels().cloned().map(|channel| (channel, 0.0)).collect(),
        }
    }

    /// Credit for a channel; zero when absent.
    pub fn get(&self, channel: &Channel) -> f64 {
        self.credits.get(channel).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, channel: &Channel) -> bool {
        self.credits.contains_key(channel)
    }

    /// Sum of credit across all channels. Equals the number of attributed
    /// customers under every policy.
    pub fn grand_total(&self) -> f64 {
        self.credits.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Channel, f64)> {
        self.credits.iter().map(|(channel, credit)| (channel, *credit))
    }

    pub fn len(&self) -> usize {
        self.credits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    fn add(
        &mut self,
        channel: &Channel,
        amount: f64,
        policy: UnknownChannelPolicy,
    ) -> AttributionResult<()> {
        if let Some(entry) = self.credits.get_mut(channel) {
            *entry += amount;
            return Ok(());
        }
        match policy {
            UnknownChannelPolicy::Fail => {
                Err(AttributionError::UnknownChannel(channel.to_string()))
            }
            UnknownChannelPolicy::Extend => {
                self.credits.insert(channel.clone(), amount);
                Ok(())
            }
        }
    }
}

/// Distributes conversion credit over channels for batches of converted
/// customers.
///
/// Callers supply customers already filtered to `converted == true`. Runs
/// are pure: each call builds a fresh `CreditTotals` from its input alone,
/// so the engine can be invoked repeatedly or over disjoint partitions and
/// the results summed.
#[derive(Debug, Clone)]
pub struct AttributionEngine {
    channel_set: ChannelSet,
}

impl AttributionEngine {
    pub fn new(channel_set: ChannelSet) -> Self {
        Self { channel_set }
    }

    pub fn channel_set(&self) -> &ChannelSet {
        &self.channel_set
    }

    /// Run one attribution policy over a batch.
    ///
    /// Fails on the first customer with an empty touch sequence and, under
    /// the `Fail` policy, on the first out-of-vocabulary channel. A failed
    /// run yields no totals; partial aggregates are never exposed.
    pub fn run<'a, I>(
        &self,
        model: AttributionModel,
        customers: I,
    ) -> AttributionResult<CreditTotals>
    where
        I: IntoIterator<Item = &'a Customer>,
    {
        let policy = self.channel_set.policy();
        let mut totals = CreditTotals::seeded(&self.channel_set);
        let mut count = 0usize;

        for customer in customers {
            count += 1;
            match model {
                AttributionModel::LastTouch => {
                    let channel = customer.touches.last_touch().ok_or_else(|| {
                        AttributionError::EmptyTouchSequence(customer.customer_id.clone())
                    })?;
                    totals.add(channel, 1.0, policy)?;
                }
                AttributionModel::FirstTouch => {
                    let channel = customer.touches.first_touch().ok_or_else(|| {
                        AttributionError::EmptyTouchSequence(customer.customer_id.clone())
                    })?;
                    totals.add(channel, 1.0, policy)?;
                }
                AttributionModel::Linear => {
                    let n = customer.touches.effective_touch_count();
                    if n == 0 {
                        return Err(AttributionError::EmptyTouchSequence(
                            customer.customer_id.clone(),
                        ));
                    }
                    // A channel occupying several slots accrues the share
                    // once per slot; touches are not deduplicated.
                    let share = 1.0 / n as f64;
                    for (_, channel) in customer.touches.touches() {
                        totals.add(channel, share, policy)?;
                    }
                }
            }
        }

        debug!(
            model = model.display_name(),
            customers = count,
            channels = totals.len(),
            "attribution run complete"
        );
        Ok(totals)
    }
}
