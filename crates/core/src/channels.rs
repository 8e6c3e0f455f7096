//! Channel vocabulary and the configured set of channels credit may land on.
//!
//! The set is configuration, not a closed enum: deployments can narrow or
//! widen the vocabulary, and the policy decides what happens when a touch
//! references a channel outside it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The standard acquisition mix.
pub const STANDARD_CHANNELS: [&str; 7] = [
    "organic_search",
    "direct",
    "display",
    "email",
    "social",
    "paid_search",
    "referral",
];

/// Channels that carry no media spend in the standard cost model.
pub const FREE_CHANNELS: [&str; 2] = ["organic_search", "direct"];

/// A marketing channel, identified by its normalized (trimmed, lowercased)
/// name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// What to do when credit lands on a channel outside the configured set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownChannelPolicy {
    /// Abort the whole batch. Totals are never built from records the
    /// vocabulary does not cover.
    Fail,
    /// Admit the new channel and keep accumulating.
    Extend,
}

impl Default for UnknownChannelPolicy {
    fn default() -> Self {
        Self::Fail
    }
}

/// The enumerated set of channels an engine run recognizes, plus the policy
/// applied to anything outside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSet {
    channels: BTreeSet<Channel>,
    #[serde(default)]
    policy: UnknownChannelPolicy,
}

impl ChannelSet {
    pub fn new<I, C>(channels: I, policy: UnknownChannelPolicy) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Channel>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            policy,
        }
    }

    /// The standard seven-channel mix with the fail-fast policy.
    pub fn standard() -> Self {
        Self::new(STANDARD_CHANNELS, UnknownChannelPolicy::Fail)
    }

    pub fn contains(&self, channel: &Channel) -> bool {
        self.channels.contains(channel)
    }

    pub fn policy(&self) -> UnknownChannelPolicy {
        self.policy
    }

    /// Channels in name order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::standard()
    }
}
