//! Domain records the attribution pipeline operates on.

use crate::channels::Channel;
use serde::{Deserialize, Serialize};

/// Number of touch slots tracked per customer.
pub const TOUCH_SLOTS: usize = 5;

/// Spend level active when a customer converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    One,
    Two,
    Three,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::One, Tier::Two, Tier::Three];

    /// 1-based tier number.
    pub fn number(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }

    /// 0-based position, for indexing per-tier arrays.
    pub fn index(self) -> usize {
        (self.number() - 1) as usize
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            other => Err(format!("tier out of range: {other}")),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.number()
    }
}

/// A customer's ordered touch history: five optional slots, slot 1 earliest,
/// slot 5 most recent.
///
/// Populated slots are assumed contiguous from slot 1; the accessors rely on
/// that but do not validate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchSequence {
    slots: [Option<Channel>; TOUCH_SLOTS],
}

impl TouchSequence {
    pub fn new(slots: [Option<Channel>; TOUCH_SLOTS]) -> Self {
        Self { slots }
    }

    /// Builds a sequence from the leading touches, leaving the rest empty.
    /// Touches beyond the slot capacity are dropped.
    pub fn from_touches<I, C>(touches: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Channel>,
    {
        let mut slots: [Option<Channel>; TOUCH_SLOTS] = Default::default();
        for (slot, touch) in slots.iter_mut().zip(touches) {
            *slot = Some(touch.into());
        }
        Self { slots }
    }

    /// Count of populated slots; the divisor for linear attribution.
    pub fn effective_touch_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// The earliest touch: slot 1, when populated.
    pub fn first_touch(&self) -> Option<&Channel> {
        self.slots[0].as_ref()
    }

    /// The most recent touch: scans from slot 5 back toward slot 1 and stops
    /// at the first populated slot.
    pub fn last_touch(&self) -> Option<&Channel> {
        self.slots.iter().rev().find_map(|slot| slot.as_ref())
    }

    /// Lazy (1-based slot index, channel) pairs over populated slots only.
    pub fn touches(&self) -> impl Iterator<Item = (usize, &Channel)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|channel| (i + 1, channel)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    pub fn slots(&self) -> &[Option<Channel>; TOUCH_SLOTS] {
        &self.slots
    }
}

/// One customer record as supplied by the loader.
///
/// Attribution runs expect batches already filtered to `converted == true`;
/// the engine does not re-check the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub tier: Tier,
    pub converted: bool,
    pub touches: TouchSequence,
}
