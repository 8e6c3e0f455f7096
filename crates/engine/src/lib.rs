//! Attribution and allocation engine: credit distribution under three
//! policies, the channel cost model, CAC computation, and marginal CAC
//! across spend tiers.
//!
//! Everything here is a pure, synchronous function of its inputs; ingest
//! and output formatting live in `attribution-reporting`.

pub mod cac;
pub mod cost;
pub mod engine;
pub mod marginal;

pub use cac::{CacCalculator, CacReport, CacRow};
pub use cost::{ChannelCost, CostModel};
pub use engine::{AttributionEngine, AttributionModel, CreditTotals};
pub use marginal::{MarginalAllocationAnalyzer, MarginalReport, MarginalRow};
