//! Ingest and output around the attribution engine: CSV loading of the
//! source tables, result-table serialization, and terminal rendering.

pub mod loader;
pub mod tables;

pub use loader::{converted_customers, load_cost_model, load_customers};
pub use tables::{
    format_metric, render_cac_table, render_marginal_table, write_cac_csv, write_marginal_csv,
};
