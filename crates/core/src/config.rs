use crate::channels::{ChannelSet, UnknownChannelPolicy, STANDARD_CHANNELS};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `ATTRIBUTION_EXPRESS__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Customer touch table (CSV).
    #[serde(default = "default_customers_path")]
    pub customers_path: String,
    /// Channel spend-per-tier table (CSV).
    #[serde(default = "default_spend_path")]
    pub spend_path: String,
    /// Directory result CSVs are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub attribution: AttributionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    /// Channel vocabulary credit may be assigned to.
    #[serde(default = "default_known_channels")]
    pub known_channels: Vec<String>,
    /// Whether an out-of-vocabulary touch aborts the run or extends the set.
    #[serde(default)]
    pub unknown_channel_policy: UnknownChannelPolicy,
}

impl AttributionConfig {
    pub fn channel_set(&self) -> ChannelSet {
        ChannelSet::new(
            self.known_channels.iter().map(String::as_str),
            self.unknown_channel_policy,
        )
    }
}

fn default_customers_path() -> String {
    "attribution_allocation_data.csv".to_string()
}
fn default_spend_path() -> String {
    "channel_spend_data.csv".to_string()
}
fn default_output_dir() -> String {
    ".".to_string()
}
fn default_known_channels() -> Vec<String> {
    STANDARD_CHANNELS.iter().map(|name| name.to_string()).collect()
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            known_channels: default_known_channels(),
            unknown_channel_policy: UnknownChannelPolicy::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            customers_path: default_customers_path(),
            spend_path: default_spend_path(),
            output_dir: default_output_dir(),
            attribution: AttributionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config
    /// file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("attribution-express").required(false))
            .add_source(
                config::Environment::with_prefix("ATTRIBUTION_EXPRESS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
