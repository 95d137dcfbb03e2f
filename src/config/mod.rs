mod manifest_config;
mod rules;

pub use manifest_config::{ConfigError, ManifestConfig};
pub use rules::{DEFAULT_OUTPUT_FILE_NAME, ManifestRules, Profile};
