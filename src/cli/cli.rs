use std::path::PathBuf;

use clap::Parser;

use crate::{application::data::LogLevel, config::Profile};

/// Generates a JSON manifest of the files under a directory.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Directory to scan
    pub directory: PathBuf,
    /// String prepended to every path in the manifest
    #[clap(default_value = "")]
    pub prefix: String,
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Rule profile, overriding the one from the config file
    #[clap(long, short, value_enum)]
    pub profile: Option<Profile>,
    /// Config file to use instead of ./manifestor.yaml
    #[clap(long, short)]
    pub config: Option<PathBuf>,
    /// Where to write the manifest [default: ./project-manifest.json]
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}
