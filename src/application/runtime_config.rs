use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Profile;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub profile: Option<Profile>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            directory: cli.directory,
            prefix: cli.prefix,
            profile: cli.profile,
            config: cli.config,
            output: cli.output,
        }
    }
}
