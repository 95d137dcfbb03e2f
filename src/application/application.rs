use std::path::{Path, PathBuf};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::application::report;
use crate::config::{ConfigError, DEFAULT_OUTPUT_FILE_NAME, ManifestConfig};
use crate::ext::resolve_path;
use crate::filesystem::{TreeClassifier, TreeError};
use crate::manifest::{self, ManifestWriteError};

pub struct Application;

impl Application {
    /// Generates the manifest for one run and returns where it was written.
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<PathBuf, ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();

        let directory = resolve_path(&app_config.directory);
        ensure!(
            directory.exists(),
            DirectoryNotFoundSnafu {
                path: directory.clone()
            }
        );

        let config = ManifestConfig::read(app_config.config.as_deref())
            .await
            .context(ConfigurationSnafu)?;
        debug!("Loaded config: {:?}", config);

        let output = app_config
            .output
            .or_else(|| config.output.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE_NAME));
        let rules = config.rules(app_config.profile, &output_file_name(&output));
        debug!("Effective rules: {:?}", rules);

        info!("Scanning {}", directory.display());
        let root = TreeClassifier::new(&rules, &app_config.prefix)
            .classify(&directory)
            .context(ClassificationSnafu)?;
        if root.is_none() {
            warn!(
                "No files under {} matched, writing an empty manifest",
                directory.display()
            );
        }

        manifest::write(&output, root.as_ref())
            .await
            .context(WriteSnafu)?;
        info!("Wrote {}", output.display());

        report::manifest_generated(&directory);
        Ok(output)
    }
}

fn output_file_name(output: &Path) -> String {
    output
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_OUTPUT_FILE_NAME.to_string())
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Directory not found: {}", path.display()))]
    DirectoryNotFound { path: PathBuf },
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigurationError { source: ConfigError },
    #[snafu(display("Error generating manifest"))]
    ClassificationError { source: TreeError },
    #[snafu(display("Error writing manifest"))]
    WriteError { source: ManifestWriteError },
}
