use std::path::{Path, PathBuf};

use compio::fs;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::ext::BestEffortPathExt;
use crate::filesystem::ManifestNode;

/// Renders the manifest as 2-space indented JSON. An empty tree renders as `null`.
pub fn render(root: Option<&ManifestNode>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&root)
}

/// Renders the manifest and writes it to `path`, creating missing parent directories.
pub async fn write(path: &Path, root: Option<&ManifestNode>) -> Result<(), ManifestWriteError> {
    let contents = render(root).context(SerializeSnafu)?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).await.context(WriteSnafu {
            path: path.to_path_buf(),
        })?;
    }

    debug!(
        "Writing {} bytes to {}",
        contents.len(),
        path.best_effort_path_display()
    );
    let written = fs::write(path, contents.into_bytes()).await;
    written.0.context(WriteSnafu {
        path: path.to_path_buf(),
    })?;

    Ok(())
}

#[derive(Debug, Snafu)]
pub enum ManifestWriteError {
    #[snafu(display("Failed to serialize the manifest"))]
    SerializeError { source: serde_json::Error },
    #[snafu(display("Failed to write the manifest to {}", path.best_effort_path_display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}
