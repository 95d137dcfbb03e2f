use compio::fs;
use saphyr::{LoadableYamlNode, Yaml};
use snafu::prelude::*;
use std::{
    path::{Path, PathBuf},
    string::FromUtf8Error,
};
use tracing::debug;

use crate::{
    config::{ManifestRules, Profile},
    ext::BestEffortPathExt,
    filesystem::Marker,
};

const CONFIG_FILE_NAME: &str = "manifestor.yaml";
const MANIFEST_NODE_KEYS: &[&str] = &["name", "path", "type", "children"];

/// Settings read from the optional YAML configuration file.
///
/// Every field is optional; unset fields fall back to the selected profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestConfig {
    pub profile: Option<Profile>,
    pub output: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub markup_extensions: Option<Vec<String>>,
    /// Appended to the built-in exclusions.
    pub exclude: Vec<String>,
    pub markers: Option<Vec<Marker>>,
}

impl ManifestConfig {
    /// Reads `explicit` if given, otherwise `manifestor.yaml` from the current
    /// directory when it exists.
    pub async fn read(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_path(path).await,
            None => {
                let path = PathBuf::from(CONFIG_FILE_NAME);
                if !path.is_file() {
                    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    return Ok(Self::default());
                }
                Self::from_path(&path).await
            }
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading config file: {}", path.best_effort_path_display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        debug!("Successfully read config file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    /// Builds the effective rules. `profile` overrides the configured one.
    pub fn rules(&self, profile: Option<Profile>, output_file_name: &str) -> ManifestRules {
        let profile = profile.or(self.profile).unwrap_or_default();
        debug!("Using profile '{}'", profile);

        let mut rules = ManifestRules::for_profile(profile, output_file_name);
        if let Some(extensions) = &self.extensions {
            rules.extensions = extensions.clone();
        }
        if let Some(markup_extensions) = &self.markup_extensions {
            rules.markup_extensions = markup_extensions.clone();
        }
        if let Some(markers) = &self.markers {
            rules.markers = markers.clone();
        }
        rules.excluded.extend(self.exclude.iter().cloned());
        rules
    }

    fn apply_entry(&mut self, key: &str, value: &Yaml) -> Result<(), ConfigError> {
        match key {
            "profile" => {
                let name = string_value(key, value)?;
                let profile = Profile::from_name(&name)
                    .context(UnknownProfileSnafu { name: name.clone() })?;
                self.profile = Some(profile);
            }
            "output" => self.output = Some(PathBuf::from(string_value(key, value)?)),
            "extensions" => self.extensions = Some(string_list(key, value)?),
            "markup_extensions" => self.markup_extensions = Some(string_list(key, value)?),
            "exclude" => self.exclude = string_list(key, value)?,
            "markers" => self.markers = Some(markers(key, value)?),
            other => debug!("Ignoring unknown config key '{}'", other),
        }
        Ok(())
    }
}

fn string_value(key: &str, value: &Yaml) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(|s| s.to_string())
        .context(NotAStringSnafu { key })
}

fn string_list(key: &str, value: &Yaml) -> Result<Vec<String>, ConfigError> {
    value
        .as_sequence()
        .context(NotAListSnafu { key })?
        .iter()
        .map(|item| string_value(key, item))
        .collect()
}

fn markers(key: &str, value: &Yaml) -> Result<Vec<Marker>, ConfigError> {
    let mapping = value.as_mapping().context(NotAMapSnafu { key })?;

    let mut markers: Vec<Marker> = Vec::new();
    for (flag, token) in mapping.iter() {
        let flag = string_value(key, flag)?;
        check_marker_flag(&markers, &flag)?;
        markers.push(Marker::new(flag, string_value(key, token)?));
    }
    Ok(markers)
}

/// Marker flags become keys of file nodes, next to the node's own keys.
fn check_marker_flag(markers: &[Marker], flag: &str) -> Result<(), ConfigError> {
    ensure!(
        !MANIFEST_NODE_KEYS.contains(&flag),
        ReservedMarkerFlagSnafu { flag }
    );
    ensure!(
        markers.iter().all(|marker| marker.flag != flag),
        DuplicateMarkerFlagSnafu { flag }
    );
    Ok(())
}

impl TryFrom<&str> for ManifestConfig {
    type Error = ConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        };

        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        let mut config = Self::default();
        for (key, value) in top_level.iter() {
            match key.as_str() {
                Some(key) => config.apply_entry(key, value)?,
                None => debug!("Skipping non-string config key: {:?}", key),
            }
        }
        Ok(config)
    }
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The config file is not valid UTF-8: {}", file_path))]
    EncodingError {
        file_path: String,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Unknown profile '{}'", name))]
    UnknownProfile { name: String },
    #[snafu(display("Config key '{}' should hold strings", key))]
    NotAString { key: String },
    #[snafu(display("Config key '{}' should be a list", key))]
    NotAList { key: String },
    #[snafu(display("Config key '{}' should be a map", key))]
    NotAMap { key: String },
    #[snafu(display("Marker flag '{}' clashes with a manifest node key", flag))]
    ReservedMarkerFlag { flag: String },
    #[snafu(display("Marker flag '{}' is configured more than once", flag))]
    DuplicateMarkerFlag { flag: String },
}
