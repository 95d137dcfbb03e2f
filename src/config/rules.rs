use clap::ValueEnum;
use derive_more::Display;

use crate::filesystem::Marker;

pub const DEFAULT_OUTPUT_FILE_NAME: &str = "project-manifest.json";

/// Entries excluded regardless of their extension, on top of the output file.
const ALWAYS_EXCLUDED: &[&str] = &[
    ".DS_Store",
    env!("CARGO_PKG_NAME"),
    concat!(env!("CARGO_PKG_NAME"), ".exe"),
];

/// Built-in rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Display)]
pub enum Profile {
    /// Headers, sources, XML and image/font assets; three markers.
    #[default]
    #[display("assets")]
    Assets,
    /// C sources and LVML documents; component marker only.
    #[display("lvml")]
    Lvml,
}

impl Profile {
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            Profile::Assets => &[
                ".h", ".xml", ".c", ".ttf", ".bmp", ".jpg", ".jpeg", ".svg", ".png",
            ],
            Profile::Lvml => &[".c", ".lvml"],
        }
    }

    fn markup_extensions(&self) -> &'static [&'static str] {
        match self {
            Profile::Assets => &[".xml"],
            Profile::Lvml => &[".lvml"],
        }
    }

    fn markers(&self) -> Vec<Marker> {
        match self {
            Profile::Assets => vec![
                Marker::new("isTest", "<tests"),
                Marker::new("isComponent", "<component"),
                Marker::new("isWidget", "<widget"),
            ],
            Profile::Lvml => vec![Marker::new("isComponent", "<component")],
        }
    }
}

/// The effective filtering and classification rules for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRules {
    pub extensions: Vec<String>,
    pub markup_extensions: Vec<String>,
    pub excluded: Vec<String>,
    pub markers: Vec<Marker>,
}

impl ManifestRules {
    /// Rules of `profile`, excluding `output_file_name` from the tree.
    pub fn for_profile(profile: Profile, output_file_name: &str) -> Self {
        let to_owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut excluded = vec![output_file_name.to_string()];
        excluded.extend(to_owned(ALWAYS_EXCLUDED));

        Self {
            extensions: to_owned(profile.extensions()),
            markup_extensions: to_owned(profile.markup_extensions()),
            excluded,
            markers: profile.markers(),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.iter().any(|excluded| excluded == name)
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        !self.is_excluded(name) && ends_with_any(name, &self.extensions)
    }

    pub fn is_markup(&self, name: &str) -> bool {
        ends_with_any(name, &self.markup_extensions)
    }
}

/// Case-sensitive suffix match, so `.c` also admits a file named exactly `.c`.
fn ends_with_any(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| name.ends_with(s.as_str()))
}
