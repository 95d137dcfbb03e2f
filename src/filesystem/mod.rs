//! Directory tree classification.
//!
//! Walks a directory, keeps the files the rules allow, flags markup files by
//! their leading content and prunes directories left without children.

pub mod marker;
mod tree;

pub use marker::Marker;
pub use tree::{ManifestNode, TreeClassifier, TreeError};
#[cfg(test)]
pub use tree::NodeKind;
