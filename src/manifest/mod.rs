mod writer;

pub use writer::{ManifestWriteError, write};
