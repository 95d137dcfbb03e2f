use std::path::Path;

use colored::Colorize;
use supports_color::Stream;

/// Prints the confirmation line for a successful run.
pub fn manifest_generated(directory: &Path) {
    colored::control::set_override(supports_color::on(Stream::Stdout).is_some());
    println!(
        "{} {}",
        "Manifest generated for:".green(),
        directory.display().to_string().bold()
    );
}
