/// A content marker: files whose leading content starts with `token` get
/// `flag: true` in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub flag: String,
    pub token: String,
}

impl Marker {
    pub fn new(flag: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            token: token.into(),
        }
    }

    pub fn matches(&self, leading: &str) -> bool {
        leading.starts_with(&self.token)
    }
}

/// Strips leading whitespace, byte-order marks included.
pub fn leading_content(content: &str) -> &str {
    content.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Returns the flags of every marker matching `content`, in marker order.
pub fn detect(markers: &[Marker], content: &str) -> Vec<String> {
    let leading = leading_content(content);
    markers
        .iter()
        .filter(|marker| marker.matches(leading))
        .map(|marker| marker.flag.clone())
        .collect()
}
