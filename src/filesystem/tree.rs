use std::fs;
use std::path::{Path, PathBuf};

use derive_more::Display;
use serde::{Serialize, Serializer, ser::SerializeMap};
use snafu::{ResultExt, Snafu};
use tracing::{debug, trace};

use crate::config::ManifestRules;
use crate::ext::{BestEffortPathExt, to_manifest_path};
use crate::filesystem::marker;

/// The type of a manifest entry. Directories sort before files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[display("directory")]
    Directory,
    #[display("file")]
    File,
}

/// One entry of the manifest tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    /// Marker flags set on this file, in marker order. Always empty for directories.
    pub flags: Vec<String>,
    /// Surviving children, already sorted. Never empty for directories in a built tree.
    pub children: Vec<ManifestNode>,
}

impl Serialize for ManifestNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("path", &self.path)?;
        map.serialize_entry("type", &self.kind)?;
        for flag in &self.flags {
            map.serialize_entry(flag, &true)?;
        }
        if !self.children.is_empty() {
            map.serialize_entry("children", &self.children)?;
        }
        map.end()
    }
}

/// Walks a directory tree and builds the pruned, sorted manifest tree.
pub struct TreeClassifier<'a> {
    rules: &'a ManifestRules,
    prefix: &'a str,
}

impl<'a> TreeClassifier<'a> {
    pub fn new(rules: &'a ManifestRules, prefix: &'a str) -> Self {
        Self { rules, prefix }
    }

    /// Classifies `root` as a directory.
    ///
    /// Returns `Ok(None)` when nothing under `root` survives filtering.
    pub fn classify(&self, root: &Path) -> Result<Option<ManifestNode>, TreeError> {
        let metadata = fs::metadata(root).context(MetadataSnafu {
            path: root.to_path_buf(),
        })?;
        if !metadata.is_dir() {
            return Err(TreeError::RootNotDirectory {
                path: root.to_path_buf(),
            });
        }

        let root_name = match root.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => root.display().to_string(),
        };
        self.visit_directory(root, Path::new(""), root_name)
    }

    fn visit(&self, path: &Path, relative: &Path) -> Result<Option<ManifestNode>, TreeError> {
        let metadata = fs::metadata(path).context(MetadataSnafu {
            path: path.to_path_buf(),
        })?;
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        if metadata.is_dir() {
            self.visit_directory(path, relative, name)
        } else {
            self.visit_file(path, relative, name)
        }
    }

    fn visit_directory(
        &self,
        path: &Path,
        relative: &Path,
        name: String,
    ) -> Result<Option<ManifestNode>, TreeError> {
        let entries = fs::read_dir(path).context(ReadDirSnafu {
            path: path.to_path_buf(),
        })?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.context(ReadDirSnafu {
                path: path.to_path_buf(),
            })?;
            let child_relative = relative.join(entry.file_name());
            if let Some(child) = self.visit(&entry.path(), &child_relative)? {
                children.push(child);
            }
        }

        if children.is_empty() {
            debug!("Pruning empty directory {}", path.display());
            return Ok(None);
        }

        // Byte order: uppercase names sort before lowercase ones, unlike a
        // locale-aware collation.
        children.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));

        Ok(Some(ManifestNode {
            name,
            path: self.manifest_path(relative),
            kind: NodeKind::Directory,
            flags: Vec::new(),
            children,
        }))
    }

    fn visit_file(
        &self,
        path: &Path,
        relative: &Path,
        name: String,
    ) -> Result<Option<ManifestNode>, TreeError> {
        if !self.rules.is_allowed(&name) {
            trace!("Skipping {}", path.display());
            return Ok(None);
        }

        let flags = if self.rules.is_markup(&name) {
            let bytes = fs::read(path).context(ReadFileSnafu {
                path: path.to_path_buf(),
            })?;
            marker::detect(&self.rules.markers, &String::from_utf8_lossy(&bytes))
        } else {
            Vec::new()
        };
        if !flags.is_empty() {
            debug!("Marked {} with {:?}", path.display(), flags);
        }

        Ok(Some(ManifestNode {
            name,
            path: self.manifest_path(relative),
            kind: NodeKind::File,
            flags,
            children: Vec::new(),
        }))
    }

    fn manifest_path(&self, relative: &Path) -> String {
        format!("{}{}", self.prefix, to_manifest_path(relative))
    }
}

#[derive(Debug, Snafu)]
pub enum TreeError {
    #[snafu(display("Failed to read metadata of {}", path.best_effort_path_display()))]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to list directory {}", path.best_effort_path_display()))]
    ReadDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read file {}", path.best_effort_path_display()))]
    ReadFileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("{} is not a directory", path.best_effort_path_display()))]
    RootNotDirectory { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_OUTPUT_FILE_NAME, Profile};
    use rstest::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    fn classify(rules: &ManifestRules, root: &Path) -> Result<Option<ManifestNode>, TreeError> {
        TreeClassifier::new(rules, "").classify(root)
    }

    fn classify_tree(rules: &ManifestRules, root: &Path) -> ManifestNode {
        classify(rules, root)
            .expect("Classification failed")
            .expect("Root should survive")
    }

    fn find<'n>(node: &'n ManifestNode, name: &str) -> Option<&'n ManifestNode> {
        node.children.iter().find(|child| child.name == name)
    }

    fn child<'n>(node: &'n ManifestNode, name: &str) -> &'n ManifestNode {
        find(node, name).unwrap_or_else(|| panic!("{name} should survive under '{}'", node.path))
    }

    fn names(node: &ManifestNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[fixture]
    fn rules() -> ManifestRules {
        ManifestRules::for_profile(Profile::Assets, DEFAULT_OUTPUT_FILE_NAME)
    }

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp directory")
    }

    fn assert_sibling_order(node: &ManifestNode) {
        for pair in node.children.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                (a.kind, &a.name) <= (b.kind, &b.name),
                "{} should not precede {}",
                a.path,
                b.path
            );
        }
        node.children.iter().for_each(assert_sibling_order);
    }

    #[rstest]
    fn classify_prunes_filtered_files_and_empty_directories(
        rules: ManifestRules,
        temp_dir: TempDir,
    ) {
        write(temp_dir.path(), "a/keep.c", "int main() {}");
        write(temp_dir.path(), "a/skip.txt", "notes");
        fs::create_dir(temp_dir.path().join("b")).expect("Failed to create dir");

        let root = classify_tree(&rules, temp_dir.path());

        assert_eq!(root.kind, NodeKind::Directory);
        assert_eq!(root.path, "");
        assert_eq!(names(&root), vec!["a"]);
        let a = child(&root, "a");
        assert_eq!(a.kind, NodeKind::Directory);
        assert_eq!(a.path, "a");
        assert_eq!(names(a), vec!["keep.c"]);
        assert_eq!(a.children[0].path, "a/keep.c");
        assert_eq!(a.children[0].kind, NodeKind::File);
    }

    #[rstest]
    fn classify_returns_none_when_nothing_matches(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "readme.md", "# readme");
        write(temp_dir.path(), "nested/deeper/data.bin", "\0\0");

        let root = classify(&rules, temp_dir.path()).expect("Classification failed");

        assert!(root.is_none());
    }

    #[rstest]
    fn classify_returns_none_for_empty_root(rules: ManifestRules, temp_dir: TempDir) {
        let root = TreeClassifier::new(&rules, "prefix/")
            .classify(temp_dir.path())
            .expect("Classification failed");

        assert!(root.is_none());
    }

    #[rstest]
    fn classify_sorts_directories_before_files(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "z.c", "");
        write(temp_dir.path(), "a.h", "");
        write(temp_dir.path(), "y/one.c", "");
        write(temp_dir.path(), "b/two.c", "");
        write(temp_dir.path(), "B.png", "");
        write(temp_dir.path(), "b/c/three.c", "");
        write(temp_dir.path(), "b/a.c", "");

        let root = classify_tree(&rules, temp_dir.path());

        assert_eq!(names(&root), vec!["b", "y", "B.png", "a.h", "z.c"]);
        assert_eq!(names(child(&root, "b")), vec!["c", "a.c", "two.c"]);
        assert_sibling_order(&root);
    }

    #[rstest]
    #[case(DEFAULT_OUTPUT_FILE_NAME)]
    #[case(".DS_Store")]
    #[case("manifestor")]
    fn classify_never_includes_excluded_names(
        mut rules: ManifestRules,
        temp_dir: TempDir,
        #[case] excluded: &str,
    ) {
        rules.extensions.push(excluded.to_string());
        write(temp_dir.path(), excluded, "{}");
        write(temp_dir.path(), &format!("sub/{excluded}"), "{}");
        write(temp_dir.path(), "keep.c", "");

        let root = classify_tree(&rules, temp_dir.path());

        assert_eq!(names(&root), vec!["keep.c"]);
    }

    #[rstest]
    #[case("<tests>\n</tests>", Some("isTest"))]
    #[case("  \n<component name=\"x\"/>", Some("isComponent"))]
    #[case("\t<widget/>", Some("isWidget"))]
    #[case("<?xml version=\"1.0\"?><tests/>", None)]
    #[case("", None)]
    fn classify_sets_marker_flags(
        rules: ManifestRules,
        temp_dir: TempDir,
        #[case] content: &str,
        #[case] expected: Option<&str>,
    ) {
        write(temp_dir.path(), "view.xml", content);

        let root = classify_tree(&rules, temp_dir.path());

        let expected_flags: Vec<String> = expected.into_iter().map(String::from).collect();
        assert_eq!(child(&root, "view.xml").flags, expected_flags);
    }

    #[rstest]
    fn classify_only_sniffs_markup_files(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "fake.c", "<tests/>");
        write(temp_dir.path(), "logo.png", "<widget/>");

        let root = classify_tree(&rules, temp_dir.path());

        assert!(root.children.iter().all(|child| child.flags.is_empty()));
    }

    #[rstest]
    fn classify_tolerates_non_utf8_markup(rules: ManifestRules, temp_dir: TempDir) {
        let path = temp_dir.path().join("broken.xml");
        fs::write(path, [b' ', 0xff, b'<']).expect("Failed to write file");

        let root = classify_tree(&rules, temp_dir.path());

        assert!(child(&root, "broken.xml").flags.is_empty());
    }

    #[test]
    fn classify_uses_lvml_profile_markers() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let rules = ManifestRules::for_profile(Profile::Lvml, DEFAULT_OUTPUT_FILE_NAME);
        write(temp_dir.path(), "screens/main.lvml", "<component>");
        write(temp_dir.path(), "screens/test.lvml", "<tests>");
        write(temp_dir.path(), "screens/style.xml", "<widget>");

        let root = classify_tree(&rules, temp_dir.path());

        let screens = child(&root, "screens");
        assert_eq!(names(screens), vec!["main.lvml", "test.lvml"]);
        assert_eq!(child(screens, "main.lvml").flags, vec!["isComponent"]);
        assert!(child(screens, "test.lvml").flags.is_empty());
    }

    #[rstest]
    fn classify_prefixes_every_path(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "src/ui/view.xml", "");

        let root = TreeClassifier::new(&rules, "assets/")
            .classify(temp_dir.path())
            .expect("Classification failed")
            .expect("Root should survive");

        assert_eq!(root.path, "assets/");
        let src = child(&root, "src");
        assert_eq!(src.path, "assets/src");
        let view = child(child(src, "ui"), "view.xml");
        assert_eq!(view.path, "assets/src/ui/view.xml");
    }

    #[rstest]
    fn classify_names_root_after_directory(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "project/main.c", "");

        let root = classify_tree(&rules, &temp_dir.path().join("project"));

        assert_eq!(root.name, "project");
    }

    #[rstest]
    fn classify_rejects_file_root(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "main.c", "");

        let result = classify(&rules, &temp_dir.path().join("main.c"));

        assert!(matches!(result, Err(TreeError::RootNotDirectory { .. })));
    }

    #[rstest]
    fn classify_fails_on_missing_root(rules: ManifestRules, temp_dir: TempDir) {
        let result = classify(&rules, &temp_dir.path().join("missing"));

        assert!(matches!(result, Err(TreeError::MetadataError { .. })));
    }

    #[cfg(unix)]
    #[rstest]
    fn classify_aborts_on_broken_entry_below_root(rules: ManifestRules, temp_dir: TempDir) {
        write(temp_dir.path(), "a/keep.c", "");
        let dangling = temp_dir.path().join("a").join("dangling.c");
        std::os::unix::fs::symlink(temp_dir.path().join("gone.c"), &dangling)
            .expect("Failed to create symlink");

        let result = classify(&rules, temp_dir.path());

        match result {
            Err(TreeError::MetadataError { path, .. }) => assert_eq!(path, dangling),
            other => panic!("Expected MetadataError, got {other:?}"),
        }
    }

    #[rstest]
    fn node_serializes_flags_and_children_only_when_present(
        rules: ManifestRules,
        temp_dir: TempDir,
    ) {
        write(temp_dir.path(), "a/widget.xml", "<widget/>");
        write(temp_dir.path(), "a/plain.c", "");

        let root = classify_tree(&rules, temp_dir.path());
        let value = serde_json::to_value(&root).expect("Serialization failed");

        let a = &value["children"][0];
        assert_eq!(a["type"], "directory");
        let plain = &a["children"][0];
        assert_eq!(plain["name"], "plain.c");
        assert_eq!(plain["type"], "file");
        assert!(plain.get("children").is_none());
        assert!(plain.get("isWidget").is_none());
        let widget = &a["children"][1];
        assert_eq!(widget["isWidget"], true);
        assert!(widget.get("isTest").is_none());
    }
}
