//! Chart loading and template discovery
//!
//! A chart is a directory holding a `Chart.yaml` manifest and a
//! `templates/` tree. Files under `templates/` whose name starts with `_`
//! are helper libraries (named define blocks) and are never rendered on
//! their own; everything else except `NOTES.txt` is a rendered template.

use crate::result::{ChartcovError, ChartcovResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manifest file name at the chart root
pub const MANIFEST_FILE: &str = "Chart.yaml";

/// Templates subtree name at the chart root
pub const TEMPLATES_DIR: &str = "templates";

/// Rendered after install only; never part of the renderer's output
const NOTES_FILE: &str = "NOTES.txt";

/// Subset of `Chart.yaml` the reports need
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartManifest {
    /// Chart name
    pub name: String,
    /// Chart version
    pub version: Option<String>,
    /// Human description
    pub description: Option<String>,
}

/// How a template file participates in a render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Rendered once per render into its own output document
    Template,
    /// Library of define blocks, only reached through `include`/`template`
    Helper,
}

impl FileKind {
    /// Classify a file by its name
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        if name.starts_with('_') {
            Self::Helper
        } else {
            Self::Template
        }
    }

    /// Trace collection label for this kind
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Template => "files",
            Self::Helper => "helpers",
        }
    }
}

/// One file under `templates/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Chart-relative path with `/` separators, e.g. `templates/deployment.yaml`
    pub relative_path: String,
    /// Absolute (or caller-relative) location on disk
    pub path: PathBuf,
    /// Template or helper
    pub kind: FileKind,
}

/// A loaded chart: validated root, manifest and template inventory
#[derive(Debug, Clone)]
pub struct Chart {
    root: PathBuf,
    manifest: ChartManifest,
    files: Vec<TemplateFile>,
}

impl Chart {
    /// Validate and load a chart rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns [`ChartcovError::ManifestMissing`] or
    /// [`ChartcovError::TemplatesMissing`] before anything else is read.
    pub fn load(root: impl AsRef<Path>) -> ChartcovResult<Self> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(ChartcovError::ManifestMissing {
                path: manifest_path.display().to_string(),
            });
        }
        let templates = root.join(TEMPLATES_DIR);
        if !templates.is_dir() {
            return Err(ChartcovError::TemplatesMissing {
                path: templates.display().to_string(),
            });
        }

        let manifest = Self::read_manifest(&manifest_path)?;
        let files = Self::discover_files(&root)?;
        tracing::debug!(
            chart = %manifest.name,
            files = files.len(),
            "loaded chart"
        );

        Ok(Self {
            root,
            manifest,
            files,
        })
    }

    fn read_manifest(path: &Path) -> ChartcovResult<ChartManifest> {
        let content = std::fs::read_to_string(path)?;
        let invalid = |message: String| ChartcovError::InvalidManifest {
            path: path.display().to_string(),
            message,
        };
        let doc: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        if !doc.is_mapping() && !doc.is_null() {
            return Err(invalid("manifest is not a mapping".to_string()));
        }

        let mut manifest = ChartManifest {
            name: doc.get("name").and_then(scalar_string).unwrap_or_default(),
            version: doc.get("version").and_then(scalar_string),
            description: doc.get("description").and_then(scalar_string),
        };
        if manifest.name.is_empty() {
            manifest.name = path
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(manifest)
    }

    fn discover_files(root: &Path) -> ChartcovResult<Vec<TemplateFile>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root.join(TEMPLATES_DIR)).sort_by_file_name() {
            let entry = entry.map_err(|e| ChartcovError::workspace(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name == NOTES_FILE {
                continue;
            }
            let kind = FileKind::from_file_name(&name);
            let relative_path = relative_slash_path(root, entry.path());
            files.push(TemplateFile {
                relative_path,
                path: entry.path().to_path_buf(),
                kind,
            });
        }
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Chart root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed manifest
    #[must_use]
    pub fn manifest(&self) -> &ChartManifest {
        &self.manifest
    }

    /// Chart name from the manifest
    #[must_use]
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Every template and helper file, sorted by relative path
    #[must_use]
    pub fn files(&self) -> &[TemplateFile] {
        &self.files
    }

    /// Files selected for instrumentation
    ///
    /// Helpers are always selected. Template files are selected when no
    /// filter is given or when any filter matches (see [`path_matches`]).
    #[must_use]
    pub fn selected_files(&self, filters: &[String]) -> Vec<&TemplateFile> {
        self.files
            .iter()
            .filter(|f| f.kind == FileKind::Helper || filters_match(&f.relative_path, filters))
            .collect()
    }
}

/// True when `filters` is empty or any filter matches `relative_path`
#[must_use]
pub fn filters_match(relative_path: &str, filters: &[String]) -> bool {
    filters.is_empty() || filters.iter().any(|f| path_matches(relative_path, f))
}

/// Selection rule for a single filter
///
/// Matches when the path equals the filter, starts with it, or ends with it
/// as a whole path segment (`deployment.yaml` matches
/// `templates/deployment.yaml` but not `templates/mydeployment.yaml`).
#[must_use]
pub fn path_matches(relative_path: &str, filter: &str) -> bool {
    let filter = filter.trim_start_matches("./").trim_end_matches('/');
    if filter.is_empty() {
        return false;
    }
    relative_path == filter
        || relative_path.starts_with(filter)
        || relative_path.ends_with(&format!("/{filter}"))
}

/// Scalar manifest value as text (`version: 1.0` parses as a float)
fn scalar_string(value: &serde_yaml_ng::Value) -> Option<String> {
    match value {
        serde_yaml_ng::Value::String(s) => Some(s.clone()),
        serde_yaml_ng::Value::Number(n) => Some(n.to_string()),
        serde_yaml_ng::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Path of `path` relative to `root`, joined with `/`
pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_chart(dir: &Path) {
        fs::write(dir.join(MANIFEST_FILE), "apiVersion: v2\nname: demo\nversion: 0.1.0\n").unwrap();
        let templates = dir.join(TEMPLATES_DIR);
        fs::create_dir_all(templates.join("sub")).unwrap();
        fs::write(templates.join("deployment.yaml"), "kind: Deployment\n").unwrap();
        fs::write(templates.join("_helpers.tpl"), "{{ define \"x\" }}{{ end }}\n").unwrap();
        fs::write(templates.join("NOTES.txt"), "thanks\n").unwrap();
        fs::write(templates.join("sub").join("svc.yaml"), "kind: Service\n").unwrap();
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_load_valid_chart() {
            let temp = TempDir::new().unwrap();
            write_chart(temp.path());

            let chart = Chart::load(temp.path()).unwrap();
            assert_eq!(chart.name(), "demo");
            assert_eq!(chart.manifest().version.as_deref(), Some("0.1.0"));

            let paths: Vec<_> = chart.files().iter().map(|f| f.relative_path.as_str()).collect();
            assert_eq!(
                paths,
                vec![
                    "templates/_helpers.tpl",
                    "templates/deployment.yaml",
                    "templates/sub/svc.yaml"
                ]
            );
        }

        #[test]
        fn test_notes_are_skipped() {
            let temp = TempDir::new().unwrap();
            write_chart(temp.path());
            let chart = Chart::load(temp.path()).unwrap();
            assert!(chart.files().iter().all(|f| !f.relative_path.ends_with("NOTES.txt")));
        }

        #[test]
        fn test_helper_classification() {
            let temp = TempDir::new().unwrap();
            write_chart(temp.path());
            let chart = Chart::load(temp.path()).unwrap();
            let helper = chart
                .files()
                .iter()
                .find(|f| f.relative_path.ends_with("_helpers.tpl"))
                .unwrap();
            assert_eq!(helper.kind, FileKind::Helper);
        }

        #[test]
        fn test_missing_manifest_is_fatal() {
            let temp = TempDir::new().unwrap();
            fs::create_dir_all(temp.path().join(TEMPLATES_DIR)).unwrap();
            let err = Chart::load(temp.path()).unwrap_err();
            assert!(matches!(err, ChartcovError::ManifestMissing { .. }));
        }

        #[test]
        fn test_missing_templates_is_fatal() {
            let temp = TempDir::new().unwrap();
            fs::write(temp.path().join(MANIFEST_FILE), "name: demo\n").unwrap();
            let err = Chart::load(temp.path()).unwrap_err();
            assert!(matches!(err, ChartcovError::TemplatesMissing { .. }));
        }

        #[test]
        fn test_invalid_manifest() {
            let temp = TempDir::new().unwrap();
            write_chart(temp.path());
            fs::write(temp.path().join(MANIFEST_FILE), "name: [unclosed\n").unwrap();
            let err = Chart::load(temp.path()).unwrap_err();
            assert!(matches!(err, ChartcovError::InvalidManifest { .. }));
        }

        #[test]
        fn test_numeric_version_is_accepted() {
            let temp = TempDir::new().unwrap();
            write_chart(temp.path());
            fs::write(temp.path().join(MANIFEST_FILE), "name: demo\nversion: 1.0\n").unwrap();
            let chart = Chart::load(temp.path()).unwrap();
            assert_eq!(chart.manifest().version.as_deref(), Some("1.0"));
        }

        #[test]
        fn test_nameless_manifest_uses_directory_name() {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("my-chart");
            fs::create_dir_all(&root).unwrap();
            write_chart(&root);
            fs::write(root.join(MANIFEST_FILE), "version: 1.0.0\n").unwrap();
            let chart = Chart::load(&root).unwrap();
            assert_eq!(chart.name(), "my-chart");
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_exact_match() {
            assert!(path_matches("templates/cm.yaml", "templates/cm.yaml"));
        }

        #[test]
        fn test_prefix_match() {
            assert!(path_matches("templates/sub/svc.yaml", "templates/sub"));
            assert!(path_matches("templates/sub/svc.yaml", "templates/sub/"));
        }

        #[test]
        fn test_segment_suffix_match() {
            assert!(path_matches("templates/sub/svc.yaml", "svc.yaml"));
            assert!(path_matches("templates/sub/svc.yaml", "sub/svc.yaml"));
            assert!(!path_matches("templates/sub/mysvc.yaml", "svc.yaml"));
        }

        #[test]
        fn test_empty_filter_never_matches() {
            assert!(!path_matches("templates/cm.yaml", ""));
        }

        #[test]
        fn test_no_filters_selects_all() {
            assert!(filters_match("templates/cm.yaml", &[]));
        }

        #[test]
        fn test_helpers_always_selected() {
            let temp = TempDir::new().unwrap();
            write_chart(temp.path());
            let chart = Chart::load(temp.path()).unwrap();
            let selected = chart.selected_files(&["svc.yaml".to_string()]);
            let paths: Vec<_> = selected.iter().map(|f| f.relative_path.as_str()).collect();
            assert_eq!(paths, vec!["templates/_helpers.tpl", "templates/sub/svc.yaml"]);
        }
    }

    #[test]
    fn test_file_kind_collection() {
        assert_eq!(FileKind::Template.collection(), "files");
        assert_eq!(FileKind::Helper.collection(), "helpers");
    }
}
