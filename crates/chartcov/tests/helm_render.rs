//! Rendering instrumented charts with a real `helm` binary
//!
//! Every test returns early when `helm` is not on `PATH`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chartcov::coverage::SENTINEL_PREFIX;
use chartcov::{
    BranchId, Chart, CoverageConfig, CoverageEngine, FileKind, HelmRenderer, RenderRequest,
    Renderer, ValuesInput,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TOGGLE: &str = "\
{{- if .Values.enabled }}
a: 1
{{- else }}
a: 2
{{- end }}
apiVersion: v1
kind: ConfigMap
metadata:
  name: toggle
";

const HELPERS: &str = "\
{{- define \"x\" -}}
{{- if true }}
hit: yes
{{- end }}
{{- end }}
";

const CALLER: &str = "\
{{- if eq .Values.mode \"root\" }}
h: {{ include \"x\" . }}
{{- else if eq .Values.mode \"wrapped\" }}
h: {{ include \"x\" (dict \"context\" $) }}
{{- else }}
h: {{ include \"x\" \"str\" }}
{{- end }}
apiVersion: v1
kind: ConfigMap
metadata:
  name: caller
";

fn helm() -> Option<HelmRenderer> {
    let helm = HelmRenderer::new();
    if helm.is_available() {
        Some(helm)
    } else {
        eprintln!("helm not found on PATH, skipping");
        None
    }
}

fn chart_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("templates")).unwrap();
    fs::write(
        dir.path().join("Chart.yaml"),
        "apiVersion: v2\nname: app\nversion: 0.1.0\n",
    )
    .unwrap();
    fs::write(dir.path().join("values.yaml"), "enabled: false\nmode: root\n").unwrap();
    for (path, content) in files {
        fs::write(dir.path().join(path), content).unwrap();
    }
    dir
}

fn values(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn engine(chart: &TempDir, helm: HelmRenderer) -> CoverageEngine<HelmRenderer> {
    let chart = Chart::load(chart.path()).unwrap();
    CoverageEngine::new(chart, CoverageConfig::default(), helm).unwrap()
}

fn render(helm: &HelmRenderer, chart_dir: &Path, values: Option<&Path>) -> String {
    let out = helm
        .render(&RenderRequest {
            chart_dir,
            values,
            extra_args: &[],
        })
        .unwrap();
    assert!(out.is_success(), "helm failed: {}", out.diagnostic());
    out.stdout
}

/// Rendered lines with sentinels and blank lines removed
fn content_lines(rendered: &str) -> Vec<&str> {
    rendered
        .lines()
        .filter(|l| !l.contains(SENTINEL_PREFIX) && !l.trim().is_empty())
        .collect()
}

// =============================================================================
// Toggle chart
// =============================================================================

#[test]
fn test_enabled_covers_only_if_arm() {
    let Some(helm) = helm() else { return };
    let chart = chart_with(&[("templates/cm.yaml", TOGGLE)]);
    let inputs = TempDir::new().unwrap();
    let enabled = values(inputs.path(), "enabled.yaml", "enabled: true\n");

    let report = engine(&chart, helm).run(&[ValuesInput::file(enabled)]).unwrap();

    let covered: Vec<&str> = report.covered().iter().map(BranchId::as_str).collect();
    assert_eq!(covered, ["templates/cm.yaml:L3"]);
    assert_eq!(report.summary().total_branches, 2);
}

#[test]
fn test_both_values_cover_every_arm() {
    let Some(helm) = helm() else { return };
    let chart = chart_with(&[("templates/cm.yaml", TOGGLE)]);
    let inputs = TempDir::new().unwrap();
    let enabled = values(inputs.path(), "enabled.yaml", "enabled: true\n");
    let disabled = values(inputs.path(), "disabled.yaml", "enabled: false\n");

    let report = engine(&chart, helm)
        .run(&[ValuesInput::file(enabled), ValuesInput::file(disabled)])
        .unwrap();

    let summary = report.summary();
    assert_eq!(summary.covered_branches, 2);
    assert_eq!(summary.total_branches, 2);
    assert_eq!(summary.coverage_percent, Some(100.0));
}

#[test]
fn test_instrumented_output_matches_original() {
    let Some(helm) = helm() else { return };
    let chart = chart_with(&[
        ("templates/cm.yaml", TOGGLE),
        ("templates/_helpers.tpl", HELPERS),
        ("templates/caller.yaml", CALLER),
    ]);
    let inputs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("instrumented");
    engine(&chart, helm.clone()).instrument_into(&dest).unwrap();

    for content in [
        "enabled: true\nmode: root\n",
        "enabled: false\nmode: wrapped\n",
        "enabled: true\nmode: str\n",
    ] {
        let file = values(inputs.path(), "values.yaml", content);
        let original = render(&helm, chart.path(), Some(&file));
        let instrumented = render(&helm, &dest, Some(&file));

        assert!(!original.contains(SENTINEL_PREFIX));
        assert!(instrumented.contains(SENTINEL_PREFIX));
        assert_eq!(content_lines(&instrumented), content_lines(&original));
    }
}

// =============================================================================
// Helper contexts
// =============================================================================

fn helper_coverage(mode: &str) -> (usize, Vec<String>) {
    let helm = helm().expect("checked by caller");
    let chart = chart_with(&[
        ("templates/_helpers.tpl", HELPERS),
        ("templates/caller.yaml", CALLER),
    ]);
    let inputs = TempDir::new().unwrap();
    let file = values(inputs.path(), "mode.yaml", &format!("mode: {mode}\n"));

    let engine = engine(&chart, helm);
    let discovered = engine
        .discover()
        .unwrap()
        .branches
        .iter()
        .filter(|b| b.kind == FileKind::Helper)
        .count();
    let report = engine.run(&[ValuesInput::file(file)]).unwrap();
    let covered = report
        .covered_of_kind(FileKind::Helper)
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect();
    (discovered, covered)
}

#[test]
fn test_helper_called_with_root_context() {
    if helm().is_none() {
        return;
    }
    let (discovered, covered) = helper_coverage("root");
    assert!(discovered > 0);
    assert_eq!(covered.len(), discovered);
    assert!(covered.contains(&"templates/_helpers.tpl:x:L4".to_string()));
}

#[test]
fn test_helper_called_with_wrapped_context() {
    if helm().is_none() {
        return;
    }
    let (discovered, covered) = helper_coverage("wrapped");
    assert_eq!(covered.len(), discovered);
    assert!(covered.contains(&"templates/_helpers.tpl:x:L4".to_string()));
}

#[test]
fn test_helper_called_with_string_records_nothing() {
    if helm().is_none() {
        return;
    }
    let (discovered, covered) = helper_coverage("str");
    assert!(discovered > 0);
    assert!(covered.is_empty());
}
