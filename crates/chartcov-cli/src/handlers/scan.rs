//! Scan command handler

use crate::commands::{ScanArgs, ScanFormatArg};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use chartcov::{
    AddressMode, Chart, CoverageConfig, CoverageEngine, Discovery, FileKind, HelmRenderer,
};
use serde::Serialize;
use std::fmt::Write;

/// One branch in the JSON listing
#[derive(Debug, Serialize)]
pub struct ScanEntry<'a> {
    /// Identifier in the selected addressing mode
    pub id: String,
    /// Chart-relative file
    pub file: &'a str,
    /// Template or helper
    pub kind: FileKind,
    /// Enclosing define block
    pub define: Option<&'a str>,
    /// First line of the arm
    pub start_line: usize,
    /// Last line of the arm
    pub end_line: usize,
    /// Line of the owning conditional
    pub decision_line: usize,
}

/// Execute the scan command
pub fn execute_scan(config: &CliConfig, args: &ScanArgs) -> CliResult<()> {
    let chart = Chart::load(&args.chart)?;
    let coverage_config = CoverageConfig::builder()
        .filters(args.filters.clone())
        .build();
    // Discovery never spawns the renderer.
    let engine = CoverageEngine::new(chart, coverage_config, HelmRenderer::new())?;
    let discovery = engine.discover()?;

    let reporter = ProgressReporter::new(config.use_color(), config.verbosity.is_quiet());
    reporter.scan_notes(&discovery.notes);

    print!(
        "{}",
        render_scan(&discovery, args.address_mode(), args.format)?
    );

    reporter.info(&format!(
        "{} branches in {} files",
        discovery.branches.len(),
        discovery.files.len()
    ));
    Ok(())
}

/// Render the branch listing
pub fn render_scan(
    discovery: &Discovery,
    mode: AddressMode,
    format: ScanFormatArg,
) -> CliResult<String> {
    match format {
        ScanFormatArg::Text => {
            let mut out = String::new();
            for branch in discovery.branches.iter() {
                let _ = writeln!(out, "{}", branch.address(mode));
            }
            Ok(out)
        }
        ScanFormatArg::Json => {
            let entries: Vec<ScanEntry<'_>> = discovery
                .branches
                .iter()
                .map(|branch| ScanEntry {
                    id: branch.address(mode).to_string(),
                    file: &branch.file,
                    kind: branch.kind,
                    define: branch.define.as_deref(),
                    start_line: branch.start_line,
                    end_line: branch.end_line,
                    decision_line: branch.decision_line,
                })
                .collect();
            let mut json = serde_json::to_string_pretty(&entries)
                .map_err(|e| CliError::report_generation(e.to_string()))?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
kind: ConfigMap
{{- if .Values.a }}
a: 1
{{- else }}
a: 2
{{- end }}
";

    const HELPER: &str = "\
{{- define \"app.name\" -}}
{{- if .Values.nameOverride }}
{{ .Values.nameOverride }}
{{- end }}
{{- end }}
";

    fn discover() -> (TempDir, Discovery) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("Chart.yaml"), "name: app\nversion: 0.1.0\n").unwrap();
        fs::write(dir.path().join("templates/cm.yaml"), TEMPLATE).unwrap();
        fs::write(dir.path().join("templates/_helpers.tpl"), HELPER).unwrap();
        let chart = Chart::load(dir.path()).unwrap();
        let engine =
            CoverageEngine::new(chart, CoverageConfig::default(), HelmRenderer::new()).unwrap();
        let discovery = engine.discover().unwrap();
        (dir, discovery)
    }

    #[test]
    fn test_text_point_listing() {
        let (_dir, discovery) = discover();
        let text = render_scan(&discovery, AddressMode::Point, ScanFormatArg::Text).unwrap();
        assert!(text.contains("templates/cm.yaml:L4\n"));
        assert!(text.contains("templates/cm.yaml:L6\n"));
        assert!(text.contains("templates/_helpers.tpl:app.name:L4\n"));
    }

    #[test]
    fn test_text_range_listing() {
        let (_dir, discovery) = discover();
        let text = render_scan(&discovery, AddressMode::Range, ScanFormatArg::Text).unwrap();
        assert!(text.contains("templates/cm.yaml:L2-L3\n"));
        assert!(text.contains("templates/cm.yaml:L4-L5\n"));
    }

    #[test]
    fn test_json_listing() {
        let (_dir, discovery) = discover();
        let json = render_scan(&discovery, AddressMode::Point, ScanFormatArg::Json).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), discovery.branches.len());

        let helper = entries
            .iter()
            .find(|e| e["kind"] == "helper")
            .expect("helper branch listed");
        assert_eq!(helper["define"], "app.name");

        let else_arm = entries
            .iter()
            .find(|e| e["id"] == "templates/cm.yaml:L6")
            .expect("else arm listed");
        assert_eq!(else_arm["decision_line"], 2);
        assert_eq!(else_arm["start_line"], 4);
        assert_eq!(else_arm["end_line"], 5);
    }

    #[test]
    fn test_empty_listing() {
        let discovery = Discovery::default();
        let text = render_scan(&discovery, AddressMode::Point, ScanFormatArg::Text).unwrap();
        assert!(text.is_empty());
        let json = render_scan(&discovery, AddressMode::Point, ScanFormatArg::Json).unwrap();
        assert_eq!(json, "[]\n");
    }
}
