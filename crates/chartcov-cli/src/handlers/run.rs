//! Run command handler

use crate::commands::{ReportFormatArg, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::handlers::values::expand_values;
use crate::output::{abort_line, ProgressReporter};
use chartcov::{
    Chart, CoberturaFormatter, CoverageConfig, CoverageEngine, CoverageReport, CoverageSummary,
    HelmRenderer, JsonFormatter, Renderer, ReportFormat, RunEvent, TextFormatter,
};
use std::path::Path;

/// Execute the run command against the configured renderer binary
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let renderer = HelmRenderer::new().with_program(&args.helm);
    execute_run_with(config, args, renderer)
}

/// Execute the run command with an explicit renderer
pub fn execute_run_with<R: Renderer>(
    config: &CliConfig,
    args: &RunArgs,
    renderer: R,
) -> CliResult<()> {
    let inputs = expand_values(&args.values)?;
    let chart = Chart::load(&args.chart)?;
    let source = chart.root().display().to_string();

    let coverage_config = CoverageConfig::builder()
        .filters(args.filters.clone())
        .extra_args(args.extra_args.clone())
        .build();
    let engine = CoverageEngine::new(chart, coverage_config, renderer)?;

    let mut reporter = ProgressReporter::new(config.use_color(), config.verbosity.is_quiet());
    let verbose = config.verbosity.is_verbose();
    let chart_name = engine.chart().name().to_string();
    let mut total = inputs.len();
    let mut completed = 0;

    let outcome = engine.run_with_progress(&inputs, |event| match event {
        RunEvent::Instrumented {
            branches,
            runs,
            notes,
        } => {
            total = runs;
            reporter.scan_notes(&notes);
            reporter.info(&format!(
                "Instrumented {chart_name} ({branches} branches), rendering {runs} run(s)"
            ));
            reporter.start_progress(runs as u64, "rendering");
        }
        RunEvent::RunStarted { label, .. } => reporter.set_message(&label),
        RunEvent::RunFinished { label, covered, .. } => {
            completed += 1;
            if verbose {
                reporter.info(&format!("{label}: {covered} branch(es) covered"));
            }
            reporter.increment(1);
        }
    });

    let report = match outcome {
        Ok(report) => {
            reporter.finish();
            report
        }
        Err(e) => {
            reporter.abandon();
            reporter.failure(&abort_line(completed, total));
            return Err(e.into());
        }
    };

    let rendered = render_report(
        &report,
        args.format.into(),
        args.show_uncovered,
        Some(&source),
    )?;

    let summary = report.summary();
    match args.output {
        Some(ref path) => {
            write_report(path, &rendered)?;
            reporter.success(&format!("Report written to {}", path.display()));
            reporter.coverage_summary(&summary);
        }
        None => {
            print!("{rendered}");
            if args.format != ReportFormatArg::Text {
                reporter.coverage_summary(&summary);
            }
        }
    }

    check_threshold(&summary, args.fail_under)
}

/// Render a report in the requested format
///
/// The per-run breakdown is included in text output whenever more than one
/// run contributed.
pub fn render_report(
    report: &CoverageReport,
    format: ReportFormat,
    show_uncovered: bool,
    source: Option<&str>,
) -> CliResult<String> {
    match format {
        ReportFormat::Text => Ok(TextFormatter::new(report)
            .with_uncovered(show_uncovered)
            .with_runs(report.runs().len() > 1)
            .generate()),
        ReportFormat::Json => {
            let mut json = JsonFormatter::new(report)
                .generate()
                .map_err(|e| CliError::report_generation(e.to_string()))?;
            json.push('\n');
            Ok(json)
        }
        ReportFormat::Xml => {
            let mut formatter = CoberturaFormatter::new(report);
            if let Some(source) = source {
                formatter = formatter.with_source(source);
            }
            Ok(formatter.generate())
        }
    }
}

fn write_report(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
        .map_err(|e| CliError::report_generation(format!("{}: {e}", path.display())))
}

/// Enforce `--fail-under`
///
/// A chart with no branches has no percentage and never fails.
pub fn check_threshold(summary: &CoverageSummary, threshold: Option<f64>) -> CliResult<()> {
    let (Some(threshold), Some(actual)) = (threshold, summary.coverage_percent) else {
        return Ok(());
    };
    if actual < threshold {
        return Err(CliError::CoverageBelowThreshold { actual, threshold });
    }
    Ok(())
}
