//! Cross-module coverage tests: collector sessions, report aggregation and
//! the set-level properties of discovery and union.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use super::*;
use crate::chart::FileKind;
use std::collections::BTreeSet;

/// Report over `total` template branches (`templates/t.yaml:L2`, `:L3`, ...)
/// with one run per entry of `runs`, each covering the given indices
pub(crate) fn fixture_report(total: usize, runs: &[&[usize]]) -> CoverageReport {
    let mut index = BranchIndex::new();
    index.extend(fixture_branches(total));
    let mut report = CoverageReport::new("fixture", index);
    for (n, covered) in runs.iter().enumerate() {
        report.add_run(fixture_run(&format!("run-{}", n + 1), covered));
    }
    report
}

fn fixture_branches(total: usize) -> Vec<Branch> {
    let descriptors = (0..total)
        .map(|i| BranchDescriptor {
            trigger: Trigger::End,
            define: None,
            token_line: i + 2,
            column: 0,
            occurrence: 1,
            start_line: i + 1,
            end_line: i + 1,
            decision_line: i + 1,
            trim_left: false,
        })
        .collect();
    MarkerAllocator::new().allocate("templates/t.yaml", FileKind::Template, descriptors)
}

fn fixture_run(label: &str, covered: &[usize]) -> RunCoverage {
    let mut run = RunCoverage::new(label);
    for i in covered {
        run.covered
            .insert(BranchId::new(format!("templates/t.yaml:L{}", i + 2)));
    }
    run
}

fn trace(files: &[&str], helpers: &[&str]) -> ExecutedTrace {
    ExecutedTrace {
        files: files.iter().map(|s| BranchId::from(*s)).collect(),
        helpers: helpers.iter().map(|s| BranchId::from(*s)).collect(),
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoverageConfig::default();
        assert!(config.filters.is_empty());
        assert!(config.extra_args.is_empty());
        assert_eq!(config.wrapper_keys, ["context", "root", "ctx", "top"]);
        assert_eq!(config.dynamic_functions, ["tpl", "printf", "print", "println"]);
    }

    #[test]
    fn test_builder() {
        let config = CoverageConfig::builder()
            .filter("templates/a.yaml")
            .filter("b.yaml")
            .extra_args(vec!["--set".to_string(), "x=1".to_string()])
            .wrapper_keys(vec!["scope".to_string()])
            .dynamic_functions(vec![])
            .build();
        assert_eq!(config.filters, ["templates/a.yaml", "b.yaml"]);
        assert_eq!(config.extra_args.len(), 2);
        assert_eq!(config.wrapper_keys, ["scope"]);
        assert!(config.dynamic_functions.is_empty());
    }
}

mod collector_tests {
    use super::*;

    fn collector() -> CoverageCollector {
        let mut index = BranchIndex::new();
        index.extend(fixture_branches(3));
        CoverageCollector::new(index)
    }

    #[test]
    fn test_session_lifecycle() {
        let mut c = collector();
        assert!(!c.is_session_active());
        c.begin_session("app");
        assert!(c.is_session_active());
        c.begin_run("a.yaml");
        assert!(c.is_run_active());
        assert_eq!(c.record_trace(&trace(&["templates/t.yaml:L2"], &[])), 1);
        c.end_run();
        assert!(!c.is_run_active());
        let report = c.end_session();
        assert!(!c.is_session_active());
        assert_eq!(report.chart(), "app");
        assert_eq!(report.runs().len(), 1);
        assert_eq!(report.covered().len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut c = collector();
        c.begin_session("app");
        c.begin_run("a.yaml");
        let added = c.record_trace(&trace(
            &["templates/t.yaml:L3", "templates/gone.yaml:L1"],
            &["templates/_h.tpl:x:L1"],
        ));
        assert_eq!(added, 1);
        assert_eq!(c.current_covered().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let mut c = collector();
        c.begin_session("app");
        c.begin_run("a.yaml");
        assert_eq!(c.record_trace(&trace(&["templates/t.yaml:L2"], &[])), 1);
        assert_eq!(c.record_trace(&trace(&["templates/t.yaml:L2"], &[])), 0);
    }

    #[test]
    fn test_trace_outside_run_is_ignored() {
        let mut c = collector();
        c.begin_session("app");
        assert_eq!(c.record_trace(&trace(&["templates/t.yaml:L2"], &[])), 0);
    }

    #[test]
    fn test_end_session_closes_open_run() {
        let mut c = collector();
        c.begin_session("app");
        c.begin_run("a.yaml");
        let _ = c.record_trace(&trace(&["templates/t.yaml:L4"], &[]));
        let report = c.end_session();
        assert_eq!(report.runs().len(), 1);
        assert!(report.is_covered(&BranchId::from("templates/t.yaml:L4")));
    }

    #[test]
    fn test_abort_discards_runs() {
        let mut c = collector();
        c.begin_session("app");
        c.begin_run("a.yaml");
        let _ = c.record_trace(&trace(&["templates/t.yaml:L2"], &[]));
        c.end_run();
        c.abort_session();
        let report = c.end_session();
        assert!(report.runs().is_empty());
        assert!(report.covered().is_empty());
    }
}

mod report_tests {
    use super::*;

    #[test]
    fn test_percent_and_summary() {
        let report = fixture_report(4, &[&[0], &[0, 2]]);
        let summary = report.summary();
        assert_eq!(summary.total_branches, 4);
        assert_eq!(summary.covered_branches, 2);
        assert_eq!(summary.coverage_percent, Some(50.0));
        assert_eq!(summary.file_branches_total, 4);
        assert_eq!(summary.file_branches_covered, 2);
        assert_eq!(summary.helper_branches_total, 0);
        assert_eq!(summary.uncovered_branches(), 2);
        assert_eq!(summary.status(), Some(CoverageStatus::Partial));
    }

    #[test]
    fn test_zero_branches_has_no_percent() {
        let report = fixture_report(0, &[&[]]);
        assert_eq!(report.coverage_percent(), None);
        assert_eq!(report.summary().status(), None);
    }

    #[test]
    fn test_zero_covered_is_zero_percent() {
        let report = fixture_report(2, &[&[]]);
        assert_eq!(report.coverage_percent(), Some(0.0));
        assert_eq!(report.summary().status(), Some(CoverageStatus::Low));
    }

    #[test]
    fn test_uncovered_complement() {
        let report = fixture_report(3, &[&[1]]);
        let uncovered: Vec<&str> = report.uncovered().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(uncovered, ["templates/t.yaml:L2", "templates/t.yaml:L4"]);
    }

    #[test]
    fn test_add_run_drops_undiscovered() {
        let mut report = fixture_report(1, &[]);
        let mut run = RunCoverage::new("x");
        run.covered.insert(BranchId::from("templates/other.yaml:L9"));
        report.add_run(run);
        assert!(report.covered().is_empty());
        assert!(report.runs()[0].covered.is_empty());
    }

    #[test]
    fn test_merge_unions_runs() {
        let mut a = fixture_report(3, &[&[0]]);
        let b = fixture_report(3, &[&[2]]);
        a.merge(&b);
        assert_eq!(a.runs().len(), 2);
        assert_eq!(a.covered().len(), 2);
        assert_eq!(a.discovered().len(), 3);
    }

    #[test]
    fn test_covered_of_kind_splits_helpers() {
        let helpers = MarkerAllocator::new().allocate(
            "templates/_h.tpl",
            FileKind::Helper,
            vec![BranchDescriptor {
                trigger: Trigger::End,
                define: Some("app.name".to_string()),
                token_line: 3,
                column: 0,
                occurrence: 1,
                start_line: 1,
                end_line: 2,
                decision_line: 1,
                trim_left: false,
            }],
        );
        let mut index = BranchIndex::new();
        index.extend(fixture_branches(1));
        index.extend(helpers);
        let mut report = CoverageReport::new("app", index);
        let mut run = RunCoverage::new("r");
        run.covered.insert(BranchId::from("templates/_h.tpl:app.name:L3"));
        report.add_run(run);

        assert_eq!(report.covered_of_kind(FileKind::Helper).len(), 1);
        assert!(report.covered_of_kind(FileKind::Template).is_empty());
        assert_eq!(report.summary().helper_branches_covered, 1);
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(CoverageStatus::from_percent(100.0), CoverageStatus::Full);
        assert_eq!(CoverageStatus::from_percent(50.0), CoverageStatus::Partial);
        assert_eq!(CoverageStatus::from_percent(49.9), CoverageStatus::Low);
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    const FRAGMENTS: &[&str] = &[
        "{{- if .Values.a }}",
        "{{- with .Values.b }}",
        "{{- range .Values.c }}",
        "{{- else if .Values.d }}",
        "{{- else }}",
        "{{- end }}",
        "a: {{ if .x }}1{{ else }}2{{ end }}",
        "b: {{ tpl \"{{ if .y }}y{{ end }}\" . }}",
        "plain: text",
        "{{- define \"helper\" }}",
    ];

    fn chart_source() -> impl Strategy<Value = String> {
        prop::collection::vec(0..FRAGMENTS.len(), 0..40)
            .prop_map(|picks| picks.iter().map(|&i| FRAGMENTS[i]).collect::<Vec<_>>().join("\n"))
    }

    fn ids_of(source: &str) -> Vec<BranchId> {
        let scanner = BlockScanner::new(&["tpl".to_string()]).unwrap();
        let outcome = scanner.scan("templates/p.yaml", source);
        MarkerAllocator::new()
            .allocate("templates/p.yaml", FileKind::Template, outcome.descriptors)
            .into_iter()
            .map(|b| b.id)
            .collect()
    }

    proptest! {
        #[test]
        fn prop_rescan_is_deterministic(source in chart_source()) {
            let first = ids_of(&source);
            let second = ids_of(&source);
            prop_assert_eq!(&first, &second);
            let unique: BTreeSet<_> = first.iter().collect();
            prop_assert_eq!(unique.len(), first.len());
        }

        #[test]
        fn prop_injection_preserves_source(source in chart_source()) {
            let scanner = BlockScanner::new(&["tpl".to_string()]).unwrap();
            let outcome = scanner.scan("templates/p.yaml", &source);
            let branches = MarkerAllocator::new()
                .allocate("templates/p.yaml", FileKind::Template, outcome.descriptors);
            let refs: Vec<&Branch> = branches.iter().collect();
            let injector = Injector::default();
            let mut out = injector.instrument(&source, FileKind::Template, &refs);
            out = out.replacen(&Injector::init_call(), "", 1);
            out = out.replacen(&Injector::report_call(), "", 1);
            for b in &branches {
                out = out.replacen(&injector.tracking_call(b), "", 1);
            }
            prop_assert_eq!(out, source);
        }

        #[test]
        fn prop_union_is_monotonic(
            total in 1usize..12,
            a in prop::collection::vec(0usize..12, 0..12),
            b in prop::collection::vec(0usize..12, 0..12),
        ) {
            let a: Vec<usize> = a.into_iter().filter(|&i| i < total).collect();
            let b: Vec<usize> = b.into_iter().filter(|&i| i < total).collect();
            let only_a = fixture_report(total, &[&a]);
            let only_b = fixture_report(total, &[&b]);
            let both = fixture_report(total, &[&a, &b]);

            prop_assert!(both.covered().is_superset(only_a.covered()));
            prop_assert!(both.covered().is_superset(only_b.covered()));
            prop_assert!(both.covered().len() >= only_a.covered().len());
            prop_assert_eq!(
                both.covered().len() + both.uncovered().len(),
                both.discovered().len()
            );
        }
    }
}
