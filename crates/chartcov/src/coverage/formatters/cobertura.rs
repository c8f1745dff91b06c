//! Cobertura XML Coverage Report Formatter
//!
//! Projects branch coverage onto lines for CI coverage viewers.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">
//! <coverage line-rate="0.5556" branch-rate="0.5000" lines-covered="5" lines-valid="9"
//!           branches-covered="1" branches-valid="2" complexity="0" version="0.1.0" timestamp="...">
//!   <sources><source>charts/app</source></sources>
//!   <packages>
//!     <package name="app" line-rate="0.5556" branch-rate="0.5000" complexity="0">
//!       <classes>
//!         <class name="templates/cm.yaml" filename="templates/cm.yaml" ...>
//!           <lines>
//!             <line number="10" hits="1" branch="true" condition-coverage="50% (1/2)"/>
//!             <line number="11" hits="1" branch="false"/>
//!           </lines>
//!         </class>
//!       </classes>
//!     </package>
//!   </packages>
//! </coverage>
//! ```
//!
//! Each branch covers its arm's line range. A line is hit when any arm
//! spanning it was taken. Arms are grouped into decisions by the line of
//! their owning construct; that line carries the decision's
//! condition coverage.
//!
//! A chart without branches reports rates of `0` alongside
//! `lines-valid="0"`, so viewers never show it as fully covered.

use crate::coverage::{Branch, CoverageReport};
use crate::result::ChartcovResult;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Per-line hit flag and, on decision lines, (covered arms, total arms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineCoverage {
    hit: bool,
    decision: Option<(usize, usize)>,
}

/// Line projection of one file
#[derive(Debug, Default)]
struct ClassCoverage {
    lines: BTreeMap<usize, LineCoverage>,
    branches_covered: usize,
    branches_valid: usize,
}

impl ClassCoverage {
    fn from_branches(report: &CoverageReport, branches: &[&Branch]) -> Self {
        let mut class = Self::default();
        let mut decisions: BTreeMap<usize, (usize, usize)> = BTreeMap::new();

        for branch in branches {
            let hit = report.is_covered(&branch.id);
            for line in branch.lines() {
                class.lines.entry(line).or_default().hit |= hit;
            }
            let decision = decisions.entry(branch.decision_line).or_default();
            decision.1 += 1;
            class.branches_valid += 1;
            if hit {
                decision.0 += 1;
                class.branches_covered += 1;
            }
        }

        for (line, (covered, total)) in decisions {
            let entry = class.lines.entry(line).or_default();
            entry.hit |= covered > 0;
            entry.decision = Some((covered, total));
        }
        class
    }

    fn lines_covered(&self) -> usize {
        self.lines.values().filter(|l| l.hit).count()
    }

    fn lines_valid(&self) -> usize {
        self.lines.len()
    }
}

/// Cobertura XML format report generator
#[derive(Debug)]
pub struct CoberturaFormatter<'a> {
    report: &'a CoverageReport,
    version: String,
    source: Option<String>,
    timestamp: Option<i64>,
}

impl<'a> CoberturaFormatter<'a> {
    /// Create a new Cobertura formatter
    #[must_use]
    pub fn new(report: &'a CoverageReport) -> Self {
        Self {
            report,
            version: env!("CARGO_PKG_VERSION").to_string(),
            source: None,
            timestamp: None,
        }
    }

    /// Set the version string
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Name the chart root in `<sources>`
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Use a fixed timestamp (milliseconds since the epoch)
    #[must_use]
    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// Generate Cobertura XML report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        let classes: BTreeMap<&str, ClassCoverage> = self
            .report
            .discovered()
            .by_file()
            .into_iter()
            .map(|(file, branches)| (file, ClassCoverage::from_branches(self.report, &branches)))
            .collect();

        let lines_covered: usize = classes.values().map(ClassCoverage::lines_covered).sum();
        let lines_valid: usize = classes.values().map(ClassCoverage::lines_valid).sum();
        let branches_covered: usize = classes.values().map(|c| c.branches_covered).sum();
        let branches_valid: usize = classes.values().map(|c| c.branches_valid).sum();
        let line_rate = rate(lines_covered, lines_valid);
        let branch_rate = rate(branches_covered, branches_valid);
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">"#,
        );
        xml.push('\n');
        let _ = write!(
            xml,
            r#"<coverage line-rate="{line_rate:.4}" branch-rate="{branch_rate:.4}" lines-covered="{lines_covered}" lines-valid="{lines_valid}" branches-covered="{branches_covered}" branches-valid="{branches_valid}" complexity="0" version="{}" timestamp="{timestamp}">"#,
            escape(&self.version),
        );
        xml.push('\n');

        xml.push_str("  <sources>\n");
        let _ = writeln!(
            xml,
            "    <source>{}</source>",
            escape(self.source.as_deref().unwrap_or("."))
        );
        xml.push_str("  </sources>\n");

        xml.push_str("  <packages>\n");
        let _ = writeln!(
            xml,
            r#"    <package name="{}" line-rate="{line_rate:.4}" branch-rate="{branch_rate:.4}" complexity="0">"#,
            escape(self.report.chart()),
        );
        xml.push_str("      <classes>\n");

        for (file, class) in &classes {
            let file = escape(file);
            let _ = writeln!(
                xml,
                r#"        <class name="{file}" filename="{file}" line-rate="{:.4}" branch-rate="{:.4}" complexity="0">"#,
                rate(class.lines_covered(), class.lines_valid()),
                rate(class.branches_covered, class.branches_valid),
            );
            xml.push_str("          <methods/>\n");
            xml.push_str("          <lines>\n");
            for (number, line) in &class.lines {
                let hits = u8::from(line.hit);
                match line.decision {
                    Some((covered, total)) => {
                        let _ = writeln!(
                            xml,
                            r#"            <line number="{number}" hits="{hits}" branch="true" condition-coverage="{}"/>"#,
                            condition_coverage(covered, total),
                        );
                    }
                    None => {
                        let _ = writeln!(
                            xml,
                            r#"            <line number="{number}" hits="{hits}" branch="false"/>"#,
                        );
                    }
                }
            }
            xml.push_str("          </lines>\n");
            xml.push_str("        </class>\n");
        }

        xml.push_str("      </classes>\n");
        xml.push_str("    </package>\n");
        xml.push_str("  </packages>\n");
        xml.push_str("</coverage>\n");

        xml
    }

    /// Save the Cobertura report to a file
    ///
    /// # Errors
    ///
    /// Returns error if file write fails
    pub fn save(&self, path: &Path) -> ChartcovResult<()> {
        let content = self.generate();
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Ratio in `[0, 1]`; an empty denominator is `0`
fn rate(covered: usize, valid: usize) -> f64 {
    if valid == 0 {
        0.0
    } else {
        covered as f64 / valid as f64
    }
}

/// `P% (covered/total)` with the percentage truncated
fn condition_coverage(covered: usize, total: usize) -> String {
    let percent = if total == 0 { 0 } else { covered * 100 / total };
    format!("{percent}% ({covered}/{total})")
}

/// Escape text for XML attribute and element content
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
