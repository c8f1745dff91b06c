//! Trace Parsing
//!
//! Recovers executed branch IDs from rendered output. Every instrumented
//! template file appends two sentinel lines:
//!
//! ```text
//! # chartcov:trace:files ["templates/cm.yaml:L5"]
//! # chartcov:trace:helpers null
//! ```
//!
//! The payload is a JSON array of IDs, or `null` when the list is empty.
//! Each sentinel reports the cumulative state at the time its file was
//! rendered, so the result is the union over all sentinel lines.

use super::branch::BranchId;
use super::instrument::SENTINEL_PREFIX;
use crate::result::{ChartcovError, ChartcovResult};
use serde::Serialize;
use std::collections::BTreeSet;

/// Branch IDs observed in one render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutedTrace {
    /// IDs reported through the `files` collection
    pub files: BTreeSet<BranchId>,
    /// IDs reported through the `helpers` collection
    pub helpers: BTreeSet<BranchId>,
}

impl ExecutedTrace {
    /// Create an empty trace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All IDs regardless of collection
    pub fn all(&self) -> impl Iterator<Item = &BranchId> {
        self.files.iter().chain(self.helpers.iter())
    }

    /// Total number of distinct IDs
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len() + self.helpers.len()
    }

    /// Nothing was executed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.helpers.is_empty()
    }

    /// Merge another trace into this one
    pub fn union(&mut self, other: &Self) {
        self.files.extend(other.files.iter().cloned());
        self.helpers.extend(other.helpers.iter().cloned());
    }
}

/// Extracts sentinel payloads from rendered text
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceParser;

impl TraceParser {
    /// Parse all sentinel lines in `rendered`
    ///
    /// Output without sentinels yields an empty trace; this is what a chart
    /// whose template files were all filtered out produces.
    ///
    /// # Errors
    ///
    /// Returns [`ChartcovError::InvalidTrace`] when a sentinel names an
    /// unknown collection or carries a payload that is not a JSON array of
    /// strings or `null`.
    pub fn parse(rendered: &str) -> ChartcovResult<ExecutedTrace> {
        let mut trace = ExecutedTrace::new();
        let mut sentinels = 0usize;

        for (idx, line) in rendered.lines().enumerate() {
            let Some(pos) = line.find(SENTINEL_PREFIX) else {
                continue;
            };
            sentinels += 1;
            let rest = line[pos + SENTINEL_PREFIX.len()..].trim_end();
            let (collection, payload) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(c, p)| (c, p.trim()));

            let target = match collection {
                "files" => &mut trace.files,
                "helpers" => &mut trace.helpers,
                other => {
                    return Err(ChartcovError::invalid_trace(
                        idx + 1,
                        format!("unknown trace collection `{other}`"),
                    ))
                }
            };

            let ids: Option<Vec<String>> = serde_json::from_str(payload)
                .map_err(|e| ChartcovError::invalid_trace(idx + 1, e.to_string()))?;
            target.extend(ids.unwrap_or_default().into_iter().map(BranchId::new));
        }

        tracing::debug!(sentinels, executed = trace.len(), "parsed render trace");
        Ok(trace)
    }
}
