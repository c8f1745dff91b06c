//! Template Instrumentation
//!
//! Rewrites template text so that a render leaves a trace of the arms it
//! executed. Three constructs are injected:
//!
//! - an initializer prepended to every template file, creating the shared
//!   trace state on the root context only if it is absent;
//! - a tracking action immediately before each branch's closing token,
//!   appending the branch ID to the `files` or `helpers` list;
//! - a reporting sentinel appended to every template file, printing both
//!   lists as `# chartcov:trace:<kind> <json>` lines.
//!
//! Injected actions produce no output. A tracking action copies the `{{-`
//! trim marker of the token it precedes so whitespace trimming is
//! unchanged. Inside define blocks the context is whatever the caller
//! passed, so the tracking action looks for the state on `$` itself, then
//! under one of the wrapper keys, and otherwise does nothing.

use super::branch::Branch;
use crate::chart::FileKind;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Key holding the trace state on the root render context
pub const STATE_KEY: &str = "chartcovTrace";

/// Prefix of every sentinel line in rendered output
pub const SENTINEL_PREFIX: &str = "# chartcov:trace:";

/// Default keys under which wrapper dicts expose the root context
pub const DEFAULT_WRAPPER_KEYS: &[&str] = &["context", "root", "ctx", "top"];

/// Inserts tracking constructs into template source
#[derive(Debug, Clone)]
pub struct Injector {
    wrapper_keys: Vec<String>,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new(DEFAULT_WRAPPER_KEYS.iter().map(|k| (*k).to_string()).collect())
    }
}

impl Injector {
    /// Create an injector that also searches `wrapper_keys` in define contexts
    #[must_use]
    pub fn new(wrapper_keys: Vec<String>) -> Self {
        Self { wrapper_keys }
    }

    /// Instrument one file
    ///
    /// `branches` must all belong to this file; their columns index into
    /// the original line text.
    #[must_use]
    pub fn instrument(&self, source: &str, kind: FileKind, branches: &[&Branch]) -> String {
        let mut by_line: BTreeMap<usize, Vec<&Branch>> = BTreeMap::new();
        for branch in branches {
            by_line.entry(branch.token_line).or_default().push(branch);
        }

        let mut out = String::with_capacity(source.len() + branches.len() * 160 + 512);
        if kind == FileKind::Template {
            out.push_str(&Self::init_call());
        }

        for (idx, line) in source.split_inclusive('\n').enumerate() {
            let Some(line_branches) = by_line.get_mut(&(idx + 1)) else {
                out.push_str(line);
                continue;
            };
            line_branches.sort_by_key(|b| b.column);
            let mut cursor = 0;
            for branch in line_branches.iter() {
                let Some(prefix) = line.get(cursor..branch.column) else {
                    tracing::warn!(id = %branch.id, "branch column outside its line, not injected");
                    continue;
                };
                out.push_str(prefix);
                out.push_str(&self.tracking_call(branch));
                cursor = branch.column;
            }
            out.push_str(&line[cursor..]);
        }

        if kind == FileKind::Template {
            out.push_str(&Self::report_call());
        }
        out
    }

    /// Idempotent initializer for the shared trace state
    #[must_use]
    pub fn init_call() -> String {
        format!(
            r#"{{{{ if not (hasKey $ "{STATE_KEY}") }}}}{{{{ $_ := set $ "{STATE_KEY}" (dict "files" (list) "helpers" (list)) }}}}{{{{ end }}}}"#
        )
    }

    /// Sentinel lines serialising both trace lists
    #[must_use]
    pub fn report_call() -> String {
        let mut out = String::new();
        for collection in ["files", "helpers"] {
            let _ = write!(
                out,
                r#"{{{{ "\n" }}}}{SENTINEL_PREFIX}{collection} {{{{ toJson (index $ "{STATE_KEY}" "{collection}") }}}}"#
            );
        }
        out.push('\n');
        out
    }

    /// Tracking action for one branch
    #[must_use]
    pub fn tracking_call(&self, branch: &Branch) -> String {
        let open = if branch.trim_left { "{{-" } else { "{{" };
        let collection = branch.kind.collection();
        let id = go_string(branch.id.as_str());

        if branch.kind == FileKind::Template && branch.define.is_none() {
            return format!("{open} {} }}}}", append_on("$", collection, &id));
        }

        let mut out = format!(r#"{open} if kindIs "map" $ }}}}"#);
        let _ = write!(
            out,
            r#"{{{{ if hasKey $ "{STATE_KEY}" }}}}{{{{ {} }}}}"#,
            append_on("$", collection, &id)
        );
        for key in &self.wrapper_keys {
            let wrapped = format!(r#"(index $ {})"#, go_string(key));
            let _ = write!(
                out,
                r#"{{{{ else if hasKey $ {key} }}}}{{{{ if kindIs "map" {wrapped} }}}}{{{{ if hasKey {wrapped} "{STATE_KEY}" }}}}{{{{ {append} }}}}{{{{ end }}}}{{{{ end }}}}"#,
                key = go_string(key),
                append = append_on(&wrapped, collection, &id),
            );
        }
        out.push_str("{{ end }}{{ end }}");
        out
    }
}

/// `$_ := set <state> "<collection>" (append <state>.<collection> "<id>")`
fn append_on(context: &str, collection: &str, id: &str) -> String {
    format!(
        r#"$_ := set (index {context} "{STATE_KEY}") "{collection}" (append (index {context} "{STATE_KEY}" "{collection}") {id})"#
    )
}

/// Double-quoted template string literal
fn go_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
