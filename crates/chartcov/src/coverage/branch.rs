//! Branch Identifiers and Marker Allocation
//!
//! A branch is one arm of a conditional construct, identified by the token
//! that closes it (`else`, `else if` or `end`). The allocator turns the
//! positional descriptors produced by the scanner into stable string IDs:
//!
//! ```text
//! templates/deployment.yaml:L12          point mode, template file
//! templates/deployment.yaml:L12.2        second closing token on line 12
//! templates/_helpers.tpl:app.labels:L7   point mode, helper define block
//! templates/deployment.yaml:L4-L11       range mode (arm spans lines 4..=11)
//! ```
//!
//! Point IDs name the closing token's own line and are what gets injected
//! into the chart; range IDs are a projection used for line attribution.

use crate::chart::FileKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable branch identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(String);

impl BranchId {
    /// Wrap an already formatted identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Token that closes an arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    /// `else`
    Else,
    /// `else if` / `else with`
    ElseIf,
    /// `end`
    End,
}

/// Addressing mode for rendering an ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// `file[:define]:L<token-line>[.N]`
    #[default]
    Point,
    /// `file[:define]:L<start>-L<end>[.N]`
    Range,
}

/// Positional facts the scanner records for one closing token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDescriptor {
    /// Closing token kind
    pub trigger: Trigger,
    /// Enclosing define block, if any
    pub define: Option<String>,
    /// Line of the closing token
    pub token_line: usize,
    /// Byte offset of the closing token's `{{`
    pub column: usize,
    /// 1-based index among branch-yielding tokens on `token_line`
    pub occurrence: usize,
    /// First line of the arm
    pub start_line: usize,
    /// Last line of the arm
    pub end_line: usize,
    /// Line of the construct this arm belongs to (`if`/`with`/`range`)
    pub decision_line: usize,
    /// Closing token opens with `{{-`
    pub trim_left: bool,
}

/// A discovered branch with its allocated ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    /// Point-mode identifier, injected into the chart
    pub id: BranchId,
    /// Chart-relative file path
    pub file: String,
    /// Template or helper file
    pub kind: FileKind,
    /// Enclosing define block
    pub define: Option<String>,
    /// Closing token kind
    pub trigger: Trigger,
    /// Line of the closing token
    pub token_line: usize,
    /// Byte offset of the closing token
    #[serde(skip)]
    pub column: usize,
    /// Intra-line occurrence index
    pub occurrence: usize,
    /// First line of the arm
    pub start_line: usize,
    /// Last line of the arm
    pub end_line: usize,
    /// Line of the owning construct
    pub decision_line: usize,
    /// Closing token opens with `{{-`
    #[serde(skip)]
    pub trim_left: bool,
}

impl Branch {
    /// Identifier in the requested addressing mode
    #[must_use]
    pub fn address(&self, mode: AddressMode) -> BranchId {
        match mode {
            AddressMode::Point => self.id.clone(),
            AddressMode::Range => MarkerAllocator::format(
                &self.file,
                self.kind,
                self.define.as_deref(),
                &format!("L{}-L{}", self.start_line, self.end_line),
                self.occurrence,
            ),
        }
    }

    /// Lines spanned by the arm
    pub fn lines(&self) -> impl Iterator<Item = usize> {
        self.start_line..=self.end_line
    }

    /// Branch lives in a helper file
    #[must_use]
    pub fn is_helper(&self) -> bool {
        self.kind == FileKind::Helper
    }
}

/// Assigns stable IDs to scanner descriptors
///
/// Helper-file IDs are namespaced by their define block so identical
/// positions in different helpers never collide. Allocation is a pure
/// function of (file, kind, descriptor); rescanning unchanged text yields
/// the same IDs.
#[derive(Debug, Default)]
pub struct MarkerAllocator {
    seen: BTreeSet<BranchId>,
}

impl MarkerAllocator {
    /// Create an empty allocator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate IDs for the descriptors of one file
    ///
    /// A descriptor whose ID was already handed out is dropped with a
    /// warning; point IDs are unique per (line, occurrence) so this only
    /// happens when the same file is allocated twice.
    pub fn allocate(
        &mut self,
        file: &str,
        kind: FileKind,
        descriptors: Vec<BranchDescriptor>,
    ) -> Vec<Branch> {
        let mut branches = Vec::with_capacity(descriptors.len());
        for d in descriptors {
            let id = Self::format(
                file,
                kind,
                d.define.as_deref(),
                &format!("L{}", d.token_line),
                d.occurrence,
            );
            if !self.seen.insert(id.clone()) {
                tracing::warn!(%id, "duplicate branch id skipped");
                continue;
            }
            branches.push(Branch {
                id,
                file: file.to_string(),
                kind,
                define: d.define,
                trigger: d.trigger,
                token_line: d.token_line,
                column: d.column,
                occurrence: d.occurrence,
                start_line: d.start_line,
                end_line: d.end_line,
                decision_line: d.decision_line,
                trim_left: d.trim_left,
            });
        }
        branches
    }

    /// Number of IDs handed out so far
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.seen.len()
    }

    /// Compose an ID from its parts
    #[must_use]
    pub fn format(
        file: &str,
        kind: FileKind,
        define: Option<&str>,
        lines: &str,
        occurrence: usize,
    ) -> BranchId {
        let mut id = String::from(file);
        if let (FileKind::Helper, Some(name)) = (kind, define) {
            id.push(':');
            id.push_str(name);
        }
        id.push(':');
        id.push_str(lines);
        if occurrence >= 2 {
            id.push('.');
            id.push_str(&occurrence.to_string());
        }
        BranchId(id)
    }
}

/// Every discovered branch, keyed by point ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchIndex {
    branches: BTreeMap<BranchId, Branch>,
}

impl BranchIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add branches
    pub fn extend(&mut self, branches: impl IntoIterator<Item = Branch>) {
        for branch in branches {
            let _ = self.branches.insert(branch.id.clone(), branch);
        }
    }

    /// Look up a branch
    #[must_use]
    pub fn get(&self, id: &BranchId) -> Option<&Branch> {
        self.branches.get(id)
    }

    /// Whether `id` was discovered
    #[must_use]
    pub fn contains(&self, id: &BranchId) -> bool {
        self.branches.contains_key(id)
    }

    /// Total discovered branches
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// No branches discovered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Branches in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    /// IDs in order
    pub fn ids(&self) -> impl Iterator<Item = &BranchId> {
        self.branches.keys()
    }

    /// Count of branches of one file kind
    #[must_use]
    pub fn count_kind(&self, kind: FileKind) -> usize {
        self.iter().filter(|b| b.kind == kind).count()
    }

    /// Branches grouped by file, files in path order
    #[must_use]
    pub fn by_file(&self) -> BTreeMap<&str, Vec<&Branch>> {
        let mut files: BTreeMap<&str, Vec<&Branch>> = BTreeMap::new();
        for branch in self.iter() {
            files.entry(branch.file.as_str()).or_default().push(branch);
        }
        files
    }
}
