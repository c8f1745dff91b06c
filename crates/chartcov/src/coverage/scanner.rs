//! Block Scanner
//!
//! Single left-to-right pass over a template file, maintaining an explicit
//! stack of open frames. Every `else`, `else if` and `end` token that is
//! not inside a dynamic-evaluation string yields one [`BranchDescriptor`].
//!
//! ```text
//! 3  {{- if .Values.a }}     push (3)
//! 4  a: 1
//! 5  {{- else }}             pop (3) -> arm 3..=4, push (5)
//! 6  a: 2
//! 7  {{- end }}              pop (5) -> arm 5..=6
//! ```
//!
//! Malformed nesting never aborts a scan. A close with nothing to pop
//! degrades to a single-line arm on its own line, or, inside a define
//! block, to an arm opened by the define line itself.

use super::branch::{BranchDescriptor, Trigger};
use super::token::{ControlToken, TokenKind, Tokenizer};
use crate::result::ChartcovResult;

/// Informational note raised while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanNote {
    /// Chart-relative file
    pub file: String,
    /// 1-indexed line
    pub line: usize,
    /// What was tolerated
    pub message: String,
}

/// Result of scanning one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// One descriptor per branch-yielding token, in source order
    pub descriptors: Vec<BranchDescriptor>,
    /// Tolerated irregularities
    pub notes: Vec<ScanNote>,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    line: usize,
    decision_line: usize,
}

#[derive(Debug, Clone)]
struct DefineFrame {
    name: String,
    line: usize,
    depth: usize,
}

/// Stateless scanner; all per-file state lives in [`ScanState`]
#[derive(Debug, Clone)]
pub struct BlockScanner {
    tokenizer: Tokenizer,
}

impl BlockScanner {
    /// Create a scanner treating `dynamic_functions` as string evaluators
    ///
    /// # Errors
    ///
    /// Returns an error if the token patterns fail to compile.
    pub fn new(dynamic_functions: &[String]) -> ChartcovResult<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new(dynamic_functions)?,
        })
    }

    /// Tokenizer in use
    #[must_use]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Scan one file's source text
    #[must_use]
    pub fn scan(&self, file: &str, source: &str) -> ScanOutcome {
        let mut state = ScanState::new(file);
        for (idx, line) in source.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            state.occurrence = 0;
            for token in self.tokenizer.tokenize_line(line, line_no) {
                state.accept(&token);
            }
        }
        state.finish()
    }
}

struct ScanState {
    file: String,
    stack: Vec<Frame>,
    define: Option<DefineFrame>,
    occurrence: usize,
    outcome: ScanOutcome,
}

impl ScanState {
    fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            stack: Vec::new(),
            define: None,
            occurrence: 0,
            outcome: ScanOutcome::default(),
        }
    }

    fn note(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(file = %self.file, line, %message, "scanner note");
        self.outcome.notes.push(ScanNote {
            file: self.file.clone(),
            line,
            message,
        });
    }

    fn accept(&mut self, token: &ControlToken) {
        if token.in_string {
            self.note(token.line, "control token inside dynamic-evaluation string ignored");
            return;
        }

        match &token.kind {
            TokenKind::If | TokenKind::With | TokenKind::Range => {
                self.stack.push(Frame {
                    line: token.line,
                    decision_line: token.line,
                });
            }
            TokenKind::Define(name) => {
                if let Some(open) = &self.define {
                    let message = format!(
                        "define \"{name}\" opened before \"{}\" (line {}) was closed",
                        open.name, open.line
                    );
                    self.note(token.line, message);
                }
                self.define = Some(DefineFrame {
                    name: name.clone(),
                    line: token.line,
                    depth: self.stack.len(),
                });
            }
            TokenKind::Else | TokenKind::ElseIf => {
                let frame = self.close_frame(token);
                self.record(token, frame);
                self.stack.push(Frame {
                    line: token.line,
                    decision_line: frame.decision_line,
                });
            }
            TokenKind::End => {
                let closes_define = self
                    .define
                    .as_ref()
                    .is_some_and(|d| self.stack.len() <= d.depth);
                let frame = self.close_frame(token);
                self.record(token, frame);
                if closes_define {
                    self.define = None;
                }
            }
        }
    }

    /// Pop the frame a closing token ends, degrading when there is none
    fn close_frame(&mut self, token: &ControlToken) -> Frame {
        let define_floor = self.define.as_ref().map_or(0, |d| d.depth);
        if self.stack.len() > define_floor {
            if let Some(frame) = self.stack.pop() {
                return frame;
            }
        }
        if let Some(define) = &self.define {
            // Define line acts as the synthetic open for its own body
            return Frame {
                line: define.line,
                decision_line: define.line,
            };
        }
        self.note(token.line, "closing token without an open block");
        Frame {
            line: token.line,
            decision_line: token.line,
        }
    }

    fn record(&mut self, token: &ControlToken, frame: Frame) {
        let trigger = match token.kind {
            TokenKind::Else => Trigger::Else,
            TokenKind::ElseIf => Trigger::ElseIf,
            _ => Trigger::End,
        };
        self.occurrence += 1;
        let end_line = if token.line > frame.line {
            token.line - 1
        } else {
            token.line
        };
        let descriptor = BranchDescriptor {
            trigger,
            define: self.define.as_ref().map(|d| d.name.clone()),
            token_line: token.line,
            column: token.column,
            occurrence: self.occurrence,
            start_line: frame.line,
            end_line,
            decision_line: frame.decision_line,
            trim_left: token.trim_left,
        };
        tracing::debug!(
            file = %self.file,
            line = token.line,
            start = descriptor.start_line,
            end = descriptor.end_line,
            "branch"
        );
        self.outcome.descriptors.push(descriptor);
    }

    fn finish(mut self) -> ScanOutcome {
        let unclosed: Vec<usize> = self.stack.iter().map(|f| f.line).collect();
        for line in unclosed {
            self.note(line, "block opened here is never closed");
        }
        if let Some(define) = self.define.take() {
            self.note(define.line, format!("define \"{}\" is never closed", define.name));
        }
        self.outcome
    }
}
