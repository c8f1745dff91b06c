//! Control-Token Recognition
//!
//! Structural pattern matching over single template lines. No grammar is
//! built: a token is an action delimiter followed by one of the control
//! keywords, and for `if`/`with`/`range`/`else if` a non-empty argument.
//!
//! Tokens whose line invokes a dynamic-evaluation function (`tpl`,
//! `printf`, ...) and that sit after an odd number of unescaped double
//! quotes are flagged as in-string: their text is an argument that will be
//! evaluated later, not control flow of this file. The check is line-local;
//! string literals spanning lines are not tracked.

use crate::result::ChartcovResult;
use regex::Regex;

/// Keyword alternation, longest forms first so `else if` wins over `else`
const HEAD_PATTERN: &str =
    r"\{\{(-)?\s*(else\s+if|else\s+with|else|if|with|range|end|define|block)\b";

/// Functions whose string arguments are evaluated as template source
pub const DEFAULT_DYNAMIC_FUNCTIONS: &[&str] = &["tpl", "printf", "print", "println"];

/// Kind of control token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `if <pipeline>`
    If,
    /// `with <pipeline>`
    With,
    /// `range <pipeline>`
    Range,
    /// Bare `else`
    Else,
    /// `else if <pipeline>` (and `else with <pipeline>`)
    ElseIf,
    /// `define "<name>"` or `block "<name>" <pipeline>`
    Define(String),
    /// `end`
    End,
}

impl TokenKind {
    /// Opens a new nesting frame
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::If | Self::With | Self::Range)
    }

    /// Closes the current arm and therefore yields a branch
    #[must_use]
    pub const fn closes_arm(&self) -> bool {
        matches!(self, Self::Else | Self::ElseIf | Self::End)
    }

    const fn requires_argument(&self) -> bool {
        matches!(
            self,
            Self::If | Self::With | Self::Range | Self::ElseIf | Self::Define(_)
        )
    }
}

/// Where a token sits on its line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The trimmed line is exactly this token
    Standalone,
    /// The token shares its line with other content
    Inline,
}

/// A recognised control token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlToken {
    /// Token kind
    pub kind: TokenKind,
    /// 1-indexed line
    pub line: usize,
    /// Byte offset of the opening `{{` within the line
    pub column: usize,
    /// Opening delimiter carries the `{{-` trim marker
    pub trim_left: bool,
    /// Standalone or inline
    pub placement: Placement,
    /// Token is text inside a dynamic-evaluation string argument
    pub in_string: bool,
}

/// Line tokenizer with its patterns compiled once
#[derive(Debug, Clone)]
pub struct Tokenizer {
    head: Regex,
    dynamic_call: Option<Regex>,
}

impl Tokenizer {
    /// Build a tokenizer treating `dynamic_functions` as string-evaluating calls
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn new(dynamic_functions: &[String]) -> ChartcovResult<Self> {
        let head = Regex::new(HEAD_PATTERN)?;
        let dynamic_call = if dynamic_functions.is_empty() {
            None
        } else {
            let names = dynamic_functions
                .iter()
                .map(|f| regex::escape(f))
                .collect::<Vec<_>>()
                .join("|");
            // Invoked as the head of an action, a parenthesised call or a pipe stage
            Some(Regex::new(&format!(
                r"(?:\{{\{{-?\s*|\(\s*|\|\s*)(?:{names})\b"
            ))?)
        };
        Ok(Self { head, dynamic_call })
    }

    /// Whether `line` calls one of the dynamic-evaluation functions
    #[must_use]
    pub fn invokes_dynamic_evaluation(&self, line: &str) -> bool {
        self.dynamic_call.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// All control tokens on one line, left to right
    #[must_use]
    pub fn tokenize_line(&self, line: &str, line_no: usize) -> Vec<ControlToken> {
        let line = line.trim_end_matches(['\n', '\r']);
        let dynamic = self.invokes_dynamic_evaluation(line);
        let mut tokens = Vec::new();

        for caps in self.head.captures_iter(line) {
            let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let rest = &line[whole.end()..];
            let (argument, close) = match rest.find("}}") {
                Some(idx) => (rest[..idx].trim(), Some(whole.end() + idx + 2)),
                // Action continues on following lines
                None => (rest.trim(), None),
            };
            let argument = argument.trim_end_matches('-').trim();

            let Some(kind) = classify(keyword.as_str(), argument) else {
                continue;
            };
            if kind.requires_argument() && argument.is_empty() && close.is_some() {
                continue;
            }
            if !kind.requires_argument() && !argument.is_empty() {
                continue;
            }

            let placement = match close {
                Some(end)
                    if line[..whole.start()].trim().is_empty() && line[end..].trim().is_empty() =>
                {
                    Placement::Standalone
                }
                _ => Placement::Inline,
            };
            let in_string = dynamic && unescaped_quotes_before(line, whole.start()) % 2 == 1;

            tokens.push(ControlToken {
                kind,
                line: line_no,
                column: whole.start(),
                trim_left: caps.get(1).is_some(),
                placement,
                in_string,
            });
        }

        tokens
    }
}

fn classify(keyword: &str, argument: &str) -> Option<TokenKind> {
    let kind = match keyword {
        "if" => TokenKind::If,
        "with" => TokenKind::With,
        "range" => TokenKind::Range,
        "else" => TokenKind::Else,
        "end" => TokenKind::End,
        "define" | "block" => TokenKind::Define(define_name(argument)?),
        k if k.starts_with("else") => TokenKind::ElseIf,
        _ => return None,
    };
    Some(kind)
}

/// Name literal of a `define`/`block` action
fn define_name(argument: &str) -> Option<String> {
    let quote = argument.chars().next().filter(|c| *c == '"' || *c == '`')?;
    let body = &argument[1..];
    let end = body.find(quote)?;
    Some(body[..end].to_string())
}

/// Count of `"` before `column` that are not escaped by a backslash
#[must_use]
pub fn unescaped_quotes_before(line: &str, column: usize) -> usize {
    let bytes = &line.as_bytes()[..column.min(line.len())];
    let mut count = 0;
    let mut backslashes = 0;
    for &b in bytes {
        match b {
            b'\\' => backslashes += 1,
            b'"' => {
                if backslashes % 2 == 0 {
                    count += 1;
                }
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
    }
    count
}
