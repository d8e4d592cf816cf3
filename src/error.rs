//! Error types for every stage of the `assemble -> parse -> expand -> evaluate` pipeline.
//!
//! One enum per pipeline stage, aggregated behind a single top-level type via `From`
//! impls, so callers never need to string-match errors.

use std::fmt;

/// A position in the original query string, used to anchor error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Failure to register a keyword or macro because its canonical name or a synonym
/// collides with an already-registered name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateName {
    pub name: String,
}

impl fmt::Display for DuplicateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name `{}` is already registered", self.name)
    }
}

/// A malformed query. Carries the byte span, what the parser expected, and what it saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub span: Span,
    pub expected: String,
    pub got: String,
}

impl ParseError {
    pub fn new(span: Span, expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self {
            span,
            expected: expected.into(),
            got: got.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at {}: expected {}, got {}",
            self.span, self.expected, self.got
        )
    }
}

/// Evaluation-time and static (parser-stage) semantic errors.
///
/// `PureNumericMask` is raised by the parser, not the evaluator, but it shares this enum
/// because it is reported through the same `SelectError::Eval` path callers already handle.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A macro transitively references itself.
    MacroCycle { chain: Vec<String> },
    /// A query references a keyword with no column in the context.
    UnknownField { name: String, span: Span },
    /// A query references `$name` that was never bound via `set_variable`.
    UnknownVariable { name: String, span: Span },
    /// An operation was applied to a value of the wrong type (e.g. regex against a
    /// numeric field, arithmetic on a string column).
    TypeError { message: String, span: Span },
    /// Integer floor-division or modulo by zero.
    DivByZero { span: Span },
    /// A function was called outside its mathematical domain (e.g. `log(-1)`).
    DomainError { message: String, span: Span },
    /// A bonded/exbonded query was evaluated against a context with no topology.
    NoTopology { span: Span },
    /// A regex literal failed to compile.
    PatternError { message: String, span: Span },
    /// A comparison whose both sides are pure-numeric scalars; it can never produce a
    /// mask. Detected statically by the parser.
    PureNumericMask { span: Span },
    /// A configured [`crate::context::EvalLimits`] bound was exceeded.
    LimitExceeded { message: String, span: Span },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacroCycle { chain } => {
                write!(f, "macro cycle detected: {}", chain.join(" -> "))
            }
            Self::UnknownField { name, span } => {
                write!(f, "unknown field `{name}` at {span}")
            }
            Self::UnknownVariable { name, span } => {
                write!(f, "unknown variable `${name}` at {span}")
            }
            Self::TypeError { message, span } => write!(f, "type error at {span}: {message}"),
            Self::DivByZero { span } => write!(f, "division by zero at {span}"),
            Self::DomainError { message, span } => write!(f, "domain error at {span}: {message}"),
            Self::NoTopology { span } => {
                write!(f, "bonded query at {span} requires topology, but none is available")
            }
            Self::PatternError { message, span } => {
                write!(f, "invalid regex pattern at {span}: {message}")
            }
            Self::PureNumericMask { span } => write!(
                f,
                "comparison at {span} has two pure-numeric operands and can never produce a mask"
            ),
            Self::LimitExceeded { message, span } => {
                write!(f, "evaluation limit exceeded at {span}: {message}")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// The single error type crossing the `assemble -> parse -> expand -> evaluate` boundary.
#[derive(Debug, Clone)]
pub enum SelectError {
    Duplicate(DuplicateName),
    Parse(ParseError),
    Eval(EvalError),
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Eval(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SelectError {}

impl From<DuplicateName> for SelectError {
    fn from(e: DuplicateName) -> Self {
        Self::Duplicate(e)
    }
}

impl From<ParseError> for SelectError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<EvalError> for SelectError {
    fn from(e: EvalError) -> Self {
        Self::Eval(e)
    }
}
