use std::fmt::{self, Write};

use crate::{expressions::SourceLocation, value::Value};

/// Result type alias for operations that can produce a runtime error.
pub(crate) type RunResult<T> = Result<T, RunError>;

/// Error categories surfaced to the user.
///
/// Uses strum derives so the display form matches the prefix the driver
/// prints (e.g. `Evaluation Error: ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, serde::Serialize)]
pub enum ExcKind {
    /// Lexer or parser rejected the input; the program never starts.
    #[strum(serialize = "Syntax Error")]
    Syntax,
    /// Runtime contract violation: division by zero, wrong arity, bad
    /// conversion, visibility violation, unsupported operation.
    #[strum(serialize = "Evaluation Error")]
    Evaluation,
    /// A declared type annotation does not match the value's tag.
    #[strum(serialize = "Type Mismatch Error")]
    TypeMismatch,
    /// Name, method, or property lookup failed.
    #[strum(serialize = "Unresolved Reference Error")]
    UnresolvedReference,
}

/// One diagnostic call-stack frame: pushed on call, popped on return
/// (including on error paths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub object: String,
    pub location: SourceLocation,
}

impl StackFrame {
    pub fn new(function: impl Into<String>, object: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            function: function.into(),
            object: object.into(),
            location,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}.{} ({}:{}:{})",
            self.object, self.function, self.location.file, self.location.line, self.location.column
        )
    }
}

/// An engine-raised error carrying the call-stack snapshot taken at
/// construction time.
#[derive(Debug, Clone)]
pub struct Exception {
    kind: ExcKind,
    message: String,
    /// Frames outermost-first, as recorded on the interpreter stack.
    stack: Vec<StackFrame>,
}

impl Exception {
    pub fn new(kind: ExcKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ExcKind::Syntax, message)
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::new(ExcKind::Evaluation, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ExcKind::TypeMismatch, message)
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        Self::new(ExcKind::UnresolvedReference, message)
    }

    /// Attaches a call-stack snapshot, replacing any previous one.
    #[must_use]
    pub(crate) fn with_stack(mut self, stack: &[StackFrame]) -> Self {
        self.stack = stack.to_vec();
        self
    }

    #[must_use]
    pub fn kind(&self) -> ExcKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn stack(&self) -> &[StackFrame] {
        &self.stack
    }

    /// Formats the message plus the stack trace, innermost frame first.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut out = format!("{}: {}", self.kind, self.message);
        if !self.stack.is_empty() {
            out.push_str("\nStack trace:");
            for frame in self.stack.iter().rev() {
                let _ = write!(out, "\n  {frame}");
            }
        }
        out
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl std::error::Error for Exception {}

/// A value raised by a `throw` statement, catchable by `try`/`catch`.
#[derive(Debug, Clone)]
pub(crate) struct ThrownValue {
    pub value: Value,
    pub stack: Vec<StackFrame>,
}

/// Error channel of the evaluator.
///
/// Engine errors and user throws both travel as `Err` so that every
/// evaluator frame propagates them with `?`; only `try`/`catch` inspects
/// the `Thrown` variant.
#[derive(Debug)]
pub(crate) enum RunError {
    /// Typed engine error; propagates to the top-level driver.
    Exc(Box<Exception>),
    /// `throw v` from user code; caught by the nearest `try`/`catch`.
    Thrown(Box<ThrownValue>),
}

impl From<Exception> for RunError {
    fn from(exc: Exception) -> Self {
        Self::Exc(Box::new(exc))
    }
}
