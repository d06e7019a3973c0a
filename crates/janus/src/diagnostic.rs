//! The diagnostic data model (§3). Rendering — human-readable tables,
//! `annotate-snippets` output — lives in [`crate::diagnostics`]; this module
//! only owns the value that a snapshot's `add_diagnostic` stores.

use crate::ids::StringId;
use crate::span::Span;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Closed diagnostic codes, matching the error taxonomy in §7. Some kinds
/// listed there (`OutOfMemory`, `Cancelled`) never reach a snapshot's
/// diagnostic list — they are returned as query/build errors directly — and
/// are omitted here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DiagnosticCode {
    MalformedAst,
    DuplicateDeclaration,
    SymbolNotFound,
    TypeNotFound,
    MemberNotFound,
    ModuleNotFound,
    NoCompatibleFunction,
    AmbiguousDispatch,
    MissingTypeAnnotation,
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiagnosticCode::MalformedAst => "malformed-ast",
            DiagnosticCode::DuplicateDeclaration => "duplicate-declaration",
            DiagnosticCode::SymbolNotFound => "symbol-not-found",
            DiagnosticCode::TypeNotFound => "type-not-found",
            DiagnosticCode::MemberNotFound => "member-not-found",
            DiagnosticCode::ModuleNotFound => "module-not-found",
            DiagnosticCode::NoCompatibleFunction => "no-compatible-function",
            DiagnosticCode::AmbiguousDispatch => "ambiguous-dispatch",
            DiagnosticCode::MissingTypeAnnotation => "missing-type-annotation",
        };
        write!(f, "{s}")
    }
}

/// `{ severity, code, message, span }`, exactly as specified.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: StringId,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: StringId, span: Span) -> Self {
        Self {
            severity,
            code,
            message,
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
