//! Query engine failure kinds (§4.5, §7). The engine itself never panics;
//! every failure mode named in the spec is a value here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query argument was not in the documented canonical form")]
    NonCanonicalArg,
    #[error("symbol not found")]
    SymbolNotFound,
    #[error("type not found")]
    TypeNotFound,
    #[error("member not found")]
    MemberNotFound,
    #[error("module not found")]
    ModuleNotFound,
    #[error("no compatible function for this call")]
    NoCompatibleFunction,
    #[error("ambiguous dispatch: more than one candidate is equally specific")]
    AmbiguousDispatch,
    #[error("required type annotation is missing")]
    MissingTypeAnnotation,
    #[error("query was cancelled")]
    Cancelled,
}
