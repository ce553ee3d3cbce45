//! Library error taxonomy.
//!
//! Unsupported declarations are never errors; they are counted and left
//! in place by the extractor. Everything here aborts one file only.

use miette::{Diagnostic, SourceSpan};

/// Errors raised while configuring or running the rewrite pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FormatError
{
    /// A configured regex failed to compile
    #[error("invalid regex `{pattern}` in `{field}`")]
    InvalidRegex
    {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A configured glob failed to compile
    #[error("invalid glob `{pattern}`")]
    InvalidGlob
    {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Unknown segment token or keyword in a sort rule
    #[error("invalid sort rule `{0}` (expected `az`, `AZ`, `aA`, `Aa`, `_` or `none`)")]
    InvalidSortRule(String),

    /// The parser rejected the file
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The parser could not be set up or produced no tree
    #[error("parser failure: {0}")]
    Parser(String),

    /// Internal consistency check failed (a bug, not bad input)
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

/// Syntax error with a labeled span into the offending source.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("syntax error in {file}")]
#[diagnostic(code(impsort::syntax))]
pub struct SyntaxError
{
    pub file: String,

    #[source_code]
    pub src: String,

    #[label("could not parse this")]
    pub span: SourceSpan,

    #[help]
    pub help: String,
}

impl FormatError
{
    /// Shorthand for invariant failures.
    pub fn invariant(msg: impl Into<String>) -> Self
    {
        FormatError::Invariant(msg.into())
    }
}
