//! Parser-agnostic view of top-level declarations.
//!
//! A `SourceParser` turns text into these values; the extractor never
//! looks at a concrete syntax tree.

use std::path::Path;

use crate::core::model::NameBinding;
use crate::error::FormatError;

/// An `import` declaration the extractor can model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDecl
{
    /// Module specifier without quotes
    pub module: String,
    pub is_type_only: bool,
    pub default_name: Option<String>,
    pub namespace: Option<String>,
    /// `Some` when braces are present, even if empty
    pub named: Option<Vec<NameBinding>>,
    /// `with { ... }` / `assert { ... }` clause present
    pub has_attributes: bool,
}

/// An `export { ... } [from 'x']` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDecl
{
    pub module: Option<String>,
    pub is_type_only: bool,
    pub names: Vec<NameBinding>,
}

/// Classification of one top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind
{
    Import(ImportDecl),
    /// `import x = require('y')`
    ImportEqualsRequire
    {
        name: String,
        module: String,
        is_type_only: bool,
    },
    /// `import x = A.B` and other import forms that are not modeled
    ImportAlias,
    Export(ExportDecl),
    /// `export * from 'x'`, `export * as ns from 'x'`
    ExportAll,
    /// `export = x`, `export default x`, `export as namespace X`
    ExportAssignment,
    /// `export const x = ...`, `export function f() {}`
    ExportDeclaration,
    /// Anything else
    Other,
}

/// One top-level statement with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclNode
{
    pub kind: DeclKind,
    pub start: usize,
    pub end: usize,
}

/// Everything the pipeline needs from a parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource
{
    pub nodes: Vec<DeclNode>,
    /// Identifiers referenced outside import declarations
    pub referenced: std::collections::HashSet<String>,
    /// File contains JSX
    pub has_jsx: bool,
}

/// Front-end that produces top-level declaration nodes.
pub trait SourceParser: Send + Sync
{
    fn parse(
        &self,
        text: &str,
        path: &Path,
    ) -> Result<ParsedSource, FormatError>;
}
