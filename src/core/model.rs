//! Statement model shared by every pipeline stage.
//!
//! All values here are created fresh for one file, threaded through
//! extract → prune → merge → sort → compose → plan, then dropped.

use std::cmp::Ordering;

use serde::Serialize;

/// A location in the source buffer.
///
/// `line` and `column` are 0-based (column counts bytes). Ordering and
/// equality for sorting purposes use `offset` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Position
{
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl PartialOrd for Position
{
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering>
    {
        Some(self.cmp(other))
    }
}

impl Ord for Position
{
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering
    {
        self.offset
            .cmp(&other.offset)
    }
}

/// Declaration span plus attached comments and surrounding blank lines.
///
/// Invariant: `full_start <= start <= end <= full_end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeWithBlankLines
{
    pub start: Position,
    pub end: Position,
    /// Start of the first attached leading comment (or `start`)
    pub full_start: Position,
    /// End of the trailing same-line comment (or `end`)
    pub full_end: Position,
    /// '\n' count in the whitespace run before `full_start`
    pub leading_new_lines: usize,
    /// '\n' count in the whitespace run after `full_end`
    pub trailing_new_lines: usize,
    /// Only whitespace follows `full_end`
    pub eof: bool,
}

impl RangeWithBlankLines
{
    /// Zero-width range at `pos`, used for pure insertions.
    pub fn point(
        pos: Position,
        leading_new_lines: usize,
        trailing_new_lines: usize,
        eof: bool,
    ) -> Self
    {
        Self {
            start: pos,
            end: pos,
            full_start: pos,
            full_end: pos,
            leading_new_lines,
            trailing_new_lines,
            eof,
        }
    }
}

/// One comment attached in front of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock
{
    pub text: String,
    pub start: Position,
    pub end: Position,
    /// Newlines between this comment and whatever follows it (0 or 1)
    pub trailing_new_lines: usize,
}

/// One imported or exported member: `property_name [as alias_name]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameBinding
{
    pub property_name: String,
    pub alias_name: Option<String>,
    /// Inline `type` modifier (`import { type A }`)
    pub is_type_only: bool,
}

impl NameBinding
{
    pub fn new(property_name: impl Into<String>) -> Self
    {
        Self { property_name: property_name.into(), alias_name: None, is_type_only: false }
    }

    pub fn aliased(
        property_name: impl Into<String>,
        alias_name: impl Into<String>,
    ) -> Self
    {
        Self {
            property_name: property_name.into(),
            alias_name: Some(alias_name.into()),
            is_type_only: false,
        }
    }

    /// Name visible in the importing scope.
    pub fn local_name(&self) -> &str
    {
        self.alias_name
            .as_deref()
            .unwrap_or(&self.property_name)
    }

    /// Plain `default` slot (no alias).
    pub fn is_default_slot(&self) -> bool
    {
        self.property_name == "default" && self.alias_name.is_none()
    }

    /// `X as default`.
    pub fn is_aliased_to_default(&self) -> bool
    {
        self.alias_name.as_deref() == Some("default")
    }
}

/// Non-default part of an import clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding
{
    Namespace
    {
        alias: String,
    },
    Named
    {
        names: Vec<NameBinding>,
    },
}

impl Binding
{
    /// True for `{}`.
    pub fn is_empty(&self) -> bool
    {
        matches!(self, Binding::Named { names } if names.is_empty())
    }
}

/// Import declaration flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind
{
    /// `import ... from 'x'` / `import 'x'`
    Plain,
    /// `import x = require('x')`
    EqualsRequire,
}

/// Position and trivia shared by every statement kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementMeta
{
    pub range: RangeWithBlankLines,
    pub leading_comments: Vec<CommentBlock>,
    /// Raw text after the declaration up to end of line, byte for byte
    pub trailing_comment_text: Option<String>,
}

impl StatementMeta
{
    /// Whether any comment is attached.
    pub fn has_comments(&self) -> bool
    {
        !self
            .leading_comments
            .is_empty()
            || self
                .trailing_comment_text
                .is_some()
    }

    /// Take the comments of `other` where `self` has none.
    /// Returns false when both sides carry comments of the same kind.
    pub fn can_absorb(
        &self,
        other: &StatementMeta,
    ) -> bool
    {
        let leading_clash = !self
            .leading_comments
            .is_empty()
            && !other
                .leading_comments
                .is_empty();
        let trailing_clash = self
            .trailing_comment_text
            .is_some()
            && other
                .trailing_comment_text
                .is_some();
        !leading_clash && !trailing_clash
    }

    /// Move comments from `other` into `self`. Caller checks `can_absorb`.
    pub fn absorb(
        &mut self,
        other: StatementMeta,
    )
    {
        if self
            .leading_comments
            .is_empty()
        {
            self.leading_comments = other.leading_comments;
        }
        if self
            .trailing_comment_text
            .is_none()
        {
            self.trailing_comment_text = other.trailing_comment_text;
        }
    }
}

/// A single import declaration.
///
/// Invariant: `is_script` implies no default name and no binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement
{
    pub meta: StatementMeta,
    pub module_identifier: String,
    pub kind: ImportKind,
    pub is_script: bool,
    pub is_type_only: bool,
    pub default_name: Option<String>,
    pub binding: Option<Binding>,
}

impl ImportStatement
{
    /// Bare `import 'x'`.
    pub fn script(module_identifier: impl Into<String>) -> Self
    {
        Self {
            meta: StatementMeta::default(),
            module_identifier: module_identifier.into(),
            kind: ImportKind::Plain,
            is_script: true,
            is_type_only: false,
            default_name: None,
            binding: None,
        }
    }

    /// `import { names } from 'x'`.
    pub fn named(
        module_identifier: impl Into<String>,
        names: Vec<NameBinding>,
    ) -> Self
    {
        Self {
            is_script: false,
            binding: Some(Binding::Named { names }),
            ..Self::script(module_identifier)
        }
    }

    /// Local names introduced by this statement, in clause order.
    pub fn local_names(&self) -> Vec<&str>
    {
        let mut out = Vec::new();
        if let Some(d) = &self.default_name
        {
            out.push(d.as_str());
        }
        match &self.binding
        {
            Some(Binding::Namespace { alias }) => out.push(alias.as_str()),
            Some(Binding::Named { names }) => out.extend(
                names
                    .iter()
                    .map(NameBinding::local_name),
            ),
            None =>
            {}
        }
        out
    }

    /// No script marker, no default, and no binding names left.
    pub fn is_empty(&self) -> bool
    {
        !self.is_script
            && self
                .default_name
                .is_none()
            && self
                .binding
                .as_ref()
                .is_none_or(Binding::is_empty)
    }

    /// Normalize a lone `{ default as X }` into the default slot.
    pub fn check_binding_default(&mut self)
    {
        if self
            .default_name
            .is_some()
        {
            return;
        }
        let Some(Binding::Named { names }) = &mut self.binding
        else
        {
            return;
        };
        if names.len() != 1
        {
            return;
        }
        let only = &names[0];
        if only.property_name != "default" || only.is_type_only
        {
            return;
        }
        if let Some(alias) = only
            .alias_name
            .clone()
        {
            self.default_name = Some(alias);
            self.binding = None;
        }
    }
}

/// A single `export { ... } [from 'x']` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStatement
{
    pub meta: StatementMeta,
    /// `None` for a local export list
    pub module_identifier: Option<String>,
    pub is_type_only: bool,
    pub names: Vec<NameBinding>,
}

impl ExportStatement
{
    /// `export {}` without a source module.
    pub fn is_empty_local(&self) -> bool
    {
        self.module_identifier
            .is_none()
            && self
                .names
                .is_empty()
    }
}

/// Either statement kind, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement
{
    Import(ImportStatement),
    Export(ExportStatement),
}

impl Statement
{
    pub fn meta(&self) -> &StatementMeta
    {
        match self
        {
            Statement::Import(s) => &s.meta,
            Statement::Export(s) => &s.meta,
        }
    }
}

/// Start/end pair of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditRange
{
    pub start: Position,
    pub end: Position,
}

/// Replace `range` with `new_text`; `None` deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit
{
    pub range: EditRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_text: Option<String>,
}

impl Edit
{
    /// Build an edit; empty text becomes a deletion.
    pub fn new(
        start: Position,
        end: Position,
        text: String,
    ) -> Self
    {
        let new_text = if text.is_empty() { None } else { Some(text) };
        Self { range: EditRange { start, end }, new_text }
    }
}
