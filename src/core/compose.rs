//! Statement rendering with line wrapping.
//!
//! Goals
//! - One line when it fits and stays under the member cap.
//! - Otherwise one member list per indented line, filled up to the
//!   per-line cap and `max_line_length`.
//! - Comments are reproduced byte for byte.

use serde::{Deserialize, Serialize};

use crate::core::model::{Binding, ExportStatement, ImportKind, ImportStatement, NameBinding, StatementMeta};
use crate::error::FormatError;

/// Preferred quote character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteMark
{
    #[default]
    Single,
    Double,
}

impl QuoteMark
{
    fn char(self) -> char
    {
        match self
        {
            QuoteMark::Single => '\'',
            QuoteMark::Double => '"',
        }
    }
}

/// Trailing comma after the last member of a wrapped list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailingComma
{
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "multiLine", alias = "multiline")]
    MultiLine,
}

/// Member caps per statement shape; 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapLimits
{
    pub max_binding_names_per_line: usize,
    pub max_default_and_binding_names_per_line: usize,
    pub max_export_names_per_line: usize,
    pub max_names_per_wrapped_line: usize,
}

impl Default for WrapLimits
{
    fn default() -> Self
    {
        Self {
            max_binding_names_per_line: 0,
            max_default_and_binding_names_per_line: 0,
            max_export_names_per_line: 0,
            max_names_per_wrapped_line: 1,
        }
    }
}

/// Everything that affects rendered text.
#[derive(Debug, Clone)]
pub struct ComposeStyle
{
    pub quote: QuoteMark,
    pub semicolon: bool,
    pub trailing_comma: TrailingComma,
    /// One indentation level
    pub indent: String,
    pub max_line_length: usize,
    pub limits: WrapLimits,
    pub bracket_spacing: bool,
}

impl Default for ComposeStyle
{
    fn default() -> Self
    {
        Self {
            quote: QuoteMark::Single,
            semicolon: true,
            trailing_comma: TrailingComma::MultiLine,
            indent: "  ".to_owned(),
            max_line_length: 80,
            limits: WrapLimits::default(),
            bracket_spacing: true,
        }
    }
}

/// Renders statements under one style.
#[derive(Debug, Clone, Default)]
pub struct Composer
{
    style: ComposeStyle,
}

impl Composer
{
    pub fn new(style: ComposeStyle) -> Self
    {
        Self { style }
    }

    /// Render statements one after another, newline separated.
    pub fn compose_imports(
        &self,
        stmts: &[ImportStatement],
    ) -> Result<String, FormatError>
    {
        let texts = stmts
            .iter()
            .map(|s| self.compose_import(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(texts.join("\n"))
    }

    /// Render one import with its comments.
    pub fn compose_import(
        &self,
        stmt: &ImportStatement,
    ) -> Result<String, FormatError>
    {
        let from = self.quote(&stmt.module_identifier);
        let semi = self.semi();

        if stmt.is_script
        {
            return Ok(self.wrap_comments(&stmt.meta, format!("import {from}{semi}")));
        }

        let type_kw = if stmt.is_type_only { "type " } else { "" };

        if stmt.kind == ImportKind::EqualsRequire
        {
            let name = stmt
                .default_name
                .as_deref()
                .ok_or_else(|| FormatError::invariant(format!("`import = require({from})` without a name")))?;
            let body = format!("import {type_kw}{name} = require({from}){semi}");
            return Ok(self.wrap_comments(&stmt.meta, body));
        }

        let default = stmt
            .default_name
            .as_deref();
        let head = format!("import {type_kw}");
        let tail = format!(" from {from}{semi}");

        let body = match (&stmt.binding, default)
        {
            (None, None) =>
            {
                return Err(FormatError::invariant(format!(
                    "import from {from} has neither a default name nor a binding"
                )));
            }
            (Some(Binding::Namespace { alias }), d) =>
            {
                let d = d.map_or(String::new(), |d| format!("{d}, "));
                format!("{head}{d}* as {alias}{tail}")
            }
            (Some(Binding::Named { names }), Some(d)) if names.is_empty() => format!("{head}{d}{tail}"),
            (None, Some(d)) => format!("{head}{d}{tail}"),
            (Some(Binding::Named { names }), d) =>
            {
                let prefix = match d
                {
                    Some(d) => format!("{head}{d}, "),
                    None => head,
                };
                let cap = if d.is_some()
                {
                    self.style
                        .limits
                        .max_default_and_binding_names_per_line
                }
                else
                {
                    self.style
                        .limits
                        .max_binding_names_per_line
                };
                self.list(&prefix, names, &tail, cap, &stmt.meta)
            }
        };
        Ok(self.wrap_comments(&stmt.meta, body))
    }

    /// Render one export with its comments.
    pub fn compose_export(
        &self,
        stmt: &ExportStatement,
    ) -> String
    {
        let type_kw = if stmt.is_type_only { "type " } else { "" };
        let prefix = format!("export {type_kw}");
        let tail = match &stmt.module_identifier
        {
            Some(m) => format!(" from {}{}", self.quote(m), self.semi()),
            None => self
                .semi()
                .to_owned(),
        };
        let body = self.list(
            &prefix,
            &stmt.names,
            &tail,
            self.style
                .limits
                .max_export_names_per_line,
            &stmt.meta,
        );
        self.wrap_comments(&stmt.meta, body)
    }

    /// `prefix{ a, b }tail`, wrapped when needed.
    fn list(
        &self,
        prefix: &str,
        names: &[NameBinding],
        tail: &str,
        cap: usize,
        meta: &StatementMeta,
    ) -> String
    {
        if names.is_empty()
        {
            return format!("{prefix}{{}}{tail}");
        }

        let items: Vec<String> = names
            .iter()
            .map(render_name)
            .collect();
        let pad = if self.style.bracket_spacing { " " } else { "" };
        let one_line = format!("{prefix}{{{pad}{}{pad}}}{tail}", items.join(", "));

        let trailing_len = meta
            .trailing_comment_text
            .as_deref()
            .map_or(0, width);
        let fits = same_line_lead_width(meta) + width(&one_line) + trailing_len <= self.style.max_line_length;
        let under_cap = cap == 0 || items.len() <= cap;
        if fits && under_cap
        {
            return one_line;
        }

        let indent = &self
            .style
            .indent;
        let per_line = self
            .style
            .limits
            .max_names_per_wrapped_line;
        let mut lines: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for item in &items
        {
            if !current.is_empty()
            {
                let candidate_len =
                    width(indent) + current.iter().map(|s| width(s) + 2).sum::<usize>() + width(item) + 1;
                let full = per_line != 0 && current.len() >= per_line;
                if full || candidate_len > self.style.max_line_length
                {
                    lines.push(format!("{indent}{}", current.join(", ")));
                    current.clear();
                }
            }
            current.push(item);
        }
        if !current.is_empty()
        {
            lines.push(format!("{indent}{}", current.join(", ")));
        }

        let last_comma = match self.style.trailing_comma
        {
            TrailingComma::MultiLine => ",",
            TrailingComma::None => "",
        };
        let body = lines.join(",\n");
        format!("{prefix}{{\n{body}{last_comma}\n}}{tail}")
    }

    /// Prepend leading comments and append trailing text verbatim.
    fn wrap_comments(
        &self,
        meta: &StatementMeta,
        body: String,
    ) -> String
    {
        let mut out = String::new();
        for c in &meta.leading_comments
        {
            out.push_str(&c.text);
            out.push(if c.trailing_new_lines > 0 { '\n' } else { ' ' });
        }
        out.push_str(&body);
        if let Some(t) = &meta.trailing_comment_text
        {
            out.push_str(t);
        }
        out
    }

    /// Quote a module specifier, switching quotes when it contains ours.
    fn quote(
        &self,
        path: &str,
    ) -> String
    {
        let mut q = self
            .style
            .quote
            .char();
        if path.contains(q)
        {
            q = if q == '\'' { '"' } else { '\'' };
        }
        format!("{q}{path}{q}")
    }

    fn semi(&self) -> &'static str
    {
        if self.style.semicolon { ";" } else { "" }
    }
}

/// Column width of rendered text, counted in chars.
fn width(s: &str) -> usize
{
    s.chars()
        .count()
}

/// Width of the leading comments that share the statement's first line,
/// each followed by its one-space separator.
fn same_line_lead_width(meta: &StatementMeta) -> usize
{
    meta.leading_comments
        .iter()
        .fold(0, |acc, c| if c.trailing_new_lines > 0 { 0 } else { acc + width(&c.text) + 1 })
}

fn render_name(n: &NameBinding) -> String
{
    let type_kw = if n.is_type_only { "type " } else { "" };
    match &n.alias_name
    {
        Some(alias) => format!("{type_kw}{} as {alias}", n.property_name),
        None => format!("{type_kw}{}", n.property_name),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::CommentBlock;
    use crate::core::model::Position;

    fn named(
        module: &str,
        names: &[&str],
    ) -> ImportStatement
    {
        ImportStatement::named(
            module,
            names
                .iter()
                .map(|n| NameBinding::new(*n))
                .collect(),
        )
    }

    fn composer() -> Composer
    {
        Composer::default()
    }

    #[test]
    fn single_line_shapes()
    {
        let c = composer();
        assert_eq!(c.compose_import(&ImportStatement::script("x")).unwrap(), "import 'x';");
        assert_eq!(c.compose_import(&named("m", &["a", "b"])).unwrap(), "import { a, b } from 'm';");

        let mut d = named("m", &["a"]);
        d.default_name = Some("D".into());
        assert_eq!(c.compose_import(&d).unwrap(), "import D, { a } from 'm';");

        let mut only_default = named("m", &[]);
        only_default.default_name = Some("D".into());
        assert_eq!(c.compose_import(&only_default).unwrap(), "import D from 'm';");

        assert_eq!(c.compose_import(&named("m", &[])).unwrap(), "import {} from 'm';");

        let ns = ImportStatement {
            is_script: false,
            is_type_only: true,
            binding: Some(Binding::Namespace { alias: "ns".into() }),
            ..ImportStatement::script("m")
        };
        assert_eq!(c.compose_import(&ns).unwrap(), "import type * as ns from 'm';");
    }

    #[test]
    fn equals_require()
    {
        let s = ImportStatement {
            kind: ImportKind::EqualsRequire,
            is_script: false,
            default_name: Some("fs".into()),
            ..ImportStatement::script("fs")
        };
        assert_eq!(composer().compose_import(&s).unwrap(), "import fs = require('fs');");
    }

    #[test]
    fn inline_type_and_alias()
    {
        let mut t = NameBinding::aliased("A", "B");
        t.is_type_only = true;
        let s = ImportStatement::named("m", vec![t]);
        assert_eq!(composer().compose_import(&s).unwrap(), "import { type A as B } from 'm';");
    }

    #[test]
    fn wraps_past_line_length()
    {
        let style = ComposeStyle { max_line_length: 20, ..Default::default() };
        let out = Composer::new(style)
            .compose_import(&named("mod", &["alpha", "beta"]))
            .unwrap();
        assert_eq!(out, "import {\n  alpha,\n  beta,\n} from 'mod';");
    }

    #[test]
    fn wraps_past_member_cap_and_fills_lines()
    {
        let style = ComposeStyle {
            limits: WrapLimits { max_binding_names_per_line: 2, max_names_per_wrapped_line: 0, ..Default::default() },
            trailing_comma: TrailingComma::None,
            ..Default::default()
        };
        let out = Composer::new(style)
            .compose_import(&named("m", &["a", "b", "c"]))
            .unwrap();
        assert_eq!(out, "import {\n  a, b, c\n} from 'm';");
    }

    #[test]
    fn trailing_comment_counts_toward_length()
    {
        let style = ComposeStyle { max_line_length: 30, ..Default::default() };
        let mut s = named("m", &["a", "b"]);
        s.meta.trailing_comment_text = Some(" // a fairly long note".into());
        let out = Composer::new(style)
            .compose_import(&s)
            .unwrap();
        assert!(out.starts_with("import {\n"));
        assert!(out.ends_with("} from 'm'; // a fairly long note"));
    }

    #[test]
    fn same_line_leading_comment_counts_toward_length()
    {
        let style = ComposeStyle { max_line_length: 30, ..Default::default() };
        let mut s = named("m", &["a", "b"]);
        s.meta.leading_comments = vec![
            CommentBlock { text: "// above".into(), start: Position::default(), end: Position::default(), trailing_new_lines: 1 },
            CommentBlock { text: "/* inline */".into(), start: Position::default(), end: Position::default(), trailing_new_lines: 0 },
        ];
        let out = Composer::new(style)
            .compose_import(&s)
            .unwrap();
        assert_eq!(out, "// above\n/* inline */ import {\n  a,\n  b,\n} from 'm';");
    }

    #[test]
    fn width_counts_chars_not_bytes()
    {
        let style = ComposeStyle { max_line_length: 27, ..Default::default() };
        let out = Composer::new(style)
            .compose_import(&named("ż", &["ąę", "ść"]))
            .unwrap();
        assert_eq!(out, "import { ąę, ść } from 'ż';");
    }

    #[test]
    fn comments_are_verbatim()
    {
        let mut s = ImportStatement::script("x");
        s.meta.leading_comments = vec![
            CommentBlock { text: "/* a */".into(), start: Position::default(), end: Position::default(), trailing_new_lines: 0 },
            CommentBlock { text: "// b".into(), start: Position::default(), end: Position::default(), trailing_new_lines: 1 },
        ];
        assert_eq!(composer().compose_import(&s).unwrap(), "/* a */ // b\nimport 'x';");
    }

    #[test]
    fn quote_switch_and_style()
    {
        let style = ComposeStyle { quote: QuoteMark::Double, semicolon: false, bracket_spacing: false, ..Default::default() };
        let c = Composer::new(style);
        assert_eq!(c.compose_import(&named("m", &["a"])).unwrap(), "import {a} from \"m\"");
        assert_eq!(c.compose_import(&ImportStatement::script("a\"b")).unwrap(), "import 'a\"b'");
    }

    #[test]
    fn exports()
    {
        let c = composer();
        let local = ExportStatement {
            meta: Default::default(),
            module_identifier: None,
            is_type_only: false,
            names: vec![NameBinding::new("a")],
        };
        assert_eq!(c.compose_export(&local), "export { a };");
        let empty = ExportStatement { names: vec![], ..local.clone() };
        assert_eq!(c.compose_export(&empty), "export {};");
        let from = ExportStatement { module_identifier: Some("x".into()), is_type_only: true, ..local };
        assert_eq!(c.compose_export(&from), "export type { a } from 'x';");
    }

    #[test]
    fn missing_clause_is_an_invariant_error()
    {
        let s = ImportStatement { is_script: false, ..ImportStatement::script("m") };
        assert!(matches!(composer().compose_import(&s), Err(FormatError::Invariant(_))));
    }
}
