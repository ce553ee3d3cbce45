//! Declaration extraction: syntax nodes + source text → statements.
//!
//! Each node is paired with the comments that belong to it (found by a
//! backward walk over the gap before it) and the rest of its last line
//! when that holds only comments. Everything the model cannot express is
//! counted as unhandled and left exactly where it is.

pub mod comments;
pub mod node;

pub use node::{DeclKind, DeclNode, ExportDecl, ImportDecl, ParsedSource, SourceParser};

use tracing::{debug, trace};

use self::comments::{Gap, RawComment, attach_point, mentions_marker, scan_gap, split_file_header, trailing_comment};
use crate::core::model::{
    Binding, CommentBlock, ExportStatement, ImportKind, ImportStatement, RangeWithBlankLines, StatementMeta,
};
use crate::infra::line_index::{NewlineIndex, run_end, run_start};

/// Knobs that change what counts as handled.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions<'a>
{
    /// Comment text that opts a statement (or the whole file) out
    pub disable_marker: &'a str,
    /// Ignore disable markers
    pub force: bool,
    /// Model `export { ... }` statements at all
    pub format_exports: bool,
}

/// Where the rewritten import block goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint
{
    /// Replace the first handled import
    Replace(RangeWithBlankLines),
    /// No handled import: insert at this zero-width point
    Before(RangeWithBlankLines),
}

impl InsertionPoint
{
    pub fn range(&self) -> &RangeWithBlankLines
    {
        match self
        {
            InsertionPoint::Replace(r) | InsertionPoint::Before(r) => r,
        }
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone)]
pub struct Extraction
{
    pub import_statements: Vec<ImportStatement>,
    pub export_statements: Vec<ExportStatement>,
    pub insertion_point: InsertionPoint,
    /// Import/export syntax left untouched
    pub unhandled_count: usize,
    /// Disable marker found in the file header
    pub file_disabled: bool,
}

/// Ranges and trivia found for one node.
struct Located
{
    meta: StatementMeta,
    header: Vec<RawComment>,
}

/// Stateless extractor over one source buffer.
pub struct Extractor<'a>
{
    src: &'a str,
    index: NewlineIndex,
    opts: ExtractOptions<'a>,
}

impl<'a> Extractor<'a>
{
    pub fn new(
        src: &'a str,
        opts: ExtractOptions<'a>,
    ) -> Self
    {
        Self { src, index: NewlineIndex::build(src.as_bytes()), opts }
    }

    /// Line index built for this buffer.
    pub fn index(&self) -> &NewlineIndex
    {
        &self.index
    }

    /// Walk all top-level nodes in order.
    pub fn extract(
        &self,
        nodes: &[DeclNode],
    ) -> Extraction
    {
        let mut imports = Vec::new();
        let mut exports = Vec::new();
        let mut unhandled = 0usize;
        let mut file_disabled = false;
        let mut first_non_import: Option<RangeWithBlankLines> = None;
        let mut cursor = 0usize;

        for (i, node) in nodes
            .iter()
            .enumerate()
        {
            let located = self.locate(cursor, node, i == 0);
            cursor = located
                .meta
                .range
                .full_end
                .offset;

            if i == 0 && !self.opts.force
            {
                file_disabled = mentions_marker(
                    located
                        .header
                        .iter()
                        .map(|c| c.text(self.src)),
                    self.opts.disable_marker,
                );
            }

            let disabled = !self.opts.force && self.is_disabled(&located.meta);
            let meta = located.meta;

            match &node.kind
            {
                DeclKind::Import(decl) if !disabled && !decl.has_attributes =>
                {
                    imports.push(import_from_decl(decl, meta));
                }
                DeclKind::ImportEqualsRequire { name, module, is_type_only } if !disabled =>
                {
                    imports.push(ImportStatement {
                        meta,
                        module_identifier: module.clone(),
                        kind: ImportKind::EqualsRequire,
                        is_script: false,
                        is_type_only: *is_type_only,
                        default_name: Some(name.clone()),
                        binding: None,
                    });
                }
                DeclKind::Export(decl) if !disabled && self.opts.format_exports =>
                {
                    if first_non_import.is_none()
                    {
                        first_non_import = Some(meta.range);
                    }
                    exports.push(ExportStatement {
                        meta,
                        module_identifier: decl
                            .module
                            .clone(),
                        is_type_only: decl.is_type_only,
                        names: decl
                            .names
                            .clone(),
                    });
                }
                DeclKind::Other =>
                {
                    if first_non_import.is_none()
                    {
                        first_non_import = Some(meta.range);
                    }
                }
                kind =>
                {
                    trace!(?kind, offset = node.start, "leaving declaration untouched");
                    if !matches!(kind, DeclKind::Import(_) | DeclKind::ImportEqualsRequire { .. } | DeclKind::ImportAlias)
                        && first_non_import.is_none()
                    {
                        first_non_import = Some(meta.range);
                    }
                    unhandled += 1;
                }
            }
        }

        let insertion_point = match imports.first()
        {
            Some(first) => InsertionPoint::Replace(
                first
                    .meta
                    .range,
            ),
            None =>
            {
                let offset = first_non_import.map_or(0, |r| {
                    r.full_start
                        .offset
                });
                InsertionPoint::Before(self.point(offset))
            }
        };

        debug!(
            imports = imports.len(),
            exports = exports.len(),
            unhandled,
            file_disabled,
            "extracted declarations"
        );

        Extraction {
            import_statements: imports,
            export_statements: exports,
            insertion_point,
            unhandled_count: unhandled,
            file_disabled,
        }
    }

    /// Attach comments and compute the full range of `node`.
    fn locate(
        &self,
        gap_start: usize,
        node: &DeclNode,
        first: bool,
    ) -> Located
    {
        let gap_start = gap_start.min(node.start);
        let gap = scan_gap(self.src, gap_start, node.start);
        let attached = if first
        {
            split_file_header(self.src, &gap).attached
        }
        else
        {
            attach_point(self.src, &gap)
        };

        let leading = self.comment_blocks(&gap, attached);
        let trailing = trailing_comment(self.src, node.end).map(str::to_owned);

        let full_start = gap
            .comments
            .get(attached)
            .map_or(node.start, |c| c.start);
        let full_end = node.end
            + trailing
                .as_ref()
                .map_or(0, String::len);

        let header = if first
        {
            gap.comments[..attached].to_vec()
        }
        else
        {
            Vec::new()
        };

        Located {
            meta: StatementMeta {
                range: self.range(node.start, node.end, full_start, full_end),
                leading_comments: leading,
                trailing_comment_text: trailing,
            },
            header,
        }
    }

    /// Turn the attached tail of `gap` into comment blocks.
    fn comment_blocks(
        &self,
        gap: &Gap,
        from: usize,
    ) -> Vec<CommentBlock>
    {
        let comments = &gap.comments;
        (from..comments.len())
            .map(|idx| {
                let c = &comments[idx];
                let next_newlines = comments
                    .get(idx + 1)
                    .map_or(gap.newlines_after, |n| n.newlines_before);
                CommentBlock {
                    text: c
                        .text(self.src)
                        .to_owned(),
                    start: self
                        .index
                        .position(c.start),
                    end: self
                        .index
                        .position(c.end),
                    trailing_new_lines: next_newlines,
                }
            })
            .collect()
    }

    /// Build a full range with blank-line counts.
    fn range(
        &self,
        start: usize,
        end: usize,
        full_start: usize,
        full_end: usize,
    ) -> RangeWithBlankLines
    {
        let bytes = self
            .src
            .as_bytes();
        let before = run_start(bytes, full_start);
        let after = run_end(bytes, full_end);

        RangeWithBlankLines {
            start: self
                .index
                .position(start),
            end: self
                .index
                .position(end),
            full_start: self
                .index
                .position(full_start),
            full_end: self
                .index
                .position(full_end),
            leading_new_lines: self
                .index
                .newlines_between(before, full_start),
            trailing_new_lines: self
                .index
                .newlines_between(full_end, after),
            eof: after == bytes.len(),
        }
    }

    /// Zero-width range at `offset`.
    fn point(
        &self,
        offset: usize,
    ) -> RangeWithBlankLines
    {
        self.range(offset, offset, offset, offset)
    }

    /// Disable marker in any attached comment.
    fn is_disabled(
        &self,
        meta: &StatementMeta,
    ) -> bool
    {
        let leading = meta
            .leading_comments
            .iter()
            .map(|c| c.text.as_str());
        let trailing = meta
            .trailing_comment_text
            .as_deref()
            .into_iter();
        mentions_marker(leading.chain(trailing), self.opts.disable_marker)
    }
}

/// Model a plain import declaration.
fn import_from_decl(
    decl: &ImportDecl,
    meta: StatementMeta,
) -> ImportStatement
{
    let binding = match (&decl.namespace, &decl.named)
    {
        (Some(alias), _) => Some(Binding::Namespace { alias: alias.clone() }),
        (None, Some(names)) => Some(Binding::Named { names: names.clone() }),
        (None, None) => None,
    };
    let is_script = decl
        .default_name
        .is_none()
        && binding.is_none();

    ImportStatement {
        meta,
        module_identifier: decl
            .module
            .clone(),
        kind: ImportKind::Plain,
        is_script,
        is_type_only: decl.is_type_only,
        default_name: decl
            .default_name
            .clone(),
        binding,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::NameBinding;

    const OPTS: ExtractOptions<'static> =
        ExtractOptions { disable_marker: "impsort: disable", force: false, format_exports: true };

    /// Node covering the first occurrence of `needle`.
    fn node_at(
        src: &str,
        needle: &str,
        kind: DeclKind,
    ) -> DeclNode
    {
        let start = src
            .find(needle)
            .expect("needle");
        DeclNode { kind, start, end: start + needle.len() }
    }

    fn import(module: &str) -> DeclKind
    {
        DeclKind::Import(ImportDecl {
            module: module.into(),
            named: Some(vec![NameBinding::new("x")]),
            ..Default::default()
        })
    }

    #[test]
    fn attaches_leading_and_trailing_comments()
    {
        let src = "// lead\nimport { x } from 'a'; // tail\nfoo();\n";
        let nodes = vec![
            node_at(src, "import { x } from 'a';", import("a")),
            node_at(src, "foo();", DeclKind::Other),
        ];
        let ex = Extractor::new(src, OPTS).extract(&nodes);
        let s = &ex.import_statements[0];

        assert_eq!(s.meta.leading_comments.len(), 1);
        assert_eq!(s.meta.leading_comments[0].text, "// lead");
        assert_eq!(s.meta.trailing_comment_text.as_deref(), Some(" // tail"));
        assert_eq!(s.meta.range.full_start.offset, 0);
        assert_eq!(s.meta.range.full_end.offset, src.find('\n').unwrap() + 1 + "import { x } from 'a'; // tail".len());
        assert_eq!(s.meta.range.trailing_new_lines, 1);
        assert!(!s.meta.range.eof);
    }

    #[test]
    fn banner_stays_global()
    {
        let src = "// Copyright\n\nimport { x } from 'a';\n";
        let nodes = vec![node_at(src, "import { x } from 'a';", import("a"))];
        let ex = Extractor::new(src, OPTS).extract(&nodes);
        let s = &ex.import_statements[0];

        assert!(s.meta.leading_comments.is_empty());
        assert_eq!(s.meta.range.leading_new_lines, 2);
        assert!(s.meta.range.eof);
    }

    #[test]
    fn disabled_statement_is_unhandled()
    {
        let src = "import { x } from 'a';\n// impsort: disable\nimport { x } from 'b';\n";
        let nodes = vec![
            node_at(src, "import { x } from 'a';", import("a")),
            node_at(src, "import { x } from 'b';", import("b")),
        ];
        let ex = Extractor::new(src, OPTS).extract(&nodes);

        assert_eq!(ex.import_statements.len(), 1);
        assert_eq!(ex.unhandled_count, 1);
        assert!(!ex.file_disabled);

        // force ignores the marker
        let forced = ExtractOptions { force: true, ..OPTS };
        let ex = Extractor::new(src, forced).extract(&nodes);
        assert_eq!(ex.import_statements.len(), 2);
    }

    #[test]
    fn header_marker_disables_file()
    {
        let src = "/* impsort: disable */\n\nimport { x } from 'a';\n";
        let nodes = vec![node_at(src, "import { x } from 'a';", import("a"))];
        let ex = Extractor::new(src, OPTS).extract(&nodes);
        assert!(ex.file_disabled);
    }

    #[test]
    fn insertion_point_without_imports_is_before_first_statement()
    {
        let src = "// banner\n\nconst a = 1;\n";
        let nodes = vec![node_at(src, "const a = 1;", DeclKind::Other)];
        let ex = Extractor::new(src, OPTS).extract(&nodes);

        match ex.insertion_point
        {
            InsertionPoint::Before(r) =>
            {
                assert_eq!(r.full_start.offset, src.find("const").unwrap());
                assert_eq!(r.leading_new_lines, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unmodeled_module_syntax_is_counted()
    {
        let src = "export * from 'a';\nexport default 1;\nexport const b = 2;\n";
        let nodes = vec![
            node_at(src, "export * from 'a';", DeclKind::ExportAll),
            node_at(src, "export default 1;", DeclKind::ExportAssignment),
            node_at(src, "export const b = 2;", DeclKind::ExportDeclaration),
        ];
        let ex = Extractor::new(src, OPTS).extract(&nodes);
        assert_eq!(ex.unhandled_count, 3);
        assert!(ex.import_statements.is_empty());
    }

    #[test]
    fn side_effect_import_is_script()
    {
        let src = "import 'polyfill';\n";
        let kind = DeclKind::Import(ImportDecl { module: "polyfill".into(), ..Default::default() });
        let nodes = vec![node_at(src, "import 'polyfill';", kind)];
        let ex = Extractor::new(src, OPTS).extract(&nodes);
        assert!(ex.import_statements[0].is_script);
    }
}
