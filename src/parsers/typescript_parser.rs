//! Filepath: src/parsers/typescript_parser.rs
//! ------------------------------------------------------------------
//! TypeScript / JavaScript front-end built on Tree-sitter 0.25.x.
//! Goals:
//!   - Classify every top-level statement into a `DeclKind`.
//!   - Model only the import/export shapes the rewriter can
//!     reproduce exactly; everything else stays opaque.
//!   - Collect referenced identifiers for unused-import pruning.
//!
//! Notes:
//!   - Comments are not nodes here; the extractor rescans the
//!     gaps between statements for them.
//!   - The grammar is picked by file extension. `.tsx` uses the
//!     TSX grammar, `.js`-family files the JavaScript grammar
//!     (which parses JSX natively).
//!   - A tree with any ERROR/MISSING node is rejected with a
//!     labeled diagnostic; nothing is rewritten.
//! ------------------------------------------------------------------

use std::collections::HashSet;
use std::path::Path;

use tracing::trace;
use tree_sitter::{Language, Node, Parser};

use crate::core::extract::{DeclKind, DeclNode, ExportDecl, ImportDecl, ParsedSource, SourceParser};
use crate::core::model::NameBinding;
use crate::error::{FormatError, SyntaxError};
use crate::infra::utils::{LiteralUtils, TsNodeUtils};

/// Extensions the front-end accepts.
pub const SOURCE_EXTENSIONS: [&str; 8] = ["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Node kinds that name a binding in expression or type position.
const REFERENCE_KINDS: [&str; 3] = ["identifier", "type_identifier", "shorthand_property_identifier"];

/// Grammar flavor for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Dialect {
    /// Dialect for `path`, `None` for unsupported extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
            "tsx" => Some(Dialect::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Dialect::JavaScript),
            _ => None,
        }
    }

    fn language(self) -> Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Whether `path` has a supported source extension.
pub fn is_source_file(path: &Path) -> bool {
    Dialect::from_path(path).is_some()
}

/// Tree-sitter backed `SourceParser` for TS/JS.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptParser;

impl TypeScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for TypeScriptParser {
    fn parse(&self, text: &str, path: &Path) -> Result<ParsedSource, FormatError> {
        // Unknown extensions fall back to plain TypeScript.
        let dialect = Dialect::from_path(path).unwrap_or(Dialect::TypeScript);

        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|e| FormatError::Parser(e.to_string()))?;

        let tree = parser
            .parse(text, None)
            .ok_or_else(|| FormatError::Parser(format!("no syntax tree for {}", path.display())))?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(syntax_error(root, text, path).into());
        }

        // Use the same byte slice for every utf8_text call.
        let bytes = text.as_bytes();

        let mut nodes = Vec::with_capacity(root.named_child_count());
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            // Comments and `#!` lines are trivia for the extractor.
            if matches!(child.kind(), "comment" | "hash_bang_line") {
                continue;
            }
            let kind = classify(child, bytes);
            trace!(node = child.kind(), ?kind, "classified");
            nodes.push(DeclNode { kind, start: child.start_byte(), end: child.end_byte() });
        }

        let (referenced, has_jsx) = scan_references(root, bytes);

        Ok(ParsedSource { nodes, referenced, has_jsx })
    }
}

/// Map one top-level statement to its declaration kind.
fn classify(node: Node, bytes: &[u8]) -> DeclKind {
    match node.kind() {
        "import_statement" => classify_import(node, bytes),
        "import_alias" => DeclKind::ImportAlias,
        "export_statement" => classify_export(node, bytes),
        _ => DeclKind::Other,
    }
}

fn classify_import(node: Node, bytes: &[u8]) -> DeclKind {
    // Flow-style `import typeof` has no modeled equivalent.
    if TsNodeUtils::has_token(node, "typeof") {
        return DeclKind::ImportAlias;
    }
    let is_type_only = TsNodeUtils::has_token(node, "type");

    // `import x = require('y')`
    if let Some(req) = TsNodeUtils::named_child_of_kind(node, "import_require_clause") {
        let name = TsNodeUtils::named_child_of_kind(req, "identifier").and_then(|n| n.utf8_text(bytes).ok());
        let module = TsNodeUtils::field_text(req, "source", bytes);
        return match (name, module) {
            (Some(name), Some(module)) => DeclKind::ImportEqualsRequire {
                name: name.to_string(),
                module: LiteralUtils::unquote(module).to_string(),
                is_type_only,
            },
            _ => DeclKind::ImportAlias,
        };
    }

    let Some(module) = TsNodeUtils::field_text(node, "source", bytes) else {
        return DeclKind::ImportAlias;
    };

    let mut decl = ImportDecl {
        module: LiteralUtils::unquote(module).to_string(),
        is_type_only,
        has_attributes: TsNodeUtils::named_child_of_kind(node, "import_attribute").is_some(),
        ..Default::default()
    };

    if let Some(clause) = TsNodeUtils::named_child_of_kind(node, "import_clause") {
        let mut cursor = clause.walk();
        for part in clause.named_children(&mut cursor) {
            match part.kind() {
                "identifier" => {
                    decl.default_name = part.utf8_text(bytes).ok().map(str::to_string);
                }
                "namespace_import" => {
                    decl.namespace = TsNodeUtils::named_child_of_kind(part, "identifier")
                        .and_then(|n| n.utf8_text(bytes).ok())
                        .map(str::to_string);
                }
                "named_imports" => {
                    decl.named = Some(specifiers(part, "import_specifier", bytes));
                }
                _ => {}
            }
        }
    }

    DeclKind::Import(decl)
}

fn classify_export(node: Node, bytes: &[u8]) -> DeclKind {
    // `export const x`, `export function f`, `export default class ...`
    if node.child_by_field_name("declaration").is_some() {
        return DeclKind::ExportDeclaration;
    }
    // `export default x`, `export = x`, `export as namespace X`
    if TsNodeUtils::has_token(node, "default")
        || TsNodeUtils::has_token(node, "=")
        || TsNodeUtils::has_token(node, "namespace")
    {
        return DeclKind::ExportAssignment;
    }
    // `export * from 'x'`, `export * as ns from 'x'`
    if TsNodeUtils::has_token(node, "*") || TsNodeUtils::named_child_of_kind(node, "namespace_export").is_some() {
        return DeclKind::ExportAll;
    }
    // Attribute clauses on re-exports cannot be reproduced.
    if TsNodeUtils::named_child_of_kind(node, "import_attribute").is_some() {
        return DeclKind::ExportDeclaration;
    }

    match TsNodeUtils::named_child_of_kind(node, "export_clause") {
        Some(clause) => DeclKind::Export(ExportDecl {
            module: TsNodeUtils::field_text(node, "source", bytes).map(|m| LiteralUtils::unquote(m).to_string()),
            is_type_only: TsNodeUtils::has_token(node, "type"),
            names: specifiers(clause, "export_specifier", bytes),
        }),
        None => DeclKind::ExportDeclaration,
    }
}

/// Collect `name [as alias]` members of a brace list.
fn specifiers(list: Node, kind: &str, bytes: &[u8]) -> Vec<NameBinding> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|n| n.kind() == kind)
        .filter_map(|spec| {
            let name = TsNodeUtils::field_text(spec, "name", bytes)?;
            let alias = TsNodeUtils::field_text(spec, "alias", bytes);
            Some(NameBinding {
                property_name: LiteralUtils::unquote(name).to_string(),
                alias_name: alias.map(|a| LiteralUtils::unquote(a).to_string()),
                is_type_only: TsNodeUtils::has_token(spec, "type"),
            })
        })
        .collect()
}

/// Subtrees whose identifiers are not uses of imported bindings.
fn skips_subtree(node: Node) -> bool {
    match node.kind() {
        "import_statement" => true,
        // `export { a } from 'x'` names another module's bindings.
        "export_statement" => node.child_by_field_name("source").is_some(),
        _ => false,
    }
}

/// Every identifier referenced outside import declarations, plus
/// whether the file contains JSX.
fn scan_references(root: Node, bytes: &[u8]) -> (HashSet<String>, bool) {
    let mut referenced = HashSet::new();
    let mut has_jsx = false;
    let mut cursor = root.walk();

    'walk: loop {
        let node = cursor.node();
        if !skips_subtree(node) {
            let kind = node.kind();
            if kind.starts_with("jsx_") {
                has_jsx = true;
            }
            if REFERENCE_KINDS.contains(&kind) {
                if let Ok(text) = node.utf8_text(bytes) {
                    referenced.insert(text.to_string());
                }
            }
            if cursor.goto_first_child() {
                continue;
            }
        }

        // Next sibling, climbing until one exists.
        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    (referenced, has_jsx)
}

fn syntax_error(root: Node, text: &str, path: &Path) -> SyntaxError {
    let node = TsNodeUtils::first_error(root).unwrap_or(root);
    let start = node.start_byte();
    let len = node.end_byte().saturating_sub(start);
    let pos = node.start_position();

    let help = if node.is_missing() {
        format!("expected `{}` at line {}, column {}", node.kind(), pos.row + 1, pos.column + 1)
    } else {
        format!("unexpected syntax at line {}, column {}", pos.row + 1, pos.column + 1)
    };

    SyntaxError {
        file: path.display().to_string(),
        src: text.to_string(),
        span: (start, len).into(),
        help,
    }
}
