//! Filepath: src/infra/utils.rs
//! Tree-sitter helpers shared by parser front-ends.
//! All functions are associated fns to keep call sites
//! ergonomic and discoverable.

// Tree-sitter types for node helpers
use tree_sitter::Node;

/// Common Tree-sitter node helpers
pub struct TsNodeUtils;

impl TsNodeUtils
{
    /// Extract text of a child field if present
    pub fn field_text<'a>(
        node: Node,
        field: &str,
        bytes: &'a [u8],
    ) -> Option<&'a str>
    {
        // Locate the child by field name
        let child = node.child_by_field_name(field)?;

        // Convert to utf8 text
        child
            .utf8_text(bytes)
            .ok()
    }

    /// Whether `node` has an unnamed child token spelled `token`
    pub fn has_token(
        node: Node,
        token: &str,
    ) -> bool
    {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .any(|c| !c.is_named() && c.kind() == token)
    }

    /// First named child of the given kind
    pub fn named_child_of_kind<'a>(
        node: Node<'a>,
        kind: &str,
    ) -> Option<Node<'a>>
    {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .find(|c| c.kind() == kind)
    }

    /// First node in document order that is an error or a missing token
    pub fn first_error(node: Node) -> Option<Node>
    {
        if node.is_error() || node.is_missing()
        {
            return Some(node);
        }
        if !node.has_error()
        {
            return None;
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node
            .children(&mut cursor)
            .collect();
        children
            .into_iter()
            .find_map(Self::first_error)
            .or(Some(node))
    }
}

/// String-literal helpers
pub struct LiteralUtils;

impl LiteralUtils
{
    /// Strip one pair of matching quotes, leaving escapes untouched
    pub fn unquote(s: &str) -> &str
    {
        let bytes = s.as_bytes();
        if bytes.len() >= 2
        {
            let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
            if first == last && matches!(first, b'\'' | b'"' | b'`')
            {
                return &s[1..s.len() - 1];
            }
        }
        s
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn parse(src: &str) -> tree_sitter::Tree
    {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        parser
            .parse(src, None)
            .unwrap()
    }

    #[test]
    fn unquote_strips_matching_pairs_only()
    {
        assert_eq!(LiteralUtils::unquote("'react'"), "react");
        assert_eq!(LiteralUtils::unquote("\"./a\""), "./a");
        assert_eq!(LiteralUtils::unquote("'a\""), "'a\"");
        assert_eq!(LiteralUtils::unquote("'"), "'");
        assert_eq!(LiteralUtils::unquote(""), "");
    }

    #[test]
    fn field_and_token_lookups()
    {
        let src = "import type { A } from 'a';";
        let tree = parse(src);
        let stmt = tree
            .root_node()
            .named_child(0)
            .unwrap();

        assert_eq!(stmt.kind(), "import_statement");
        assert_eq!(TsNodeUtils::field_text(stmt, "source", src.as_bytes()), Some("'a'"));
        assert!(TsNodeUtils::has_token(stmt, "type"));
        assert!(TsNodeUtils::named_child_of_kind(stmt, "import_clause").is_some());
        assert!(TsNodeUtils::first_error(tree.root_node()).is_none());
    }

    #[test]
    fn first_error_points_into_source()
    {
        let src = "const x = foo(;\n";
        let tree = parse(src);
        assert!(
            tree.root_node()
                .has_error()
        );
        let err = TsNodeUtils::first_error(tree.root_node()).unwrap();
        assert!(err.start_byte() <= src.len());
    }
}
