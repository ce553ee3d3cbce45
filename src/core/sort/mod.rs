//! Statement and member ordering.
//!
//! Goals
//! - Stable sorts only: a disabled key keeps source order.
//! - Member lists: `default`, then `X as default`, then the rest.
//! - Adjacent statements that became mergeable after sorting are merged,
//!   then their member lists are sorted and deduplicated again.

pub mod group;
pub mod segment;

pub use group::{GroupFlag, GroupRuleConfig, GroupRuleSpec, SortGroup, SortOverrideConfig};
pub use segment::{Comparator, SortRuleConfig};

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::merge::{MergeOutcome, merge_imports};
use crate::core::model::{Binding, ExportStatement, ImportStatement, NameBinding};

/// Primary statement key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy
{
    #[default]
    Paths,
    Names,
}

/// Comparators in effect for one group.
#[derive(Debug, Clone, Default)]
pub struct SortRules
{
    pub paths: Comparator,
    pub names: Comparator,
    pub by: SortBy,
}

/// Sort, dedup and normalize one member list.
///
/// `default_name` drops a redundant `default as D` when `D` is already the
/// default import.
pub fn sort_names(
    names: Vec<NameBinding>,
    default_name: Option<&str>,
    cmp: &Comparator,
) -> Vec<NameBinding>
{
    // Dedup by (property, alias); a name stays type-only only if every
    // occurrence was.
    let mut unique: IndexMap<(String, Option<String>), bool> = IndexMap::new();
    for n in names
    {
        if n.property_name == "default" && n.alias_name.is_some() && n.alias_name.as_deref() == default_name
        {
            continue;
        }
        let type_only = n.is_type_only;
        unique
            .entry((n.property_name, n.alias_name))
            .and_modify(|t| *t &= type_only)
            .or_insert(type_only);
    }

    let mut out: Vec<NameBinding> = unique
        .into_iter()
        .map(|((property_name, alias_name), is_type_only)| NameBinding { property_name, alias_name, is_type_only })
        .collect();
    out.sort_by(|a, b| compare_names(a, b, cmp));
    out
}

fn name_class(n: &NameBinding) -> u8
{
    if n.is_default_slot()
    {
        0
    }
    else if n.is_aliased_to_default()
    {
        1
    }
    else
    {
        2
    }
}

fn compare_names(
    a: &NameBinding,
    b: &NameBinding,
    cmp: &Comparator,
) -> Ordering
{
    if !cmp.is_enabled()
    {
        return Ordering::Equal;
    }
    name_class(a)
        .cmp(&name_class(b))
        .then_with(|| cmp.compare(&a.property_name, &b.property_name))
        .then_with(|| match (&a.alias_name, &b.alias_name)
        {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => cmp.compare(x, y),
        })
        .then_with(|| {
            a.is_type_only
                .cmp(&b.is_type_only)
        })
}

/// Sort the member list of one import in place.
pub fn sort_import_names(
    stmt: &mut ImportStatement,
    cmp: &Comparator,
)
{
    stmt.check_binding_default();
    let default_name = stmt
        .default_name
        .clone();
    if let Some(Binding::Named { names }) = &mut stmt.binding
    {
        *names = sort_names(std::mem::take(names), default_name.as_deref(), cmp);
    }
}

/// Sort the member list of one export in place.
pub fn sort_export_names(
    stmt: &mut ExportStatement,
    cmp: &Comparator,
)
{
    stmt.names = sort_names(std::mem::take(&mut stmt.names), None, cmp);
}

fn binding_rank(s: &ImportStatement) -> u8
{
    match s.binding
    {
        None => 0,
        Some(Binding::Namespace { .. }) => 1,
        Some(Binding::Named { .. }) => 2,
    }
}

/// First name a reader sees in the clause.
fn first_name(s: &ImportStatement) -> Option<&str>
{
    if let Some(d) = &s.default_name
    {
        return Some(d);
    }
    match &s.binding
    {
        Some(Binding::Namespace { alias }) => Some(alias),
        Some(Binding::Named { names }) => names
            .first()
            .map(|n| {
                n.property_name
                    .as_str()
            }),
        None => None,
    }
}

fn compare_opt(
    a: Option<&str>,
    b: Option<&str>,
    cmp: &Comparator,
) -> Ordering
{
    match (a, b)
    {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => cmp.compare(x, y),
    }
}

/// Tie-break for statements with the same path.
fn compare_clauses(
    a: &ImportStatement,
    b: &ImportStatement,
    cmp: &Comparator,
) -> Ordering
{
    // A default import sorts before a bare binding
    let default_order = match (&a.default_name, &b.default_name)
    {
        (Some(x), Some(y)) => cmp.compare(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    default_order
        .then_with(|| binding_rank(a).cmp(&binding_rank(b)))
        .then_with(|| compare_opt(first_name(a), first_name(b), cmp))
        .then_with(|| {
            a.is_type_only
                .cmp(&b.is_type_only)
        })
}

/// Statement order under `rules`.
pub fn compare_imports(
    a: &ImportStatement,
    b: &ImportStatement,
    rules: &SortRules,
) -> Ordering
{
    let by_path = || {
        rules
            .paths
            .compare(&a.module_identifier, &b.module_identifier)
    };
    match rules.by
    {
        SortBy::Paths => by_path().then_with(|| compare_clauses(a, b, &rules.names)),
        SortBy::Names => compare_opt(first_name(a), first_name(b), &rules.names)
            .then_with(by_path)
            .then_with(|| compare_clauses(a, b, &rules.names)),
    }
}

/// Full bucket pass: sort names, sort statements, merge neighbors, re-sort names.
pub fn sort_imports(
    mut stmts: Vec<ImportStatement>,
    rules: &SortRules,
) -> Vec<ImportStatement>
{
    for s in &mut stmts
    {
        sort_import_names(s, &rules.names);
    }
    stmts.sort_by(|a, b| compare_imports(a, b, rules));

    let mut out: Vec<ImportStatement> = Vec::with_capacity(stmts.len());
    for next in stmts
    {
        match out.pop()
        {
            Some(prev) => match merge_imports(prev, next)
            {
                MergeOutcome::Merged(m) => out.push(m),
                MergeOutcome::Distinct(prev, next) =>
                {
                    out.push(prev);
                    out.push(next);
                }
            },
            None => out.push(next),
        }
    }

    for s in &mut out
    {
        sort_import_names(s, &rules.names);
    }
    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn rules(
        paths: &[&str],
        names: &[&str],
    ) -> SortRules
    {
        SortRules {
            paths: Comparator::from_strs(paths).unwrap(),
            names: Comparator::from_strs(names).unwrap(),
            by: SortBy::Paths,
        }
    }

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

    fn names_of(s: &ImportStatement) -> Vec<&str>
    {
        s.local_names()
    }

    #[test]
    fn default_slots_lead()
    {
        let cmp = Comparator::default();
        let out = sort_names(
            vec![NameBinding::new("b"), NameBinding::aliased("x", "default"), NameBinding::new("default"), NameBinding::new("a")],
            None,
            &cmp,
        );
        let props: Vec<_> = out
            .iter()
            .map(|n| n.property_name.as_str())
            .collect();
        assert_eq!(props, vec!["default", "x", "a", "b"]);
    }

    #[test]
    fn disabled_names_keep_source_order()
    {
        let out = sort_names(
            vec![NameBinding::new("b"), NameBinding::aliased("default", "d"), NameBinding::new("a"), NameBinding::new("b")],
            None,
            &Comparator::disabled(),
        );
        assert_eq!(out, vec![NameBinding::new("b"), NameBinding::aliased("default", "d"), NameBinding::new("a")]);
    }

    #[test]
    fn dedup_keeps_value_binding()
    {
        let mut typed = NameBinding::new("A");
        typed.is_type_only = true;
        let out = sort_names(vec![typed, NameBinding::new("A")], None, &Comparator::default());
        assert_eq!(out, vec![NameBinding::new("A")]);
    }

    #[test]
    fn redundant_default_alias_is_dropped()
    {
        let out = sort_names(vec![NameBinding::aliased("default", "D"), NameBinding::new("x")], Some("D"), &Comparator::default());
        assert_eq!(out, vec![NameBinding::new("x")]);
    }

    #[test]
    fn adjacent_same_path_merges_after_sort()
    {
        let out = sort_imports(vec![named("m", &["b", "a"]), named("a", &["z"]), named("m", &["c"])], &rules(&["_", "aA"], &["az"]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].module_identifier, "a");
        assert_eq!(names_of(&out[1]), vec!["a", "b", "c"]);
    }

    #[test]
    fn disabled_paths_keep_source_order()
    {
        let out = sort_imports(vec![named("b", &["x"]), named("a", &["y"])], &rules(&[], &["aA"]));
        assert_eq!(out[0].module_identifier, "b");
    }

    #[test]
    fn sort_by_names()
    {
        let mut r = rules(&["_", "aA"], &["_", "aA"]);
        r.by = SortBy::Names;
        let out = sort_imports(vec![named("a", &["zed"]), named("b", &["alpha"])], &r);
        assert_eq!(out[0].module_identifier, "b");
    }

    #[test]
    fn namespace_before_named_for_same_path()
    {
        let ns = ImportStatement {
            is_script: false,
            binding: Some(Binding::Namespace { alias: "z".into() }),
            ..ImportStatement::script("m")
        };
        let out = sort_imports(vec![named("m", &["a"]), ns], &rules(&["_", "aA"], &["_", "aA"]));
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0].binding, Some(Binding::Namespace { .. })));
    }
}
