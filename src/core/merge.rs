//! Statement merging.
//!
//! Merges consume both inputs and hand them back untouched when they
//! cannot be combined, so callers never clone statements to probe.
//! A merged statement keeps the range of its first input.

use indexmap::IndexMap;
use tracing::debug;

use crate::core::model::{Binding, ExportStatement, ImportKind, ImportStatement};

/// Result of trying to merge two statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome<T>
{
    Merged(T),
    Distinct(T, T),
}

/// Bucket key: statements in different buckets never merge.
type ImportKey = (String, ImportKind, bool);
type ExportKey = (Option<String>, bool);

/// Merge two imports of the same module.
pub fn merge_imports(
    mut a: ImportStatement,
    mut b: ImportStatement,
) -> MergeOutcome<ImportStatement>
{
    if a.module_identifier != b.module_identifier
        || a.kind != b.kind
        || a.is_type_only != b.is_type_only
        || !a
            .meta
            .can_absorb(&b.meta)
    {
        return MergeOutcome::Distinct(a, b);
    }

    a.check_binding_default();
    b.check_binding_default();

    if a.kind == ImportKind::EqualsRequire
    {
        if a.default_name != b.default_name
        {
            return MergeOutcome::Distinct(a, b);
        }
        a.meta
            .absorb(b.meta);
        return MergeOutcome::Merged(a);
    }

    // Scripts fold into whatever they meet
    if b.is_script
    {
        a.meta
            .absorb(b.meta);
        return MergeOutcome::Merged(a);
    }
    if a.is_script
    {
        a.meta
            .absorb(b.meta);
        return MergeOutcome::Merged(ImportStatement { meta: a.meta, ..b });
    }

    let defaults_clash = matches!((&a.default_name, &b.default_name), (Some(x), Some(y)) if x != y);
    if defaults_clash || !bindings_compatible(&a.binding, &b.binding)
    {
        return MergeOutcome::Distinct(a, b);
    }

    let binding = combine_bindings(
        a.binding
            .take(),
        b.binding
            .take(),
    );
    a.default_name = a
        .default_name
        .take()
        .or(b.default_name);
    a.binding = binding;
    a.meta
        .absorb(b.meta);
    MergeOutcome::Merged(a)
}

fn bindings_compatible(
    a: &Option<Binding>,
    b: &Option<Binding>,
) -> bool
{
    match (a, b)
    {
        (None, _) | (_, None) => true,
        (Some(Binding::Namespace { alias: x }), Some(Binding::Namespace { alias: y })) => x == y,
        (Some(Binding::Namespace { .. }), Some(other)) | (Some(other), Some(Binding::Namespace { .. })) =>
        {
            other.is_empty()
        }
        (Some(Binding::Named { .. }), Some(Binding::Named { .. })) => true,
    }
}

/// Combine two bindings already known to be compatible.
fn combine_bindings(
    a: Option<Binding>,
    b: Option<Binding>,
) -> Option<Binding>
{
    match (a, b)
    {
        (None, x) | (x, None) => x,
        (Some(Binding::Named { names: mut x }), Some(Binding::Named { names: y })) =>
        {
            x.extend(y);
            Some(Binding::Named { names: x })
        }
        (Some(ns @ Binding::Namespace { .. }), Some(_)) => Some(ns),
        (Some(_), Some(ns @ Binding::Namespace { .. })) => Some(ns),
    }
}

/// Fold every import into the first earlier compatible one.
pub fn merge_all_imports(stmts: Vec<ImportStatement>) -> Vec<ImportStatement>
{
    let before = stmts.len();
    let mut buckets: IndexMap<ImportKey, Vec<ImportStatement>> = IndexMap::new();

    for stmt in stmts
    {
        let key = (stmt.module_identifier.clone(), stmt.kind, stmt.is_type_only);
        let bucket = buckets
            .entry(key)
            .or_default();
        fold_into(bucket, stmt, merge_imports);
    }

    let mut out: Vec<ImportStatement> = buckets
        .into_values()
        .flatten()
        .collect();
    out.sort_by_key(|s| {
        s.meta
            .range
            .full_start
    });
    debug!(before, after = out.len(), "merged imports");
    out
}

/// Merge two exports of the same source (or two local lists).
pub fn merge_exports(
    mut a: ExportStatement,
    b: ExportStatement,
) -> MergeOutcome<ExportStatement>
{
    if a.module_identifier != b.module_identifier
        || a.is_type_only != b.is_type_only
        || !a
            .meta
            .can_absorb(&b.meta)
    {
        return MergeOutcome::Distinct(a, b);
    }
    a.names
        .extend(b.names);
    a.meta
        .absorb(b.meta);
    MergeOutcome::Merged(a)
}

/// Merge exports and settle empty `export {}` markers.
///
/// `module_elsewhere` is true when the file is a module without the
/// marker (handled imports or untouched import/export syntax exist).
pub fn merge_all_exports(
    stmts: Vec<ExportStatement>,
    module_elsewhere: bool,
) -> Vec<ExportStatement>
{
    let (empties, others): (Vec<_>, Vec<_>) = stmts
        .into_iter()
        .partition(ExportStatement::is_empty_local);

    let mut buckets: IndexMap<ExportKey, Vec<ExportStatement>> = IndexMap::new();
    for stmt in others
    {
        let key = (stmt.module_identifier.clone(), stmt.is_type_only);
        let bucket = buckets
            .entry(key)
            .or_default();
        fold_into(bucket, stmt, merge_exports);
    }
    let mut out: Vec<ExportStatement> = buckets
        .into_values()
        .flatten()
        .collect();

    let mut kept_empty: Vec<ExportStatement> = Vec::new();
    for empty in empties
    {
        if let Some(target) = out
            .iter_mut()
            .find(|s| {
                s.meta
                    .can_absorb(&empty.meta)
            })
        {
            target
                .meta
                .absorb(empty.meta);
            continue;
        }
        if module_elsewhere
            && !empty
                .meta
                .has_comments()
        {
            continue;
        }
        fold_into(&mut kept_empty, empty, merge_exports);
    }

    out.extend(kept_empty);
    out.sort_by_key(|s| {
        s.meta
            .range
            .full_start
    });
    out
}

/// Merge `incoming` into the first compatible entry of `bucket`.
fn fold_into<T>(
    bucket: &mut Vec<T>,
    incoming: T,
    merge: fn(T, T) -> MergeOutcome<T>,
)
{
    let mut pending = Some(incoming);
    for prev in std::mem::take(bucket)
    {
        match pending.take()
        {
            Some(next) => match merge(prev, next)
            {
                MergeOutcome::Merged(m) => bucket.push(m),
                MergeOutcome::Distinct(prev, next) =>
                {
                    bucket.push(prev);
                    pending = Some(next);
                }
            },
            None => bucket.push(prev),
        }
    }
    if let Some(next) = pending
    {
        bucket.push(next);
    }
}
