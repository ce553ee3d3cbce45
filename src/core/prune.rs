//! Unused-import pruning.
//!
//! The pruner only ever removes what the usage report positively calls
//! unused. Missing data means "used", and keep rules win over both.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::model::{Binding, ImportKind, ImportStatement};
use crate::error::FormatError;

/// Usage facts for the current file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageReport
{
    /// Names known to be referenced; `None` when unknown
    pub used_names: Option<HashSet<String>>,
    /// Names known to be unreferenced; `None` when unknown
    pub unused_names: Option<HashSet<String>>,
    /// Start offsets of statements whose every name is unused
    pub unused_statements: HashSet<usize>,
}

impl UsageReport
{
    /// Report that removes nothing.
    pub fn assume_all_used() -> Self
    {
        Self::default()
    }

    fn is_unused(
        &self,
        name: &str,
    ) -> bool
    {
        let flagged = self
            .unused_names
            .as_ref()
            .is_some_and(|u| u.contains(name));
        let used = self
            .used_names
            .as_ref()
            .is_some_and(|u| u.contains(name));
        flagged && !used
    }
}

/// Source of usage facts.
pub trait UsageSource
{
    fn report(
        &self,
        imports: &[ImportStatement],
    ) -> anyhow::Result<UsageReport>;
}

/// Usage source backed by identifiers collected from the syntax tree.
#[derive(Debug, Clone, Default)]
pub struct IdentifierScanner
{
    pub referenced: HashSet<String>,
    /// JSX present: the classic factory `React` counts as used
    pub has_jsx: bool,
}

impl UsageSource for IdentifierScanner
{
    fn report(
        &self,
        imports: &[ImportStatement],
    ) -> anyhow::Result<UsageReport>
    {
        let mut used = self
            .referenced
            .clone();
        if self.has_jsx
        {
            used.insert("React".to_owned());
        }

        let mut unused = HashSet::new();
        let mut unused_statements = HashSet::new();
        for stmt in imports
        {
            let names = stmt.local_names();
            let mut all_unused = !names.is_empty();
            for name in names
            {
                if used.contains(name)
                {
                    all_unused = false;
                }
                else
                {
                    unused.insert(name.to_owned());
                }
            }
            if all_unused
            {
                unused_statements.insert(
                    stmt.meta
                        .range
                        .start
                        .offset,
                );
            }
        }

        Ok(UsageReport { used_names: Some(used), unused_names: Some(unused), unused_statements })
    }
}

/// Keep rule as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeepUnusedConfig
{
    /// Path regex; keeps every name
    Path(String),
    Detailed
    {
        path: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        names: Vec<String>,
    },
}

/// Compiled keep rule.
#[derive(Debug, Clone)]
pub struct KeepRule
{
    pub path: Regex,
    /// Empty keeps the whole statement
    pub names: Vec<Regex>,
}

impl KeepRule
{
    pub fn compile(cfg: &KeepUnusedConfig) -> Result<Self, FormatError>
    {
        let (path, names) = match cfg
        {
            KeepUnusedConfig::Path(p) => (p.as_str(), &[][..]),
            KeepUnusedConfig::Detailed { path, names } => (path.as_str(), names.as_slice()),
        };
        let path = compile_regex("keep_unused.path", path)?;
        let names = names
            .iter()
            .map(|n| compile_regex("keep_unused.names", n))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { path, names })
    }

    fn keeps_statement(
        &self,
        module: &str,
    ) -> bool
    {
        self.names
            .is_empty()
            && self
                .path
                .is_match(module)
    }

    fn keeps_name(
        &self,
        module: &str,
        name: &str,
    ) -> bool
    {
        self.path
            .is_match(module)
            && (self
                .names
                .is_empty()
                || self
                    .names
                    .iter()
                    .any(|r| r.is_match(name)))
    }
}

pub(crate) fn compile_regex(
    field: &'static str,
    pattern: &str,
) -> Result<Regex, FormatError>
{
    Regex::new(pattern).map_err(|source| FormatError::InvalidRegex { field, pattern: pattern.to_owned(), source })
}

/// Ask `source` for a report, degrading to "all used" on failure.
pub fn collect_usage(
    source: &dyn UsageSource,
    imports: &[ImportStatement],
) -> UsageReport
{
    match source.report(imports)
    {
        Ok(report) => report,
        Err(err) =>
        {
            warn!(error = %err, "usage data unavailable; keeping all imports");
            UsageReport::assume_all_used()
        }
    }
}

/// Drop unused bindings and the statements they empty out.
pub fn prune_imports(
    stmts: Vec<ImportStatement>,
    report: &UsageReport,
    keep: &[KeepRule],
) -> Vec<ImportStatement>
{
    let before = stmts.len();
    let out: Vec<ImportStatement> = stmts
        .into_iter()
        .filter_map(|s| prune_one(s, report, keep))
        .collect();
    debug!(before, after = out.len(), "pruned imports");
    out
}

fn prune_one(
    mut stmt: ImportStatement,
    report: &UsageReport,
    keep: &[KeepRule],
) -> Option<ImportStatement>
{
    if stmt.is_script
    {
        return Some(stmt);
    }
    let module = stmt
        .module_identifier
        .clone();
    if keep
        .iter()
        .any(|k| k.keeps_statement(&module))
    {
        return Some(stmt);
    }

    let kept = |name: &str| keep.iter().any(|k| k.keeps_name(&module, name));
    let whole = report
        .unused_statements
        .contains(
            &stmt
                .meta
                .range
                .start
                .offset,
        );
    let unused_here = |name: &str| !kept(name) && (whole || report.is_unused(name));

    if stmt.kind == ImportKind::EqualsRequire
    {
        let unused = stmt
            .default_name
            .as_deref()
            .is_some_and(&unused_here);
        return if unused { None } else { Some(stmt) };
    }

    let mut removed = false;
    if stmt
        .default_name
        .as_deref()
        .is_some_and(&unused_here)
    {
        stmt.default_name = None;
        removed = true;
    }
    let namespace_unused = matches!(&stmt.binding, Some(Binding::Namespace { alias }) if unused_here(alias));
    if namespace_unused
    {
        stmt.binding = None;
        removed = true;
    }
    else if let Some(Binding::Named { names }) = &mut stmt.binding
    {
        let n = names.len();
        names.retain(|b| !unused_here(b.local_name()));
        removed |= names.len() != n;
    }

    // Only statements this pass emptied go away; `import {} from 'x'` stays.
    if removed && stmt.is_empty() { None } else { Some(stmt) }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::NameBinding;

    fn report(
        used: &[&str],
        unused: &[&str],
    ) -> UsageReport
    {
        UsageReport {
            used_names: Some(
                used.iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            unused_names: Some(
                unused
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            unused_statements: HashSet::new(),
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

    #[test]
    fn drops_only_flagged_names()
    {
        let out = prune_imports(vec![named("m", &["a", "b"])], &report(&["a"], &["b"]), &[]);
        assert_eq!(out[0].local_names(), vec!["a"]);
    }

    #[test]
    fn missing_data_never_deletes()
    {
        let out = prune_imports(vec![named("m", &["a"])], &UsageReport::assume_all_used(), &[]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn used_wins_over_unused()
    {
        let out = prune_imports(vec![named("m", &["a"])], &report(&["a"], &["a"]), &[]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn emptied_statement_is_deleted()
    {
        let out = prune_imports(vec![named("m", &["a"]), named("n", &[])], &report(&[], &["a"]), &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].module_identifier, "n");
    }

    #[test]
    fn scripts_survive()
    {
        let out = prune_imports(vec![ImportStatement::script("polyfill")], &report(&[], &["x"]), &[]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn keep_rules()
    {
        let whole = KeepRule::compile(&KeepUnusedConfig::Path("^react$".into())).unwrap();
        let some = KeepRule::compile(&KeepUnusedConfig::Detailed { path: "^m$".into(), names: vec!["^k".into()] })
            .unwrap();
        let r = report(&[], &["React", "keep", "drop"]);

        let mut react = named("react", &[]);
        react.default_name = Some("React".into());
        let out = prune_imports(vec![react, named("m", &["keep", "drop"])], &r, &[whole, some]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].local_names(), vec!["keep"]);
    }

    #[test]
    fn whole_statement_flag_clears_names()
    {
        let mut s = named("m", &["a"]);
        s.default_name = Some("D".into());
        let mut r = UsageReport::assume_all_used();
        r.unused_statements
            .insert(0);
        assert!(prune_imports(vec![s], &r, &[]).is_empty());
    }

    #[test]
    fn scanner_marks_react_for_jsx()
    {
        let mut react = named("react", &[]);
        react.default_name = Some("React".into());
        let scanner = IdentifierScanner { referenced: HashSet::new(), has_jsx: true };
        let r = scanner
            .report(&[react])
            .unwrap();
        assert!(!r.is_unused("React"));
        assert!(r.unused_statements.is_empty());
    }

    #[test]
    fn scanner_flags_unreferenced()
    {
        let scanner = IdentifierScanner { referenced: ["a".to_string()].into_iter().collect(), has_jsx: false };
        let r = scanner
            .report(&[named("m", &["a", "b"]), named("n", &["c"])])
            .unwrap();
        assert!(r.is_unused("b"));
        assert!(!r.is_unused("a"));
        assert_eq!(r.unused_statements.len(), 1);
    }

    #[test]
    fn bad_regex_is_reported()
    {
        let err = KeepRule::compile(&KeepUnusedConfig::Path("(".into())).unwrap_err();
        assert!(matches!(err, FormatError::InvalidRegex { field: "keep_unused.path", .. }));
    }
}
