//! Hierarchical import groups.
//!
//! Config rules compile into a `SortGroup` template once per run. Each file
//! clones the template, places its imports, sorts every bucket and renders
//! the tree back to text.
//!
//! Placement is two-pass: the first pass only fills leaf buckets, the
//! second lets any accepting ancestor take the statement. The root accepts
//! everything, so no statement is ever lost.

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Comparator, SortBy, SortRuleConfig, SortRules, sort_imports};
use crate::core::compose::Composer;
use crate::core::model::ImportStatement;
use crate::core::paths::is_builtin;
use crate::core::prune::compile_regex;
use crate::error::FormatError;

/// Which statements a group takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupFlag
{
    /// Side-effect imports only
    Scripts,
    /// Imports that bind something
    Named,
    All,
}

impl GroupFlag
{
    fn accepts(
        self,
        stmt: &ImportStatement,
    ) -> bool
    {
        match self
        {
            GroupFlag::All => true,
            GroupFlag::Scripts => stmt.is_script,
            GroupFlag::Named => !stmt.is_script,
        }
    }
}

/// Per-group override of the sort rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOverrideConfig
{
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<SortRuleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<SortRuleConfig>,
}

/// Detailed group rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRuleSpec
{
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<GroupFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOverrideConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_groups: Option<Vec<GroupRuleConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<bool>,
}

/// Group rule as written in config: a regex, a list of sub-rules, or a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupRuleConfig
{
    Regex(String),
    Nested(Vec<GroupRuleConfig>),
    Detailed(GroupRuleSpec),
}

impl GroupRuleConfig
{
    /// `{}`: the catch-all slot for everything no other rule claims.
    pub fn catch_all() -> Self
    {
        GroupRuleConfig::Detailed(GroupRuleSpec::default())
    }
}

/// Placement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass
{
    LeafOnly,
    AnyAncestor,
}

/// Runtime group node.
#[derive(Debug, Clone)]
pub struct SortGroup
{
    flag: Option<GroupFlag>,
    resolved: GroupFlag,
    regex: Option<Regex>,
    builtin: bool,
    paths: Option<Comparator>,
    names: Option<Comparator>,
    children: Vec<SortGroup>,
    scripts: Vec<ImportStatement>,
    named: Vec<ImportStatement>,
}

impl SortGroup
{
    /// Compile the top-level rules under an accept-all root.
    pub fn compile(rules: &[GroupRuleConfig]) -> Result<Self, FormatError>
    {
        let children = rules
            .iter()
            .map(Self::compile_rule)
            .collect::<Result<Vec<_>, _>>()?;
        let mut root = Self::node(None, None, false, children);
        root.resolve_flags(None);
        root.infer_flags();
        // The root is the final catch-all whatever its children say
        root.resolved = GroupFlag::All;
        Ok(root)
    }

    fn node(
        flag: Option<GroupFlag>,
        regex: Option<Regex>,
        builtin: bool,
        children: Vec<SortGroup>,
    ) -> Self
    {
        Self {
            flag,
            resolved: GroupFlag::All,
            regex,
            builtin,
            paths: None,
            names: None,
            children,
            scripts: Vec::new(),
            named: Vec::new(),
        }
    }

    fn compile_rule(rule: &GroupRuleConfig) -> Result<Self, FormatError>
    {
        match rule
        {
            GroupRuleConfig::Regex(r) => Ok(Self::node(None, Some(compile_regex("group_rules.regex", r)?), false, Vec::new())),
            GroupRuleConfig::Nested(rules) =>
            {
                let children = rules
                    .iter()
                    .map(Self::compile_rule)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::node(None, None, false, children))
            }
            GroupRuleConfig::Detailed(spec) =>
            {
                let regex = spec
                    .regex
                    .as_deref()
                    .map(|r| compile_regex("group_rules.regex", r))
                    .transpose()?;
                let children = spec
                    .sub_groups
                    .iter()
                    .flatten()
                    .map(Self::compile_rule)
                    .collect::<Result<Vec<_>, _>>()?;
                let mut node = Self::node(spec.flag, regex, spec.builtin == Some(true), children);
                if let Some(sort) = &spec.sort
                {
                    node.paths = sort
                        .paths
                        .as_ref()
                        .map(Comparator::from_config)
                        .transpose()?;
                    node.names = sort
                        .names
                        .as_ref()
                        .map(Comparator::from_config)
                        .transpose()?;
                }
                Ok(node)
            }
        }
    }

    /// Top-down: inherit the nearest explicit ancestor flag.
    fn resolve_flags(
        &mut self,
        inherited: Option<GroupFlag>,
    )
    {
        self.flag = self
            .flag
            .or(inherited);
        let flag = self.flag;
        for child in &mut self.children
        {
            child.resolve_flags(flag);
        }
    }

    /// Bottom-up: nodes still unset take their children's consensus.
    ///
    /// Returns the flag this node reports upward, `None` for no information.
    fn infer_flags(&mut self) -> Option<GroupFlag>
    {
        let reported: Vec<GroupFlag> = self
            .children
            .iter_mut()
            .filter_map(SortGroup::infer_flags)
            .collect();

        if let Some(flag) = self.flag
        {
            self.resolved = flag;
            return Some(flag);
        }

        let consensus = match reported.split_first()
        {
            None => None,
            Some((first, rest)) if rest.iter().all(|f| f == first) => Some(*first),
            Some(_) => Some(GroupFlag::All),
        };
        self.resolved = consensus.unwrap_or(GroupFlag::All);
        consensus
    }

    /// Resolved flag of this node.
    pub fn flag(&self) -> GroupFlag
    {
        self.resolved
    }

    pub fn children(&self) -> &[SortGroup]
    {
        &self.children
    }

    fn is_filtered(&self) -> bool
    {
        self.regex
            .is_some()
            || self.builtin
    }

    fn accepts(
        &self,
        stmt: &ImportStatement,
    ) -> bool
    {
        let path = &stmt.module_identifier;
        self.regex
            .as_ref()
            .is_none_or(|r| r.is_match(path))
            && (!self.builtin || is_builtin(path))
            && self
                .resolved
                .accepts(stmt)
    }

    /// Place one statement; the root always succeeds.
    pub fn insert(
        &mut self,
        stmt: ImportStatement,
    )
    {
        let stmt = match self.try_insert(stmt, Pass::LeafOnly, 0)
        {
            Ok(()) => return,
            Err(s) => s,
        };
        let stmt = match self.try_insert(stmt, Pass::AnyAncestor, 0)
        {
            Ok(()) => return,
            Err(s) => s,
        };
        self.bucket_for(&stmt)
            .push(stmt);
    }

    fn try_insert(
        &mut self,
        mut stmt: ImportStatement,
        pass: Pass,
        depth: usize,
    ) -> Result<(), ImportStatement>
    {
        // Filtered children get first pick, then catch-alls, in declared order.
        let order: Vec<usize> = (0..self
            .children
            .len())
            .sorted_by_key(|&i| !self.children[i].is_filtered())
            .collect();

        for i in order
        {
            if !self.children[i].accepts(&stmt)
            {
                continue;
            }
            match self.children[i].try_insert(stmt, pass, depth + 1)
            {
                Ok(()) => return Ok(()),
                Err(s) => stmt = s,
            }
        }

        let own_bucket_open = pass == Pass::AnyAncestor
            || self
                .children
                .is_empty();
        if own_bucket_open
            && self
                .resolved
                .accepts(&stmt)
        {
            trace!(path = %stmt.module_identifier, depth, ?pass, "placed import");
            self.bucket_for(&stmt)
                .push(stmt);
            return Ok(());
        }
        Err(stmt)
    }

    fn bucket_for(
        &mut self,
        stmt: &ImportStatement,
    ) -> &mut Vec<ImportStatement>
    {
        if stmt.is_script { &mut self.scripts } else { &mut self.named }
    }

    /// Sort every bucket; overrides apply to the group and its descendants.
    pub fn sort(
        &mut self,
        inherited: &SortRules,
    )
    {
        let rules = SortRules {
            paths: self
                .paths
                .clone()
                .unwrap_or_else(|| {
                    inherited
                        .paths
                        .clone()
                }),
            names: self
                .names
                .clone()
                .unwrap_or_else(|| {
                    inherited
                        .names
                        .clone()
                }),
            by: inherited.by,
        };

        // Scripts have no names; their order only follows paths.
        let script_rules = SortRules { by: SortBy::Paths, ..rules.clone() };
        self.scripts = sort_imports(std::mem::take(&mut self.scripts), &script_rules);
        self.named = sort_imports(std::mem::take(&mut self.named), &rules);

        for child in &mut self.children
        {
            child.sort(&rules);
        }
    }

    /// Total statements held by this subtree.
    pub fn len(&self) -> usize
    {
        self.scripts
            .len()
            + self
                .named
                .len()
            + self
                .children
                .iter()
                .map(SortGroup::len)
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// Render scripts, sub-groups, then named imports.
    ///
    /// Non-empty parts are separated by `blank_lines` empty lines.
    pub fn compose(
        &self,
        composer: &Composer,
        blank_lines: usize,
    ) -> Result<String, FormatError>
    {
        let mut parts: Vec<String> = Vec::new();

        if !self
            .scripts
            .is_empty()
        {
            parts.push(composer.compose_imports(&self.scripts)?);
        }
        for child in &self.children
        {
            let text = child.compose(composer, blank_lines)?;
            if !text.is_empty()
            {
                parts.push(text);
            }
        }
        if !self
            .named
            .is_empty()
        {
            parts.push(composer.compose_imports(&self.named)?);
        }

        Ok(parts.join(&"\n".repeat(blank_lines + 1)))
    }
}
