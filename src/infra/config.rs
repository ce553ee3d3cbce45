use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{AppContext, InitArgs};
use crate::core::compose::{ComposeStyle, QuoteMark, TrailingComma, WrapLimits};
use crate::core::edit::Eol;
use crate::core::paths::{NodeProtocol, PathStyle};
use crate::core::prune::{KeepRule, KeepUnusedConfig, compile_regex};
use crate::core::sort::{Comparator, GroupRuleConfig, SortBy, SortGroup, SortRuleConfig, SortRules};
use crate::error::FormatError;

/// Config file names, first match wins.
pub const CONFIG_FILES: [&str; 4] = ["impsort.toml", "impsort.yaml", "impsort.json", ".impsort.toml"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabType
{
    #[default]
    Space,
    Tab,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortRulesConfig
{
    pub paths: SortRuleConfig,
    pub names: SortRuleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Longest rendered line before wrapping
    pub max_line_length: usize,

    pub tab_type: TabType,
    pub tab_size: usize,
    pub quote_mark: QuoteMark,
    pub trailing_comma: TrailingComma,
    pub has_semicolon: bool,
    pub bracket_spacing: bool,

    /// `paths` or `names`
    pub sort_imports_by: SortBy,

    /// Group layout; `{}` marks the catch-all slot
    pub group_rules: Vec<GroupRuleConfig>,

    /// Imports never pruned
    pub keep_unused: Vec<KeepUnusedConfig>,
    pub remove_unused_imports: bool,

    pub empty_lines_between_groups: usize,
    pub empty_lines_after_all_imports: usize,

    /// Unset preserves whatever the file does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_final_newline: Option<bool>,

    /// Unset detects from the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eol: Option<Eol>,

    pub format_exports: bool,

    /// Ignore disable markers and exclusion rules
    pub force: bool,
    pub disable_marker: String,

    pub remove_last_slash_in_path: bool,
    pub remove_last_index_in_path: bool,
    pub node_protocol: NodeProtocol,

    /// Path regexes to skip
    pub exclude: Vec<String>,
    /// Path globs to skip
    pub exclude_glob: Vec<String>,

    /// Member caps for single-line and wrapped lists
    pub wrapping: WrapLimits,

    /// Segment rules for paths and names
    pub sort_rules: SortRulesConfig,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            max_line_length: 80,
            tab_type: TabType::Space,
            tab_size: 2,
            quote_mark: QuoteMark::Single,
            trailing_comma: TrailingComma::MultiLine,
            has_semicolon: true,
            bracket_spacing: true,
            sort_imports_by: SortBy::Paths,
            group_rules: vec![
                GroupRuleConfig::Regex("^react(-dom)?$".to_string()),
                GroupRuleConfig::Regex("^@angular/".to_string()),
                GroupRuleConfig::Regex("^vue$".to_string()),
                GroupRuleConfig::Regex("^node:".to_string()),
                GroupRuleConfig::catch_all(),
                GroupRuleConfig::Regex("^[@]".to_string()),
                GroupRuleConfig::Regex("^[.]".to_string()),
            ],
            keep_unused: Vec::new(),
            remove_unused_imports: false,
            empty_lines_between_groups: 1,
            empty_lines_after_all_imports: 1,
            insert_final_newline: None,
            eol: None,
            format_exports: true,
            force: false,
            disable_marker: "impsort: disable".to_string(),
            remove_last_slash_in_path: false,
            remove_last_index_in_path: false,
            node_protocol: NodeProtocol::Preserve,
            exclude: Vec::new(),
            exclude_glob: vec!["**/node_modules/**".to_string()],
            wrapping: WrapLimits::default(),
            sort_rules: SortRulesConfig::default(),
        }
    }
}

/// Config validated and compiled for one run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig
{
    pub style: ComposeStyle,
    pub sort_rules: SortRules,
    /// Group template, cloned per file
    pub groups: SortGroup,
    pub keep_unused: Vec<KeepRule>,
    pub remove_unused: bool,
    pub empty_lines_between_groups: usize,
    pub empty_lines_after_all_imports: usize,
    pub insert_final_newline: Option<bool>,
    pub eol: Option<Eol>,
    pub format_exports: bool,
    pub force: bool,
    pub disable_marker: String,
    pub path_style: PathStyle,
    exclude: Vec<Regex>,
    exclude_glob: GlobSet,
}

impl Config
{
    /// Compile regexes, comparators and the group tree.
    pub fn compile(&self) -> Result<ResolvedConfig, FormatError>
    {
        let indent = match self.tab_type
        {
            TabType::Tab => "\t".to_string(),
            TabType::Space => " ".repeat(self.tab_size),
        };

        let sort_rules = SortRules {
            paths: Comparator::from_config(
                &self
                    .sort_rules
                    .paths,
            )?,
            names: Comparator::from_config(
                &self
                    .sort_rules
                    .names,
            )?,
            by: self.sort_imports_by,
        };

        let keep_unused = self
            .keep_unused
            .iter()
            .map(KeepRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let exclude = self
            .exclude
            .iter()
            .map(|p| compile_regex("exclude", p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut globs = GlobSetBuilder::new();
        for pattern in &self.exclude_glob
        {
            let glob =
                Glob::new(pattern).map_err(|source| FormatError::InvalidGlob { pattern: pattern.clone(), source })?;
            globs.add(glob);
        }
        let exclude_glob = globs
            .build()
            .map_err(|source| FormatError::InvalidGlob { pattern: self.exclude_glob.join(", "), source })?;

        Ok(ResolvedConfig {
            style: ComposeStyle {
                quote: self.quote_mark,
                semicolon: self.has_semicolon,
                trailing_comma: self.trailing_comma,
                indent,
                max_line_length: self.max_line_length,
                limits: self.wrapping,
                bracket_spacing: self.bracket_spacing,
            },
            sort_rules,
            groups: SortGroup::compile(&self.group_rules)?,
            keep_unused,
            remove_unused: self.remove_unused_imports,
            empty_lines_between_groups: self.empty_lines_between_groups,
            empty_lines_after_all_imports: self.empty_lines_after_all_imports,
            insert_final_newline: self.insert_final_newline,
            eol: self.eol,
            format_exports: self.format_exports,
            force: self.force,
            disable_marker: self
                .disable_marker
                .clone(),
            path_style: PathStyle {
                remove_last_slash: self.remove_last_slash_in_path,
                remove_last_index: self.remove_last_index_in_path,
                node_protocol: self.node_protocol,
            },
            exclude,
            exclude_glob,
        })
    }
}

impl ResolvedConfig
{
    /// Whether `path` is skipped by `exclude`/`exclude_glob`. `force` bypasses both.
    pub fn is_excluded(
        &self,
        path: &Path,
    ) -> bool
    {
        if self.force
        {
            return false;
        }
        let text = path
            .to_string_lossy()
            .replace('\\', "/");
        self.exclude
            .iter()
            .any(|r| r.is_match(&text))
            || self
                .exclude_glob
                .is_match(&text)
    }
}

/// Load config from `explicit`, or the first config file in the working
/// directory, then apply `IMPSORT__*` environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None =>
        {
            // Load from config files in priority order
            for path in &CONFIG_FILES
            {
                if Path::new(path).exists()
                {
                    debug!(path, "using config file");
                    builder = builder.add_source(config::File::with_name(path));
                    break;
                }
            }
        }
    }

    // Environment overrides: IMPSORT__MAX_LINE_LENGTH=100
    builder = builder.add_source(
        config::Environment::with_prefix("IMPSORT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

/// Path `init` writes to.
pub fn init_path(args: &InitArgs) -> PathBuf
{
    args.path
        .join(CONFIG_FILES[0])
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = init_path(&args);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn defaults_compile()
    {
        let resolved = Config::default()
            .compile()
            .unwrap();
        assert_eq!(resolved.style.indent, "  ");
        assert_eq!(
            resolved
                .groups
                .children()
                .len(),
            7
        );
        assert!(resolved.is_excluded(Path::new("web/node_modules/react/index.js")));
        assert!(!resolved.is_excluded(Path::new("src/app.ts")));
    }

    #[test]
    fn defaults_survive_toml()
    {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.group_rules, Config::default().group_rules);
        assert_eq!(back.max_line_length, 80);
        assert_eq!(back.trailing_comma, TrailingComma::MultiLine);
    }

    #[test]
    fn partial_file_keeps_defaults()
    {
        let cfg: Config = toml::from_str(
            r#"
            quote_mark = "double"
            tab_type = "tab"
            sort_rules = { names = "none" }
            [wrapping]
            max_binding_names_per_line = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.quote_mark, QuoteMark::Double);
        assert_eq!(cfg.wrapping.max_binding_names_per_line, 3);
        assert_eq!(cfg.wrapping.max_names_per_wrapped_line, 1);

        let resolved = cfg
            .compile()
            .unwrap();
        assert_eq!(resolved.style.indent, "\t");
        assert!(!resolved.sort_rules.names.is_enabled());
        assert!(resolved.sort_rules.paths.is_enabled());
    }

    #[test]
    fn force_bypasses_exclusion()
    {
        let cfg = Config { exclude: vec!["generated".into()], force: true, ..Config::default() };
        let resolved = cfg
            .compile()
            .unwrap();
        assert!(!resolved.is_excluded(Path::new("src/generated/a.ts")));
    }

    #[test]
    fn invalid_rules_are_rejected()
    {
        let bad_regex = Config { exclude: vec!["(".into()], ..Config::default() };
        assert!(matches!(bad_regex.compile(), Err(FormatError::InvalidRegex { field: "exclude", .. })));

        let mut bad_sort = Config::default();
        bad_sort.sort_rules.paths = SortRuleConfig::Segments(vec!["xx".into()]);
        assert!(matches!(bad_sort.compile(), Err(FormatError::InvalidSortRule(_))));

        let bad_glob = Config { exclude_glob: vec!["a[".into()], ..Config::default() };
        assert!(matches!(bad_glob.compile(), Err(FormatError::InvalidGlob { .. })));
    }

    #[test]
    fn loads_explicit_file()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("custom.toml");
        std::fs::write(&path, "max_line_length = 120\nremove_unused_imports = true\n").unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.max_line_length, 120);
        assert!(cfg.remove_unused_imports);
        assert_eq!(cfg.tab_size, 2);
    }

    #[test]
    fn missing_explicit_file_is_an_error()
    {
        assert!(load_config(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
