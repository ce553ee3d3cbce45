//! Per-file rewrite pipeline.
//!
//! extract → prune → merge → group/sort → compose → plan. Each call owns
//! all of its state; a failure aborts this file only and yields no edits.

use std::path::Path;

use tracing::{debug, instrument};

use crate::core::compose::Composer;
use crate::core::edit::{BlankLinePolicy, EditPlanner, Piece, apply_edits, detect_eol};
use crate::core::extract::{ExtractOptions, Extractor, InsertionPoint, ParsedSource, SourceParser};
use crate::core::merge::{merge_all_exports, merge_all_imports};
use crate::core::model::Edit;
use crate::core::paths::normalize_path;
use crate::core::prune::{IdentifierScanner, UsageSource, collect_usage, prune_imports};
use crate::core::sort::sort_export_names;
use crate::error::FormatError;
use crate::infra::config::ResolvedConfig;

/// Runs every stage for one file under a resolved config.
pub struct Pipeline<'a>
{
    config: &'a ResolvedConfig,
}

impl<'a> Pipeline<'a>
{
    pub fn new(config: &'a ResolvedConfig) -> Self
    {
        Self { config }
    }

    /// Parse `text` and plan edits, using the parse itself as usage source.
    pub fn plan_source(
        &self,
        parser: &dyn SourceParser,
        text: &str,
        path: &Path,
    ) -> Result<Vec<Edit>, FormatError>
    {
        let parsed = parser.parse(text, path)?;
        let usage = IdentifierScanner { referenced: parsed.referenced.clone(), has_jsx: parsed.has_jsx };
        self.plan(text, &parsed, &usage)
    }

    /// Rewritten text, or `None` when the file is already formatted.
    pub fn format_text(
        &self,
        text: &str,
        parsed: &ParsedSource,
        usage: &dyn UsageSource,
    ) -> Result<Option<String>, FormatError>
    {
        let edits = self.plan(text, parsed, usage)?;
        if edits.is_empty()
        {
            return Ok(None);
        }
        Ok(Some(apply_edits(text, &edits)))
    }

    /// Edits that turn `text` into its canonical form, in ascending order.
    #[instrument(level = "debug", skip_all, fields(len = text.len(), nodes = parsed.nodes.len()))]
    pub fn plan(
        &self,
        text: &str,
        parsed: &ParsedSource,
        usage: &dyn UsageSource,
    ) -> Result<Vec<Edit>, FormatError>
    {
        let cfg = self.config;
        let eol = cfg
            .eol
            .unwrap_or_else(|| detect_eol(text));

        let extractor = Extractor::new(
            text,
            ExtractOptions {
                disable_marker: &cfg.disable_marker,
                force: cfg.force,
                format_exports: cfg.format_exports,
            },
        );
        let ex = extractor.extract(&parsed.nodes);
        if ex.file_disabled
        {
            debug!("file disabled by marker");
            return Ok(Vec::new());
        }

        // Original ranges, before anything is merged away
        let import_ranges: Vec<_> = ex
            .import_statements
            .iter()
            .map(|s| s.meta.range)
            .collect();
        let export_ranges: Vec<_> = ex
            .export_statements
            .iter()
            .map(|s| s.meta.range)
            .collect();

        let mut imports = ex.import_statements;
        for s in &mut imports
        {
            s.module_identifier = normalize_path(&s.module_identifier, &cfg.path_style);
        }
        let mut exports = ex.export_statements;
        for s in &mut exports
        {
            if let Some(m) = &s.module_identifier
            {
                s.module_identifier = Some(normalize_path(m, &cfg.path_style));
            }
        }

        if cfg.remove_unused
        {
            let report = collect_usage(usage, &imports);
            imports = prune_imports(imports, &report, &cfg.keep_unused);
        }
        let imports = merge_all_imports(imports);

        let module_elsewhere = !imports.is_empty() || ex.unhandled_count > 0;
        let mut exports = merge_all_exports(exports, module_elsewhere);

        let composer = Composer::new(
            cfg.style
                .clone(),
        );

        let mut root = cfg
            .groups
            .clone();
        let count = imports.len();
        for s in imports
        {
            root.insert(s);
        }
        root.sort(&cfg.sort_rules);
        let block = root.compose(&composer, cfg.empty_lines_between_groups)?;
        debug!(imports = count, exports = exports.len(), unhandled = ex.unhandled_count, "composed");

        let mut pieces: Vec<Piece> = Vec::new();
        let block = (!block.is_empty()).then_some(block);
        match ex.insertion_point
        {
            InsertionPoint::Replace(range) => match block
            {
                Some(text) => pieces.push(Piece::imports(range, Some(text))),
                None => pieces.push(Piece::statement(range, None)),
            },
            InsertionPoint::Before(point) =>
            {
                if let Some(text) = block
                {
                    pieces.push(Piece::imports(point, Some(text)));
                }
            }
        }
        // The first range carries the block; the rest are removed.
        let replaced = match ex.insertion_point
        {
            InsertionPoint::Replace(_) => 1,
            InsertionPoint::Before(_) => 0,
        };
        pieces.extend(
            import_ranges
                .into_iter()
                .skip(replaced)
                .map(|r| Piece::statement(r, None)),
        );

        for s in &mut exports
        {
            sort_export_names(s, &cfg.sort_rules.names);
        }
        for range in export_ranges
        {
            let survivor = exports
                .iter()
                .find(|s| s.meta.range.full_start == range.full_start);
            let text = survivor.map(|s| composer.compose_export(s));
            pieces.push(Piece::statement(range, text));
        }

        let planner = EditPlanner::new(
            text,
            extractor.index(),
            BlankLinePolicy {
                after_imports: cfg.empty_lines_after_all_imports + 1,
                final_newline: cfg.insert_final_newline,
                eol,
            },
        );
        let edits = planner.plan(pieces);
        debug!(edits = edits.len(), "planned edits");
        Ok(edits)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::prune::UsageReport;
    use crate::infra::config::Config;
    use crate::parsers::TypeScriptParser;

    struct Broken;

    impl UsageSource for Broken
    {
        fn report(
            &self,
            _imports: &[crate::core::model::ImportStatement],
        ) -> anyhow::Result<UsageReport>
        {
            anyhow::bail!("type checker unavailable")
        }
    }

    fn run(
        config: &Config,
        src: &str,
        usage: Option<&dyn UsageSource>,
    ) -> Option<String>
    {
        let resolved = config
            .compile()
            .unwrap();
        let pipeline = Pipeline::new(&resolved);
        let parsed = TypeScriptParser::new()
            .parse(src, Path::new("a.ts"))
            .unwrap();
        let scanner = IdentifierScanner { referenced: parsed.referenced.clone(), has_jsx: parsed.has_jsx };
        pipeline
            .format_text(src, &parsed, usage.unwrap_or(&scanner))
            .unwrap()
    }

    #[test]
    fn formatted_source_yields_none()
    {
        assert_eq!(run(&Config::default(), "import a from 'a';\n\nuse(a);\n", None), None);
    }

    #[test]
    fn failing_usage_source_keeps_every_import()
    {
        let config = Config { remove_unused_imports: true, ..Config::default() };
        let src = "import { b, a } from 'm';\n";

        assert_eq!(run(&config, src, Some(&Broken)).as_deref(), Some("import { a, b } from 'm';\n"));
        // The parse's own scan knows neither name is used
        assert_eq!(run(&config, src, None).as_deref(), Some(""));
    }

    #[test]
    fn unhandled_imports_stay_put_and_block_is_set_apart()
    {
        let src = "import x = A.B;\nimport b from 'b';\nimport a from 'a';\n";
        assert_eq!(
            run(&Config::default(), src, None).as_deref(),
            Some("import x = A.B;\n\nimport a from 'a';\nimport b from 'b';\n")
        );
    }
}
