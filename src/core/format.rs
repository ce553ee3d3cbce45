//! `impsort format`: collect files, run the pipeline in parallel, then
//! write, diff, check or report.
//!
//! Files are independent. A failing file is reported and left untouched;
//! the rest of the run continues.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miette::{GraphicalReportHandler, GraphicalTheme};
use owo_colors::OwoColorize;
use rayon::prelude::*;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use tracing::{debug, info, instrument, warn};

use crate::cli::{AppContext, FormatArgs};
use crate::core::edit::apply_edits;
use crate::core::model::Edit;
use crate::core::pipeline::Pipeline;
use crate::error::FormatError;
use crate::infra::config::{ResolvedConfig, load_config};
use crate::infra::walk::FileWalker;
use crate::parsers::TypeScriptParser;

/// What happened to one file.
#[derive(Debug)]
pub enum Outcome
{
    Unchanged,
    Changed
    {
        original: String,
        formatted: String,
        edits: Vec<Edit>,
    },
    /// Matched `exclude`/`exclude_glob`
    Excluded,
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct FileOutcome
{
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Counts for the final summary and exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary
{
    pub changed: usize,
    pub unchanged: usize,
    pub excluded: usize,
    pub failed: usize,
    /// Changed files were reported, not written
    pub check: bool,
}

impl RunSummary
{
    /// 2 when any file failed, 1 when `--check` found changes, else 0.
    pub fn exit_code(&self) -> i32
    {
        if self.failed > 0
        {
            2
        }
        else if self.check && self.changed > 0
        {
            1
        }
        else
        {
            0
        }
    }
}

/// One entry of `--json` output.
#[derive(Debug, Serialize)]
struct JsonReport<'a>
{
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "<[Edit]>::is_empty")]
    edits: &'a [Edit],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Format a single source text. Used by the runner and handy for callers
/// that already hold the file contents.
pub fn format_file(
    pipeline: &Pipeline,
    path: &Path,
    text: String,
) -> Outcome
{
    let parser = TypeScriptParser::new();
    match pipeline.plan_source(&parser, &text, path)
    {
        Ok(edits) if edits.is_empty() => Outcome::Unchanged,
        Ok(edits) =>
        {
            let formatted = apply_edits(&text, &edits);
            if formatted == text
            {
                Outcome::Unchanged
            }
            else
            {
                Outcome::Changed { original: text, formatted, edits }
            }
        }
        Err(e) => Outcome::Failed(e.into()),
    }
}

fn process_path(
    config: &ResolvedConfig,
    pipeline: &Pipeline,
    path: &Path,
) -> Outcome
{
    if config.is_excluded(path)
    {
        debug!(path = %path.display(), "excluded");
        return Outcome::Excluded;
    }

    match fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    {
        Ok(text) => format_file(pipeline, path, text),
        Err(e) => Outcome::Failed(e),
    }
}

/// Run the pipeline over every file named by `paths`.
pub fn format_paths(
    config: &ResolvedConfig,
    walker: &FileWalker,
    paths: &[PathBuf],
) -> Result<Vec<FileOutcome>>
{
    let files = walker.collect(paths)?;
    debug!(files = files.len(), "collected files");

    let pipeline = Pipeline::new(config);
    let outcomes = files
        .par_iter()
        .map(|path| FileOutcome { path: path.clone(), outcome: process_path(config, &pipeline, path) })
        .collect();

    Ok(outcomes)
}

#[instrument(level = "debug", skip_all, fields(paths = args.paths.len()))]
pub fn run(
    args: FormatArgs,
    ctx: &AppContext,
) -> Result<RunSummary>
{
    let mut config = load_config(
        args.config
            .as_deref(),
    )?;
    config.force |= args.force;
    config.remove_unused_imports |= args.remove_unused;
    let resolved = config
        .compile()
        .context("Invalid configuration")?;

    let walker = FileWalker::new(&args.ignore)?.with_include_hidden(args.hidden);
    let outcomes = format_paths(&resolved, &walker, &args.paths)?;

    let write = !(args.check || args.diff || args.stdout || args.json || ctx.dry_run);
    let color = !ctx.no_color;
    let mut summary = RunSummary { check: args.check, ..Default::default() };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut json = Vec::new();

    for FileOutcome { path, outcome } in &outcomes
    {
        let shown = path.display();
        match outcome
        {
            Outcome::Unchanged =>
            {
                summary.unchanged += 1;
                if args.stdout
                {
                    let text = fs::read_to_string(path).with_context(|| format!("read {shown}"))?;
                    out.write_all(text.as_bytes())?;
                }
            }
            Outcome::Excluded => summary.excluded += 1,
            Outcome::Changed { original, formatted, .. } =>
            {
                summary.changed += 1;
                if args.stdout
                {
                    out.write_all(formatted.as_bytes())?;
                }
                if args.diff
                {
                    write_diff(&mut out, path, original, formatted, color)?;
                }
                if args.check && !ctx.quiet
                {
                    writeln!(out, "Would reformat {shown}")?;
                }
                if write
                {
                    match write_atomic(path, formatted.as_bytes())
                    {
                        Ok(()) => info!(path = %shown, "formatted"),
                        Err(e) =>
                        {
                            summary.changed -= 1;
                            summary.failed += 1;
                            eprintln!("{}", render_failure(path, &e, color));
                        }
                    }
                }
            }
            Outcome::Failed(e) =>
            {
                summary.failed += 1;
                warn!(path = %shown, "skipped file");
                if !args.json
                {
                    eprintln!("{}", render_failure(path, e, color));
                }
            }
        }

        if args.json
        {
            json.push(json_report(path, outcome));
        }
    }

    if args.json
    {
        writeln!(out, "{}", serde_json::to_string(&json)?)?;
    }

    if !ctx.quiet && !args.stdout && !args.json
    {
        let verb = if write { "formatted" } else { "would be formatted" };
        eprintln!(
            "{} {verb}, {} unchanged, {} excluded, {} failed",
            summary.changed, summary.unchanged, summary.excluded, summary.failed
        );
    }

    Ok(summary)
}

fn json_report<'a>(
    path: &Path,
    outcome: &'a Outcome,
) -> JsonReport<'a>
{
    let (status, edits, error): (_, &[Edit], _) = match outcome
    {
        Outcome::Unchanged => ("unchanged", &[], None),
        Outcome::Changed { edits, .. } => ("changed", edits.as_slice(), None),
        Outcome::Excluded => ("excluded", &[], None),
        Outcome::Failed(e) => ("failed", &[], Some(format!("{e:#}"))),
    };
    JsonReport { path: path.display().to_string(), status, edits, error }
}

/// Syntax errors get a labeled miette report; everything else one line.
fn render_failure(
    path: &Path,
    err: &anyhow::Error,
    color: bool,
) -> String
{
    if let Some(FormatError::Syntax(diag)) = err.downcast_ref::<FormatError>()
    {
        let theme = if color { GraphicalTheme::unicode() } else { GraphicalTheme::unicode_nocolor() };
        let mut rendered = String::new();
        if GraphicalReportHandler::new_themed(theme)
            .render_report(&mut rendered, diag)
            .is_ok()
        {
            return rendered;
        }
    }

    let label = format!("error: {}", path.display());
    if color
    {
        format!("{}: {err:#}", label.red())
    }
    else
    {
        format!("{label}: {err:#}")
    }
}

/// Unified diff with three lines of context.
fn write_diff(
    out: &mut impl Write,
    path: &Path,
    original: &str,
    formatted: &str,
    color: bool,
) -> Result<()>
{
    let diff = TextDiff::from_lines(original, formatted);
    let shown = path.display();
    let header = format!("--- {shown}\n+++ {shown}");
    if color
    {
        writeln!(out, "{}", header.bold())?;
    }
    else
    {
        writeln!(out, "{header}")?;
    }

    for hunk in diff
        .unified_diff()
        .context_radius(3)
        .iter_hunks()
    {
        let head = hunk
            .header()
            .to_string();
        if color
        {
            writeln!(out, "{}", head.cyan())?;
        }
        else
        {
            writeln!(out, "{head}")?;
        }

        for change in hunk.iter_changes()
        {
            let (sign, line) = (
                match change.tag()
                {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                },
                change.to_string_lossy(),
            );
            let body = format!("{sign}{}", line.trim_end_matches(['\r', '\n']));
            match (color, change.tag())
            {
                (true, ChangeTag::Delete) => writeln!(out, "{}", body.red())?,
                (true, ChangeTag::Insert) => writeln!(out, "{}", body.green())?,
                _ => writeln!(out, "{body}")?,
            }
        }
    }
    Ok(())
}

/// Replace `path` with `data` through a same-directory temp file.
fn write_atomic(
    path: &Path,
    data: &[u8],
) -> Result<()>
{
    // Prefer same-dir tempfile; fall back to OS temp on EPERM/ENOENT
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Preserve original permissions
    let perms = fs::metadata(path)
        .map(|m| m.permissions())
        .ok();

    let tmp = match tempfile::NamedTempFile::new_in(dir)
    {
        Ok(t) => t,
        Err(_) => tempfile::NamedTempFile::new()?,
    };

    let mut file = tmp.as_file();
    file.write_all(data)?;
    file.sync_all()?;

    if let Some(perms) = perms
    {
        fs::set_permissions(tmp.path(), perms).context("set temp permissions")?;
    }

    // Atomically replace the destination
    if let Err(e) = tmp.persist(path)
    {
        // Different filesystem? Try copy fallback
        fs::copy(e.file.path(), path).with_context(|| format!("write {}", path.display()))?;
    }

    Ok(())
}
