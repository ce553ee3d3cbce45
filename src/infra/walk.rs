//! Filepath: src/infra/walk.rs
//! Gitignore-aware source file walker.
//! - Respects .gitignore, .git/info/exclude, and global gitignore
//! - Extra ignore globs (early prune + late filter)
//! - Keeps only TS/JS source extensions
//! - Explicit file arguments bypass ignore rules
//! - Deterministic ordering for stable tests/CI
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{
    DirEntry, WalkBuilder,
    types::{Types, TypesBuilder},
};
use tracing::warn;

use crate::parsers::typescript_parser::{SOURCE_EXTENSIONS, is_source_file};

/// Gitignore-aware walker over TS/JS sources.
/// Extra globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Source extension matcher
    file_types: Types,

    /// Include hidden (dot) files; default false
    include_hidden: bool,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g., "dist/**",
    /// "**/*.min.js"). Patterns match on (relative) paths.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern).with_context(|| format!("invalid ignore glob `{pattern}`"))?);
        }

        // One custom type covering every supported extension
        let mut tb = TypesBuilder::new();
        for ext in SOURCE_EXTENSIONS
        {
            tb.add("source", &format!("*.{ext}"))?;
        }
        tb.select("source");

        Ok(Self { ignore_patterns: builder.build()?, file_types: tb.build()?, include_hidden: false })
    }

    /// (Optional) Include or exclude hidden files (dotfiles).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // WalkBuilder::hidden(true) => *skip* dotfiles
        b.hidden(!self.include_hidden);

        // Respect .ignore/.gitignore/.git/info/exclude and global gitignore
        b.git_ignore(true);
        b.git_global(true);
        b.git_exclude(true);

        // Early directory pruning using extra ignores.
        let extra = self
            .ignore_patterns
            .clone();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .is_some_and(|ft| ft.is_dir());

            !(is_dir && extra.is_match(ent.path()))
        });

        b.types(
            self.file_types
                .clone(),
        );

        b
    }

    /// Traverse source files under `root`, respecting ignore rules and extra
    /// globs. Returns a **sorted** list of file paths for determinism.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root_path = root.as_ref();
        let walker = self
            .build_walk(root_path)
            .build();

        let mut out: Vec<PathBuf> = walker
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    warn!(%err, "skipping unreadable entry");
                    None
                }
            })
            // Keep only regular files
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            // Late file-level extra ignore filtering using RELATIVE path
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root_path)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        // Deterministic order (stable CLI & tests)
        out.sort();

        out
    }

    /// Expand CLI path arguments into a sorted, de-duplicated file list.
    /// Directories are walked; files are kept when their extension is
    /// supported, even if an ignore file would skip them.
    pub fn collect(
        &self,
        paths: &[PathBuf],
    ) -> Result<Vec<PathBuf>>
    {
        let mut out = BTreeSet::new();

        for path in paths
        {
            if path.is_dir()
            {
                out.extend(self.walk_files(path));
            }
            else if path.is_file()
            {
                if is_source_file(path)
                {
                    out.insert(path.clone());
                }
                else
                {
                    warn!(path = %path.display(), "skipping file with unsupported extension");
                }
            }
            else
            {
                anyhow::bail!("path not found: {}", path.display());
            }
        }

        Ok(out
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// Scratch dir whose own name is not a dotfile
    fn scratch() -> Result<TempDir>
    {
        Ok(tempfile::Builder::new()
            .prefix("walk")
            .tempdir()?)
    }

    /// Create a file with parent dirs as needed
    fn write_file(
        root: &Path,
        rel: &str,
        contents: &str,
    ) -> Result<()>
    {
        let path = root.join(rel);
        if let Some(parent) = path.parent()
        {
            std::fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn names(
        root: &Path,
        files: &[PathBuf],
    ) -> Vec<String>
    {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_keeps_only_sources() -> Result<()>
    {
        let temp_dir = scratch()?;
        let root = temp_dir.path();

        write_file(root, "b.ts", "")?;
        write_file(root, "a.jsx", "")?;
        write_file(root, "lib/c.mjs", "")?;
        write_file(root, "README.md", "# Test")?;
        write_file(root, "style.css", "")?;

        let walker = FileWalker::new(&[])?;
        let files = walker.walk_files(root);

        assert_eq!(names(root, &files), vec!["a.jsx", "b.ts", "lib/c.mjs"]);
        Ok(())
    }

    #[test]
    fn test_extra_ignores_prune_directories() -> Result<()>
    {
        let temp_dir = scratch()?;
        let root = temp_dir.path();

        write_file(root, "src/a.ts", "")?;
        write_file(root, "dist/a.js", "")?;
        write_file(root, "src/a.min.js", "")?;

        let walker = FileWalker::new(&["**/dist".to_string(), "**/*.min.js".to_string()])?;
        let files = walker.walk_files(root);

        assert_eq!(names(root, &files), vec!["src/a.ts"]);
        Ok(())
    }

    #[test]
    fn test_hidden_policy() -> Result<()>
    {
        let temp_dir = scratch()?;
        let root = temp_dir.path();

        write_file(root, ".config/x.ts", "")?;
        write_file(root, "y.ts", "")?;

        let files = FileWalker::new(&[])?.walk_files(root);
        assert_eq!(names(root, &files), vec!["y.ts"]);

        let files = FileWalker::new(&[])?
            .with_include_hidden(true)
            .walk_files(root);
        assert_eq!(names(root, &files), vec![".config/x.ts", "y.ts"]);
        Ok(())
    }

    #[test]
    fn test_collect_mixes_files_and_dirs() -> Result<()>
    {
        let temp_dir = scratch()?;
        let root = temp_dir.path();

        write_file(root, "src/a.ts", "")?;
        write_file(root, "src/b.tsx", "")?;
        write_file(root, "notes.txt", "")?;

        let walker = FileWalker::new(&[])?;
        let files = walker.collect(&[root.join("src"), root.join("src/a.ts"), root.join("notes.txt")])?;
        assert_eq!(names(root, &files), vec!["src/a.ts", "src/b.tsx"]);

        assert!(
            walker
                .collect(&[root.join("missing")])
                .is_err()
        );
        Ok(())
    }
}
