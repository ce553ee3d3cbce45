//! **impsort** - Fast, deterministic import/export sorter for TypeScript and JavaScript
//!
//! Groups, sorts, merges and prunes import declarations, and tidies local
//! `export { ... }` lists, emitting minimal text edits.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Library error taxonomy and diagnostics
pub mod error;

/// Core rewrite pipeline
pub mod core {
    /// Statements, ranges, comments and edits
    pub mod model;

    /// Declaration extraction with comment attachment
    pub mod extract;

    /// Unused-import pruning
    pub mod prune;

    /// Same-module statement merging
    pub mod merge;

    /// Segment comparators, name sorting and group trees
    pub mod sort;

    /// Statement rendering and wrapping
    pub mod compose;

    /// Blank-line policy and minimal edit planning
    pub mod edit;

    /// Per-file stage orchestration
    pub mod pipeline;
    pub use pipeline::Pipeline;

    /// Module path normalization
    pub mod paths;

    /// `format` command runner
    pub mod format;
    pub use format::run as format_run;
}

/// Language front-ends
pub mod parsers {
    /// TypeScript/JavaScript declarations via tree-sitter
    pub mod typescript_parser;
    pub use typescript_parser::TypeScriptParser;
}

/// Infrastructure - Configuration, walking and utilities
pub mod infra {
    /// Configuration management with layered sources
    pub mod config;
    pub use config::{Config, ResolvedConfig, init as config_init, load_config};

    /// CRLF/LF-robust line indexing
    pub mod line_index;
    pub use line_index::NewlineIndex;

    /// Gitignore-aware directory walking
    pub mod walk;
    pub use walk::FileWalker;

    /// Tree-sitter and literal helpers
    pub mod utils;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{Pipeline, format_run};
pub use error::{FormatError, SyntaxError};
pub use infra::{Config, FileWalker, ResolvedConfig, load_config};
pub use parsers::TypeScriptParser;
