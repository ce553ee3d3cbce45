//! Shared test utilities for integration tests
//!
//! Provides fixture creation and a one-call formatter used across
//! multiple test files.

#![allow(dead_code)]

use std::path::Path;

use assert_fs::prelude::*;
use impsort::core::edit::apply_edits;
use impsort::{Config, Pipeline, TypeScriptParser};

/// Format `src` as if it were the file `name`, under `config`.
pub fn format_as(
    config: &Config,
    name: &str,
    src: &str,
) -> String
{
    let resolved = config
        .compile()
        .expect("config compiles");
    let edits = Pipeline::new(&resolved)
        .plan_source(&TypeScriptParser::new(), src, Path::new(name))
        .expect("source formats");
    apply_edits(src, &edits)
}

/// Format a `.ts` source under the default config.
pub fn format(src: &str) -> String
{
    format_as(&Config::default(), "a.ts", src)
}

/// Temporary project holding the given files (relative path, contents).
pub fn project(files: &[(&str, &str)]) -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    for (rel, body) in files
    {
        tmp.child(rel)
            .write_str(body)
            .expect("write fixture");
    }

    tmp
}
