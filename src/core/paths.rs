//! Module specifier normalization and Node builtin detection.
//!
//! The normalized form is what merging, grouping, sorting and rendering
//! all see, so two spellings of one module collapse into one statement.

use serde::{Deserialize, Serialize};

/// How to treat the `node:` scheme on builtin modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeProtocol {
    /// Strip `node:` from builtins
    None,
    /// Prefix builtins with `node:`
    Always,
    /// Leave specifiers alone
    #[default]
    Preserve,
}

/// Path rewrite switches, resolved from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathStyle {
    pub remove_last_slash: bool,
    pub remove_last_index: bool,
    pub node_protocol: NodeProtocol,
}

/// Node.js core modules importable without the `node:` scheme.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Modules that only exist behind `node:` and must keep it.
const SCHEME_ONLY: &[&str] = &["sea", "sqlite", "test", "test/reporters"];

/// True for Node core modules, with or without `node:`.
pub fn is_builtin(path: &str) -> bool {
    match path.strip_prefix("node:") {
        Some(bare) => NODE_BUILTINS.contains(&bare) || SCHEME_ONLY.contains(&bare),
        None => NODE_BUILTINS.contains(&path),
    }
}

/// Apply `style` to one module specifier.
pub fn normalize_path(path: &str, style: &PathStyle) -> String {
    let mut out = path.to_owned();

    if style.remove_last_slash && is_relative(&out) {
        trim_last_slash(&mut out);
    }
    if style.remove_last_index && is_relative(&out) {
        trim_last_index(&mut out);
    }

    match style.node_protocol {
        NodeProtocol::Preserve => out,
        NodeProtocol::None => match out.strip_prefix("node:") {
            Some(bare) if NODE_BUILTINS.contains(&bare) => bare.to_owned(),
            _ => out,
        },
        NodeProtocol::Always if NODE_BUILTINS.contains(&out.as_str()) => format!("node:{out}"),
        NodeProtocol::Always => out,
    }
}

fn is_relative(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

/// `./a/` → `./a`; `./` and `../` keep their meaning as `.`/`..`.
fn trim_last_slash(path: &mut String) {
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
}

/// `./a/index` → `./a`, `./index` → `.`, `../index` → `..`.
fn trim_last_index(path: &mut String) {
    if let Some(dir) = path.strip_suffix("/index") {
        *path = if dir.is_empty() { ".".to_owned() } else { dir.to_owned() };
    }
}
