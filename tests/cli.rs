//! Binary-level tests for `impsort format`, `init` and `completions`.

mod util;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;

const UNSORTED: &str = "import { b, a } from './b';\nimport x from 'x';\n\nx(a, b);\n";
const SORTED: &str = "import x from 'x';\n\nimport { a, b } from './b';\n\nx(a, b);\n";

/// Binary with logging pinned to the default filter.
fn impsort() -> Command
{
    let mut cmd = Command::cargo_bin("impsort").expect("impsort binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn format_rewrites_files_in_place()
{
    let tmp = util::project(&[("src/a.ts", UNSORTED), ("src/done.ts", SORTED), ("notes.md", "# x\n")]);

    impsort()
        .current_dir(tmp.path())
        .args(["--quiet", "format", "src"])
        .assert()
        .success();

    tmp.child("src/a.ts")
        .assert(SORTED);
    tmp.child("src/done.ts")
        .assert(SORTED);
    tmp.child("notes.md")
        .assert("# x\n");
}

#[test]
fn check_reports_without_writing()
{
    let tmp = util::project(&[("a.ts", UNSORTED)]);

    impsort()
        .current_dir(tmp.path())
        .args(["format", "--check", "a.ts"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Would reformat a.ts"));

    tmp.child("a.ts")
        .assert(UNSORTED);
}

#[test]
fn check_passes_on_formatted_tree()
{
    let tmp = util::project(&[("a.ts", SORTED)]);

    impsort()
        .current_dir(tmp.path())
        .args(["format", "--check", "."])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 would be formatted, 1 unchanged"));
}

#[test]
fn diff_prints_unified_hunks()
{
    let tmp = util::project(&[("a.ts", UNSORTED)]);

    impsort()
        .current_dir(tmp.path())
        .args(["--no-color", "--quiet", "format", "--diff", "a.ts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- a.ts"))
        .stdout(predicate::str::contains("-import { b, a } from './b';"))
        .stdout(predicate::str::contains("+import { a, b } from './b';"));

    tmp.child("a.ts")
        .assert(UNSORTED);
}

#[test]
fn stdout_prints_formatted_source()
{
    let tmp = util::project(&[("a.ts", UNSORTED)]);

    impsort()
        .current_dir(tmp.path())
        .args(["format", "--stdout", "a.ts"])
        .assert()
        .success()
        .stdout(SORTED);
}

#[test]
fn json_lists_edits_per_file()
{
    let tmp = util::project(&[("a.ts", UNSORTED), ("b.ts", SORTED)]);

    let output = impsort()
        .current_dir(tmp.path())
        .args(["format", "--json", "a.ts", "b.ts"])
        .output()
        .expect("run impsort");
    assert!(output.status.success());

    let v: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let files = v
        .as_array()
        .expect("array");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["path"], "a.ts");
    assert_eq!(files[0]["status"], "changed");
    assert!(
        files[0]["edits"]
            .as_array()
            .is_some_and(|e| !e.is_empty())
    );
    assert_eq!(files[1]["status"], "unchanged");
    assert!(files[1].get("edits").is_none());

    tmp.child("a.ts")
        .assert(UNSORTED);
}

#[test]
fn syntax_errors_leave_file_untouched()
{
    let tmp = util::project(&[("bad.ts", "import { from 'x'\n"), ("good.ts", UNSORTED)]);

    impsort()
        .current_dir(tmp.path())
        .args(["--no-color", "format", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("syntax error in"));

    tmp.child("bad.ts")
        .assert("import { from 'x'\n");
    tmp.child("good.ts")
        .assert(SORTED);
}

#[test]
fn config_file_is_picked_up()
{
    let tmp = util::project(&[
        ("impsort.toml", "quote_mark = \"double\"\nhas_semicolon = false\n"),
        ("a.ts", "import x from 'x';\n"),
    ]);

    impsort()
        .current_dir(tmp.path())
        .args(["--quiet", "format", "a.ts"])
        .assert()
        .success();

    tmp.child("a.ts")
        .assert("import x from \"x\"\n");
}

#[test]
fn exclusion_globs_skip_files()
{
    let tmp = util::project(&[("impsort.toml", "exclude_glob = [\"**/gen/**\"]\n"), ("gen/a.ts", UNSORTED)]);

    impsort()
        .current_dir(tmp.path())
        .args(["--quiet", "format", "."])
        .assert()
        .success();
    tmp.child("gen/a.ts")
        .assert(UNSORTED);

    impsort()
        .current_dir(tmp.path())
        .args(["--quiet", "format", "--force", "."])
        .assert()
        .success();
    tmp.child("gen/a.ts")
        .assert(SORTED);
}

#[test]
fn init_writes_defaults_once()
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    impsort()
        .args(["init", "--path"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    tmp.child("impsort.toml")
        .assert(predicate::str::contains("max_line_length = 80"));

    impsort()
        .args(["init", "--path"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    impsort()
        .args(["--quiet", "init", "--force", "--path"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn completions_go_to_stdout()
{
    impsort()
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("impsort"));
}
