//! End-to-end tests of the `ninjadep` binary.

use std::path::Path;
use std::process::{Command, Output};

const MAPPING: &str = r#"{"src/a.cpp": ["test_x", "test_y"], "include/b.hpp": ["test_x"]}"#;

fn ninjadep(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ninjadep"))
        .args(args)
        .current_dir(cwd)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn mapping_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("depmap.json"), MAPPING).unwrap();
    dir
}

#[test]
fn test_audit() {
    let dir = mapping_dir();
    let output = ninjadep(&["audit", "depmap.json"], dir.path());

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "include/b.hpp: test_x\nsrc/a.cpp: test_x, test_y\nTotal files: 2\n"
    );
}

#[test]
fn test_optimize() {
    let dir = mapping_dir();
    let output = ninjadep(
        &["optimize", "depmap.json", "include/b.hpp", "README.md"],
        dir.path(),
    );

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Affected executables:\ntest_x\nTotal affected executables: 1\n"
    );
}

#[test]
fn test_missing_mapping_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = ninjadep(&["audit", "absent.json"], dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.json"));
}

#[test]
fn test_parse_missing_build_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = ninjadep(&["parse", "build-ninja/build.ninja"], dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("build file not found"));
}

/// A full `parse` run against a fake ninja, followed by `optimize` on the
/// mapping it wrote.
#[cfg(unix)]
#[test]
fn test_parse_then_optimize() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let build_dir = dir.path().join("build-ninja");
    std::fs::create_dir(&build_dir).unwrap();
    std::fs::write(
        build_dir.join("build.ninja"),
        "\
build bin/test_gemm: CXX_EXECUTABLE_LINKER__test_gemm obj/gemm.cpp.o
build bin/example_conv: CXX_EXECUTABLE_LINKER__example_conv obj/conv.cpp.o
build obj/gemm.cpp.o: CXX_COMPILER__test_gemm ../test/gemm.cpp
build obj/conv.cpp.o: CXX_COMPILER__example_conv ../example/conv.cpp
",
    )
    .unwrap();

    let script = dir.path().join("fake-ninja");
    std::fs::write(
        &script,
        r#"#!/bin/sh
[ "$1" = "--version" ] && { echo 1.11.1; exit 0; }
case "$3" in
  obj/gemm.cpp.o) printf 'obj/gemm.cpp.o: #deps 3\n    ../test/gemm.cpp\n    ../include/ck/ck.hpp\n    /usr/include/stdio.h\n' ;;
  obj/conv.cpp.o) printf 'obj/conv.cpp.o: #deps 2\n    ../example/conv.cpp\n    ../include/ck/ck.hpp\n' ;;
  *) exit 1 ;;
esac
"#,
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let output = ninjadep(
        &[
            "parse",
            "build-ninja/build.ninja",
            "--ninja",
            script.to_str().unwrap(),
            "--jobs",
            "2",
        ],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary = stdout(&output);
    assert!(summary.contains("Total executables: 2"));
    assert!(summary.contains("Files used by multiple executables: 1"));

    let csv = std::fs::read_to_string(build_dir.join("enhanced_file_executable_mapping.csv"))
        .unwrap();
    assert!(csv.contains("\"include/ck/ck.hpp\",\"bin/example_conv;bin/test_gemm\""));
    assert!(!csv.contains("stdio.h"));

    let output = ninjadep(
        &[
            "optimize",
            "build-ninja/enhanced_dependency_mapping.json",
            "include/ck/ck.hpp",
        ],
        dir.path(),
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Affected executables:\nbin/example_conv\nbin/test_gemm\nTotal affected executables: 2\n"
    );
}

/// Runs git with a throwaway identity; false if git is missing or fails.
fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args([
            "-c",
            "user.name=ninjadep",
            "-c",
            "user.email=ninjadep@example.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .is_ok_and(|out| out.status.success())
}

/// Two commits, the second changing `src/a.cpp`, plus an untracked
/// mapping file.
fn select_repository() -> Option<tempfile::TempDir> {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    if !git(root, &["init", "-q"]) {
        return None;
    }
    std::fs::create_dir(root.join("src")).unwrap();
    std::fs::write(root.join("src/a.cpp"), "int a() { return 1; }\n").unwrap();
    assert!(git(root, &["add", "."]));
    assert!(git(root, &["commit", "-q", "-m", "initial"]));
    std::fs::write(root.join("src/a.cpp"), "int a() { return 2; }\n").unwrap();
    assert!(git(root, &["commit", "-q", "-am", "change"]));

    std::fs::write(
        root.join("depmap.json"),
        r#"{"src/a.cpp": ["bin/test_a", "bin/example_a"], "src/b.cpp": ["bin/test_b"]}"#,
    )
    .unwrap();
    Some(dir)
}

fn selection(dir: &Path, file: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(dir.join(file)).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// No flag keeps everything, `--test-prefix` keeps tests, and `--all`
/// overrides `--test-prefix`.
#[test]
fn test_select_filter_flags() {
    let Some(repo) = select_repository() else {
        eprintln!("git unavailable, skipping");
        return;
    };
    let root = repo.path();
    let everything = serde_json::json!({
        "tests_to_run": ["bin/example_a", "bin/test_a"],
        "changed_files": ["src/a.cpp"],
    });

    let output = ninjadep(&["select", "depmap.json", "HEAD~1", "HEAD"], root);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Exported 2 tests to run to tests-to-run.json"));
    assert_eq!(selection(root, "tests-to-run.json"), everything);

    let output = ninjadep(
        &["select", "depmap.json", "HEAD~1", "HEAD", "--test-prefix", "-o", "prefix.json"],
        root,
    );
    assert!(output.status.success());
    assert_eq!(
        selection(root, "prefix.json"),
        serde_json::json!({
            "tests_to_run": ["bin/test_a"],
            "changed_files": ["src/a.cpp"],
        })
    );

    let output = ninjadep(
        &[
            "select",
            "depmap.json",
            "HEAD~1",
            "HEAD",
            "--test-prefix",
            "--all",
            "-o",
            "both.json",
        ],
        root,
    );
    assert!(output.status.success());
    assert_eq!(selection(root, "both.json"), everything);
}

/// An empty diff still writes the selection file.
#[test]
fn test_select_no_changes() {
    let Some(repo) = select_repository() else {
        eprintln!("git unavailable, skipping");
        return;
    };
    let root = repo.path();

    let output = ninjadep(&["select", "depmap.json", "HEAD", "HEAD"], root);
    assert!(output.status.success());
    assert_eq!(
        selection(root, "tests-to-run.json"),
        serde_json::json!({"tests_to_run": [], "changed_files": []})
    );
}

#[test]
fn test_select_outside_repository_fails() {
    let dir = mapping_dir();
    let output = ninjadep(&["select", "depmap.json", "HEAD~1", "HEAD"], dir.path());

    assert!(!output.status.success());
    assert!(!dir.path().join("tests-to-run.json").exists());
}

/// The help text says that path-qualified ids match the test prefix.
#[test]
fn test_select_help_mentions_path_ids() {
    let dir = tempfile::tempdir().unwrap();
    let output = ninjadep(&["select", "--help"], dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains("bin/test_foo"));
}
