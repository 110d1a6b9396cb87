//! Integration tests for dotmill
//!
//! These tests drive the full coordinator against temporary source trees,
//! using small shell scripts as stand-in converters. They are Unix-only
//! because the fake converters are `/bin/sh` scripts.

#![cfg(unix)]

use dotmill::config::RenderConfig;
use dotmill::walker::RenderCoordinator;
use dotmill::MillError;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Shell body that parses `-oOUT -Tfmt SRC` and copies SRC to OUT
const COPY_CONVERTER: &str = r#"out=""; src=""
for a in "$@"; do
  case "$a" in
    -o*) out="${a#-o}" ;;
    -T*) : ;;
    *) src="$a" ;;
  esac
done
cp "$src" "$out""#;

/// Write an executable fake converter script and return its path
fn fake_converter(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn write_file(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn config(source: &Path, dest: &Path, converter: &Path) -> RenderConfig {
    RenderConfig {
        source_root: source.to_path_buf(),
        dest_root: dest.to_path_buf(),
        subdir: PathBuf::new(),
        converter: converter.to_path_buf(),
        format: "svg".into(),
        worker_count: 4,
        queue_size: 64,
        max_depth: None,
        exclude_patterns: Vec::new(),
        fail_fast: false,
        show_progress: false,
        verbose: false,
    }
}

/// Collect every file under `root`, as paths relative to it
fn tree_files(root: &Path) -> Vec<PathBuf> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                visit(root, &path, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }

    let mut out = Vec::new();
    if root.is_dir() {
        visit(root, root, &mut out);
    }
    out.sort();
    out
}

#[tokio::test]
async fn test_mirrors_nested_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "fake-dot", COPY_CONVERTER);

    write_file(&source.join("intro/a.dot"), "digraph a {}");
    write_file(&source.join("intro/sub/b.dot"), "digraph b {}");

    let mut config = config(&source, &dest, &converter);
    config.subdir = PathBuf::from("intro");

    let result = RenderCoordinator::new(config).run().await.unwrap();

    assert!(result.completed);
    assert_eq!(result.files_found, 2);
    assert_eq!(result.rendered, 2);
    assert_eq!(result.errors, 0);

    // The destination mirrors the source exactly, extensions swapped,
    // and contains nothing else
    assert_eq!(
        tree_files(&dest),
        vec![
            PathBuf::from("intro/a.svg"),
            PathBuf::from("intro/sub/b.svg"),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(dest.join("intro/a.svg")).unwrap(),
        "digraph a {}"
    );
}

#[tokio::test]
async fn test_idempotent_over_unchanged_source() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "fake-dot", COPY_CONVERTER);

    write_file(&source.join("a.dot"), "digraph {}");
    write_file(&source.join("x/y/z.dot"), "digraph {}");

    let result = RenderCoordinator::new(config(&source, &dest, &converter))
        .run()
        .await
        .unwrap();
    assert_eq!(result.rendered, 2);
    let first = tree_files(&dest);

    std::fs::remove_dir_all(&dest).unwrap();

    let result = RenderCoordinator::new(config(&source, &dest, &converter))
        .run()
        .await
        .unwrap();
    assert_eq!(result.rendered, 2);
    assert_eq!(tree_files(&dest), first);
}

#[tokio::test]
async fn test_no_extension_filtering_failure_surfaces() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");

    // Converts .dot sources, rejects everything else - like the real tool
    let body = r#"out=""; src=""
for a in "$@"; do
  case "$a" in
    -o*) out="${a#-o}" ;;
    -T*) : ;;
    *) src="$a" ;;
  esac
done
case "$src" in
  *.dot) cp "$src" "$out" ;;
  *) echo "not a diagram" 1>&2; exit 1 ;;
esac"#;
    let converter = fake_converter(tmp.path(), "picky-dot", body);

    write_file(&source.join("a.dot"), "digraph {}");
    write_file(&source.join("README.md"), "# not a diagram");

    let result = RenderCoordinator::new(config(&source, &dest, &converter))
        .run()
        .await
        .unwrap();

    // The non-diagram file was attempted, not silently skipped
    assert_eq!(result.files_found, 2);
    assert_eq!(result.rendered, 1);
    assert_eq!(result.errors, 1);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].path.ends_with("README.md"));
    assert_eq!(tree_files(&dest), vec![PathBuf::from("a.svg")]);
}

#[tokio::test]
async fn test_best_effort_continues_past_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "broken-dot", "echo boom 1>&2\nexit 2");

    for i in 0..6 {
        write_file(&source.join(format!("d{i}/graph.dot")), "digraph {}");
    }

    let result = RenderCoordinator::new(config(&source, &dest, &converter))
        .run()
        .await
        .unwrap();

    assert!(result.completed);
    assert_eq!(result.rendered, 0);
    assert_eq!(result.errors, 6);
    assert_eq!(result.failures.len(), 6);
    assert!(tree_files(&dest).is_empty());
}

#[tokio::test]
async fn test_fail_fast_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "broken-dot", "exit 1");

    for i in 0..20 {
        write_file(&source.join(format!("g{i}.dot")), "digraph {}");
    }

    let mut config = config(&source, &dest, &converter);
    config.fail_fast = true;

    let err = RenderCoordinator::new(config).run().await.unwrap_err();
    assert!(matches!(err, MillError::Aborted { .. }));
}

#[tokio::test]
async fn test_symlinks_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "fake-dot", COPY_CONVERTER);

    write_file(&source.join("a.dot"), "digraph {}");
    std::os::unix::fs::symlink(source.join("a.dot"), source.join("alias.dot")).unwrap();

    let result = RenderCoordinator::new(config(&source, &dest, &converter))
        .run()
        .await
        .unwrap();

    assert_eq!(result.rendered, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(tree_files(&dest), vec![PathBuf::from("a.svg")]);
}

#[tokio::test]
async fn test_exclude_pattern_prunes_subtree() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "fake-dot", COPY_CONVERTER);

    write_file(&source.join("keep/a.dot"), "digraph {}");
    write_file(&source.join(".drafts/wip.dot"), "digraph {}");

    let mut config = config(&source, &dest, &converter);
    config.exclude_patterns = vec![regex::Regex::new(r"\.drafts").unwrap()];

    let result = RenderCoordinator::new(config).run().await.unwrap();

    assert_eq!(result.rendered, 1);
    assert_eq!(tree_files(&dest), vec![PathBuf::from("keep/a.svg")]);
}

#[tokio::test]
async fn test_alternate_format_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "fake-dot", COPY_CONVERTER);

    write_file(&source.join("a.dot"), "digraph {}");

    let mut config = config(&source, &dest, &converter);
    config.format = "png".into();

    let result = RenderCoordinator::new(config).run().await.unwrap();

    assert_eq!(result.rendered, 1);
    assert_eq!(tree_files(&dest), vec![PathBuf::from("a.png")]);
}

#[tokio::test]
async fn test_empty_source_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("res");
    let dest = tmp.path().join("bin");
    let converter = fake_converter(tmp.path(), "fake-dot", COPY_CONVERTER);
    std::fs::create_dir_all(&source).unwrap();

    let result = RenderCoordinator::new(config(&source, &dest, &converter))
        .run()
        .await
        .unwrap();

    assert!(result.completed);
    assert_eq!(result.dirs_scanned, 1);
    assert_eq!(result.files_found, 0);
    assert_eq!(result.rendered, 0);
    assert!(tree_files(&dest).is_empty());
}
