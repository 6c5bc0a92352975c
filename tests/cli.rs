//! Tests for the `bids-generator` binary's argument handling.
#![cfg(feature = "cli")]

use std::path::Path;
use std::process::{Command, Output};

fn bids_generator(dest_root: &Path, positional: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bids-generator"))
        .arg("--dest-root")
        .arg(dest_root)
        .args(positional)
        .output()
        .unwrap()
}

#[test]
fn test_wrong_positional_count_does_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let dest_root = tmp.path().join("BIDSproject");

    for positional in [
        &["/project", "P001", "1"][..],
        &["/project", "P001", "1", "2", "extra"][..],
        &[][..],
    ] {
        let output = bids_generator(&dest_root, positional);
        assert!(output.status.success(), "{:?}", positional);
        assert!(output.stdout.is_empty(), "{:?}", positional);
        assert!(!dest_root.exists(), "{:?}", positional);
    }
}

#[test]
fn test_four_positionals_run_the_reorganizer() {
    let tmp = tempfile::tempdir().unwrap();
    let dest_root = tmp.path().join("BIDSproject");
    let project = tmp.path().join("missing-project");

    let output = bids_generator(
        &dest_root,
        &[project.to_str().unwrap(), "P001", "1", "2"],
    );
    // The session does not exist, so the anatomical copy fails after the
    // layout is created.
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
    assert!(dest_root.join("sub-01/anat").is_dir());
}
