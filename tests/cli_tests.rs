//! End-to-end tests for the `omc-convert` binary.
//!
//! Fake `OgreXMLConverter`/`OgreMeshUpgrader` scripts are placed in a temp
//! `bin/` directory and handed to the binary with `--path`.

#![cfg(unix)]

use pretty_assertions::assert_eq;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TOOL: &str = "#!/bin/sh\necho \"$0 $*\"\nexit 0\n";

fn install_tools(dir: &Path) -> String {
    let bin = dir.join("bin");
    fs::create_dir_all(&bin).unwrap();
    for name in ["OgreXMLConverter", "OgreMeshUpgrader"] {
        let path = bin.join(name);
        fs::write(&path, TOOL).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    bin.display().to_string()
}

fn omc_convert(tmp: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_omc-convert"))
        .arg("--settings")
        .arg(tmp.path().join("settings.json"))
        .args(args)
        .output()
        .expect("run omc-convert")
}

#[test]
fn test_json_report_is_all_of_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    let search_path = install_tools(tmp.path());
    let model = tmp.path().join("a.mesh.xml");
    fs::write(&model, "<mesh></mesh>").unwrap();

    let output = omc_convert(
        &tmp,
        &[
            "convert",
            model.to_str().unwrap(),
            "--path",
            &search_path,
            "--json",
        ],
    );

    assert!(output.status.success(), "{:?}", output);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON stdout");
    assert_eq!(report["status"], "completed");
    assert_eq!(report["progress"]["done"], 2);
    // Logs still go somewhere
    assert!(String::from_utf8_lossy(&output.stderr).contains("Successful!"));
}

#[test]
fn test_show_path_prints_stored_value_only() {
    let tmp = tempfile::tempdir().unwrap();

    let set = omc_convert(&tmp, &["set-path", "/opt/ogre/bin"]);
    assert!(set.status.success(), "{:?}", set);
    assert!(set.stdout.is_empty());

    let show = omc_convert(&tmp, &["show-path"]);
    assert!(show.status.success(), "{:?}", show);
    assert_eq!(String::from_utf8(show.stdout).unwrap(), "/opt/ogre/bin\n");
}
