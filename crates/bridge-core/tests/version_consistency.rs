//! Ensures all workspace crates use `version.workspace = true` and that the
//! internal crate pins in `[workspace.dependencies]` match the workspace version.

use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .expect("crate lives two levels below the workspace root")
        .to_path_buf()
}

fn read_toml(path: &Path) -> toml::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    text.parse()
        .unwrap_or_else(|e| panic!("cannot parse {}: {}", path.display(), e))
}

fn workspace_version() -> String {
    let doc = read_toml(&workspace_root().join("Cargo.toml"));
    doc["workspace"]["package"]["version"]
        .as_str()
        .expect("workspace.package.version")
        .to_string()
}

const CRATES: [&str; 3] = [
    "crates/bridge-core",
    "crates/bridge-cli",
    "crates/bridge-remote",
];

#[test]
fn all_crates_use_workspace_version() {
    let root = workspace_root();
    for krate in CRATES {
        let doc = read_toml(&root.join(krate).join("Cargo.toml"));
        let inherits = doc["package"]["version"]
            .get("workspace")
            .and_then(|v| v.as_bool())
            == Some(true);
        assert!(inherits, "{} must use version.workspace = true", krate);
    }
}

#[test]
fn internal_dependency_pins_match_workspace_version() {
    let version = workspace_version();
    let doc = read_toml(&workspace_root().join("Cargo.toml"));
    let deps = doc["workspace"]["dependencies"]
        .as_table()
        .expect("workspace.dependencies");

    for name in ["bridge-core", "bridge-remote"] {
        let pinned = deps[name]["version"].as_str().expect("version pin");
        assert_eq!(pinned, version, "{} pin drifted from workspace version", name);
    }
}

#[test]
fn compiled_version_matches_workspace() {
    assert_eq!(bridge_core::VERSION, workspace_version());
}
