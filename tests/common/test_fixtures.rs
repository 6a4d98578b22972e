//! Configuration fixtures

use serde_json::json;
use std::path::{Path, PathBuf};

/// Write `config.json` into `dir` with the given repositories and groups
pub fn write_config(
    dir: &Path,
    repositories: &[(&str, &Path)],
    groups: &[(&str, &[&str])],
) -> PathBuf {
    let repositories: serde_json::Map<String, serde_json::Value> = repositories
        .iter()
        .map(|(name, path)| (name.to_string(), json!({ "path": path })))
        .collect();
    let groups: serde_json::Map<String, serde_json::Value> = groups
        .iter()
        .map(|(name, members)| (name.to_string(), json!(members)))
        .collect();

    let config_path = dir.join("config.json");
    let document = json!({ "repositories": repositories, "groups": groups });
    std::fs::write(&config_path, serde_json::to_string_pretty(&document).unwrap())
        .expect("Failed to write config");
    config_path
}
