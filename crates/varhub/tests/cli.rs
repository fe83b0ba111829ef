#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/library.json")
}

/// Runs with an empty home so no user config leaks in.
fn varhub_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("varhub"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("VARHUB_LOG")
        .env_remove("VARHUB_SECRET_MASK");
    cmd
}

fn json_output(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = varhub_cmd(home).args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_table_lists_every_variable_with_masked_secrets() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args(["table", fixture().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("GROUP"))
        .stdout(predicate::str::contains("https://staging.example.com"))
        .stdout(predicate::str::contains("******"))
        .stdout(predicate::str::contains("6 rows"))
        .stdout(predicate::str::contains("no pending changes"));
}

#[test]
fn test_table_filter_is_substring_and_case_insensitive() {
    let home = TempDir::new().unwrap();
    let doc = json_output(
        &home,
        &["table", fixture().to_str().unwrap(), "--filter", "AUTH.client", "--output", "json"],
    );
    let rows = doc["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Auth.ClientId");
}

#[test]
fn test_filter_with_no_match_prints_placeholder() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args(["matrix", fixture().to_str().unwrap(), "--filter", "nothing-like-this"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No items found"));
}

#[test]
fn test_set_modifies_and_adds() {
    let home = TempDir::new().unwrap();
    let doc = json_output(
        &home,
        &[
            "table",
            fixture().to_str().unwrap(),
            "--set",
            "staging:Api.BaseUrl=https://new.example.com",
            "--set",
            "production:Cache.Ttl=60",
            "--output",
            "json",
        ],
    );
    assert_eq!(doc["changes"]["modified"], 1);
    assert_eq!(doc["changes"]["added"], 1);
    assert_eq!(doc["canSave"], true);
}

#[test]
fn test_duplicate_rename_blocks_save() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args([
            "table",
            fixture().to_str().unwrap(),
            "--rename",
            "staging:Auth.ClientId=api.baseurl",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Names must be unique"))
        .stdout(predicate::str::contains("fix the errors above before saving"));
}

#[test]
fn test_renaming_a_secret_warns_and_keeps_name() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args([
            "table",
            fixture().to_str().unwrap(),
            "--rename",
            "staging:Auth.Secret=Leaked",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("secret variable names cannot be changed"))
        .stdout(predicate::str::contains("Leaked").not());
}

#[test]
fn test_delete_marks_row_and_counts_it() {
    let home = TempDir::new().unwrap();
    let doc = json_output(
        &home,
        &[
            "table",
            fixture().to_str().unwrap(),
            "--delete",
            "production:Feature.Beta",
            "--output",
            "json",
        ],
    );
    let beta = doc["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Feature.Beta")
        .cloned()
        .unwrap();
    assert_eq!(beta["deleted"], true);
    assert_eq!(beta["status"]["type"], "Deleted");
    assert_eq!(doc["changes"]["deleted"], 1);
}

#[test]
fn test_unknown_group_is_an_error() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args(["table", fixture().to_str().unwrap(), "--set", "nope:X=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown group: nope"));
}

#[test]
fn test_tree_expands_groups_and_lists_files() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args(["tree", fixture().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("▾ staging"))
        .stdout(predicate::str::contains("Auth.ClientId"))
        .stdout(predicate::str::contains("signing.pfx"));

    varhub_cmd(&home)
        .args(["tree", fixture().to_str().unwrap(), "--collapsed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("▸ staging"))
        .stdout(predicate::str::contains("Auth.ClientId").not());
}

#[test]
fn test_tree_sorts_groups_by_name() {
    let home = TempDir::new().unwrap();
    let doc = json_output(
        &home,
        &["tree", fixture().to_str().unwrap(), "--collapsed", "--sort", "name", "--output", "json"],
    );
    let names: Vec<&str> = doc["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["production", "staging", "signing.pfx"]);
}

#[test]
fn test_matrix_synthesizes_missing_cells() {
    let home = TempDir::new().unwrap();
    let doc = json_output(&home, &["matrix", fixture().to_str().unwrap(), "--output", "json"]);
    let rows = doc["rows"].as_array().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Api.BaseUrl", "Auth.ClientId", "Auth.Secret", "Feature.Beta"]);

    let client_id = &rows[1];
    assert_eq!(client_id["cells"]["staging"]["value"], "stg-client");
    assert_eq!(client_id["cells"]["production"]["value"], "");
    assert_eq!(client_id["cells"]["production"]["status"]["type"], "Untracked");
    assert_eq!(doc["changes"]["modified"], 0);
}

#[test]
fn test_matrix_set_fills_a_missing_cell() {
    let home = TempDir::new().unwrap();
    let doc = json_output(
        &home,
        &[
            "matrix",
            fixture().to_str().unwrap(),
            "--set",
            "production:Auth.ClientId=prd-client",
            "--output",
            "json",
        ],
    );
    let client_id = &doc["rows"][1];
    assert_eq!(client_id["name"], "Auth.ClientId");
    assert_eq!(client_id["cells"]["production"]["value"], "prd-client");
    assert_eq!(client_id["cells"]["production"]["status"]["type"], "Untracked");
    assert_eq!(doc["changes"]["added"], 1);
    assert_eq!(doc["changes"]["invalid"], 0);
}

#[test]
fn test_matrix_sorts_by_group_column_descending() {
    let home = TempDir::new().unwrap();
    let doc = json_output(
        &home,
        &[
            "matrix",
            fixture().to_str().unwrap(),
            "--sort",
            "staging",
            "--desc",
            "--output",
            "json",
        ],
    );
    let first = &doc["rows"][0];
    assert_eq!(first["name"], "Auth.ClientId");
}

#[test]
fn test_missing_file_fails_with_load_error() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args(["table", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("/definitely/not/here.json"));
}

#[test]
fn test_secret_mask_comes_from_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("varhub.toml");
    std::fs::write(&config, "secret_mask = \"<hidden>\"\n").unwrap();
    varhub_cmd(&home)
        .args([
            "--config",
            config.to_str().unwrap(),
            "table",
            fixture().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<hidden>"));
}

#[test]
fn test_config_gen_prints_template() {
    let home = TempDir::new().unwrap();
    varhub_cmd(&home)
        .args(["config", "gen"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret_mask"))
        .stdout(predicate::str::contains("preserve_tree_expansion"));
}
