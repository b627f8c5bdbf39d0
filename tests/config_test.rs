//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE (global defines the real baseline)
//! - Global → Local: UNION with negation support (local adds project-specific ids)
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Every test passes its own global path and environment source, so the
//! developer's real config and shell never leak in.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use config::Environment;
use tempfile::TempDir;

use orgtree::config::{local_config_path, Settings};
use orgtree::domain::{IdStrategy, NodeId, SearchField};

fn no_env() -> Environment {
    Environment::with_prefix("ORGTREE").source(Some(HashMap::new()))
}

fn env(vars: &[(&str, &str)]) -> Environment {
    let map = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>();
    Environment::with_prefix("ORGTREE").source(Some(map))
}

fn write_global(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("orgtree.toml");
    fs::write(&path, content).unwrap();
    path
}

fn write_local(project: &Path, content: &str) {
    fs::write(local_config_path(project), content).unwrap();
}

#[test]
fn given_no_config_files_when_load_then_defaults() {
    let project = TempDir::new().unwrap();

    let settings = Settings::load_layers(None, Some(project.path()), no_env()).unwrap();

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.id_strategy, IdStrategy::Sequential);
    assert!(settings.default_expanded.is_empty());
    assert_eq!(settings.search_fields, SearchField::ALL.to_vec());
}

#[test]
fn given_global_and_local_when_load_then_local_unions_with_global() {
    let global_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let global = write_global(&global_dir, r#"default_expanded = ["1", "2", "3"]"#);
    write_local(project.path(), r#"default_expanded = ["4", "!1"]"#);

    let settings = Settings::load_layers(Some(&global), Some(project.path()), no_env()).unwrap();

    assert_eq!(settings.default_expanded, vec!["2", "3", "4"]);
    let policy = settings.expansion_policy();
    assert!(policy.default_expanded().contains(&NodeId::from("4")));
    assert!(!policy.default_expanded().contains(&NodeId::from("1")));
}

#[test]
fn given_global_list_when_load_then_replaces_defaults() {
    let global_dir = TempDir::new().unwrap();
    let global = write_global(
        &global_dir,
        r#"
id_strategy = "uuid"
search_fields = ["code"]
"#,
    );

    let settings = Settings::load_layers(Some(&global), None, no_env()).unwrap();

    assert_eq!(settings.id_strategy, IdStrategy::Uuid);
    assert_eq!(settings.search_fields, vec![SearchField::Code]);
}

#[test]
fn given_relative_seed_in_local_config_when_load_then_resolved_against_project() {
    let project = TempDir::new().unwrap();
    write_local(project.path(), r#"seed_file = "departments.toml""#);

    let settings = Settings::load_layers(None, Some(project.path()), no_env()).unwrap();

    assert_eq!(
        settings.seed_file,
        Some(project.path().join("departments.toml"))
    );
}

#[test]
fn given_env_vars_when_load_then_env_replaces_files() {
    let project = TempDir::new().unwrap();
    write_local(
        project.path(),
        r#"
default_expanded = ["1"]
search_fields = ["name"]
"#,
    );

    let settings = Settings::load_layers(
        None,
        Some(project.path()),
        env(&[
            ("ORGTREE_DEFAULT_EXPANDED", "7, 10"),
            ("ORGTREE_SEARCH_FIELDS", "code,manager_name"),
            ("ORGTREE_ID_STRATEGY", "uuid"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.default_expanded, vec!["7", "10"]);
    assert_eq!(
        settings.search_fields,
        vec![SearchField::Code, SearchField::ManagerName]
    );
    assert_eq!(settings.id_strategy, IdStrategy::Uuid);
}

#[test]
fn given_unknown_search_field_in_env_when_load_then_config_error() {
    let result = Settings::load_layers(None, None, env(&[("ORGTREE_SEARCH_FIELDS", "salary")]));

    assert!(result.is_err());
}

#[test]
fn given_invalid_local_toml_when_load_then_error() {
    let project = TempDir::new().unwrap();
    write_local(project.path(), "default_expanded = [");

    let result = Settings::load_layers(None, Some(project.path()), no_env());

    assert!(result.is_err());
}

#[test]
fn given_template_when_parsed_then_yields_defaults() {
    let project = TempDir::new().unwrap();
    write_local(project.path(), &Settings::template());

    let settings = Settings::load_layers(None, Some(project.path()), no_env()).unwrap();

    assert_eq!(settings, Settings::default());
}
