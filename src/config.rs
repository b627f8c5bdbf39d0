//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgtree/orgtree.toml`
//! 3. Local config: `<project_dir>/.orgtree.toml`
//! 4. Environment variables: `ORGTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::value::{self, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{ExpansionPolicy, IdStrategy, NodeId, SearchField};
use crate::util::path::{expand_env_vars, resolve_against};

/// Raw settings for intermediate parsing.
///
/// Every field is an Option to tell "not specified" (inherit) apart from an
/// explicit value, including an explicit empty array.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub id_strategy: Option<IdStrategy>,
    pub default_expanded: Option<Vec<String>>,
    pub seed_file: Option<PathBuf>,
    pub search_fields: Option<Vec<SearchField>>,
}

/// Unified configuration for orgtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// How new department ids are generated
    pub id_strategy: IdStrategy,
    /// Ids expanded while no search query is active
    pub default_expanded: Vec<String>,
    /// Seed document loaded on startup
    pub seed_file: Option<PathBuf>,
    /// Fields the search box looks at
    pub search_fields: Vec<SearchField>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::default(),
            default_expanded: Vec::new(),
            seed_file: None,
            search_fields: SearchField::ALL.to_vec(),
        }
    }
}

/// Get the XDG config directory for orgtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgtree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".orgtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["1", "2"], &["3"])       // → ["1", "2", "3"]
/// merge_array(&["1", "2"], &["!1", "3"]) // → ["2", "3"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for item in overlay {
        if let Some(negated) = item.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(item.clone());
        }
    }

    // Convert to sorted Vec for deterministic output
    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

impl Settings {
    /// Expansion policy built from `default_expanded`.
    pub fn expansion_policy(&self) -> ExpansionPolicy {
        ExpansionPolicy::new(self.default_expanded.iter().map(|id| NodeId::from(id.as_str())))
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(seed) = &self.seed_file {
            self.seed_file = Some(PathBuf::from(expand_env_vars(&seed.to_string_lossy())));
        }
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    ///
    /// A relative `seed_file` in a local config is taken relative to the
    /// project directory.
    fn merge_with(&self, overlay: &RawSettings, project_dir: &Path) -> Self {
        Self {
            id_strategy: overlay.id_strategy.unwrap_or(self.id_strategy),
            default_expanded: overlay
                .default_expanded
                .as_ref()
                .map(|o| merge_array(&self.default_expanded, o))
                .unwrap_or_else(|| self.default_expanded.clone()),
            seed_file: overlay
                .seed_file
                .as_ref()
                .map(|p| resolve_against(project_dir, p))
                .or_else(|| self.seed_file.clone()),
            search_fields: overlay
                .search_fields
                .clone()
                .unwrap_or_else(|| self.search_fields.clone()),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            id_strategy: global.id_strategy.unwrap_or(self.id_strategy),
            default_expanded: global
                .default_expanded
                .clone()
                .unwrap_or_else(|| self.default_expanded.clone()),
            seed_file: global.seed_file.clone().or_else(|| self.seed_file.clone()),
            search_fields: global
                .search_fields
                .clone()
                .unwrap_or_else(|| self.search_fields.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with negation support (`"!id"` removes an inherited id)
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(
            global_config_path().as_deref(),
            project_dir,
            Environment::with_prefix("ORGTREE"),
        )
    }

    /// Load settings from explicit layer sources.
    pub fn load_layers(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config (REPLACES defaults)
        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        // 3. Local config (UNION with global)
        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw, project);
            }
        }

        // 4. Environment variables (REPLACE)
        current = Self::apply_env_overrides(current, env)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply ORGTREE_* environment variables as explicit overrides.
    ///
    /// Lists are comma separated: `ORGTREE_DEFAULT_EXPANDED=1,2,3`.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env.prefix_separator("_").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("id_strategy") {
            settings.id_strategy = parse_value(&val)?;
        }
        if let Ok(val) = config.get_string("default_expanded") {
            settings.default_expanded = split_list(&val);
        }
        if let Ok(val) = config.get_string("seed_file") {
            settings.seed_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("search_fields") {
            settings.search_fields = split_list(&val)
                .iter()
                .map(|field| parse_value(field))
                .collect::<Result<_, _>>()?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orgtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orgtree/orgtree.toml  (defines your baseline)
#   Local:  <project_dir>/.orgtree.toml     (project-specific additions)
#   Env:    ORGTREE_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS default_expanded with global.
#   Use "!id" in local config to REMOVE an inherited id:
#     default_expanded = ["4", "!1"]

# Id generation: "sequential" ("1", "2", ...) or "uuid"
# id_strategy = "sequential"

# Department ids expanded while the search box is empty
# default_expanded = ["1", "2", "3"]

# Seed document loaded on startup (relative to the project directory)
# seed_file = "departments.toml"

# Fields matched by search: name, code, manager_name
# search_fields = ["name", "code", "manager_name"]
"#
        .to_string()
    }
}

/// Parse a bare enum value such as `uuid` or `manager_name`.
fn parse_value<T: DeserializeOwned>(raw: &str) -> Result<T, ApplicationError> {
    let de: StrDeserializer<'_, value::Error> = raw.trim().into_deserializer();
    T::deserialize(de).map_err(|e| ApplicationError::Config {
        message: format!("invalid value {raw:?}: {e}"),
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_env() -> Environment {
        Environment::with_prefix("ORGTREE").source(Some(HashMap::new()))
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("ORGTREE").source(Some(map))
    }

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load_layers(None, None, no_env()).expect("load defaults");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.search_fields.len(), 3);
        assert!(settings.expansion_policy().default_expanded().is_empty());
    }

    #[test]
    fn test_merge_array_union() {
        let base = vec!["1".to_string(), "2".to_string()];
        let overlay = vec!["3".to_string()];
        assert_eq!(merge_array(&base, &overlay), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_merge_array_negation() {
        let base = vec!["1".to_string(), "2".to_string()];
        let overlay = vec!["!1".to_string(), "3".to_string()];
        assert_eq!(merge_array(&base, &overlay), vec!["2", "3"]);
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let base = vec!["1".to_string()];
        let overlay = vec!["!9".to_string()];
        assert_eq!(merge_array(&base, &overlay), vec!["1"]);
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let base = Settings {
            default_expanded: vec!["1".into(), "2".into()],
            ..Settings::default()
        };
        let global = RawSettings {
            default_expanded: Some(vec!["7".into()]),
            search_fields: Some(vec![SearchField::Code]),
            ..RawSettings::default()
        };

        let result = base.apply_global(&global);

        assert_eq!(result.default_expanded, vec!["7"]);
        assert_eq!(result.search_fields, vec![SearchField::Code]);
        assert_eq!(result.id_strategy, IdStrategy::Sequential);
    }

    #[test]
    fn test_merge_with_resolves_relative_seed_against_project() {
        let base = Settings::default();
        let local = RawSettings {
            seed_file: Some(PathBuf::from("org.toml")),
            ..RawSettings::default()
        };

        let result = base.merge_with(&local, Path::new("/work/project"));

        assert_eq!(result.seed_file, Some(PathBuf::from("/work/project/org.toml")));
    }

    #[test]
    fn given_env_overrides_when_loading_then_they_replace_values() {
        let settings = Settings::load_layers(
            None,
            None,
            env(&[
                ("ORGTREE_ID_STRATEGY", "uuid"),
                ("ORGTREE_DEFAULT_EXPANDED", "1, 2,3"),
                ("ORGTREE_SEARCH_FIELDS", "name,manager_name"),
            ]),
        )
        .expect("load with env");

        assert_eq!(settings.id_strategy, IdStrategy::Uuid);
        assert_eq!(settings.default_expanded, vec!["1", "2", "3"]);
        assert_eq!(
            settings.search_fields,
            vec![SearchField::Name, SearchField::ManagerName]
        );
    }

    #[test]
    fn given_invalid_env_value_when_loading_then_config_error() {
        let result = Settings::load_layers(None, None, env(&[("ORGTREE_ID_STRATEGY", "random")]));
        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_toml() {
        let settings = Settings {
            id_strategy: IdStrategy::Uuid,
            default_expanded: vec!["1".into()],
            seed_file: Some(PathBuf::from("/tmp/seed.toml")),
            search_fields: vec![SearchField::Name],
        };
        let toml = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_empty_config() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.default_expanded.is_none());
        assert!(raw.id_strategy.is_none());
    }
}
