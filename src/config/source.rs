//! Layered configuration source.
//!
//! Holds configuration layers in priority order (lowest first) and merges
//! them field-by-field. Keys match ignoring ASCII case, so an environment
//! override `APP__DATABASE__URL` replaces `Database.Url` from a file.

use super::merge::deep_merge_all_ignore_case;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Separator between nested keys in environment variable names.
pub const ENV_KEY_SEPARATOR: &str = "__";

/// Separator between nested keys in section paths.
pub const SECTION_SEPARATOR: char = ':';

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOrigin {
    /// Value supplied in code.
    Inline,
    /// YAML file on disk.
    File(PathBuf),
    /// Environment variables with the given prefix.
    Environment { prefix: String },
}

impl std::fmt::Display for LayerOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerOrigin::Inline => write!(f, "inline"),
            LayerOrigin::File(path) => write!(f, "file {}", path.display()),
            LayerOrigin::Environment { prefix } => write!(f, "environment ({}*)", prefix),
        }
    }
}

#[derive(Debug, Clone)]
struct Layer {
    origin: LayerOrigin,
    value: Value,
}

/// Ordered configuration layers, later layers taking precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    layers: Vec<Layer>,
}

impl ConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer from an in-memory value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.push(LayerOrigin::Inline, value);
        self
    }

    /// Add a layer parsed from YAML text.
    pub fn with_yaml_str(mut self, yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml).context("Invalid YAML configuration")?;
        self.push(LayerOrigin::Inline, value);
        Ok(self)
    }

    /// Add a layer from a YAML file. The file must exist.
    pub fn with_yaml_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let value: Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        self.push(LayerOrigin::File(path.to_path_buf()), value);
        Ok(self)
    }

    /// Add a layer from a YAML file if it exists.
    pub fn with_optional_yaml_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            self.with_yaml_file(path)
        } else {
            debug!(path = %path.display(), "Optional config file not found");
            Ok(self)
        }
    }

    /// Add a layer from the process environment variables starting with `prefix`.
    pub fn with_env_prefix(self, prefix: &str) -> Self {
        self.with_env_vars(prefix, std::env::vars())
    }

    /// Add a layer from `vars`, keeping those that start with `prefix`.
    ///
    /// The prefix is stripped and the rest of the name is split on `__`:
    /// `APP__Database__Url=x` with prefix `APP__` becomes
    /// `{"Database": {"Url": "x"}}`. Values stay strings.
    pub fn with_env_vars(
        mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut root = Map::new();
        let mut count = 0;
        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(prefix) else {
                continue;
            };
            let keys: Vec<&str> = rest
                .split(ENV_KEY_SEPARATOR)
                .filter(|key| !key.is_empty())
                .collect();
            if keys.is_empty() {
                continue;
            }
            insert_path(&mut root, &keys, Value::String(value));
            count += 1;
        }
        debug!(prefix, count, "Collected environment overrides");
        self.push(
            LayerOrigin::Environment {
                prefix: prefix.to_string(),
            },
            Value::Object(root),
        );
        self
    }

    fn push(&mut self, origin: LayerOrigin, value: Value) {
        debug!(origin = %origin, "Adding configuration layer");
        self.layers.push(Layer { origin, value });
    }

    /// Origins of all layers, lowest priority first.
    pub fn origins(&self) -> impl Iterator<Item = &LayerOrigin> {
        self.layers.iter().map(|layer| &layer.origin)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers merged into one value.
    pub fn merged(&self) -> Value {
        deep_merge_all_ignore_case(self.layers.iter().map(|layer| layer.value.clone()))
    }

    /// The merged value at a `:`-separated section path.
    ///
    /// Each key matches exactly first, then ignoring ASCII case. An empty path
    /// returns the whole configuration. Returns `None` when any key is missing
    /// or the section is `null`.
    pub fn section(&self, path: &str) -> Option<Value> {
        let mut current = self.merged();
        for key in path.split(SECTION_SEPARATOR).filter(|key| !key.is_empty()) {
            let Value::Object(mut map) = current else {
                return None;
            };
            let found = match map.remove(key) {
                Some(value) => value,
                None => {
                    let existing = map.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned()?;
                    map.remove(&existing)?
                }
            };
            current = found;
        }
        (!current.is_null()).then_some(current)
    }
}

/// Insert `value` at the nested key path, creating objects on the way.
fn insert_path(root: &mut Map<String, Value>, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut current = root;
    for key in parents {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_source() {
        let source = ConfigSource::new();
        assert!(source.is_empty());
        assert_eq!(source.merged(), Value::Null);
        assert_eq!(source.section("Anything"), None);
    }

    #[test]
    fn test_layers_merge_in_order() {
        let source = ConfigSource::new()
            .with_value(json!({"Db": {"Url": "a", "Pool": 5}}))
            .with_value(json!({"Db": {"Url": "b"}}));
        assert_eq!(source.merged(), json!({"Db": {"Url": "b", "Pool": 5}}));
    }

    #[test]
    fn test_section_lookup() {
        let source = ConfigSource::new()
            .with_yaml_str(
                r#"
ConnectionStrings:
  Primary:
    Url: pg://primary
Empty: ~
"#,
            )
            .unwrap();

        assert_eq!(
            source.section("ConnectionStrings:Primary"),
            Some(json!({"Url": "pg://primary"}))
        );
        assert_eq!(
            source.section("connectionstrings:PRIMARY:url"),
            Some(json!("pg://primary"))
        );
        assert_eq!(source.section("ConnectionStrings:Missing"), None);
        assert_eq!(source.section("ConnectionStrings:Primary:Url:Deeper"), None);
        assert_eq!(source.section("Empty"), None);
        assert!(source.section("").is_some());
    }

    #[test]
    fn test_env_vars_layer() {
        let source = ConfigSource::new()
            .with_value(json!({"Database": {"Url": "file", "Pool": 5}}))
            .with_env_vars(
                "APP__",
                env(&[
                    ("APP__DATABASE__URL", "env"),
                    ("APP__Feature__Enabled", "true"),
                    ("OTHER__Database__Url", "ignored"),
                    ("APP__", "ignored"),
                ]),
            );

        assert_eq!(
            source.merged(),
            json!({
                "Database": {"Url": "env", "Pool": 5},
                "Feature": {"Enabled": "true"}
            })
        );
        assert_eq!(
            source.origins().last(),
            Some(&LayerOrigin::Environment {
                prefix: "APP__".to_string()
            })
        );
    }

    #[test]
    fn test_insert_path_replaces_scalar_parent() {
        let mut root = Map::new();
        insert_path(&mut root, &["a"], json!("x"));
        insert_path(&mut root, &["a", "b"], json!("y"));
        assert_eq!(Value::Object(root), json!({"a": {"b": "y"}}));
    }

    #[test]
    fn test_yaml_files() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base.yaml");
        let local = temp.path().join("local.yaml");
        std::fs::write(&base, "Server:\n  Host: localhost\n  Port: 80\n").unwrap();
        std::fs::write(&local, "server:\n  port: 8080\n").unwrap();

        let source = ConfigSource::new()
            .with_yaml_file(&base)
            .unwrap()
            .with_optional_yaml_file(&local)
            .unwrap()
            .with_optional_yaml_file(temp.path().join("missing.yaml"))
            .unwrap();

        assert_eq!(source.origins().count(), 2);
        assert_eq!(
            source.section("Server"),
            Some(json!({"Host": "localhost", "Port": 8080}))
        );
    }

    #[test]
    fn test_missing_required_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = ConfigSource::new()
            .with_yaml_file(temp.path().join("nope.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_empty_yaml_file_is_null_layer() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yaml");
        std::fs::write(&path, "# nothing here\n").unwrap();

        let source = ConfigSource::new()
            .with_value(json!({"a": 1}))
            .with_yaml_file(&path)
            .unwrap();
        assert_eq!(source.merged(), json!({"a": 1}));
    }
}
