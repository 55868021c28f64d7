//! Integration tests for binding settings from layered configuration.
//!
//! These tests load YAML files from a temporary directory, apply
//! environment overrides, and check the bound, substituted instance.

use serde::{Deserialize, Serialize};
use settings_substitution::substitution::{UndefinedBehavior, VariableSyntax};
use settings_substitution::{
    BoxError, ConfigSource, ConfiguratorOptions, ConfigureError, EnvironmentVariablesSubstitution,
    OptionsError, ReadOnly, Section, configure_record, from_fn,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DatabaseSettings {
    url: String,
    pool_size: u32,
    read_only: bool,
    replicas: Vec<String>,
    password: Option<String>,
    labels: HashMap<String, String>,
    schema_version: ReadOnly<String>,
}

configure_record!(DatabaseSettings {
    url,
    pool_size,
    read_only,
    replicas,
    password,
    labels,
    schema_version,
});

impl Section for DatabaseSettings {
    const SECTION_NAME: Option<&'static str> = Some("ConnectionStrings:Database");
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Logging {
    level: String,
    file: Option<String>,
}

configure_record!(Logging { level, file });

impl Section for Logging {}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Tuning {
    offset: i32,
    ratio: f64,
    enabled: bool,
    limit: Option<u16>,
    verbose: Option<bool>,
    label: Option<String>,
}

configure_record!(Tuning {
    offset,
    ratio,
    enabled,
    limit,
    verbose,
    label,
});

impl Section for Tuning {}

const BASE_YAML: &str = r#"
ConnectionStrings:
  Database:
    Url: "pg://${DB_HOST}:${DB_PORT}/app"
    PoolSize: 5
    Replicas:
      - "pg://$DB_HOST:5433/app"
      - "pg://replica.static/app"
    Labels:
      owner: "${TEAM}"
    SchemaVersion: "${SCHEMA}"
Logging:
  Level: info
  File: "$LOG_DIR/app.log"
"#;

fn write(temp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn vars() -> HashMap<String, String> {
    HashMap::from([
        ("DB_HOST".to_string(), "db.internal".to_string()),
        ("DB_PORT".to_string(), "5432".to_string()),
        ("TEAM".to_string(), "platform".to_string()),
        ("SCHEMA".to_string(), "v9".to_string()),
        ("LOG_DIR".to_string(), "/var/log".to_string()),
    ])
}

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn auto_bind_substitutes_bound_settings() {
    let temp = TempDir::new().unwrap();
    let base = write(&temp, "appsettings.yaml", BASE_YAML);
    let source = ConfigSource::new().with_yaml_file(&base).unwrap();

    let db: DatabaseSettings = source
        .options()
        .auto_bind()
        .substitute_with(EnvironmentVariablesSubstitution::with_source(vars()))
        .build()
        .unwrap();

    assert_eq!(db.url, "pg://db.internal:5432/app");
    assert_eq!(db.pool_size, 5);
    assert!(!db.read_only);
    assert_eq!(
        db.replicas,
        vec![
            "pg://db.internal:5433/app".to_string(),
            "pg://replica.static/app".to_string()
        ]
    );
    assert_eq!(db.password, None);
    assert_eq!(db.labels["owner"], "platform");
    // Read-only values are bound but never substituted.
    assert_eq!(*db.schema_version, "${SCHEMA}");
}

#[test]
fn layers_and_env_overrides_merge_before_substitution() {
    let temp = TempDir::new().unwrap();
    let base = write(&temp, "appsettings.yaml", BASE_YAML);
    let local = write(
        &temp,
        "appsettings.local.yaml",
        "connectionstrings:\n  database:\n    poolsize: 20\n",
    );

    let source = ConfigSource::new()
        .with_yaml_file(&base)
        .unwrap()
        .with_optional_yaml_file(&local)
        .unwrap()
        .with_optional_yaml_file(temp.path().join("appsettings.missing.yaml"))
        .unwrap()
        .with_env_vars(
            "APP__",
            env(&[
                ("APP__ConnectionStrings__Database__Password", "${DB_PASS}"),
                ("APP__CONNECTIONSTRINGS__DATABASE__READONLY", "true"),
                ("APP__ConnectionStrings__Database__PoolSize", "50"),
            ]),
        );

    let mut vars = vars();
    vars.insert("DB_PASS".to_string(), "s3cret".to_string());

    let db: DatabaseSettings = source
        .options()
        .auto_bind()
        .substitute_with(EnvironmentVariablesSubstitution::with_source(vars))
        .build()
        .unwrap();

    assert_eq!(db.pool_size, 50);
    assert!(db.read_only);
    assert_eq!(db.password.as_deref(), Some("s3cret"));
    assert_eq!(db.url, "pg://db.internal:5432/app");
}

#[test]
fn auto_bind_falls_back_to_type_name() {
    let source = ConfigSource::new().with_yaml_str(BASE_YAML).unwrap();

    let logging: Logging = source
        .options()
        .auto_bind()
        .substitute_with(EnvironmentVariablesSubstitution::with_source(vars()))
        .build()
        .unwrap();

    assert_eq!(logging.level, "info");
    assert_eq!(logging.file.as_deref(), Some("/var/log/app.log"));
}

#[test]
fn without_substitution_strings_stay_as_bound() {
    let source = ConfigSource::new().with_yaml_str(BASE_YAML).unwrap();
    let logging: Logging = source.options().auto_bind().build().unwrap();
    assert_eq!(logging.file.as_deref(), Some("$LOG_DIR/app.log"));
}

#[test]
fn missing_section_uses_defaults_unless_required() {
    let source = ConfigSource::new().with_yaml_str("Other: {}\n").unwrap();

    let logging: Logging = source.options().auto_bind().build().unwrap();
    assert_eq!(logging, Logging::default());

    let err = source
        .options::<Logging>()
        .auto_bind()
        .require_section()
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "configuration section `Logging` not found");
}

#[test]
fn undefined_variable_error_reports_path() {
    let source = ConfigSource::new().with_yaml_str(BASE_YAML).unwrap();
    let substitution =
        EnvironmentVariablesSubstitution::with_source(HashMap::<String, String>::new())
            .with_syntax(VariableSyntax::Unix)
            .with_undefined(UndefinedBehavior::Error);

    let err = source
        .options::<DatabaseSettings>()
        .auto_bind()
        .substitute_with(substitution)
        .build()
        .unwrap_err();

    match err {
        OptionsError::Configure(ConfigureError::Substitution { path, .. }) => {
            assert_eq!(path, "DatabaseSettings.url");
        }
        other => panic!("expected a substitution failure, got {:?}", other),
    }
}

#[test]
fn post_configure_runs_after_substitution_in_order() {
    let source = ConfigSource::new().with_yaml_str(BASE_YAML).unwrap();

    let logging: Logging = source
        .options()
        .auto_bind()
        .substitute_with(from_fn(|value: &str| value.replace("$LOG_DIR", "/tmp")))
        .post_configure(|logging: &mut Logging| {
            assert_eq!(logging.file.as_deref(), Some("/tmp/app.log"));
            logging.level = logging.level.to_uppercase();
            Ok(())
        })
        .post_configure(|logging: &mut Logging| {
            logging.level.push('!');
            Ok(())
        })
        .build()
        .unwrap();

    assert_eq!(logging.level, "INFO!");
}

#[test]
fn post_configure_failure_is_reported() {
    let source = ConfigSource::new().with_yaml_str(BASE_YAML).unwrap();

    let err = source
        .options::<Logging>()
        .auto_bind()
        .post_configure(|logging: &mut Logging| {
            if logging.level == "info" {
                Err(BoxError::from("info level is not allowed"))
            } else {
                Ok(())
            }
        })
        .build()
        .unwrap_err();

    assert!(matches!(err, OptionsError::PostConfigure { ref section, .. } if section == "Logging"));
    assert!(err.to_string().contains("info level is not allowed"));
}

#[test]
fn configurator_options_apply_to_build() {
    let source = ConfigSource::new().with_yaml_str(BASE_YAML).unwrap();

    let err = source
        .options::<DatabaseSettings>()
        .auto_bind()
        .substitute_with(EnvironmentVariablesSubstitution::with_source(vars()))
        .configurator_options(ConfiguratorOptions { max_depth: 1 })
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        OptionsError::Configure(ConfigureError::DepthExceeded { limit: 1, .. })
    ));
}

#[test]
fn bind_root_with_empty_path() {
    let source = ConfigSource::new().with_yaml_str("Level: debug\n").unwrap();
    let logging: Logging = source.options().bind("").build().unwrap();
    assert_eq!(logging.level, "debug");
}

#[test]
fn env_overrides_convert_to_default_scalar_types() {
    let source = ConfigSource::new().with_env_vars(
        "APP__",
        env(&[
            ("APP__Tuning__Offset", "-5"),
            ("APP__Tuning__RATIO", "2.5"),
            ("APP__Tuning__enabled", "true"),
        ]),
    );

    let tuning: Tuning = source.options().auto_bind().build().unwrap();

    assert_eq!(tuning.offset, -5);
    assert_eq!(tuning.ratio, 2.5);
    assert!(tuning.enabled);
}

#[test]
fn integer_text_binds_to_float_field() {
    let source = ConfigSource::new().with_env_vars("APP__", env(&[("APP__Tuning__Ratio", "3")]));
    let tuning: Tuning = source.options().auto_bind().build().unwrap();
    assert_eq!(tuning.ratio, 3.0);
}

#[test]
fn env_overrides_bind_to_unset_optional_scalars() {
    let source = ConfigSource::new().with_env_vars(
        "APP__",
        env(&[
            ("APP__Tuning__Limit", "7"),
            ("APP__Tuning__Verbose", "TRUE"),
            ("APP__Tuning__Label", "edge"),
            ("APP__Tuning__Offset", "-1"),
        ]),
    );

    let tuning: Tuning = source.options().auto_bind().build().unwrap();

    assert_eq!(tuning.limit, Some(7));
    assert_eq!(tuning.verbose, Some(true));
    assert_eq!(tuning.label.as_deref(), Some("edge"));
    assert_eq!(tuning.offset, -1);
}

#[test]
fn numeric_text_stays_text_for_unset_optional_string() {
    let source =
        ConfigSource::new().with_env_vars("APP__", env(&[("APP__Logging__File", "2024")]));
    let logging: Logging = source.options().auto_bind().build().unwrap();
    assert_eq!(logging.file.as_deref(), Some("2024"));
}

#[test]
fn unparseable_optional_scalar_reports_bind_error() {
    let source =
        ConfigSource::new().with_env_vars("APP__", env(&[("APP__Tuning__Limit", "seven")]));

    let err = source
        .options::<Tuning>()
        .auto_bind()
        .build()
        .unwrap_err();

    assert!(matches!(err, OptionsError::Bind { ref section, .. } if section == "Tuning"));
}

#[test]
fn substitute_variables_expands_both_reference_styles() {
    // Any variable of the test process whose value holds no references.
    let (name, value) = std::env::vars()
        .find(|(name, value)| {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && !value.contains(['$', '%'])
        })
        .expect("the test process has at least one plain environment variable");

    let yaml = format!("Logging:\n  Level: \"%{name}%\"\n  File: \"${{{name}}}/app.log\"\n");
    let source = ConfigSource::new().with_yaml_str(&yaml).unwrap();

    let logging: Logging = source
        .options()
        .auto_bind()
        .substitute_variables()
        .build()
        .unwrap();

    assert_eq!(logging.level, value);
    assert_eq!(logging.file, Some(format!("{value}/app.log")));
}
