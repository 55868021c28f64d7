//! Environment variable expansion.
//!
//! Supports Unix references (`$NAME`, `${NAME}`, `$$` for a literal `$`) and
//! Windows references (`%NAME%`). A string without references is returned
//! unchanged.

use super::Substitution;
use crate::error::SubstitutionError;
use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::LazyLock;
use tracing::debug;

const UNIX_PATTERN: &str =
    r"\$(?:(?P<escape>\$)|\{(?P<braced>[^}]*)\}|(?P<bare>[A-Za-z_][A-Za-z0-9_]*)|(?P<open>\{))";
const WINDOWS_PATTERN: &str = r"%(?P<percent>[^%]+)%";

static UNIX: LazyLock<Regex> = LazyLock::new(|| compile(UNIX_PATTERN));
static WINDOWS: LazyLock<Regex> = LazyLock::new(|| compile(WINDOWS_PATTERN));
static BOTH: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!("{}|{}", UNIX_PATTERN, WINDOWS_PATTERN)));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("variable reference pattern is valid")
}

/// Which reference styles are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSyntax {
    /// `$NAME` and `${NAME}`
    #[default]
    Unix,
    /// `%NAME%`
    Windows,
    /// Both styles
    Both,
}

impl VariableSyntax {
    fn pattern(self) -> &'static Regex {
        match self {
            VariableSyntax::Unix => &UNIX,
            VariableSyntax::Windows => &WINDOWS,
            VariableSyntax::Both => &BOTH,
        }
    }
}

/// What happens to a reference whose variable is not defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedBehavior {
    /// Leave the reference text in place.
    #[default]
    Keep,
    /// Replace the reference with an empty string.
    Empty,
    /// Fail the substitution.
    Error,
}

/// Environment substitution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvSubstitutionConfig {
    #[serde(default)]
    pub syntax: VariableSyntax,

    #[serde(default)]
    pub undefined: UndefinedBehavior,
}

/// Source of variable values.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VariableSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<S: BuildHasher> VariableSource for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VariableSource for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<F> VariableSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// A parsed reference inside a string.
enum Reference<'t> {
    /// `$$`
    Escape,
    /// A variable name.
    Named(&'t str),
    /// `${...}` whose content is not a valid name.
    InvalidName,
    /// `${` without a closing brace.
    Unterminated,
}

impl<'t> Reference<'t> {
    fn from_captures(caps: &Captures<'t>) -> Self {
        if caps.name("escape").is_some() {
            Reference::Escape
        } else if let Some(name) = caps.name("braced") {
            if is_valid_name(name.as_str()) {
                Reference::Named(name.as_str())
            } else {
                Reference::InvalidName
            }
        } else if let Some(name) = caps.name("bare").or_else(|| caps.name("percent")) {
            Reference::Named(name.as_str())
        } else {
            Reference::Unterminated
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Expands environment variable references.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentVariablesSubstitution<V = ProcessEnv> {
    source: V,
    config: EnvSubstitutionConfig,
}

impl EnvironmentVariablesSubstitution<ProcessEnv> {
    /// Expand from the process environment with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: EnvSubstitutionConfig) -> Self {
        Self {
            source: ProcessEnv,
            config,
        }
    }
}

impl<V: VariableSource> EnvironmentVariablesSubstitution<V> {
    /// Expand from a custom variable source.
    pub fn with_source(source: V) -> Self {
        Self {
            source,
            config: EnvSubstitutionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EnvSubstitutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_syntax(mut self, syntax: VariableSyntax) -> Self {
        self.config.syntax = syntax;
        self
    }

    pub fn with_undefined(mut self, undefined: UndefinedBehavior) -> Self {
        self.config.undefined = undefined;
        self
    }

    pub fn config(&self) -> &EnvSubstitutionConfig {
        &self.config
    }

    /// Expand every reference in `value`.
    pub fn expand(&self, value: &str) -> Result<String, SubstitutionError> {
        let pattern = self.config.syntax.pattern();
        let mut output = String::with_capacity(value.len());
        let mut last = 0;

        for caps in pattern.captures_iter(value) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            output.push_str(&value[last..whole.start()]);
            last = whole.end();

            match Reference::from_captures(&caps) {
                Reference::Escape => output.push('$'),
                Reference::Named(name) => match self.source.lookup(name) {
                    Some(resolved) => output.push_str(&resolved),
                    None => match self.config.undefined {
                        UndefinedBehavior::Keep => output.push_str(whole.as_str()),
                        UndefinedBehavior::Empty => {}
                        UndefinedBehavior::Error => {
                            return Err(SubstitutionError::UndefinedVariable {
                                name: name.to_string(),
                            });
                        }
                    },
                },
                Reference::InvalidName => {
                    if self.config.undefined == UndefinedBehavior::Error {
                        return Err(SubstitutionError::malformed(
                            whole.as_str(),
                            "invalid variable name",
                        ));
                    }
                    output.push_str(whole.as_str());
                }
                Reference::Unterminated => {
                    if self.config.undefined == UndefinedBehavior::Error {
                        return Err(SubstitutionError::malformed(
                            whole.as_str(),
                            "missing closing brace",
                        ));
                    }
                    debug!("Leaving unterminated variable reference as-is");
                    output.push_str(whole.as_str());
                }
            }
        }

        output.push_str(&value[last..]);
        Ok(output)
    }
}

impl<V: VariableSource> Substitution for EnvironmentVariablesSubstitution<V> {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        self.expand(value)
    }
}
