//! Binding a settings type to a configuration section.
//!
//! [`OptionsBuilder::build`] runs the whole pipeline for one instance:
//!
//! 1. serialize `T::default()` as the starting value
//! 2. merge the bound section over it (case-insensitive keys, string
//!    overrides converted to the default's scalar type)
//! 3. deserialize into `T`, retrying once with string overrides over unset
//!    `Option` fields read as booleans or numbers
//! 4. substitute every writable string once
//! 5. run the post-configure steps in registration order

use super::merge::{deep_merge_binding, deep_merge_binding_inferred};
use super::source::ConfigSource;
use crate::error::{BoxError, OptionsError};
use crate::graph::{Configurator, ConfiguratorOptions, Node};
use crate::section::{Section, section_name};
use crate::substitution::{EnvironmentVariablesSubstitution, Substitution, VariableSyntax};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

type PostConfigure<'a, T> = Box<dyn FnOnce(&mut T) -> Result<(), BoxError> + 'a>;

/// Builds one settings instance from a [`ConfigSource`].
///
/// Without [`bind`](Self::bind) or [`auto_bind`](Self::auto_bind) the
/// result holds only the defaults. Without a substitution strings are left
/// as bound.
pub struct OptionsBuilder<'a, T> {
    source: &'a ConfigSource,
    section: Option<String>,
    required: bool,
    substitution: Option<Box<dyn Substitution + 'a>>,
    options: ConfiguratorOptions,
    post_configure: Vec<PostConfigure<'a, T>>,
}

impl<'a, T> OptionsBuilder<'a, T> {
    pub fn new(source: &'a ConfigSource) -> Self {
        Self {
            source,
            section: None,
            required: false,
            substitution: None,
            options: ConfiguratorOptions::default(),
            post_configure: Vec::new(),
        }
    }

    /// Bind to the section at a `:`-separated path. An empty path binds the
    /// whole configuration.
    pub fn bind(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Bind to the section named by `T`'s [`Section`] implementation.
    pub fn auto_bind(self) -> Self
    where
        T: Section,
    {
        self.bind(section_name::<T>())
    }

    /// Fail with [`OptionsError::SectionNotFound`] when the bound section is
    /// missing instead of falling back to the defaults.
    pub fn require_section(mut self) -> Self {
        self.required = true;
        self
    }

    /// Expand environment variable references in every writable string,
    /// accepting both `$NAME`/`${NAME}` and `%NAME%`.
    ///
    /// Has no effect when a substitution is already set.
    pub fn substitute_variables(self) -> Self {
        if self.substitution.is_some() {
            return self;
        }
        let substitution = EnvironmentVariablesSubstitution::new().with_syntax(VariableSyntax::Both);
        self.substitute_with(substitution)
    }

    /// Use `substitution` for every writable string, replacing any set before.
    pub fn substitute_with(mut self, substitution: impl Substitution + 'a) -> Self {
        self.substitution = Some(Box::new(substitution));
        self
    }

    pub fn configurator_options(mut self, options: ConfiguratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `step` on the instance after substitution.
    pub fn post_configure(
        mut self,
        step: impl FnOnce(&mut T) -> Result<(), BoxError> + 'a,
    ) -> Self {
        self.post_configure.push(Box::new(step));
        self
    }

    pub fn build(self) -> Result<T, OptionsError>
    where
        T: Default + Serialize + DeserializeOwned + Node,
    {
        let label = self.section.clone().unwrap_or_default();
        let bind_error = |source| OptionsError::Bind {
            section: label.clone(),
            source,
        };

        let defaults = serde_json::to_value(T::default()).map_err(bind_error)?;
        let section = match self.section.as_deref() {
            None => None,
            Some(path) => match self.source.section(path) {
                Some(section) => Some(section),
                None if self.required => {
                    return Err(OptionsError::SectionNotFound {
                        section: path.to_string(),
                    });
                }
                None => {
                    debug!(section = path, "Section not found, using defaults");
                    None
                }
            },
        };
        let mut settings: T = match section {
            None => serde_json::from_value(defaults).map_err(bind_error)?,
            Some(section) => {
                let typed = deep_merge_binding(defaults.clone(), section.clone());
                match serde_json::from_value(typed) {
                    Ok(settings) => settings,
                    // Unset `Option` defaults leave string overrides as text.
                    Err(err) => {
                        let inferred = deep_merge_binding_inferred(defaults, section);
                        serde_json::from_value(inferred).map_err(|_| bind_error(err))?
                    }
                }
            }
        };

        if let Some(substitution) = &self.substitution {
            Configurator::new(substitution.as_ref())
                .with_options(self.options)
                .configure(&mut settings)?;
        }

        for step in self.post_configure {
            step(&mut settings).map_err(|source| OptionsError::PostConfigure {
                section: label.clone(),
                source,
            })?;
        }

        debug!(section = %label, "Built settings");
        Ok(settings)
    }
}

impl ConfigSource {
    /// Start building a settings instance of type `T` from this source.
    pub fn options<T>(&self) -> OptionsBuilder<'_, T> {
        OptionsBuilder::new(self)
    }
}
