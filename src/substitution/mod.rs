//! Pluggable string substitutions.
//!
//! A [`Substitution`] rewrites one string at a time. The graph walk only calls
//! it for strings that are present, never for `None`.

mod env;

pub use env::{
    EnvSubstitutionConfig, EnvironmentVariablesSubstitution, ProcessEnv, UndefinedBehavior,
    VariableSource, VariableSyntax,
};

use crate::error::SubstitutionError;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Leaf-level string transform applied to every writable string location.
pub trait Substitution {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError>;
}

impl<S: Substitution + ?Sized> Substitution for &S {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        (**self).substitute(value)
    }
}

impl<S: Substitution + ?Sized> Substitution for Box<S> {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        (**self).substitute(value)
    }
}

impl<S: Substitution + ?Sized> Substitution for Arc<S> {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        (**self).substitute(value)
    }
}

impl<S: Substitution + ?Sized> Substitution for Rc<S> {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        (**self).substitute(value)
    }
}

/// Substitution backed by a closure. Built with [`from_fn`] or [`try_from_fn`].
#[derive(Clone)]
pub struct FnSubstitution<F>(F);

impl<F> fmt::Debug for FnSubstitution<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSubstitution")
    }
}

impl<F> Substitution for FnSubstitution<F>
where
    F: Fn(&str) -> Result<String, SubstitutionError>,
{
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        (self.0)(value)
    }
}

/// Wrap a fallible closure.
pub fn try_from_fn<F>(f: F) -> FnSubstitution<F>
where
    F: Fn(&str) -> Result<String, SubstitutionError>,
{
    FnSubstitution(f)
}

/// Wrap an infallible closure.
pub fn from_fn<F>(f: F) -> FnSubstitution<impl Fn(&str) -> Result<String, SubstitutionError>>
where
    F: Fn(&str) -> String,
{
    FnSubstitution(move |value: &str| -> Result<String, SubstitutionError> { Ok(f(value)) })
}

/// Returns every string unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Substitution for Identity {
    fn substitute(&self, value: &str) -> Result<String, SubstitutionError> {
        Ok(value.to_string())
    }
}
