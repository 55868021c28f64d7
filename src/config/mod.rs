//! Layered configuration and settings binding.
//!
//! A [`ConfigSource`] holds configuration layers (inline values, YAML text or
//! files, prefixed environment variables) merged field-by-field, later layers
//! winning. An [`OptionsBuilder`] binds one section of it to a settings type
//! and runs string substitution over the result.
//!
//! ## Merge Strategy
//! - Objects merge recursively, keys matched ignoring ASCII case
//! - Arrays and scalars are replaced entirely
//! - `null` in a higher layer keeps the lower value

mod merge;
mod options;
mod source;

pub use merge::{
    deep_merge, deep_merge_all, deep_merge_all_ignore_case, deep_merge_binding,
    deep_merge_ignore_case,
};
pub use options::OptionsBuilder;
pub use source::{ConfigSource, ENV_KEY_SEPARATOR, LayerOrigin, SECTION_SEPARATOR};
