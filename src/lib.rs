//! Settings Substitution Library
//!
//! Walks bound settings objects and rewrites their string values in place
//! with a pluggable [`Substitution`], such as environment variable expansion.
//!
//! ```
//! use settings_substitution::{configure_record, Configurator, EnvironmentVariablesSubstitution};
//! use std::collections::HashMap;
//!
//! #[derive(Default)]
//! struct Database {
//!     url: String,
//!     replicas: Vec<String>,
//! }
//!
//! configure_record!(Database { url, replicas });
//!
//! let vars = HashMap::from([("DB_HOST".to_string(), "db.internal".to_string())]);
//! let configurator = Configurator::new(EnvironmentVariablesSubstitution::with_source(vars));
//!
//! let mut db = Database {
//!     url: "pg://${DB_HOST}/app".to_string(),
//!     replicas: vec!["pg://$DB_HOST:5433/app".to_string()],
//! };
//! configurator.configure(&mut db).unwrap();
//! assert_eq!(db.url, "pg://db.internal/app");
//! assert_eq!(db.replicas[0], "pg://db.internal:5433/app");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod section;
pub mod substitution;

pub use config::{ConfigSource, OptionsBuilder};
pub use error::{BoxError, ConfigureError, OptionsError, SubstitutionError};
pub use graph::{Access, Configurator, ConfiguratorOptions, Node, NodeMut, ReadOnly};
pub use section::{Section, section_name};
pub use substitution::{
    EnvironmentVariablesSubstitution, Identity, Substitution, from_fn, try_from_fn,
};
