//! Recursive substitution over settings object graphs.
//!
//! Every value reachable from a settings root is classified through
//! [`Node::as_node_mut`] into one of the shapes of [`NodeMut`]. The
//! [`Configurator`] walks that classification depth-first and overwrites each
//! string location it is allowed to write with the output of a
//! [`Substitution`].
//!
//! ## Dispatch
//! - **Map** - values are visited, keys never are
//! - **Sequence** - elements are visited by index
//! - **Record** - declared fields are visited according to their [`Access`]
//! - anything else (null, a bare string, read-only or opaque values) is left alone
//!
//! Record types opt in with the [`configure_record!`](crate::configure_record)
//! macro. Standard collections, `Option`, primitives and the dynamic
//! `serde_json`/`serde_yaml` values are covered here.

mod dynamic;
mod impls;
mod record;

pub use impls::ReadOnly;

use crate::error::{ConfigureError, SubstitutionError};
use crate::section::simple_type_name;
use crate::substitution::Substitution;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Classification of a node, borrowed mutably for one visit.
pub enum NodeMut<'a> {
    /// No value (`None`, JSON/YAML `null`).
    Null,
    /// A string leaf.
    Text(&'a mut String),
    /// A key-value collection.
    Map(&'a mut dyn MapNode),
    /// An ordered, indexable collection.
    Sequence(&'a mut dyn SequenceNode),
    /// A composite settings type with named fields.
    Record(&'a mut dyn RecordNode),
    /// A value behind a read-only contract. Never visited.
    ReadOnly,
    /// Numbers, booleans and any other scalar. Never visited.
    Opaque,
}

/// A value that can appear in a settings graph.
pub trait Node {
    /// Classify this value for the current visit.
    fn as_node_mut(&mut self) -> NodeMut<'_>;

    /// How values of this type are treated as sequence elements or map values.
    fn element_shape() -> ElementShape
    where
        Self: Sized,
    {
        ElementShape::Reference
    }
}

/// Statically known shape of the elements of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    /// Strings: each present element is substituted in place.
    Text,
    /// Composites: each element is visited recursively.
    Reference,
    /// Scalars: the collection is skipped.
    Value,
    /// Classified per element at runtime (JSON/YAML values).
    Dynamic,
}

/// How a record field may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Writable through the public API. Strings are substituted.
    Public,
    /// Writable only by the owning type. Strings are left as they are,
    /// nested composites are still visited.
    Restricted,
    /// Not writable at all. The field is skipped entirely.
    ReadOnly,
}

/// An ordered collection addressable by index.
pub trait SequenceNode {
    fn element_shape(&self) -> ElementShape;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Node>;
}

/// A key-value collection.
pub trait MapNode {
    fn value_shape(&self) -> ElementShape;

    /// Snapshot of every entry: the rendered key and a handle to its value.
    fn entries_mut(&mut self) -> Vec<(String, &mut dyn Node)>;
}

/// A composite settings type with named fields.
///
/// Usually implemented through [`configure_record!`](crate::configure_record).
pub trait RecordNode {
    fn type_name(&self) -> &'static str;

    /// Report every field to the visitor with its access level.
    fn visit_fields(&mut self, visitor: &mut Visitor<'_>) -> Result<(), ConfigureError>;
}

fn default_max_depth() -> usize {
    64
}

/// Tuning for a [`Configurator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguratorOptions {
    /// Maximum number of nested composites before the walk fails.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ConfiguratorOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Walks settings graphs and substitutes their string locations.
///
/// Holds no per-call state, so one configurator can serve any number of
/// graphs, including from several threads when the substitution allows it.
#[derive(Debug, Clone)]
pub struct Configurator<S> {
    substitution: S,
    options: ConfiguratorOptions,
}

impl<S: Substitution> Configurator<S> {
    pub fn new(substitution: S) -> Self {
        Self {
            substitution,
            options: ConfiguratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConfiguratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConfiguratorOptions {
        &self.options
    }

    pub fn substitution(&self) -> &S {
        &self.substitution
    }

    /// Substitute every writable string reachable from `root`, in place.
    ///
    /// A `None` root is a no-op. The first substitution failure aborts the
    /// walk; strings rewritten before it keep their new values.
    pub fn configure<T: Node + ?Sized>(&self, root: &mut T) -> Result<(), ConfigureError> {
        let node = root.as_node_mut();
        let root_name = match &node {
            NodeMut::Record(record) => record.type_name(),
            _ => simple_type_name(std::any::type_name::<T>()),
        };
        let mut visitor = Visitor::new(&self.substitution, self.options.max_depth, root_name);

        debug!(root = root_name, "Substituting settings graph");
        let result = visitor.dispatch(node);
        debug!(
            root = root_name,
            substituted = visitor.substituted,
            ok = result.is_ok(),
            "Finished settings graph"
        );
        result
    }
}

/// One step in the path from the root to the current node.
#[derive(Debug, Clone)]
enum Segment {
    Field(&'static str),
    Index(usize),
    Key(String),
}

/// Per-call traversal state handed to [`RecordNode::visit_fields`].
pub struct Visitor<'a> {
    substitution: &'a dyn Substitution,
    max_depth: usize,
    root: &'static str,
    path: Vec<Segment>,
    depth: usize,
    substituted: usize,
}

impl<'a> Visitor<'a> {
    fn new(substitution: &'a dyn Substitution, max_depth: usize, root: &'static str) -> Self {
        Self {
            substitution,
            max_depth,
            root,
            path: Vec::new(),
            depth: 0,
            substituted: 0,
        }
    }

    /// Visit one record field.
    pub fn field(
        &mut self,
        name: &'static str,
        access: Access,
        value: &mut dyn Node,
    ) -> Result<(), ConfigureError> {
        if access == Access::ReadOnly {
            trace!(path = %self.path(), field = name, "Skipping read-only field");
            return Ok(());
        }

        self.path.push(Segment::Field(name));
        let result = match value.as_node_mut() {
            NodeMut::Text(text) if access == Access::Public => self.substitute(text),
            NodeMut::Text(_) => {
                trace!(path = %self.path(), "Leaving restricted string");
                Ok(())
            }
            node => self.dispatch(node),
        };
        self.path.pop();
        result
    }

    /// Number of strings rewritten so far.
    pub fn substituted(&self) -> usize {
        self.substituted
    }

    fn dispatch(&mut self, node: NodeMut<'_>) -> Result<(), ConfigureError> {
        match node {
            NodeMut::Map(map) => self.descend(|visitor| visitor.visit_map(map)),
            NodeMut::Sequence(sequence) => self.descend(|visitor| visitor.visit_sequence(sequence)),
            NodeMut::Record(record) => self.descend(|visitor| visitor.visit_record(record)),
            NodeMut::ReadOnly => {
                trace!(path = %self.path(), "Skipping read-only value");
                Ok(())
            }
            NodeMut::Null | NodeMut::Text(_) | NodeMut::Opaque => Ok(()),
        }
    }

    fn descend(
        &mut self,
        visit: impl FnOnce(&mut Self) -> Result<(), ConfigureError>,
    ) -> Result<(), ConfigureError> {
        if self.depth >= self.max_depth {
            return Err(ConfigureError::DepthExceeded {
                path: self.path().to_string(),
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = visit(self);
        self.depth -= 1;
        result
    }

    fn visit_record(&mut self, record: &mut dyn RecordNode) -> Result<(), ConfigureError> {
        trace!(path = %self.path(), record = record.type_name(), "Visiting record");
        record.visit_fields(self)
    }

    fn visit_sequence(&mut self, sequence: &mut dyn SequenceNode) -> Result<(), ConfigureError> {
        let shape = sequence.element_shape();
        if shape == ElementShape::Value {
            return Ok(());
        }

        for index in 0..sequence.len() {
            let Some(element) = sequence.element_mut(index) else {
                continue;
            };
            self.path.push(Segment::Index(index));
            let result = self.slot(shape, element);
            self.path.pop();
            result?;
        }
        Ok(())
    }

    fn visit_map(&mut self, map: &mut dyn MapNode) -> Result<(), ConfigureError> {
        let shape = map.value_shape();
        if shape == ElementShape::Value {
            return Ok(());
        }

        for (key, value) in map.entries_mut() {
            self.path.push(Segment::Key(key));
            let result = self.slot(shape, value);
            self.path.pop();
            result?;
        }
        Ok(())
    }

    /// Visit a sequence element or map value.
    fn slot(&mut self, shape: ElementShape, node: &mut dyn Node) -> Result<(), ConfigureError> {
        match (shape, node.as_node_mut()) {
            (ElementShape::Value, _) => Ok(()),
            (ElementShape::Text | ElementShape::Dynamic, NodeMut::Text(text)) => {
                self.substitute(text)
            }
            (ElementShape::Text, _) => Ok(()),
            (_, node) => self.dispatch(node),
        }
    }

    fn substitute(&mut self, text: &mut String) -> Result<(), ConfigureError> {
        let replaced = self
            .substitution
            .substitute(text.as_str())
            .map_err(|source: SubstitutionError| ConfigureError::Substitution {
                path: self.path().to_string(),
                source,
            })?;
        trace!(path = %self.path(), changed = (*text != replaced), "Substituted string");
        *text = replaced;
        self.substituted += 1;
        Ok(())
    }

    fn path(&self) -> PathDisplay<'_> {
        PathDisplay {
            root: self.root,
            segments: &self.path,
        }
    }
}

/// Renders a path such as `Settings.servers["primary"].hosts[0]`.
struct PathDisplay<'a> {
    root: &'a str,
    segments: &'a [Segment],
}

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in self.segments {
            match segment {
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}
