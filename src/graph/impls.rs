//! [`Node`] implementations for standard library types.

use super::{ElementShape, MapNode, Node, NodeMut, SequenceNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::BuildHasher;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

impl Node for String {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Text(self)
    }

    fn element_shape() -> ElementShape {
        ElementShape::Text
    }
}

impl<T: Node> Node for Option<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        match self {
            Some(value) => value.as_node_mut(),
            None => NodeMut::Null,
        }
    }

    fn element_shape() -> ElementShape {
        T::element_shape()
    }
}

impl<T: Node> Node for Box<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        (**self).as_node_mut()
    }

    fn element_shape() -> ElementShape {
        T::element_shape()
    }
}

impl<T: Node + ?Sized> Node for &mut T {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        (**self).as_node_mut()
    }
}

macro_rules! opaque_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Node for $ty {
                fn as_node_mut(&mut self) -> NodeMut<'_> {
                    NodeMut::Opaque
                }

                fn element_shape() -> ElementShape {
                    ElementShape::Value
                }
            }
        )*
    };
}

opaque_node!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    std::path::PathBuf,
    std::time::Duration,
    std::net::IpAddr,
    std::net::SocketAddr,
);

// Shared pointers only hand out shared references, so nothing behind them
// can be written.
impl<T: ?Sized> Node for Arc<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::ReadOnly
    }
}

impl<T: ?Sized> Node for Rc<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::ReadOnly
    }
}

impl Node for &'static str {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::ReadOnly
    }

    fn element_shape() -> ElementShape {
        ElementShape::Value
    }
}

/// Marks a settings value as read-only.
///
/// The wrapped value is readable through `Deref` but never visited, whatever
/// its shape. Serializes as the inner value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadOnly<T>(T);

impl<T> ReadOnly<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ReadOnly<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for ReadOnly<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Node for ReadOnly<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::ReadOnly
    }
}

impl<T: Node> SequenceNode for Vec<T> {
    fn element_shape(&self) -> ElementShape {
        T::element_shape()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Node> {
        self.get_mut(index).map(|element| element as &mut dyn Node)
    }
}

impl<T: Node> Node for Vec<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Sequence(self)
    }
}

impl<T: Node> SequenceNode for VecDeque<T> {
    fn element_shape(&self) -> ElementShape {
        T::element_shape()
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Node> {
        self.get_mut(index).map(|element| element as &mut dyn Node)
    }
}

impl<T: Node> Node for VecDeque<T> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Sequence(self)
    }
}

impl<T: Node, const N: usize> SequenceNode for [T; N] {
    fn element_shape(&self) -> ElementShape {
        T::element_shape()
    }

    fn len(&self) -> usize {
        N
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Node> {
        self.as_mut_slice()
            .get_mut(index)
            .map(|element| element as &mut dyn Node)
    }
}

impl<T: Node, const N: usize> Node for [T; N] {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Sequence(self)
    }
}

impl<K: Debug, V: Node, S: BuildHasher> MapNode for HashMap<K, V, S> {
    fn value_shape(&self) -> ElementShape {
        V::element_shape()
    }

    fn entries_mut(&mut self) -> Vec<(String, &mut dyn Node)> {
        self.iter_mut()
            .map(|(key, value)| (format!("{:?}", key), value as &mut dyn Node))
            .collect()
    }
}

impl<K: Debug, V: Node, S: BuildHasher> Node for HashMap<K, V, S> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Map(self)
    }
}

impl<K: Debug, V: Node> MapNode for BTreeMap<K, V> {
    fn value_shape(&self) -> ElementShape {
        V::element_shape()
    }

    fn entries_mut(&mut self) -> Vec<(String, &mut dyn Node)> {
        self.iter_mut()
            .map(|(key, value)| (format!("{:?}", key), value as &mut dyn Node))
            .collect()
    }
}

impl<K: Debug, V: Node> Node for BTreeMap<K, V> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Map(self)
    }
}
