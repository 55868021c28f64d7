//! [`Node`] implementations for dynamically typed `serde_json` and `serde_yaml` values.
//!
//! These are the only nodes classified at runtime. The checks run in the
//! same order as the walk dispatches: map, sequence, string, null, scalar.

use super::{ElementShape, MapNode, Node, NodeMut};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

impl Node for JsonValue {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        match self {
            JsonValue::Object(map) => NodeMut::Map(map),
            JsonValue::Array(items) => NodeMut::Sequence(items),
            JsonValue::String(text) => NodeMut::Text(text),
            JsonValue::Null => NodeMut::Null,
            JsonValue::Bool(_) | JsonValue::Number(_) => NodeMut::Opaque,
        }
    }

    fn element_shape() -> ElementShape {
        ElementShape::Dynamic
    }
}

impl MapNode for serde_json::Map<String, JsonValue> {
    fn value_shape(&self) -> ElementShape {
        ElementShape::Dynamic
    }

    fn entries_mut(&mut self) -> Vec<(String, &mut dyn Node)> {
        self.iter_mut()
            .map(|(key, value)| (format!("{:?}", key), value as &mut dyn Node))
            .collect()
    }
}

impl Node for serde_json::Map<String, JsonValue> {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Map(self)
    }
}

impl Node for YamlValue {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        match self {
            YamlValue::Mapping(map) => NodeMut::Map(map),
            YamlValue::Sequence(items) => NodeMut::Sequence(items),
            YamlValue::String(text) => NodeMut::Text(text),
            YamlValue::Tagged(tagged) => tagged.value.as_node_mut(),
            YamlValue::Null => NodeMut::Null,
            YamlValue::Bool(_) | YamlValue::Number(_) => NodeMut::Opaque,
        }
    }

    fn element_shape() -> ElementShape {
        ElementShape::Dynamic
    }
}

/// Render a YAML mapping key for error paths.
fn yaml_key(key: &YamlValue) -> String {
    match key {
        YamlValue::String(text) => format!("{:?}", text),
        YamlValue::Number(number) => number.to_string(),
        YamlValue::Bool(flag) => flag.to_string(),
        other => format!("{:?}", other),
    }
}

impl MapNode for serde_yaml::Mapping {
    fn value_shape(&self) -> ElementShape {
        ElementShape::Dynamic
    }

    fn entries_mut(&mut self) -> Vec<(String, &mut dyn Node)> {
        self.iter_mut()
            .map(|(key, value)| (yaml_key(key), value as &mut dyn Node))
            .collect()
    }
}

impl Node for serde_yaml::Mapping {
    fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::Map(self)
    }
}
