use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Ordered attribute bag copied from source records.
pub type Attributes = IndexMap<String, AttrValue>;

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
	/// Text value.
	String(String),
	/// Numeric value.
	Number(f64),
	/// Boolean flag.
	Bool(bool),
	/// Nested mapping; JSON arrays land here keyed by index.
	Map(Attributes),
}

impl AttrValue {
	/// Converts a JSON value, dropping `null`.
	pub fn from_json(value: Value) -> Option<Self> {
		match value {
			Value::Null => None,
			Value::Bool(b) => Some(Self::Bool(b)),
			Value::Number(n) => n.as_f64().map(Self::Number),
			Value::String(s) => Some(Self::String(s)),
			Value::Array(items) => Some(Self::Map(
				items
					.into_iter()
					.enumerate()
					.filter_map(|(i, v)| Self::from_json(v).map(|v| (i.to_string(), v)))
					.collect(),
			)),
			Value::Object(map) => Some(Self::Map(attributes_from_json(map))),
		}
	}

	/// Scalar text usable as an identifier. Maps and booleans are not identifiers.
	pub fn as_identifier(&self) -> Option<String> {
		match self {
			Self::String(s) if !s.trim().is_empty() => Some(s.clone()),
			Self::Number(n) if n.is_finite() => Some(format_number(*n)),
			_ => None,
		}
	}

	/// Case-insensitive substring test against this value and any nested values.
	/// `needle` must already be lowercased.
	pub fn contains_lowercase(&self, needle: &str) -> bool {
		match self {
			Self::Map(map) => map.values().any(|v| v.contains_lowercase(needle)),
			other => other.to_string().to_lowercase().contains(needle),
		}
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::String(s) => f.write_str(s),
			Self::Number(n) => f.write_str(&format_number(*n)),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Map(map) => {
				f.write_str("{")?;
				for (i, (k, v)) in map.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{k}: {v}")?;
				}
				f.write_str("}")
			}
		}
	}
}

fn format_number(n: f64) -> String {
	if n.fract() == 0.0 && n.abs() < 1e15 {
		format!("{}", n as i64)
	} else {
		n.to_string()
	}
}

fn attributes_from_json(map: Map<String, Value>) -> Attributes {
	map.into_iter()
		.filter_map(|(k, v)| AttrValue::from_json(v).map(|v| (k, v)))
		.collect()
}

/// One flat row delivered by the backend.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RelationRecord {
	pub fields: Attributes,
}

impl From<Map<String, Value>> for RelationRecord {
	fn from(map: Map<String, Value>) -> Self {
		Self {
			fields: attributes_from_json(map),
		}
	}
}

impl RelationRecord {
	/// Builds a record from string pairs; handy for tests and fixtures.
	pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
		Self {
			fields: pairs
				.into_iter()
				.map(|(k, v)| (k.to_string(), AttrValue::String(v.to_string())))
				.collect(),
		}
	}

	pub fn get(&self, key: &str) -> Option<&AttrValue> {
		self.fields.get(key)
	}
}

/// A deduplicated graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub label: String,
	pub attributes: Attributes,
}

impl Node {
	pub fn matches(&self, needle: &str) -> bool {
		self.id.to_lowercase().contains(needle)
			|| self.label.to_lowercase().contains(needle)
			|| self.attributes.values().any(|v| v.contains_lowercase(needle))
	}

	/// Flattened key/value list for the property inspector.
	pub fn properties(&self) -> Vec<(String, String)> {
		let mut props = vec![("id".to_string(), self.id.clone())];
		if self.label != self.id {
			props.push(("label".to_string(), self.label.clone()));
		}
		props.extend(self.attributes.iter().map(|(k, v)| (k.clone(), v.to_string())));
		props
	}
}

/// A directed labeled edge. Never deduplicated.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: String,
	pub target: String,
	pub label: String,
	pub category: String,
	pub attributes: Attributes,
}

impl Edge {
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}

	pub fn matches(&self, needle: &str) -> bool {
		[&self.label, &self.source, &self.target, &self.category]
			.iter()
			.any(|s| s.to_lowercase().contains(needle))
			|| self.attributes.values().any(|v| v.contains_lowercase(needle))
	}
}

/// Logical node/edge model produced by the builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	pub nodes: IndexMap<String, Node>,
	pub edges: Vec<Edge>,
}

impl GraphModel {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}
}
