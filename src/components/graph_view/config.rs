use serde::Deserialize;

use super::error::{ViewError, ViewResult};
use super::layout::RankDir;

pub const DEFAULT_PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Which record fields play which role.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordSchema {
	pub primary_field: String,
	pub relation_field: String,
	pub related_field: String,
	/// Fields tried, in order, for a node's display label.
	pub label_fields: Vec<String>,
}

impl Default for RecordSchema {
	fn default() -> Self {
		Self {
			primary_field: "class".into(),
			relation_field: "type".into(),
			related_field: "related_class".into(),
			label_fields: vec!["name".into(), "label".into()],
		}
	}
}

impl RecordSchema {
	pub fn is_role_field(&self, key: &str) -> bool {
		key == self.primary_field || key == self.relation_field || key == self.related_field
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
	pub schema: RecordSchema,
	/// Edge label template; `{type}` expands to the relation type.
	pub label_template: String,
	pub palette: Vec<String>,
	pub rank_dir: RankDir,
	pub node_radius: f64,
	pub node_stroke_width: f64,
	pub rank_spacing: f64,
	pub node_spacing: f64,
	pub component_spacing: f64,
	pub margin: f64,
	/// Zoom factor used when centering on a selected node.
	pub focus_scale: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub search_debounce_ms: u32,
	/// Surface size used when the host container reports none.
	pub default_size: (f64, f64),
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			schema: RecordSchema::default(),
			label_template: "{type}".into(),
			palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
			rank_dir: RankDir::LeftToRight,
			node_radius: 12.0,
			node_stroke_width: 1.5,
			rank_spacing: 120.0,
			node_spacing: 48.0,
			component_spacing: 72.0,
			margin: 40.0,
			focus_scale: 2.0,
			min_zoom: 0.1,
			max_zoom: 10.0,
			search_debounce_ms: 250,
			default_size: (800.0, 600.0),
		}
	}
}

impl ViewConfig {
	/// Parses a partial JSON override on top of the defaults.
	pub fn from_json(json: &str) -> ViewResult<Self> {
		let config: Self =
			serde_json::from_str(json).map_err(|e| ViewError::InvalidConfig(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> ViewResult<()> {
		if self.palette.is_empty() {
			return Err(ViewError::InvalidConfig("palette must not be empty".into()));
		}
		if !(self.node_radius > 0.0) {
			return Err(ViewError::InvalidConfig("node_radius must be positive".into()));
		}
		if !(self.focus_scale > 0.0) {
			return Err(ViewError::InvalidConfig("focus_scale must be positive".into()));
		}
		if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
			return Err(ViewError::InvalidConfig(format!(
				"zoom bounds [{}, {}] are invalid",
				self.min_zoom, self.max_zoom
			)));
		}
		Ok(())
	}

	pub fn edge_label(&self, relation_type: &str) -> String {
		self.label_template.replace("{type}", relation_type)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn overrides_merge_with_defaults() {
		let config = ViewConfig::from_json(
			r#"{"focus_scale": 3.0, "schema": {"primary_field": "activity"}}"#,
		)
		.unwrap();
		assert_eq!(config.focus_scale, 3.0);
		assert_eq!(config.schema.primary_field, "activity");
		assert_eq!(config.schema.related_field, "related_class");
		assert_eq!(config.palette.len(), DEFAULT_PALETTE.len());
	}

	#[test]
	fn rejects_empty_palette_and_inverted_zoom() {
		assert!(matches!(
			ViewConfig::from_json(r#"{"palette": []}"#),
			Err(ViewError::InvalidConfig(_))
		));
		assert!(matches!(
			ViewConfig::from_json(r#"{"min_zoom": 5.0, "max_zoom": 1.0}"#),
			Err(ViewError::InvalidConfig(_))
		));
	}

	#[test]
	fn label_template_expands_type() {
		let config = ViewConfig {
			label_template: "rel:{type}".into(),
			..ViewConfig::default()
		};
		assert_eq!(config.edge_label("next"), "rel:next");
	}
}
