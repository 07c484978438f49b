use std::collections::HashMap;
use std::fmt::Write as _;

use log::debug;

use super::config::ViewConfig;
use super::error::{ViewError, ViewResult};
use super::layout::LayoutGraph;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const EDGE_WIDTH: f64 = 1.5;

/// Affine pan/zoom applied to the viewport group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	/// Transform that shows graph point `(gx, gy)` at the middle of a `width`×`height` viewport.
	pub fn centered_on(gx: f64, gy: f64, width: f64, height: f64, k: f64) -> Self {
		Self {
			x: width / 2.0 - k * gx,
			y: height / 2.0 - k * gy,
			k,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn to_attribute(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}
}

/// Intrinsic size of the element the surface is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceTarget {
	pub width: f64,
	pub height: f64,
}

impl SurfaceTarget {
	/// Uses the container's client size, falling back when it reports nothing.
	pub fn from_container(client_width: f64, client_height: f64, fallback: (f64, f64)) -> Self {
		let pick = |v: f64, f: f64| if v.is_finite() && v > 0.0 { v } else { f };
		Self {
			width: pick(client_width, fallback.0),
			height: pick(client_height, fallback.1),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeStyle {
	#[default]
	Default,
	Selected,
}

/// Concrete marker attributes for a [`NodeStyle`].
#[derive(Clone, Debug, PartialEq)]
pub struct StyleAttrs {
	/// Class of the node's `<g>` wrapper.
	pub class: &'static str,
	pub fill: &'static str,
	pub stroke: &'static str,
	pub stroke_width: f64,
	pub radius: f64,
}

impl StyleAttrs {
	/// Horizontal position of the label next to a node centered at `node_x`.
	pub fn label_x(&self, node_x: f64) -> f64 {
		node_x + self.radius + 4.0
	}
}

impl NodeStyle {
	pub fn attrs(self, config: &ViewConfig) -> StyleAttrs {
		match self {
			Self::Default => StyleAttrs {
				class: "node",
				fill: "#ffffff",
				stroke: "#37474f",
				stroke_width: config.node_stroke_width,
				radius: config.node_radius,
			},
			Self::Selected => StyleAttrs {
				class: "node selected",
				fill: "#ffd54f",
				stroke: "#d62728",
				stroke_width: config.node_stroke_width * 2.0,
				radius: config.node_radius * 1.4,
			},
		}
	}
}

/// The drawn SVG document: one viewport group holding every edge and node.
#[derive(Clone, Debug)]
pub struct RenderedSurface {
	pub width: f64,
	pub height: f64,
	layout: LayoutGraph,
	transform: ViewTransform,
	styles: HashMap<String, NodeStyle>,
	config: ViewConfig,
}

/// Builds a fresh surface for `layout`. Nothing from a previous surface is reused.
pub fn render(
	target: SurfaceTarget,
	layout: LayoutGraph,
	transform: ViewTransform,
	config: &ViewConfig,
) -> ViewResult<RenderedSurface> {
	if !(target.width.is_finite() && target.height.is_finite())
		|| target.width <= 0.0
		|| target.height <= 0.0
	{
		return Err(ViewError::LayoutFailure(format!(
			"surface target {}x{} has no drawable area",
			target.width, target.height
		)));
	}
	if !(transform.x.is_finite() && transform.y.is_finite() && transform.k.is_finite()) {
		return Err(ViewError::LayoutFailure("non-finite viewport transform".into()));
	}
	debug!(
		"render: {}x{} surface, {} nodes",
		target.width,
		target.height,
		layout.nodes.len()
	);
	Ok(RenderedSurface {
		width: target.width,
		height: target.height,
		layout,
		transform,
		styles: HashMap::new(),
		config: config.clone(),
	})
}

impl RenderedSurface {
	pub fn layout(&self) -> &LayoutGraph {
		&self.layout
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn set_transform(&mut self, transform: ViewTransform) {
		self.transform = transform;
	}

	pub fn node_style(&self, id: &str) -> NodeStyle {
		self.styles.get(id).copied().unwrap_or_default()
	}

	/// Restyles a node and returns its DOM id, or `None` if the node is not drawn.
	pub fn set_node_style(&mut self, id: &str, style: NodeStyle) -> Option<String> {
		let dom_id = self.node_dom_id(id)?;
		match style {
			NodeStyle::Default => self.styles.remove(id),
			other => self.styles.insert(id.to_string(), other),
		};
		Some(dom_id)
	}

	pub fn node_dom_id(&self, id: &str) -> Option<String> {
		self.layout
			.nodes
			.iter()
			.position(|n| n.id == id)
			.map(|i| format!("node-{i}"))
	}

	pub fn config(&self) -> &ViewConfig {
		&self.config
	}

	/// Serializes the surface, including the current transform and node styles.
	pub fn markup(&self) -> String {
		let mut out = String::new();
		let _ = write!(
			out,
			r#"<svg xmlns="{SVG_NS}" class="graph-surface" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
			w = self.width,
			h = self.height,
		);

		// One arrowhead marker per distinct edge color.
		let mut markers: Vec<&str> = Vec::new();
		for edge in &self.layout.edges {
			if !markers.contains(&edge.color.as_str()) {
				markers.push(&edge.color);
			}
		}
		out.push_str("<defs>");
		for (i, color) in markers.iter().enumerate() {
			let _ = write!(
				out,
				r#"<marker id="arrow-{i}" viewBox="0 -5 10 10" refX="10" refY="0" markerWidth="6" markerHeight="6" orient="auto"><path d="M0,-5L10,0L0,5" fill="{}"/></marker>"#,
				escape(color)
			);
		}
		out.push_str("</defs>");

		let _ = write!(
			out,
			r#"<g class="viewport" transform="{}">"#,
			self.transform.to_attribute()
		);

		out.push_str(r#"<g class="edges">"#);
		for edge in &self.layout.edges {
			let marker = markers.iter().position(|c| *c == edge.color).unwrap_or(0);
			let color = escape(&edge.color);
			let _ = write!(
				out,
				r#"<g class="edge"><path d="{}" fill="none" stroke="{color}" stroke-width="{EDGE_WIDTH}" marker-end="url(#arrow-{marker})"/><text class="edge-label" x="{:.2}" y="{:.2}" fill="{color}" text-anchor="middle" font-size="10">{}</text></g>"#,
				edge.path,
				edge.label_pos.0,
				edge.label_pos.1 - 3.0,
				escape(&edge.label),
			);
		}
		out.push_str("</g>");

		out.push_str(r#"<g class="nodes">"#);
		for (i, node) in self.layout.nodes.iter().enumerate() {
			let attrs = self.node_style(&node.id).attrs(&self.config);
			let _ = write!(
				out,
				r#"<g class="{}" data-id="{}"><circle id="node-{i}" cx="{:.2}" cy="{:.2}" r="{}" fill="{}" stroke="{}" stroke-width="{}"/><text x="{:.2}" y="{:.2}" font-size="11">{}</text></g>"#,
				attrs.class,
				escape(&node.id),
				node.x,
				node.y,
				attrs.radius,
				attrs.fill,
				attrs.stroke,
				attrs.stroke_width,
				attrs.label_x(node.x),
				node.y + 4.0,
				escape(&node.label),
			);
		}
		out.push_str("</g></g></svg>");
		out
	}
}

fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::layout::layout;
	use crate::components::graph_view::model::build;
	use crate::components::graph_view::palette::ColorRegistry;
	use crate::components::graph_view::types::RelationRecord;

	fn surface(rows: &[&[(&str, &str)]]) -> RenderedSurface {
		let config = ViewConfig::default();
		let records: Vec<_> = rows
			.iter()
			.map(|r| RelationRecord::from_pairs(r.iter().copied()))
			.collect();
		let model = build(&records, &config).model;
		let mut colors = ColorRegistry::new(&config.palette);
		let graph = layout(&model, &mut colors, &config).unwrap();
		render(
			SurfaceTarget {
				width: 640.0,
				height: 480.0,
			},
			graph,
			ViewTransform::IDENTITY,
			&config,
		)
		.unwrap()
	}

	#[test]
	fn single_viewport_group_with_matching_viewbox() {
		let s = surface(&[&[("class", "A"), ("type", "next"), ("related_class", "B")]]);
		let markup = s.markup();
		assert_eq!(markup.matches(r#"class="viewport""#).count(), 1);
		assert!(markup.contains(r#"viewBox="0 0 640 480""#));
		assert!(markup.contains(r#"transform="translate(0,0) scale(1)""#));
		assert_eq!(markup.matches("<circle").count(), 2);
		assert_eq!(markup.matches("<marker").count(), 1);
	}

	#[test]
	fn markup_is_deterministic() {
		let rows: &[&[(&str, &str)]] = &[&[("class", "A"), ("type", "t")]];
		assert_eq!(surface(rows).markup(), surface(rows).markup());
	}

	#[test]
	fn labels_are_escaped() {
		let s = surface(&[&[("class", "<A&B>"), ("type", "\"q\"")]]);
		let markup = s.markup();
		assert!(markup.contains("&lt;A&amp;B&gt;"));
		assert!(markup.contains("&quot;q&quot;"));
		assert!(!markup.contains("<A&B>"));
	}

	#[test]
	fn restyle_round_trip() {
		let mut s = surface(&[&[("class", "A"), ("type", "t")]]);
		assert_eq!(s.set_node_style("A", NodeStyle::Selected).as_deref(), Some("node-0"));
		assert!(s.markup().contains(r#"class="node selected""#));
		s.set_node_style("A", NodeStyle::Default);
		assert_eq!(s.node_style("A"), NodeStyle::Default);
		assert!(s.set_node_style("missing", NodeStyle::Selected).is_none());
	}

	#[test]
	fn zero_sized_target_is_rejected() {
		let config = ViewConfig::default();
		let result = render(
			SurfaceTarget {
				width: 0.0,
				height: 10.0,
			},
			LayoutGraph::default(),
			ViewTransform::IDENTITY,
			&config,
		);
		assert!(matches!(result, Err(ViewError::LayoutFailure(_))));
	}

	#[test]
	fn container_fallback() {
		let t = SurfaceTarget::from_container(0.0, 300.0, (800.0, 600.0));
		assert_eq!((t.width, t.height), (800.0, 300.0));
	}

	#[test]
	fn centering_maps_point_to_middle() {
		let t = ViewTransform::centered_on(100.0, 50.0, 800.0, 600.0, 2.0);
		assert_eq!(t.screen_to_graph(400.0, 300.0), (100.0, 50.0));
	}
}
