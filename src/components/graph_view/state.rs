use log::{debug, error, info, warn};

use super::config::ViewConfig;
use super::error::{MalformedRecordError, ViewError, ViewResult};
use super::export::{SvgExport, export_surface};
use super::layout::layout;
use super::model::build;
use super::palette::ColorRegistry;
use super::search::{Effect, Phase, SearchContext, SearchEvent, SearchHit, SearchState, Selection};
use super::surface::{self, NodeStyle, RenderedSurface, StyleAttrs, SurfaceTarget, ViewTransform};
use super::types::{GraphModel, RelationRecord};
use super::zoom::{ZoomEvent, ZoomHandle, attach_zoom};

/// Extra hit radius for clicks, in graph units.
const CLICK_SLACK: f64 = 4.0;

/// A DOM mutation the host must apply to keep the drawn surface in sync.
#[derive(Clone, Debug, PartialEq)]
pub enum DomPatch {
	/// New value for the viewport group's `transform` attribute.
	Transform(String),
	/// Restyles one node: its circle, its `<g>` class and its label offset.
	NodeStyle {
		dom_id: String,
		attrs: StyleAttrs,
		label_x: f64,
	},
}

/// Summary of a dataset load.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadReport {
	pub nodes: usize,
	pub edges: usize,
	pub rejected: Vec<MalformedRecordError>,
	/// The records describe the graph already shown; transform and selection were kept.
	pub unchanged: bool,
}

/// All state owned by one mounted graph view.
pub struct GraphViewState {
	config: ViewConfig,
	model: Option<GraphModel>,
	/// A freshly loaded dataset waiting for its first successful render.
	pending: Option<GraphModel>,
	colors: ColorRegistry,
	surface: Option<RenderedSurface>,
	zoom: Option<ZoomHandle>,
	search: SearchState,
	transform: ViewTransform,
	ready: bool,
}

impl Default for GraphViewState {
	fn default() -> Self {
		Self::with_config(ViewConfig::default())
	}
}

impl GraphViewState {
	/// Creates an empty view. Fails with `InvalidConfig` when `config` does not validate.
	pub fn new(config: ViewConfig) -> ViewResult<Self> {
		config.validate()?;
		Ok(Self::with_config(config))
	}

	fn with_config(config: ViewConfig) -> Self {
		Self {
			colors: ColorRegistry::new(&config.palette),
			config,
			model: None,
			pending: None,
			surface: None,
			zoom: None,
			search: SearchState::default(),
			transform: ViewTransform::IDENTITY,
			ready: false,
		}
	}

	/// Builds the model for `records`. An empty result leaves the current view untouched.
	///
	/// A new dataset is staged; the shown graph, search and transform switch over only
	/// once `render` succeeds.
	pub fn load(&mut self, records: &[RelationRecord]) -> ViewResult<LoadReport> {
		let out = build(records, &self.config);
		if !out.rejected.is_empty() {
			warn!("{} of {} records rejected", out.rejected.len(), records.len());
		}
		if out.model.is_empty() {
			return Err(ViewError::EmptyGraph);
		}

		let unchanged = self.model.as_ref() == Some(&out.model);
		let report = LoadReport {
			nodes: out.model.nodes.len(),
			edges: out.model.edges.len(),
			rejected: out.rejected,
			unchanged,
		};
		self.pending = if unchanged { None } else { Some(out.model) };
		info!(
			"loaded graph: {} nodes, {} edges{}",
			report.nodes,
			report.edges,
			if unchanged { " (unchanged)" } else { "" }
		);
		Ok(report)
	}

	/// Lays out and draws the loaded model from scratch, then attaches zoom.
	///
	/// On failure nothing changes: the previous graph, colors, search and transform stay.
	pub fn render(&mut self, target: SurfaceTarget) -> ViewResult<String> {
		let fresh = self.pending.is_some();
		let model = self
			.pending
			.as_ref()
			.or(self.model.as_ref())
			.ok_or(ViewError::EmptyGraph)?;
		let (mut colors, transform) = if fresh {
			(ColorRegistry::new(&self.config.palette), ViewTransform::IDENTITY)
		} else {
			(self.colors.clone(), self.transform)
		};
		let result = layout(model, &mut colors, &self.config)
			.and_then(|graph| surface::render(target, graph, transform, &self.config));
		let mut surface = match result {
			Ok(surface) => surface,
			Err(err) => {
				error!("render aborted: {err}");
				return Err(err);
			}
		};
		if fresh {
			// New dataset: nothing from the previous session carries over.
			self.model = self.pending.take();
			self.search = SearchState::default();
			self.transform = transform;
		} else if let Some(selection) = &self.search.selection {
			surface.set_node_style(&selection.node, NodeStyle::Selected);
		}
		let zoom = attach_zoom(&surface, &self.config);
		let markup = surface.markup();

		self.colors = colors;
		self.surface = Some(surface);
		self.zoom = Some(zoom);
		self.ready = true;
		debug!("surface ready, transform {}", self.transform.to_attribute());
		Ok(markup)
	}

	/// Snaps the viewport back to identity without touching the selection.
	pub fn reset_view(&mut self) -> Vec<DomPatch> {
		self.apply(vec![Effect::SetTransform(ViewTransform::IDENTITY)])
	}

	pub fn zoom_event(&mut self, event: ZoomEvent) -> Vec<DomPatch> {
		if !self.ready {
			return Vec::new();
		}
		let Some(transform) = self.zoom.as_mut().and_then(|z| z.handle(event)) else {
			return Vec::new();
		};
		self.transform = transform;
		if let Some(surface) = self.surface.as_mut() {
			surface.set_transform(transform);
		}
		vec![DomPatch::Transform(transform.to_attribute())]
	}

	/// Selects the node under a click in surface coordinates, unless the press was a pan.
	pub fn click(&mut self, x: f64, y: f64) -> ViewResult<Vec<DomPatch>> {
		let surface = self.surface.as_ref().filter(|_| self.ready).ok_or(ViewError::NoSurface)?;
		if self.zoom.as_ref().is_some_and(ZoomHandle::last_was_drag) {
			return Ok(Vec::new());
		}
		let (gx, gy) = self.transform.screen_to_graph(x, y);
		let Some(id) = surface
			.layout()
			.node_at(gx, gy, CLICK_SLACK)
			.map(|n| n.id.clone())
		else {
			return Ok(Vec::new());
		};
		self.dispatch(SearchEvent::SelectResult(id))
	}

	pub fn query_changed(&mut self, query: &str) -> ViewResult<Vec<DomPatch>> {
		self.dispatch(SearchEvent::QueryChanged(query.to_string()))
	}

	pub fn search(&mut self, query: &str) -> ViewResult<Vec<DomPatch>> {
		self.dispatch(SearchEvent::Search(query.to_string()))
	}

	pub fn select(&mut self, id: &str) -> ViewResult<Vec<DomPatch>> {
		if self.search.selection.is_some() {
			debug!("selection of {id} ignored: a node is already selected");
		}
		self.dispatch(SearchEvent::SelectResult(id.to_string()))
	}

	pub fn clear_selection(&mut self) -> ViewResult<Vec<DomPatch>> {
		self.dispatch(SearchEvent::ClearSelection)
	}

	pub fn close_search(&mut self) -> ViewResult<Vec<DomPatch>> {
		self.dispatch(SearchEvent::CloseSearch)
	}

	fn dispatch(&mut self, event: SearchEvent) -> ViewResult<Vec<DomPatch>> {
		let (Some(model), Some(surface)) = (self.model.as_ref(), self.surface.as_ref()) else {
			warn!("{event:?} ignored: no rendered graph");
			return Err(ViewError::NoSurface);
		};
		if !self.ready {
			warn!("{event:?} ignored: graph not ready");
			return Err(ViewError::NoSurface);
		}
		let ctx = SearchContext {
			model,
			layout: surface.layout(),
			viewport: (surface.width, surface.height),
			focus_scale: self.config.focus_scale,
		};
		let (next, effects) = self.search.reduce(event, &ctx);
		self.search = next;
		Ok(self.apply(effects))
	}

	fn apply(&mut self, effects: Vec<Effect>) -> Vec<DomPatch> {
		let mut patches = Vec::new();
		for effect in effects {
			match effect {
				Effect::SetTransform(transform) => {
					self.transform = transform;
					if let Some(zoom) = self.zoom.as_mut() {
						zoom.set_transform(transform);
					}
					if let Some(surface) = self.surface.as_mut() {
						surface.set_transform(transform);
					}
					patches.push(DomPatch::Transform(transform.to_attribute()));
				}
				Effect::Restyle { node, style } => {
					let Some(surface) = self.surface.as_mut() else {
						continue;
					};
					let Some(x) = surface.layout().node(&node).map(|n| n.x) else {
						continue;
					};
					if let Some(dom_id) = surface.set_node_style(&node, style) {
						let attrs = style.attrs(&self.config);
						patches.push(DomPatch::NodeStyle {
							dom_id,
							label_x: attrs.label_x(x),
							attrs,
						});
					}
				}
			}
		}
		patches
	}

	pub fn export(&self) -> ViewResult<SvgExport> {
		let surface = self.surface.as_ref().ok_or(ViewError::NoSurface)?;
		Ok(export_surface(surface))
	}

	/// Releases everything tied to the current session.
	pub fn teardown(&mut self) {
		self.ready = false;
		self.zoom = None;
		self.surface = None;
		self.model = None;
		self.pending = None;
		self.colors.clear();
		self.search = SearchState::default();
		self.transform = ViewTransform::IDENTITY;
		debug!("graph view torn down");
	}

	pub fn is_ready(&self) -> bool {
		self.ready
	}

	pub fn config(&self) -> &ViewConfig {
		&self.config
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn phase(&self) -> Phase {
		self.search.phase
	}

	pub fn query(&self) -> &str {
		&self.search.query
	}

	pub fn results(&self) -> &[SearchHit] {
		&self.search.results
	}

	pub fn selection(&self) -> Option<&Selection> {
		self.search.selection.as_ref()
	}

	pub fn legend(&self) -> Vec<(String, String)> {
		self.colors.legend()
	}

	pub fn surface(&self) -> Option<&RenderedSurface> {
		self.surface.as_ref()
	}
}
