//! Search and selection as a pure reducer.
//!
//! `SearchState::reduce` never touches the surface; it returns [`Effect`]s that
//! the owning view applies afterwards.

use super::layout::LayoutGraph;
use super::surface::{NodeStyle, ViewTransform};
use super::types::GraphModel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
	#[default]
	Idle,
	/// A query was typed and is waiting for the debounce to fire.
	Searching,
	ResultsShown,
	NodeSelected,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchHit {
	Node { id: String, label: String },
	Edge { index: usize, source: String, target: String, label: String },
}

impl SearchHit {
	/// Stable key for keyed lists.
	pub fn key(&self) -> String {
		match self {
			Self::Node { id, .. } => format!("n:{id}"),
			Self::Edge { index, .. } => format!("e:{index}"),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
	pub node: String,
	pub properties: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchEvent {
	QueryChanged(String),
	Search(String),
	SelectResult(String),
	ClearSelection,
	CloseSearch,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
	SetTransform(ViewTransform),
	Restyle { node: String, style: NodeStyle },
}

/// Everything the reducer may read but not write.
pub struct SearchContext<'a> {
	pub model: &'a GraphModel,
	pub layout: &'a LayoutGraph,
	pub viewport: (f64, f64),
	pub focus_scale: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchState {
	pub phase: Phase,
	pub query: String,
	pub results: Vec<SearchHit>,
	pub selection: Option<Selection>,
}

impl SearchState {
	pub fn reduce(&self, event: SearchEvent, ctx: &SearchContext<'_>) -> (Self, Vec<Effect>) {
		let mut next = self.clone();
		let mut effects = Vec::new();

		match event {
			SearchEvent::QueryChanged(query) => {
				next.query = query;
				if next.selection.is_none() {
					next.phase = Phase::Searching;
				}
			}
			SearchEvent::Search(query) => {
				next.query = query;
				next.results = find(&next.query, ctx.model);
				if next.selection.is_none() {
					next.phase = if next.query.trim().is_empty() {
						Phase::Idle
					} else {
						Phase::ResultsShown
					};
				}
			}
			SearchEvent::SelectResult(id) => {
				if self.selection.is_some() {
					return (next, effects);
				}
				let (Some(node), Some((x, y))) = (ctx.model.node(&id), ctx.layout.position(&id))
				else {
					return (next, effects);
				};
				let (w, h) = ctx.viewport;
				effects.push(Effect::SetTransform(ViewTransform::centered_on(
					x,
					y,
					w,
					h,
					ctx.focus_scale,
				)));
				effects.push(Effect::Restyle {
					node: id.clone(),
					style: NodeStyle::Selected,
				});
				next.selection = Some(Selection {
					node: id,
					properties: node.properties(),
				});
				next.phase = Phase::NodeSelected;
			}
			SearchEvent::ClearSelection => {
				next.clear_selection(&mut effects);
			}
			SearchEvent::CloseSearch => {
				next.clear_selection(&mut effects);
				next.query.clear();
				next.results.clear();
				next.phase = Phase::Idle;
			}
		}
		(next, effects)
	}

	fn clear_selection(&mut self, effects: &mut Vec<Effect>) {
		let Some(selection) = self.selection.take() else {
			return;
		};
		effects.push(Effect::Restyle {
			node: selection.node,
			style: NodeStyle::Default,
		});
		effects.push(Effect::SetTransform(ViewTransform::IDENTITY));
		self.phase = if self.query.trim().is_empty() {
			Phase::Idle
		} else {
			Phase::ResultsShown
		};
	}
}

/// Case-insensitive substring search over nodes, then edges.
pub fn find(query: &str, model: &GraphModel) -> Vec<SearchHit> {
	let needle = query.trim().to_lowercase();
	if needle.is_empty() {
		return Vec::new();
	}
	let nodes = model
		.nodes
		.values()
		.filter(|n| n.matches(&needle))
		.map(|n| SearchHit::Node {
			id: n.id.clone(),
			label: n.label.clone(),
		});
	let edges = model
		.edges
		.iter()
		.enumerate()
		.filter(|(_, e)| e.matches(&needle))
		.map(|(index, e)| SearchHit::Edge {
			index,
			source: e.source.clone(),
			target: e.target.clone(),
			label: e.label.clone(),
		});
	nodes.chain(edges).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::config::ViewConfig;
	use crate::components::graph_view::layout::layout;
	use crate::components::graph_view::model::build;
	use crate::components::graph_view::palette::ColorRegistry;
	use crate::components::graph_view::types::RelationRecord;

	fn fixture() -> (GraphModel, LayoutGraph) {
		let config = ViewConfig::default();
		let records = [
			RelationRecord::from_pairs([("class", "A"), ("type", "next"), ("related_class", "B")]),
			RelationRecord::from_pairs([("class", "B"), ("type", "next"), ("related_class", "A")]),
			RelationRecord::from_pairs([("class", "C"), ("type", "loop"), ("owner", "zed")]),
		];
		let model = build(&records, &config).model;
		let mut colors = ColorRegistry::new(&config.palette);
		let graph = layout(&model, &mut colors, &config).unwrap();
		(model, graph)
	}

	fn ctx<'a>(model: &'a GraphModel, layout: &'a LayoutGraph) -> SearchContext<'a> {
		SearchContext {
			model,
			layout,
			viewport: (800.0, 600.0),
			focus_scale: 2.0,
		}
	}

	fn step(state: &SearchState, event: SearchEvent, c: &SearchContext<'_>) -> SearchState {
		state.reduce(event, c).0
	}

	#[test]
	fn search_is_case_insensitive_and_covers_edges() {
		let (model, graph) = fixture();
		let hits = find("a", &model);
		assert_eq!(
			hits.iter().map(SearchHit::key).collect::<Vec<_>>(),
			["n:A", "e:0", "e:1"]
		);
		// attribute values match too
		assert_eq!(find("ZED", &model).len(), 2);
		let c = ctx(&model, &graph);
		let s = step(&SearchState::default(), SearchEvent::Search("nothing".into()), &c);
		assert_eq!(s.phase, Phase::ResultsShown);
		assert!(s.results.is_empty());
	}

	#[test]
	fn typing_enters_searching_until_debounced_search() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let s = step(&SearchState::default(), SearchEvent::QueryChanged("b".into()), &c);
		assert_eq!(s.phase, Phase::Searching);
		assert!(s.results.is_empty());
		let s = step(&s, SearchEvent::Search("b".into()), &c);
		assert_eq!(s.phase, Phase::ResultsShown);
		assert!(!s.results.is_empty());
	}

	#[test]
	fn select_centers_and_restyles() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let (s, effects) = SearchState::default().reduce(SearchEvent::SelectResult("B".into()), &c);
		let (bx, by) = graph.position("B").unwrap();
		assert_eq!(s.phase, Phase::NodeSelected);
		assert_eq!(
			effects,
			[
				Effect::SetTransform(ViewTransform::centered_on(bx, by, 800.0, 600.0, 2.0)),
				Effect::Restyle {
					node: "B".into(),
					style: NodeStyle::Selected
				},
			]
		);
		assert_eq!(s.selection.unwrap().properties[0], ("id".to_string(), "B".to_string()));
	}

	#[test]
	fn second_selection_is_ignored() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let s = step(&SearchState::default(), SearchEvent::SelectResult("A".into()), &c);
		let (s2, effects) = s.reduce(SearchEvent::SelectResult("B".into()), &c);
		assert!(effects.is_empty());
		assert_eq!(s2.selection.as_ref().map(|x| x.node.as_str()), Some("A"));
	}

	#[test]
	fn unknown_node_is_ignored() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let (s, effects) = SearchState::default().reduce(SearchEvent::SelectResult("Z".into()), &c);
		assert!(effects.is_empty());
		assert_eq!(s, SearchState::default());
	}

	#[test]
	fn clear_returns_to_results_when_query_active() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let s = step(&SearchState::default(), SearchEvent::Search("a".into()), &c);
		let s = step(&s, SearchEvent::SelectResult("A".into()), &c);
		let (s, effects) = s.reduce(SearchEvent::ClearSelection, &c);
		assert_eq!(s.phase, Phase::ResultsShown);
		assert!(effects.contains(&Effect::SetTransform(ViewTransform::IDENTITY)));
		assert!(effects.contains(&Effect::Restyle {
			node: "A".into(),
			style: NodeStyle::Default
		}));
	}

	#[test]
	fn close_search_cascades() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let s = step(&SearchState::default(), SearchEvent::Search("a".into()), &c);
		let s = step(&s, SearchEvent::SelectResult("A".into()), &c);
		let (s, effects) = s.reduce(SearchEvent::CloseSearch, &c);
		assert_eq!(s, SearchState::default());
		assert_eq!(effects.len(), 2);
	}

	#[test]
	fn clear_without_selection_is_a_no_op() {
		let (model, graph) = fixture();
		let c = ctx(&model, &graph);
		let (s, effects) = SearchState::default().reduce(SearchEvent::ClearSelection, &c);
		assert!(effects.is_empty());
		assert_eq!(s.phase, Phase::Idle);
	}
}
