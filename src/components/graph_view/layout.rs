//! Layered (rank-based) layout for the logical graph model.
//!
//! Ranking ignores self-loops and breaks cycles by reversing DFS back edges,
//! then assigns longest-path ranks. Nodes within a rank are ordered with a few
//! barycenter sweeps. Weakly-connected components are laid out independently
//! and stacked along the cross axis.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use serde::Deserialize;

use super::config::ViewConfig;
use super::error::{ViewError, ViewResult};
use super::palette::ColorRegistry;
use super::types::GraphModel;

const ORDER_SWEEPS: usize = 2;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RankDir {
	#[default]
	LeftToRight,
	TopToBottom,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionedNode {
	pub id: String,
	pub label: String,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub rank: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutedEdge {
	pub source: String,
	pub target: String,
	pub label: String,
	pub color: String,
	/// SVG path data (one cubic segment).
	pub path: String,
	pub label_pos: (f64, f64),
}

/// Positioned copy of the graph. Rebuilt wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutGraph {
	pub nodes: Vec<PositionedNode>,
	pub edges: Vec<RoutedEdge>,
	pub width: f64,
	pub height: f64,
	index: HashMap<String, usize>,
}

impl LayoutGraph {
	pub fn node(&self, id: &str) -> Option<&PositionedNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		self.node(id).map(|n| (n.x, n.y))
	}

	/// Topmost node whose marker contains the graph-space point.
	pub fn node_at(&self, gx: f64, gy: f64, slack: f64) -> Option<&PositionedNode> {
		self.nodes.iter().rev().find(|n| {
			let (dx, dy) = (n.x - gx, n.y - gy);
			(dx * dx + dy * dy).sqrt() <= n.radius + slack
		})
	}
}

type Point = (f64, f64);

/// Lays out `model`, coloring every edge through `colors` in edge order.
pub fn layout(
	model: &GraphModel,
	colors: &mut ColorRegistry,
	config: &ViewConfig,
) -> ViewResult<LayoutGraph> {
	if model.is_empty() {
		return Err(ViewError::EmptyGraph);
	}
	let n = model.nodes.len();

	let mut links = Vec::with_capacity(model.edges.len());
	for edge in &model.edges {
		let (Some(s), Some(t)) = (
			model.nodes.get_index_of(&edge.source),
			model.nodes.get_index_of(&edge.target),
		) else {
			return Err(ViewError::LayoutFailure(format!(
				"edge {} -> {} references an unknown node",
				edge.source, edge.target
			)));
		};
		links.push((s, t));
	}
	let ranking_links: Vec<(usize, usize)> =
		links.iter().copied().filter(|(s, t)| s != t).collect();

	let ranks = assign_ranks(n, &ranking_links);
	let mut placed: Vec<Point> = vec![(0.0, 0.0); n];
	let mut cross_cursor = 0.0;

	for component in components(n, &ranking_links) {
		let max_rank = component.iter().map(|&v| ranks[v]).max().unwrap_or(0);
		let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
		for &v in &component {
			buckets[ranks[v]].push(v);
		}
		order_buckets(&mut buckets, &ranking_links);

		let widest = buckets.iter().map(Vec::len).max().unwrap_or(1);
		let extent = (widest.saturating_sub(1)) as f64 * config.node_spacing;
		for (rank, bucket) in buckets.iter().enumerate() {
			let offset = (extent - (bucket.len().saturating_sub(1)) as f64 * config.node_spacing) / 2.0;
			for (i, &v) in bucket.iter().enumerate() {
				let main = rank as f64 * config.rank_spacing;
				let cross = cross_cursor + offset + i as f64 * config.node_spacing;
				placed[v] = (main, cross);
			}
		}
		cross_cursor += extent + config.component_spacing;
	}

	let origin = config.margin + config.node_radius;
	let mut graph = LayoutGraph::default();
	for (i, node) in model.nodes.values().enumerate() {
		let (main, cross) = placed[i];
		let (x, y) = match config.rank_dir {
			RankDir::LeftToRight => (origin + main, origin + cross),
			RankDir::TopToBottom => (origin + cross, origin + main),
		};
		graph.index.insert(node.id.clone(), graph.nodes.len());
		graph.nodes.push(PositionedNode {
			id: node.id.clone(),
			label: node.label.clone(),
			x,
			y,
			radius: config.node_radius,
			rank: ranks[i],
		});
	}

	let mut pair_totals: HashMap<(usize, usize), usize> = HashMap::new();
	for &(s, t) in &links {
		*pair_totals.entry(pair_key(s, t)).or_default() += 1;
	}
	let mut pair_seen: HashMap<(usize, usize), usize> = HashMap::new();

	for (edge, &(s, t)) in model.edges.iter().zip(&links) {
		let key = pair_key(s, t);
		let seen = pair_seen.entry(key).or_default();
		let slot = *seen;
		*seen += 1;

		let a = &graph.nodes[s];
		let b = &graph.nodes[t];
		let (p0, c1, c2, p3) = if s == t {
			route_self_loop((a.x, a.y), a.radius, slot)
		} else {
			let total = pair_totals[&key];
			let canonical_forward = s < t;
			route_link((a.x, a.y), (b.x, b.y), a.radius, slot, total, canonical_forward)
		};
		let label_pos = cubic_point(p0, c1, c2, p3, 0.5);
		let coords = [p0, c1, c2, p3, label_pos];
		if coords.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
			return Err(ViewError::LayoutFailure(format!(
				"non-finite route for edge {} -> {}",
				edge.source, edge.target
			)));
		}
		graph.edges.push(RoutedEdge {
			source: edge.source.clone(),
			target: edge.target.clone(),
			label: edge.label.clone(),
			color: colors.color_for(&edge.label).to_string(),
			path: format!(
				"M{:.2},{:.2} C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
				p0.0, p0.1, c1.0, c1.1, c2.0, c2.1, p3.0, p3.1
			),
			label_pos,
		});
	}

	if graph
		.nodes
		.iter()
		.any(|node| !node.x.is_finite() || !node.y.is_finite())
	{
		return Err(ViewError::LayoutFailure("non-finite node coordinate".into()));
	}

	let pad = config.margin + config.node_radius;
	graph.width = graph.nodes.iter().map(|n| n.x).fold(0.0, f64::max) + pad;
	graph.height = graph.nodes.iter().map(|n| n.y).fold(0.0, f64::max) + pad;

	debug!(
		"layout: {} nodes, {} edges, {:.0}x{:.0}",
		graph.nodes.len(),
		graph.edges.len(),
		graph.width,
		graph.height
	);
	Ok(graph)
}

fn pair_key(s: usize, t: usize) -> (usize, usize) {
	(s.min(t), s.max(t))
}

/// Longest-path ranks after reversing the back edges of a DFS.
fn assign_ranks(n: usize, links: &[(usize, usize)]) -> Vec<usize> {
	let mut out_adj: Vec<Vec<usize>> = vec![Vec::new(); n];
	for &(s, t) in links {
		out_adj[s].push(t);
	}

	// 0 = unvisited, 1 = on stack, 2 = done
	let mut state = vec![0u8; n];
	let mut back_edges = HashSet::new();
	for root in 0..n {
		if state[root] != 0 {
			continue;
		}
		let mut stack = vec![(root, 0usize)];
		state[root] = 1;
		while let Some(frame) = stack.last_mut() {
			let v = frame.0;
			if let Some(&w) = out_adj[v].get(frame.1) {
				frame.1 += 1;
				match state[w] {
					0 => {
						state[w] = 1;
						stack.push((w, 0));
					}
					1 => {
						back_edges.insert((v, w));
					}
					_ => {}
				}
			} else {
				state[v] = 2;
				stack.pop();
			}
		}
	}

	let mut dag: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut indeg = vec![0usize; n];
	for &(s, t) in links {
		let (u, w) = if back_edges.contains(&(s, t)) { (t, s) } else { (s, t) };
		dag[u].push(w);
		indeg[w] += 1;
	}

	let mut ranks = vec![0usize; n];
	let mut queue: VecDeque<usize> = (0..n).filter(|&v| indeg[v] == 0).collect();
	while let Some(v) = queue.pop_front() {
		for &w in &dag[v] {
			ranks[w] = ranks[w].max(ranks[v] + 1);
			indeg[w] -= 1;
			if indeg[w] == 0 {
				queue.push_back(w);
			}
		}
	}
	ranks
}

/// Weakly-connected components, each in first-seen node order.
fn components(n: usize, links: &[(usize, usize)]) -> Vec<Vec<usize>> {
	let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
	for &(s, t) in links {
		adj[s].push(t);
		adj[t].push(s);
	}
	let mut seen = vec![false; n];
	let mut out = Vec::new();
	for root in 0..n {
		if seen[root] {
			continue;
		}
		seen[root] = true;
		let mut members = vec![root];
		let mut queue = VecDeque::from([root]);
		while let Some(v) = queue.pop_front() {
			for &w in &adj[v] {
				if !seen[w] {
					seen[w] = true;
					members.push(w);
					queue.push_back(w);
				}
			}
		}
		members.sort_unstable();
		out.push(members);
	}
	out
}

fn order_buckets(buckets: &mut [Vec<usize>], links: &[(usize, usize)]) {
	if buckets.len() <= 1 {
		return;
	}
	let mut incoming: HashMap<usize, Vec<usize>> = HashMap::new();
	let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
	for &(s, t) in links {
		outgoing.entry(s).or_default().push(t);
		incoming.entry(t).or_default().push(s);
	}

	let mut positions: HashMap<usize, usize> = HashMap::new();
	refresh_positions(buckets, &mut positions);

	for _ in 0..ORDER_SWEEPS {
		for rank in 1..buckets.len() {
			sort_by_barycenter(&mut buckets[rank], &incoming, &positions);
			refresh_positions(buckets, &mut positions);
		}
		for rank in (0..buckets.len() - 1).rev() {
			sort_by_barycenter(&mut buckets[rank], &outgoing, &positions);
			refresh_positions(buckets, &mut positions);
		}
	}
}

fn refresh_positions(buckets: &[Vec<usize>], positions: &mut HashMap<usize, usize>) {
	positions.clear();
	for bucket in buckets {
		for (i, &v) in bucket.iter().enumerate() {
			positions.insert(v, i);
		}
	}
}

fn sort_by_barycenter(
	bucket: &mut [usize],
	neighbors: &HashMap<usize, Vec<usize>>,
	positions: &HashMap<usize, usize>,
) {
	if bucket.len() <= 1 {
		return;
	}
	let current: HashMap<usize, usize> = bucket.iter().enumerate().map(|(i, &v)| (v, i)).collect();
	let score = |v: usize| -> f64 {
		let fallback = current[&v] as f64;
		let Some(list) = neighbors.get(&v) else {
			return fallback;
		};
		let known: Vec<f64> = list
			.iter()
			.filter_map(|w| positions.get(w).map(|&p| p as f64))
			.collect();
		if known.is_empty() {
			fallback
		} else {
			known.iter().sum::<f64>() / known.len() as f64
		}
	};
	// Stable sort keeps the previous order on ties.
	bucket.sort_by(|&a, &b| score(a).total_cmp(&score(b)));
}

fn route_link(
	a: Point,
	b: Point,
	radius: f64,
	slot: usize,
	total: usize,
	canonical_forward: bool,
) -> (Point, Point, Point, Point) {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let dist = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
	let (ux, uy) = (dx / dist, dy / dist);
	// Perpendicular taken from the canonical direction so A->B and B->A fan apart.
	let (px, py) = if canonical_forward { (-uy, ux) } else { (uy, -ux) };
	let spread = radius * 1.5;
	let offset = (slot as f64 - (total as f64 - 1.0) / 2.0) * spread * 2.0;

	let p0 = (a.0 + ux * radius, a.1 + uy * radius);
	let p3 = (b.0 - ux * radius, b.1 - uy * radius);
	let c1 = (a.0 + dx / 3.0 + px * offset, a.1 + dy / 3.0 + py * offset);
	let c2 = (a.0 + 2.0 * dx / 3.0 + px * offset, a.1 + 2.0 * dy / 3.0 + py * offset);
	(p0, c1, c2, p3)
}

fn route_self_loop(center: Point, radius: f64, slot: usize) -> (Point, Point, Point, Point) {
	let reach = radius * (3.0 + 1.5 * slot as f64);
	let spread = radius * (1.5 + 0.5 * slot as f64);
	let angle = std::f64::consts::PI / 6.0;
	let p0 = (center.0 - radius * angle.sin(), center.1 - radius * angle.cos());
	let p3 = (center.0 + radius * angle.sin(), center.1 - radius * angle.cos());
	let c1 = (center.0 - spread, center.1 - reach);
	let c2 = (center.0 + spread, center.1 - reach);
	(p0, c1, c2, p3)
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
	let mt = 1.0 - t;
	let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
	(
		a * p0.0 + b * c1.0 + c * c2.0 + d * p3.0,
		a * p0.1 + b * c1.1 + c * c2.1 + d * p3.1,
	)
}
