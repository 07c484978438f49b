use leptos::prelude::*;
use log::error;

use crate::components::graph_view::{GraphView, RelationRecord, ViewConfig};

const SAMPLE_RECORDS: &str = include_str!("../../assets/sample_graph.json");

/// Relation records bundled with the app until a dataset is uploaded.
fn sample_records() -> Vec<RelationRecord> {
	serde_json::from_str(SAMPLE_RECORDS).unwrap_or_else(|err| {
		error!("bundled sample graph is invalid: {err}");
		Vec::new()
	})
}

/// Graph explorer page
#[component]
pub fn GraphPage() -> impl IntoView {
	let records = RwSignal::new(sample_records());

	view! {
		<div class="fullscreen-graph">
			<div class="graph-overlay">
				<h1>"Knowledge Graph"</h1>
				<p class="subtitle">
					"Scroll to zoom. Drag the background to pan. Click a node or a search result to inspect it."
				</p>
			</div>
			<GraphView records=records config=ViewConfig::default() />
		</div>
	}
}
