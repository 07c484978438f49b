//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod components;
mod pages;

// Top-Level pages
use crate::pages::graph::GraphPage;
use crate::pages::not_found::NotFound;

pub use crate::components::graph_view::{
	AttrValue, Attributes, BuildOutput, ColorRegistry, DEFAULT_PALETTE, DomPatch, EXPORT_FILENAME,
	Edge, Effect, GraphModel, GraphView, GraphViewState, LayoutGraph, LoadReport,
	MalformedRecordError, Node, NodeStyle, Phase, PositionedNode, RankDir, RecordSchema,
	RelationRecord, RenderedSurface, RoutedEdge, SVG_MIME, SearchContext, SearchEvent, SearchHit,
	SearchState, Selection, StyleAttrs, SurfaceTarget, SvgExport, ViewConfig, ViewError,
	ViewResult, ViewTransform, ZoomEvent, ZoomHandle, attach_zoom, build, export_surface, find,
	layout, render,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the graph page and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Knowledge Graph Explorer" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=GraphPage />
			</Routes>
		</Router>
	}
}
