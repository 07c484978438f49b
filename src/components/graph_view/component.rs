use gloo_timers::callback::Timeout;
use leptos::html::Div;
use leptos::prelude::*;
use log::{error, warn};
use web_sys::{HtmlDivElement, MouseEvent, WheelEvent};

use super::config::ViewConfig;
use super::error::{ViewError, ViewResult};
use super::export::download;
use super::search::{Phase, SearchHit, Selection};
use super::state::{DomPatch, GraphViewState};
use super::surface::SurfaceTarget;
use super::types::RelationRecord;
use super::zoom::ZoomEvent;
use crate::components::notice::{Notice, NoticeKind, NoticeMessage};

/// Reactive copy of what the side panel shows.
#[derive(Clone, Debug, Default, PartialEq)]
struct PanelState {
	ready: bool,
	phase: Phase,
	query: String,
	results: Vec<SearchHit>,
	selection: Option<Selection>,
	legend: Vec<(String, String)>,
}

impl PanelState {
	fn snapshot(s: &GraphViewState) -> Self {
		Self {
			ready: s.is_ready(),
			phase: s.phase(),
			query: s.query().to_string(),
			results: s.results().to_vec(),
			selection: s.selection().cloned(),
			legend: s.legend(),
		}
	}
}

#[derive(Clone, Copy)]
struct ViewHandle {
	state: StoredValue<GraphViewState, LocalStorage>,
	host: NodeRef<Div>,
	panel: RwSignal<PanelState>,
}

impl ViewHandle {
	/// Runs one engine action, mirrors its DOM patches and refreshes the panel.
	fn perform(self, action: impl FnOnce(&mut GraphViewState) -> ViewResult<Vec<DomPatch>>) {
		let mut result = None;
		self.state.update_value(|s| result = Some(action(s)));
		match result {
			Some(Ok(patches)) => {
				if let Some(host) = self.host.get() {
					apply_patches(&host, &patches);
				}
			}
			Some(Err(err)) => warn!("graph action ignored: {err}"),
			None => {}
		}
		self.sync();
	}

	fn zoom(self, event: ZoomEvent) {
		self.perform(|s| Ok(s.zoom_event(event)));
	}

	fn sync(self) {
		let snapshot = self.state.with_value(PanelState::snapshot);
		if self.panel.with_untracked(|p| *p != snapshot) {
			self.panel.set(snapshot);
		}
	}
}

fn local_point(host: &HtmlDivElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = host.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn apply_patches(host: &HtmlDivElement, patches: &[DomPatch]) {
	for patch in patches {
		match patch {
			DomPatch::Transform(value) => {
				if let Ok(Some(group)) = host.query_selector("g.viewport") {
					let _ = group.set_attribute("transform", value);
				}
			}
			DomPatch::NodeStyle {
				dom_id,
				attrs,
				label_x,
			} => {
				let Ok(Some(circle)) = host.query_selector(&format!("#{dom_id}")) else {
					continue;
				};
				let _ = circle.set_attribute("fill", attrs.fill);
				let _ = circle.set_attribute("stroke", attrs.stroke);
				let _ = circle.set_attribute("stroke-width", &attrs.stroke_width.to_string());
				let _ = circle.set_attribute("r", &attrs.radius.to_string());
				let Some(group) = circle.parent_element() else {
					continue;
				};
				let _ = group.set_attribute("class", attrs.class);
				if let Ok(Some(label)) = group.query_selector("text") {
					let _ = label.set_attribute("x", &format!("{label_x:.2}"));
				}
			}
		}
	}
}

/// Interactive diagram for a list of relation records, with search, inspector and export.
#[component]
pub fn GraphView(
	#[prop(into)] records: Signal<Vec<RelationRecord>>,
	#[prop(optional)] config: Option<ViewConfig>,
) -> impl IntoView {
	let notice = RwSignal::new(None::<NoticeMessage>);
	let state = GraphViewState::new(config.unwrap_or_default()).unwrap_or_else(|err| {
		error!("graph config rejected: {err}");
		notice.set(Some(NoticeMessage::new(
			NoticeKind::Error,
			format!("{err}; using the default view settings."),
			false,
		)));
		GraphViewState::default()
	});
	let (debounce_ms, default_size) = (
		state.config().search_debounce_ms,
		state.config().default_size,
	);

	let host_ref = NodeRef::<Div>::new();
	let handle = ViewHandle {
		state: StoredValue::new_local(state),
		host: host_ref,
		panel: RwSignal::new(PanelState::default()),
	};
	let panel = handle.panel;
	let debounce = StoredValue::new_local(None::<Timeout>);
	let render_epoch = RwSignal::new(0u32);

	Effect::new(move |_| {
		let records = records.get();
		render_epoch.track();
		let Some(host) = host_ref.get() else {
			return;
		};
		let target = SurfaceTarget::from_container(
			host.client_width() as f64,
			host.client_height() as f64,
			default_size,
		);

		let mut outcome = None;
		handle.state.update_value(|s| {
			outcome = Some(
				s.load(&records)
					.and_then(|report| s.render(target).map(|markup| (report, markup))),
			);
		});
		match outcome {
			Some(Ok((report, markup))) => {
				host.set_inner_html(&markup);
				if !report.rejected.is_empty() {
					notice.set(Some(NoticeMessage::new(
						NoticeKind::Warning,
						format!(
							"{} malformed record(s) were skipped (first: {})",
							report.rejected.len(),
							report.rejected[0]
						),
						false,
					)));
				}
			}
			Some(Err(ViewError::EmptyGraph)) => {
				notice.set(Some(NoticeMessage::new(
					NoticeKind::Warning,
					"There is no graph data to display.",
					true,
				)));
			}
			Some(Err(err)) => {
				error!("graph render failed: {err}");
				notice.set(Some(NoticeMessage::new(
					NoticeKind::Error,
					format!("The graph could not be drawn: {err}"),
					true,
				)));
			}
			None => {}
		}
		handle.sync();
	});

	on_cleanup(move || {
		debounce.update_value(|t| {
			if let Some(t) = t.take() {
				t.cancel();
			}
		});
		handle.state.update_value(GraphViewState::teardown);
	});

	let on_input = move |ev: web_sys::Event| {
		let query = event_target_value(&ev);
		handle.perform(|s| s.query_changed(&query));
		debounce.update_value(|t| {
			if let Some(t) = t.take() {
				t.cancel();
			}
		});
		debounce.set_value(Some(Timeout::new(debounce_ms, move || {
			handle.perform(|s| s.search(&query));
		})));
	};

	let on_export = move |_: MouseEvent| {
		let mut export = None;
		handle.state.update_value(|s| export = Some(s.export()));
		match export {
			Some(Ok(file)) => {
				if let Err(err) = download(&file) {
					error!("export download failed: {err:?}");
				}
			}
			Some(Err(err)) => {
				notice.set(Some(NoticeMessage::new(
					NoticeKind::Error,
					format!("Nothing to export: {err}"),
					false,
				)));
			}
			None => {}
		}
	};

	let on_mousedown = move |ev: MouseEvent| {
		let Some(host) = host_ref.get() else { return };
		let (x, y) = local_point(&host, &ev);
		handle.zoom(ZoomEvent::PointerDown { x, y });
	};
	let on_mousemove = move |ev: MouseEvent| {
		let Some(host) = host_ref.get() else { return };
		let (x, y) = local_point(&host, &ev);
		handle.zoom(ZoomEvent::PointerMove { x, y });
	};
	let on_mouseup = move |_: MouseEvent| handle.zoom(ZoomEvent::PointerUp);
	let on_mouseleave = move |_: MouseEvent| handle.zoom(ZoomEvent::PointerLeave);
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(host) = host_ref.get() else { return };
		let (x, y) = local_point(&host, &ev);
		handle.zoom(ZoomEvent::Wheel {
			x,
			y,
			delta_y: ev.delta_y(),
		});
	};
	let on_click = move |ev: MouseEvent| {
		let Some(host) = host_ref.get() else { return };
		let (x, y) = local_point(&host, &ev);
		handle.perform(|s| s.click(x, y));
	};

	let retry = Callback::new(move |_: ()| render_epoch.update(|n| *n += 1));

	view! {
		<div class="graph-view">
			<div class="graph-toolbar">
				<input
					type="search"
					class="graph-search"
					placeholder="Search nodes and relations"
					prop:value=move || panel.with(|p| p.query.clone())
					prop:disabled=move || !panel.with(|p| p.ready)
					on:input=on_input
				/>
				<button on:click=move |_| {
					debounce.update_value(|t| {
						if let Some(t) = t.take() {
							t.cancel();
						}
					});
					handle.perform(GraphViewState::close_search);
				}>"Close search"</button>
				<button on:click=move |_| handle.perform(|s| Ok(s.reset_view()))>"Reset view"</button>
				<button on:click=on_export>"Export SVG"</button>
			</div>
			<div class="graph-body">
				<div
					node_ref=host_ref
					class="graph-host"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:wheel=on_wheel
					on:click=on_click
					style="position: relative; width: 100%; height: 100%; cursor: grab;"
				></div>
				<aside class="graph-sidebar">
					{move || {
						(panel.with(|p| p.phase) == Phase::Searching)
							.then(|| view! { <p class="graph-searching">"Searching…"</p> })
					}}
					<ul class="graph-results">
						{move || {
							panel
								.with(|p| p.results.clone())
								.into_iter()
								.map(|hit| match hit {
									SearchHit::Node { id, label } => {
										let text = if label == id {
											label
										} else {
											format!("{label} ({id})")
										};
										view! {
											<li
												class="hit hit-node"
												on:click=move |_| handle.perform(|s| s.select(&id))
											>
												{text}
											</li>
										}
											.into_any()
									}
									SearchHit::Edge { source, target, label, .. } => {
										view! {
											<li class="hit hit-edge">
												{format!("{source} → {target} · {label}")}
											</li>
										}
											.into_any()
									}
								})
								.collect_view()
						}}
					</ul>
					{move || {
						panel
							.with(|p| p.selection.clone())
							.map(|selection| {
								view! {
									<section class="graph-inspector">
										<header>
											<h3>{selection.node.clone()}</h3>
											<button on:click=move |_| {
												handle.perform(GraphViewState::clear_selection)
											}>"Close"</button>
										</header>
										<dl>
											{selection
												.properties
												.into_iter()
												.map(|(key, value)| view! { <dt>{key}</dt><dd>{value}</dd> })
												.collect_view()}
										</dl>
									</section>
								}
							})
					}}
					<ul class="graph-legend">
						{move || {
							panel
								.with(|p| p.legend.clone())
								.into_iter()
								.map(|(label, color)| {
									view! {
										<li>
											<span class="swatch" style={format!("background: {color}")}></span>
											{label}
										</li>
									}
								})
								.collect_view()
						}}
					</ul>
				</aside>
			</div>
			<Notice message=notice on_retry=retry />
		</div>
	}
}
