use super::config::ViewConfig;
use super::surface::{RenderedSurface, ViewTransform};

/// Pointer travel (in screen pixels) after which a press counts as a pan rather than a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Pointer input in surface-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomEvent {
	Wheel { x: f64, y: f64, delta_y: f64 },
	PointerDown { x: f64, y: f64 },
	PointerMove { x: f64, y: f64 },
	PointerUp,
	PointerLeave,
}

/// Pan/zoom behavior bound to one rendered surface.
#[derive(Clone, Debug)]
pub struct ZoomHandle {
	transform: ViewTransform,
	pan: PanState,
	last_was_drag: bool,
	min_zoom: f64,
	max_zoom: f64,
}

/// Binds a zoom behavior to `surface`, starting from the surface's current transform.
pub fn attach_zoom(surface: &RenderedSurface, config: &ViewConfig) -> ZoomHandle {
	ZoomHandle {
		transform: surface.transform(),
		pan: PanState::default(),
		last_was_drag: false,
		min_zoom: config.min_zoom,
		max_zoom: config.max_zoom,
	}
}

impl ZoomHandle {
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Programmatic overwrite, e.g. when centering on a search result.
	pub fn set_transform(&mut self, transform: ViewTransform) {
		self.transform = transform;
		self.pan = PanState::default();
	}

	/// Whether the last completed press moved far enough to be a pan.
	pub fn last_was_drag(&self) -> bool {
		self.last_was_drag
	}

	/// Applies one pointer event; returns the new transform when it changed.
	pub fn handle(&mut self, event: ZoomEvent) -> Option<ViewTransform> {
		match event {
			ZoomEvent::Wheel { x, y, delta_y } => {
				let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
				let t = &mut self.transform;
				let new_k = (t.k * factor).clamp(self.min_zoom, self.max_zoom);
				if new_k == t.k {
					return None;
				}
				let ratio = new_k / t.k;
				t.x = x - (x - t.x) * ratio;
				t.y = y - (y - t.y) * ratio;
				t.k = new_k;
				Some(*t)
			}
			ZoomEvent::PointerDown { x, y } => {
				self.pan = PanState {
					active: true,
					moved: false,
					start_x: x,
					start_y: y,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
				self.last_was_drag = false;
				None
			}
			ZoomEvent::PointerMove { x, y } => {
				if !self.pan.active {
					return None;
				}
				let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
				if !self.pan.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
					return None;
				}
				self.pan.moved = true;
				self.transform.x = self.pan.transform_start_x + dx;
				self.transform.y = self.pan.transform_start_y + dy;
				Some(self.transform)
			}
			ZoomEvent::PointerUp | ZoomEvent::PointerLeave => {
				self.last_was_drag = self.pan.moved;
				self.pan = PanState::default();
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::layout::layout;
	use crate::components::graph_view::model::build;
	use crate::components::graph_view::palette::ColorRegistry;
	use crate::components::graph_view::surface::{SurfaceTarget, render};
	use crate::components::graph_view::types::RelationRecord;

	fn surface(transform: ViewTransform) -> RenderedSurface {
		let config = ViewConfig::default();
		let records = [RelationRecord::from_pairs([
			("class", "A"),
			("type", "next"),
			("related_class", "B"),
		])];
		let model = build(&records, &config).model;
		let mut colors = ColorRegistry::new(&config.palette);
		let graph = layout(&model, &mut colors, &config).unwrap();
		let target = SurfaceTarget {
			width: 400.0,
			height: 300.0,
		};
		render(target, graph, transform, &config).unwrap()
	}

	fn handle() -> ZoomHandle {
		attach_zoom(&surface(ViewTransform::IDENTITY), &ViewConfig::default())
	}

	#[test]
	fn attach_starts_from_surface_transform() {
		let start = ViewTransform {
			x: 35.0,
			y: -20.0,
			k: 2.0,
		};
		let mut z = attach_zoom(&surface(start), &ViewConfig::default());
		assert_eq!(z.transform(), start);
		assert!(!z.last_was_drag());

		z.handle(ZoomEvent::PointerDown { x: 0.0, y: 0.0 });
		let t = z.handle(ZoomEvent::PointerMove { x: 10.0, y: 5.0 }).unwrap();
		assert_eq!((t.x, t.y, t.k), (45.0, -15.0, 2.0));
	}

	#[test]
	fn wheel_zooms_around_pointer() {
		let mut z = handle();
		let before = z.transform().screen_to_graph(200.0, 100.0);
		let t = z
			.handle(ZoomEvent::Wheel {
				x: 200.0,
				y: 100.0,
				delta_y: -1.0,
			})
			.unwrap();
		assert!((t.k - 1.1).abs() < 1e-9);
		let after = t.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn wheel_is_clamped() {
		let mut z = handle();
		for _ in 0..200 {
			z.handle(ZoomEvent::Wheel {
				x: 0.0,
				y: 0.0,
				delta_y: 1.0,
			});
		}
		assert_eq!(z.transform().k, ViewConfig::default().min_zoom);
		assert!(z
			.handle(ZoomEvent::Wheel {
				x: 0.0,
				y: 0.0,
				delta_y: 1.0
			})
			.is_none());
	}

	#[test]
	fn drag_pans_and_marks_gesture() {
		let mut z = handle();
		z.handle(ZoomEvent::PointerDown { x: 10.0, y: 10.0 });
		let t = z.handle(ZoomEvent::PointerMove { x: 40.0, y: 25.0 }).unwrap();
		assert_eq!((t.x, t.y), (30.0, 15.0));
		z.handle(ZoomEvent::PointerUp);
		assert!(z.last_was_drag());
		// moves without a press are ignored
		assert!(z.handle(ZoomEvent::PointerMove { x: 90.0, y: 90.0 }).is_none());
	}

	#[test]
	fn small_jitter_is_still_a_click() {
		let mut z = handle();
		z.handle(ZoomEvent::PointerDown { x: 10.0, y: 10.0 });
		assert!(z.handle(ZoomEvent::PointerMove { x: 11.0, y: 11.0 }).is_none());
		z.handle(ZoomEvent::PointerUp);
		assert!(!z.last_was_drag());
		assert!(z.transform().is_identity());
	}
}
