use wasm_bindgen::{JsCast, JsValue};

use super::surface::RenderedSurface;

pub const SVG_MIME: &str = "image/svg+xml";
pub const EXPORT_FILENAME: &str = "graph.svg";

/// A standalone SVG file ready to be saved.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgExport {
	pub filename: &'static str,
	pub mime: &'static str,
	pub bytes: Vec<u8>,
}

impl SvgExport {
	pub fn as_str(&self) -> &str {
		std::str::from_utf8(&self.bytes).unwrap_or_default()
	}
}

/// Serializes the live surface verbatim, transform and node styles included.
pub fn export_surface(surface: &RenderedSurface) -> SvgExport {
	let mut text = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
	text.push_str(&surface.markup());
	SvgExport {
		filename: EXPORT_FILENAME,
		mime: SVG_MIME,
		bytes: text.into_bytes(),
	}
}

/// Offers the export to the user through a temporary object URL.
pub fn download(export: &SvgExport) -> Result<(), JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let document = window
		.document()
		.ok_or_else(|| JsValue::from_str("no document"))?;

	let parts = js_sys::Array::of1(&JsValue::from_str(export.as_str()));
	let options = web_sys::BlobPropertyBag::new();
	options.set_type(export.mime);
	let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
	let url = web_sys::Url::create_object_url_with_blob(&blob)?;

	let anchor = document.create_element("a")?;
	anchor.set_attribute("href", &url)?;
	anchor.set_attribute("download", export.filename)?;
	if let Some(body) = document.body() {
		body.append_child(&anchor)?;
		if let Some(a) = anchor.dyn_ref::<web_sys::HtmlElement>() {
			a.click();
		}
		body.remove_child(&anchor)?;
	}
	web_sys::Url::revoke_object_url(&url)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::config::ViewConfig;
	use crate::components::graph_view::layout::LayoutGraph;
	use crate::components::graph_view::surface::{SurfaceTarget, ViewTransform, render};

	#[test]
	fn export_is_standalone_svg() {
		let config = ViewConfig::default();
		let surface = render(
			SurfaceTarget {
				width: 100.0,
				height: 50.0,
			},
			LayoutGraph::default(),
			ViewTransform {
				x: 5.0,
				y: -2.5,
				k: 1.5,
			},
			&config,
		)
		.unwrap();
		let export = export_surface(&surface);
		assert_eq!(export.filename, "graph.svg");
		assert_eq!(export.mime, "image/svg+xml");
		let text = export.as_str();
		assert!(text.starts_with("<?xml"));
		assert!(text.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
		assert!(text.contains("translate(5,-2.5) scale(1.5)"));
	}
}
