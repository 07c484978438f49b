//! Graph view engine: records in, interactive SVG out.

mod component;
mod config;
mod error;
mod export;
mod layout;
mod model;
mod palette;
mod search;
mod state;
mod surface;
mod types;
mod zoom;

pub use component::GraphView;
pub use config::{DEFAULT_PALETTE, RecordSchema, ViewConfig};
pub use error::{MalformedRecordError, ViewError, ViewResult};
pub use export::{EXPORT_FILENAME, SVG_MIME, SvgExport, export_surface};
pub use layout::{LayoutGraph, PositionedNode, RankDir, RoutedEdge, layout};
pub use model::{BuildOutput, build};
pub use palette::ColorRegistry;
pub use search::{Effect, Phase, SearchContext, SearchEvent, SearchHit, SearchState, Selection, find};
pub use state::{DomPatch, GraphViewState, LoadReport};
pub use surface::{NodeStyle, RenderedSurface, StyleAttrs, SurfaceTarget, ViewTransform, render};
pub use types::{AttrValue, Attributes, Edge, GraphModel, Node, RelationRecord};
pub use zoom::{ZoomEvent, ZoomHandle, attach_zoom};
