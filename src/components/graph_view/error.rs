use thiserror::Error;

/// Failures surfaced by the graph view engine.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ViewError {
	#[error("the graph is empty: no nodes or edges to draw")]
	EmptyGraph,
	#[error("no graph surface is currently rendered")]
	NoSurface,
	#[error("layout failed: {0}")]
	LayoutFailure(String),
	#[error("invalid view configuration: {0}")]
	InvalidConfig(String),
}

pub type ViewResult<T> = Result<T, ViewError>;

/// A record the model builder had to skip.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("record {index} is malformed: {reason}")]
pub struct MalformedRecordError {
	pub index: usize,
	pub reason: String,
}
