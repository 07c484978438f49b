pub mod graph_view;
pub mod notice;
