use indexmap::map::Entry;
use log::warn;

use super::config::ViewConfig;
use super::error::MalformedRecordError;
use super::types::{AttrValue, Attributes, Edge, GraphModel, Node, RelationRecord};

/// Result of a build: the model plus every record that had to be skipped.
#[derive(Clone, Debug, Default)]
pub struct BuildOutput {
	pub model: GraphModel,
	pub rejected: Vec<MalformedRecordError>,
}

/// Turns relation records into a deduplicated node set and one edge per record.
pub fn build(records: &[RelationRecord], config: &ViewConfig) -> BuildOutput {
	let schema = &config.schema;
	let mut out = BuildOutput::default();

	for (index, record) in records.iter().enumerate() {
		let Some(primary) = record
			.get(&schema.primary_field)
			.and_then(AttrValue::as_identifier)
		else {
			let err = MalformedRecordError {
				index,
				reason: format!("missing or empty `{}`", schema.primary_field),
			};
			warn!("skipping {err}");
			out.rejected.push(err);
			continue;
		};
		let related = record
			.get(&schema.related_field)
			.and_then(AttrValue::as_identifier);

		let extra: Attributes = record
			.fields
			.iter()
			.filter(|(k, _)| !schema.is_role_field(k))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();

		// First-seen attributes win.
		if let Entry::Vacant(slot) = out.model.nodes.entry(primary.clone()) {
			let label = display_label(&extra, &schema.label_fields).unwrap_or_else(|| primary.clone());
			slot.insert(Node {
				id: primary.clone(),
				label,
				attributes: extra.clone(),
			});
		}
		if let Some(related) = &related {
			out.model
				.nodes
				.entry(related.clone())
				.or_insert_with(|| Node {
					id: related.clone(),
					label: related.clone(),
					attributes: Attributes::new(),
				});
		}

		let category = record
			.get(&schema.relation_field)
			.map(|v| v.to_string())
			.unwrap_or_default();
		out.model.edges.push(Edge {
			target: related.unwrap_or_else(|| primary.clone()),
			source: primary,
			label: config.edge_label(&category),
			category,
			attributes: extra,
		});
	}

	out
}

fn display_label(attributes: &Attributes, label_fields: &[String]) -> Option<String> {
	label_fields
		.iter()
		.filter_map(|f| attributes.get(f))
		.find_map(AttrValue::as_identifier)
}
