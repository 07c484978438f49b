use indexmap::IndexMap;

/// Memoized label → color assignment in first-seen order.
#[derive(Clone, Debug)]
pub struct ColorRegistry {
	palette: Vec<String>,
	assigned: IndexMap<String, String>,
}

impl ColorRegistry {
	/// # Panics
	///
	/// If `palette` is empty. Validated configs never carry an empty palette.
	pub fn new(palette: &[String]) -> Self {
		assert!(!palette.is_empty(), "color palette must not be empty");
		Self {
			palette: palette.to_vec(),
			assigned: IndexMap::new(),
		}
	}

	/// Returns the stable color for `label`, assigning the next palette slot on first sight.
	pub fn color_for(&mut self, label: &str) -> &str {
		let next = self.assigned.len();
		let palette = &self.palette;
		self.assigned
			.entry(label.to_string())
			.or_insert_with(|| palette[next % palette.len()].clone())
			.as_str()
	}

	pub fn get(&self, label: &str) -> Option<&str> {
		self.assigned.get(label).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.assigned.len()
	}

	pub fn is_empty(&self) -> bool {
		self.assigned.is_empty()
	}

	/// (label, color) pairs in assignment order.
	pub fn legend(&self) -> Vec<(String, String)> {
		self.assigned
			.iter()
			.map(|(l, c)| (l.clone(), c.clone()))
			.collect()
	}

	pub fn clear(&mut self) {
		self.assigned.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::config::DEFAULT_PALETTE;

	fn registry() -> ColorRegistry {
		let palette: Vec<String> = DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect();
		ColorRegistry::new(&palette)
	}

	#[test]
	#[should_panic(expected = "color palette must not be empty")]
	fn empty_palette_is_refused() {
		ColorRegistry::new(&[]);
	}

	#[test]
	fn repeated_lookups_are_stable() {
		let mut reg = registry();
		let first = reg.color_for("next").to_string();
		reg.color_for("other");
		assert_eq!(reg.color_for("next"), first);
		assert_eq!(reg.len(), 2);
	}

	#[test]
	fn assignment_wraps_around_palette() {
		let mut reg = registry();
		let n = DEFAULT_PALETTE.len();
		for i in 0..n + 3 {
			let color = reg.color_for(&format!("label-{i}")).to_string();
			assert_eq!(color, DEFAULT_PALETTE[i % n]);
		}
	}

	#[test]
	fn clear_restarts_assignment() {
		let mut reg = registry();
		reg.color_for("a");
		reg.color_for("b");
		reg.clear();
		assert!(reg.is_empty());
		assert_eq!(reg.color_for("b"), DEFAULT_PALETTE[0]);
	}

	#[test]
	fn legend_lists_labels_in_assignment_order() {
		let mut reg = registry();
		reg.color_for("owns");
		reg.color_for("ships");
		reg.color_for("owns");
		assert_eq!(
			reg.legend(),
			[
				("owns".to_string(), DEFAULT_PALETTE[0].to_string()),
				("ships".to_string(), DEFAULT_PALETTE[1].to_string()),
			]
		);
	}
}
