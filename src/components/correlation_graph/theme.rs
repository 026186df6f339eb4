//! Colors and visual constants for the correlation graph.

use std::collections::HashMap;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// The twenty-color categorical scheme used for document tags.
pub const CATEGORY20: [Color; 20] = [
	Color::rgb(0x1f, 0x77, 0xb4),
	Color::rgb(0xae, 0xc7, 0xe8),
	Color::rgb(0xff, 0x7f, 0x0e),
	Color::rgb(0xff, 0xbb, 0x78),
	Color::rgb(0x2c, 0xa0, 0x2c),
	Color::rgb(0x98, 0xdf, 0x8a),
	Color::rgb(0xd6, 0x27, 0x28),
	Color::rgb(0xff, 0x98, 0x96),
	Color::rgb(0x94, 0x67, 0xbd),
	Color::rgb(0xc5, 0xb0, 0xd5),
	Color::rgb(0x8c, 0x56, 0x4b),
	Color::rgb(0xc4, 0x9c, 0x94),
	Color::rgb(0xe3, 0x77, 0xc2),
	Color::rgb(0xf7, 0xb6, 0xd2),
	Color::rgb(0x7f, 0x7f, 0x7f),
	Color::rgb(0xc7, 0xc7, 0xc7),
	Color::rgb(0xbc, 0xbd, 0x22),
	Color::rgb(0xdb, 0xdb, 0x8d),
	Color::rgb(0x17, 0xbe, 0xcf),
	Color::rgb(0x9e, 0xda, 0xe5),
];

/// Ordinal color scale: each new tag takes the next palette slot.
#[derive(Clone, Debug, Default)]
pub struct TagPalette {
	slots: HashMap<String, usize>,
	order: Vec<String>,
}

impl TagPalette {
	pub fn new<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
		let mut palette = Self::default();
		for tag in tags {
			palette.color(tag);
		}
		palette
	}

	/// Color for `tag`, assigning a slot the first time a tag is seen.
	pub fn color(&mut self, tag: &str) -> Color {
		let next = self.order.len();
		let slot = *self.slots.entry(tag.to_string()).or_insert_with(|| {
			self.order.push(tag.to_string());
			next
		});
		CATEGORY20[slot % CATEGORY20.len()]
	}

	/// Color for a tag already known to the palette; grey otherwise.
	pub fn get(&self, tag: &str) -> Color {
		self.slots
			.get(tag)
			.map(|&slot| CATEGORY20[slot % CATEGORY20.len()])
			.unwrap_or(Color::rgb(128, 128, 128))
	}

	/// `(tag, color)` for every known tag, in assignment order.
	pub fn legend(&self) -> Vec<(String, Color)> {
		self.order
			.iter()
			.map(|t| (t.clone(), self.get(t)))
			.collect()
	}
}

/// Fixed visual style of the graph.
#[derive(Clone, Debug)]
pub struct GraphStyle {
	pub background: Color,
	pub edge_color: Color,
	/// Edge opacity is `weight * edge_alpha`.
	pub edge_alpha: f64,
	pub edge_width: f64,
	/// Selection edge opacity is `weight * selection_alpha`.
	pub selection_alpha: f64,
	pub selection_width: f64,
	pub node_border: Color,
	pub highlight_ring: Color,
	pub sublight_ring: Color,
}

impl Default for GraphStyle {
	fn default() -> Self {
		Self {
			background: Color::rgb(255, 255, 255),
			edge_color: Color::rgb(0, 0, 0),
			edge_alpha: 0.4,
			edge_width: 1.0,
			selection_alpha: 0.8,
			selection_width: 2.0,
			node_border: Color::rgb(0, 0, 0),
			highlight_ring: Color::rgb(0, 0, 0),
			sublight_ring: Color::rgba(0, 0, 0, 0.35),
		}
	}
}
