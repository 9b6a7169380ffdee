//! Colors and drawing styles for the background layers.

use serde::Deserialize;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha in `[0, 1]`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with explicit alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Parses `#rrggbb` or `#rrggbbaa` notation.
	pub fn from_hex(hex: &str) -> Option<Self> {
		let digits = hex.strip_prefix('#')?;
		if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
			return None;
		}
		let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
		match digits.len() {
			6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
			8 => Some(Self::rgba(
				channel(0)?,
				channel(2)?,
				channel(4)?,
				channel(6)? as f64 / 255.0,
			)),
			_ => None,
		}
	}

	/// Hex when opaque, `rgba(..)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Hex notation, ignoring alpha.
	pub fn to_css_rgb(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl TryFrom<String> for Color {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::from_hex(&value).ok_or_else(|| format!("invalid color `{value}`, expected #rrggbb"))
	}
}

/// Colors particles are drawn from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Palette {
	/// Colors in pick order.
	pub colors: Vec<Color>,
}

impl Palette {
	/// Indigo, cyan, amber, pink and violet accents (default).
	pub fn accent() -> Self {
		Self {
			colors: vec![
				Color::rgb(99, 102, 241),  // Indigo
				Color::rgb(6, 182, 212),   // Cyan
				Color::rgb(245, 158, 11),  // Amber
				Color::rgb(236, 72, 153),  // Pink
				Color::rgb(139, 92, 246),  // Violet
			],
		}
	}

	/// Falls back to the first accent color for an empty palette.
	pub fn get(&self, index: usize) -> Color {
		if self.colors.is_empty() {
			return Color::rgb(99, 102, 241);
		}
		self.colors[index % self.colors.len()]
	}

	/// Number of colors.
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	/// `true` when no colors are configured.
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self::accent()
	}
}

/// Canvas style for the node network.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkStyle {
	/// Stroke color of connection lines
	pub line_color: Color,
	/// Line alpha at distance zero; fades linearly to 0 at the threshold
	pub line_alpha: f64,
	/// Line width in CSS pixels.
	pub line_width: f64,
	/// Node fill color.
	pub node_color: Color,
	/// Node fill opacity.
	pub node_alpha: f64,
	/// Node radius in CSS pixels.
	pub node_radius: f64,
}

impl Default for NetworkStyle {
	fn default() -> Self {
		Self {
			line_color: Color::rgb(99, 102, 241),
			line_alpha: 0.2,
			line_width: 0.5,
			node_color: Color::rgb(99, 102, 241),
			node_alpha: 0.6,
			node_radius: 1.5,
		}
	}
}

/// Complete visual theme.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Theme {
	/// Particle colors.
	pub palette: Palette,
	/// Canvas node network style.
	pub network: NetworkStyle,
}
