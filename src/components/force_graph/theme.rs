//! Colors and the fixed visual theme of the canvas.

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same channels, different alpha.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Mix towards white (0.0 keeps the color, 1.0 is white).
	pub fn lighten(self, factor: f64) -> Self {
		self.mix(Color::rgb(255, 255, 255), factor)
	}

	/// Mix towards black (0.0 keeps the color, 1.0 is black).
	pub fn darken(self, factor: f64) -> Self {
		self.mix(Color::rgb(0, 0, 0), factor)
	}

	/// Mix the channels with `other`, keeping this color's alpha.
	fn mix(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
		Self {
			r: channel(self.r, other.r),
			g: channel(self.g, other.g),
			b: channel(self.b, other.b),
			a: self.a,
		}
	}

	/// `#rrggbb` when opaque, `rgba(...)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

impl From<colorous::Color> for Color {
	fn from(c: colorous::Color) -> Self {
		Color::rgb(c.r, c.g, c.b)
	}
}

/// Every color and font the renderer uses.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: Color,
	/// Centre of the radial background gradient.
	pub background_glow: Color,
	pub edge: Color,
	pub edge_label: Color,
	pub node_label: Color,
	pub tooltip_background: Color,
	pub tooltip_border: Color,
	pub tooltip_text: Color,
	/// Global alpha applied to dimmed nodes and edges.
	pub dimmed_alpha: f64,
	pub label_font: &'static str,
	pub edge_label_font: &'static str,
	pub tooltip_font: &'static str,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			background_glow: Color::rgb(30, 35, 42),
			edge: Color::rgba(140, 160, 180, 0.6),
			edge_label: Color::rgba(190, 200, 215, 0.85),
			node_label: Color::rgba(255, 255, 255, 0.9),
			tooltip_background: Color::rgba(13, 17, 23, 0.92),
			tooltip_border: Color::rgba(140, 160, 180, 0.5),
			tooltip_text: Color::rgb(230, 237, 243),
			dimmed_alpha: 0.2,
			label_font: "12px sans-serif",
			edge_label_font: "10px sans-serif",
			tooltip_font: "12px sans-serif",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_css_output() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgba(1, 2, 3, 0.5).to_css(), "rgba(1, 2, 3, 0.5)");
	}

	#[test]
	fn test_lighten_and_darken_bounds() {
		let c = Color::rgb(100, 100, 100);
		assert_eq!(c.lighten(1.0), Color::rgb(255, 255, 255));
		assert_eq!(c.darken(1.0), Color::rgb(0, 0, 0));
		assert_eq!(c.lighten(0.0), c);
	}

	#[test]
	fn test_from_colorous() {
		let c: Color = colorous::VIRIDIS.eval_continuous(0.0).into();
		assert_eq!((c.r, c.g, c.b, c.a), (68, 1, 84, 1.0));
	}
}
