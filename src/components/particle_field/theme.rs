//! Light/dark theming for the particle field.
//!
//! Provides the color type, per-theme color tables keyed by semantic name, and
//! the [`ThemeSource`] seam through which the renderer learns the active theme.

use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;
use serde::Deserialize;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
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
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Color scheme of the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
	#[default]
	Light,
	Dark,
}

impl Theme {
	pub fn from_dark(is_dark: bool) -> Self {
		if is_dark { Theme::Dark } else { Theme::Light }
	}

	pub fn is_dark(self) -> bool {
		self == Theme::Dark
	}

	/// Color table used to tint particles under this theme.
	pub fn color_table(self) -> ColorTable {
		match self {
			Theme::Light => ColorTable::light(),
			Theme::Dark => ColorTable::dark(),
		}
	}

	/// Outline stroked around each disc, if any.
	///
	/// Pale dots disappear on a light page, so the light theme gets a faint
	/// darker rim. Dark backgrounds need none.
	pub fn halo(self, base: Color) -> Option<Color> {
		match self {
			Theme::Light => Some(base.darken(0.35).with_alpha(0.25)),
			Theme::Dark => None,
		}
	}
}

/// A base color with a symmetric per-channel jitter radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorEntry {
	/// Center color.
	pub base: Color,
	/// Largest per-channel offset from `base`.
	pub jitter: u8,
}

impl ColorEntry {
	/// Entry around `base` with `jitter` per channel.
	pub const fn new(base: Color, jitter: u8) -> Self {
		Self { base, jitter }
	}

	/// Sample a jittered color. Channels are clamped to `[0, 255]`.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Color {
		let j = self.jitter as i16;
		let mut channel = |c: u8| -> u8 {
			let offset = if j == 0 { 0 } else { rng.gen_range(-j..=j) };
			(c as i16 + offset).clamp(0, 255) as u8
		};
		Color::rgb(
			channel(self.base.r),
			channel(self.base.g),
			channel(self.base.b),
		)
	}

	/// Whether `color` lies within this entry's channel ranges.
	pub fn contains(&self, color: Color) -> bool {
		let within = |base: u8, c: u8| (base as i16 - c as i16).abs() <= self.jitter as i16;
		within(self.base.r, color.r) && within(self.base.g, color.g) && within(self.base.b, color.b)
	}
}

/// Semantic color lookup for one theme.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
	/// Theme this table belongs to.
	pub theme: Theme,
	/// Default particle color; also the fallback for unknown keys.
	pub primary: ColorEntry,
	/// `secondary` key.
	pub secondary: ColorEntry,
	/// `accent` key.
	pub accent: ColorEntry,
	/// `foreground` key.
	pub foreground: ColorEntry,
	/// `muted` key.
	pub muted: ColorEntry,
}

impl ColorTable {
	/// Saturated mid-tones that read well on a white page.
	pub fn light() -> Self {
		Self {
			theme: Theme::Light,
			primary: ColorEntry::new(Color::rgb(59, 130, 246), 18),   // Blue 500
			secondary: ColorEntry::new(Color::rgb(168, 85, 247), 18), // Purple 500
			accent: ColorEntry::new(Color::rgb(236, 72, 153), 18),    // Pink 500
			foreground: ColorEntry::new(Color::rgb(30, 41, 59), 10),  // Slate 800
			muted: ColorEntry::new(Color::rgb(100, 116, 139), 12),    // Slate 500
		}
	}

	/// Pale tints that glow on a dark page.
	pub fn dark() -> Self {
		Self {
			theme: Theme::Dark,
			primary: ColorEntry::new(Color::rgb(147, 197, 253), 18),   // Blue 300
			secondary: ColorEntry::new(Color::rgb(216, 180, 254), 18), // Purple 300
			accent: ColorEntry::new(Color::rgb(249, 168, 212), 18),    // Pink 300
			foreground: ColorEntry::new(Color::rgb(226, 232, 240), 10), // Slate 200
			muted: ColorEntry::new(Color::rgb(148, 163, 184), 12),     // Slate 400
		}
	}

	/// Look up a semantic key. Unknown keys fall back to `primary`.
	pub fn entry(&self, key: &str) -> &ColorEntry {
		match key.trim().to_ascii_lowercase().as_str() {
			"secondary" => &self.secondary,
			"accent" => &self.accent,
			"foreground" => &self.foreground,
			"muted" => &self.muted,
			_ => &self.primary,
		}
	}

	pub fn sample<R: Rng>(&self, key: &str, rng: &mut R) -> Color {
		self.entry(key).sample(rng)
	}
}

/// Snapshot of the document-level signals that mark the active theme.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemeMarkers {
	/// `<html>` carries class `dark`.
	pub root_has_dark_class: bool,
	/// `<body>` carries class `dark`.
	pub body_has_dark_class: bool,
	/// Value of `data-theme` on `<html>`, if any.
	pub root_data_theme: Option<String>,
	/// `(prefers-color-scheme: dark)` matches.
	pub prefers_dark: bool,
}

impl ThemeMarkers {
	/// Dark when any marker says so: a `dark` class on the root or body,
	/// `data-theme="dark"` on the root, or a system dark preference. Light
	/// markers never override a dark one.
	pub fn resolve(&self) -> Theme {
		Theme::from_dark(
			self.root_has_dark_class
				|| self.body_has_dark_class
				|| self.root_data_theme.as_deref() == Some("dark")
				|| self.prefers_dark,
		)
	}
}

/// Source of the current theme, injected into the renderer.
pub trait ThemeSource {
	/// The theme in effect right now.
	fn current_theme(&self) -> Theme;

	/// Stop delivering change notifications. Called on teardown.
	fn disconnect(&mut self) {}
}

/// A settable theme source shared between a host and a renderer.
#[derive(Clone, Debug)]
pub struct SharedTheme {
	theme: Rc<Cell<Theme>>,
	connected: Rc<Cell<bool>>,
}

impl SharedTheme {
	/// A connected source reporting `theme`.
	pub fn new(theme: Theme) -> Self {
		Self {
			theme: Rc::new(Cell::new(theme)),
			connected: Rc::new(Cell::new(true)),
		}
	}

	/// Change the reported theme. The renderer notices on `on_theme_change`.
	pub fn set(&self, theme: Theme) {
		self.theme.set(theme);
	}

	/// False once the renderer called `disconnect`.
	pub fn is_connected(&self) -> bool {
		self.connected.get()
	}
}

impl ThemeSource for SharedTheme {
	fn current_theme(&self) -> Theme {
		self.theme.get()
	}

	fn disconnect(&mut self) {
		self.connected.set(false);
	}
}
