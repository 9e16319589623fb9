//! Declarative configuration for the particle field.

use serde::Deserialize;

use super::theme::Theme;

/// Upper bound on pool size. Background effects stay in the tens of particles.
pub const MAX_PARTICLE_COUNT: usize = 1000;

/// Smallest radius a particle may have after normalization.
pub const MIN_RADIUS: f64 = 0.1;

/// Largest radius a particle may have after normalization.
pub const MAX_RADIUS: f64 = 100.0;

/// Largest drift speed, in CSS pixels per reference frame.
pub const MAX_SPEED: f64 = 100.0;

/// Largest allowed breathing amplitude; keeps the size multiplier positive.
pub const MAX_PULSE_AMPLITUDE: f64 = 0.9;

/// Configuration for a particle field. Every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleFieldConfig {
	/// Number of particles in the pool.
	pub particle_count: usize,
	/// Semantic color key looked up in the active theme's color table.
	pub particle_color: String,
	/// Minimum particle radius in CSS pixels.
	pub min_size: f64,
	/// Maximum particle radius in CSS pixels.
	pub max_size: f64,
	/// Velocity scalar. Per-axis speed is sampled from `[-speed/2, speed/2]`.
	pub speed: f64,
	/// Glow blur factor relative to the particle radius (0 disables glow).
	pub glow_intensity: f64,
	/// Lower edge of the opacity band.
	pub min_opacity: f64,
	/// Upper edge of the opacity band.
	pub max_opacity: f64,
	/// Amplitude of the shared breathing pulse.
	pub pulse_amplitude: f64,
	/// Optional frame-rate cap. Frames arriving faster are skipped.
	pub max_fps: Option<f64>,
	/// Forced theme. `None` follows the injected theme source.
	pub theme: Option<Theme>,
	/// RNG seed. `None` picks a fresh seed per mount.
	pub seed: Option<u64>,
}

impl Default for ParticleFieldConfig {
	fn default() -> Self {
		Self {
			particle_count: 50,
			particle_color: "primary".to_string(),
			min_size: 1.0,
			max_size: 3.0,
			speed: 1.0,
			glow_intensity: 0.5,
			min_opacity: 0.6,
			max_opacity: 0.9,
			pulse_amplitude: 0.15,
			max_fps: None,
			theme: None,
			seed: None,
		}
	}
}

impl ParticleFieldConfig {
	/// Parse a JSON config. Missing fields take their defaults.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Repair out-of-range values instead of rejecting them.
	///
	/// Inverted bounds are swapped, non-finite values fall back to defaults and
	/// everything else is clamped into a drawable range.
	pub fn normalize(mut self) -> Self {
		let defaults = Self::default();

		self.particle_count = self.particle_count.min(MAX_PARTICLE_COUNT);

		let (min_size, max_size) = ordered(
			finite_or(self.min_size, defaults.min_size),
			finite_or(self.max_size, defaults.max_size),
		);
		self.min_size = min_size.clamp(MIN_RADIUS, MAX_RADIUS);
		self.max_size = max_size.clamp(self.min_size, MAX_RADIUS);

		self.speed = finite_or(self.speed, defaults.speed).clamp(0.0, MAX_SPEED);
		self.glow_intensity = finite_or(self.glow_intensity, defaults.glow_intensity).max(0.0);

		let (min_opacity, max_opacity) = ordered(
			finite_or(self.min_opacity, defaults.min_opacity).clamp(0.0, 1.0),
			finite_or(self.max_opacity, defaults.max_opacity).clamp(0.0, 1.0),
		);
		self.min_opacity = min_opacity;
		self.max_opacity = max_opacity;

		self.pulse_amplitude =
			finite_or(self.pulse_amplitude, defaults.pulse_amplitude).clamp(0.0, MAX_PULSE_AMPLITUDE);

		self.max_fps = self.max_fps.filter(|fps| fps.is_finite() && *fps > 0.0);

		if self.particle_color.trim().is_empty() {
			self.particle_color = defaults.particle_color;
		}

		self
	}

	/// Minimum time between drawn frames when a frame-rate cap is set.
	pub fn frame_interval_ms(&self) -> Option<f64> {
		self.max_fps.map(|fps| 1000.0 / fps)
	}
}

fn finite_or(value: f64, fallback: f64) -> f64 {
	if value.is_finite() { value } else { fallback }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
	if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_json_yields_defaults() {
		let config = ParticleFieldConfig::from_json("{}").unwrap();
		assert_eq!(config, ParticleFieldConfig::default());
	}

	#[test]
	fn camel_case_fields_are_read() {
		let config = ParticleFieldConfig::from_json(
			r#"{ "particleCount": 12, "particleColor": "accent", "maxFps": 30, "theme": "dark", "seed": 7 }"#,
		)
		.unwrap();
		assert_eq!(config.particle_count, 12);
		assert_eq!(config.particle_color, "accent");
		assert_eq!(config.max_fps, Some(30.0));
		assert_eq!(config.theme, Some(Theme::Dark));
		assert_eq!(config.seed, Some(7));
		assert_eq!(config.min_size, 1.0);
	}

	#[test]
	fn negative_count_is_rejected_by_parser() {
		assert!(ParticleFieldConfig::from_json(r#"{ "particleCount": -3 }"#).is_err());
	}

	#[test]
	fn inverted_size_bounds_are_swapped() {
		let config = ParticleFieldConfig {
			min_size: 5.0,
			max_size: 1.0,
			..Default::default()
		}
		.normalize();
		assert_eq!(config.min_size, 1.0);
		assert_eq!(config.max_size, 5.0);
	}

	#[test]
	fn degenerate_values_are_clamped() {
		let config = ParticleFieldConfig {
			particle_count: 1_000_000,
			particle_color: "  ".to_string(),
			min_size: -4.0,
			max_size: f64::NAN,
			speed: -2.0,
			glow_intensity: f64::INFINITY,
			min_opacity: 1.5,
			max_opacity: -0.2,
			pulse_amplitude: 3.0,
			max_fps: Some(0.0),
			..Default::default()
		}
		.normalize();

		assert_eq!(config.particle_count, MAX_PARTICLE_COUNT);
		assert_eq!(config.particle_color, "primary");
		assert_eq!(config.min_size, MIN_RADIUS);
		assert_eq!(config.max_size, 3.0);
		assert_eq!(config.speed, 0.0);
		assert_eq!(config.glow_intensity, 0.5);
		assert_eq!((config.min_opacity, config.max_opacity), (0.0, 1.0));
		assert_eq!(config.pulse_amplitude, MAX_PULSE_AMPLITUDE);
		assert_eq!(config.max_fps, None);

		let config = ParticleFieldConfig {
			min_size: f64::MAX,
			max_size: f64::MAX,
			speed: f64::MAX,
			..Default::default()
		}
		.normalize();

		assert_eq!((config.min_size, config.max_size), (MAX_RADIUS, MAX_RADIUS));
		assert_eq!(config.speed, MAX_SPEED);
	}

	#[test]
	fn frame_interval_follows_fps_cap() {
		let config = ParticleFieldConfig {
			max_fps: Some(50.0),
			..Default::default()
		};
		assert_eq!(config.frame_interval_ms(), Some(20.0));
		assert_eq!(ParticleFieldConfig::default().frame_interval_ms(), None);
	}
}
