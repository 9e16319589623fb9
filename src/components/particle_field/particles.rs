//! The particle pool: spawning, motion, opacity breathing and edge wrapping.

use std::f64::consts::TAU;

use rand::Rng;

use super::config::ParticleFieldConfig;
use super::surface::Viewport;
use super::theme::{Color, ColorTable};

/// Largest per-frame opacity change, in a 60fps-normalized frame.
pub const MAX_OPACITY_SPEED: f64 = 0.005;

/// A single floating particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	/// Center, in CSS pixels.
	pub x: f64,
	pub y: f64,
	/// Position at the previous drawn frame, for the trail dot.
	pub prev_x: f64,
	pub prev_y: f64,
	/// Base radius before the breathing pulse.
	pub size: f64,
	/// Velocity in CSS pixels per reference frame.
	pub speed_x: f64,
	pub speed_y: f64,
	pub opacity: f64,
	/// Signed opacity change per reference frame; flips at the band edges.
	pub opacity_speed: f64,
	pub color: Color,
	pub pulse_offset: f64, // Phase in [0, 2π)
}

impl Particle {
	fn spawn<R: Rng>(
		config: &ParticleFieldConfig,
		table: &ColorTable,
		viewport: &Viewport,
		rng: &mut R,
	) -> Self {
		let x = rng.gen_range(0.0..=viewport.width);
		let y = rng.gen_range(0.0..=viewport.height);
		let half_speed = config.speed / 2.0;

		Self {
			x,
			y,
			prev_x: x,
			prev_y: y,
			size: rng.gen_range(config.min_size..=config.max_size),
			speed_x: rng.gen_range(-half_speed..=half_speed),
			speed_y: rng.gen_range(-half_speed..=half_speed),
			opacity: rng.gen_range(config.min_opacity..=config.max_opacity),
			opacity_speed: rng.gen_range(-MAX_OPACITY_SPEED..=MAX_OPACITY_SPEED),
			color: table.sample(&config.particle_color, rng),
			pulse_offset: rng.gen_range(0.0..TAU),
		}
	}

	/// Off-screen margin before a particle wraps to the opposite edge.
	pub fn buffer(&self) -> f64 {
		self.size * 2.0
	}

	/// Distance travelled since the previous drawn frame.
	pub fn travelled(&self) -> f64 {
		(self.x - self.prev_x).hypot(self.y - self.prev_y)
	}

	/// Advance by `step` 60fps-frames.
	fn advance(&mut self, step: f64, width: f64, height: f64, opacity_band: (f64, f64)) {
		self.prev_x = self.x;
		self.prev_y = self.y;

		self.x += self.speed_x * step;
		self.y += self.speed_y * step;

		let (min_opacity, max_opacity) = opacity_band;
		self.opacity += self.opacity_speed * step;
		if self.opacity <= min_opacity {
			self.opacity = min_opacity;
			self.opacity_speed = self.opacity_speed.abs();
		} else if self.opacity >= max_opacity {
			self.opacity = max_opacity;
			self.opacity_speed = -self.opacity_speed.abs();
		}

		if self.wrap(width, height) {
			// Don't draw a trail across the whole viewport.
			self.prev_x = self.x;
			self.prev_y = self.y;
		}
	}

	/// Returns true if the particle jumped to the opposite edge.
	fn wrap(&mut self, width: f64, height: f64) -> bool {
		let buffer = self.buffer();
		let mut wrapped = false;

		if self.x < -buffer {
			self.x = width + buffer;
			wrapped = true;
		} else if self.x > width + buffer {
			self.x = -buffer;
			wrapped = true;
		}
		if self.y < -buffer {
			self.y = height + buffer;
			wrapped = true;
		} else if self.y > height + buffer {
			self.y = -buffer;
			wrapped = true;
		}

		wrapped
	}
}

/// Fixed-size set of particles covering one viewport.
///
/// Rebuilt wholesale on resize and theme change; no particle outlives either.
#[derive(Clone, Debug, Default)]
pub struct ParticlePool {
	/// Live particles, in draw order.
	pub particles: Vec<Particle>,
	width: f64,
	height: f64,
	opacity_band: (f64, f64),
}

impl ParticlePool {
	/// Spawn `config.particle_count` particles. An empty viewport gets an
	/// empty pool. `config` must already be normalized.
	pub fn new<R: Rng>(
		config: &ParticleFieldConfig,
		table: &ColorTable,
		viewport: &Viewport,
		rng: &mut R,
	) -> Self {
		let count = if viewport.is_empty() {
			0
		} else {
			config.particle_count
		};
		let particles = (0..count)
			.map(|_| Particle::spawn(config, table, viewport, rng))
			.collect();

		Self {
			particles,
			width: viewport.width,
			height: viewport.height,
			opacity_band: (config.min_opacity, config.max_opacity),
		}
	}

	/// Number of live particles.
	pub fn len(&self) -> usize {
		self.particles.len()
	}

	/// True when there is nothing to animate.
	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	/// Advance every particle by `step` 60fps-frames.
	pub fn update(&mut self, step: f64) {
		for p in &mut self.particles {
			p.advance(step, self.width, self.height, self.opacity_band);
		}
	}
}
