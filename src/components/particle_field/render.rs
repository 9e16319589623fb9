//! Per-frame drawing of the particle pool.
//!
//! Each particle is painted in up to three layers, back to front:
//! 1. A faint halo ring (light theme only)
//! 2. The main disc, breathing with the shared pulse
//! 3. A smaller, fainter trail dot at the previous position

use super::particles::{Particle, ParticlePool};
use super::surface::{Disc, Ring, Surface};
use super::theme::Theme;

/// Movement below this many pixels per frame draws no trail.
pub const TRAIL_THRESHOLD: f64 = 0.1;
const TRAIL_RADIUS: f64 = 0.6;
const TRAIL_OPACITY: f64 = 0.3;
const HALO_OFFSET: f64 = 0.5;
const HALO_WIDTH: f64 = 0.75;

/// Frame-wide drawing parameters.
#[derive(Clone, Copy, Debug)]
pub struct FrameStyle {
	/// Shared breathing phase in `[0, 2π)`.
	pub phase: f64,
	/// Radius swing of the pulse, as a fraction of the base size.
	pub pulse_amplitude: f64,
	/// Glow blur per pixel of radius.
	pub glow_intensity: f64,
	/// Selects the halo.
	pub theme: Theme,
}

impl FrameStyle {
	/// Instantaneous size multiplier for a particle.
	pub fn pulse(&self, particle: &Particle) -> f64 {
		1.0 + self.pulse_amplitude * (self.phase + particle.pulse_offset).sin()
	}
}

/// Clear the surface and paint every particle.
pub fn render<S: Surface>(surface: &mut S, pool: &ParticlePool, style: &FrameStyle) {
	surface.clear();

	for p in &pool.particles {
		draw_particle(surface, p, style);
	}
}

fn draw_particle<S: Surface>(surface: &mut S, p: &Particle, style: &FrameStyle) {
	let radius = p.size * style.pulse(p);
	let color = p.color.with_alpha(p.opacity);

	if let Some(halo) = style.theme.halo(p.color) {
		surface.stroke_ring(&Ring {
			x: p.x,
			y: p.y,
			radius: radius + HALO_OFFSET,
			line_width: HALO_WIDTH,
			color: halo.with_alpha(halo.a * p.opacity),
		});
	}

	surface.fill_disc(&Disc {
		x: p.x,
		y: p.y,
		radius,
		color,
		glow: radius * style.glow_intensity,
	});

	if p.travelled() > TRAIL_THRESHOLD {
		surface.fill_disc(&Disc {
			x: p.prev_x,
			y: p.prev_y,
			radius: radius * TRAIL_RADIUS,
			color: color.with_alpha(p.opacity * TRAIL_OPACITY),
			glow: 0.0,
		});
	}
}
