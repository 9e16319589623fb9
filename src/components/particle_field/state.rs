//! The particle field renderer: lifecycle, frame loop and rebuild policy.
//!
//! A [`ParticleField`] owns its surface, its particle pool and at most one
//! pending frame request. Collaborators are injected: the [`Surface`] it
//! paints on, the [`FrameScheduler`] that drives `tick`, and the
//! [`ThemeSource`] it reads the color scheme from. None of them are reached
//! through global state, so the whole loop can be driven headlessly.
//!
//! ```text
//! Unmounted --initialize--> Initialized --tick--> Running
//!                                                  |  ^ tick / resize / set_theme
//!                                                  v  |
//! Unmounted <--------------teardown---------------- Running
//! ```
//!
//! Teardown is terminal: a torn-down field never initializes again.

use std::f64::consts::TAU;

use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::config::ParticleFieldConfig;
use super::frame::{FrameHandle, FrameScheduler};
use super::particles::{Particle, ParticlePool};
use super::render::{self, FrameStyle};
use super::surface::{Surface, Viewport};
use super::theme::{ColorTable, Theme, ThemeSource};

/// Longest elapsed time one tick integrates. Longer gaps (a backgrounded tab)
/// are treated as this much.
pub const MAX_FRAME_DELTA_MS: f64 = 50.0;

/// Duration of one reference frame; velocities are expressed per frame at 60fps.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Angular speed of the shared breathing pulse, in radians per second.
pub const PULSE_SPEED: f64 = 1.5;

/// Lifecycle of a [`ParticleField`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
	/// No surface bound, either before `initialize` or after `teardown`.
	Unmounted,
	/// Bound and built, first frame requested but not yet drawn.
	Initialized,
	/// At least one frame has been drawn.
	Running,
}

/// Looping particle animation bound to one drawing surface.
pub struct ParticleField<S, F, T> {
	config: ParticleFieldConfig,
	scheduler: F,
	theme_source: T,
	surface: Option<S>,
	pool: ParticlePool,
	theme: Theme,
	table: ColorTable,
	viewport: Viewport,
	rng: SmallRng,
	lifecycle: Lifecycle,
	retired: bool,
	pending_frame: Option<FrameHandle>,
	last_timestamp: Option<f64>,
	last_delta_ms: f64,
	phase: f64,
}

impl<S: Surface, F: FrameScheduler, T: ThemeSource> ParticleField<S, F, T> {
	/// Create an unmounted field. The config is normalized here.
	pub fn new(config: ParticleFieldConfig, scheduler: F, theme_source: T) -> Self {
		let config = config.normalize();
		let theme = config
			.theme
			.unwrap_or_else(|| theme_source.current_theme());

		Self {
			rng: SmallRng::seed_from_u64(config.seed.unwrap_or_default()),
			config,
			scheduler,
			theme_source,
			surface: None,
			pool: ParticlePool::default(),
			theme,
			table: theme.color_table(),
			viewport: Viewport::new(0.0, 0.0, 1.0),
			lifecycle: Lifecycle::Unmounted,
			retired: false,
			pending_frame: None,
			last_timestamp: None,
			last_delta_ms: 0.0,
			phase: 0.0,
		}
	}

	/// Bind to `surface`, build the pool and request the first frame.
	pub fn initialize(&mut self, surface: S) {
		if self.retired || self.lifecycle != Lifecycle::Unmounted {
			debug!("particle-field: initialize ignored in {:?}", self.lifecycle);
			return;
		}

		self.surface = Some(surface);
		self.lifecycle = Lifecycle::Initialized;
		self.apply_theme(self.resolved_theme());
		self.rebuild();
		self.schedule_next();

		debug!(
			"particle-field: initialized {} particles on {}x{} ({:?})",
			self.pool.len(),
			self.viewport.width,
			self.viewport.height,
			self.theme
		);
	}

	/// Advance and paint one frame, then request the next.
	pub fn tick(&mut self, timestamp_ms: f64) {
		if !self.is_live() {
			return;
		}
		// At most one request in flight, even when a host ticks by hand.
		if let Some(handle) = self.pending_frame.take() {
			self.scheduler.cancel(handle);
		}

		if let (Some(interval), Some(last)) = (self.config.frame_interval_ms(), self.last_timestamp) {
			if timestamp_ms - last < interval {
				self.schedule_next();
				return;
			}
		}

		let elapsed = match self.last_timestamp {
			Some(last) => clamp_delta(timestamp_ms - last),
			None => 0.0,
		};
		if timestamp_ms.is_finite() {
			self.last_timestamp = Some(timestamp_ms);
		}
		self.last_delta_ms = elapsed;
		self.phase = (self.phase + elapsed / 1000.0 * PULSE_SPEED) % TAU;
		self.lifecycle = Lifecycle::Running;

		let style = FrameStyle {
			phase: self.phase,
			pulse_amplitude: self.config.pulse_amplitude,
			glow_intensity: self.config.glow_intensity,
			theme: self.theme,
		};
		if let Some(surface) = self.surface.as_mut() {
			render::render(surface, &self.pool, &style);
		}
		self.pool.update(elapsed / FRAME_MS);

		self.schedule_next();
	}

	/// Re-measure the viewport and rebuild the pool from scratch.
	pub fn resize(&mut self) {
		if !self.is_live() {
			return;
		}
		if let Some(handle) = self.pending_frame.take() {
			self.scheduler.cancel(handle);
		}
		self.rebuild();
		self.schedule_next();

		debug!(
			"particle-field: resized to {}x{}",
			self.viewport.width, self.viewport.height
		);
	}

	/// Swap the color table and rebuild the pool. Ignored when the theme is
	/// forced by config or unchanged.
	pub fn set_theme(&mut self, theme: Theme) {
		if self.config.theme.is_some() || theme == self.theme {
			return;
		}
		self.apply_theme(theme);
		if self.is_live() {
			self.rebuild();
			self.schedule_next();
		}
		debug!("particle-field: theme changed to {:?}", theme);
	}

	/// Re-read the theme source after it signalled a change.
	pub fn on_theme_change(&mut self) {
		let theme = self.theme_source.current_theme();
		self.set_theme(theme);
	}

	/// Cancel the pending frame, detach the theme source and release the pool
	/// and surface. Terminal and idempotent.
	pub fn teardown(&mut self) {
		if self.retired {
			return;
		}
		if let Some(handle) = self.pending_frame.take() {
			self.scheduler.cancel(handle);
		}
		self.theme_source.disconnect();
		self.pool = ParticlePool::default();
		self.surface = None;
		self.lifecycle = Lifecycle::Unmounted;
		self.retired = true;
		debug!("particle-field: torn down");
	}

	/// Current lifecycle state.
	pub fn state(&self) -> Lifecycle {
		self.lifecycle
	}

	/// The live particle pool, empty when idle or torn down.
	pub fn particles(&self) -> &[Particle] {
		&self.pool.particles
	}

	/// Color table of the active theme.
	pub fn color_table(&self) -> &ColorTable {
		&self.table
	}

	/// The active theme.
	pub fn theme(&self) -> Theme {
		self.theme
	}

	/// Viewport measured by the last rebuild.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// The normalized configuration.
	pub fn config(&self) -> &ParticleFieldConfig {
		&self.config
	}

	/// Elapsed time integrated by the last drawn frame, after clamping.
	pub fn last_delta_ms(&self) -> f64 {
		self.last_delta_ms
	}

	/// Shared breathing phase in radians, kept within `[0, TAU)`.
	pub fn phase(&self) -> f64 {
		self.phase
	}

	/// True while a frame request is in flight.
	pub fn has_pending_frame(&self) -> bool {
		self.pending_frame.is_some()
	}

	/// The injected frame scheduler.
	pub fn scheduler(&self) -> &F {
		&self.scheduler
	}

	/// Mutable access to the scheduler, for hosts that fire frames by hand.
	pub fn scheduler_mut(&mut self) -> &mut F {
		&mut self.scheduler
	}

	fn is_live(&self) -> bool {
		matches!(self.lifecycle, Lifecycle::Initialized | Lifecycle::Running)
	}

	/// Nothing to animate: keep the surface clear and stop requesting frames.
	fn is_idle(&self) -> bool {
		self.pool.is_empty()
	}

	fn resolved_theme(&self) -> Theme {
		self.config
			.theme
			.unwrap_or_else(|| self.theme_source.current_theme())
	}

	fn apply_theme(&mut self, theme: Theme) {
		self.theme = theme;
		self.table = theme.color_table();
	}

	fn rebuild(&mut self) {
		let Some(surface) = self.surface.as_mut() else {
			return;
		};
		self.viewport = surface.measure();
		surface.configure(&self.viewport);
		self.pool = ParticlePool::new(&self.config, &self.table, &self.viewport, &mut self.rng);
	}

	fn schedule_next(&mut self) {
		if self.is_idle() || self.pending_frame.is_some() {
			return;
		}
		self.pending_frame = Some(self.scheduler.request_frame());
	}
}

fn clamp_delta(elapsed: f64) -> f64 {
	if elapsed.is_finite() {
		elapsed.clamp(0.0, MAX_FRAME_DELTA_MS)
	} else {
		0.0
	}
}

#[cfg(test)]
mod tests {
	use super::super::config::{MAX_RADIUS, MAX_SPEED};
	use super::super::frame::ManualScheduler;
	use super::super::surface::{DrawCommand, RecordingSurface};
	use super::super::theme::SharedTheme;
	use super::*;

	type HeadlessField = ParticleField<RecordingSurface, ManualScheduler, SharedTheme>;

	fn viewport() -> Viewport {
		Viewport::new(800.0, 600.0, 2.0)
	}

	fn field(config: ParticleFieldConfig, theme: &SharedTheme) -> (HeadlessField, RecordingSurface) {
		let config = ParticleFieldConfig {
			seed: Some(1234),
			..config
		};
		let surface = RecordingSurface::new(viewport());
		let recorded = surface.clone();
		let mut field = ParticleField::new(config, ManualScheduler::new(), theme.clone());
		field.initialize(surface);
		(field, recorded)
	}

	/// Fire pending frames like a display refresh, `step_ms` apart.
	fn run_frames(field: &mut HeadlessField, mut now: f64, frames: usize, step_ms: f64) -> f64 {
		for _ in 0..frames {
			if field.scheduler_mut().fire().is_none() {
				break;
			}
			field.tick(now);
			now += step_ms;
		}
		now
	}

	#[test]
	fn initialize_configures_surface_and_requests_frame() {
		let theme = SharedTheme::new(Theme::Dark);
		let (field, recorded) = field(ParticleFieldConfig::default(), &theme);

		assert_eq!(field.state(), Lifecycle::Initialized);
		assert_eq!(field.particles().len(), 50);
		assert_eq!(recorded.commands()[0], DrawCommand::Configure(viewport()));
		assert_eq!(field.scheduler().pending().len(), 1);
		assert_eq!(field.color_table(), &ColorTable::dark());
	}

	#[test]
	fn first_tick_moves_to_running_and_reschedules() {
		let theme = SharedTheme::new(Theme::Dark);
		let (mut field, _) = field(ParticleFieldConfig::default(), &theme);

		run_frames(&mut field, 0.0, 1, 16.0);
		assert_eq!(field.state(), Lifecycle::Running);
		assert_eq!(field.last_delta_ms(), 0.0);
		assert_eq!(field.scheduler().pending().len(), 1);
	}

	#[test]
	fn invariants_hold_over_many_frames() {
		let theme = SharedTheme::new(Theme::Light);
		let config = ParticleFieldConfig {
			particle_count: 40,
			speed: 30.0,
			..Default::default()
		};
		let (mut field, _) = field(config, &theme);
		let mut now = 0.0;

		for _ in 0..50 {
			now = run_frames(&mut field, now, 10, 37.0);
			for p in field.particles() {
				let b = p.size * 2.0;
				assert!(p.opacity >= 0.6 && p.opacity <= 0.9);
				assert!(p.x >= -b && p.x <= 800.0 + b);
				assert!(p.y >= -b && p.y <= 600.0 + b);
				assert!(p.size.is_finite() && p.size > 0.0);
			}
			assert!((0.0..TAU).contains(&field.phase()));
		}
	}

	#[test]
	fn delta_is_capped() {
		let theme = SharedTheme::new(Theme::Dark);
		let (mut field, _) = field(ParticleFieldConfig::default(), &theme);

		let mut now = 0.0;
		for _ in 0..5 {
			now = run_frames(&mut field, now, 1, 120.0);
			assert!(field.last_delta_ms() <= MAX_FRAME_DELTA_MS);
		}
		assert_eq!(field.last_delta_ms(), MAX_FRAME_DELTA_MS);

		// Clock going backwards integrates nothing.
		field.tick(now - 1000.0);
		assert_eq!(field.last_delta_ms(), 0.0);
	}

	#[test]
	fn zero_particles_clears_and_schedules_nothing() {
		let theme = SharedTheme::new(Theme::Dark);
		let config = ParticleFieldConfig {
			particle_count: 0,
			..Default::default()
		};
		let (mut field, recorded) = field(config, &theme);
		assert!(!field.has_pending_frame());

		recorded.clear_log();
		field.tick(16.0);
		assert_eq!(recorded.commands(), vec![DrawCommand::Clear]);
		assert!(field.scheduler().pending().is_empty());
	}

	#[test]
	fn inverted_size_bounds_produce_valid_radii() {
		let theme = SharedTheme::new(Theme::Dark);
		let config = ParticleFieldConfig {
			particle_count: 10,
			min_size: 5.0,
			max_size: 1.0,
			..Default::default()
		};
		let (field, _) = field(config, &theme);

		assert_eq!(field.particles().len(), 10);
		for p in field.particles() {
			assert!(p.size.is_finite());
			assert!((1.0..=5.0).contains(&p.size));
		}
	}

	#[test]
	fn extreme_speed_and_size_still_spawn() {
		let theme = SharedTheme::new(Theme::Dark);
		for json in [
			r#"{"speed": 1.7976931348623157e308}"#,
			r#"{"maxSize": 1.7976931348623157e308}"#,
			r#"{"minSize": 1.7976931348623157e308, "speed": 1e300}"#,
		] {
			let config = ParticleFieldConfig::from_json(json).expect("valid json");
			let (mut field, _) = field(config, &theme);
			assert_eq!(field.particles().len(), 50);

			run_frames(&mut field, 0.0, 5, 16.0);
			for p in field.particles() {
				assert!(p.size.is_finite() && p.size <= MAX_RADIUS);
				assert!(p.speed_x.abs() <= MAX_SPEED && p.speed_y.abs() <= MAX_SPEED);
				assert!(p.x.is_finite() && p.y.is_finite());
			}
		}
	}

	#[test]
	fn parent_resize_without_window_event_rebuilds() {
		let theme = SharedTheme::new(Theme::Light);
		let (mut field, recorded) = field(ParticleFieldConfig::default(), &theme);
		run_frames(&mut field, 0.0, 2, 16.0);

		// An element-size observer calls `resize` directly; the new size comes
		// from `measure`, not from the window.
		let shrunk = Viewport::new(120.0, 90.0, 2.0);
		recorded.set_viewport(shrunk);
		recorded.clear_log();
		field.resize();

		assert_eq!(field.viewport(), shrunk);
		assert_eq!(recorded.commands()[0], DrawCommand::Configure(shrunk));
		assert_eq!(field.scheduler().pending().len(), 1);
		for p in field.particles() {
			assert!(p.x <= 120.0 && p.y <= 90.0);
		}
	}

	#[test]
	fn resize_twice_is_stable() {
		let theme = SharedTheme::new(Theme::Dark);
		let (mut field, _) = field(ParticleFieldConfig::default(), &theme);

		field.resize();
		let (len, table) = (field.particles().len(), field.color_table().clone());
		field.resize();
		assert_eq!(field.particles().len(), len);
		assert_eq!(field.color_table(), &table);
		assert_eq!(field.viewport(), viewport());
	}

	#[test]
	fn resize_thrashing_keeps_one_pending_frame() {
		let theme = SharedTheme::new(Theme::Dark);
		let (mut field, recorded) = field(ParticleFieldConfig::default(), &theme);

		for i in 0..20 {
			recorded.set_viewport(Viewport::new(300.0 + i as f64, 200.0, 1.0));
			field.resize();
		}
		assert_eq!(field.scheduler().pending().len(), 1);
		assert_eq!(field.viewport().width, 319.0);
		for p in field.particles() {
			assert!(p.x <= 319.0 && p.y <= 200.0);
		}
	}

	#[test]
	fn resize_from_empty_viewport_starts_animation() {
		let theme = SharedTheme::new(Theme::Dark);
		let surface = RecordingSurface::new(Viewport::new(0.0, 0.0, 1.0));
		let recorded = surface.clone();
		let mut field: HeadlessField =
			ParticleField::new(ParticleFieldConfig::default(), ManualScheduler::new(), theme);
		field.initialize(surface);
		assert!(field.particles().is_empty());
		assert!(!field.has_pending_frame());

		recorded.set_viewport(viewport());
		field.resize();
		assert_eq!(field.particles().len(), 50);
		assert!(field.has_pending_frame());
	}

	#[test]
	fn theme_toggle_rebuilds_with_new_table() {
		let theme = SharedTheme::new(Theme::Light);
		let (mut field, _) = field(ParticleFieldConfig::default(), &theme);
		let light = ColorTable::light();
		assert!(field.particles().iter().all(|p| light.primary.contains(p.color)));

		theme.set(Theme::Dark);
		field.on_theme_change();

		let dark = ColorTable::dark();
		assert_eq!(field.theme(), Theme::Dark);
		assert_eq!(field.color_table(), &dark);
		assert_eq!(field.particles().len(), 50);
		assert!(field.particles().iter().all(|p| dark.primary.contains(p.color)));
	}

	#[test]
	fn forced_theme_ignores_source() {
		let theme = SharedTheme::new(Theme::Light);
		let config = ParticleFieldConfig {
			theme: Some(Theme::Dark),
			..Default::default()
		};
		let (mut field, _) = field(config, &theme);
		assert_eq!(field.theme(), Theme::Dark);

		theme.set(Theme::Light);
		field.on_theme_change();
		field.set_theme(Theme::Light);
		assert_eq!(field.color_table(), &ColorTable::dark());
	}

	#[test]
	fn frame_cap_skips_early_frames() {
		let theme = SharedTheme::new(Theme::Dark);
		let config = ParticleFieldConfig {
			max_fps: Some(30.0),
			..Default::default()
		};
		let (mut field, recorded) = field(config, &theme);

		field.tick(0.0);
		recorded.clear_log();
		field.tick(16.0);
		assert!(recorded.is_empty());
		assert_eq!(field.scheduler().pending().len(), 1);

		field.tick(34.0);
		assert_eq!(recorded.commands()[0], DrawCommand::Clear);
		assert_eq!(field.last_delta_ms(), 34.0);
	}

	#[test]
	fn teardown_stops_all_drawing() {
		let theme = SharedTheme::new(Theme::Dark);
		let (mut field, recorded) = field(ParticleFieldConfig::default(), &theme);
		let now = run_frames(&mut field, 0.0, 3, 16.0);
		assert!(field.has_pending_frame());

		field.teardown();
		assert_eq!(field.state(), Lifecycle::Unmounted);
		assert!(field.particles().is_empty());
		assert!(field.scheduler().pending().is_empty());
		assert!(!theme.is_connected());

		recorded.clear_log();
		assert_eq!(field.scheduler_mut().fire(), None);
		field.tick(now);
		field.resize();
		field.set_theme(Theme::Light);
		assert!(recorded.is_empty());
		assert!(!field.has_pending_frame());

		// Terminal: no re-initialization, teardown again is harmless.
		field.initialize(RecordingSurface::new(viewport()));
		assert_eq!(field.state(), Lifecycle::Unmounted);
		field.teardown();
	}
}
