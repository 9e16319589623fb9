//! Ambient particle field rendered behind page content.
//!
//! Paints a field of softly drifting, pulsing dots on a full-viewport canvas:
//! - Per-particle drift, opacity breathing and a short motion trail
//! - A shared size pulse driven by a global phase
//! - Light/dark color tables with automatic theme detection
//! - Full pool rebuild on resize and theme change
//!
//! The renderer core ([`ParticleField`]) talks to the outside world only
//! through the [`Surface`], [`FrameScheduler`] and [`ThemeSource`] traits, so
//! it runs unchanged in the browser or under a headless harness.
//!
//! # Example
//!
//! ```ignore
//! use particle_field::{ParticleBackground, ParticleFieldConfig};
//!
//! let config = ParticleFieldConfig { particle_count: 40, ..Default::default() };
//! view! { <ParticleBackground config=Signal::derive(move || config.clone()) /> }
//! ```
//!
//! Headless:
//!
//! ```ignore
//! let surface = RecordingSurface::new(Viewport::new(800.0, 600.0, 1.0));
//! let mut field = ParticleField::new(config, ManualScheduler::new(), SharedTheme::new(Theme::Dark));
//! field.initialize(surface.clone());
//! while field.scheduler_mut().fire().is_some() {
//!     field.tick(now);
//! }
//! ```

mod canvas;
mod component;
pub mod config;
pub mod frame;
mod observer;
pub mod particles;
mod render;
pub mod state;
pub mod surface;
pub mod theme;

pub use canvas::{CanvasSurface, Sizing};
pub use component::ParticleBackground;
pub use config::ParticleFieldConfig;
pub use frame::{AnimationFrameScheduler, FrameHandle, FrameScheduler, ManualScheduler};
pub use observer::{DocumentThemeObserver, read_markers};
pub use particles::{Particle, ParticlePool};
pub use state::{Lifecycle, ParticleField};
pub use surface::{Disc, DrawCommand, RecordingSurface, Ring, Surface, Viewport};
pub use theme::{Color, ColorTable, SharedTheme, Theme, ThemeMarkers, ThemeSource};
