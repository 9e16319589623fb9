//! particle-field: ambient particle background for web pages.
//!
//! This crate provides a WASM canvas component that paints a field of softly
//! drifting, pulsing dots behind page content, themed by light/dark mode.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::particle_field::{
	ParticleBackground, ParticleField, ParticleFieldConfig, RecordingSurface, Theme, Viewport,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("particle-field: logging initialized");
}

/// Load configuration from a script element with id="particle-config".
/// Expected format: JSON with camelCase keys, e.g. `{ "particleCount": 40 }`.
/// A missing element yields `None`; malformed JSON is logged and ignored.
fn load_config() -> Option<ParticleFieldConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("particle-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match ParticleFieldConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"particle-field: loaded config ({} particles, color {:?})",
				config.particle_count, config.particle_color
			);
			Some(config)
		}
		Err(e) => {
			warn!("particle-field: failed to parse config: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads configuration from the DOM and mounts the particle background.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config().unwrap_or_default();
	let config_signal = Signal::derive(move || config.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Particle Field" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<ParticleBackground config=config_signal fullscreen=true />
		<main class="hero">
			<h1>"Particle Field"</h1>
			<p class="subtitle">"Toggle the dark class on <html> to switch the palette."</p>
		</main>
	}
}
