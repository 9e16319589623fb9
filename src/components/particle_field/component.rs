//! Leptos component mounting a particle field behind the page.
//!
//! The component creates a fixed, pointer-transparent canvas and wires the
//! browser collaborators into a [`ParticleField`]: a canvas surface, a
//! `requestAnimationFrame` scheduler, a document theme observer and a window
//! `resize` listener (plus a `ResizeObserver` on the parent element when the
//! canvas is parent-sized). Everything is released on unmount and whenever the
//! configuration signal changes.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, ResizeObserver, Window};

use super::canvas::{CanvasSurface, Sizing};
use super::config::ParticleFieldConfig;
use super::frame::{AnimationFrameScheduler, FrameCallback};
use super::observer::DocumentThemeObserver;
use super::state::ParticleField;

type BrowserField = ParticleField<CanvasSurface, AnimationFrameScheduler, DocumentThemeObserver>;
type SharedField = Rc<RefCell<Option<BrowserField>>>;

/// A running field plus the browser callbacks that keep it alive.
struct Mount {
	field: SharedField,
	frame_cb: FrameCallback,
	resize_cb: Option<Closure<dyn FnMut()>>,
	parent_observer: Option<ResizeObserver>,
}

impl Mount {
	fn start(canvas: HtmlCanvasElement, mut config: ParticleFieldConfig, sizing: Sizing) -> Option<Self> {
		let window: Window = web_sys::window()?;
		let parent = canvas.parent_element();
		let Some(surface) = CanvasSurface::new(canvas, sizing) else {
			warn!("particle-field: 2d context unavailable, rendering nothing");
			return None;
		};
		config.seed.get_or_insert_with(random_seed);

		let field: SharedField = Rc::new(RefCell::new(None));
		let frame_cb: FrameCallback = Rc::new(RefCell::new(None));

		let field_theme = field.clone();
		let observer = DocumentThemeObserver::connect(move || {
			if let Ok(mut slot) = field_theme.try_borrow_mut() {
				if let Some(f) = slot.as_mut() {
					f.on_theme_change();
				}
			}
		});
		let scheduler = AnimationFrameScheduler::new(frame_cb.clone());
		*field.borrow_mut() = Some(ParticleField::new(config, scheduler, observer));

		let field_frame = field.clone();
		*frame_cb.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			if let Ok(mut slot) = field_frame.try_borrow_mut() {
				if let Some(f) = slot.as_mut() {
					f.tick(timestamp);
				}
			}
		}));

		let field_resize = field.clone();
		let resize_cb: Closure<dyn FnMut()> = Closure::new(move || {
			if let Ok(mut slot) = field_resize.try_borrow_mut() {
				if let Some(f) = slot.as_mut() {
					f.resize();
				}
			}
		});
		let _ = window.add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref());

		// The parent can change size without the window doing so.
		let parent_observer = match (sizing, parent) {
			(Sizing::Parent, Some(parent)) => {
				let observer = ResizeObserver::new(resize_cb.as_ref().unchecked_ref()).ok();
				if let Some(ref observer) = observer {
					observer.observe(&parent);
				}
				observer
			}
			_ => None,
		};

		if let Some(f) = field.borrow_mut().as_mut() {
			f.initialize(surface);
		}

		Some(Self {
			field,
			frame_cb,
			resize_cb: Some(resize_cb),
			parent_observer,
		})
	}

	fn stop(mut self) {
		if let Some(f) = self.field.borrow_mut().as_mut() {
			f.teardown();
		}
		if let Some(observer) = self.parent_observer.take() {
			observer.disconnect();
		}
		if let (Some(window), Some(cb)) = (web_sys::window(), self.resize_cb.take()) {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		// Break the field <-> frame callback cycle.
		*self.frame_cb.borrow_mut() = None;
		*self.field.borrow_mut() = None;
		debug!("particle-field: unmounted");
	}
}

fn random_seed() -> u64 {
	let hi = (js_sys::Math::random() * u32::MAX as f64) as u64;
	let lo = (js_sys::Math::random() * u32::MAX as f64) as u64;
	(hi << 32) | lo
}

/// Renders a drifting particle field on a canvas behind all other content.
///
/// With `fullscreen` (the default) the canvas is fixed to the viewport and
/// tracks window resizes; otherwise it fills its parent element and also
/// follows that element's own size changes. The canvas
/// never intercepts pointer events. A change to `config` tears the running
/// field down and starts a fresh one.
#[component]
pub fn ParticleBackground(
	#[prop(into)] config: Signal<ParticleFieldConfig>,
	#[prop(default = true)] fullscreen: bool,
	#[prop(optional, into)] class: String,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let mount: Rc<RefCell<Option<Mount>>> = Rc::new(RefCell::new(None));
	let sizing = if fullscreen {
		Sizing::Viewport
	} else {
		Sizing::Parent
	};

	let mount_effect = mount.clone();
	Effect::new(move |_| {
		let config = config.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		let previous = mount_effect.borrow_mut().take();
		if let Some(previous) = previous {
			previous.stop();
		}
		*mount_effect.borrow_mut() = Mount::start(canvas, config, sizing);
	});

	let mount_cleanup = StoredValue::new_local(mount);
	on_cleanup(move || {
		let _ = mount_cleanup.try_with_value(|mount| {
			let current = mount.borrow_mut().take();
			if let Some(current) = current {
				current.stop();
			}
		});
	});

	let position = if fullscreen { "fixed" } else { "absolute" };
	view! {
		<canvas
			node_ref=canvas_ref
			class=format!("particle-background {class}")
			aria-hidden="true"
			style=format!("position: {position}; inset: 0; z-index: -3; pointer-events: none; display: block;")
		/>
	}
}
