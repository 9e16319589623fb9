//! Browser [`ThemeSource`] that watches the document for color-scheme changes.
//!
//! Two signals are observed: `class` / `data-theme` attribute mutations on
//! the root element and body, and `change` events on the
//! `(prefers-color-scheme: dark)` media query. Either one invokes the host's
//! callback, which is expected to call `ParticleField::on_theme_change`.

use log::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MediaQueryList, MutationObserver, MutationObserverInit};

use super::theme::{Theme, ThemeMarkers, ThemeSource};

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

/// Read the current theme markers from the live document.
pub fn read_markers() -> ThemeMarkers {
	let Some(window) = web_sys::window() else {
		return ThemeMarkers::default();
	};
	let document = window.document();
	let root = document.as_ref().and_then(|d| d.document_element());
	let body = document.as_ref().and_then(|d| d.body());

	ThemeMarkers {
		root_has_dark_class: root
			.as_ref()
			.is_some_and(|el| el.class_list().contains("dark")),
		body_has_dark_class: body
			.as_ref()
			.is_some_and(|el| el.class_list().contains("dark")),
		root_data_theme: root.as_ref().and_then(|el| el.get_attribute("data-theme")),
		prefers_dark: dark_query(&window).is_some_and(|mq| mq.matches()),
	}
}

fn dark_query(window: &web_sys::Window) -> Option<MediaQueryList> {
	window.match_media(DARK_QUERY).ok().flatten()
}

/// Theme source that tracks document markers and the system preference.
#[derive(Default)]
pub struct DocumentThemeObserver {
	observer: Option<MutationObserver>,
	media: Option<MediaQueryList>,
	on_mutation: Option<Closure<dyn FnMut()>>,
	on_media_change: Option<Closure<dyn FnMut()>>,
}

impl DocumentThemeObserver {
	/// Start observing. `on_change` runs after every relevant change; it may
	/// fire even when the resolved theme did not actually change.
	pub fn connect(on_change: impl Fn() + 'static) -> Self {
		let Some(window) = web_sys::window() else {
			return Self::default();
		};
		let on_change = std::rc::Rc::new(on_change);

		let notify = on_change.clone();
		let on_mutation = Closure::<dyn FnMut()>::new(move || (*notify)());
		let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref()).ok();

		if let (Some(observer), Some(document)) = (observer.as_ref(), window.document()) {
			let init = MutationObserverInit::new();
			init.set_attributes(true);
			let filter = js_sys::Array::of2(&"class".into(), &"data-theme".into());
			init.set_attribute_filter(&filter);

			if let Some(root) = document.document_element() {
				let _ = observer.observe_with_options(&root, &init);
			}
			if let Some(body) = document.body() {
				let _ = observer.observe_with_options(&body, &init);
			}
		}

		let media = dark_query(&window);
		let notify = on_change;
		let on_media_change = Closure::<dyn FnMut()>::new(move || (*notify)());
		if let Some(ref mq) = media {
			let _ = mq.add_event_listener_with_callback(
				"change",
				on_media_change.as_ref().unchecked_ref(),
			);
		}

		debug!("particle-field: theme observer connected");
		Self {
			observer,
			media,
			on_mutation: Some(on_mutation),
			on_media_change: Some(on_media_change),
		}
	}
}

impl ThemeSource for DocumentThemeObserver {
	fn current_theme(&self) -> Theme {
		read_markers().resolve()
	}

	fn disconnect(&mut self) {
		if let Some(observer) = self.observer.take() {
			observer.disconnect();
		}
		if let (Some(mq), Some(cb)) = (self.media.take(), self.on_media_change.as_ref()) {
			let _ = mq.remove_event_listener_with_callback("change", cb.as_ref().unchecked_ref());
		}
		self.on_mutation = None;
		self.on_media_change = None;
	}
}
