//! Frame scheduling seam.
//!
//! In the browser a frame is requested with `requestAnimationFrame`; headless
//! hosts use [`ManualScheduler`] and call `tick` themselves.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Opaque id of a pending frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Requests and cancels "run before next repaint" callbacks.
pub trait FrameScheduler {
	/// Ask for one callback before the next repaint.
	fn request_frame(&mut self) -> FrameHandle;

	/// Cancel a pending request. Cancelling a handle that already fired is a
	/// no-op.
	fn cancel(&mut self, handle: FrameHandle);
}

/// Slot holding the per-frame callback. Filled by the host after the renderer
/// exists, emptied on unmount to break the callback/renderer cycle.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame`-backed scheduler.
pub struct AnimationFrameScheduler {
	callback: FrameCallback,
}

impl AnimationFrameScheduler {
	/// Requests run whatever closure `callback` holds at request time.
	pub fn new(callback: FrameCallback) -> Self {
		Self { callback }
	}
}

impl FrameScheduler for AnimationFrameScheduler {
	fn request_frame(&mut self) -> FrameHandle {
		let id = web_sys::window().and_then(|window| {
			self.callback.borrow().as_ref().and_then(|cb| {
				window
					.request_animation_frame(cb.as_ref().unchecked_ref())
					.ok()
			})
		});
		match id {
			Some(id) => FrameHandle(id),
			None => {
				warn!("particle-field: requestAnimationFrame unavailable");
				FrameHandle(0)
			}
		}
	}

	fn cancel(&mut self, handle: FrameHandle) {
		if handle.0 == 0 {
			return;
		}
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(handle.0);
		}
	}
}

/// Scheduler that only records requests. The owner decides when frames fire.
#[derive(Debug, Default)]
pub struct ManualScheduler {
	next_id: i32,
	pending: Vec<FrameHandle>,
	requested: usize,
	cancelled: usize,
}

impl ManualScheduler {
	/// A scheduler with nothing pending.
	pub fn new() -> Self {
		Self::default()
	}

	/// Pop the oldest pending request, as if the display refreshed.
	pub fn fire(&mut self) -> Option<FrameHandle> {
		if self.pending.is_empty() {
			None
		} else {
			Some(self.pending.remove(0))
		}
	}

	/// Requests not yet fired or cancelled, oldest first.
	pub fn pending(&self) -> &[FrameHandle] {
		&self.pending
	}

	/// Total requests ever made.
	pub fn requested(&self) -> usize {
		self.requested
	}

	/// Requests cancelled while still pending.
	pub fn cancelled(&self) -> usize {
		self.cancelled
	}
}

impl FrameScheduler for ManualScheduler {
	fn request_frame(&mut self) -> FrameHandle {
		self.next_id += 1;
		self.requested += 1;
		let handle = FrameHandle(self.next_id);
		self.pending.push(handle);
		handle
	}

	fn cancel(&mut self, handle: FrameHandle) {
		let before = self.pending.len();
		self.pending.retain(|h| *h != handle);
		if self.pending.len() != before {
			self.cancelled += 1;
		}
	}
}
