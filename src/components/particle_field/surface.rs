//! Drawing surface abstraction.
//!
//! The renderer only ever draws filled discs and stroked rings, so the
//! [`Surface`] trait is tiny. The browser implementation lives in `canvas.rs`.

use std::cell::RefCell;
use std::rc::Rc;

use super::theme::Color;

/// Logical viewport measured in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Width in CSS pixels.
	pub width: f64,
	/// Height in CSS pixels.
	pub height: f64,
	/// Device pixels per CSS pixel; always finite and positive.
	pub device_pixel_ratio: f64,
}

impl Viewport {
	/// Negative or non-finite sizes become 0; a bad pixel ratio becomes 1.
	pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
		let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
			device_pixel_ratio
		} else {
			1.0
		};
		Self {
			width: if width.is_finite() { width.max(0.0) } else { 0.0 },
			height: if height.is_finite() { height.max(0.0) } else { 0.0 },
			device_pixel_ratio: dpr,
		}
	}

	/// True when nothing can be drawn.
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	/// Backing-store size in device pixels.
	pub fn physical_size(&self) -> (u32, u32) {
		(
			(self.width * self.device_pixel_ratio).round() as u32,
			(self.height * self.device_pixel_ratio).round() as u32,
		)
	}
}

/// A filled circle, optionally with a soft glow of the same color.
#[derive(Clone, Debug, PartialEq)]
pub struct Disc {
	/// Center, in CSS pixels.
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	/// Fill color, alpha included.
	pub color: Color,
	/// Glow blur radius in CSS pixels (0 = none).
	pub glow: f64,
}

/// A stroked circle outline.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
	/// Center, in CSS pixels.
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	/// Stroke width in CSS pixels.
	pub line_width: f64,
	/// Stroke color, alpha included.
	pub color: Color,
}

/// A 2D target the particle field paints onto.
pub trait Surface {
	/// Measure the viewport the surface should cover.
	fn measure(&self) -> Viewport;

	/// Size the backing store for `viewport` and reset the transform so one
	/// drawing unit equals one CSS pixel.
	fn configure(&mut self, viewport: &Viewport);

	/// Clear the whole surface.
	fn clear(&mut self);

	/// Fill `disc`, with its glow when non-zero.
	fn fill_disc(&mut self, disc: &Disc);

	/// Stroke the outline of `ring`.
	fn stroke_ring(&mut self, ring: &Ring);
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	/// `configure` with this viewport.
	Configure(Viewport),
	/// `clear`.
	Clear,
	/// `fill_disc`.
	Fill(Disc),
	/// `stroke_ring`.
	Stroke(Ring),
}

/// Headless surface that logs every call. Clones share the same log, so a
/// host can keep one clone to inspect what the renderer drew.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
	viewport: Rc<RefCell<Viewport>>,
	log: Rc<RefCell<Vec<DrawCommand>>>,
}

impl RecordingSurface {
	/// A surface whose `measure` reports `viewport` until changed.
	pub fn new(viewport: Viewport) -> Self {
		Self {
			viewport: Rc::new(RefCell::new(viewport)),
			log: Rc::new(RefCell::new(Vec::new())),
		}
	}

	/// Change what the next `measure` reports, like a window resize.
	pub fn set_viewport(&self, viewport: Viewport) {
		*self.viewport.borrow_mut() = viewport;
	}

	/// Every call recorded since the log was last cleared.
	pub fn commands(&self) -> Vec<DrawCommand> {
		self.log.borrow().clone()
	}

	/// Number of recorded calls.
	pub fn len(&self) -> usize {
		self.log.borrow().len()
	}

	/// True when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.log.borrow().is_empty()
	}

	/// Forget recorded calls; the viewport is kept.
	pub fn clear_log(&self) {
		self.log.borrow_mut().clear();
	}

	/// Discs filled since the log was last cleared.
	pub fn discs(&self) -> Vec<Disc> {
		self.log
			.borrow()
			.iter()
			.filter_map(|c| match c {
				DrawCommand::Fill(d) => Some(d.clone()),
				_ => None,
			})
			.collect()
	}
}

impl Surface for RecordingSurface {
	fn measure(&self) -> Viewport {
		*self.viewport.borrow()
	}

	fn configure(&mut self, viewport: &Viewport) {
		self.log.borrow_mut().push(DrawCommand::Configure(*viewport));
	}

	fn clear(&mut self) {
		self.log.borrow_mut().push(DrawCommand::Clear);
	}

	fn fill_disc(&mut self, disc: &Disc) {
		self.log.borrow_mut().push(DrawCommand::Fill(disc.clone()));
	}

	fn stroke_ring(&mut self, ring: &Ring) {
		self.log.borrow_mut().push(DrawCommand::Stroke(ring.clone()));
	}
}
