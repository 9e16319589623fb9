//! Browser [`Surface`] backed by an HTML canvas 2D context.

use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::surface::{Disc, Ring, Surface, Viewport};

/// What the canvas should cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sizing {
	/// The full browser viewport.
	Viewport,
	/// The canvas' parent element.
	Parent,
}

/// Canvas surface that draws in CSS pixels on a device-pixel backing store.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	sizing: Sizing,
	viewport: Viewport,
}

impl CanvasSurface {
	/// Returns `None` when the canvas cannot produce a 2D context.
	pub fn new(canvas: HtmlCanvasElement, sizing: Sizing) -> Option<Self> {
		let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
		Some(Self {
			canvas,
			ctx,
			sizing,
			viewport: Viewport::new(0.0, 0.0, 1.0),
		})
	}
}

impl Surface for CanvasSurface {
	fn measure(&self) -> Viewport {
		let Some(window) = web_sys::window() else {
			return Viewport::new(0.0, 0.0, 1.0);
		};
		let dpr = window.device_pixel_ratio();

		let (w, h) = match self.sizing {
			Sizing::Viewport => (
				window
					.inner_width()
					.ok()
					.and_then(|v| v.as_f64())
					.unwrap_or(0.0),
				window
					.inner_height()
					.ok()
					.and_then(|v| v.as_f64())
					.unwrap_or(0.0),
			),
			Sizing::Parent => self
				.canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.unwrap_or((0.0, 0.0)),
		};
		Viewport::new(w, h, dpr)
	}

	fn configure(&mut self, viewport: &Viewport) {
		let (pw, ph) = viewport.physical_size();
		self.canvas.set_width(pw);
		self.canvas.set_height(ph);

		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{}px", viewport.width));
		let _ = style.set_property("height", &format!("{}px", viewport.height));

		// Absolute, not cumulative: repeated resizes must not compound the scale.
		let dpr = viewport.device_pixel_ratio;
		let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
		self.viewport = *viewport;
	}

	fn clear(&mut self) {
		self.ctx
			.clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
	}

	fn fill_disc(&mut self, disc: &Disc) {
		let css = disc.color.to_css();
		if disc.glow > 0.0 {
			self.ctx.set_shadow_blur(disc.glow);
			self.ctx.set_shadow_color(&css);
		}

		self.ctx.set_fill_style_str(&css);
		self.ctx.begin_path();
		let _ = self.ctx.arc(disc.x, disc.y, disc.radius, 0.0, PI * 2.0);
		self.ctx.fill();

		if disc.glow > 0.0 {
			self.ctx.set_shadow_blur(0.0);
		}
	}

	fn stroke_ring(&mut self, ring: &Ring) {
		self.ctx.set_stroke_style_str(&ring.color.to_css());
		self.ctx.set_line_width(ring.line_width);
		self.ctx.begin_path();
		let _ = self.ctx.arc(ring.x, ring.y, ring.radius, 0.0, PI * 2.0);
		self.ctx.stroke();
	}
}
