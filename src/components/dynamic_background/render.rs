//! Painting the node network.
//!
//! Drawing goes through the [`DrawingSurface`] trait so the frame logic does
//! not depend on a browser. [`CanvasSurface`] is the `<canvas>` implementation.
//! Each frame paints links first, then nodes on top.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::network::{Link, NodeGraph, Viewport};
use super::theme::{Color, NetworkStyle};

/// Backing-store size for a surface covering `css` pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
	pub css: Viewport,
	/// Device pixel ratio, capped from above. Zoomed-out pages keep their
	/// fractional ratio.
	pub pixel_ratio: f64,
}

impl SurfaceSize {
	pub fn new(css: Viewport, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
		let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
			device_pixel_ratio
		} else {
			1.0
		};
		let pixel_ratio = if max_pixel_ratio > 0.0 {
			ratio.min(max_pixel_ratio)
		} else {
			ratio
		};
		Self { css, pixel_ratio }
	}

	/// Current window size and pixel ratio, if running in a browser.
	pub fn of_window(max_pixel_ratio: f64) -> Option<Self> {
		let window = web_sys::window()?;
		let css = Viewport::of_window()?;
		Some(Self::new(css, window.device_pixel_ratio(), max_pixel_ratio))
	}

	pub fn pixel_width(&self) -> u32 {
		(self.css.width * self.pixel_ratio).round().max(0.0) as u32
	}

	pub fn pixel_height(&self) -> u32 {
		(self.css.height * self.pixel_ratio).round().max(0.0) as u32
	}
}

/// Something the renderer can paint on. Coordinates are CSS pixels.
pub trait DrawingSurface {
	fn resize(&mut self, size: SurfaceSize);
	fn clear(&mut self, area: Viewport);
	fn stroke_line(&mut self, link: &Link, color: Color, width: f64);
	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color, alpha: f64);
	/// Restores any per-frame drawing state.
	fn end_frame(&mut self) {}
	/// Frees the backing store; nothing is drawn afterwards.
	fn release(&mut self);
}

/// Paints links and nodes for the current node positions.
pub fn draw_network(
	graph: &NodeGraph,
	surface: &mut impl DrawingSurface,
	style: &NetworkStyle,
	connection_distance: f64,
) {
	for link in graph.links(connection_distance, style.line_alpha) {
		surface.stroke_line(&link, style.line_color, style.line_width);
	}

	for node in graph.nodes() {
		surface.fill_circle(
			node.x,
			node.y,
			style.node_radius,
			style.node_color,
			style.node_alpha,
		);
	}

	surface.end_frame();
}

/// A `<canvas>` element with its 2D context.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	/// `None` when the browser cannot provide a 2D context.
	pub fn acquire(canvas: HtmlCanvasElement) -> Option<Self> {
		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()?
			.dyn_into::<CanvasRenderingContext2d>()
			.ok()?;
		Some(Self { canvas, ctx })
	}
}

impl DrawingSurface for CanvasSurface {
	fn resize(&mut self, size: SurfaceSize) {
		self.canvas.set_width(size.pixel_width());
		self.canvas.set_height(size.pixel_height());
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{}px", size.css.width));
		let _ = style.set_property("height", &format!("{}px", size.css.height));
		// Resizing resets the context, so the transform is set absolutely.
		let r = size.pixel_ratio;
		let _ = self.ctx.set_transform(r, 0.0, 0.0, r, 0.0, 0.0);
	}

	fn clear(&mut self, area: Viewport) {
		self.ctx.clear_rect(0.0, 0.0, area.width, area.height);
	}

	fn stroke_line(&mut self, link: &Link, color: Color, width: f64) {
		self.ctx.set_global_alpha(link.alpha);
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(link.from.0, link.from.1);
		self.ctx.line_to(link.to.0, link.to.1);
		self.ctx.stroke();
	}

	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Color, alpha: f64) {
		self.ctx.set_global_alpha(alpha);
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, TAU);
		self.ctx.fill();
	}

	fn end_frame(&mut self) {
		self.ctx.set_global_alpha(1.0);
	}

	fn release(&mut self) {
		self.canvas.set_width(0);
		self.canvas.set_height(0);
	}
}
