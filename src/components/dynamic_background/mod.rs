//! Animated page background.
//!
//! Renders a fixed layer behind the page content with:
//! - A canvas network of slowly drifting nodes, linked when close together
//! - Soft particles floating on CSS keyframes
//! - A glow that follows the pointer and dims when it stops
//! - Gradient washes, an ambient light sweep and two breathing accent orbs
//!
//! Small screens, mobile user agents and `prefers-reduced-motion` get a static
//! gradient instead. The animation pauses while the tab is hidden or the
//! background is scrolled out of view.
//!
//! # Example
//!
//! ```ignore
//! use dyn_backdrop::{BackgroundConfig, DynamicBackground};
//!
//! let config = BackgroundConfig { seed: Some(7), ..Default::default() };
//! view! { <DynamicBackground config=config /> }
//! ```

mod cleanup;
mod component;
pub mod config;
mod engine;
pub mod gate;
mod network;
pub mod particles;
mod pointer;
mod render;
pub mod theme;
mod timing;

pub use component::DynamicBackground;
pub use config::{BackgroundConfig, Tunables};
pub use gate::{DeviceClass, DeviceProfile, RenderMode};
pub use theme::{Color, NetworkStyle, Palette, Theme};
