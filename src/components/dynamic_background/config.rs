//! Tunables for the background, grouped by device tier.
//!
//! Every field has a default, so a host page can override only what it needs:
//!
//! ```json
//! { "desktop": { "node_count": 8, "connection_distance": 120 }, "seed": 7 }
//! ```

use log::warn;
use serde::Deserialize;

use super::gate::DeviceClass;
use super::theme::Theme;

/// Most particles a tier may ask for.
pub const MAX_PARTICLES: usize = 32;
/// Most nodes a tier may ask for; links come from an O(n²) pair scan.
pub const MAX_NODES: usize = 15;

fn count_within(value: usize, max: usize, scope: &str, field: &str) -> usize {
	let clamped = value.clamp(1, max);
	if clamped != value {
		warn!("dyn-backdrop: {scope}.{field} = {value} out of 1..={max}, using {clamped}");
	}
	clamped
}

fn positive_or(value: f64, fallback: f64, scope: &str, field: &str) -> f64 {
	if value.is_finite() && value > 0.0 {
		value
	} else {
		warn!("dyn-backdrop: {scope}.{field} = {value} is not positive, using {fallback}");
		fallback
	}
}

/// Per-tier counts, distances and rates.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tunables {
	/// Number of DOM particles in the field.
	pub particle_count: usize,
	/// Number of simulated canvas nodes.
	pub node_count: usize,
	/// Pixel distance below which two nodes are joined by a line.
	pub connection_distance: f64,
	/// Minimum milliseconds between drawn frames.
	pub frame_interval_ms: f64,
	/// Minimum milliseconds between accepted pointer samples.
	pub pointer_throttle_ms: f64,
}

impl Tunables {
	/// Defaults for wide desktop viewports.
	pub fn desktop() -> Self {
		Self {
			particle_count: 8,
			node_count: 6,
			connection_distance: 100.0,
			frame_interval_ms: 16.0,
			pointer_throttle_ms: 16.0,
		}
	}

	/// Lighter defaults for viewports below the compact breakpoint.
	pub fn compact() -> Self {
		Self {
			particle_count: 3,
			node_count: 3,
			connection_distance: 80.0,
			frame_interval_ms: 100.0,
			pointer_throttle_ms: 100.0,
		}
	}
}

impl Tunables {
	fn sanitized(self, defaults: &Tunables, scope: &str) -> Self {
		Self {
			particle_count: count_within(self.particle_count, MAX_PARTICLES, scope, "particle_count"),
			node_count: count_within(self.node_count, MAX_NODES, scope, "node_count"),
			connection_distance: positive_or(
				self.connection_distance,
				defaults.connection_distance,
				scope,
				"connection_distance",
			),
			frame_interval_ms: positive_or(
				self.frame_interval_ms,
				defaults.frame_interval_ms,
				scope,
				"frame_interval_ms",
			),
			pointer_throttle_ms: positive_or(
				self.pointer_throttle_ms,
				defaults.pointer_throttle_ms,
				scope,
				"pointer_throttle_ms",
			),
		}
	}
}

impl Default for Tunables {
	fn default() -> Self {
		Self::desktop()
	}
}

/// Complete background configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
	/// Viewports narrower than this (CSS px) get the static backdrop.
	pub mobile_breakpoint: f64,
	/// Viewports narrower than this use the compact tier.
	pub compact_breakpoint: f64,
	/// Tier used at or above the compact breakpoint.
	pub desktop: Tunables,
	/// Tier used between the mobile and compact breakpoints.
	pub compact: Tunables,
	/// Quiet period after which the pointer counts as idle.
	pub idle_timeout_ms: f64,
	/// Minimum milliseconds between applied window resizes.
	pub resize_throttle_ms: f64,
	/// Upper bound on the device pixel ratio used for the canvas backing store.
	pub max_pixel_ratio: f64,
	/// Largest per-axis node speed, in CSS px per drawn frame.
	pub node_max_speed: f64,
	/// Palette and node network colors.
	pub theme: Theme,
	/// Fixed RNG seed; random placement differs per mount when unset.
	pub seed: Option<u64>,
}

impl Default for BackgroundConfig {
	fn default() -> Self {
		Self {
			mobile_breakpoint: 768.0,
			compact_breakpoint: 1024.0,
			desktop: Tunables::desktop(),
			compact: Tunables::compact(),
			idle_timeout_ms: 500.0,
			resize_throttle_ms: 500.0,
			max_pixel_ratio: 2.0,
			node_max_speed: 0.15,
			theme: Theme::default(),
			seed: None,
		}
	}
}

impl BackgroundConfig {
	/// Parses a JSON override document; missing fields keep their defaults
	/// and out-of-range values are replaced (see [`sanitized`](Self::sanitized)).
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str::<Self>(json).map(Self::sanitized)
	}

	/// Clamps counts to `1..=MAX_*` and replaces every non-finite or
	/// non-positive distance, interval, breakpoint and rate with its default.
	pub fn sanitized(self) -> Self {
		let defaults = Self::default();
		let scope = "config";
		Self {
			mobile_breakpoint: positive_or(
				self.mobile_breakpoint,
				defaults.mobile_breakpoint,
				scope,
				"mobile_breakpoint",
			),
			compact_breakpoint: positive_or(
				self.compact_breakpoint,
				defaults.compact_breakpoint,
				scope,
				"compact_breakpoint",
			),
			desktop: self.desktop.sanitized(&defaults.desktop, "desktop"),
			compact: self.compact.sanitized(&defaults.compact, "compact"),
			idle_timeout_ms: positive_or(
				self.idle_timeout_ms,
				defaults.idle_timeout_ms,
				scope,
				"idle_timeout_ms",
			),
			resize_throttle_ms: positive_or(
				self.resize_throttle_ms,
				defaults.resize_throttle_ms,
				scope,
				"resize_throttle_ms",
			),
			max_pixel_ratio: positive_or(
				self.max_pixel_ratio,
				defaults.max_pixel_ratio,
				scope,
				"max_pixel_ratio",
			),
			node_max_speed: positive_or(
				self.node_max_speed,
				defaults.node_max_speed,
				scope,
				"node_max_speed",
			),
			theme: self.theme,
			seed: self.seed,
		}
	}

	/// Tier for the given device class.
	pub fn tunables(&self, class: DeviceClass) -> &Tunables {
		match class {
			DeviceClass::Desktop => &self.desktop,
			DeviceClass::Compact => &self.compact,
		}
	}

	/// A fresh random source, pinned when a seed is configured.
	pub fn rng(&self) -> fastrand::Rng {
		match self.seed {
			Some(seed) => fastrand::Rng::with_seed(seed),
			None => fastrand::Rng::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::dynamic_background::theme::Color;

	#[test]
	fn empty_document_yields_defaults() {
		let config = BackgroundConfig::from_json("{}").unwrap();
		assert_eq!(config, BackgroundConfig::default());
	}

	#[test]
	fn partial_overrides_keep_remaining_defaults() {
		let config = BackgroundConfig::from_json(
			r##"{
				"desktop": { "node_count": 8, "connection_distance": 150 },
				"theme": { "network": { "line_color": "#06b6d4" } },
				"seed": 42
			}"##,
		)
		.unwrap();

		assert_eq!(config.desktop.node_count, 8);
		assert_eq!(config.desktop.connection_distance, 150.0);
		assert_eq!(config.desktop.particle_count, 8);
		assert_eq!(config.compact, Tunables::compact());
		assert_eq!(config.theme.network.line_color, Color::rgb(6, 182, 212));
		assert_eq!(config.theme.network.node_alpha, 0.6);
		assert_eq!(config.seed, Some(42));
	}

	#[test]
	fn palette_accepts_hex_list() {
		let config =
			BackgroundConfig::from_json(r##"{ "theme": { "palette": ["#ffffff", "#000000"] } }"##)
				.unwrap();
		assert_eq!(config.theme.palette.len(), 2);
		assert_eq!(config.theme.palette.get(1), Color::rgb(0, 0, 0));
	}

	#[test]
	fn bad_color_is_an_error() {
		assert!(BackgroundConfig::from_json(r#"{ "theme": { "palette": ["red"] } }"#).is_err());
	}

	#[test]
	fn tier_selection_follows_device_class() {
		let config = BackgroundConfig::default();
		assert_eq!(config.tunables(DeviceClass::Desktop).node_count, 6);
		assert_eq!(config.tunables(DeviceClass::Compact).node_count, 3);
	}

	#[test]
	fn seeded_rng_is_reproducible() {
		let config = BackgroundConfig {
			seed: Some(9),
			..BackgroundConfig::default()
		};
		assert_eq!(config.rng().u64(..), config.rng().u64(..));
	}

	#[test]
	fn zero_and_negative_overrides_fall_back() {
		let config = BackgroundConfig::from_json(
			r#"{
				"desktop": {
					"node_count": 0,
					"particle_count": 0,
					"connection_distance": -5,
					"frame_interval_ms": -1,
					"pointer_throttle_ms": 0
				},
				"max_pixel_ratio": -3,
				"idle_timeout_ms": 0,
				"resize_throttle_ms": -500,
				"node_max_speed": -0.2,
				"mobile_breakpoint": 0
			}"#,
		)
		.unwrap();

		let defaults = BackgroundConfig::default();
		assert_eq!(config.desktop.node_count, 1);
		assert_eq!(config.desktop.particle_count, 1);
		assert_eq!(config.desktop.connection_distance, 100.0);
		assert_eq!(config.desktop.frame_interval_ms, 16.0);
		assert_eq!(config.desktop.pointer_throttle_ms, 16.0);
		assert_eq!(config.max_pixel_ratio, 2.0);
		assert_eq!(config.idle_timeout_ms, defaults.idle_timeout_ms);
		assert_eq!(config.resize_throttle_ms, defaults.resize_throttle_ms);
		assert_eq!(config.node_max_speed, defaults.node_max_speed);
		assert_eq!(config.mobile_breakpoint, 768.0);
	}

	#[test]
	fn oversized_counts_are_capped() {
		let config = BackgroundConfig::from_json(
			r#"{ "desktop": { "node_count": 5000, "particle_count": 900 },
			     "compact": { "node_count": 16 } }"#,
		)
		.unwrap();
		assert_eq!(config.desktop.node_count, MAX_NODES);
		assert_eq!(config.desktop.particle_count, MAX_PARTICLES);
		assert_eq!(config.compact.node_count, MAX_NODES);
	}

	#[test]
	fn compact_tier_falls_back_to_compact_defaults() {
		let config = BackgroundConfig {
			compact: Tunables {
				connection_distance: f64::NAN,
				frame_interval_ms: f64::INFINITY,
				..Tunables::compact()
			},
			..BackgroundConfig::default()
		}
		.sanitized();
		assert_eq!(config.compact, Tunables::compact());
	}

	#[test]
	fn valid_values_pass_through() {
		let config = BackgroundConfig {
			desktop: Tunables {
				particle_count: MAX_PARTICLES,
				node_count: MAX_NODES,
				connection_distance: 0.5,
				frame_interval_ms: 33.0,
				pointer_throttle_ms: 1.0,
			},
			max_pixel_ratio: 1.5,
			seed: Some(3),
			..BackgroundConfig::default()
		};
		assert_eq!(config.clone().sanitized(), config);
	}
}
