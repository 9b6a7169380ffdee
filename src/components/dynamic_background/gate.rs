//! Decides whether the animated background runs at all.
//!
//! The decision is made from a [`DeviceProfile`] snapshot so it stays a pure
//! function; [`DeviceProfile::detect`] is the only part that touches the
//! browser.

use super::config::BackgroundConfig;

/// User-agent fragments that mark a phone or tablet.
const MOBILE_SIGNATURES: [&str; 8] = [
	"android",
	"webos",
	"iphone",
	"ipad",
	"ipod",
	"blackberry",
	"iemobile",
	"opera mini",
];

/// Media query for the reduced-motion preference.
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Whether the full animation or only the static backdrop is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
	/// Static gradient only: no canvas, particles or pointer tracking.
	#[default]
	Disabled,
	/// Canvas network, particles, pointer glow and ambient layers.
	Full,
}

/// Which tunables tier applies to an animating client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceClass {
	/// At or above the compact breakpoint.
	#[default]
	Desktop,
	/// Narrow but above the mobile breakpoint; fewer particles and nodes.
	Compact,
}

/// Snapshot of the client capabilities the gate looks at.
///
/// `viewport_width` is `None` when there is no browser context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceProfile {
	/// Window inner width in CSS pixels; `None` outside a browser.
	pub viewport_width: Option<f64>,
	/// `navigator.userAgent`, if available.
	pub user_agent: Option<String>,
	/// Whether `prefers-reduced-motion: reduce` matches.
	pub reduced_motion: bool,
}

impl DeviceProfile {
	/// Reads viewport width, user agent and reduced-motion preference.
	/// Returns the empty profile outside a browser.
	pub fn detect() -> Self {
		let Some(window) = web_sys::window() else {
			return Self::default();
		};
		let viewport_width = window.inner_width().ok().and_then(|w| w.as_f64());
		let user_agent = window.navigator().user_agent().ok();
		let reduced_motion = window
			.match_media(REDUCED_MOTION_QUERY)
			.ok()
			.flatten()
			.is_some_and(|mql| mql.matches());

		Self {
			viewport_width,
			user_agent,
			reduced_motion,
		}
	}

	/// Viewport below the mobile breakpoint or a mobile user agent.
	pub fn is_mobile(&self, config: &BackgroundConfig) -> bool {
		let narrow = self
			.viewport_width
			.is_some_and(|w| w < config.mobile_breakpoint);
		narrow || self.user_agent.as_deref().is_some_and(is_mobile_user_agent)
	}

	/// Tier for a device that passed the gate.
	pub fn device_class(&self, config: &BackgroundConfig) -> DeviceClass {
		match self.viewport_width {
			Some(w) if w < config.compact_breakpoint => DeviceClass::Compact,
			_ => DeviceClass::Desktop,
		}
	}
}

/// Case-insensitive check for a phone or tablet user agent.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
	let ua = user_agent.to_ascii_lowercase();
	MOBILE_SIGNATURES.iter().any(|sig| ua.contains(sig))
}

impl RenderMode {
	/// Reduced motion wins first, then the mobile check. A profile without a
	/// viewport (no browser) is always disabled.
	pub fn evaluate(profile: &DeviceProfile, config: &BackgroundConfig) -> Self {
		if profile.reduced_motion {
			return Self::Disabled;
		}
		if profile.viewport_width.is_none() || profile.is_mobile(config) {
			return Self::Disabled;
		}
		Self::Full
	}

	/// `true` for [`RenderMode::Full`].
	pub fn is_full(self) -> bool {
		self == Self::Full
	}
}
