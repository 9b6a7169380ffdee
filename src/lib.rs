//! dyn-backdrop: animated background for a portfolio page.
//!
//! This crate provides a WASM component that draws a drifting node network,
//! a particle field and a pointer-following glow behind the page, and falls
//! back to a static gradient where motion is unwanted.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::dynamic_background::{BackgroundConfig, DynamicBackground, Theme, Tunables};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("dyn-backdrop: logging initialized");
}

/// Load background overrides from a script element with id="background-config".
/// Missing element means defaults; a malformed one is logged and ignored.
fn load_config() -> Option<BackgroundConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("background-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match BackgroundConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"dyn-backdrop: loaded config (seed {:?}, {} colors)",
				config.seed,
				config.theme.palette.len()
			);
			Some(config)
		}
		Err(e) => {
			warn!("dyn-backdrop: failed to parse background config: {}", e);
			None
		}
	}
}

/// Main application component.
/// Reads the optional config from the DOM and mounts the background.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config().unwrap_or_default();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<DynamicBackground config=config />
	}
}
