/// GitKraken Links - "Open with GitKraken" buttons for Git hosting sites
/// Built with Rust + WASM + Yew

pub mod config;
pub mod content;
pub mod deep_link;
pub mod dom;
pub mod error;
pub mod focus_view;
pub mod hosts;
pub mod intent;
pub mod orchestrator;
pub mod permissions;
pub mod reconciler;
pub mod route;
pub mod ui;

pub use error::{Error, Result};

use url::Url;
use wasm_bindgen::prelude::*;

use crate::config::Mode;
use crate::hosts::Host;

// Set up panic hook and logging for the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(Mode::current().log_level()));
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

/// Name of the host whose injection applies to `url`
#[wasm_bindgen]
pub fn injection_host(url: &str) -> std::result::Result<String, JsValue> {
    let url = Url::parse(url).map_err(Error::from)?;
    match Host::from_url(&url) {
        Ok(host) => Ok(host.name().to_string()),
        Err(e) => {
            log::error!("{}", e);
            Err(e.into())
        }
    }
}

#[wasm_bindgen]
pub fn should_relay_history_update(url: &str) -> bool {
    hosts::should_relay_history_update(url)
}

/// Origins to request and to drop, given the origins currently granted
#[wasm_bindgen]
pub fn plan_permissions(existing_origins: JsValue) -> std::result::Result<JsValue, JsValue> {
    let existing: Vec<String> = if existing_origins.is_null() || existing_origins.is_undefined() {
        Vec::new()
    } else {
        serde_wasm_bindgen::from_value(existing_origins).map_err(Error::from)?
    };
    let plan = permissions::plan_permissions(&existing);
    Ok(serde_wasm_bindgen::to_value(&plan).map_err(Error::from)?)
}

#[wasm_bindgen]
pub fn focus_view_deep_link(
    provider: &str,
    pull_request_url: &str,
    landing_base: &str,
) -> std::result::Result<Option<String>, JsValue> {
    let landing_base = config::landing_base_or_default(landing_base);
    Ok(focus_view::focus_view_deep_link(provider, pull_request_url, &landing_base)?)
}
