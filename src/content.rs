/// Content-script side: wires an orchestrator to the live page
///
/// One page holds at most one active injection. Navigation arrives either from the
/// page itself (GitHub's `pjax:end`/`turbo:render` events) or from the background
/// relay, which forwards `webNavigation.onHistoryStateUpdated` as a runtime message.
use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::landing_base_or_default;
use crate::dom::web::WebDom;
use crate::error::{Error, Result};
use crate::hosts::Host;
use crate::orchestrator::Orchestrator;

#[wasm_bindgen(module = "/relay.js")]
extern "C" {
    /// Subscribe to runtime messages; returns the unsubscribe function
    #[wasm_bindgen(catch)]
    fn onRuntimeMessage(
        callback: &js_sys::Function,
    ) -> std::result::Result<js_sys::Function, JsValue>;
}

/// Message name the background uses for relayed navigations
pub const HISTORY_STATE_UPDATED: &str = "onHistoryStateUpdated";

/// In-page events GitHub fires after a client-side navigation
const PAGE_NAVIGATION_EVENTS: [&str; 2] = ["pjax:end", "turbo:render"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayDetails {
    pub url: String,
}

/// Runtime message as sent by the background
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayMessage {
    pub message: String,
    pub details: RelayDetails,
}

impl RelayMessage {
    /// Target URL when this is a relayed navigation
    pub fn navigation_url(self) -> Option<String> {
        (self.message == HISTORY_STATE_UPDATED).then_some(self.details.url)
    }
}

type EventListener = Closure<dyn FnMut(web_sys::Event)>;

struct RelayListener {
    _callback: Closure<dyn FnMut(JsValue)>,
    unsubscribe: js_sys::Function,
}

struct ActivePage {
    dom: Rc<WebDom>,
    orchestrator: Orchestrator<WebDom>,
    page_listeners: Vec<(&'static str, EventListener)>,
    relay: Option<RelayListener>,
}

impl Drop for ActivePage {
    fn drop(&mut self) {
        let document = self.dom.document();
        for (event, listener) in &self.page_listeners {
            if let Err(e) = document
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            {
                log::debug!("cannot remove {} listener: {:?}", event, e);
            }
        }
        if let Some(relay) = &self.relay {
            if let Err(e) = relay.unsubscribe.call0(&JsValue::NULL) {
                log::debug!("cannot unsubscribe from runtime messages: {:?}", e);
            }
        }
        log::debug!("released injection for {}", self.orchestrator.page());
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<ActivePage>> = const { RefCell::new(None) };
}

/// Inject the GitKraken buttons into the current page.
///
/// Called by the background once per qualifying navigation; a repeated call
/// replaces the previous injection.
#[wasm_bindgen]
pub fn inject(url: &str, landing_base: &str) -> std::result::Result<(), JsValue> {
    let page = Url::parse(url).map_err(Error::from)?;
    let host = Host::from_url(&page)
        .inspect_err(|e| log::error!("not injecting into {}: {}", url, e))?;

    ACTIVE.with(|active| active.borrow_mut().take());

    let dom = Rc::new(WebDom::new()?);
    let landing_base = landing_base_or_default(landing_base);
    let orchestrator = Orchestrator::new(host, dom.clone(), page, &landing_base);

    let mut active = ActivePage {
        dom: dom.clone(),
        orchestrator: orchestrator.clone(),
        page_listeners: Vec::new(),
        relay: None,
    };
    if host.uses_history_relay() {
        active.relay = Some(listen_for_relay(&orchestrator)?);
    } else {
        active.page_listeners = listen_for_page_navigation(&dom, &orchestrator)?;
    }

    orchestrator.start();
    ACTIVE.with(|slot| *slot.borrow_mut() = Some(active));
    Ok(())
}

/// Tear down the current injection, leaving already inserted buttons in place
#[wasm_bindgen]
pub fn release() {
    ACTIVE.with(|active| active.borrow_mut().take());
}

fn listen_for_page_navigation(
    dom: &Rc<WebDom>,
    orchestrator: &Orchestrator<WebDom>,
) -> Result<Vec<(&'static str, EventListener)>> {
    let mut listeners = Vec::new();

    for event in PAGE_NAVIGATION_EVENTS {
        let port = dom.clone();
        let handle = orchestrator.clone();
        let listener = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let href = match port.location_href() {
                Ok(href) => href,
                Err(e) => {
                    log::warn!("{}", e);
                    return;
                }
            };
            if let Err(e) = handle.navigate(&href) {
                log::error!("cannot follow navigation to {}: {}", href, e);
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        dom.document()
            .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            .map_err(|e| Error::dom("addEventListener failed", e))?;
        listeners.push((event, listener));
    }

    Ok(listeners)
}

fn listen_for_relay(orchestrator: &Orchestrator<WebDom>) -> Result<RelayListener> {
    let handle = orchestrator.clone();
    let callback = Closure::wrap(Box::new(move |message: JsValue| {
        // Other runtime messages do not concern the injection
        let Ok(relay) = serde_wasm_bindgen::from_value::<RelayMessage>(message) else {
            return;
        };
        if let Some(url) = relay.navigation_url() {
            if let Err(e) = handle.on_history_state_updated(url) {
                log::warn!("cannot schedule relayed navigation: {}", e);
            }
        }
    }) as Box<dyn FnMut(JsValue)>);

    let unsubscribe = onRuntimeMessage(callback.as_ref().unchecked_ref())
        .map_err(|e| Error::Bridge(format!("runtime.onMessage: {:?}", e)))?;

    Ok(RelayListener {
        _callback: callback,
        unsubscribe,
    })
}
