/// DomPort backed by the live document
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit, MutationRecord, Window};

use super::{DomPort, InsertPosition, Mutation, MutationCallback, TimerCallback};
use crate::error::{Error, Result};

pub struct WebDom {
    window: Window,
    document: Document,
}

pub struct WebObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl WebDom {
    pub fn new() -> Result<WebDom> {
        let window =
            web_sys::window().ok_or_else(|| Error::Dom("window is unavailable".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::Dom("document is unavailable".to_string()))?;
        Ok(WebDom { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current `window.location.href`
    pub fn location_href(&self) -> Result<String> {
        self.window
            .location()
            .href()
            .map_err(|e| Error::dom("failed to read location", e))
    }
}

fn mutation_from_record(value: JsValue) -> Mutation {
    let target_id = value
        .dyn_into::<MutationRecord>()
        .ok()
        .and_then(|record| record.target())
        .and_then(|node| node.dyn_into::<Element>().ok())
        .map(|element| element.id())
        .unwrap_or_default();
    Mutation { target_id }
}

impl DomPort for WebDom {
    type Element = Element;
    type Observer = WebObserver;
    type Timer = Timeout;

    fn query_selector(&self, selector: &str) -> Option<Element> {
        // Invalid selectors throw; treat them as "not rendered yet"
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn insert_adjacent_html(
        &self,
        target: &Element,
        position: InsertPosition,
        html: &str,
    ) -> Result<()> {
        target
            .insert_adjacent_html(position.as_str(), html)
            .map_err(|e| Error::dom("insertAdjacentHTML failed", e))
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) -> Result<()> {
        element
            .set_attribute(name, value)
            .map_err(|e| Error::dom("setAttribute failed", e))
    }

    fn text(&self, element: &Element) -> Option<String> {
        element.text_content()
    }

    fn remove(&self, element: &Element) {
        element.remove();
    }

    fn observe_mutations(&self, mut callback: MutationCallback) -> Result<WebObserver> {
        let body = self
            .document
            .body()
            .ok_or_else(|| Error::Dom("document body is unavailable".to_string()))?;

        let closure = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let mutations: Vec<Mutation> = records.iter().map(mutation_from_record).collect();
                callback(&mutations);
            },
        );

        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())
            .map_err(|e| Error::dom("failed to create MutationObserver", e))?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer
            .observe_with_options(&body, &options)
            .map_err(|e| Error::dom("failed to observe body", e))?;

        Ok(WebObserver {
            observer,
            _callback: closure,
        })
    }

    fn disconnect(&self, observer: WebObserver) {
        observer.observer.disconnect();
    }

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Result<Timeout> {
        Ok(Timeout::new(delay_ms, callback))
    }

    fn clear_timeout(&self, timer: Timeout) {
        // Dropping the handle clears the timeout and frees its closure
        drop(timer);
    }
}
