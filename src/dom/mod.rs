/// DOM port: the small slice of the page the injector touches
///
/// The reconciler and orchestrator only talk to the page through [`DomPort`], so
/// they run unchanged against the live document ([`web::WebDom`]) or the
/// in-memory fake used by the tests.
use crate::error::Result;

#[cfg(test)]
pub mod fake;
pub mod web;

/// Position argument of `insertAdjacentHTML`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl InsertPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            InsertPosition::BeforeBegin => "beforebegin",
            InsertPosition::AfterBegin => "afterbegin",
            InsertPosition::BeforeEnd => "beforeend",
            InsertPosition::AfterEnd => "afterend",
        }
    }
}

/// Existing element whose link is refreshed instead of inserting a new one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceTarget {
    pub selector: String,
    pub href: String,
}

/// One pending insertion, keyed by its anchor selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionSpec {
    pub selector: String,
    pub html: String,
    pub position: InsertPosition,
    pub replace_targets: Vec<ReplaceTarget>,
}

impl InsertionSpec {
    pub fn new(selector: &str, html: String, position: InsertPosition) -> InsertionSpec {
        InsertionSpec {
            selector: selector.to_string(),
            html,
            position,
            replace_targets: Vec::new(),
        }
    }

    pub fn replacing(mut self, selector: &str, href: &str) -> InsertionSpec {
        self.replace_targets.push(ReplaceTarget {
            selector: selector.to_string(),
            href: href.to_string(),
        });
        self
    }
}

/// Insertions of one render pass, iterated in insertion order.
///
/// Setting a selector that is already present replaces its spec in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insertions {
    entries: Vec<InsertionSpec>,
}

impl Insertions {
    pub fn new() -> Insertions {
        Insertions::default()
    }

    pub fn set(&mut self, spec: InsertionSpec) {
        match self.entries.iter_mut().find(|e| e.selector == spec.selector) {
            Some(existing) => *existing = spec,
            None => self.entries.push(spec),
        }
    }

    pub fn get(&self, selector: &str) -> Option<&InsertionSpec> {
        self.entries.iter().find(|e| e.selector == selector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InsertionSpec> {
        self.entries.iter()
    }

    pub fn selectors(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.selector.as_str()).collect()
    }

    /// Keep only entries for which `keep` returns true
    pub fn retain(&mut self, keep: impl FnMut(&InsertionSpec) -> bool) {
        self.entries.retain(keep);
    }
}

/// One mutation record, reduced to what the injector inspects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mutation {
    /// `id` of the node whose children changed (empty when it has none)
    pub target_id: String,
}

pub type MutationCallback = Box<dyn FnMut(&[Mutation])>;
pub type TimerCallback = Box<dyn FnOnce()>;

/// Page access used by the injector.
///
/// Implementations must not call back into the injector synchronously: mutation
/// callbacks and timers run later, from the event loop.
pub trait DomPort {
    type Element: Clone;
    type Observer;
    type Timer;

    fn query_selector(&self, selector: &str) -> Option<Self::Element>;
    fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;
    fn insert_adjacent_html(
        &self,
        target: &Self::Element,
        position: InsertPosition,
        html: &str,
    ) -> Result<()>;
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str) -> Result<()>;
    fn text(&self, element: &Self::Element) -> Option<String>;
    fn remove(&self, element: &Self::Element);

    /// Watch `childList` + `subtree` mutations under the document body
    fn observe_mutations(&self, callback: MutationCallback) -> Result<Self::Observer>;
    fn disconnect(&self, observer: Self::Observer);

    /// Run `callback` once after `delay_ms`. The handle must be kept until the
    /// timer fires or is cleared: dropping it may cancel the timer.
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Result<Self::Timer>;
    fn clear_timeout(&self, timer: Self::Timer);
}
