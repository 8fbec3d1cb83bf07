/// In-memory DomPort for tests
///
/// Elements are registered with the selectors they answer to. Inserted HTML is
/// scanned for start tags carrying the marker attribute; each one becomes an
/// element matching `[data-gk]` and its classes. Mutations queue up and are only
/// delivered by `flush_mutations`/`advance`, and timers run on a virtual clock.
use regex::Regex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{DomPort, InsertPosition, Mutation, MutationCallback, TimerCallback};
use crate::config::MARKER_ATTRIBUTE;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub selectors: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub anchor: Option<(usize, InsertPosition)>,
    pub removed: bool,
}

impl FakeNode {
    fn matches(&self, selector: &str) -> bool {
        !self.removed
            && (self.selectors.iter().any(|s| s == selector)
                || selector
                    .split(',')
                    .map(str::trim)
                    .any(|part| self.selectors.iter().any(|s| s == part)))
    }
}

struct PendingTimer {
    due: u64,
    seq: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct FakeState {
    nodes: Vec<FakeNode>,
    pending_mutations: Vec<Mutation>,
    observers: Vec<Option<Rc<RefCell<MutationCallback>>>>,
    observe_calls: usize,
    disconnect_calls: usize,
    timers: Vec<Option<PendingTimer>>,
    timer_seq: u64,
    now: u64,
}

#[derive(Default)]
pub struct FakeDom {
    state: RefCell<FakeState>,
}

impl FakeDom {
    pub fn new() -> Rc<FakeDom> {
        Rc::new(FakeDom::default())
    }

    /// Add an element answering to `selector`
    pub fn add_element(&self, selector: &str) -> usize {
        self.add_node(FakeNode {
            selectors: vec![selector.to_string()],
            attributes: BTreeMap::new(),
            text: None,
            html: None,
            anchor: None,
            removed: false,
        })
    }

    /// Add an element with an attribute, e.g. an anchor with an `href`
    pub fn add_element_with_attribute(&self, selector: &str, name: &str, value: &str) -> usize {
        let id = self.add_element(selector);
        self.state.borrow_mut().nodes[id]
            .attributes
            .insert(name.to_string(), value.to_string());
        id
    }

    /// Add an element with text content
    pub fn add_element_with_text(&self, selector: &str, text: &str) -> usize {
        let id = self.add_element(selector);
        self.state.borrow_mut().nodes[id].text = Some(text.to_string());
        id
    }

    /// Queue a mutation on a node with the given id
    pub fn mutate_node_with_id(&self, id: &str) {
        self.state.borrow_mut().pending_mutations.push(Mutation {
            target_id: id.to_string(),
        });
    }

    pub fn node(&self, id: usize) -> FakeNode {
        self.state.borrow().nodes[id].clone()
    }

    /// Live elements carrying the marker attribute
    pub fn marked_elements(&self) -> Vec<FakeNode> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|n| !n.removed && n.attributes.contains_key(MARKER_ATTRIBUTE))
            .cloned()
            .collect()
    }

    /// Live marked elements inserted next to the element `anchor`
    pub fn marked_elements_at(&self, anchor: usize) -> Vec<FakeNode> {
        self.marked_elements()
            .into_iter()
            .filter(|n| n.anchor.map(|(a, _)| a) == Some(anchor))
            .collect()
    }

    pub fn active_observers(&self) -> usize {
        self.state.borrow().observers.iter().filter(|o| o.is_some()).count()
    }

    pub fn observe_calls(&self) -> usize {
        self.state.borrow().observe_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.borrow().disconnect_calls
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.iter().filter(|t| t.is_some()).count()
    }

    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Deliver queued mutations to every connected observer
    pub fn flush_mutations(&self) {
        let (batch, observers) = {
            let mut state = self.state.borrow_mut();
            if state.pending_mutations.is_empty() {
                return;
            }
            let batch = std::mem::take(&mut state.pending_mutations);
            let observers: Vec<_> = state.observers.iter().flatten().cloned().collect();
            (batch, observers)
        };

        for observer in observers {
            let mut callback = observer.borrow_mut();
            (*callback)(&batch);
        }
    }

    /// Move the clock forward, running due timers and delivering mutations after each
    pub fn advance(&self, ms: u64) {
        self.flush_mutations();
        let deadline = self.now() + ms;

        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let slot = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter_map(|(i, t)| t.as_ref().map(|t| (i, t.due, t.seq)))
                    .filter(|(_, due, _)| *due <= deadline)
                    .min_by_key(|(_, due, seq)| (*due, *seq))
                    .map(|(i, _, _)| i);
                slot.and_then(|i| state.timers[i].take())
            };

            let Some(timer) = next else {
                break;
            };
            self.state.borrow_mut().now = timer.due;
            (timer.callback)();
            self.flush_mutations();
        }

        self.state.borrow_mut().now = deadline;
    }

    fn add_node(&self, node: FakeNode) -> usize {
        let mut state = self.state.borrow_mut();
        state.nodes.push(node);
        state.pending_mutations.push(Mutation::default());
        state.nodes.len() - 1
    }
}

fn parse_marked_tags(html: &str) -> Vec<(Vec<String>, BTreeMap<String, String>)> {
    let (Ok(tag), Ok(attr)) = (
        Regex::new(r"<[a-zA-Z][a-zA-Z0-9-]*((?:\s[^>]*)?)>"),
        Regex::new(r#"([a-zA-Z-]+)(?:="([^"]*)")?"#),
    ) else {
        return Vec::new();
    };

    tag.captures_iter(html)
        .filter_map(|caps| {
            let attributes: BTreeMap<String, String> = attr
                .captures_iter(&caps[1])
                .map(|a| {
                    let value = a.get(2).map(|v| v.as_str().to_string()).unwrap_or_default();
                    (a[1].to_string(), value)
                })
                .collect();
            if !attributes.contains_key(MARKER_ATTRIBUTE) {
                return None;
            }

            let mut selectors = vec![format!("[{}]", MARKER_ATTRIBUTE)];
            if let Some(classes) = attributes.get("class") {
                selectors.extend(classes.split_whitespace().map(|c| format!(".{}", c)));
            }
            Some((selectors, attributes))
        })
        .collect()
}

impl DomPort for FakeDom {
    type Element = usize;
    type Observer = usize;
    type Timer = usize;

    fn query_selector(&self, selector: &str) -> Option<usize> {
        self.state.borrow().nodes.iter().position(|n| n.matches(selector))
    }

    fn query_selector_all(&self, selector: &str) -> Vec<usize> {
        self.state
            .borrow()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.matches(selector))
            .map(|(i, _)| i)
            .collect()
    }

    fn insert_adjacent_html(
        &self,
        target: &usize,
        position: InsertPosition,
        html: &str,
    ) -> Result<()> {
        for (selectors, attributes) in parse_marked_tags(html) {
            self.add_node(FakeNode {
                selectors,
                attributes,
                text: None,
                html: Some(html.to_string()),
                anchor: Some((*target, position)),
                removed: false,
            });
        }
        Ok(())
    }

    fn attribute(&self, element: &usize, name: &str) -> Option<String> {
        self.state.borrow().nodes[*element].attributes.get(name).cloned()
    }

    fn set_attribute(&self, element: &usize, name: &str, value: &str) -> Result<()> {
        self.state.borrow_mut().nodes[*element]
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn text(&self, element: &usize) -> Option<String> {
        self.state.borrow().nodes[*element].text.clone()
    }

    fn remove(&self, element: &usize) {
        let mut state = self.state.borrow_mut();
        state.nodes[*element].removed = true;
        state.pending_mutations.push(Mutation::default());
    }

    fn observe_mutations(&self, callback: MutationCallback) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        state.observe_calls += 1;
        state.observers.push(Some(Rc::new(RefCell::new(callback))));
        Ok(state.observers.len() - 1)
    }

    fn disconnect(&self, observer: usize) {
        let mut state = self.state.borrow_mut();
        state.disconnect_calls += 1;
        state.observers[observer] = None;
    }

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        state.timer_seq += 1;
        let timer = PendingTimer {
            due: state.now + u64::from(delay_ms),
            seq: state.timer_seq,
            callback,
        };
        state.timers.push(Some(timer));
        Ok(state.timers.len() - 1)
    }

    fn clear_timeout(&self, timer: usize) {
        if let Some(slot) = self.state.borrow_mut().timers.get_mut(timer) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inserted_marker_tags_become_elements() {
        let dom = FakeDom::new();
        let anchor = dom.add_element("#anchor");
        dom.insert_adjacent_html(
            &anchor,
            InsertPosition::AfterEnd,
            r#"<a data-gk class="btn gk-insert" href="https://x"><svg></svg></a><a data-gk class="gk-insert-compare" href="https://y">y</a>"#,
        )
        .unwrap();

        assert_eq!(dom.marked_elements().len(), 2);
        assert!(dom.query_selector(".gk-insert").is_some());
        assert!(dom.query_selector(".gk-insert-compare").is_some());
        assert_eq!(dom.query_selector_all("[data-gk]").len(), 2);
    }

    #[test]
    fn test_unmarked_tags_are_ignored() {
        let dom = FakeDom::new();
        let anchor = dom.add_element("#anchor");
        dom.insert_adjacent_html(
            &anchor,
            InsertPosition::AfterEnd,
            r#"<li data-gk><a class="inner">x</a></li>"#,
        )
        .unwrap();

        assert_eq!(dom.marked_elements().len(), 1);
        assert!(dom.query_selector(".inner").is_none());
    }

    #[test]
    fn test_selector_lists_match_any_part() {
        let dom = FakeDom::new();
        dom.add_element(".second");
        assert!(dom.query_selector(".first, .second").is_some());
    }

    #[test]
    fn test_timers_run_in_due_order() {
        let dom = FakeDom::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, name) in [(300, "late"), (100, "early")] {
            let log = log.clone();
            dom.set_timeout(delay, Box::new(move || log.borrow_mut().push(name))).unwrap();
        }
        let cancelled = {
            let log = log.clone();
            dom.set_timeout(200, Box::new(move || log.borrow_mut().push("cancelled"))).unwrap()
        };
        dom.clear_timeout(cancelled);

        dom.advance(250);
        assert_eq!(*log.borrow(), vec!["early"]);
        dom.advance(100);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(dom.now(), 350);
    }

    #[test]
    fn test_mutations_are_queued_until_flushed() {
        let dom = FakeDom::new();
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        let observer = dom
            .observe_mutations(Box::new(move |batch| *counter.borrow_mut() += batch.len()))
            .unwrap();

        dom.add_element("#a");
        dom.add_element("#b");
        assert_eq!(*seen.borrow(), 0);

        dom.flush_mutations();
        assert_eq!(*seen.borrow(), 2);

        dom.disconnect(observer);
        dom.add_element("#c");
        dom.flush_mutations();
        assert_eq!(*seen.borrow(), 2);
        assert_eq!(dom.active_observers(), 0);
    }
}
