/// DOM insertion reconciler
///
/// Applies a render pass's insertions to the page. Whatever cannot be placed yet
/// is retried after DOM mutations settle: one body observer plus a trailing
/// debounce timer, torn down as soon as every insertion is satisfied or the pass
/// is cancelled.
///
/// States: `Idle` (nothing pending, no observer) and `Observing` (observer attached,
/// maybe a debounce timer armed). Entering `Observing` attaches the observer;
/// leaving it clears the timer and disconnects the observer.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dom::{DomPort, InsertionSpec, Insertions};

enum Watch<P: DomPort> {
    Idle,
    Observing {
        observer: P::Observer,
        timer: Option<P::Timer>,
    },
}

struct Pass<P: DomPort> {
    pending: Insertions,
    watch: Watch<P>,
}

pub struct Reconciler<P: DomPort + 'static> {
    port: Rc<P>,
    debounce_ms: u32,
    pass: Rc<RefCell<Pass<P>>>,
}

impl<P: DomPort + 'static> Reconciler<P> {
    pub fn new(port: Rc<P>, debounce_ms: u32) -> Reconciler<P> {
        Reconciler {
            port,
            debounce_ms,
            pass: Rc::new(RefCell::new(Pass {
                pending: Insertions::new(),
                watch: Watch::Idle,
            })),
        }
    }

    /// Start a pass: place what can be placed now and watch for the rest.
    ///
    /// Any previous pass is cancelled first, so at most one observer is active.
    pub fn reconcile(&self, insertions: Insertions) {
        self.cancel();

        let mut pass = self.pass.borrow_mut();
        pass.pending = insertions;
        apply_pending(self.port.as_ref(), &mut pass.pending);
        if pass.pending.is_empty() {
            return;
        }

        log::debug!("waiting for insertion targets: {:?}", pass.pending.selectors());
        let weak = Rc::downgrade(&self.pass);
        let port = Rc::downgrade(&self.port);
        let debounce_ms = self.debounce_ms;
        let observed = self.port.observe_mutations(Box::new(move |_mutations| {
            on_mutations(&weak, &port, debounce_ms);
        }));

        match observed {
            Ok(observer) => {
                pass.watch = Watch::Observing { observer, timer: None };
            }
            Err(e) => {
                log::warn!("cannot watch for insertion targets: {}", e);
                pass.pending = Insertions::new();
            }
        }
    }

    /// Drop pending insertions and tear down the observer and timer
    pub fn cancel(&self) {
        let watch = {
            let mut pass = self.pass.borrow_mut();
            pass.pending = Insertions::new();
            std::mem::replace(&mut pass.watch, Watch::Idle)
        };
        stop_watching(self.port.as_ref(), watch);
    }

    pub fn is_observing(&self) -> bool {
        matches!(self.pass.borrow().watch, Watch::Observing { .. })
    }

    pub fn pending_selectors(&self) -> Vec<String> {
        self.pass
            .borrow()
            .pending
            .selectors()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl<P: DomPort + 'static> Drop for Reconciler<P> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn stop_watching<P: DomPort>(port: &P, watch: Watch<P>) {
    if let Watch::Observing { observer, timer } = watch {
        if let Some(timer) = timer {
            port.clear_timeout(timer);
        }
        port.disconnect(observer);
    }
}

/// Re-arm the debounce timer after a batch of mutations
fn on_mutations<P: DomPort + 'static>(
    pass: &Weak<RefCell<Pass<P>>>,
    port: &Weak<P>,
    debounce_ms: u32,
) {
    let (Some(shared), Some(dom)) = (pass.upgrade(), port.upgrade()) else {
        return;
    };
    let mut state = shared.borrow_mut();
    let Watch::Observing { timer, .. } = &mut state.watch else {
        return;
    };

    if let Some(previous) = timer.take() {
        dom.clear_timeout(previous);
    }

    let weak_pass = pass.clone();
    let weak_port = port.clone();
    match dom.set_timeout(debounce_ms, Box::new(move || on_settled(&weak_pass, &weak_port))) {
        Ok(handle) => *timer = Some(handle),
        Err(e) => log::warn!("cannot schedule insertion retry: {}", e),
    }
}

/// Retry the remaining insertions once mutations have settled
fn on_settled<P: DomPort + 'static>(pass: &Weak<RefCell<Pass<P>>>, port: &Weak<P>) {
    let (Some(shared), Some(dom)) = (pass.upgrade(), port.upgrade()) else {
        return;
    };

    let finished = {
        let mut state = shared.borrow_mut();
        if let Watch::Observing { timer, .. } = &mut state.watch {
            // This timer has fired; nothing left to clear
            *timer = None;
        }
        apply_pending(dom.as_ref(), &mut state.pending);
        if state.pending.is_empty() {
            Some(std::mem::replace(&mut state.watch, Watch::Idle))
        } else {
            None
        }
    };

    if let Some(watch) = finished {
        stop_watching(dom.as_ref(), watch);
    }
}

/// Run one pass over `pending`, dropping every satisfied entry
pub fn apply_pending<P: DomPort>(port: &P, pending: &mut Insertions) {
    pending.retain(|spec| !apply_one(port, spec));
}

/// Try to satisfy one insertion. Refreshing existing links takes precedence over
/// inserting fresh HTML, so a canonical button is never duplicated.
fn apply_one<P: DomPort>(port: &P, spec: &InsertionSpec) -> bool {
    let mut replaced = false;
    for target in &spec.replace_targets {
        if let Some(element) = port.query_selector(&target.selector) {
            if let Err(e) = port.set_attribute(&element, "href", &target.href) {
                log::debug!("cannot refresh {}: {}", target.selector, e);
            }
            replaced = true;
        }
    }
    if replaced {
        return true;
    }

    let Some(element) = port.query_selector(&spec.selector) else {
        return false;
    };
    if let Err(e) = port.insert_adjacent_html(&element, spec.position, &spec.html) {
        log::debug!("cannot insert at {}: {}", spec.selector, e);
    }
    true
}
