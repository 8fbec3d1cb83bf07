/// Host injection orchestrator
///
/// Owns one page's injection lifecycle. Every render, whether initial or after a
/// client-side navigation, tears the previous pass down (watcher first, then every
/// marked element) before computing and reconciling the insertions of the current
/// route. Failures while computing insertions are logged and leave the page as is.
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use url::Url;

use crate::config::MARKER_ATTRIBUTE;
use crate::deep_link::DeepLinkEncoder;
use crate::dom::{DomPort, Mutation};
use crate::error::Result;
use crate::hosts::{Host, PORTAL_RENDER_DELAY_MS, PORTAL_ROOT_ID};
use crate::reconciler::Reconciler;

/// Where the current pass stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rendering,
    Watching,
}

struct Inner<P: DomPort + 'static> {
    host: Host,
    port: Rc<P>,
    encoder: DeepLinkEncoder,
    reconciler: Reconciler<P>,
    page: RefCell<Url>,
    rendering: Cell<bool>,
    relay_timer: RefCell<Option<P::Timer>>,
    portal_observer: RefCell<Option<P::Observer>>,
    portal_timer: RefCell<Option<P::Timer>>,
}

impl<P: DomPort + 'static> Drop for Inner<P> {
    fn drop(&mut self) {
        if let Some(timer) = self.relay_timer.get_mut().take() {
            self.port.clear_timeout(timer);
        }
        if let Some(timer) = self.portal_timer.get_mut().take() {
            self.port.clear_timeout(timer);
        }
        if let Some(observer) = self.portal_observer.get_mut().take() {
            self.port.disconnect(observer);
        }
    }
}

/// Handle to a page's orchestrator; clones share the same state
pub struct Orchestrator<P: DomPort + 'static> {
    inner: Rc<Inner<P>>,
}

impl<P: DomPort + 'static> Clone for Orchestrator<P> {
    fn clone(&self) -> Self {
        Orchestrator {
            inner: self.inner.clone(),
        }
    }
}

impl<P: DomPort + 'static> Orchestrator<P> {
    pub fn new(host: Host, port: Rc<P>, page: Url, landing_base: &str) -> Orchestrator<P> {
        let reconciler = Reconciler::new(port.clone(), host.debounce_ms());
        Orchestrator {
            inner: Rc::new(Inner {
                host,
                port,
                encoder: DeepLinkEncoder::new(landing_base),
                reconciler,
                page: RefCell::new(page),
                rendering: Cell::new(false),
                relay_timer: RefCell::new(None),
                portal_observer: RefCell::new(None),
                portal_timer: RefCell::new(None),
            }),
        }
    }

    fn from_inner(inner: Rc<Inner<P>>) -> Orchestrator<P> {
        Orchestrator { inner }
    }

    /// URL of the page as last rendered
    pub fn page(&self) -> Url {
        self.inner.page.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        if self.inner.rendering.get() {
            Phase::Rendering
        } else if self.inner.reconciler.is_observing() {
            Phase::Watching
        } else {
            Phase::Idle
        }
    }

    /// First render, plus the portal watcher on hosts that need one
    pub fn start(&self) {
        if self.inner.host.watches_portal() {
            self.watch_portal();
        }
        self.render();
    }

    /// Tear down the previous pass and render the current page
    pub fn render(&self) {
        let inner = &self.inner;
        inner.rendering.set(true);

        inner.reconciler.cancel();
        self.remove_marked_elements();

        let page = self.page();
        log::debug!("rendering {} for {}", inner.host.name(), page);
        match inner.host.insertions(&page, inner.port.as_ref(), &inner.encoder) {
            Ok(insertions) => inner.reconciler.reconcile(insertions),
            Err(e) => log::error!("no insertions for {}: {}", page, e),
        }

        inner.rendering.set(false);
    }

    /// Client-side navigation observed in the page
    pub fn navigate(&self, url: &str) -> Result<()> {
        let page = Url::parse(url)?;
        *self.inner.page.borrow_mut() = page;
        self.render();
        Ok(())
    }

    /// Navigation relayed by the background. A newer message replaces a pending one.
    pub fn on_history_state_updated(&self, url: String) -> Result<()> {
        let inner = &self.inner;
        if let Some(previous) = inner.relay_timer.borrow_mut().take() {
            inner.port.clear_timeout(previous);
        }

        let delay_ms = inner.host.relay_delay_ms(&url);
        let weak = Rc::downgrade(&self.inner);
        let timer = inner.port.set_timeout(
            delay_ms,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.relay_timer.borrow_mut().take();
                if let Err(e) = Orchestrator::from_inner(inner).navigate(&url) {
                    log::error!("cannot follow relayed navigation to {}: {}", url, e);
                }
            }),
        )?;
        *inner.relay_timer.borrow_mut() = Some(timer);
        Ok(())
    }

    fn remove_marked_elements(&self) {
        let port = self.inner.port.as_ref();
        for element in port.query_selector_all(&format!("[{}]", MARKER_ATTRIBUTE)) {
            port.remove(&element);
        }
    }

    /// Re-render shortly after the menu portal changes, at most once per delay
    fn watch_portal(&self) {
        let weak = Rc::downgrade(&self.inner);
        let observed = self.inner.port.observe_mutations(Box::new(move |mutations: &[Mutation]| {
            if mutations.iter().any(|m| m.target_id == PORTAL_ROOT_ID) {
                on_portal_change(&weak);
            }
        }));

        match observed {
            Ok(observer) => {
                if let Some(previous) = self.inner.portal_observer.borrow_mut().replace(observer) {
                    self.inner.port.disconnect(previous);
                }
            }
            Err(e) => log::warn!("cannot watch the menu portal: {}", e),
        }
    }
}

fn on_portal_change<P: DomPort + 'static>(weak: &Weak<Inner<P>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    if inner.portal_timer.borrow().is_some() {
        return;
    }

    let weak = weak.clone();
    let scheduled = inner.port.set_timeout(
        PORTAL_RENDER_DELAY_MS,
        Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.portal_timer.borrow_mut().take();
            Orchestrator::from_inner(inner).render();
        }),
    );

    match scheduled {
        Ok(timer) => *inner.portal_timer.borrow_mut() = Some(timer),
        Err(e) => log::warn!("cannot schedule portal render: {}", e),
    }
}
