#![forbid(unsafe_code)]

//! Bubble-routed event delivery.
//!
//! An [`EventRouter<E>`] knows the element hierarchy relevant to one event
//! family (parent links plus an element *kind* per element) and delivers an
//! event from its source element up through every ancestor.
//!
//! # Dispatch order
//!
//! At each element on the route, the class handlers registered for that
//! element's kind run first, then the element's own instance handlers, in
//! registration order. Delivery stops after the handler that marks the
//! arguments handled.
//!
//! # Invariants
//!
//! 1. Handlers run in route order: source first, root last.
//! 2. The first handler error aborts the route and is returned as-is.
//! 3. Dropping a [`Subscription`] removes its handler; a handler never runs
//!    after its subscription is gone.
//! 4. Handlers may raise further events on the same router (no borrow is
//!    held while a handler runs).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::element::ElementId;
use crate::error::HandlerError;

/// Result type of an event handler.
pub type HandlerResult = Result<(), HandlerError>;

type Handler<E> = Rc<dyn Fn(&mut RoutedArgs<'_, E>) -> HandlerResult>;

/// Arguments seen by a handler.
pub struct RoutedArgs<'a, E> {
    /// Element that raised the event.
    pub source: ElementId,
    /// Element whose handlers are currently running.
    pub current: ElementId,
    /// The event payload.
    pub event: &'a E,
    handled: bool,
}

impl<E> RoutedArgs<'_, E> {
    /// Stop the route after the current handler.
    pub fn set_handled(&mut self) {
        self.handled = true;
    }

    /// Whether a handler already marked the event handled.
    #[must_use]
    pub fn handled(&self) -> bool {
        self.handled
    }
}

/// What happened to a raised event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteOutcome {
    /// A handler marked the event handled.
    pub handled: bool,
    /// Number of handlers invoked.
    pub invoked: usize,
}

struct ElementEntry {
    kind: &'static str,
    parent: Option<ElementId>,
}

struct RouterState<E> {
    elements: AHashMap<ElementId, ElementEntry>,
    class_handlers: AHashMap<&'static str, Vec<Handler<E>>>,
    instance_handlers: AHashMap<ElementId, Vec<(u64, Handler<E>)>>,
    next_token: u64,
}

impl<E> Default for RouterState<E> {
    fn default() -> Self {
        Self {
            elements: AHashMap::new(),
            class_handlers: AHashMap::new(),
            instance_handlers: AHashMap::new(),
            next_token: 1,
        }
    }
}

/// Cloneable handle to a router for events of type `E`.
pub struct EventRouter<E> {
    state: Rc<RefCell<RouterState<E>>>,
}

impl<E> Clone for EventRouter<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E> Default for EventRouter<E> {
    fn default() -> Self {
        Self {
            state: Rc::new(RefCell::new(RouterState::default())),
        }
    }
}

impl<E> fmt::Debug for EventRouter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventRouter")
            .field("elements", &state.elements.len())
            .field("class_kinds", &state.class_handlers.len())
            .finish()
    }
}

impl<E: 'static> EventRouter<E> {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element of `kind` under `parent`.
    pub fn register(&self, id: ElementId, kind: &'static str, parent: Option<ElementId>) {
        self.state
            .borrow_mut()
            .elements
            .insert(id, ElementEntry { kind, parent });
    }

    /// Forget an element and its instance handlers. Children keep their
    /// parent link and simply stop routing at the gap.
    pub fn unregister(&self, id: ElementId) {
        let mut state = self.state.borrow_mut();
        state.elements.remove(&id);
        state.instance_handlers.remove(&id);
    }

    /// Re-parent a registered element. Returns `false` if `id` is unknown.
    pub fn set_parent(&self, id: ElementId, parent: Option<ElementId>) -> bool {
        match self.state.borrow_mut().elements.get_mut(&id) {
            Some(entry) => {
                entry.parent = parent;
                true
            }
            None => false,
        }
    }

    /// Register a handler for every element of `kind`.
    ///
    /// Class handlers live as long as the router.
    pub fn register_class_handler<F>(&self, kind: &'static str, handler: F)
    where
        F: Fn(&mut RoutedArgs<'_, E>) -> HandlerResult + 'static,
    {
        self.state
            .borrow_mut()
            .class_handlers
            .entry(kind)
            .or_default()
            .push(Rc::new(handler));
    }

    /// Attach a handler to `id`. The handler is removed when the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, id: ElementId, handler: F) -> Subscription
    where
        F: Fn(&mut RoutedArgs<'_, E>) -> HandlerResult + 'static,
    {
        let mut state = self.state.borrow_mut();
        let token = state.next_token;
        state.next_token += 1;
        state
            .instance_handlers
            .entry(id)
            .or_default()
            .push((token, Rc::new(handler)));
        drop(state);

        let weak: Weak<RefCell<RouterState<E>>> = Rc::downgrade(&self.state);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    let mut state = state.borrow_mut();
                    if let Some(list) = state.instance_handlers.get_mut(&id) {
                        list.retain(|(t, _)| *t != token);
                    }
                }
            })),
        }
    }

    /// Route from `source` to the root.
    pub fn raise(&self, source: ElementId, event: &E) -> Result<RouteOutcome, HandlerError> {
        let route = self.route(source);
        let mut args = RoutedArgs {
            source,
            current: source,
            event,
            handled: false,
        };
        let mut outcome = RouteOutcome::default();

        for (element, handlers) in route {
            args.current = element;
            for handler in handlers {
                outcome.invoked += 1;
                handler(&mut args)?;
                if args.handled {
                    outcome.handled = true;
                    return Ok(outcome);
                }
            }
        }
        Ok(outcome)
    }

    /// Snapshot the handlers along the route so no borrow is held while they
    /// run.
    fn route(&self, source: ElementId) -> Vec<(ElementId, Vec<Handler<E>>)> {
        let state = self.state.borrow();
        let mut route = Vec::new();
        let mut cursor = Some(source);
        let mut guard = 0usize;
        while let Some(id) = cursor {
            let Some(entry) = state.elements.get(&id) else {
                // Unregistered source still gets its instance handlers.
                if id == source {
                    let handlers = instance_handlers(&state, id);
                    route.push((id, handlers));
                }
                break;
            };
            let mut handlers: Vec<Handler<E>> = state
                .class_handlers
                .get(entry.kind)
                .map(|list| list.to_vec())
                .unwrap_or_default();
            handlers.extend(instance_handlers(&state, id));
            route.push((id, handlers));
            cursor = entry.parent;
            guard += 1;
            if guard > state.elements.len() {
                // Cycle in parent links; stop rather than loop.
                break;
            }
        }
        route
    }
}

fn instance_handlers<E>(state: &RouterState<E>, id: ElementId) -> Vec<Handler<E>> {
    state
        .instance_handlers
        .get(&id)
        .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
        .unwrap_or_default()
}

/// Keeps an instance handler attached. Dropping it unsubscribes.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the handler attached for the router's whole lifetime.
    pub fn detach(mut self) {
        self.remove = None;
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn id(raw: u64) -> ElementId {
        ElementId::new(raw).unwrap()
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&mut RoutedArgs<'_, u32>) -> HandlerResult>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = Rc::clone(&log);
        let make = move |tag: &str| {
            let log = Rc::clone(&log2);
            let tag = tag.to_string();
            Box::new(move |args: &mut RoutedArgs<'_, u32>| {
                log.borrow_mut().push(format!("{tag}@{}:{}", args.current, args.event));
                Ok(())
            }) as Box<dyn Fn(&mut RoutedArgs<'_, u32>) -> HandlerResult>
        };
        (log, make)
    }

    #[test]
    fn bubbles_source_to_root_with_class_handlers_first() {
        let router: EventRouter<u32> = EventRouter::new();
        router.register(id(1), "Window", None);
        router.register(id(2), "Panel", Some(id(1)));
        router.register(id(3), "Thumb", Some(id(2)));
        let (log, make) = recorder();

        let h = make("thumb-instance");
        let _s1 = router.subscribe(id(3), move |a| h(a));
        let h = make("thumb-class");
        router.register_class_handler("Thumb", move |a| h(a));
        let h = make("window");
        let _s2 = router.subscribe(id(1), move |a| h(a));

        let outcome = router.raise(id(3), &7).unwrap();
        assert_eq!(outcome.invoked, 3);
        assert!(!outcome.handled);
        assert_eq!(
            *log.borrow(),
            vec!["thumb-class@#3:7", "thumb-instance@#3:7", "window@#1:7"]
        );
    }

    #[test]
    fn handled_stops_route() {
        let router: EventRouter<u32> = EventRouter::new();
        router.register(id(1), "Window", None);
        router.register(id(2), "Thumb", Some(id(1)));
        let hits = Rc::new(RefCell::new(0));
        let h2 = Rc::clone(&hits);
        let _a = router.subscribe(id(2), |args| {
            args.set_handled();
            Ok(())
        });
        let _b = router.subscribe(id(1), move |_| {
            *h2.borrow_mut() += 1;
            Ok(())
        });
        let outcome = router.raise(id(2), &0).unwrap();
        assert!(outcome.handled);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let router: EventRouter<u32> = EventRouter::new();
        router.register(id(1), "Thumb", None);
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        let sub = router.subscribe(id(1), move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });
        router.raise(id(1), &0).unwrap();
        drop(sub);
        router.raise(id(1), &0).unwrap();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn first_error_aborts() {
        let router: EventRouter<u32> = EventRouter::new();
        router.register(id(1), "Window", None);
        router.register(id(2), "Thumb", Some(id(1)));
        let reached_root = Rc::new(RefCell::new(false));
        let r = Rc::clone(&reached_root);
        let _a = router.subscribe(id(2), |_| Err(HandlerError::new("boom")));
        let _b = router.subscribe(id(1), move |_| {
            *r.borrow_mut() = true;
            Ok(())
        });
        let err = router.raise(id(2), &0).unwrap_err();
        assert_eq!(err.message(), "boom");
        assert!(!*reached_root.borrow());
    }

    #[test]
    fn handler_may_reenter_router() {
        let router: EventRouter<u32> = EventRouter::new();
        router.register(id(1), "Thumb", None);
        let inner = router.clone();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let _s = router.subscribe(id(1), move |args| {
            *c.borrow_mut() += 1;
            if *args.event == 0 {
                inner.raise(id(1), &1)?;
            }
            Ok(())
        });
        router.raise(id(1), &0).unwrap();
        assert_eq!(*count.borrow(), 2);
    }
}
