#![forbid(unsafe_code)]

//! Draggable thumb.
//!
//! # State Machine
//!
//! ```text
//!            primary down (capture granted)
//!   Idle ────────────────────────────────────▶ Dragging
//!    ▲                                           │  move (screen position changed)
//!    │  up / cancel_drag / lost capture /        │  ──▶ DragDelta
//!    │  primary found released                   │
//!    └───────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. Every `DragDelta` reports the displacement from the press point, not
//!    from the previous move.
//! 2. Exactly one `DragCompleted` is raised per drag; `canceled` is `false`
//!    only when the drag ended with a primary-button release.
//! 3. The thumb holds capture exactly while dragging. Capture is released
//!    before `DragCompleted` is raised, so a failing handler cannot leak it.
//!
//! # Failure Modes
//!
//! - A `DragStarted` handler error cancels the drag (raising a canceled
//!   `DragCompleted`) and is then returned to the caller unchanged.
//! - A refused capture request leaves the thumb idle; the press is not
//!   handled.

use primkit_core::element::ElementId;
use primkit_core::error::HandlerError;
use primkit_core::event::{PointerButton, PointerEvent, PointerEventKind};
use primkit_core::geometry::{Point, Vector};
use primkit_core::logging::INPUT;
use tracing::{debug, trace};

use crate::context::{ControlEvent, InputContext, PointerCapturable};

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    origin_local: Point,
    origin_screen: Point,
    previous_screen: Point,
}

/// Observable drag state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbState {
    #[default]
    Idle,
    Dragging,
}

/// A control that can be dragged with the primary pointer button.
#[derive(Debug)]
pub struct Thumb {
    id: ElementId,
    cx: InputContext,
    session: Option<DragSession>,
}

impl Thumb {
    /// Kind name used for class handlers.
    pub const KIND: &'static str = "Thumb";

    /// Create a thumb and register it with the router under `parent`.
    #[must_use]
    pub fn new(cx: &InputContext, id: ElementId, parent: Option<ElementId>) -> Self {
        cx.router.register(id, Self::KIND, parent);
        Self {
            id,
            cx: cx.clone(),
            session: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> ThumbState {
        if self.session.is_some() {
            ThumbState::Dragging
        } else {
            ThumbState::Idle
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Feed a pointer event. Returns whether the event was handled.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> Result<bool, HandlerError> {
        match event.kind {
            PointerEventKind::Down(PointerButton::Primary) => self.begin_drag(event),
            PointerEventKind::Move => self.drag_move(event),
            PointerEventKind::Up(PointerButton::Primary) => self.end_drag(event),
            _ => Ok(false),
        }
    }

    fn begin_drag(&mut self, event: &PointerEvent) -> Result<bool, HandlerError> {
        if self.session.is_some() {
            return Ok(false);
        }
        if let Err(err) = self.cx.capture.try_capture(self.id) {
            debug!(target: INPUT, id = %self.id, %err, "drag not started");
            return Ok(false);
        }
        self.session = Some(DragSession {
            origin_local: event.position,
            origin_screen: event.screen_position,
            previous_screen: event.screen_position,
        });
        debug!(target: INPUT, id = %self.id, origin = ?event.screen_position, "drag started");

        let started = ControlEvent::DragStarted {
            horizontal_offset: event.position.x,
            vertical_offset: event.position.y,
        };
        if let Err(err) = self.cx.raise(self.id, started) {
            debug!(target: INPUT, id = %self.id, %err, "drag start handler failed");
            // The handler's error wins over anything the cleanup raises.
            let _ = self.cancel_drag();
            return Err(err);
        }
        Ok(true)
    }

    fn drag_move(&mut self, event: &PointerEvent) -> Result<bool, HandlerError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        if !event.primary_pressed() || !self.cx.capture.is_captured_by(self.id) {
            self.cancel_drag()?;
            return Ok(false);
        }
        if event.screen_position == session.previous_screen {
            return Ok(false);
        }
        session.previous_screen = event.screen_position;
        let change = event.position - session.origin_local;
        trace!(target: INPUT, id = %self.id, ?change, "drag delta");
        self.cx.raise(
            self.id,
            ControlEvent::DragDelta {
                horizontal_change: change.x,
                vertical_change: change.y,
            },
        )?;
        Ok(true)
    }

    fn end_drag(&mut self, event: &PointerEvent) -> Result<bool, HandlerError> {
        if self.session.is_none() {
            return Ok(false);
        }
        if !self.cx.capture.is_captured_by(self.id) {
            // Capture went elsewhere before the loss was delivered.
            self.cancel_drag()?;
            return Ok(false);
        }
        let Some(session) = self.session.take() else {
            return Ok(false);
        };
        self.cx.capture.release(self.id);
        let change = event.screen_position - session.origin_screen;
        self.complete(change, false)?;
        Ok(true)
    }

    /// End the drag as canceled. No-op when idle.
    pub fn cancel_drag(&mut self) -> Result<(), HandlerError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.cx.capture.release(self.id);
        self.complete(session.previous_screen - session.origin_screen, true)
    }

    fn complete(&self, change: Vector, canceled: bool) -> Result<(), HandlerError> {
        debug!(target: INPUT, id = %self.id, ?change, canceled, "drag completed");
        self.cx
            .raise(
                self.id,
                ControlEvent::DragCompleted {
                    horizontal_change: change.x,
                    vertical_change: change.y,
                    canceled,
                },
            )
            .map(|_| ())
    }
}

impl PointerCapturable for Thumb {
    fn element_id(&self) -> ElementId {
        self.id
    }

    fn on_lost_capture(&mut self) -> Result<(), HandlerError> {
        if self.cx.capture.is_captured_by(self.id) {
            return Ok(());
        }
        self.cancel_drag()
    }
}

impl Drop for Thumb {
    fn drop(&mut self) {
        self.cx.capture.release(self.id);
        self.cx.router.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primkit_core::event::ButtonState;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<ControlEvent>>>;

    fn setup() -> (InputContext, Thumb, Log) {
        let cx = InputContext::new();
        let thumb = Thumb::new(&cx, ElementId::new(1).unwrap(), None);
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        cx.router
            .subscribe(thumb.id(), move |args| {
                sink.borrow_mut().push(*args.event);
                Ok(())
            })
            .detach();
        (cx, thumb, log)
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(PointerEventKind::Down(PointerButton::Primary), x, y)
    }

    fn drag_to(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(PointerEventKind::Move, x, y).with_primary(ButtonState::Pressed)
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(PointerEventKind::Up(PointerButton::Primary), x, y)
    }

    #[test]
    fn press_move_release_scenario() {
        let (cx, mut thumb, log) = setup();
        assert!(thumb.on_pointer(&down(100.0, 100.0).with_local(Point::ORIGIN)).unwrap());
        assert!(thumb.on_pointer(&drag_to(130.0, 115.0).with_local(Point::new(30.0, 15.0))).unwrap());
        assert!(thumb.on_pointer(&up(130.0, 115.0)).unwrap());

        assert_eq!(
            *log.borrow(),
            vec![
                ControlEvent::DragStarted {
                    horizontal_offset: 0.0,
                    vertical_offset: 0.0
                },
                ControlEvent::DragDelta {
                    horizontal_change: 30.0,
                    vertical_change: 15.0
                },
                ControlEvent::DragCompleted {
                    horizontal_change: 30.0,
                    vertical_change: 15.0,
                    canceled: false
                },
            ]
        );
        assert_eq!(cx.capture.holder(), None);
        assert_eq!(thumb.state(), ThumbState::Idle);
    }

    #[test]
    fn deltas_are_cumulative_and_skip_unmoved() {
        let (_cx, mut thumb, log) = setup();
        thumb.on_pointer(&down(10.0, 10.0)).unwrap();
        thumb.on_pointer(&drag_to(15.0, 10.0)).unwrap();
        assert!(!thumb.on_pointer(&drag_to(15.0, 10.0)).unwrap());
        thumb.on_pointer(&drag_to(20.0, 12.0)).unwrap();
        let deltas: Vec<_> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                ControlEvent::DragDelta {
                    horizontal_change,
                    vertical_change,
                } => Some((*horizontal_change, *vertical_change)),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec![(5.0, 0.0), (10.0, 2.0)]);
    }

    #[test]
    fn cancel_reports_last_position() {
        let (cx, mut thumb, log) = setup();
        thumb.on_pointer(&down(0.0, 0.0)).unwrap();
        thumb.on_pointer(&drag_to(7.0, 3.0)).unwrap();
        thumb.cancel_drag().unwrap();
        thumb.cancel_drag().unwrap();
        assert_eq!(
            log.borrow().last(),
            Some(&ControlEvent::DragCompleted {
                horizontal_change: 7.0,
                vertical_change: 3.0,
                canceled: true
            })
        );
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(cx.capture.holder(), None);
    }

    #[test]
    fn released_button_during_move_cancels() {
        let (cx, mut thumb, log) = setup();
        thumb.on_pointer(&down(0.0, 0.0)).unwrap();
        let stale = PointerEvent::new(PointerEventKind::Move, 4.0, 4.0);
        assert!(!thumb.on_pointer(&stale).unwrap());
        assert!(matches!(
            log.borrow().last(),
            Some(ControlEvent::DragCompleted { canceled: true, .. })
        ));
        assert_eq!(cx.capture.holder(), None);
    }

    #[test]
    fn involuntary_capture_loss_cancels() {
        let (cx, mut thumb, log) = setup();
        thumb.on_pointer(&down(0.0, 0.0)).unwrap();
        cx.capture.force(ElementId::new(5));
        let delivered = crate::context::deliver_lost_capture(&cx.capture, &mut [&mut thumb]).unwrap();
        assert_eq!(delivered, 1);
        assert!(!thumb.is_dragging());
        assert!(matches!(
            log.borrow().last(),
            Some(ControlEvent::DragCompleted { canceled: true, .. })
        ));
        // The new holder keeps capture.
        assert_eq!(cx.capture.holder(), ElementId::new(5));
    }

    #[test]
    fn release_after_undelivered_loss_cancels_once() {
        let (cx, mut thumb, log) = setup();
        thumb.on_pointer(&down(0.0, 0.0)).unwrap();
        thumb.on_pointer(&drag_to(4.0, 2.0)).unwrap();
        cx.capture.force(ElementId::new(5));
        assert!(!thumb.on_pointer(&up(9.0, 9.0)).unwrap());
        assert!(!thumb.is_dragging());
        crate::context::deliver_lost_capture(&cx.capture, &mut [&mut thumb]).unwrap();
        let completed: Vec<_> = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, ControlEvent::DragCompleted { .. }))
            .copied()
            .collect();
        assert_eq!(
            completed,
            vec![ControlEvent::DragCompleted {
                horizontal_change: 4.0,
                vertical_change: 2.0,
                canceled: true,
            }]
        );
        assert_eq!(cx.capture.holder(), ElementId::new(5));
    }

    #[test]
    fn failing_start_handler_rolls_back() {
        let cx = InputContext::new();
        let parent = ElementId::new(10).unwrap();
        cx.router.register(parent, "Track", None);
        let mut thumb = Thumb::new(&cx, ElementId::new(1).unwrap(), Some(parent));
        let completed = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&completed);
        let _sub = cx.router.subscribe(parent, move |args| match args.event {
            ControlEvent::DragStarted { .. } => Err(HandlerError::new("no drag here")),
            ControlEvent::DragCompleted { canceled, .. } => {
                assert!(*canceled);
                *seen.borrow_mut() += 1;
                Ok(())
            }
            _ => Ok(()),
        });

        let err = thumb.on_pointer(&down(1.0, 1.0)).unwrap_err();
        assert_eq!(err.message(), "no drag here");
        assert_eq!(*completed.borrow(), 1);
        assert!(!thumb.is_dragging());
        assert_eq!(cx.capture.holder(), None);
    }

    #[test]
    fn refused_capture_keeps_thumb_idle() {
        let (cx, mut thumb, log) = setup();
        let menu = ElementId::new(3).unwrap();
        cx.capture.try_capture(menu).unwrap();
        cx.capture.set_exclusive(menu, true);
        assert!(!thumb.on_pointer(&down(0.0, 0.0)).unwrap());
        assert!(log.borrow().is_empty());
        assert_eq!(cx.capture.holder(), Some(menu));
    }

    #[test]
    fn drop_releases_capture() {
        let (cx, mut thumb, _log) = setup();
        thumb.on_pointer(&down(0.0, 0.0)).unwrap();
        drop(thumb);
        assert_eq!(cx.capture.holder(), None);
    }
}
