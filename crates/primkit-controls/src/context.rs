#![forbid(unsafe_code)]

//! Shared input services and the routed control events.

use primkit_core::capture::PointerCapture;
use primkit_core::dispatcher::Dispatcher;
use primkit_core::element::ElementId;
use primkit_core::error::HandlerError;
use primkit_core::logging::INPUT;
use primkit_core::routing::{EventRouter, RouteOutcome};
use tracing::trace;

use crate::range_base::ScrollEventType;

/// Notifications raised by controls and bubbled to ancestors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// A thumb drag began; offsets are the press point in thumb coordinates.
    DragStarted {
        horizontal_offset: f64,
        vertical_offset: f64,
    },
    /// Displacement since the drag started, in thumb coordinates.
    DragDelta {
        horizontal_change: f64,
        vertical_change: f64,
    },
    /// The drag ended. Changes are screen displacement since the drag started.
    DragCompleted {
        horizontal_change: f64,
        vertical_change: f64,
        canceled: bool,
    },
    Click,
    Checked,
    Unchecked,
    Indeterminate,
    ValueChanged {
        old: f64,
        new: f64,
    },
    Scroll {
        kind: ScrollEventType,
        new_value: f64,
    },
    /// A menu entry was invoked from the keyboard.
    ItemInvoked {
        index: usize,
    },
    MenuOpened,
    MenuClosed,
}

/// The services a window's controls coordinate through.
///
/// Cloning shares the underlying capture slot, router and queue.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub capture: PointerCapture,
    pub router: EventRouter<ControlEvent>,
    pub dispatcher: Dispatcher,
}

impl InputContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `event` from `source`.
    pub fn raise(
        &self,
        source: ElementId,
        event: ControlEvent,
    ) -> Result<RouteOutcome, HandlerError> {
        trace!(target: INPUT, %source, ?event, "raise");
        self.router.raise(source, &event)
    }
}

/// A control that may hold pointer capture and must react to losing it.
pub trait PointerCapturable {
    /// The element this control raises events from.
    fn element_id(&self) -> ElementId;

    /// Capture moved elsewhere without the control asking for it.
    fn on_lost_capture(&mut self) -> Result<(), HandlerError>;
}

/// Drain the capture slot's loss queue and notify the matching targets.
///
/// Returns how many targets were notified. Every target is notified even if
/// an earlier one fails; the first error is returned.
pub fn deliver_lost_capture(
    capture: &PointerCapture,
    targets: &mut [&mut dyn PointerCapturable],
) -> Result<usize, HandlerError> {
    let mut notified = 0;
    let mut first_error = None;
    for lost in capture.take_lost() {
        for target in targets.iter_mut().filter(|t| t.element_id() == lost) {
            notified += 1;
            if let Err(err) = target.on_lost_capture() {
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(notified),
    }
}
