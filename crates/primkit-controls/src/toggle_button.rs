#![forbid(unsafe_code)]

//! Two- or three-state toggle button.
//!
//! Activation (a click from the shared [`ButtonCore`]) advances the check
//! state:
//!
//! ```text
//! Unchecked ─▶ Checked ─▶ Indeterminate ─▶ Unchecked     (three-state)
//! Unchecked ─▶ Checked ─▶ Unchecked                      (two-state)
//! ```
//!
//! Assigning the state directly may set any of the three, whether or not
//! the button is three-state. Every change raises exactly one of `Checked`,
//! `Unchecked` or `Indeterminate`; a click then raises `Click`.

use primkit_core::element::ElementId;
use primkit_core::error::HandlerError;
use primkit_core::event::{KeyEvent, PointerEvent};
use primkit_core::logging::INPUT;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::button::{ButtonCore, ButtonResponse, ClickMode};
use crate::context::{ControlEvent, InputContext, PointerCapturable};

/// Check state of a toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
    Indeterminate,
}

impl CheckState {
    /// The state reached by one toggle action.
    #[must_use]
    pub const fn next(self, three_state: bool) -> Self {
        match self {
            Self::Unchecked => Self::Checked,
            Self::Checked if three_state => Self::Indeterminate,
            Self::Checked | Self::Indeterminate => Self::Unchecked,
        }
    }

    const fn event(self) -> ControlEvent {
        match self {
            Self::Unchecked => ControlEvent::Unchecked,
            Self::Checked => ControlEvent::Checked,
            Self::Indeterminate => ControlEvent::Indeterminate,
        }
    }
}

impl From<Option<bool>> for CheckState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Checked,
            Some(false) => Self::Unchecked,
            None => Self::Indeterminate,
        }
    }
}

impl From<CheckState> for Option<bool> {
    fn from(state: CheckState) -> Self {
        match state {
            CheckState::Checked => Some(true),
            CheckState::Unchecked => Some(false),
            CheckState::Indeterminate => None,
        }
    }
}

/// Button whose activation cycles its [`CheckState`].
#[derive(Debug)]
pub struct ToggleButton {
    core: ButtonCore,
    cx: InputContext,
    state: CheckState,
    is_three_state: bool,
}

impl ToggleButton {
    pub const KIND: &'static str = "ToggleButton";

    #[must_use]
    pub fn new(cx: &InputContext, id: ElementId, parent: Option<ElementId>) -> Self {
        cx.router.register(id, Self::KIND, parent);
        Self {
            core: ButtonCore::new(id, cx.capture.clone(), ClickMode::Release),
            cx: cx.clone(),
            state: CheckState::Unchecked,
            is_three_state: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.core.id()
    }

    #[inline]
    #[must_use]
    pub fn check_state(&self) -> CheckState {
        self.state
    }

    #[must_use]
    pub fn is_checked(&self) -> Option<bool> {
        self.state.into()
    }

    #[inline]
    #[must_use]
    pub fn is_three_state(&self) -> bool {
        self.is_three_state
    }

    /// Takes effect at the next toggle; the current state is kept.
    pub fn set_is_three_state(&mut self, three_state: bool) {
        self.is_three_state = three_state;
    }

    #[must_use]
    pub fn core(&self) -> &ButtonCore {
        &self.core
    }

    pub fn set_click_mode(&mut self, mode: ClickMode) {
        self.core.set_click_mode(mode);
    }

    /// Assign the state directly. Returns whether it changed.
    pub fn set_is_checked(&mut self, value: impl Into<CheckState>) -> Result<bool, HandlerError> {
        let next = value.into();
        if next == self.state {
            return Ok(false);
        }
        self.state = next;
        trace!(target: INPUT, id = %self.id(), state = ?next, "check state changed");
        self.cx.raise(self.id(), next.event())?;
        Ok(true)
    }

    /// Perform one toggle action.
    pub fn toggle(&mut self) -> Result<CheckState, HandlerError> {
        let next = self.state.next(self.is_three_state);
        self.set_is_checked(next)?;
        Ok(next)
    }

    /// Feed a pointer event. Returns whether it was handled.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> Result<bool, HandlerError> {
        let response = self.core.on_pointer(event);
        self.apply(response)
    }

    /// Feed a key event. Returns whether it was handled.
    pub fn on_key(&mut self, event: &KeyEvent) -> Result<bool, HandlerError> {
        let response = self.core.on_key(event);
        self.apply(response)
    }

    fn apply(&mut self, response: ButtonResponse) -> Result<bool, HandlerError> {
        if response.clicked {
            self.toggle()?;
            self.cx.raise(self.id(), ControlEvent::Click)?;
        }
        Ok(response.handled)
    }
}

impl PointerCapturable for ToggleButton {
    fn element_id(&self) -> ElementId {
        self.id()
    }

    fn on_lost_capture(&mut self) -> Result<(), HandlerError> {
        self.core.on_lost_capture();
        Ok(())
    }
}

impl Drop for ToggleButton {
    fn drop(&mut self) {
        self.cx.router.unregister(self.core.id());
    }
}
