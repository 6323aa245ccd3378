#![forbid(unsafe_code)]

//! Press tracking and click detection shared by button-like controls.
//!
//! [`ButtonCore`] turns pointer and key input into two signals: changes of
//! the *pressed* state and *clicks*. What a click means is up to the owning
//! control; a toggle button toggles, a repeat button ignores press clicks and
//! clicks from its timer instead.
//!
//! # Click modes
//!
//! | mode | pressed by | click on |
//! |---|---|---|
//! | `Release` | primary down, space down | release while still pressed |
//! | `Press` | primary down, space down | the press itself |
//! | `Hover` | pointer entering | the pointer entering |
//!
//! Enter clicks immediately in the pointer-driven modes.
//!
//! # Invariants
//!
//! 1. The core holds pointer capture exactly while a pointer or space-key
//!    press is in progress.
//! 2. Capture is released on release, on [`ButtonCore::cancel`], and on drop;
//!    after an involuntary loss the core is no longer pressed.
//! 3. A refused capture request leaves the core unpressed.

use primkit_core::capture::PointerCapture;
use primkit_core::element::ElementId;
use primkit_core::event::{KeyCode, KeyEvent, Modifiers, PointerButton, PointerEvent, PointerEventKind};
use primkit_core::logging::INPUT;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// When a button-like control reports a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClickMode {
    #[default]
    Release,
    Press,
    Hover,
}

/// What one input event did to a [`ButtonCore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonResponse {
    /// The event was consumed.
    pub handled: bool,
    /// A click occurred.
    pub clicked: bool,
    /// The new pressed state, if it changed.
    pub pressed: Option<bool>,
}

impl ButtonResponse {
    const HANDLED: Self = Self {
        handled: true,
        clicked: false,
        pressed: None,
    };
}

/// Shared press/click state machine.
#[derive(Debug)]
pub struct ButtonCore {
    id: ElementId,
    capture: PointerCapture,
    click_mode: ClickMode,
    is_pressed: bool,
    is_pointer_over: bool,
    space_down: bool,
}

impl ButtonCore {
    #[must_use]
    pub fn new(id: ElementId, capture: PointerCapture, click_mode: ClickMode) -> Self {
        Self {
            id,
            capture,
            click_mode,
            is_pressed: false,
            is_pointer_over: false,
            space_down: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn click_mode(&self) -> ClickMode {
        self.click_mode
    }

    /// Change the click mode. An in-progress press is cancelled first.
    pub fn set_click_mode(&mut self, mode: ClickMode) -> ButtonResponse {
        if mode == self.click_mode {
            return ButtonResponse::default();
        }
        let response = self.cancel();
        self.click_mode = mode;
        response
    }

    #[inline]
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.is_pressed
    }

    #[inline]
    #[must_use]
    pub fn is_pointer_over(&self) -> bool {
        self.is_pointer_over
    }

    /// Whether this core holds pointer capture.
    #[must_use]
    pub fn has_capture(&self) -> bool {
        self.capture.is_captured_by(self.id)
    }

    /// Feed a pointer event.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> ButtonResponse {
        match event.kind {
            PointerEventKind::Enter => {
                self.is_pointer_over = true;
                if self.click_mode == ClickMode::Hover {
                    let mut response = self.set_pressed(true);
                    response.clicked = true;
                    response.handled = true;
                    return response;
                }
                ButtonResponse::default()
            }
            PointerEventKind::Leave => {
                self.is_pointer_over = false;
                if self.click_mode == ClickMode::Hover || (self.has_capture() && !self.space_down) {
                    return self.set_pressed(false);
                }
                ButtonResponse::default()
            }
            PointerEventKind::Down(PointerButton::Primary) => self.pointer_down(),
            PointerEventKind::Move => {
                self.is_pointer_over = event.inside;
                if self.click_mode != ClickMode::Hover && self.has_capture() && !self.space_down {
                    return self.set_pressed(event.inside && event.primary_pressed());
                }
                ButtonResponse::default()
            }
            PointerEventKind::Up(PointerButton::Primary) => self.pointer_up(event.inside),
            PointerEventKind::Down(_) | PointerEventKind::Up(_) => ButtonResponse::default(),
        }
    }

    fn pointer_down(&mut self) -> ButtonResponse {
        if self.click_mode == ClickMode::Hover {
            return ButtonResponse::HANDLED;
        }
        if let Err(err) = self.capture.try_capture(self.id) {
            debug!(target: INPUT, id = %self.id, %err, "button press ignored");
            return ButtonResponse::default();
        }
        self.is_pointer_over = true;
        let mut response = self.set_pressed(true);
        response.handled = true;
        response.clicked = self.click_mode == ClickMode::Press;
        response
    }

    fn pointer_up(&mut self, inside: bool) -> ButtonResponse {
        if self.click_mode == ClickMode::Hover || self.space_down {
            return ButtonResponse::default();
        }
        let clicked = self.is_pressed && inside && self.click_mode == ClickMode::Release;
        let held = self.capture.release(self.id);
        let mut response = self.set_pressed(false);
        response.handled = held;
        response.clicked = clicked;
        response
    }

    /// Feed a key event.
    pub fn on_key(&mut self, event: &KeyEvent) -> ButtonResponse {
        if self.click_mode == ClickMode::Hover {
            return ButtonResponse::default();
        }
        match (event.code, event.is_press()) {
            (KeyCode::Space, true) if !event.modifiers.contains(Modifiers::ALT) => {
                if self.space_down || self.has_capture() {
                    return ButtonResponse::HANDLED;
                }
                if self.capture.try_capture(self.id).is_err() {
                    return ButtonResponse::default();
                }
                self.space_down = true;
                let mut response = self.set_pressed(true);
                response.handled = true;
                response.clicked = self.click_mode == ClickMode::Press;
                response
            }
            (KeyCode::Space, false) if self.space_down => {
                self.space_down = false;
                let clicked = self.is_pressed && self.click_mode == ClickMode::Release;
                self.capture.release(self.id);
                let mut response = self.set_pressed(false);
                response.handled = true;
                response.clicked = clicked;
                response
            }
            (KeyCode::Enter, true) => ButtonResponse {
                handled: true,
                clicked: true,
                pressed: None,
            },
            _ => ButtonResponse::default(),
        }
    }

    /// Capture moved elsewhere; drop any press in progress.
    pub fn on_lost_capture(&mut self) -> ButtonResponse {
        if self.has_capture() {
            return ButtonResponse::default();
        }
        self.space_down = false;
        if self.click_mode == ClickMode::Hover {
            return ButtonResponse::default();
        }
        self.set_pressed(false)
    }

    /// Abandon any press without clicking and release capture.
    pub fn cancel(&mut self) -> ButtonResponse {
        self.space_down = false;
        self.capture.release(self.id);
        self.set_pressed(false)
    }

    fn set_pressed(&mut self, pressed: bool) -> ButtonResponse {
        if self.is_pressed == pressed {
            return ButtonResponse::default();
        }
        self.is_pressed = pressed;
        ButtonResponse {
            handled: false,
            clicked: false,
            pressed: Some(pressed),
        }
    }
}

impl Drop for ButtonCore {
    fn drop(&mut self) {
        self.capture.release(self.id);
    }
}
