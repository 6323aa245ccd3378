#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! The host translates platform input into these values and hands them to
//! interactive primitives. All events derive `Clone` and `PartialEq` for use
//! in tests and pattern matching.
//!
//! # Design Notes
//!
//! - `position` is in the receiving element's local coordinates,
//!   `screen_position` in screen coordinates. Both are supplied by the host.
//! - `inside` is the host's hit-test answer for the receiving element.
//! - `primary` is the state of the primary button at the time of the event,
//!   so a move with the button already released can be detected.

use bitflags::bitflags;

use crate::geometry::Point;

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,
    /// Position in the receiving element's coordinates.
    pub position: Point,
    /// Position in screen coordinates.
    pub screen_position: Point,
    /// State of the primary button.
    pub primary: ButtonState,
    /// Whether the pointer is over the receiving element.
    pub inside: bool,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a pointer event whose local and screen positions coincide.
    #[must_use]
    pub fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        let primary = match kind {
            PointerEventKind::Down(PointerButton::Primary) => ButtonState::Pressed,
            PointerEventKind::Up(PointerButton::Primary) => ButtonState::Released,
            _ => ButtonState::Released,
        };
        Self {
            kind,
            position: Point::new(x, y),
            screen_position: Point::new(x, y),
            primary,
            inside: true,
            modifiers: Modifiers::NONE,
        }
    }

    /// Set the local position independently of the screen position.
    #[must_use]
    pub const fn with_local(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Set the primary button state.
    #[must_use]
    pub const fn with_primary(mut self, primary: ButtonState) -> Self {
        self.primary = primary;
        self
    }

    /// Set the hit-test result.
    #[must_use]
    pub const fn with_inside(mut self, inside: bool) -> Self {
        self.inside = inside;
        self
    }

    /// Set the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether the primary button is held.
    #[must_use]
    pub const fn primary_pressed(&self) -> bool {
        matches!(self.primary, ButtonState::Pressed)
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),
    /// Button released.
    Up(PointerButton),
    /// Pointer moved.
    Move,
    /// Pointer entered the element.
    Enter,
    /// Pointer left the element.
    Leave,
}

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left button / primary touch contact.
    Primary,
    /// Right button.
    Secondary,
    /// Middle button.
    Middle,
}

/// Pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    Pressed,
    #[default]
    Released,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code.
    pub code: KeyCode,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
    /// Press, repeat or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key release.
    #[must_use]
    pub const fn release(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Release,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is a press (or auto-repeat).
    #[must_use]
    pub const fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }
}

/// Key codes the primitives react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Space,
    Enter,
    Escape,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed.
    #[default]
    Press,
    /// Key is being held.
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_event_reports_pressed_primary() {
        let ev = PointerEvent::new(PointerEventKind::Down(PointerButton::Primary), 3.0, 4.0);
        assert!(ev.primary_pressed());
        assert_eq!(ev.position, ev.screen_position);
    }

    #[test]
    fn builders_override_fields() {
        let ev = PointerEvent::new(PointerEventKind::Move, 10.0, 10.0)
            .with_local(Point::new(1.0, 2.0))
            .with_primary(ButtonState::Pressed)
            .with_inside(false);
        assert_eq!(ev.position, Point::new(1.0, 2.0));
        assert_eq!(ev.screen_position, Point::new(10.0, 10.0));
        assert!(ev.primary_pressed());
        assert!(!ev.inside);
    }

    #[test]
    fn key_release_is_not_press() {
        assert!(KeyEvent::new(KeyCode::Space).is_press());
        assert!(!KeyEvent::release(KeyCode::Space).is_press());
    }

    #[test]
    fn modifiers_combine_and_default_to_none() {
        let mods = Modifiers::SHIFT | Modifiers::CTRL;
        assert!(mods.contains(Modifiers::CTRL));
        assert!(!mods.contains(Modifiers::ALT));
        assert_eq!(Modifiers::default(), Modifiers::NONE);
        assert!(KeyEvent::new(KeyCode::Enter).modifiers.is_empty());
    }
}
