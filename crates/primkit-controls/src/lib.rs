#![forbid(unsafe_code)]

//! Interactive primitives: thumb, toggle and repeat buttons, range values
//! and menus.
//!
//! # Role in primkit
//! Each control is a small state machine driven by the host's pointer and
//! key events. Controls never read the platform directly: they coordinate
//! through the shared services of an [`InputContext`] (pointer capture, the
//! routed-event router and the dispatcher) and report what happened as
//! [`ControlEvent`]s routed to ancestor listeners.
//!
//! # Capture discipline
//! Every control that acquires pointer capture releases it on every exit
//! path: normal completion, explicit cancellation, involuntary loss and
//! drop. Involuntary losses are collected by
//! [`PointerCapture::take_lost`](primkit_core::capture::PointerCapture::take_lost)
//! and handed back with [`deliver_lost_capture`].

pub mod button;
pub mod context;
pub mod error;
pub mod menu_base;
pub mod range_base;
pub mod repeat_button;
pub mod thumb;
pub mod toggle_button;

pub use button::{ButtonCore, ButtonResponse, ClickMode};
pub use context::{ControlEvent, InputContext, PointerCapturable, deliver_lost_capture};
pub use error::ControlError;
pub use menu_base::{MenuBase, MenuEntry};
pub use range_base::{RangeBase, ScrollEventType};
pub use repeat_button::{RepeatButton, RepeatConfig, RepeatState};
pub use thumb::{Thumb, ThumbState};
pub use toggle_button::{CheckState, ToggleButton};
