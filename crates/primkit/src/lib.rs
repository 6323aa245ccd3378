#![forbid(unsafe_code)]

//! primkit public facade crate.
//!
//! Re-exports the layout and control layers together with the core types
//! they share, plus a prelude for day-to-day use.

use thiserror::Error;

// --- Core re-exports -------------------------------------------------------

pub use primkit_core::capture::PointerCapture;
pub use primkit_core::dispatcher::{Dispatcher, DispatcherTimer};
pub use primkit_core::element::{ElementId, ElementIdAllocator};
pub use primkit_core::error::{CaptureError, ConfigError, HandlerError};
pub use primkit_core::event::{
    ButtonState, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton, PointerEvent,
    PointerEventKind,
};
pub use primkit_core::geometry::{Orientation, Point, Rect, Size, Vector};
pub use primkit_core::property::Property;
pub use primkit_core::routing::{EventRouter, RoutedArgs, Subscription};

// --- Layout re-exports -----------------------------------------------------

pub use primkit_layout::{
    BulletDecorator, Dock, Fixed, GeneratorPosition, ItemContainerGenerator, ItemGenerator,
    LayoutElement, LayoutError, LayoutTree, NodeId, NodeProps, OverflowMode, PopupRoot,
    SelectiveScrollingGrid, SelectiveScrollingOrientation, TabPanel, ToolBar, UniformGrid,
    Visibility,
};

// --- Control re-exports ----------------------------------------------------

pub use primkit_controls::{
    ButtonCore, CheckState, ClickMode, ControlError, ControlEvent, InputContext, MenuBase,
    MenuEntry, RangeBase, RepeatButton, RepeatConfig, ScrollEventType, Thumb, ToggleButton,
};

// --- Errors ---------------------------------------------------------------

/// Any error a primkit operation can return.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Standard result type for primkit APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ControlEvent, ElementId, Error, InputContext, KeyCode, KeyEvent, LayoutElement,
        LayoutTree, NodeId, Orientation, PointerEvent, PointerEventKind, Rect, Result, Size,
    };

    pub use crate::{controls, core, layout};
}

pub use primkit_controls as controls;
pub use primkit_core as core;
pub use primkit_layout as layout;
