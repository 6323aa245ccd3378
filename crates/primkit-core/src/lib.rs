#![forbid(unsafe_code)]

//! Core: geometry, input events, pointer capture, routed events and the
//! cooperative dispatcher.
//!
//! # Role in primkit
//! `primkit-core` is the bottom layer. It owns the value types every other
//! crate speaks (sizes, rects, pointer and key events), plus the few shared
//! services that interactive primitives coordinate through on the UI thread.
//!
//! # Primary responsibilities
//! - **Geometry**: `f64` sizes, points, vectors and rects for layout.
//! - **Event**: canonical pointer and key events delivered by the host.
//! - **PointerCapture**: the single exclusive pointer-capture slot.
//! - **EventRouter**: bubble routing with per-kind class handlers.
//! - **Property**: typed, validated, observable values.
//! - **Dispatcher / DispatcherTimer**: deferred work and timer ticks.
//!
//! # How it fits in the system
//! `primkit-layout` builds the measure/arrange protocol on top of the geometry
//! types; `primkit-controls` drives its state machines from [`event`] values
//! and reports through [`routing::EventRouter`]. Nothing here spawns threads
//! or blocks: "later" always means "queued on the UI thread".

pub mod capture;
pub mod dispatcher;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod property;
pub mod routing;

pub use capture::PointerCapture;
pub use element::{ElementId, ElementIdAllocator};
pub use error::{CaptureError, ConfigError, HandlerError};
pub use geometry::{Orientation, Point, Rect, Size, Vector};
