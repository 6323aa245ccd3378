#![forbid(unsafe_code)]

//! Button that clicks repeatedly while held.
//!
//! # State Machine
//!
//! ```text
//!          press                 first tick (after Delay)
//!   Idle ────────▶ ArmedWaiting ─────────────────────────▶ Repeating
//!    ▲                  │                                     │ tick every Interval
//!    └──────────────────┴──── release / leave / lost capture ─┘
//! ```
//!
//! Time is explicit: the host passes `now` with every input event and calls
//! [`RepeatButton::poll`] from its loop. Each elapsed tick raises one
//! `Click`, in due-time order, so a late poll catches up.
//!
//! # Invariants
//!
//! 1. The press itself never clicks; the first click is due `Delay` after it.
//! 2. No click is raised once the press has ended.
//! 3. `Delay >= 0` and `Interval > 0` always hold; rejected values leave the
//!    previous configuration in place.
//! 4. An `Interval` change while repeating applies from the tick after the
//!    one already scheduled.

use std::time::Duration;

use primkit_core::dispatcher::DispatcherTimer;
use primkit_core::element::ElementId;
use primkit_core::error::{ConfigError, HandlerError};
use primkit_core::event::{KeyCode, KeyEvent, PointerEvent};
use primkit_core::logging::INPUT;
use primkit_core::property::{Property, non_negative_i32, positive_i32};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use web_time::Instant;

use crate::button::{ButtonCore, ButtonResponse, ClickMode};
use crate::context::{ControlEvent, InputContext, PointerCapturable};

/// Repeat timing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatConfig {
    pub delay_ms: i32,
    pub interval_ms: i32,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            delay_ms: 250,
            interval_ms: 33,
        }
    }
}

impl RepeatConfig {
    /// Check both values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative_i32("Delay", &self.delay_ms)?;
        positive_i32("Interval", &self.interval_ms)
    }
}

/// Where a repeat button is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatState {
    #[default]
    Idle,
    ArmedWaiting,
    Repeating,
}

/// A button raising `Click` on a timer while pressed.
#[derive(Debug)]
pub struct RepeatButton {
    core: ButtonCore,
    cx: InputContext,
    delay: Property<i32>,
    interval: Property<i32>,
    timer: DispatcherTimer,
}

fn millis(ms: i32) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

impl RepeatButton {
    pub const KIND: &'static str = "RepeatButton";

    #[must_use]
    pub fn new(cx: &InputContext, id: ElementId, parent: Option<ElementId>) -> Self {
        Self::build(cx, id, parent, RepeatConfig::default())
    }

    /// Create with explicit timing.
    ///
    /// # Errors
    ///
    /// Returns the first rejected value of `config`; nothing is registered.
    pub fn with_config(
        cx: &InputContext,
        id: ElementId,
        parent: Option<ElementId>,
        config: RepeatConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(cx, id, parent, config))
    }

    fn build(
        cx: &InputContext,
        id: ElementId,
        parent: Option<ElementId>,
        config: RepeatConfig,
    ) -> Self {
        cx.router.register(id, Self::KIND, parent);
        Self {
            core: ButtonCore::new(id, cx.capture.clone(), ClickMode::Press),
            cx: cx.clone(),
            delay: Property::validated("Delay", config.delay_ms, non_negative_i32),
            interval: Property::validated("Interval", config.interval_ms, positive_i32),
            timer: DispatcherTimer::new(millis(config.interval_ms)),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.core.id()
    }

    #[must_use]
    pub fn config(&self) -> RepeatConfig {
        RepeatConfig {
            delay_ms: self.delay.get(),
            interval_ms: self.interval.get(),
        }
    }

    #[must_use]
    pub fn delay(&self) -> i32 {
        self.delay.get()
    }

    #[must_use]
    pub fn interval(&self) -> i32 {
        self.interval.get()
    }

    /// Set the delay before the first click. Takes effect at the next press.
    pub fn set_delay(&mut self, delay_ms: i32) -> Result<bool, ConfigError> {
        self.delay.set(delay_ms)
    }

    /// Set the repeat interval.
    pub fn set_interval(&mut self, interval_ms: i32) -> Result<bool, ConfigError> {
        let changed = self.interval.set(interval_ms)?;
        if changed && self.timer.is_enabled() {
            self.timer.set_interval(millis(interval_ms));
        }
        Ok(changed)
    }

    /// Apply both values, or neither if either is rejected.
    pub fn apply_config(&mut self, config: RepeatConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.set_delay(config.delay_ms)?;
        self.set_interval(config.interval_ms)?;
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> RepeatState {
        match (self.timer.is_enabled(), self.timer.ticks()) {
            (false, _) => RepeatState::Idle,
            (true, 0) => RepeatState::ArmedWaiting,
            (true, _) => RepeatState::Repeating,
        }
    }

    /// Due time of the next click while armed or repeating.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    #[must_use]
    pub fn core(&self) -> &ButtonCore {
        &self.core
    }

    /// Change the activation mode. A press in progress ends.
    pub fn set_click_mode(&mut self, mode: ClickMode) {
        let response = self.core.set_click_mode(mode);
        self.follow_press(response, None);
    }

    /// Feed a pointer event received at `now`.
    pub fn on_pointer(&mut self, event: &PointerEvent, now: Instant) -> bool {
        let response = self.core.on_pointer(event);
        self.follow_press(response, Some(now));
        response.handled || response.pressed.is_some()
    }

    /// Feed a key event received at `now`. Enter clicks once.
    pub fn on_key(&mut self, event: &KeyEvent, now: Instant) -> Result<bool, HandlerError> {
        let response = self.core.on_key(event);
        self.follow_press(response, Some(now));
        if response.clicked && event.code == KeyCode::Enter {
            self.cx.raise(self.id(), ControlEvent::Click)?;
        }
        Ok(response.handled)
    }

    /// Raise one `Click` per tick elapsed by `now`. Returns how many fired.
    pub fn poll(&mut self, now: Instant) -> Result<usize, HandlerError> {
        let mut fired = 0;
        while self.core.is_pressed() {
            let Some(due) = self.timer.poll(now) else {
                break;
            };
            trace!(target: INPUT, id = %self.id(), tick = self.timer.ticks(), ?due, "repeat");
            fired += 1;
            self.cx.raise(self.id(), ControlEvent::Click)?;
        }
        Ok(fired)
    }

    fn follow_press(&mut self, response: ButtonResponse, now: Option<Instant>) {
        match (response.pressed, now) {
            (Some(true), Some(now)) => self.start_timer(now),
            (Some(false), _) => self.stop_timer(),
            _ => {}
        }
    }

    fn start_timer(&mut self, now: Instant) {
        self.timer.set_interval(millis(self.interval.get()));
        self.timer.start_after(now, millis(self.delay.get()));
        debug!(target: INPUT, id = %self.id(), delay_ms = self.delay.get(), "repeat armed");
    }

    fn stop_timer(&mut self) {
        if self.timer.is_enabled() {
            self.timer.stop();
            debug!(target: INPUT, id = %self.id(), ticks = self.timer.ticks(), "repeat stopped");
        }
    }
}

impl PointerCapturable for RepeatButton {
    fn element_id(&self) -> ElementId {
        self.id()
    }

    fn on_lost_capture(&mut self) -> Result<(), HandlerError> {
        let response = self.core.on_lost_capture();
        self.follow_press(response, None);
        Ok(())
    }
}

impl Drop for RepeatButton {
    fn drop(&mut self) {
        self.cx.router.unregister(self.core.id());
    }
}
