#![forbid(unsafe_code)]

//! Menu keyboard navigation and menu mode.
//!
//! A [`MenuBase`] owns an ordered list of entries and a *current* entry.
//! While in menu mode it holds pointer capture, so a press outside the menu
//! reaches it and closes it.
//!
//! # Navigation
//!
//! | key | horizontal (menu bar) | vertical (drop-down) |
//! |---|---|---|
//! | next | Right | Down |
//! | previous | Left | Up |
//! | first / last | Home / End | Home / End |
//!
//! Movement wraps around and skips disabled and hidden entries.
//!
//! # Notifications
//!
//! `MenuOpened` and `MenuClosed` are not raised synchronously; they are
//! queued on the [`Dispatcher`](primkit_core::dispatcher::Dispatcher) and
//! delivered at the host's next drain.

use primkit_core::element::ElementId;
use primkit_core::error::{CaptureError, HandlerError};
use primkit_core::event::{KeyCode, KeyEvent, PointerButton, PointerEvent, PointerEventKind};
use primkit_core::geometry::Orientation;
use primkit_core::logging::INPUT;
use tracing::{debug, warn};

use crate::context::{ControlEvent, InputContext, PointerCapturable};

/// One entry of a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: ElementId,
    pub enabled: bool,
    pub visible: bool,
}

impl MenuEntry {
    #[must_use]
    pub const fn new(id: ElementId) -> Self {
        Self {
            id,
            enabled: true,
            visible: true,
        }
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Whether keyboard navigation may stop here.
    #[inline]
    #[must_use]
    pub const fn is_navigable(&self) -> bool {
        self.enabled && self.visible
    }
}

/// Menu entries with a current item and menu mode.
#[derive(Debug)]
pub struct MenuBase {
    id: ElementId,
    cx: InputContext,
    orientation: Orientation,
    entries: Vec<MenuEntry>,
    current: Option<usize>,
    menu_mode: bool,
}

impl MenuBase {
    pub const KIND: &'static str = "MenuBase";

    #[must_use]
    pub fn new(
        cx: &InputContext,
        id: ElementId,
        parent: Option<ElementId>,
        orientation: Orientation,
    ) -> Self {
        cx.router.register(id, Self::KIND, parent);
        Self {
            id,
            cx: cx.clone(),
            orientation,
            entries: Vec::new(),
            current: None,
            menu_mode: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: MenuEntry) {
        self.entries.push(entry);
    }

    /// Remove the entry at `index`. The current item follows its entry, or
    /// is cleared if that entry was removed.
    pub fn remove(&mut self, index: usize) -> Option<MenuEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        self.current = match self.current {
            Some(c) if c == index => None,
            Some(c) if c > index => Some(c - 1),
            other => other,
        };
        Some(entry)
    }

    /// Enable or disable an entry. A disabled current entry stops being
    /// current.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        entry.enabled = enabled;
        self.drop_unnavigable_current();
        true
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        entry.visible = visible;
        self.drop_unnavigable_current();
        true
    }

    fn drop_unnavigable_current(&mut self) {
        let navigable = self
            .current
            .and_then(|c| self.entries.get(c))
            .is_some_and(MenuEntry::is_navigable);
        if !navigable {
            self.current = None;
        }
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Make `index` current, e.g. when the pointer hovers it. Returns
    /// `false` for entries navigation may not stop at.
    pub fn set_current(&mut self, index: Option<usize>) -> bool {
        match index {
            None => {
                self.current = None;
                true
            }
            Some(i) if self.entries.get(i).is_some_and(MenuEntry::is_navigable) => {
                self.current = Some(i);
                true
            }
            Some(_) => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_menu_mode(&self) -> bool {
        self.menu_mode
    }

    /// Enter menu mode: take pointer capture and select the first entry.
    pub fn enter_menu_mode(&mut self) -> Result<(), CaptureError> {
        if self.menu_mode {
            return Ok(());
        }
        self.cx.capture.try_capture(self.id)?;
        self.menu_mode = true;
        if self.current.is_none() {
            self.current = self.step(None, true);
        }
        debug!(target: INPUT, id = %self.id, current = ?self.current, "menu mode entered");
        self.post(ControlEvent::MenuOpened);
        Ok(())
    }

    /// Leave menu mode and release capture. No-op outside menu mode.
    pub fn exit_menu_mode(&mut self) {
        if !self.menu_mode {
            return;
        }
        self.menu_mode = false;
        self.current = None;
        self.cx.capture.release(self.id);
        debug!(target: INPUT, id = %self.id, "menu mode left");
        self.post(ControlEvent::MenuClosed);
    }

    fn post(&self, event: ControlEvent) {
        let router = self.cx.router.clone();
        let id = self.id;
        self.cx.dispatcher.begin_invoke(move || {
            if let Err(err) = router.raise(id, &event) {
                warn!(target: INPUT, %id, ?event, %err, "deferred menu notification failed");
            }
        });
    }

    /// Next navigable entry after `from` (or the first, if `None`) in the
    /// given direction, wrapping around.
    fn step(&self, from: Option<usize>, forward: bool) -> Option<usize> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        let start = match (from, forward) {
            (Some(i), true) => i + 1,
            (Some(i), false) => i + len - 1,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        (0..len)
            .map(|k| {
                if forward {
                    (start + k) % len
                } else {
                    (start + len - k) % len
                }
            })
            .find(|&i| self.entries[i].is_navigable())
    }

    fn navigation_keys(&self) -> (KeyCode, KeyCode) {
        match self.orientation {
            Orientation::Horizontal => (KeyCode::Left, KeyCode::Right),
            Orientation::Vertical => (KeyCode::Up, KeyCode::Down),
        }
    }

    /// Feed a key event. Keys only act in menu mode.
    pub fn on_key(&mut self, event: &KeyEvent) -> Result<bool, HandlerError> {
        if !self.menu_mode || !event.is_press() {
            return Ok(false);
        }
        let (previous, next) = self.navigation_keys();
        match event.code {
            code if code == next => self.current = self.step(self.current, true),
            code if code == previous => self.current = self.step(self.current, false),
            KeyCode::Home => self.current = self.step(None, true),
            KeyCode::End => self.current = self.step(None, false),
            KeyCode::Escape => self.exit_menu_mode(),
            KeyCode::Enter | KeyCode::Space => {
                let Some(index) = self.current else {
                    return Ok(true);
                };
                self.exit_menu_mode();
                self.cx.raise(self.id, ControlEvent::ItemInvoked { index })?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Feed a pointer event. A press outside the menu leaves menu mode.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> bool {
        if !self.menu_mode {
            return false;
        }
        match event.kind {
            PointerEventKind::Down(PointerButton::Primary) if !event.inside => {
                self.exit_menu_mode();
                true
            }
            _ => false,
        }
    }
}

impl PointerCapturable for MenuBase {
    fn element_id(&self) -> ElementId {
        self.id
    }

    fn on_lost_capture(&mut self) -> Result<(), HandlerError> {
        if !self.cx.capture.is_captured_by(self.id) {
            self.exit_menu_mode();
        }
        Ok(())
    }
}

impl Drop for MenuBase {
    fn drop(&mut self) {
        self.cx.capture.release(self.id);
        self.cx.router.unregister(self.id);
    }
}
