#![forbid(unsafe_code)]

//! Element identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for an interactive element.
///
/// Zero is reserved so that `Option<ElementId>` never aliases a real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    /// Lowest valid element ID.
    pub const MIN: Self = Self(1);

    /// Create an element ID, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out increasing element IDs.
#[derive(Debug, Clone)]
pub struct ElementIdAllocator {
    next: u64,
}

impl Default for ElementIdAllocator {
    fn default() -> Self {
        Self {
            next: ElementId::MIN.0,
        }
    }
}

impl ElementIdAllocator {
    /// Create an allocator starting at [`ElementId::MIN`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next ID.
    pub fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
