#![forbid(unsafe_code)]

//! Item-container generation.
//!
//! A host with `n` items realizes containers only for the items it needs.
//! Realized and unrealized items are addressed by [`GeneratorPosition`]:
//! `index` is the ordinal of a realized item among the realized ones and
//! `offset` counts unrealized items from there (0 = the realized item
//! itself). Index `-1` stands for the virtual item before the first and
//! after the last item.
//!
//! # Invariants
//!
//! 1. `index_from_position(position_from_index(i)) == i` for every item
//!    index `i` in range.
//! 2. Only one generation run is active at a time; the [`GeneratorScope`]
//!    returned by `start_at` ends the run when dropped.
//! 3. `generate_next` reports `true` exactly when it realized a container
//!    that was not realized before.
//!
//! # Failure Modes
//!
//! - Starting while a run is active yields [`GeneratorError::AlreadyGenerating`].
//! - Removing or recycling anything but a run of realized items yields
//!   [`GeneratorError::NotRealized`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use primkit_core::logging::GENERATOR;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Address of an item relative to the realized items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorPosition {
    pub index: i32,
    pub offset: i32,
}

impl GeneratorPosition {
    /// Sentinel before the first / after the last item.
    pub const BOUNDARY: Self = Self::new(-1, 0);

    #[inline]
    #[must_use]
    pub const fn new(index: i32, offset: i32) -> Self {
        Self { index, offset }
    }
}

impl fmt::Display for GeneratorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.index, self.offset)
    }
}

/// Walk direction of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeneratorDirection {
    #[default]
    Forward,
    Backward,
}

/// Life-cycle state of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorStatus {
    #[default]
    NotStarted,
    GeneratingContainers,
    ContainersGenerated,
    Error,
}

/// Generator misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("a generation run is already active")]
    AlreadyGenerating,
    #[error("no generation run is active")]
    NotGenerating,
    #[error("position {position} does not address an item (count {count})")]
    PositionOutOfRange {
        position: GeneratorPosition,
        count: usize,
    },
    #[error("{count} items at position {position} are not all realized")]
    NotRealized {
        position: GeneratorPosition,
        count: usize,
    },
    #[error("item range {index}..{end} exceeds item count {count}")]
    RangeOutOfBounds {
        index: usize,
        end: usize,
        count: usize,
    },
}

/// The side that knows how to build containers for items.
pub trait ContainerHost<C> {
    /// Build a fresh container for the item at `index`.
    fn create_container(&mut self, index: usize) -> C;

    /// Bind `container` to the item at `index`. Called for fresh and
    /// recycled containers alike.
    fn prepare_container(&mut self, _container: &C, _index: usize) {}
}

/// The generation contract consumed by panels.
pub trait ItemContainerGenerator {
    type Container: Clone + PartialEq;

    /// Current status.
    fn status(&self) -> GeneratorStatus;

    /// Begin a run without a scope. Prefer [`start_at`](Self::start_at).
    fn begin(
        &mut self,
        position: GeneratorPosition,
        direction: GeneratorDirection,
        allow_start_at_realized: bool,
    ) -> Result<(), GeneratorError>;

    /// Produce the next container of the active run, or `None` past the end.
    ///
    /// The flag is `true` when the container was newly realized.
    fn generate_next(
        &mut self,
        host: &mut dyn ContainerHost<Self::Container>,
    ) -> Result<Option<(Self::Container, bool)>, GeneratorError>;

    /// End the active run.
    fn stop(&mut self);

    /// Unrealize `count` consecutive realized items starting at `position`
    /// and hand their containers back.
    fn remove(
        &mut self,
        position: GeneratorPosition,
        count: usize,
    ) -> Result<Vec<Self::Container>, GeneratorError>;

    fn position_from_index(&self, index: usize) -> GeneratorPosition;

    /// Item index addressed by `position`, or `-1`.
    fn index_from_position(&self, position: GeneratorPosition) -> i32;

    fn container_from_index(&self, index: usize) -> Option<Self::Container>;

    fn index_from_container(&self, container: &Self::Container) -> Option<usize>;

    /// Begin a run that ends when the returned scope is dropped.
    fn start_at(
        &mut self,
        position: GeneratorPosition,
        direction: GeneratorDirection,
        allow_start_at_realized: bool,
    ) -> Result<GeneratorScope<'_, Self>, GeneratorError>
    where
        Self: Sized,
    {
        self.begin(position, direction, allow_start_at_realized)?;
        Ok(GeneratorScope { generator: self })
    }
}

/// Optional capability: keep unrealized containers for reuse.
pub trait RecyclingItemContainerGenerator: ItemContainerGenerator {
    /// Like [`remove`](ItemContainerGenerator::remove) but the containers go
    /// to the recycle pool. Returns how many were recycled.
    fn recycle(&mut self, position: GeneratorPosition, count: usize)
    -> Result<usize, GeneratorError>;
}

/// An active generation run. Dropping it stops the run.
pub struct GeneratorScope<'a, G: ItemContainerGenerator> {
    generator: &'a mut G,
}

impl<G: ItemContainerGenerator> GeneratorScope<'_, G> {
    /// See [`ItemContainerGenerator::generate_next`].
    pub fn generate_next(
        &mut self,
        host: &mut dyn ContainerHost<G::Container>,
    ) -> Result<Option<(G::Container, bool)>, GeneratorError> {
        self.generator.generate_next(host)
    }
}

impl<G: ItemContainerGenerator> fmt::Debug for GeneratorScope<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorScope")
            .field("status", &self.generator.status())
            .finish()
    }
}

impl<G: ItemContainerGenerator> Drop for GeneratorScope<'_, G> {
    fn drop(&mut self) {
        self.generator.stop();
    }
}

// -----------------------------------------------------------------------------
// Collection change notifications
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemsChangedAction {
    Add,
    Remove,
    Reset,
}

/// What a panel must do after the item collection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemsChanged {
    pub action: ItemsChangedAction,
    /// Position of the first affected item (before the change for removals).
    pub position: GeneratorPosition,
    pub item_count: usize,
    /// Realized containers affected.
    pub container_count: usize,
}

// -----------------------------------------------------------------------------
// In-memory generator
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Cursor {
    next: i64,
    direction: GeneratorDirection,
}

/// Generator over a counted item collection with a recycle pool.
#[derive(Debug, Clone)]
pub struct ItemGenerator<C> {
    count: usize,
    realized: BTreeMap<usize, C>,
    pool: Vec<C>,
    status: GeneratorStatus,
    cursor: Option<Cursor>,
}

impl<C: Clone + PartialEq> ItemGenerator<C> {
    /// Generator for `count` items, none realized.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count,
            realized: BTreeMap::new(),
            pool: Vec::new(),
            status: GeneratorStatus::NotStarted,
            cursor: None,
        }
    }

    /// Number of items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.count
    }

    /// Number of realized items.
    #[must_use]
    pub fn realized_count(&self) -> usize {
        self.realized.len()
    }

    /// Number of containers waiting for reuse.
    #[must_use]
    pub fn recycled_count(&self) -> usize {
        self.pool.len()
    }

    /// Realized item indices in ascending order.
    pub fn realized_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.realized.keys().copied()
    }

    /// `count` items were inserted at `index`.
    pub fn items_inserted(
        &mut self,
        index: usize,
        count: usize,
    ) -> Result<ItemsChanged, GeneratorError> {
        if index > self.count {
            return Err(GeneratorError::RangeOutOfBounds {
                index,
                end: index,
                count: self.count,
            });
        }
        let tail = self.realized.split_off(&index);
        self.realized
            .extend(tail.into_iter().map(|(i, c)| (i + count, c)));
        self.count += count;
        if let Some(cursor) = &mut self.cursor {
            if cursor.next >= to_i64(index) {
                cursor.next += to_i64(count);
            }
        }
        debug!(target: GENERATOR, index, count, "items inserted");
        Ok(ItemsChanged {
            action: ItemsChangedAction::Add,
            position: self.position_from_index(index),
            item_count: count,
            container_count: 0,
        })
    }

    /// `count` items at `index` were removed. Returns the containers of the
    /// removed realized items.
    pub fn items_removed(
        &mut self,
        index: usize,
        count: usize,
    ) -> Result<(ItemsChanged, Vec<C>), GeneratorError> {
        let end = index.saturating_add(count);
        if end > self.count {
            return Err(GeneratorError::RangeOutOfBounds {
                index,
                end,
                count: self.count,
            });
        }
        let position = self.position_from_index(index);
        let mut tail = self.realized.split_off(&index);
        let after = tail.split_off(&end);
        let dropped: Vec<C> = tail.into_values().collect();
        self.realized
            .extend(after.into_iter().map(|(i, c)| (i - count, c)));
        self.count -= count;
        if let Some(cursor) = &mut self.cursor {
            if cursor.next >= to_i64(end) {
                cursor.next -= to_i64(count);
            } else if cursor.next >= to_i64(index) {
                cursor.next = to_i64(index);
            }
        }
        debug!(target: GENERATOR, index, count, containers = dropped.len(), "items removed");
        Ok((
            ItemsChanged {
                action: ItemsChangedAction::Remove,
                position,
                item_count: count,
                container_count: dropped.len(),
            },
            dropped,
        ))
    }

    /// The collection was replaced by `count` new items. Every realized and
    /// pooled container is returned.
    pub fn items_reset(&mut self, count: usize) -> (ItemsChanged, Vec<C>) {
        let mut dropped: Vec<C> = std::mem::take(&mut self.realized).into_values().collect();
        let container_count = dropped.len();
        dropped.append(&mut self.pool);
        self.count = count;
        self.cursor = None;
        if self.status == GeneratorStatus::GeneratingContainers {
            self.status = GeneratorStatus::ContainersGenerated;
        }
        debug!(target: GENERATOR, count, "items reset");
        (
            ItemsChanged {
                action: ItemsChangedAction::Reset,
                position: GeneratorPosition::BOUNDARY,
                item_count: count,
                container_count,
            },
            dropped,
        )
    }

    fn ordinal_of(&self, index: usize) -> usize {
        self.realized.range(..index).count()
    }

    /// Item indices of `count` consecutive realized items at `position`.
    fn realized_run(
        &self,
        position: GeneratorPosition,
        count: usize,
    ) -> Result<Vec<usize>, GeneratorError> {
        let not_realized = GeneratorError::NotRealized { position, count };
        if position.offset != 0 || position.index < 0 {
            return Err(not_realized);
        }
        let start = usize::try_from(position.index).map_err(|_| not_realized)?;
        let run: Vec<usize> = self.realized.keys().copied().skip(start).take(count).collect();
        let contiguous = run.windows(2).all(|w| w[1] == w[0] + 1);
        if run.len() != count || !contiguous {
            return Err(not_realized);
        }
        Ok(run)
    }
}

impl<C: Clone + PartialEq> ItemContainerGenerator for ItemGenerator<C> {
    type Container = C;

    fn status(&self) -> GeneratorStatus {
        self.status
    }

    fn begin(
        &mut self,
        position: GeneratorPosition,
        direction: GeneratorDirection,
        allow_start_at_realized: bool,
    ) -> Result<(), GeneratorError> {
        if self.status == GeneratorStatus::GeneratingContainers {
            return Err(GeneratorError::AlreadyGenerating);
        }
        let start = if position == GeneratorPosition::BOUNDARY {
            match direction {
                GeneratorDirection::Forward => 0,
                GeneratorDirection::Backward => to_i64(self.count) - 1,
            }
        } else {
            let index = i64::from(self.index_from_position(position));
            if index < 0 || index >= to_i64(self.count) {
                self.status = GeneratorStatus::Error;
                return Err(GeneratorError::PositionOutOfRange {
                    position,
                    count: self.count,
                });
            }
            if position.offset == 0 && !allow_start_at_realized {
                match direction {
                    GeneratorDirection::Forward => index + 1,
                    GeneratorDirection::Backward => index - 1,
                }
            } else {
                index
            }
        };
        self.cursor = Some(Cursor {
            next: start,
            direction,
        });
        self.status = GeneratorStatus::GeneratingContainers;
        trace!(target: GENERATOR, %position, ?direction, start, "generation started");
        Ok(())
    }

    fn generate_next(
        &mut self,
        host: &mut dyn ContainerHost<C>,
    ) -> Result<Option<(C, bool)>, GeneratorError> {
        let Some(cursor) = &mut self.cursor else {
            return Err(GeneratorError::NotGenerating);
        };
        let Some(index) = usize::try_from(cursor.next)
            .ok()
            .filter(|i| *i < self.count)
        else {
            return Ok(None);
        };
        cursor.next += match cursor.direction {
            GeneratorDirection::Forward => 1,
            GeneratorDirection::Backward => -1,
        };
        if let Some(existing) = self.realized.get(&index) {
            return Ok(Some((existing.clone(), false)));
        }
        let container = match self.pool.pop() {
            Some(reused) => reused,
            None => host.create_container(index),
        };
        host.prepare_container(&container, index);
        self.realized.insert(index, container.clone());
        trace!(target: GENERATOR, index, "realized");
        Ok(Some((container, true)))
    }

    fn stop(&mut self) {
        if self.cursor.take().is_some() {
            self.status = GeneratorStatus::ContainersGenerated;
        }
    }

    fn remove(
        &mut self,
        position: GeneratorPosition,
        count: usize,
    ) -> Result<Vec<C>, GeneratorError> {
        if self.status == GeneratorStatus::GeneratingContainers {
            return Err(GeneratorError::AlreadyGenerating);
        }
        let run = self.realized_run(position, count)?;
        let removed = run
            .iter()
            .filter_map(|i| self.realized.remove(i))
            .collect::<Vec<_>>();
        debug!(target: GENERATOR, %position, count, "containers removed");
        Ok(removed)
    }

    fn position_from_index(&self, index: usize) -> GeneratorPosition {
        let ordinal = to_i32(self.ordinal_of(index));
        if self.realized.contains_key(&index) {
            return GeneratorPosition::new(ordinal, 0);
        }
        match self
            .realized
            .range((Bound::Unbounded, Bound::Excluded(index)))
            .next_back()
        {
            Some((&prev, _)) => GeneratorPosition::new(ordinal - 1, to_i32(index - prev)),
            None => GeneratorPosition::new(-1, to_i32(index) + 1),
        }
    }

    fn index_from_position(&self, position: GeneratorPosition) -> i32 {
        if position.index == -1 {
            return if position.offset >= 0 {
                position.offset - 1
            } else {
                to_i32(self.count) + position.offset
            };
        }
        let Ok(ordinal) = usize::try_from(position.index) else {
            return -1;
        };
        match self.realized.keys().nth(ordinal) {
            Some(&base) => to_i32(base) + position.offset,
            None => -1,
        }
    }

    fn container_from_index(&self, index: usize) -> Option<C> {
        self.realized.get(&index).cloned()
    }

    fn index_from_container(&self, container: &C) -> Option<usize> {
        self.realized
            .iter()
            .find_map(|(i, c)| (c == container).then_some(*i))
    }
}

impl<C: Clone + PartialEq> RecyclingItemContainerGenerator for ItemGenerator<C> {
    fn recycle(
        &mut self,
        position: GeneratorPosition,
        count: usize,
    ) -> Result<usize, GeneratorError> {
        let removed = self.remove(position, count)?;
        let n = removed.len();
        self.pool.extend(removed);
        debug!(target: GENERATOR, %position, count = n, pooled = self.pool.len(), "containers recycled");
        Ok(n)
    }
}

#[inline]
fn to_i64(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[inline]
fn to_i32(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
