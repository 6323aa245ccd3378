//! Property-based invariant tests for the layout layer.
//!
//! These tests verify invariants that must hold for any valid inputs:
//!
//! 1. Repeating a measure with the same input returns the same size and runs
//!    no override.
//! 2. Stored desired sizes are finite and non-negative whatever an element
//!    reports.
//! 3. Tool bar overflow assignment is deterministic across measures.
//! 4. Every tool bar item lives in exactly one of the two panels.
//! 5. An auto-sized uniform grid is square and holds every child.
//! 6. Tab header rebalancing never lowers the greedy minimum slack.
//! 7. Tab rows are contiguous and within the limit unless a lone header is
//!    wider than it.
//! 8. Generator positions round-trip to item indices.

use primkit_layout::{
    ContainerHost, Dock, Fixed, GeneratorDirection, GeneratorPosition, ItemContainerGenerator,
    ItemGenerator, LayoutTree, NodeId, Orientation, OverflowMode, RecyclingItemContainerGenerator,
    Size, TabPanel, ToolBar, UniformGrid, distribute_headers, resolve_grid,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn widths(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(1.0f64..200.0, 0..=max_len)
}

fn overflow_mode() -> impl Strategy<Value = OverflowMode> {
    prop_oneof![
        Just(OverflowMode::Always),
        Just(OverflowMode::AsNeeded),
        Just(OverflowMode::Never),
    ]
}

fn greedy_min_slack(widths: &[f64], limit: f64) -> Option<f64> {
    let mut rows: Vec<(f64, usize)> = Vec::new();
    for &w in widths {
        match rows.last_mut() {
            Some((sum, n)) if *sum + w <= limit => {
                *sum += w;
                *n += 1;
            }
            _ => rows.push((w, 1)),
        }
    }
    rows.iter()
        .map(|&(sum, n)| ((limit - sum) / n as f64).max(0.0))
        .reduce(f64::min)
}

fn build_toolbar(items: &[(f64, OverflowMode)]) -> (LayoutTree, ToolBar, Vec<NodeId>) {
    let mut tree = LayoutTree::new();
    let bar = ToolBar::new(&mut tree, Orientation::Horizontal).unwrap();
    let ids = items
        .iter()
        .map(|&(w, mode)| {
            let id = tree.insert(Fixed::new(w, 10.0));
            tree.update_props(id, |p| p.overflow_mode = mode).unwrap();
            bar.add_item(&mut tree, id).unwrap();
            id
        })
        .collect();
    (tree, bar, ids)
}

struct Counter;

impl ContainerHost<usize> for Counter {
    fn create_container(&mut self, index: usize) -> usize {
        index
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Idempotent measure
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_measure_is_cached(
        sizes in proptest::collection::vec((0.0f64..100.0, 0.0f64..100.0), 0..20),
        avail_w in 0.0f64..500.0,
        avail_h in 0.0f64..500.0,
        use_tabs in any::<bool>(),
    ) {
        let mut tree = LayoutTree::new();
        let root = if use_tabs {
            tree.insert(TabPanel::new(Dock::Top))
        } else {
            tree.insert(UniformGrid::new())
        };
        let kids: Vec<NodeId> = sizes
            .iter()
            .map(|&(w, h)| {
                let id = tree.insert(Fixed::new(w, h));
                tree.add_child(root, id).unwrap();
                id
            })
            .collect();
        let avail = Size::new(avail_w, avail_h);

        let first = tree.measure(root, avail).unwrap();
        let counts: Vec<u64> = kids.iter().map(|k| tree.slot(*k).unwrap().measure_count).collect();
        let second = tree.measure(root, avail).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(tree.slot(root).unwrap().measure_count, 1);
        for (k, before) in kids.iter().zip(counts) {
            prop_assert_eq!(tree.slot(*k).unwrap().measure_count, before);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Stored desired sizes are sane
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn desired_size_is_sanitized(w in any::<f64>(), h in any::<f64>()) {
        let mut tree = LayoutTree::new();
        let leaf = tree.insert(Fixed::new(w, h));
        let d = tree.measure(leaf, Size::INFINITY).unwrap();
        prop_assert!(d.width.is_finite() && d.width >= 0.0);
        prop_assert!(d.height.is_finite() && d.height >= 0.0);
        prop_assert_eq!(d, tree.desired_size(leaf));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Tool bar determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn toolbar_assignment_is_deterministic(
        items in proptest::collection::vec((1.0f64..80.0, overflow_mode()), 0..16),
        limit in 0.0f64..400.0,
    ) {
        let (mut tree, bar, ids) = build_toolbar(&items);
        let avail = Size::new(limit, 40.0);

        tree.measure(bar.panel(), avail).unwrap();
        let first: Vec<bool> = ids.iter().map(|id| tree.props(*id).is_overflow_item).collect();

        tree.invalidate_measure(bar.panel());
        tree.measure(bar.panel(), avail).unwrap();
        let second: Vec<bool> = ids.iter().map(|id| tree.props(*id).is_overflow_item).collect();

        prop_assert_eq!(&first, &second);
        for ((_, mode), overflowed) in items.iter().zip(&first) {
            match mode {
                OverflowMode::Always => prop_assert!(*overflowed),
                OverflowMode::Never => prop_assert!(!*overflowed),
                OverflowMode::AsNeeded => {}
            }
        }
        prop_assert_eq!(bar.has_overflow_items(&tree), first.iter().any(|o| *o));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Single ownership across the two panels
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn every_item_has_exactly_one_panel(
        items in proptest::collection::vec((1.0f64..80.0, overflow_mode()), 0..16),
        limits in proptest::collection::vec(0.0f64..400.0, 1..4),
    ) {
        let (mut tree, bar, ids) = build_toolbar(&items);
        for limit in limits {
            tree.measure(bar.panel(), Size::new(limit, 40.0)).unwrap();
            tree.measure(bar.overflow_panel(), Size::new(500.0, 500.0)).unwrap();

            let main = tree.children(bar.panel()).to_vec();
            let overflow = tree.children(bar.overflow_panel()).to_vec();
            prop_assert_eq!(main.len() + overflow.len(), ids.len());
            for id in &ids {
                let expected = if tree.props(*id).is_overflow_item {
                    bar.overflow_panel()
                } else {
                    bar.panel()
                };
                prop_assert_eq!(tree.parent(*id), Some(expected));
            }
            // Both panels keep generated order.
            let order = |list: &[NodeId]| list.iter().map(|c| ids.iter().position(|i| i == c)).collect::<Vec<_>>();
            let mut sorted = order(&main);
            sorted.sort();
            prop_assert_eq!(order(&main), sorted);
            let mut sorted = order(&overflow);
            sorted.sort();
            prop_assert_eq!(order(&overflow), sorted);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Uniform grid cell count
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn auto_grid_is_square_and_large_enough(n in 0usize..2000) {
        let dims = resolve_grid(0, 0, 0, n);
        let needed = n.max(1);
        prop_assert_eq!(dims.rows, dims.columns);
        prop_assert!(dims.rows * dims.columns >= needed);
        prop_assert!((dims.rows - 1) * (dims.rows - 1) < needed);
    }

    #[test]
    fn fixed_columns_hold_leading_blanks(n in 1usize..500, columns in 1usize..20, first in 0usize..25) {
        let dims = resolve_grid(0, columns, first, n);
        prop_assert!(dims.first_column < dims.columns);
        prop_assert!(dims.rows * dims.columns >= n + dims.first_column);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Tab slack never worse than greedy
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rebalance_keeps_greedy_minimum(ws in widths(24), limit in 1.0f64..600.0) {
        let d = distribute_headers(&ws, limit);
        match (d.min_slack(), greedy_min_slack(&ws, limit)) {
            (Some(best), Some(greedy)) => prop_assert!(best >= greedy - 1e-9),
            (None, None) => {}
            other => prop_assert!(false, "row presence mismatch: {:?}", other),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Tab rows are contiguous and fit
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rows_are_contiguous_and_fit(ws in widths(24), limit in 1.0f64..600.0) {
        let d = distribute_headers(&ws, limit);
        prop_assert_eq!(d.widths.len(), ws.len());
        let mut start = 0;
        let ends = d.separators.iter().copied().chain(ws.len().checked_sub(1));
        for end in ends {
            prop_assert!(end >= start, "empty row ending at {}", end);
            let raw: f64 = ws[start..=end].iter().sum();
            prop_assert!(raw <= limit + 1e-9 || start == end);
            start = end + 1;
        }
        prop_assert_eq!(start, ws.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Generator positions round-trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn positions_round_trip(count in 1usize..60, realize in proptest::collection::vec(any::<bool>(), 60)) {
        let mut g = ItemGenerator::new(count);
        let mut host = Counter;
        {
            let mut scope = g
                .start_at(GeneratorPosition::BOUNDARY, GeneratorDirection::Forward, true)
                .unwrap();
            while scope.generate_next(&mut host).unwrap().is_some() {}
        }
        // Unrealize a random subset, one item at a time from the back.
        for i in (0..count).rev() {
            if !realize[i] {
                let pos = g.position_from_index(i);
                g.recycle(pos, 1).unwrap();
            }
        }
        for i in 0..count {
            let pos = g.position_from_index(i);
            prop_assert_eq!(g.index_from_position(pos), i as i32, "index {} via {}", i, pos);
            prop_assert_eq!(pos.offset == 0, realize[i]);
        }
    }
}
