#![forbid(unsafe_code)]

//! Grid of equally sized cells.
//!
//! With neither `Rows` nor `Columns` set the grid is square:
//! `ceil(sqrt(n))` on each side for `n` visible children. Setting one count
//! derives the other. `FirstColumn` leaves blank cells at the start of the
//! first row.
//!
//! Every cell is as large as the largest child; collapsed children are
//! skipped without consuming a cell.

use primkit_core::ConfigError;
use primkit_core::geometry::{Rect, Size};
use primkit_core::logging::LAYOUT;
use primkit_core::property::{Property, non_negative_i32};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::Visibility;
use crate::element::LayoutElement;
use crate::tree::{LayoutContext, LayoutError};

/// Resolved cell counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: usize,
    pub columns: usize,
    pub first_column: usize,
}

/// Resolve the cell counts for `visible` children.
///
/// `rows == 0` / `columns == 0` mean "derive".
#[must_use]
pub fn resolve_grid(
    rows: usize,
    columns: usize,
    first_column: usize,
    visible: usize,
) -> GridDimensions {
    let n = visible.max(1);
    let (rows, columns, first_column) = match (rows, columns) {
        (0, 0) => {
            let mut side = n.isqrt();
            if side * side < n {
                side += 1;
            }
            let first = if first_column >= side { 0 } else { first_column };
            (side, side, first)
        }
        (0, c) => {
            let first = if first_column >= c { 0 } else { first_column };
            ((n + first).div_ceil(c), c, first)
        }
        (r, 0) => {
            let c = n.div_ceil(r);
            let first = if first_column >= c { 0 } else { first_column };
            (r, c, first)
        }
        (r, c) => {
            let first = if first_column >= c { 0 } else { first_column };
            (r, c, first)
        }
    };
    GridDimensions {
        rows,
        columns,
        first_column,
    }
}

/// Panel arranging children in a grid of equal cells.
#[derive(Debug)]
pub struct UniformGrid {
    rows: Property<i32>,
    columns: Property<i32>,
    first_column: Property<i32>,
    resolved: Option<GridDimensions>,
}

impl Default for UniformGrid {
    fn default() -> Self {
        Self {
            rows: Property::validated("Rows", 0, non_negative_i32),
            columns: Property::validated("Columns", 0, non_negative_i32),
            first_column: Property::validated("FirstColumn", 0, non_negative_i32),
            resolved: None,
        }
    }
}

impl UniformGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed counts; zero means "derive".
    pub fn with_counts(rows: i32, columns: i32) -> Result<Self, ConfigError> {
        let mut grid = Self::new();
        grid.set_rows(rows)?;
        grid.set_columns(columns)?;
        Ok(grid)
    }

    #[must_use]
    pub fn rows(&self) -> i32 {
        self.rows.get()
    }

    #[must_use]
    pub fn columns(&self) -> i32 {
        self.columns.get()
    }

    #[must_use]
    pub fn first_column(&self) -> i32 {
        self.first_column.get()
    }

    /// Callers must invalidate the node's measure on `Ok(true)`.
    pub fn set_rows(&mut self, rows: i32) -> Result<bool, ConfigError> {
        self.rows.set(rows)
    }

    /// Callers must invalidate the node's measure on `Ok(true)`.
    pub fn set_columns(&mut self, columns: i32) -> Result<bool, ConfigError> {
        self.columns.set(columns)
    }

    /// Callers must invalidate the node's measure on `Ok(true)`.
    pub fn set_first_column(&mut self, first_column: i32) -> Result<bool, ConfigError> {
        self.first_column.set(first_column)
    }

    /// Counts used by the last measure.
    #[must_use]
    pub fn resolved(&self) -> Option<GridDimensions> {
        self.resolved
    }

    fn resolve(&self, visible: usize) -> GridDimensions {
        let count = |v: i32| usize::try_from(v).unwrap_or(0);
        resolve_grid(
            count(self.rows.get()),
            count(self.columns.get()),
            count(self.first_column.get()),
            visible,
        )
    }
}

impl LayoutElement for UniformGrid {
    fn kind(&self) -> &'static str {
        "UniformGrid"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        let children = cx.children();
        let visible = children
            .iter()
            .filter(|c| cx.props(**c).visibility != Visibility::Collapsed)
            .count();
        let dims = self.resolve(visible);
        self.resolved = Some(dims);

        let cell = Size::new(
            available.width / dims.columns as f64,
            available.height / dims.rows as f64,
        );
        let mut largest = Size::ZERO;
        for child in children {
            largest = largest.max(cx.measure(child, cell)?);
        }
        let size = Size::new(
            largest.width * dims.columns as f64,
            largest.height * dims.rows as f64,
        );
        trace!(target: LAYOUT, node = %cx.node(), ?dims, ?size, "uniform grid measured");
        Ok(size)
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        let dims = match self.resolved {
            Some(dims) => dims,
            None => self.resolve(cx.child_count()),
        };
        let width = final_size.width / dims.columns as f64;
        let height = final_size.height / dims.rows as f64;
        let mut column = dims.first_column;
        let mut row = 0usize;
        for child in cx.children() {
            let cell = Rect::new(column as f64 * width, row as f64 * height, width, height);
            cx.arrange(child, cell)?;
            if cx.props(child).visibility == Visibility::Collapsed {
                continue;
            }
            column += 1;
            if column >= dims.columns {
                column = 0;
                row += 1;
            }
        }
        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Fixed;
    use crate::tree::{LayoutTree, NodeId};

    fn grid(tree: &mut LayoutTree, g: UniformGrid, n: usize) -> (NodeId, Vec<NodeId>) {
        let p = tree.insert(g);
        let kids = (0..n)
            .map(|i| {
                let c = tree.insert(Fixed::new(10.0 + i as f64, 5.0));
                tree.add_child(p, c).unwrap();
                c
            })
            .collect();
        (p, kids)
    }

    #[test]
    fn square_when_unspecified() {
        assert_eq!(resolve_grid(0, 0, 0, 5), GridDimensions { rows: 3, columns: 3, first_column: 0 });
        assert_eq!(resolve_grid(0, 0, 0, 4).rows, 2);
        assert_eq!(resolve_grid(0, 0, 0, 0).rows, 1);
    }

    #[test]
    fn one_count_derives_the_other() {
        assert_eq!(resolve_grid(2, 0, 0, 5).columns, 3);
        let d = resolve_grid(0, 3, 2, 5);
        assert_eq!((d.rows, d.first_column), (3, 2));
        assert_eq!(resolve_grid(0, 3, 3, 5).first_column, 0);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let mut g = UniformGrid::new();
        assert!(g.set_rows(-1).is_err());
        assert!(g.set_first_column(-2).is_err());
        assert_eq!(g.rows(), 0);
        assert_eq!(g.set_columns(4), Ok(true));
    }

    #[test]
    fn desired_size_uses_largest_child() {
        let mut tree = LayoutTree::new();
        let (p, _) = grid(&mut tree, UniformGrid::new(), 5);
        // 3x3 grid, widest child is 14.
        assert_eq!(
            tree.measure(p, Size::new(300.0, 300.0)).unwrap(),
            Size::new(42.0, 15.0)
        );
    }

    #[test]
    fn arrange_starts_at_first_column_and_skips_collapsed() {
        let mut tree = LayoutTree::new();
        let mut g = UniformGrid::with_counts(0, 2).unwrap();
        g.set_first_column(1).unwrap();
        let (p, kids) = grid(&mut tree, g, 4);
        tree.update_props(kids[1], |props| props.visibility = Visibility::Collapsed)
            .unwrap();
        tree.update_layout(p, Size::new(100.0, 60.0)).unwrap();
        let dims = tree.element::<UniformGrid>(p).unwrap().resolved().unwrap();
        assert_eq!((dims.rows, dims.columns), (2, 2));

        assert_eq!(tree.layout_rect(kids[0]), Rect::new(50.0, 0.0, 50.0, 30.0));
        assert_eq!(tree.render_size(kids[1]), Size::ZERO);
        assert_eq!(tree.layout_rect(kids[2]), Rect::new(0.0, 30.0, 50.0, 30.0));
        assert_eq!(tree.layout_rect(kids[3]), Rect::new(50.0, 30.0, 50.0, 30.0));
    }
}
