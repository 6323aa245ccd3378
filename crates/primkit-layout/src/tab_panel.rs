#![forbid(unsafe_code)]

//! Tab header strip with multi-row wrapping.
//!
//! For `Top`/`Bottom` placement headers are packed greedily into rows no
//! wider than the panel. When more than one row results, headers are
//! redistributed between adjacent rows so the extra width each header has to
//! absorb is spread across rows ([`distribute_headers`]), and every row is
//! stretched to the full panel width.
//!
//! The row holding the selected header sits next to the content: last for
//! `Top`, first for `Bottom`. Rows are rotated so that holds.
//!
//! `Left`/`Right` placement stacks headers vertically at full width.
//!
//! # Invariants
//!
//! 1. The chosen partition's minimum per-row slack is never below the
//!    greedy partition's.
//! 2. Rows are contiguous runs of headers in child order; every row holds
//!    at least one header.
//! 3. The last header of each row ends at the panel's right edge.

use primkit_core::geometry::{Rect, Size};
use primkit_core::logging::LAYOUT;
use tracing::debug;

use crate::element::LayoutElement;
use crate::tree::{LayoutContext, LayoutError, NodeId};
use crate::{Dock, Visibility};

// -----------------------------------------------------------------------------
// Header distribution
// -----------------------------------------------------------------------------

/// Result of partitioning header widths into rows.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDistribution {
    /// Index of the last header of every row but the last.
    pub separators: Vec<usize>,
    /// Width added to each header of a row, per row.
    pub row_slack: Vec<f64>,
    /// Header widths with their row's slack added.
    pub widths: Vec<f64>,
}

impl HeaderDistribution {
    /// Number of rows (zero when there are no headers).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_slack.len()
    }

    /// The smallest per-row slack, or `None` without headers.
    #[must_use]
    pub fn min_slack(&self) -> Option<f64> {
        self.row_slack.iter().copied().reduce(f64::min)
    }

    /// Row holding header `index`.
    #[must_use]
    pub fn row_of(&self, index: usize) -> usize {
        self.separators.iter().take_while(|&&sep| sep < index).count()
    }

    /// Whether header `index` ends its row.
    #[must_use]
    pub fn is_last_in_row(&self, index: usize) -> bool {
        self.separators.contains(&index) || index + 1 == self.widths.len()
    }
}

/// Greedy left-to-right packing: `(separators, row widths, row header counts)`.
fn greedy_rows(widths: &[f64], limit: f64) -> (Vec<usize>, Vec<f64>, Vec<usize>) {
    let mut separators = Vec::new();
    let mut row_width = Vec::new();
    let mut row_count = Vec::new();
    let mut current = 0.0;
    let mut in_row = 0usize;
    for (i, &w) in widths.iter().enumerate() {
        if in_row > 0 && current + w > limit {
            separators.push(i - 1);
            row_width.push(current);
            row_count.push(in_row);
            current = w;
            in_row = 1;
        } else {
            current += w;
            in_row += 1;
        }
    }
    if in_row > 0 {
        row_width.push(current);
        row_count.push(in_row);
    }
    (separators, row_width, row_count)
}

fn slack(limit: f64, width: f64, headers: usize) -> f64 {
    ((limit - width) / headers as f64).max(0.0)
}

/// Partition `widths` into rows of at most `limit`, balancing slack.
///
/// Starts from the greedy packing, then repeatedly moves the last header of
/// the row before the slackest row into it. A move stops the search when the
/// receiving row would exceed `limit` or the donor row would become empty.
/// The partition with the highest minimum slack wins; among equals the
/// first found is kept. A header wider than `limit` gets a row of its own.
#[must_use]
pub fn distribute_headers(widths: &[f64], limit: f64) -> HeaderDistribution {
    let widths: Vec<f64> = widths
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let limit = if limit.is_nan() { f64::INFINITY } else { limit.max(0.0) };
    let (mut separators, mut row_width, mut row_count) = greedy_rows(&widths, limit);
    let rows = row_width.len();

    let gap = |row_width: &[f64], row_count: &[usize]| -> Vec<f64> {
        row_width
            .iter()
            .zip(row_count)
            .map(|(&w, &n)| if limit.is_finite() { slack(limit, w, n) } else { 0.0 })
            .collect()
    };
    let mut row_slack = gap(&row_width, &row_count);

    let mut best_separators = separators.clone();
    let mut best_slack = row_slack.clone();
    let mut best_min = best_slack.iter().copied().fold(f64::INFINITY, f64::min);

    while rows > 1 {
        let mut target = 0;
        let mut max_gap = 0.0;
        for (i, &g) in row_slack.iter().enumerate() {
            if g > max_gap {
                max_gap = g;
                target = i;
            }
        }
        if target == 0 {
            break;
        }
        let donor = target - 1;
        if row_count[donor] <= 1 {
            break;
        }
        let moved = separators[donor];
        if row_width[target] + widths[moved] > limit {
            break;
        }
        separators[donor] -= 1;
        row_width[target] += widths[moved];
        row_count[target] += 1;
        row_width[donor] -= widths[moved];
        row_count[donor] -= 1;
        row_slack = gap(&row_width, &row_count);

        let min = row_slack.iter().copied().fold(f64::INFINITY, f64::min);
        if min > best_min {
            best_min = min;
            best_separators.clone_from(&separators);
            best_slack.clone_from(&row_slack);
        }
    }

    let mut stretched = widths;
    let mut row = 0;
    for (i, w) in stretched.iter_mut().enumerate() {
        *w += best_slack.get(row).copied().unwrap_or(0.0);
        if best_separators.get(row) == Some(&i) {
            row += 1;
        }
    }

    HeaderDistribution {
        separators: best_separators,
        row_slack: best_slack,
        widths: stretched,
    }
}

// -----------------------------------------------------------------------------
// Panel
// -----------------------------------------------------------------------------

/// Panel laying out tab headers.
#[derive(Debug, Clone, Default)]
pub struct TabPanel {
    placement: Dock,
    rows: usize,
    row_height: f64,
    distribution: Option<HeaderDistribution>,
}

impl TabPanel {
    #[must_use]
    pub fn new(placement: Dock) -> Self {
        Self {
            placement,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn placement(&self) -> Dock {
        self.placement
    }

    /// Change the strip placement. Callers must invalidate the node's measure.
    pub fn set_placement(&mut self, placement: Dock) {
        self.placement = placement;
    }

    /// Row count from the last measure.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Shared row height from the last measure.
    #[must_use]
    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Distribution used by the last multi-row arrange.
    #[must_use]
    pub fn distribution(&self) -> Option<&HeaderDistribution> {
        self.distribution.as_ref()
    }

    fn visible(cx: &LayoutContext<'_>) -> Vec<NodeId> {
        cx.children()
            .into_iter()
            .filter(|c| cx.props(*c).visibility != Visibility::Collapsed)
            .collect()
    }

    fn active_row(
        &self,
        cx: &LayoutContext<'_>,
        visible: &[NodeId],
        dist: &HeaderDistribution,
    ) -> usize {
        if let Some(selected) = visible.iter().position(|c| cx.props(*c).is_selected) {
            return dist.row_of(selected);
        }
        match self.placement {
            Dock::Top => dist.row_count().saturating_sub(1),
            _ => 0,
        }
    }

    fn arrange_horizontal(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<(), LayoutError> {
        let visible = Self::visible(cx);
        let widths: Vec<f64> = visible.iter().map(|c| cx.desired_size(*c).width).collect();
        let row_height = self.row_height;

        let multi_row = self.rows > 1;
        let dist = if multi_row {
            Some(distribute_headers(&widths, final_size.width))
        } else {
            None
        };

        let mut x = 0.0;
        let mut y = 0.0;
        let mut active = 0;
        if let Some(dist) = &dist {
            let rows = dist.row_count();
            active = self.active_row(cx, &visible, dist);
            y = match self.placement {
                Dock::Bottom if active != 0 => rows.saturating_sub(active) as f64 * row_height,
                Dock::Bottom => 0.0,
                _ => rows.saturating_sub(1 + active) as f64 * row_height,
            };
            debug!(
                target: LAYOUT,
                node = %cx.node(),
                rows,
                active,
                separators = ?dist.separators,
                "tab headers distributed"
            );
        }

        let mut row = 0;
        for (i, child) in visible.iter().enumerate() {
            let mut width = match &dist {
                Some(d) => d.widths[i],
                None => widths[i],
            };
            let last_in_row = dist.as_ref().is_some_and(|d| d.is_last_in_row(i));
            if last_in_row {
                width = (final_size.width - x).max(0.0);
            }
            cx.arrange(*child, Rect::new(x, y, width, row_height))?;
            x += width;
            if last_in_row {
                let reset = match self.placement {
                    Dock::Bottom => active > 0 && row == active - 1,
                    _ => row == active,
                };
                if reset {
                    y = 0.0;
                } else {
                    y += row_height;
                }
                x = 0.0;
                row += 1;
            }
        }
        self.distribution = dist;
        Ok(())
    }

    fn arrange_vertical(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<(), LayoutError> {
        let mut y = 0.0;
        for child in Self::visible(cx) {
            let h = cx.desired_size(child).height;
            cx.arrange(child, Rect::new(0.0, y, final_size.width, h))?;
            y += h;
        }
        self.distribution = None;
        Ok(())
    }
}

impl LayoutElement for TabPanel {
    fn kind(&self) -> &'static str {
        "TabPanel"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        let visible = Self::visible(cx);
        self.rows = 0;
        self.row_height = 0.0;

        if !self.placement.is_horizontal() {
            let mut size = Size::ZERO;
            for child in visible {
                let d = cx.measure(child, available)?;
                size.width = size.width.max(d.width);
                size.height += d.height;
            }
            self.rows = 1;
            return Ok(size);
        }

        let mut widths = Vec::with_capacity(visible.len());
        for child in &visible {
            let d = cx.measure(*child, available)?;
            self.row_height = self.row_height.max(d.height);
            widths.push(d.width);
        }
        let (separators, row_width, _) = greedy_rows(&widths, available.width);
        self.rows = if widths.is_empty() { 1 } else { separators.len() + 1 };
        let widest_row = row_width.iter().copied().fold(0.0, f64::max);

        // Wrapped headers stretch to the full width.
        let width = if available.width.is_finite()
            && (self.rows > 1 || widest_row >= available.width)
        {
            available.width
        } else {
            widest_row
        };
        let size = Size::new(width, self.row_height * self.rows as f64);
        debug!(target: LAYOUT, node = %cx.node(), rows = self.rows, ?size, "tab panel measured");
        Ok(size)
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        for child in cx.children() {
            if cx.props(child).visibility == Visibility::Collapsed {
                cx.arrange(child, Rect::default())?;
            }
        }
        if self.placement.is_horizontal() {
            self.arrange_horizontal(cx, final_size)?;
        } else {
            self.arrange_vertical(cx, final_size)?;
        }
        Ok(final_size)
    }
}
