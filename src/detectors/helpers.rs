//! Shared helpers for chart pattern detection
//!
//! Heuristic thresholds, the local-extrema scanner and the slope/range
//! utilities used by every detector module.

use crate::{OverlayLine, PricePoint};

// ============================================================
// WINDOWS
// ============================================================

/// Trailing window of the triangle, double top/bottom and trend detectors
pub const SWING_WINDOW: usize = 15;
/// Trailing window of the head and shoulders detector (needs room for three
/// wide peaks)
pub const REVERSAL_WINDOW: usize = 20;
/// Trailing window of the support/resistance detector
pub const LEVEL_WINDOW: usize = 10;
/// Shortest series the aggregator looks at
pub const MIN_SERIES_LEN: usize = 10;
/// Most patterns the aggregator returns
pub const MAX_PATTERNS: usize = 4;

/// Shortest window that can hold two peaks and two troughs
pub const MIN_SWING_WINDOW: usize = 6;
/// Shortest window with two single-neighbor peaks away from the outer two
/// points per side
pub const MIN_DOUBLE_WINDOW: usize = 7;
/// Shortest window that can hold three two-neighbor peaks
pub const MIN_REVERSAL_WINDOW: usize = 11;

// ============================================================
// HEURISTIC THRESHOLDS
// ============================================================
// Empirically chosen. Changing any of them changes which patterns are
// reported.

/// Trendlines converge when their slopes differ by more than this share of the
/// opening gap between first peak and first trough
pub const CONVERGENCE_RATIO: f64 = 0.01;
/// Trendline slope (price per extremum) beyond which a side counts as trending
pub const TRENDING_SLOPE: f64 = 0.1;
/// Trendline slope below which a side counts as flat
pub const FLAT_SLOPE: f64 = 0.05;

/// Head must clear both shoulders by 2%
pub const HEAD_FACTOR: f64 = 1.02;
/// Shoulders are level when within 3% of the left shoulder
pub const SHOULDER_TOLERANCE: f64 = 0.03;

/// Two tops/bottoms are at the same level when within 2% of the first
pub const LEVEL_TOLERANCE: f64 = 0.02;

/// A point touches a level when within 2% of the window range
pub const TOUCH_BAND: f64 = 0.02;
/// Current price is testing a level when within 5% of the window range
pub const PROXIMITY_BAND: f64 = 0.05;
/// Touches needed before a level counts as tested
pub const MIN_TOUCHES: usize = 2;

/// Both channel slopes must exceed 3% of the window range
pub const CHANNEL_SLOPE_RATIO: f64 = 0.03;

// ============================================================
// EXTREMA SCANNER
// ============================================================

/// How strictly local extrema are picked out of a window.
///
/// A point is a peak (trough) when it is strictly above (below) every neighbor
/// up to `reach` positions away on both sides. Only window positions
/// `edge..len - edge` are examined, so window endpoints never qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtremaScan {
    pub reach: usize,
    pub edge: usize,
}

impl ExtremaScan {
    /// Single-neighbor comparison over every interior point
    pub const ADJACENT: Self = Self { reach: 1, edge: 1 };
    /// Single-neighbor comparison, skipping the two outermost points per side
    pub const ADJACENT_INNER: Self = Self { reach: 1, edge: 2 };
    /// Two-neighbor comparison on each side
    pub const WIDE: Self = Self { reach: 2, edge: 2 };

    /// Smallest window that can hold at least one candidate position
    #[inline]
    pub fn min_window(self) -> usize {
        2 * self.edge.max(self.reach) + 1
    }
}

/// A local peak or trough, indexed into the full series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub index: usize,
    pub price: f64,
}

/// Peaks and troughs of one window, in ascending index order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extrema {
    pub peaks: Vec<Extremum>,
    pub troughs: Vec<Extremum>,
}

/// Scan `window` for local extrema. `offset` is the position of `window[0]`
/// in the full series.
pub fn find_extrema<T: PricePoint>(window: &[T], offset: usize, scan: ExtremaScan) -> Extrema {
    let mut extrema = Extrema::default();
    let reach = scan.reach.max(1);
    let edge = scan.edge.max(reach);

    for i in edge..window.len().saturating_sub(edge) {
        let price = window[i].price();
        let mut is_peak = true;
        let mut is_trough = true;

        for d in 1..=reach {
            let left = window[i - d].price();
            let right = window[i + d].price();
            is_peak &= price > left && price > right;
            is_trough &= price < left && price < right;
        }

        if is_peak {
            extrema.peaks.push(Extremum { index: offset + i, price });
        }
        if is_trough {
            extrema.troughs.push(Extremum { index: offset + i, price });
        }
    }

    extrema
}

// ============================================================
// WINDOW UTILITIES
// ============================================================

/// Trailing `len` points of `series` and the index of the first one.
/// Returns `None` when the series is shorter than `len`.
#[inline]
pub fn trailing_window<T>(series: &[T], len: usize) -> Option<(&[T], usize)> {
    let offset = series.len().checked_sub(len)?;
    Some((&series[offset..], offset))
}

/// Average price change per extremum, first to last.
/// `None` with fewer than two extrema.
#[inline]
pub fn average_step(points: &[Extremum]) -> Option<f64> {
    match points {
        [first, .., last] => Some((last.price - first.price) / (points.len() - 1) as f64),
        _ => None,
    }
}

/// `(low, high)` of the window. `None` for an empty window.
pub fn price_bounds<T: PricePoint>(window: &[T]) -> Option<(f64, f64)> {
    let first = window.first()?.price();
    Some(
        window
            .iter()
            .map(PricePoint::price)
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))),
    )
}

/// Line from the first to the last extremum of `points`
pub fn line_through(points: &[Extremum], label: &str) -> Option<OverlayLine> {
    let (first, last) = (points.first()?, points.last()?);
    Some(OverlayLine {
        x1: first.index,
        y1: first.price,
        x2: last.index,
        y2: last.price,
        label: Some(label.to_string()),
    })
}

// ============================================================
// TESTS
// ============================================================
