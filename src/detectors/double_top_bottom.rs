//! Double top / double bottom detector
//!
//! The last two peaks (or troughs) of the trailing 15 points at the same
//! level. Tops are checked first; at most one pattern is reported.

use std::collections::HashMap;

use super::helpers::{
    find_extrema, trailing_window, ExtremaScan, Extremum, LEVEL_TOLERANCE, MIN_DOUBLE_WINDOW,
    SWING_WINDOW,
};
use crate::{
    params::{get_period, get_ratio, ParamMeta, ParameterizedDetector},
    DetectorId, OverlayData, OverlayLine, OverlayPoint, PatternDetector, PatternError, PatternKey,
    PatternKind, Period, PricePoint, Ratio, Result, TechnicalPattern,
};

/// DOUBLE_TOP_BOTTOM - two tests of the same level
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DoubleTopBottomDetector {
    pub window: Period,
    /// Max difference between the two extremes, relative to the first
    pub level_tolerance: Ratio,
}

impl Default for DoubleTopBottomDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(SWING_WINDOW),
            level_tolerance: Ratio::new_const(LEVEL_TOLERANCE),
        }
    }
}

impl DoubleTopBottomDetector {
    /// Last two extremes, when they sit at the same level
    fn level_pair<'a>(&self, points: &'a [Extremum]) -> Option<(&'a Extremum, &'a Extremum)> {
        let [first, second] = points.get(points.len().checked_sub(2)?..)? else {
            return None;
        };
        let same_level =
            (first.price - second.price).abs() / first.price < self.level_tolerance.get();
        same_level.then_some((first, second))
    }
}

fn double_pattern(
    kind: PatternKind,
    first: &Extremum,
    second: &Extremum,
    line_label: &str,
    point_labels: [&str; 2],
    description: &str,
) -> TechnicalPattern {
    let overlay = OverlayData {
        lines: vec![OverlayLine {
            x1: first.index,
            y1: first.price,
            x2: second.index,
            y2: second.price,
            label: Some(line_label.to_string()),
        }],
        points: vec![
            OverlayPoint::new(first.index, first.price, point_labels[0]),
            OverlayPoint::new(second.index, second.price, point_labels[1]),
        ],
        ..Default::default()
    };

    TechnicalPattern::new(kind, first.index, second.index, description).with_overlay(overlay)
}

impl PatternDetector for DoubleTopBottomDetector {
    fn id(&self) -> DetectorId {
        DetectorId("DOUBLE_TOP_BOTTOM")
    }

    fn window(&self) -> usize {
        self.window.get()
    }

    fn keys(&self) -> &'static [PatternKey] {
        &[PatternKey::DoubleTop, PatternKey::DoubleBottom]
    }

    fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern> {
        let (window, offset) = trailing_window(series, self.window.get())?;
        let extrema = find_extrema(window, offset, ExtremaScan::ADJACENT_INNER);

        if let Some((first, second)) = self.level_pair(&extrema.peaks) {
            return Some(double_pattern(
                PatternKind::DoubleTop,
                first,
                second,
                "Resistance",
                ["First Top", "Second Top"],
                "Double top pattern indicating potential reversal",
            ));
        }

        let (first, second) = self.level_pair(&extrema.troughs)?;
        Some(double_pattern(
            PatternKind::DoubleBottom,
            first,
            second,
            "Support",
            ["First Bottom", "Second Bottom"],
            "Double bottom pattern indicating potential reversal",
        ))
    }

    fn validate_config(&self) -> Result<()> {
        if self.window.get() < MIN_DOUBLE_WINDOW {
            return Err(PatternError::InvalidConfig(format!(
                "double top/bottom window {} cannot hold two peaks",
                self.window.get()
            )));
        }
        Ok(())
    }
}

static DOUBLE_TOP_BOTTOM_PARAMS: &[ParamMeta] = &[
    ParamMeta::period(
        "window",
        SWING_WINDOW as f64,
        (10.0, 30.0, 5.0),
        "Trailing points scanned for tops and bottoms",
    ),
    ParamMeta::ratio(
        "level_tolerance",
        LEVEL_TOLERANCE,
        (0.005, 0.05, 0.005),
        "Max difference between the two extremes, relative to the first",
    ),
];

impl ParameterizedDetector for DoubleTopBottomDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOUBLE_TOP_BOTTOM_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", SWING_WINDOW)?,
            level_tolerance: get_ratio(params, "level_tolerance", LEVEL_TOLERANCE)?,
        })
    }

    fn detector_id_str() -> &'static str {
        "DOUBLE_TOP_BOTTOM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    /// Tops at 4 and 8 (110, 110.5), bottoms at 6 and 10 (100, 99.5)
    fn tops_and_bottoms() -> Vec<f64> {
        vec![
            100.0, 101.0, 103.0, 106.0, 110.0, 105.0, 100.0, 104.0, 110.5, 104.0, 99.5, 103.0,
            105.0, 106.0, 107.0,
        ]
    }

    #[test]
    fn test_double_top_takes_priority() {
        let pattern = DoubleTopBottomDetector::default().detect(&tops_and_bottoms()).unwrap();

        assert_eq!(pattern.kind, PatternKind::DoubleTop);
        assert_eq!(pattern.pattern_key, PatternKey::DoubleTop);
        assert_eq!(pattern.direction, Direction::Bearish);
        assert_eq!((pattern.start_index, pattern.end_index), (4, 8));

        let overlay = pattern.overlay.unwrap();
        assert_eq!(overlay.lines[0].label.as_deref(), Some("Resistance"));
        assert_eq!(overlay.points[0].label, "First Top");
        assert_eq!(overlay.points[1].y, 110.5);
    }

    #[test]
    fn test_double_bottom_when_tops_differ() {
        let mut prices = tops_and_bottoms();
        prices[8] = 118.0;
        let pattern = DoubleTopBottomDetector::default().detect(&prices).unwrap();

        assert_eq!(pattern.kind, PatternKind::DoubleBottom);
        assert!(pattern.direction.is_bullish());
        assert_eq!((pattern.start_index, pattern.end_index), (6, 10));

        let overlay = pattern.overlay.unwrap();
        assert_eq!(overlay.lines[0].label.as_deref(), Some("Support"));
        assert_eq!(overlay.points[1].label, "Second Bottom");
    }

    #[test]
    fn test_no_match_when_levels_differ() {
        let mut prices = tops_and_bottoms();
        prices[8] = 118.0;
        prices[10] = 95.0;
        assert!(DoubleTopBottomDetector::default().detect(&prices).is_none());
    }

    #[test]
    fn test_monotonic_series_has_no_double() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(DoubleTopBottomDetector::default().detect(&prices).is_none());
    }

    #[test]
    fn test_outer_positions_ignored() {
        // Equal tops at window positions 1 and 5; position 1 is outside the scan
        let prices = vec![
            100.0, 110.0, 104.0, 106.0, 103.0, 110.0, 104.0, 105.0, 104.5, 105.5, 104.8, 106.0,
            107.0, 108.0, 109.0,
        ];
        let pattern = DoubleTopBottomDetector::default().detect(&prices);
        assert!(pattern.map_or(true, |p| p.start_index != 1));
    }
}
