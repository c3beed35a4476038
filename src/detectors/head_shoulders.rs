//! Head and shoulders detector
//!
//! Three wide peaks over the trailing 20 points where the middle one clears
//! both level shoulders. The neckline sits at the troughs between the
//! shoulders.

use std::collections::HashMap;

use super::helpers::{
    find_extrema, trailing_window, ExtremaScan, Extremum, HEAD_FACTOR, MIN_REVERSAL_WINDOW,
    REVERSAL_WINDOW, SHOULDER_TOLERANCE,
};
use crate::{
    params::{get_factor, get_period, get_ratio, ParamMeta, ParameterizedDetector},
    DetectorId, OverlayData, OverlayLine, OverlayPoint, PatternDetector, PatternError, PatternKey,
    PatternKind, Period, PricePoint, Ratio, Result, TechnicalPattern,
};

/// HEAD_AND_SHOULDERS - bearish three-peak reversal
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeadAndShouldersDetector {
    pub window: Period,
    /// Head must exceed each shoulder times this factor
    pub head_factor: f64,
    /// Max shoulder mismatch relative to the left shoulder
    pub shoulder_tolerance: Ratio,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(REVERSAL_WINDOW),
            head_factor: HEAD_FACTOR,
            shoulder_tolerance: Ratio::new_const(SHOULDER_TOLERANCE),
        }
    }
}

impl HeadAndShouldersDetector {
    fn is_formation(&self, left: &Extremum, head: &Extremum, right: &Extremum) -> bool {
        head.price > left.price * self.head_factor
            && head.price > right.price * self.head_factor
            && (left.price - right.price).abs() / left.price < self.shoulder_tolerance.get()
    }
}

/// Neckline level: mean of the first and last trough between the shoulders,
/// or the left shoulder when fewer than two troughs exist.
fn neckline<T: PricePoint>(window: &[T], offset: usize, left: &Extremum, right: &Extremum) -> f64 {
    let troughs: Vec<Extremum> = find_extrema(window, offset, ExtremaScan::ADJACENT)
        .troughs
        .into_iter()
        .filter(|t| (left.index..right.index).contains(&t.index))
        .collect();

    match troughs.as_slice() {
        [first, .., last] => (first.price + last.price) / 2.0,
        _ => left.price,
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn id(&self) -> DetectorId {
        DetectorId("HEAD_AND_SHOULDERS")
    }

    fn window(&self) -> usize {
        self.window.get()
    }

    fn keys(&self) -> &'static [PatternKey] {
        &[PatternKey::HeadAndShoulders]
    }

    fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern> {
        let (window, offset) = trailing_window(series, self.window.get())?;
        let peaks = find_extrema(window, offset, ExtremaScan::WIDE).peaks;

        let [left, head, right] = peaks.get(peaks.len().checked_sub(3)?..)? else {
            return None;
        };
        if !self.is_formation(left, head, right) {
            return None;
        }

        let neckline = neckline(window, offset, left, right);
        let overlay = OverlayData {
            lines: vec![OverlayLine::level(left.index, right.index, neckline, "Neckline")],
            points: vec![
                OverlayPoint::new(left.index, left.price, "Left Shoulder"),
                OverlayPoint::new(head.index, head.price, "Head"),
                OverlayPoint::new(right.index, right.price, "Right Shoulder"),
            ],
            ..Default::default()
        };

        Some(
            TechnicalPattern::new(
                PatternKind::HeadAndShoulders,
                left.index,
                right.index,
                "Classic head and shoulders reversal pattern forming",
            )
            .with_overlay(overlay),
        )
    }

    fn validate_config(&self) -> Result<()> {
        if self.window.get() < MIN_REVERSAL_WINDOW {
            return Err(PatternError::InvalidConfig(format!(
                "head and shoulders window {} cannot hold three peaks",
                self.window.get()
            )));
        }
        if self.head_factor < 1.0 {
            return Err(PatternError::InvalidConfig(
                "head_factor must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

static HEAD_AND_SHOULDERS_PARAMS: &[ParamMeta] = &[
    ParamMeta::period(
        "window",
        REVERSAL_WINDOW as f64,
        (15.0, 40.0, 5.0),
        "Trailing points scanned for the three peaks",
    ),
    ParamMeta::factor(
        "head_factor",
        HEAD_FACTOR,
        (1.01, 1.1, 0.01),
        "Head must exceed each shoulder times this factor",
    ),
    ParamMeta::ratio(
        "shoulder_tolerance",
        SHOULDER_TOLERANCE,
        (0.01, 0.1, 0.01),
        "Max shoulder mismatch relative to the left shoulder",
    ),
];

impl ParameterizedDetector for HeadAndShouldersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HEAD_AND_SHOULDERS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", REVERSAL_WINDOW)?,
            head_factor: get_factor(params, "head_factor", HEAD_FACTOR)?,
            shoulder_tolerance: get_ratio(params, "shoulder_tolerance", SHOULDER_TOLERANCE)?,
        })
    }

    fn detector_id_str() -> &'static str {
        "HEAD_AND_SHOULDERS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formation() -> Vec<f64> {
        vec![
            100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 106.0, 102.0, 108.0, 114.0, 120.0, 114.0,
            108.0, 103.0, 106.0, 109.0, 105.0, 102.0, 100.0, 98.0,
        ]
    }

    #[test]
    fn test_detects_formation() {
        let pattern = HeadAndShouldersDetector::default().detect(&formation()).unwrap();

        assert_eq!(pattern.kind, PatternKind::HeadAndShoulders);
        assert_eq!(pattern.pattern_key, PatternKey::HeadAndShoulders);
        assert!(pattern.direction.is_bearish());
        assert_eq!((pattern.start_index, pattern.end_index), (5, 15));
    }

    #[test]
    fn test_neckline_is_horizontal_at_trough_mean() {
        let pattern = HeadAndShouldersDetector::default().detect(&formation()).unwrap();
        let overlay = pattern.overlay.unwrap();
        let neck = &overlay.lines[0];

        assert_eq!(neck.y1, neck.y2);
        assert_eq!(neck.y1, 102.5);
        assert_eq!((neck.x1, neck.x2), (5, 15));
        assert_eq!(neck.label.as_deref(), Some("Neckline"));

        let labels: Vec<_> = overlay.points.iter().map(|p| (p.x, p.label.as_str())).collect();
        assert_eq!(labels, vec![(5, "Left Shoulder"), (10, "Head"), (15, "Right Shoulder")]);
    }

    #[test]
    fn test_neckline_falls_back_to_left_shoulder() {
        // Flat shelf before the head leaves a single trough between the shoulders
        let prices = vec![
            100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 106.0, 106.0, 112.0, 116.0, 120.0, 115.0,
            112.0, 104.0, 101.0, 109.0, 105.0, 102.0, 100.0, 98.0,
        ];
        let pattern = HeadAndShouldersDetector::default().detect(&prices).unwrap();
        let neck = &pattern.overlay.unwrap().lines[0];
        assert_eq!(neck.y1, 110.0);
    }

    #[test]
    fn test_uneven_shoulders_rejected() {
        let mut prices = formation();
        // right shoulder 5% below the left
        prices[13] = 101.0;
        prices[14] = 103.0;
        prices[15] = 104.5;
        prices[16] = 103.0;
        assert!(HeadAndShouldersDetector::default().detect(&prices).is_none());
    }

    #[test]
    fn test_low_head_rejected() {
        let mut prices = formation();
        prices[10] = 111.0; // less than 2% above the left shoulder
        prices[9] = 110.5;
        prices[11] = 110.5;
        assert!(HeadAndShouldersDetector::default().detect(&prices).is_none());
    }

    #[test]
    fn test_needs_twenty_points() {
        let prices = formation();
        assert!(HeadAndShouldersDetector::default().detect(&prices[1..]).is_none());
    }

    #[test]
    fn test_validate_config() {
        assert!(HeadAndShouldersDetector::default().validate_config().is_ok());

        let low_head = HeadAndShouldersDetector {
            head_factor: 0.9,
            ..Default::default()
        };
        assert!(low_head.validate_config().is_err());
    }
}
