//! Triangle detector
//!
//! Converging upper (peaks) and lower (troughs) trendlines over the trailing
//! 15 points, classified as ascending, descending or symmetrical.

use std::collections::HashMap;

use super::helpers::{
    average_step, find_extrema, line_through, trailing_window, ExtremaScan, CONVERGENCE_RATIO,
    FLAT_SLOPE, MIN_SWING_WINDOW, SWING_WINDOW, TRENDING_SLOPE,
};
use crate::{
    params::{get_factor, get_period, get_ratio, ParamMeta, ParameterizedDetector},
    DetectorId, OverlayData, PatternDetector, PatternError, PatternKey, PatternKind, Period,
    PricePoint, Ratio, Result, TechnicalPattern,
};

/// TRIANGLE - converging trendlines
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TriangleDetector {
    pub window: Period,
    /// Minimum slope difference, as a share of the first peak/trough gap
    pub convergence_ratio: Ratio,
    /// Slope magnitude above which a trendline is rising or falling
    pub trending_slope: f64,
    /// Slope magnitude below which a trendline is flat
    pub flat_slope: f64,
}

impl Default for TriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(SWING_WINDOW),
            convergence_ratio: Ratio::new_const(CONVERGENCE_RATIO),
            trending_slope: TRENDING_SLOPE,
            flat_slope: FLAT_SLOPE,
        }
    }
}

impl TriangleDetector {
    fn classify(&self, high_slope: f64, low_slope: f64) -> PatternKind {
        let falling_highs = high_slope < -self.trending_slope;
        let rising_lows = low_slope > self.trending_slope;

        if falling_highs && rising_lows {
            PatternKind::SymmetricalTriangle
        } else if falling_highs && low_slope.abs() < self.flat_slope {
            PatternKind::DescendingTriangle
        } else if high_slope.abs() < self.flat_slope && rising_lows {
            PatternKind::AscendingTriangle
        } else {
            PatternKind::SymmetricalTriangle
        }
    }
}

impl PatternDetector for TriangleDetector {
    fn id(&self) -> DetectorId {
        DetectorId("TRIANGLE")
    }

    fn window(&self) -> usize {
        self.window.get()
    }

    fn keys(&self) -> &'static [PatternKey] {
        &[PatternKey::Triangle]
    }

    fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern> {
        let (window, offset) = trailing_window(series, self.window.get())?;
        let extrema = find_extrema(window, offset, ExtremaScan::ADJACENT);

        let high_slope = average_step(&extrema.peaks)?;
        let low_slope = average_step(&extrema.troughs)?;

        let opening = (extrema.peaks[0].price - extrema.troughs[0].price).abs();
        let converging = (high_slope - low_slope).abs() > opening * self.convergence_ratio.get();
        if !converging {
            return None;
        }

        let kind = self.classify(high_slope, low_slope);
        let overlay = OverlayData {
            lines: vec![
                line_through(&extrema.peaks, "Upper trendline")?,
                line_through(&extrema.troughs, "Lower trendline")?,
            ],
            ..Default::default()
        };

        Some(
            TechnicalPattern::new(
                kind,
                offset,
                series.len() - 1,
                format!("{kind} forming with converging trendlines"),
            )
            .with_overlay(overlay),
        )
    }

    fn validate_config(&self) -> Result<()> {
        if self.window.get() < MIN_SWING_WINDOW {
            return Err(PatternError::InvalidConfig(format!(
                "triangle window {} cannot hold two peaks and two troughs",
                self.window.get()
            )));
        }
        if self.flat_slope < 0.0 || self.trending_slope < 0.0 {
            return Err(PatternError::InvalidConfig(
                "triangle slope thresholds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

static TRIANGLE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period(
        "window",
        SWING_WINDOW as f64,
        (10.0, 30.0, 5.0),
        "Trailing points scanned for peaks and troughs",
    ),
    ParamMeta::ratio(
        "convergence_ratio",
        CONVERGENCE_RATIO,
        (0.005, 0.05, 0.005),
        "Slope difference needed, relative to the opening gap",
    ),
    ParamMeta::factor(
        "trending_slope",
        TRENDING_SLOPE,
        (0.05, 0.5, 0.05),
        "Slope beyond which a trendline is rising or falling",
    ),
    ParamMeta::factor(
        "flat_slope",
        FLAT_SLOPE,
        (0.01, 0.1, 0.01),
        "Slope under which a trendline is flat",
    ),
];

impl ParameterizedDetector for TriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", SWING_WINDOW)?,
            convergence_ratio: get_ratio(params, "convergence_ratio", CONVERGENCE_RATIO)?,
            trending_slope: get_factor(params, "trending_slope", TRENDING_SLOPE)?,
            flat_slope: get_factor(params, "flat_slope", FLAT_SLOPE)?,
        })
    }

    fn detector_id_str() -> &'static str {
        "TRIANGLE"
    }
}
