//! Trend channel detector
//!
//! Peaks and troughs of the trailing 15 points both stepping up (or both
//! stepping down) by more than 3% of the window range per swing.

use std::collections::HashMap;

use super::helpers::{
    average_step, find_extrema, line_through, price_bounds, trailing_window, ExtremaScan,
    CHANNEL_SLOPE_RATIO, MIN_SWING_WINDOW, SWING_WINDOW,
};
use crate::{
    params::{get_period, get_ratio, ParamMeta, ParameterizedDetector},
    DetectorId, OverlayData, PatternDetector, PatternError, PatternKey, PatternKind, Period,
    PricePoint, Ratio, Result, TechnicalPattern,
};

/// TREND_CHANNEL - parallel rising or falling swings
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrendChannelDetector {
    pub window: Period,
    /// Both slopes must exceed this share of the window range
    pub min_slope_ratio: Ratio,
}

impl Default for TrendChannelDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(SWING_WINDOW),
            min_slope_ratio: Ratio::new_const(CHANNEL_SLOPE_RATIO),
        }
    }
}

impl PatternDetector for TrendChannelDetector {
    fn id(&self) -> DetectorId {
        DetectorId("TREND_CHANNEL")
    }

    fn window(&self) -> usize {
        self.window.get()
    }

    fn keys(&self) -> &'static [PatternKey] {
        &[PatternKey::Uptrend, PatternKey::Downtrend]
    }

    fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern> {
        let (window, offset) = trailing_window(series, self.window.get())?;
        let extrema = find_extrema(window, offset, ExtremaScan::ADJACENT);

        let high_slope = average_step(&extrema.peaks)?;
        let low_slope = average_step(&extrema.troughs)?;
        let (low, high) = price_bounds(window)?;
        let min_slope = (high - low) * self.min_slope_ratio.get();

        let (kind, description) = if high_slope > min_slope && low_slope > min_slope {
            (
                PatternKind::UptrendChannel,
                "Price moving within an upward trending channel",
            )
        } else if high_slope < -min_slope && low_slope < -min_slope {
            (
                PatternKind::DowntrendChannel,
                "Price moving within a downward trending channel",
            )
        } else {
            return None;
        };

        let overlay = OverlayData {
            lines: vec![
                line_through(&extrema.peaks, "Upper channel")?,
                line_through(&extrema.troughs, "Lower channel")?,
            ],
            ..Default::default()
        };

        Some(
            TechnicalPattern::new(kind, offset, series.len() - 1, description)
                .with_overlay(overlay),
        )
    }

    fn validate_config(&self) -> Result<()> {
        if self.window.get() < MIN_SWING_WINDOW {
            return Err(PatternError::InvalidConfig(format!(
                "trend channel window {} cannot hold two peaks and two troughs",
                self.window.get()
            )));
        }
        Ok(())
    }
}

static TREND_CHANNEL_PARAMS: &[ParamMeta] = &[
    ParamMeta::period(
        "window",
        SWING_WINDOW as f64,
        (10.0, 30.0, 5.0),
        "Trailing points scanned for the channel",
    ),
    ParamMeta::ratio(
        "min_slope_ratio",
        CHANNEL_SLOPE_RATIO,
        (0.01, 0.1, 0.01),
        "Slope each side needs, relative to the window range",
    ),
];

impl ParameterizedDetector for TrendChannelDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TREND_CHANNEL_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", SWING_WINDOW)?,
            min_slope_ratio: get_ratio(params, "min_slope_ratio", CHANNEL_SLOPE_RATIO)?,
        })
    }

    fn detector_id_str() -> &'static str {
        "TREND_CHANNEL"
    }
}
