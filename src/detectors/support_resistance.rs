//! Support / resistance detector
//!
//! Price sitting near the high (or low) of the trailing 10 points after that
//! level was touched at least twice. Resistance is checked first.

use std::collections::HashMap;

use super::helpers::{
    price_bounds, trailing_window, LEVEL_WINDOW, MIN_TOUCHES, PROXIMITY_BAND, TOUCH_BAND,
};
use crate::{
    params::{get_count, get_period, get_ratio, ParamMeta, ParameterizedDetector},
    DetectorId, OverlayData, OverlayLine, PatternDetector, PatternError, PatternKey, PatternKind,
    Period, PricePoint, Ratio, Result, TechnicalPattern,
};

/// SUPPORT_RESISTANCE - current price testing a recent extreme
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SupportResistanceDetector {
    pub window: Period,
    /// A point touches a level when within this share of the window range
    pub touch_band: Ratio,
    /// Current price tests a level when within this share of the window range
    pub proximity_band: Ratio,
    pub min_touches: usize,
}

impl Default for SupportResistanceDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(LEVEL_WINDOW),
            touch_band: Ratio::new_const(TOUCH_BAND),
            proximity_band: Ratio::new_const(PROXIMITY_BAND),
            min_touches: MIN_TOUCHES,
        }
    }
}

impl SupportResistanceDetector {
    /// True when `current` tests `level` and the window touched it often enough
    fn is_tested<T: PricePoint>(&self, window: &[T], level: f64, current: f64, range: f64) -> bool {
        let touch = range * self.touch_band.get();
        let touches = window
            .iter()
            .filter(|p| (p.price() - level).abs() < touch)
            .count();

        (current - level).abs() < range * self.proximity_band.get() && touches >= self.min_touches
    }
}

fn level_pattern(
    kind: PatternKind,
    start: usize,
    end: usize,
    level: f64,
    name: &str,
) -> TechnicalPattern {
    let overlay = OverlayData {
        lines: vec![OverlayLine::level(start, end, level, format!("{name} ${level:.2}"))],
        ..Default::default()
    };
    let description = format!("Price testing {} level at ${level:.2}", name.to_lowercase());

    TechnicalPattern::new(kind, start, end, description).with_overlay(overlay)
}

impl PatternDetector for SupportResistanceDetector {
    fn id(&self) -> DetectorId {
        DetectorId("SUPPORT_RESISTANCE")
    }

    fn window(&self) -> usize {
        self.window.get()
    }

    fn keys(&self) -> &'static [PatternKey] {
        &[PatternKey::Resistance, PatternKey::Support]
    }

    fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern> {
        let (window, offset) = trailing_window(series, self.window.get())?;
        let (low, high) = price_bounds(window)?;
        let current = series.last()?.price();
        let range = high - low;
        let end = series.len() - 1;

        if self.is_tested(window, high, current, range) {
            Some(level_pattern(PatternKind::TestingResistance, offset, end, high, "Resistance"))
        } else if self.is_tested(window, low, current, range) {
            Some(level_pattern(PatternKind::TestingSupport, offset, end, low, "Support"))
        } else {
            None
        }
    }

    fn validate_config(&self) -> Result<()> {
        if self.min_touches == 0 {
            return Err(PatternError::InvalidConfig(
                "min_touches must be > 0".to_string(),
            ));
        }
        if self.min_touches > self.window.get() {
            return Err(PatternError::InvalidConfig(format!(
                "min_touches {} exceeds window {}",
                self.min_touches,
                self.window.get()
            )));
        }
        Ok(())
    }
}

static SUPPORT_RESISTANCE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period(
        "window",
        LEVEL_WINDOW as f64,
        (5.0, 30.0, 5.0),
        "Trailing points defining the recent high and low",
    ),
    ParamMeta::ratio(
        "touch_band",
        TOUCH_BAND,
        (0.01, 0.05, 0.01),
        "Distance to a level that counts as a touch, relative to the range",
    ),
    ParamMeta::ratio(
        "proximity_band",
        PROXIMITY_BAND,
        (0.02, 0.1, 0.01),
        "Distance of the current price to a level being tested, relative to the range",
    ),
    ParamMeta::count(
        "min_touches",
        MIN_TOUCHES as f64,
        (1.0, 5.0, 1.0),
        "Touches needed before a level counts as tested",
    ),
];

impl ParameterizedDetector for SupportResistanceDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SUPPORT_RESISTANCE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", LEVEL_WINDOW)?,
            touch_band: get_ratio(params, "touch_band", TOUCH_BAND)?,
            proximity_band: get_ratio(params, "proximity_band", PROXIMITY_BAND)?,
            min_touches: get_count(params, "min_touches", MIN_TOUCHES)?,
        })
    }

    fn detector_id_str() -> &'static str {
        "SUPPORT_RESISTANCE"
    }
}
