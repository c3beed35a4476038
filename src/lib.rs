//! # chartpat - Chart Pattern Detector
//!
//! Heuristic chart pattern detection over a daily price series: triangles,
//! head and shoulders, double tops/bottoms, support/resistance tests and trend
//! channels, each annotated with overlay geometry for charting.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartpat::prelude::*;
//!
//! let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i % 4) as f64).collect();
//!
//! // Default engine: all five detectors, at most 4 patterns
//! let patterns = detect_patterns(&prices);
//! assert!(patterns.len() <= 4);
//!
//! // Or build one with custom settings
//! let engine = EngineBuilder::new()
//!     .with_all_defaults()
//!     .validate_data(true)
//!     .build()
//!     .unwrap();
//! let patterns = engine.scan(&prices).unwrap();
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod detectors;
pub mod params;
pub mod summary;

pub mod prelude {
    pub use crate::{
        // Entry points
        detect_patterns,
        // Detectors
        detectors::*,
        // Parameters
        params::{
            get_count, get_factor, get_period, get_ratio, ParamMeta, ParamType,
            ParameterizedDetector,
        },
        // Parallel
        scan_parallel,
        // Summaries
        summary::{find_by_tag, MarketSummary, NewsSentiment, Sentiment, Trend, Volatility},
        // Engine
        BuiltinDetector,
        DetectorId,
        Direction,
        EngineBuilder,
        EngineConfig,
        HistoricalDataPoint,
        OverlayData,
        OverlayLine,
        OverlayPoint,
        OverlayZone,
        // Errors
        PatternError,
        // Core traits
        PatternDetector,
        PatternEngine,
        PatternKey,
        PatternKind,
        Period,
        PricePoint,
        Ratio,
        ReplayIterator,
        Result,
        ScanError,
        ScanResult,
        Snapshot,
        TechnicalPattern,
        validate_series,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised by configuration and opt-in input validation.
///
/// Detection itself never fails: a detector that cannot match returns `None`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid price point at index {index}: {reason}")]
    InvalidPoint { index: usize, reason: &'static str },

    #[error("Unknown pattern key: {0}")]
    UnknownPatternKey(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Window length (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// PRICE SERIES
// ============================================================

/// One observation of a daily price series.
///
/// Series are ordered oldest first. Detectors only read `price()`; volume and
/// date are carried for validation and for callers.
pub trait PricePoint {
    fn price(&self) -> f64;

    fn volume(&self) -> u64 {
        0
    }

    fn date(&self) -> Option<NaiveDate> {
        None
    }

    /// Check that the price is finite and strictly positive
    fn validate(&self) -> Result<()> {
        let price = self.price();
        if price.is_nan() {
            return Err(PatternError::InvalidPoint {
                index: 0,
                reason: "NaN price",
            });
        }
        if price.is_infinite() {
            return Err(PatternError::InvalidPoint {
                index: 0,
                reason: "Infinite price",
            });
        }
        if price <= 0.0 {
            return Err(PatternError::InvalidPoint {
                index: 0,
                reason: "price must be positive",
            });
        }
        Ok(())
    }
}

impl PricePoint for f64 {
    #[inline]
    fn price(&self) -> f64 {
        *self
    }
}

/// Daily close with traded volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: u64,
}

impl PricePoint for HistoricalDataPoint {
    #[inline]
    fn price(&self) -> f64 {
        self.price
    }

    #[inline]
    fn volume(&self) -> u64 {
        self.volume
    }

    #[inline]
    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

/// Validate every point and require strictly ascending dates where present
pub fn validate_series<T: PricePoint>(series: &[T]) -> Result<()> {
    let mut previous: Option<NaiveDate> = None;
    for (i, point) in series.iter().enumerate() {
        point.validate().map_err(|e| match e {
            PatternError::InvalidPoint { reason, .. } => {
                PatternError::InvalidPoint { index: i, reason }
            }
            other => other,
        })?;

        if let Some(date) = point.date() {
            if previous.is_some_and(|prev| date <= prev) {
                return Err(PatternError::InvalidPoint {
                    index: i,
                    reason: "dates must be strictly ascending",
                });
            }
            previous = Some(date);
        }
    }
    Ok(())
}

// ============================================================
// PATTERN KINDS
// ============================================================

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Stable short identifier joining a detected pattern to narrative text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKey {
    Triangle,
    HeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    Support,
    Resistance,
    Uptrend,
    Downtrend,
}

impl PatternKey {
    pub const ALL: [PatternKey; 8] = [
        PatternKey::Triangle,
        PatternKey::HeadAndShoulders,
        PatternKey::DoubleTop,
        PatternKey::DoubleBottom,
        PatternKey::Support,
        PatternKey::Resistance,
        PatternKey::Uptrend,
        PatternKey::Downtrend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PatternKey::Triangle => "triangle",
            PatternKey::HeadAndShoulders => "head-and-shoulders",
            PatternKey::DoubleTop => "double-top",
            PatternKey::DoubleBottom => "double-bottom",
            PatternKey::Support => "support",
            PatternKey::Resistance => "resistance",
            PatternKey::Uptrend => "uptrend",
            PatternKey::Downtrend => "downtrend",
        }
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKey {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim();
        PatternKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| PatternError::UnknownPatternKey(s.to_string()))
    }
}

/// Every pattern the detectors can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[serde(rename = "Symmetrical Triangle")]
    SymmetricalTriangle,
    #[serde(rename = "Ascending Triangle")]
    AscendingTriangle,
    #[serde(rename = "Descending Triangle")]
    DescendingTriangle,
    #[serde(rename = "Head and Shoulders")]
    HeadAndShoulders,
    #[serde(rename = "Double Top")]
    DoubleTop,
    #[serde(rename = "Double Bottom")]
    DoubleBottom,
    #[serde(rename = "Testing Resistance")]
    TestingResistance,
    #[serde(rename = "Testing Support")]
    TestingSupport,
    #[serde(rename = "Uptrend Channel")]
    UptrendChannel,
    #[serde(rename = "Downtrend Channel")]
    DowntrendChannel,
}

impl PatternKind {
    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::SymmetricalTriangle => "Symmetrical Triangle",
            PatternKind::AscendingTriangle => "Ascending Triangle",
            PatternKind::DescendingTriangle => "Descending Triangle",
            PatternKind::HeadAndShoulders => "Head and Shoulders",
            PatternKind::DoubleTop => "Double Top",
            PatternKind::DoubleBottom => "Double Bottom",
            PatternKind::TestingResistance => "Testing Resistance",
            PatternKind::TestingSupport => "Testing Support",
            PatternKind::UptrendChannel => "Uptrend Channel",
            PatternKind::DowntrendChannel => "Downtrend Channel",
        }
    }

    pub fn key(self) -> PatternKey {
        match self {
            PatternKind::SymmetricalTriangle
            | PatternKind::AscendingTriangle
            | PatternKind::DescendingTriangle => PatternKey::Triangle,
            PatternKind::HeadAndShoulders => PatternKey::HeadAndShoulders,
            PatternKind::DoubleTop => PatternKey::DoubleTop,
            PatternKind::DoubleBottom => PatternKey::DoubleBottom,
            PatternKind::TestingResistance => PatternKey::Resistance,
            PatternKind::TestingSupport => PatternKey::Support,
            PatternKind::UptrendChannel => PatternKey::Uptrend,
            PatternKind::DowntrendChannel => PatternKey::Downtrend,
        }
    }

    /// Typical bias of the pattern.
    ///
    /// Both level tests read bullish: resistance as a possible breakout,
    /// support as a level holding.
    pub fn direction(self) -> Direction {
        match self {
            PatternKind::AscendingTriangle
            | PatternKind::DoubleBottom
            | PatternKind::TestingResistance
            | PatternKind::TestingSupport
            | PatternKind::UptrendChannel => Direction::Bullish,
            PatternKind::DescendingTriangle
            | PatternKind::HeadAndShoulders
            | PatternKind::DoubleTop
            | PatternKind::DowntrendChannel => Direction::Bearish,
            PatternKind::SymmetricalTriangle => Direction::Neutral,
        }
    }

    /// What the pattern usually implies
    pub fn significance(self) -> &'static str {
        match self {
            PatternKind::AscendingTriangle => {
                "Bullish pattern - breakout above resistance typically signals upward move"
            }
            PatternKind::DescendingTriangle => {
                "Bearish pattern - breakdown below support typically signals downward move"
            }
            PatternKind::SymmetricalTriangle => {
                "Consolidation pattern - breakout direction indicates next major move"
            }
            PatternKind::HeadAndShoulders => {
                "Bearish reversal pattern - breaking below neckline suggests downward move"
            }
            PatternKind::DoubleTop => {
                "Bearish reversal pattern - two failed attempts at higher prices"
            }
            PatternKind::DoubleBottom => {
                "Bullish reversal pattern - two successful tests of support level"
            }
            PatternKind::TestingResistance => {
                "Breaking above resistance could trigger upward momentum"
            }
            PatternKind::TestingSupport => "Holding support suggests buying interest at this level",
            PatternKind::UptrendChannel => {
                "Bullish trend - higher highs and higher lows indicate strength"
            }
            PatternKind::DowntrendChannel => {
                "Bearish trend - lower highs and lower lows indicate weakness"
            }
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// OVERLAY GEOMETRY
// ============================================================
// Coordinates are (series index, price). Pixel mapping belongs to the chart.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLine {
    pub x1: usize,
    pub y1: f64,
    pub x2: usize,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl OverlayLine {
    /// Horizontal line at `price` between two indices
    pub fn level(x1: usize, x2: usize, price: f64, label: impl Into<String>) -> Self {
        Self {
            x1,
            y1: price,
            x2,
            y2: price,
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub x: usize,
    pub y: f64,
    pub label: String,
}

impl OverlayPoint {
    pub fn new(x: usize, y: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayZone {
    pub x: usize,
    pub y: f64,
    /// Number of points covered, starting at `x`
    pub width: usize,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<OverlayLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<OverlayPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<OverlayZone>,
}

impl OverlayData {
    /// Every series index referenced by the overlay. A zone contributes its
    /// first and last covered index.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines
            .iter()
            .flat_map(|l| [l.x1, l.x2])
            .chain(self.points.iter().map(|p| p.x))
            .chain(
                self.zones
                    .iter()
                    .flat_map(|z| [z.x, z.x + z.width.saturating_sub(1)]),
            )
    }
}

// ============================================================
// TECHNICAL PATTERN - result of detection
// ============================================================

/// A detected chart pattern over `start_index..=end_index` of the input series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalPattern {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub pattern_key: PatternKey,
    pub direction: Direction,
    pub start_index: usize,
    pub end_index: usize,
    pub description: String,
    pub significance: String,
    #[serde(
        rename = "overlayData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub overlay: Option<OverlayData>,
}

impl TechnicalPattern {
    /// New pattern with key, direction and significance taken from `kind`
    pub fn new(
        kind: PatternKind,
        start_index: usize,
        end_index: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            pattern_key: kind.key(),
            direction: kind.direction(),
            start_index,
            end_index,
            description: description.into(),
            significance: kind.significance().to_string(),
            overlay: None,
        }
    }

    pub fn with_overlay(mut self, overlay: OverlayData) -> Self {
        self.overlay = Some(overlay);
        self
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// Identifier of a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectorId(pub &'static str);

impl DetectorId {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// A heuristic that looks at the trailing window of a series and reports at
/// most one pattern
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> DetectorId;

    /// Trailing points the detector needs; shorter series never match
    fn window(&self) -> usize;

    /// Pattern keys this detector can emit
    fn keys(&self) -> &'static [PatternKey];

    fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - enum dispatch over the closed set
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: PricePoint>(&self, series: &[T]) -> Option<TechnicalPattern> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, series)),*
                }
            }

            #[inline]
            pub fn id(&self) -> DetectorId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn window(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::window(d)),*
                }
            }

            #[inline]
            pub fn keys(&self) -> &'static [PatternKey] {
                match self {
                    $(Self::$variant(d) => PatternDetector::keys(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

// Declaration order is the default aggregation order
define_builtin_detectors! {
    Triangle(TriangleDetector),
    HeadAndShoulders(HeadAndShouldersDetector),
    DoubleTopBottom(DoubleTopBottomDetector),
    SupportResistance(SupportResistanceDetector),
    TrendChannel(TrendChannelDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shorter series yield no patterns at all
    pub min_series_len: usize,
    /// Results beyond this count are dropped, keeping detector order
    pub max_patterns: usize,
    /// Reject NaN, non-positive prices and unordered dates in `scan`
    pub validate_data: bool,
    pub pattern_filter: Option<Vec<PatternKey>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_series_len: helpers::MIN_SERIES_LEN,
            max_patterns: helpers::MAX_PATTERNS,
            validate_data: false,
            pattern_filter: None,
        }
    }
}

/// Runs a fixed list of detectors against one series and aggregates results
#[derive(Debug, Clone)]
pub struct PatternEngine {
    detectors: Vec<BuiltinDetector>,
    config: EngineConfig,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self {
            detectors: default_detectors().to_vec(),
            config: EngineConfig::default(),
        }
    }
}

impl PatternEngine {
    pub fn detectors(&self) -> &[BuiltinDetector] {
        &self.detectors
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every detector against `series` and return the surviving patterns
    /// in detector order, truncated to `max_patterns`.
    ///
    /// A detector that panics is logged and skipped; the others still run.
    pub fn detect<T: PricePoint>(&self, series: &[T]) -> Vec<TechnicalPattern> {
        if series.len() < self.config.min_series_len {
            tracing::debug!(
                len = series.len(),
                need = self.config.min_series_len,
                "series too short for pattern detection"
            );
            return Vec::new();
        }

        let mut results = Vec::new();

        for detector in &self.detectors {
            if !self.should_run(detector) {
                continue;
            }
            if series.len() < detector.window() {
                tracing::debug!(
                    detector = detector.id().as_str(),
                    len = series.len(),
                    need = detector.window(),
                    "skipping detector: insufficient data"
                );
                continue;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| detector.detect(series))) {
                Ok(Some(pattern)) => {
                    if self.should_include(&pattern) {
                        tracing::debug!(
                            detector = detector.id().as_str(),
                            pattern = pattern.kind.name(),
                            start = pattern.start_index,
                            end = pattern.end_index,
                            "pattern detected"
                        );
                        results.push(pattern);
                    }
                }
                Ok(None) => {
                    tracing::trace!(detector = detector.id().as_str(), "no match");
                }
                Err(_) => {
                    tracing::warn!(
                        detector = detector.id().as_str(),
                        "detector panicked, skipping"
                    );
                }
            }
        }

        if results.len() > self.config.max_patterns {
            tracing::debug!(
                found = results.len(),
                kept = self.config.max_patterns,
                "truncating detected patterns"
            );
            results.truncate(self.config.max_patterns);
        }

        results
    }

    /// Like [`detect`](Self::detect), validating the series first when
    /// `validate_data` is enabled.
    pub fn scan<T: PricePoint>(&self, series: &[T]) -> Result<Vec<TechnicalPattern>> {
        if self.config.validate_data {
            validate_series(series)?;
        }
        Ok(self.detect(series))
    }

    /// Iterate over every prefix of `series` long enough to analyze, as the
    /// chart would have looked at each day.
    pub fn replay<'a, T: PricePoint>(&'a self, series: &'a [T]) -> ReplayIterator<'a, T> {
        ReplayIterator::new(self, series)
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn should_run(&self, detector: &BuiltinDetector) -> bool {
        match self.config.pattern_filter {
            Some(ref filter) => detector.keys().iter().any(|k| filter.contains(k)),
            None => true,
        }
    }

    fn should_include(&self, pattern: &TechnicalPattern) -> bool {
        match self.config.pattern_filter {
            Some(ref filter) => filter.contains(&pattern.pattern_key),
            None => true,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.config.max_patterns == 0 {
            return Err(PatternError::InvalidConfig(
                "max_patterns must be > 0".to_string(),
            ));
        }
        for d in &self.detectors {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// Detect patterns with the default engine: all five detectors, series of at
/// least 10 points, at most 4 results.
pub fn detect_patterns<T: PricePoint>(series: &[T]) -> Vec<TechnicalPattern> {
    PatternEngine::default().detect(series)
}

fn default_detectors() -> [BuiltinDetector; 5] {
    [
        BuiltinDetector::Triangle(TriangleDetector::default()),
        BuiltinDetector::HeadAndShoulders(HeadAndShouldersDetector::default()),
        BuiltinDetector::DoubleTopBottom(DoubleTopBottomDetector::default()),
        BuiltinDetector::SupportResistance(SupportResistanceDetector::default()),
        BuiltinDetector::TrendChannel(TrendChannelDetector::default()),
    ]
}

// ============================================================
// REPLAY ITERATOR
// ============================================================

/// Patterns visible when the series ended at `end_index`
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub end_index: usize,
    pub patterns: Vec<TechnicalPattern>,
}

/// Iterator over series prefixes with their patterns
pub struct ReplayIterator<'a, T: PricePoint> {
    engine: &'a PatternEngine,
    series: &'a [T],
    current: usize,
}

impl<'a, T: PricePoint> ReplayIterator<'a, T> {
    fn new(engine: &'a PatternEngine, series: &'a [T]) -> Self {
        Self {
            engine,
            series,
            current: engine.config.min_series_len.max(1) - 1,
        }
    }
}

impl<'a, T: PricePoint> Iterator for ReplayIterator<'a, T> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.series.len() {
            return None;
        }

        let end_index = self.current;
        let patterns = self.engine.detect(&self.series[..=end_index]);
        self.current += 1;

        Some(Snapshot {
            end_index,
            patterns,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl<'a, T: PricePoint> ExactSizeIterator for ReplayIterator<'a, T> {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    detectors: Vec<BuiltinDetector>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the five builtin detectors in aggregation order: triangle, head and
    /// shoulders, double top/bottom, support/resistance, trend channel
    pub fn with_all_defaults(mut self) -> Self {
        self.detectors.extend(default_detectors());
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.detectors.push(detector);
        Ok(self)
    }

    /// Replace the whole engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Cap the number of returned patterns
    pub fn max_patterns(mut self, max: usize) -> Self {
        self.config.max_patterns = max;
        self
    }

    /// Shortest series that gets analyzed
    pub fn min_series_len(mut self, len: usize) -> Self {
        self.config.min_series_len = len;
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, keys: impl IntoIterator<Item = PatternKey>) -> Self {
        self.config.pattern_filter = Some(keys.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let engine = PatternEngine {
            detectors: self.detectors,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub patterns: Vec<TechnicalPattern>,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Parallel scanning of multiple instruments, e.g. a watchlist
pub fn scan_parallel<'a, T, I>(
    engine: &PatternEngine,
    instruments: I,
) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: PricePoint + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, series)| {
            engine
                .scan(series)
                .map(|patterns| ScanResult {
                    symbol: symbol.to_string(),
                    patterns,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
