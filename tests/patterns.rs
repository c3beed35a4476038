//! Integration tests for chartpat pattern detection.
//!
//! These tests drive the public API end to end: the default aggregator,
//! engine configuration, JSON output and the narrative join.

use chartpat::prelude::*;
use chrono::NaiveDate;

// ============================================================
// Series builders
// ============================================================

/// Shoulders at 5 and 15 (110, 109), head at 10 (120)
fn head_and_shoulders() -> Vec<f64> {
    vec![
        100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 106.0, 102.0, 108.0, 114.0, 120.0, 114.0, 108.0,
        103.0, 106.0, 109.0, 105.0, 102.0, 100.0, 98.0,
    ]
}

/// 15 points: peaks falling by 2 from 120, troughs rising by 2 from 90
fn symmetrical_triangle() -> Vec<f64> {
    vec![
        88.0, 120.0, 90.0, 118.0, 92.0, 116.0, 94.0, 114.0, 96.0, 112.0, 98.0, 110.0, 100.0,
        108.0, 101.0,
    ]
}

/// Level tops at 4 and 8 and level bottoms at 6 and 10
fn double_top_and_bottom() -> Vec<f64> {
    vec![
        100.0, 101.0, 103.0, 106.0, 110.0, 105.0, 100.0, 104.0, 110.5, 104.0, 99.5, 103.0, 105.0,
        106.0, 107.0,
    ]
}

fn rising_zigzag(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + i as f64 + if i % 2 == 1 { 3.0 } else { 0.0 })
        .collect()
}

fn monotonic(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

fn engine_for(keys: impl IntoIterator<Item = PatternKey>) -> PatternEngine {
    EngineBuilder::new()
        .with_all_defaults()
        .only_patterns(keys)
        .build()
        .unwrap()
}

// ============================================================
// Aggregator
// ============================================================

#[test]
fn test_short_series_yields_nothing() {
    for len in 0..10 {
        let series = rising_zigzag(len);
        assert!(detect_patterns(&series).is_empty(), "len {len}");
    }
}

#[test]
fn test_head_and_shoulders_scenario() {
    let patterns = detect_patterns(&head_and_shoulders());
    let hs = patterns
        .iter()
        .find(|p| p.kind == PatternKind::HeadAndShoulders)
        .unwrap();

    assert_eq!((hs.start_index, hs.end_index), (5, 15));
    assert_eq!(
        hs.significance,
        "Bearish reversal pattern - breaking below neckline suggests downward move"
    );

    let overlay = hs.overlay.as_ref().unwrap();
    let neckline = &overlay.lines[0];
    assert_eq!(neckline.y1, neckline.y2);
    assert_eq!(overlay.points[1].label, "Head");
    assert_eq!(overlay.points[1].y, 120.0);
}

#[test]
fn test_symmetrical_triangle_scenario() {
    let patterns = engine_for([PatternKey::Triangle]).detect(&symmetrical_triangle());

    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::SymmetricalTriangle);
    assert_eq!(patterns[0].direction, Direction::Neutral);
}

#[test]
fn test_double_top_takes_priority_over_bottom() {
    let engine = engine_for([PatternKey::DoubleTop, PatternKey::DoubleBottom]);
    let patterns = engine.detect(&double_top_and_bottom());

    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::DoubleTop);
}

#[test]
fn test_monotonic_series() {
    let series = monotonic(20);
    let engine = engine_for([
        PatternKey::DoubleTop,
        PatternKey::DoubleBottom,
        PatternKey::Uptrend,
        PatternKey::Downtrend,
    ]);
    assert!(engine.detect(&series).is_empty());
}

#[test]
fn test_uptrend_channel_scenario() {
    let patterns = engine_for([PatternKey::Uptrend]).detect(&rising_zigzag(20));

    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::UptrendChannel);
    assert!(patterns[0].direction.is_bullish());
    assert_eq!((patterns[0].start_index, patterns[0].end_index), (5, 19));
}

#[test]
fn test_flat_series_yields_nothing() {
    let series = vec![42.0; 40];
    assert!(detect_patterns(&series).is_empty());
}

#[test]
fn test_output_is_capped_and_ordered() {
    let engine = PatternEngine::default();
    let patterns = engine.detect(&head_and_shoulders());
    assert!(patterns.len() <= 4);

    let order = |p: &TechnicalPattern| {
        engine
            .detectors()
            .iter()
            .position(|d| d.keys().contains(&p.pattern_key))
            .unwrap()
    };
    let positions: Vec<_> = patterns.iter().map(order).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn test_detectors_see_the_same_series() {
    // a detector's match must not depend on which others are enabled
    let series = head_and_shoulders();
    let all = detect_patterns(&series);
    for pattern in &all {
        let alone = engine_for([pattern.pattern_key]).detect(&series);
        assert_eq!(alone, vec![pattern.clone()]);
    }
}

#[test]
fn test_single_detector_engine() {
    let engine = EngineBuilder::new()
        .add(BuiltinDetector::SupportResistance(
            SupportResistanceDetector::with_defaults(),
        ))
        .build()
        .unwrap();
    let series = [100.0, 105.0, 110.0, 104.0, 102.0, 110.0, 106.0, 103.0, 108.0, 109.9];
    let patterns = engine.detect(&series);

    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].kind, PatternKind::TestingResistance);
}

/// Point whose price cannot be read when `poisoned`
#[derive(Debug, Clone, Copy)]
struct FaultyPoint {
    price: f64,
    poisoned: bool,
}

impl PricePoint for FaultyPoint {
    fn price(&self) -> f64 {
        if self.poisoned {
            panic!("price feed fault");
        }
        self.price
    }
}

#[test]
fn test_panicking_detector_does_not_stop_the_others() {
    // only the 20-point head and shoulders window reaches index 0
    let mut prices = vec![100.0; 10];
    prices.extend([100.0, 105.0, 110.0, 104.0, 102.0, 110.0, 106.0, 103.0, 108.0, 109.9]);
    let points: Vec<FaultyPoint> = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| FaultyPoint {
            price,
            poisoned: i == 0,
        })
        .collect();

    let patterns = detect_patterns(&points);

    assert!(patterns
        .iter()
        .any(|p| p.kind == PatternKind::TestingResistance));
    assert!(patterns
        .iter()
        .all(|p| p.pattern_key != PatternKey::HeadAndShoulders));

    let without_reversal = engine_for(
        PatternKey::ALL
            .iter()
            .copied()
            .filter(|k| *k != PatternKey::HeadAndShoulders),
    );
    assert_eq!(patterns, without_reversal.detect(&prices));
}

// ============================================================
// Input validation
// ============================================================

#[test]
fn test_dated_series_validation() {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let mut points: Vec<HistoricalDataPoint> = head_and_shoulders()
        .into_iter()
        .enumerate()
        .map(|(i, price)| HistoricalDataPoint {
            date: start + chrono::Days::new(i as u64),
            price,
            volume: 500_000,
        })
        .collect();

    let engine = EngineBuilder::new()
        .with_all_defaults()
        .validate_data(true)
        .build()
        .unwrap();
    assert_eq!(engine.scan(&points).unwrap(), detect_patterns(&head_and_shoulders()));

    points[12].price = -1.0;
    match engine.scan(&points) {
        Err(PatternError::InvalidPoint { index, .. }) => assert_eq!(index, 12),
        other => panic!("expected InvalidPoint, got {other:?}"),
    }
}

#[test]
fn test_nan_input_does_not_panic() {
    let mut series = head_and_shoulders();
    series[7] = f64::NAN;
    series[17] = f64::INFINITY;
    let patterns = detect_patterns(&series);
    assert!(patterns.len() <= 4);
}

// ============================================================
// JSON contract
// ============================================================

#[test]
fn test_pattern_json_shape() {
    let patterns = engine_for([PatternKey::HeadAndShoulders]).detect(&head_and_shoulders());
    let json = serde_json::to_value(&patterns[0]).unwrap();

    assert_eq!(json["type"], "Head and Shoulders");
    assert_eq!(json["patternKey"], "head-and-shoulders");
    assert_eq!(json["startIndex"], 5);
    assert_eq!(json["endIndex"], 15);
    assert_eq!(
        json["description"],
        "Classic head and shoulders reversal pattern forming"
    );
    assert_eq!(json["overlayData"]["lines"][0]["label"], "Neckline");
    assert_eq!(json["overlayData"]["points"].as_array().unwrap().len(), 3);
    assert!(json["overlayData"].get("zones").is_none());
}

#[test]
fn test_pattern_json_round_trip() {
    let patterns = detect_patterns(&head_and_shoulders());
    let text = serde_json::to_string(&patterns).unwrap();
    let back: Vec<TechnicalPattern> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, patterns);
}

#[test]
fn test_engine_config_from_json() {
    let config: EngineConfig =
        serde_json::from_str(r#"{"max_patterns": 2, "pattern_filter": ["double-top"]}"#).unwrap();

    assert_eq!(config.max_patterns, 2);
    assert_eq!(config.min_series_len, 10);
    assert_eq!(config.pattern_filter, Some(vec![PatternKey::DoubleTop]));
}

#[test]
fn test_detector_from_json() {
    let detector: BuiltinDetector =
        serde_json::from_str(r#"{"HeadAndShoulders": {"head_factor": 1.05}}"#).unwrap();

    assert_eq!(detector.window(), 20);
    assert!(detector.validate_config().is_ok());

    let bad: std::result::Result<TriangleDetector, _> =
        serde_json::from_str(r#"{"convergence_ratio": 1.5}"#);
    assert!(bad.is_err());
}

// ============================================================
// Narrative join
// ============================================================

#[test]
fn test_narrative_join() {
    let patterns = detect_patterns(&head_and_shoulders());

    let hs = find_by_tag(&patterns, "head-and-shoulders").unwrap();
    assert_eq!(hs.kind, PatternKind::HeadAndShoulders);

    let triangle = find_by_tag(&patterns, "triangle").unwrap();
    assert_eq!(triangle.pattern_key, PatternKey::Triangle);

    assert!(find_by_tag(&patterns, "none").is_none());
    assert!(find_by_tag(&patterns, "cup-and-handle").is_none());
}

#[test]
fn test_market_summary_of_scenario() {
    let summary = MarketSummary::from_series(&head_and_shoulders());
    assert_eq!(summary.trend, Trend::Stable);
    assert_eq!(summary.volatility, Volatility::Moderate);
    assert_eq!(summary.trend.to_string(), "stable");
}
