//! Series summaries and the narrative join
//!
//! Coarse labels describing a price series (trend, volatility) and a news
//! feed (sentiment), plus [`find_by_tag`] which attaches a detected pattern to
//! a narrative item that names it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PricePoint, TechnicalPattern};

// ============================================================
// TREND
// ============================================================

/// Percent change beyond which a move is strong
const STRONG_MOVE_PCT: f64 = 5.0;
/// Percent change beyond which a move is directional at all
const MOVE_PCT: f64 = 2.0;

/// Direction of a series, first price to last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    StrongUpward,
    Upward,
    Stable,
    Downward,
    StrongDownward,
}

impl Trend {
    /// Classify a change given in percent
    pub fn from_change_pct(change: f64) -> Self {
        if change > STRONG_MOVE_PCT {
            Trend::StrongUpward
        } else if change > MOVE_PCT {
            Trend::Upward
        } else if change < -STRONG_MOVE_PCT {
            Trend::StrongDownward
        } else if change < -MOVE_PCT {
            Trend::Downward
        } else {
            Trend::Stable
        }
    }

    /// Trend of the whole series. Fewer than two points is stable.
    pub fn from_series<T: PricePoint>(series: &[T]) -> Self {
        match series {
            [first, .., last] => {
                let (first, last) = (first.price(), last.price());
                Self::from_change_pct((last - first) / first * 100.0)
            }
            _ => Trend::Stable,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::StrongUpward => "strong upward",
            Trend::Upward => "upward",
            Trend::Stable => "stable",
            Trend::Downward => "downward",
            Trend::StrongDownward => "strong downward",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================
// VOLATILITY
// ============================================================

const HIGH_VOLATILITY: f64 = 0.05;
const MODERATE_VOLATILITY: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Moderate,
    High,
}

impl Volatility {
    /// Classify a mean absolute relative change
    pub fn from_mean_change(mean_change: f64) -> Self {
        if mean_change > HIGH_VOLATILITY {
            Volatility::High
        } else if mean_change > MODERATE_VOLATILITY {
            Volatility::Moderate
        } else {
            Volatility::Low
        }
    }

    pub fn from_series<T: PricePoint>(series: &[T]) -> Self {
        Self::from_mean_change(mean_abs_change(series))
    }

    pub fn label(self) -> &'static str {
        match self {
            Volatility::Low => "low",
            Volatility::Moderate => "moderate",
            Volatility::High => "high",
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean of `|p[i] - p[i-1]| / p[i-1]` over the series; 0.0 with fewer than
/// two points.
pub fn mean_abs_change<T: PricePoint>(series: &[T]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let total: f64 = series
        .windows(2)
        .map(|w| {
            let prev = w[0].price();
            (w[1].price() - prev).abs() / prev
        })
        .sum();
    total / (series.len() - 1) as f64
}

// ============================================================
// NEWS SENTIMENT
// ============================================================

/// Sentiment of a single article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    fn score(self) -> i64 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
        }
    }
}

/// Overall tone of a news feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsSentiment {
    Positive,
    Negative,
    Mixed,
    Neutral,
}

impl NewsSentiment {
    /// Net score of +1 per positive and -1 per negative article. A margin of
    /// more than one article either way decides; an empty feed is neutral.
    pub fn tally<I>(articles: I) -> Self
    where
        I: IntoIterator<Item = Sentiment>,
    {
        let mut articles = articles.into_iter().peekable();
        if articles.peek().is_none() {
            return NewsSentiment::Neutral;
        }

        let score: i64 = articles.map(Sentiment::score).sum();
        if score > 1 {
            NewsSentiment::Positive
        } else if score < -1 {
            NewsSentiment::Negative
        } else {
            NewsSentiment::Mixed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NewsSentiment::Positive => "positive",
            NewsSentiment::Negative => "negative",
            NewsSentiment::Mixed => "mixed",
            NewsSentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for NewsSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================
// MARKET SUMMARY
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub trend: Trend,
    pub volatility: Volatility,
}

impl MarketSummary {
    pub fn from_series<T: PricePoint>(series: &[T]) -> Self {
        Self {
            trend: Trend::from_series(series),
            volatility: Volatility::from_series(series),
        }
    }
}

// ============================================================
// NARRATIVE JOIN
// ============================================================

/// First pattern a narrative tag refers to.
///
/// A tag matches when it equals the pattern key, when the pattern name
/// contains it, or when it contains the pattern key (all case-insensitive).
/// `"none"` and the empty tag never match.
pub fn find_by_tag<'a>(patterns: &'a [TechnicalPattern], tag: &str) -> Option<&'a TechnicalPattern> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() || tag == "none" {
        return None;
    }

    patterns.iter().find(|p| {
        let key = p.pattern_key.as_str();
        key == tag || p.kind.name().to_lowercase().contains(&tag) || tag.contains(key)
    })
}

// ============================================================
// TESTS
// ============================================================
