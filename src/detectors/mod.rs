//! Chart pattern detectors
//!
//! Each detector inspects the trailing window of a price series and reports
//! at most one pattern.
//!
//! # Detectors
//!
//! - **Triangle (15)**: ascending, descending and symmetrical triangles
//! - **Head and shoulders (20)**: three-peak bearish reversal with neckline
//! - **Double top/bottom (15)**: two tests of the same level, tops first
//! - **Support/resistance (10)**: current price testing a recent high or low
//! - **Trend channel (15)**: parallel rising or falling swings

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod double_top_bottom;
pub mod head_shoulders;
pub mod support_resistance;
pub mod trend;
pub mod triangle;

// Re-export all detectors for convenience
pub use double_top_bottom::*;
pub use head_shoulders::*;
pub use support_resistance::*;
pub use trend::*;
pub use triangle::*;

impl_with_defaults!(
    TriangleDetector,
    HeadAndShouldersDetector,
    DoubleTopBottomDetector,
    SupportResistanceDetector,
    TrendChannelDetector,
);
