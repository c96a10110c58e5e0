//! Hue Histogram Analyzer module
//!
//! Derives a [`ColorSignature`] from a grid of RGB samples.
//!
//! # Algorithm
//!
//! 1. Convert every pixel to HSV and drop near-gray / near-black pixels
//! 2. Accumulate `saturation * value` into a 360-bucket hue histogram
//! 3. Pick the heaviest bucket as dominant hue (ties go to the lower hue)
//! 4. Pick the first ranked hue at least `secondary_separation` degrees away,
//!    or the dominant hue itself when only one bucket is populated
//! 5. Average the saturation of pixels within `saturation_band` degrees
//!    of the dominant hue, weighted the same way as the histogram
//!
//! # Example
//!
//! ```rust
//! use hue_index::{AnalyzerOptions, HueAnalyzer};
//!
//! let analyzer = HueAnalyzer::new(AnalyzerOptions::default());
//! let pixels = [[255, 0, 0], [255, 0, 0], [255, 0, 0], [0, 0, 255]];
//! let sig = analyzer.analyze(&pixels);
//! assert_eq!(sig.dominant_hue, 0);
//! assert_eq!(sig.secondary_hue, 240);
//! assert_eq!(sig.weight, 0.75);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::signature::ColorSignature;

// ============================================================
// Constants
// ============================================================

/// Number of hue buckets (one per degree)
pub const HUE_BUCKETS: usize = 360;

/// Pixels below this saturation are treated as gray
const DEFAULT_MIN_SATURATION: f64 = 0.2;

/// Pixels below this value are treated as black
const DEFAULT_MIN_VALUE: f64 = 0.2;

/// Minimum circular distance between dominant and secondary hue
const DEFAULT_SECONDARY_SEPARATION: u16 = 15;

/// Maximum circular distance from the dominant hue for the saturation estimate
const DEFAULT_SATURATION_BAND: u16 = 12;

// ============================================================
// Options
// ============================================================

/// Analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    /// Minimum HSV saturation for a pixel to count (0.0-1.0)
    pub min_saturation: f64,
    /// Minimum HSV value for a pixel to count (0.0-1.0)
    pub min_value: f64,
    /// Minimum circular distance (degrees) for the secondary hue
    pub secondary_separation: u16,
    /// Maximum circular distance (degrees) for the saturation estimate
    pub saturation_band: u16,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            min_saturation: DEFAULT_MIN_SATURATION,
            min_value: DEFAULT_MIN_VALUE,
            secondary_separation: DEFAULT_SECONDARY_SEPARATION,
            saturation_band: DEFAULT_SATURATION_BAND,
        }
    }
}

impl AnalyzerOptions {
    /// Create a new options builder
    pub fn builder() -> AnalyzerOptionsBuilder {
        AnalyzerOptionsBuilder::default()
    }
}

/// Builder for AnalyzerOptions
#[derive(Debug, Default)]
pub struct AnalyzerOptionsBuilder {
    options: AnalyzerOptions,
}

impl AnalyzerOptionsBuilder {
    /// Set the gray cutoff (clamped to 0.0-1.0)
    pub fn min_saturation(mut self, value: f64) -> Self {
        self.options.min_saturation = value.clamp(0.0, 1.0);
        self
    }

    /// Set the black cutoff (clamped to 0.0-1.0)
    pub fn min_value(mut self, value: f64) -> Self {
        self.options.min_value = value.clamp(0.0, 1.0);
        self
    }

    /// Set the secondary hue separation (clamped to 0-180)
    pub fn secondary_separation(mut self, degrees: u16) -> Self {
        self.options.secondary_separation = degrees.min(180);
        self
    }

    /// Set the saturation band (clamped to 0-180)
    pub fn saturation_band(mut self, degrees: u16) -> Self {
        self.options.saturation_band = degrees.min(180);
        self
    }

    /// Build the options
    pub fn build(self) -> AnalyzerOptions {
        self.options
    }
}

// ============================================================
// Histogram
// ============================================================

/// A pixel that survived the gray/black filter
#[derive(Debug, Clone, Copy)]
struct ChromaSample {
    hue: u16,
    saturation: f64,
    weight: f64,
}

/// Chroma-weighted hue histogram
#[derive(Debug, Clone)]
pub struct HueHistogram {
    bins: Vec<f64>,
    total: f64,
}

impl HueHistogram {
    /// Accumulated weight of one hue bucket
    pub fn bin(&self, hue: u16) -> f64 {
        self.bins.get(hue as usize).copied().unwrap_or(0.0)
    }

    /// Sum of all bucket weights
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Number of buckets with non-zero weight
    pub fn populated(&self) -> usize {
        self.bins.iter().filter(|w| **w > 0.0).count()
    }

    /// Hues ordered by weight descending, ties by lower hue
    pub fn ranked(&self) -> Vec<u16> {
        let mut ranked: Vec<u16> = (0..HUE_BUCKETS as u16).collect();
        // stable sort keeps ascending hue order within equal weights
        ranked.sort_by(|&a, &b| {
            self.bins[b as usize]
                .partial_cmp(&self.bins[a as usize])
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }
}

// ============================================================
// Analyzer
// ============================================================

/// Hue histogram analyzer
#[derive(Debug, Clone, Default)]
pub struct HueAnalyzer {
    options: AnalyzerOptions,
}

impl HueAnalyzer {
    /// Create an analyzer with the given thresholds
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    /// Thresholds in use
    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Build the hue histogram for a set of pixels
    pub fn histogram(&self, pixels: &[[u8; 3]]) -> HueHistogram {
        let samples = self.chroma_samples(pixels);
        Self::histogram_from(&samples)
    }

    /// Compute the color signature of a set of pixels
    pub fn analyze(&self, pixels: &[[u8; 3]]) -> ColorSignature {
        let samples = self.chroma_samples(pixels);
        let histogram = Self::histogram_from(&samples);

        if histogram.total <= 0.0 {
            return ColorSignature::ZERO;
        }

        let ranked = histogram.ranked();
        let dominant = ranked[0];

        // a single populated bucket is its own secondary; otherwise zero-weight
        // hues stay in the ranking so a far enough hue is always found
        let secondary = if histogram.populated() <= 1 {
            dominant
        } else {
            ranked
                .iter()
                .skip(1)
                .copied()
                .find(|&hue| circular_distance(hue, dominant) >= self.options.secondary_separation)
                .unwrap_or(dominant)
        };

        let weight = histogram.bin(dominant) / histogram.total;

        let (sat_num, sat_den) = samples
            .iter()
            .filter(|s| circular_distance(s.hue, dominant) <= self.options.saturation_band)
            .fold((0.0, 0.0), |(num, den), s| {
                (num + s.saturation * s.weight, den + s.weight)
            });
        let saturation = if sat_den > 0.0 { sat_num / sat_den } else { 0.0 };

        ColorSignature::new(dominant, secondary, weight, saturation)
    }

    fn chroma_samples(&self, pixels: &[[u8; 3]]) -> Vec<ChromaSample> {
        pixels
            .iter()
            .filter_map(|&[r, g, b]| {
                let (h, s, v) = rgb_to_hsv(r, g, b);
                if s < self.options.min_saturation || v < self.options.min_value {
                    return None;
                }
                Some(ChromaSample {
                    hue: quantize_hue(h),
                    saturation: s,
                    weight: s * v,
                })
            })
            .collect()
    }

    fn histogram_from(samples: &[ChromaSample]) -> HueHistogram {
        let mut bins = vec![0.0; HUE_BUCKETS];
        for sample in samples {
            bins[sample.hue as usize] += sample.weight;
        }
        let total = bins.iter().sum();
        HueHistogram { bins, total }
    }
}

/// Convert RGB (0-255) to HSV: hue in degrees [0, 360), saturation and value in [0, 1]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let rf = r as f64 / 255.0;
    let gf = g as f64 / 255.0;
    let bf = b as f64 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let v = max;
    let d = max - min;
    let s = if max == 0.0 { 0.0 } else { d / max };

    let h = if d == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / d) % 6.0)
    } else if max == gf {
        60.0 * (((bf - rf) / d) + 2.0)
    } else {
        60.0 * (((rf - gf) / d) + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, s, v)
}

/// Round a hue in degrees to its bucket; 360 wraps to 0
#[inline]
pub fn quantize_hue(hue: f64) -> u16 {
    (hue.round() as i64).rem_euclid(HUE_BUCKETS as i64) as u16
}

/// Shorter arc between two hues on the 360-degree circle
#[inline]
pub fn circular_distance(a: u16, b: u16) -> u16 {
    let d = (a as i32 - b as i32).unsigned_abs() % HUE_BUCKETS as u32;
    d.min(HUE_BUCKETS as u32 - d) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> HueAnalyzer {
        HueAnalyzer::new(AnalyzerOptions::default())
    }

    #[test]
    fn test_default_options() {
        let opts = AnalyzerOptions::default();
        assert_eq!(opts.min_saturation, 0.2);
        assert_eq!(opts.min_value, 0.2);
        assert_eq!(opts.secondary_separation, 15);
        assert_eq!(opts.saturation_band, 12);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = AnalyzerOptions::builder()
            .min_saturation(0.3)
            .min_value(1.5)
            .secondary_separation(400)
            .saturation_band(20)
            .build();

        assert_eq!(opts.min_saturation, 0.3);
        assert_eq!(opts.min_value, 1.0);
        assert_eq!(opts.secondary_separation, 180);
        assert_eq!(opts.saturation_band, 20);
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0.0, 1.0, 1.0));
        assert_eq!(rgb_to_hsv(0, 255, 0), (120.0, 1.0, 1.0));
        assert_eq!(rgb_to_hsv(0, 0, 255), (240.0, 1.0, 1.0));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_rgb_to_hsv_magenta_side_wraps() {
        // red max, blue > green gives a negative intermediate hue
        let (h, _, _) = rgb_to_hsv(255, 0, 64);
        assert!(h > 340.0 && h < 360.0);
    }

    #[test]
    fn test_quantize_hue_wraps() {
        assert_eq!(quantize_hue(0.0), 0);
        assert_eq!(quantize_hue(239.6), 240);
        assert_eq!(quantize_hue(359.4), 359);
        assert_eq!(quantize_hue(359.6), 0);
    }

    #[test]
    fn test_circular_distance() {
        assert_eq!(circular_distance(350, 5), 15);
        assert_eq!(circular_distance(5, 350), 15);
        assert_eq!(circular_distance(0, 180), 180);
        assert_eq!(circular_distance(10, 10), 0);
        assert_eq!(circular_distance(0, 359), 1);
    }

    #[test]
    fn test_all_gray_returns_zero() {
        let pixels = vec![[128, 128, 128]; 16];
        assert_eq!(analyzer().analyze(&pixels), ColorSignature::ZERO);
    }

    #[test]
    fn test_all_black_returns_zero() {
        // saturated but too dark
        let pixels = vec![[30, 0, 0]; 16];
        assert_eq!(analyzer().analyze(&pixels), ColorSignature::ZERO);
    }

    #[test]
    fn test_empty_pixels_return_zero() {
        assert_eq!(analyzer().analyze(&[]), ColorSignature::ZERO);
    }

    #[test]
    fn test_uniform_hue() {
        let pixels = vec![[0, 255, 0]; 64];
        let sig = analyzer().analyze(&pixels);

        assert_eq!(sig.dominant_hue, 120);
        assert_eq!(sig.secondary_hue, 120);
        assert_eq!(sig.weight, 1.0);
        assert_eq!(sig.saturation, 1.0);
    }

    #[test]
    fn test_uniform_hue_partial_saturation() {
        let pixel = [255, 128, 128];
        let (_, s, _) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let sig = analyzer().analyze(&vec![pixel; 32]);

        assert_eq!(sig.dominant_hue, 0);
        assert_eq!(sig.weight, 1.0);
        assert!((sig.saturation - s).abs() < 1e-4);
    }

    #[test]
    fn test_red_blue_scenario() {
        let pixels = [[255, 0, 0], [255, 0, 0], [255, 0, 0], [0, 0, 255]];
        let sig = analyzer().analyze(&pixels);

        assert_eq!(sig.dominant_hue, 0);
        assert_eq!(sig.secondary_hue, 240);
        assert_eq!(sig.weight, 0.75);
        assert_eq!(sig.saturation, 1.0);
    }

    #[test]
    fn test_secondary_skips_near_hues() {
        // 0 dominant, 10 is too close, 350 is 10 away, 30 qualifies
        let mut pixels = vec![[255, 0, 0]; 10];
        pixels.extend(vec![[255, 43, 0]; 6]); // ~10 degrees
        pixels.extend(vec![[255, 0, 43]; 5]); // ~350 degrees
        pixels.extend(vec![[255, 128, 0]; 2]); // ~30 degrees

        let sig = analyzer().analyze(&pixels);
        assert_eq!(sig.dominant_hue, 0);
        assert!(circular_distance(sig.secondary_hue, sig.dominant_hue) >= 15);
        assert_eq!(sig.secondary_hue, quantize_hue(rgb_to_hsv(255, 128, 0).0));
    }

    #[test]
    fn test_secondary_scans_empty_hues_when_only_near_hues() {
        // buckets 0 and 10 populated; the first ranked hue 15 degrees away is empty
        let mut pixels = vec![[255, 0, 0]; 10];
        pixels.extend(vec![[255, 43, 0]; 3]);

        let histogram = analyzer().histogram(&pixels);
        assert_eq!(histogram.populated(), 2);

        let sig = analyzer().analyze(&pixels);
        assert_eq!(sig.dominant_hue, 0);
        assert_eq!(sig.secondary_hue, 15);
    }

    #[test]
    fn test_secondary_self_fallback_single_bucket() {
        let sig = analyzer().analyze(&vec![[255, 0, 0]; 8]);
        assert_eq!(sig.secondary_hue, 0);
        assert_eq!(analyzer().histogram(&vec![[255, 0, 0]; 8]).populated(), 1);
    }

    #[test]
    fn test_tie_goes_to_lower_hue() {
        let pixels = [[0, 0, 255], [0, 255, 0]];
        let sig = analyzer().analyze(&pixels);

        assert_eq!(sig.dominant_hue, 120);
        assert_eq!(sig.secondary_hue, 240);
        assert_eq!(sig.weight, 0.5);
    }

    #[test]
    fn test_saturation_restricted_to_band() {
        // dominant pure red at full saturation, distant blue at half saturation
        let mut pixels = vec![[255, 0, 0]; 4];
        pixels.extend(vec![[128, 128, 255]; 3]);

        let sig = analyzer().analyze(&pixels);
        assert_eq!(sig.dominant_hue, 0);
        assert_eq!(sig.saturation, 1.0);
    }

    #[test]
    fn test_histogram_totals() {
        let pixels = [[255, 0, 0], [0, 0, 255], [128, 128, 128]];
        let histogram = analyzer().histogram(&pixels);

        assert_eq!(histogram.total(), 2.0);
        assert_eq!(histogram.bin(0), 1.0);
        assert_eq!(histogram.bin(240), 1.0);
        assert_eq!(histogram.bin(400), 0.0);
        assert_eq!(histogram.ranked()[0], 0);
    }

    #[test]
    fn test_custom_thresholds_keep_pale_pixels() {
        let pixels = vec![[255, 230, 230]; 8];
        assert!(analyzer().analyze(&pixels).is_zero());

        let lenient = HueAnalyzer::new(AnalyzerOptions::builder().min_saturation(0.05).build());
        let sig = lenient.analyze(&pixels);
        assert_eq!(sig.dominant_hue, 0);
        assert_eq!(sig.weight, 1.0);
    }
}
