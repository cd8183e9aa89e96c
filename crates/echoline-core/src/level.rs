//! Per-frame level metering.
//!
//! The level of a frame is its RMS energy in decibels relative to full scale:
//!
//! ```text
//! level = 10 · log10(mean(sample²))
//! ```
//!
//! A full-scale square wave reads 0 dB. Silence would read negative infinity,
//! so the result is floored at [`MIN_LEVEL_DB`].

/// Lowest level ever reported, in dB. Silent frames read exactly this value.
pub const MIN_LEVEL_DB: f64 = -120.0;

/// RMS energy of `samples` in dB, floored at [`MIN_LEVEL_DB`].
///
/// An empty slice reads [`MIN_LEVEL_DB`].
///
/// # Example
///
/// ```rust
/// use echoline_core::{MIN_LEVEL_DB, rms_db};
///
/// assert_eq!(rms_db(&[0.0; 16]), MIN_LEVEL_DB);
/// assert!(rms_db(&[1.0, -1.0]).abs() < 1e-12);
/// ```
pub fn rms_db(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return MIN_LEVEL_DB;
    }
    let energy: f64 = samples.iter().map(|s| s * s).sum();
    let mean = energy / samples.len() as f64;
    if mean <= 0.0 || mean.is_nan() {
        return MIN_LEVEL_DB;
    }
    (10.0 * libm::log10(mean)).max(MIN_LEVEL_DB)
}
