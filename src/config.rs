//! Heuristic constants used by the profiler and adaptive codecs.
//!
//! These are product decisions, not universal truths (see design notes), but
//! they must stay fixed for byte-for-byte reproducibility among encoders
//! claiming the same heuristic. Collected here so the "default profile" has
//! one documented answer instead of scattered magic numbers.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorOptions {
    /// Maximum distinct-value count for a string column to be tagged `ENUM`.
    pub enum_max_distinct: usize,
    /// Minimum ratio of unique-to-total strings for the adaptive string
    /// codec to fall back to raw mode instead of a dictionary.
    pub string_dictionary_ratio: f64,
    /// Largest decimal scale (as a power of ten exponent) the number codec
    /// will search before falling back to float mode.
    pub decimal_max_scale: u8,
    /// Absolute tolerance used when checking whether `v * 10^s` is
    /// (numerically) an integer.
    pub decimal_tolerance: f64,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            enum_max_distinct: 8,
            string_dictionary_ratio: 0.7,
            decimal_max_scale: 6,
            decimal_tolerance: 1e-9,
        }
    }
}
