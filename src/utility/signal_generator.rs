// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Synthetic signal generator
//!
//! This module provides a lightweight, seeded generator for synthetic
//! seismic-like test signals. It is used for:
//!
//! - Exercising the STA/LTA detector against a known background noise level
//! - Building channel segments with controlled gaps and spikes
//! - The `synthesize_segment` tool
//!
//! ## Features
//!
//! * Fast XORShift pseudo-random number generation (reproducible from a seed)
//! * Box-Muller transform for Gaussian background noise
//! * Decaying sinusoidal bursts that mimic an impulsive seismic onset
//! * Three-point step discontinuities that the spike masker is built to find
//!
//! ## Examples
//!
//! ```rust
//! use rust_seismic_qc::utility::signal_generator::SignalGenerator;
//!
//! let mut generator = SignalGenerator::new(42);
//!
//! // 60 s of background noise at 40 Hz
//! let mut samples = generator.gaussian_noise(2400, 0.1);
//!
//! // An onset 40 s in
//! SignalGenerator::add_onset(&mut samples, 1600, 40.0, 5.0, 2.0, 3.0);
//! assert_eq!(samples.len(), 2400);
//! ```

use std::time::SystemTime;

/// Seed used when a zero seed is supplied; XORShift never leaves the zero state.
const FALLBACK_SEED: u32 = 0x9E37_79B9;

/// Random signal generator using the XORShift algorithm.
///
/// Not suitable for cryptographic purposes. The same seed always produces the
/// same sequence, which is what the tests rely on.
pub struct SignalGenerator {
    /// Internal state of the XORShift random number generator.
    rng_state: u32,
}

impl SignalGenerator {
    /// Creates a new generator with a given seed.
    pub fn new(seed: u32) -> Self {
        let rng_state = if seed == 0 { FALLBACK_SEED } else { seed };
        Self { rng_state }
    }

    /// Creates a new generator seeded from the system time.
    pub fn new_from_system_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u32)
            .unwrap_or(FALLBACK_SEED);
        Self::new(seed)
    }

    /// Generates a random number in the range [-1.0, 1.0].
    pub fn random_float(&mut self) -> f64 {
        // XOR Shift algorithm for pseudo-random numbers
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;

        (self.rng_state as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    /// Generates a value from a standard Gaussian distribution.
    ///
    /// Uses the Box-Muller transform:
    /// ```text
    /// z = sqrt(-2 * ln(u1)) * cos(2 * π * u2)
    /// ```
    /// with u1 and u2 uniform in (0,1).
    pub fn random_gaussian(&mut self) -> f64 {
        let u1 = (self.random_float() + 1.0) / 2.0;
        let u2 = (self.random_float() + 1.0) / 2.0;

        // Avoid ln(0)
        let u1 = u1.max(1e-4);

        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Generates `num_samples` of zero-mean Gaussian noise with standard deviation `amplitude`.
    pub fn gaussian_noise(&mut self, num_samples: usize, amplitude: f64) -> Vec<f64> {
        (0..num_samples)
            .map(|_| self.random_gaussian() * amplitude)
            .collect()
    }

    /// Adds an exponentially decaying sinusoidal burst starting at `start_index`.
    ///
    /// # Arguments
    ///
    /// * `samples` - Signal to modify in place
    /// * `start_index` - First sample of the burst; out-of-range values leave the signal untouched
    /// * `sample_rate` - Sample rate of `samples` in Hz
    /// * `amplitude` - Peak amplitude of the burst
    /// * `frequency_hz` - Dominant frequency of the burst
    /// * `decay_seconds` - e-folding time of the burst envelope
    pub fn add_onset(
        samples: &mut [f64],
        start_index: usize,
        sample_rate: f64,
        amplitude: f64,
        frequency_hz: f64,
        decay_seconds: f64,
    ) {
        if start_index >= samples.len() {
            return;
        }
        for (offset, sample) in samples[start_index..].iter_mut().enumerate() {
            let t = offset as f64 / sample_rate;
            let envelope = amplitude * (-t / decay_seconds).exp();
            *sample += envelope * (2.0 * std::f64::consts::PI * frequency_hz * t).sin();
        }
    }

    /// Shifts `width` samples starting at `start_index` by `offset`, producing an
    /// abrupt step up and back down.
    pub fn add_step_spike(samples: &mut [f64], start_index: usize, width: usize, offset: f64) {
        let end = (start_index + width).min(samples.len());
        if start_index >= end {
            return;
        }
        for sample in &mut samples[start_index..end] {
            *sample += offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SignalGenerator::new(7);
        let mut b = SignalGenerator::new(7);
        assert_eq!(a.gaussian_noise(32, 1.0), b.gaussian_noise(32, 1.0));
    }

    #[test]
    fn test_zero_seed_still_produces_noise() {
        let mut generator = SignalGenerator::new(0);
        let noise = generator.gaussian_noise(16, 1.0);
        assert!(noise.iter().any(|v| *v != 0.0));
    }

    #[test]
    fn test_random_float_range() {
        let mut generator = SignalGenerator::new(12345);
        for _ in 0..1000 {
            let v = generator.random_float();
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_noise_statistics() {
        let mut generator = SignalGenerator::new(2024);
        let noise = generator.gaussian_noise(20_000, 0.5);
        let mean = noise.iter().sum::<f64>() / noise.len() as f64;
        let variance = noise.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / noise.len() as f64;
        assert!(mean.abs() < 0.05, "mean too far from zero: {}", mean);
        assert!((variance.sqrt() - 0.5).abs() < 0.1, "unexpected std dev: {}", variance.sqrt());
    }

    #[test]
    fn test_onset_and_spike_placement() {
        let mut samples = vec![0.0; 100];
        SignalGenerator::add_onset(&mut samples, 50, 20.0, 1.0, 2.0, 1.0);
        assert!(samples[..50].iter().all(|v| *v == 0.0));
        assert!(samples[51..].iter().any(|v| *v != 0.0));

        let mut flat = vec![1.0; 10];
        SignalGenerator::add_step_spike(&mut flat, 8, 5, 3.0);
        assert_eq!(flat[7], 1.0);
        assert_eq!(flat[8], 4.0);
        assert_eq!(flat[9], 4.0);
    }
}
