use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT size used for the playback visualizer.
pub const DEFAULT_FFT_SIZE: usize = 128;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const SMOOTHING_TIME_CONSTANT: f32 = 0.8;

/// Frequency-domain energy analyzer for live playback audio.
///
/// Keeps the most recent `fft_size` samples in a ring, and on demand
/// computes Hanning-windowed magnitudes, exponentially smoothed across
/// calls, scaled to bytes over a fixed decibel range. One analyzer per
/// playback graph; readers only ever see the byte-scaled bins.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    ring: Vec<f32>,
    write_index: usize,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// `fft_size` must be a power of two.
    pub fn new(fft_size: usize) -> Self {
        assert!(fft_size.is_power_of_two(), "fft_size must be a power of two");

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (fft_size - 1) as f32).cos())
            })
            .collect();

        Self {
            fft,
            fft_size,
            window,
            ring: vec![0.0; fft_size],
            write_index: 0,
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Feed played-back samples into the analysis ring.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.ring[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.fft_size;
        }
    }

    /// Current per-bin energy scaled to 0..=255 over a fixed decibel range,
    /// smoothed against previous reads.
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let mut buffer: Vec<Complex<f32>> = (0..self.fft_size)
            .map(|i| {
                let sample = self.ring[(self.write_index + i) % self.fft_size];
                Complex::new(sample * self.window[i], 0.0)
            })
            .collect();
        self.fft.process(&mut buffer);

        let scale = 1.0 / self.fft_size as f32;
        buffer
            .iter()
            .take(self.frequency_bin_count())
            .zip(self.smoothed.iter_mut())
            .map(|(c, smoothed)| {
                let magnitude = c.norm() * scale;
                *smoothed = SMOOTHING_TIME_CONSTANT * *smoothed
                    + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;

                let db = 20.0 * smoothed.max(f32::MIN_POSITIVE).log10();
                let normalized = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
                (normalized.clamp(0.0, 1.0) * 255.0) as u8
            })
            .collect()
    }

    /// Clear all accumulated energy, e.g. when playback stops.
    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.smoothed.fill(0.0);
        self.write_index = 0;
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}
