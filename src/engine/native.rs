//! In-process reference synthesis engine
//!
//! Implements the foreign engine surface against a local byte arena so the
//! CLI and the end-to-end tests can run the full request/copy/release
//! protocol without the separately compiled engine. Semantics match the real
//! engine's contract: mono f32 output, length `ceil(max(start + duration) *
//! fs)` samples, each segment rendered at `frequency * multiplier`, scaled
//! by `amplitude * gain * volume`, muted tracks silent, timelines summed.

use std::f64::consts::PI;

use crate::composition::{Composition, Settings, Waveform};
use crate::document::{parse_composition_json, parse_settings_json};
use crate::error::{ArithmusicError, Result};

use super::api::SynthesisEngine;

/// Spectrogram analysis window in samples (no overlap).
const SPECTROGRAM_WINDOW: usize = 256;
/// Magnitude bins kept per frame.
const SPECTROGRAM_BINS: usize = SPECTROGRAM_WINDOW / 2;

#[derive(Debug)]
struct Allocation {
    ptr: u32,
    len: u32,
    freed: bool,
}

/// Reference engine with its own linear memory.
#[derive(Debug, Default)]
pub struct NativeEngine {
    heap: Vec<u8>,
    allocations: Vec<Allocation>,
    result: (u32, u32),
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions handed out and not yet released. The bridge
    /// protocol keeps this at zero between round-trips.
    pub fn live_allocations(&self) -> usize {
        self.allocations.iter().filter(|a| !a.freed).count()
    }

    fn store_result(&mut self, samples: &[f32]) {
        let ptr = self.heap.len() as u32;
        let len = samples.len() as u32;
        self.heap
            .extend(samples.iter().flat_map(|s| s.to_le_bytes()));
        self.allocations.push(Allocation {
            ptr,
            len,
            freed: false,
        });
        self.result = (ptr, len);
    }

    fn parse_request(composition: &str, settings: &str) -> Result<(Composition, Settings)> {
        let composition = parse_composition_json(composition)?;
        let settings = parse_settings_json(settings)?;
        Ok((composition, settings))
    }

    fn render_waveform(composition: &Composition, settings: &Settings) -> Result<Vec<f32>> {
        let fs = settings.fs;
        if !fs.is_finite() || fs <= 0.0 {
            return Err(ArithmusicError::Engine {
                reason: format!("unusable sample rate {fs}"),
            });
        }

        let total_end = composition
            .timelines
            .iter()
            .flat_map(|tl| tl.segments.iter())
            .map(|seg| seg.end())
            .fold(0.0f64, f64::max);
        let n = (total_end * fs).ceil() as usize;
        if n == 0 {
            return Err(ArithmusicError::Engine {
                reason: "nothing to synthesize".to_string(),
            });
        }

        let nyquist = fs / 2.0;
        let mut mix = vec![0.0f64; n];
        for timeline in &composition.timelines {
            if timeline.options.mute {
                continue;
            }
            let gain = timeline.options.gain;
            for seg in &timeline.segments {
                let freq = seg.frequency * settings.multiplier;
                let first = (seg.start * fs).round().max(0.0) as usize;
                let last = ((seg.end() * fs).round() as usize).min(n);
                for (i, slot) in mix.iter_mut().enumerate().take(last).skip(first) {
                    let t = i as f64 / fs;
                    *slot +=
                        gain * seg.amplitude * oscillate(seg.waveform, freq, t, nyquist, settings.aliasing);
                }
            }
        }

        Ok(mix
            .into_iter()
            .map(|s| (s * settings.volume).clamp(-1.0, 1.0) as f32)
            .collect())
    }

    fn render_spectrogram(composition: &Composition, settings: &Settings) -> Result<Vec<f32>> {
        let samples = Self::render_waveform(composition, settings)?;
        let frames = samples.len() / SPECTROGRAM_WINDOW;
        if frames == 0 {
            return Err(ArithmusicError::Engine {
                reason: "composition shorter than one analysis window".to_string(),
            });
        }

        let mut out = Vec::with_capacity(frames * SPECTROGRAM_BINS);
        for frame in samples.chunks_exact(SPECTROGRAM_WINDOW) {
            for bin in 0..SPECTROGRAM_BINS {
                let mut re = 0.0f64;
                let mut im = 0.0f64;
                for (i, &s) in frame.iter().enumerate() {
                    let angle = -2.0 * PI * bin as f64 * i as f64 / SPECTROGRAM_WINDOW as f64;
                    re += s as f64 * angle.cos();
                    im += s as f64 * angle.sin();
                }
                out.push(((re * re + im * im).sqrt() / SPECTROGRAM_WINDOW as f64) as f32);
            }
        }
        Ok(out)
    }
}

/// One oscillator sample. With `aliasing` set, closed-form naive waveforms;
/// otherwise additive synthesis truncated at the Nyquist frequency.
fn oscillate(waveform: Waveform, freq: f64, t: f64, nyquist: f64, aliasing: bool) -> f64 {
    let phase = 2.0 * PI * freq * t;
    match waveform {
        Waveform::Sine => phase.sin(),
        Waveform::Square => {
            if aliasing {
                if (freq * t).fract() < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            } else {
                let mut sum = 0.0;
                let mut k = 1.0;
                while k * freq < nyquist {
                    sum += (phase * k).sin() / k;
                    k += 2.0;
                }
                sum * 4.0 / PI
            }
        }
        Waveform::Sawtooth => {
            if aliasing {
                2.0 * (freq * t).fract() - 1.0
            } else {
                let mut sum = 0.0;
                let mut k = 1.0;
                let mut sign = 1.0;
                while k * freq < nyquist {
                    sum += sign * (phase * k).sin() / k;
                    sign = -sign;
                    k += 1.0;
                }
                sum * 2.0 / PI
            }
        }
        Waveform::Triangle => {
            if aliasing {
                4.0 * ((freq * t).fract() - 0.5).abs() - 1.0
            } else {
                let mut sum = 0.0;
                let mut k = 1.0;
                let mut sign = 1.0;
                while k * freq < nyquist {
                    sum += sign * (phase * k).sin() / (k * k);
                    sign = -sign;
                    k += 2.0;
                }
                sum * 8.0 / (PI * PI)
            }
        }
    }
}

impl SynthesisEngine for NativeEngine {
    fn synthesize_composition(&mut self, composition: &str, settings: &str) -> Result<()> {
        let (composition, settings) = Self::parse_request(composition, settings)?;
        let samples = Self::render_waveform(&composition, &settings)?;
        self.store_result(&samples);
        Ok(())
    }

    fn synthesize_spectrogram(&mut self, composition: &str, settings: &str) -> Result<()> {
        let (composition, settings) = Self::parse_request(composition, settings)?;
        let samples = Self::render_spectrogram(&composition, &settings)?;
        self.store_result(&samples);
        Ok(())
    }

    fn audio_buffer_ptr(&self) -> u32 {
        self.result.0
    }

    fn audio_buffer_len(&self) -> u32 {
        self.result.1
    }

    fn heap_memory(&self) -> &[u8] {
        &self.heap
    }

    fn dealloc(&mut self, ptr: u32, len: u32) {
        let allocation = self
            .allocations
            .iter_mut()
            .find(|a| a.ptr == ptr && a.len == len);
        match allocation {
            Some(a) if !a.freed => a.freed = true,
            Some(_) => debug_assert!(false, "double free of region ptr={ptr} len={len}"),
            None => debug_assert!(false, "dealloc of unknown region ptr={ptr} len={len}"),
        }
    }
}
