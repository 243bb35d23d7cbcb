//! Rauschunterdrueckung via spektralem Gating
//!
//! Pro Frame: Hann-Fenster, reelle FFT, adaptive Rauschboden-Schaetzung,
//! Gain-Berechnung, Median-Glaettung und Rekonstruktion.
//!
//! Das Rauschprofil wird in zwei Phasen gelernt:
//! - **Learning**: die ersten `max_learning_frames` Frames aktualisieren
//!   Mittelwert und Standardabweichung inkrementell (bewusst um 1.5x
//!   ueberschaetzt). Nach der Aufwaermphase werden die AC-Bins
//!   (Netzbrummen) mindestens auf das Doppelte des AC-Pegels angehoben.
//! - **Steady**: das Profil driftet langsam zum verarbeiteten Spektrum,
//!   AC-Bins werden zusaetzlich gedaempft und ihr Profil kann nur steigen.
//!
//! Der Zustand gehoert exklusiv dem Aufrufer (dem Verarbeitungs-Worker);
//! es gibt keine Locks.

use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::median::MedianFilter;
use super::window;
use crate::config::{PeakNormalization, SuppressorConfig};
use crate::error::{AudioError, AudioResult};

/// Ueberschaetzung des Rauschbetrags waehrend des Lernens
const LEARNING_OVERESTIMATE: f32 = 1.5;
/// AC-Profil wird mindestens auf dieses Vielfache des AC-Pegels gehoben
const AC_LEARNING_BOOST: f32 = 2.0;
/// Skalierung des Rauschbodens in der Gain-Formel
const FLOOR_SCALE: f32 = 1.5;
/// Ueberschaetzung bei der Profil-Drift in der Steady-Phase
const STEADY_OVERESTIMATE: f32 = 1.2;
/// Anteil des AC-Betrags fuer die Ratsche in der Steady-Phase
const AC_RATCHET: f32 = 0.9;
/// Schutz gegen Division durch 0 bei stummen Bins
const MAGNITUDE_EPSILON: f32 = 1e-10;
/// Untergrenze des Fensters bei der Rueckrechnung
const WINDOW_FLOOR: f32 = 1e-2;
/// Epsilon der Spitzenwert-Normalisierung
const PEAK_EPSILON: f32 = 1e-6;

/// Phase des Rauschprofils
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressorPhase {
    /// Profil wird gelernt
    #[default]
    Learning,
    /// Profil ist gelernt und driftet nur noch langsam
    Steady,
}

/// Einmaliges Ereignis beim Uebergang Learning -> Steady
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Anzahl der Frames die bis zum Uebergang gelernt wurden
    pub learned_frames: u32,
    /// Gesamtzahl der verarbeiteten Frames inklusive dem aktuellen
    pub frame_index: u64,
}

/// Rauschprofil: Mittelwert und Standardabweichung des Betrags pro Bin
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseProfile {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl NoiseProfile {
    fn zeros(bins: usize) -> Self {
        Self {
            mean: vec![0.0; bins],
            std: vec![0.0; bins],
        }
    }

    pub fn bins(&self) -> usize {
        self.mean.len()
    }
}

/// Bins deren Mittenfrequenz im (inklusiven) AC-Band liegt
fn ac_band_bins(chunk_size: usize, sample_rate: u32, low_hz: f32, high_hz: f32) -> Vec<usize> {
    let resolution = sample_rate as f32 / chunk_size as f32;
    (0..=chunk_size / 2)
        .filter(|&k| {
            let freq = k as f32 * resolution;
            freq >= low_hz && freq <= high_hz
        })
        .collect()
}

/// Spektraler Rauschunterdruecker fuer Frames fester Laenge
pub struct NoiseSuppressor {
    config: SuppressorConfig,
    chunk_size: usize,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    fft_inverse: Arc<dyn ComplexToReal<f32>>,
    window: Vec<f32>,
    inverse_window: Vec<f32>,
    ac_bins: Vec<usize>,
    profile: NoiseProfile,
    phase: SuppressorPhase,
    learning_frames: u32,
    frames_seen: u64,
    current_energy: f32,
    median: MedianFilter,
    time_buf: Vec<f32>,
    spectrum: Vec<Complex32>,
    magnitude: Vec<f32>,
    gains: Vec<f32>,
    fft_scratch: Vec<Complex32>,
}

impl NoiseSuppressor {
    /// Erstellt einen Unterdruecker mit leerem Rauschprofil
    pub fn new(config: SuppressorConfig, sample_rate: u32, chunk_size: usize) -> AudioResult<Self> {
        config.validate()?;
        if chunk_size < 2 || chunk_size % 2 != 0 {
            return Err(AudioError::Konfiguration(format!(
                "chunk_size muss gerade und >= 2 sein, war {chunk_size}"
            )));
        }
        if sample_rate == 0 {
            return Err(AudioError::Konfiguration(
                "sample_rate muss > 0 sein".to_string(),
            ));
        }

        let bins = chunk_size / 2 + 1;
        let mut planner = RealFftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(chunk_size);
        let fft_inverse = planner.plan_fft_inverse(chunk_size);
        let scratch_len = fft_forward
            .get_scratch_len()
            .max(fft_inverse.get_scratch_len());

        let window = window::hann(chunk_size);
        let inverse_window = window::inverse(&window, WINDOW_FLOOR);
        let ac_bins = ac_band_bins(chunk_size, sample_rate, config.ac_low_hz, config.ac_high_hz);

        debug!(
            chunk_size,
            sample_rate,
            ac_bins = ac_bins.len(),
            "Rauschunterdruecker initialisiert"
        );

        Ok(Self {
            median: MedianFilter::new(config.median_width, bins),
            config,
            chunk_size,
            fft_forward,
            fft_inverse,
            window,
            inverse_window,
            ac_bins,
            profile: NoiseProfile::zeros(bins),
            phase: SuppressorPhase::Learning,
            learning_frames: 0,
            frames_seen: 0,
            current_energy: 0.0,
            time_buf: vec![0.0; chunk_size],
            spectrum: vec![Complex32::new(0.0, 0.0); bins],
            magnitude: vec![0.0; bins],
            gains: vec![0.0; bins],
            fft_scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        })
    }

    pub fn phase(&self) -> SuppressorPhase {
        self.phase
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Anzahl der verarbeiteten Frames seit Konstruktion
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Energie (mittleres Betragsquadrat) des zuletzt verarbeiteten Frames
    pub fn current_energy(&self) -> f32 {
        self.current_energy
    }

    pub fn profile(&self) -> &NoiseProfile {
        &self.profile
    }

    pub fn ac_bins(&self) -> &[usize] {
        &self.ac_bins
    }

    /// Geglaettete Gains des zuletzt verarbeiteten Frames
    pub fn gains(&self) -> &[f32] {
        &self.gains
    }

    pub fn config(&self) -> &SuppressorConfig {
        &self.config
    }

    /// Verarbeitet einen Frame in-place.
    ///
    /// Gibt genau einmal pro Lebensdauer `Some(PhaseTransition)` zurueck,
    /// naemlich fuer den Frame mit dem die Lernphase endet.
    pub fn process_frame(&mut self, samples: &mut [f32]) -> AudioResult<Option<PhaseTransition>> {
        if samples.len() != self.chunk_size {
            return Err(AudioError::Konfiguration(format!(
                "Frame-Laenge {} passt nicht zu chunk_size {}",
                samples.len(),
                self.chunk_size
            )));
        }
        self.frames_seen += 1;

        // 1. Fenster
        for ((dst, &s), &w) in self.time_buf.iter_mut().zip(samples.iter()).zip(&self.window) {
            *dst = if s.is_finite() { s * w } else { 0.0 };
        }

        // 2. Vorwaerts-FFT, Betrag
        self.fft_forward
            .process_with_scratch(&mut self.time_buf, &mut self.spectrum, &mut self.fft_scratch)
            .map_err(|e| AudioError::FftFehler(e.to_string()))?;
        for (mag, bin) in self.magnitude.iter_mut().zip(&self.spectrum) {
            *mag = bin.norm();
        }

        // 3. Energie
        let bins = self.magnitude.len() as f32;
        self.current_energy = self.magnitude.iter().map(|m| m * m).sum::<f32>() / bins;

        // 4. Lernphase
        let transition = if self.phase == SuppressorPhase::Learning {
            self.learn()
        } else {
            None
        };
        let steady = self.phase == SuppressorPhase::Steady;

        // 5./6. Rauschboden und Gain
        let threshold = self.config.noise_threshold;
        for (k, gain) in self.gains.iter_mut().enumerate() {
            let floor = self.profile.mean[k] + self.profile.std[k] * threshold;
            *gain = spectral_gain(self.magnitude[k], floor);
        }

        // 7. AC-Bins zusaetzlich daempfen
        if steady {
            let keep = 1.0 - self.config.ac_suppression_factor;
            for &k in &self.ac_bins {
                self.gains[k] = self.gains[k].min(self.gains[k] * keep);
            }
        }

        // 8. Voice-Gate
        if self.current_energy <= self.config.voice_energy_threshold {
            let g = self.config.non_voice_gain;
            for gain in self.gains.iter_mut() {
                *gain *= g;
            }
        }

        // 9. Glaettung gegen musical noise
        self.median.apply(&mut self.gains);

        // 10. Gain anwenden; Phase bleibt unveraendert
        for ((mag, bin), &gain) in self
            .magnitude
            .iter_mut()
            .zip(self.spectrum.iter_mut())
            .zip(&self.gains)
        {
            *mag *= gain;
            *bin *= gain;
        }
        if steady {
            self.drift_profile();
        }

        // 11. Rekonstruktion
        self.reconstruct(samples)?;

        Ok(transition)
    }

    /// Setzt das Rauschprofil und die Phase auf den Ausgangszustand zurueck
    pub fn reset(&mut self) {
        self.profile = NoiseProfile::zeros(self.profile.bins());
        self.phase = SuppressorPhase::Learning;
        self.learning_frames = 0;
        self.frames_seen = 0;
        self.current_energy = 0.0;
        self.gains.fill(0.0);
    }

    fn learn(&mut self) -> Option<PhaseTransition> {
        let n = self.learning_frames as f32;
        for ((mean, std), &mag) in self
            .profile
            .mean
            .iter_mut()
            .zip(self.profile.std.iter_mut())
            .zip(&self.magnitude)
        {
            let new_mean = (*mean * n + mag * LEARNING_OVERESTIMATE) / (n + 1.0);
            let dev = mag - new_mean;
            *std = ((*std * *std * n + dev * dev) / (n + 1.0)).sqrt();
            *mean = new_mean;
        }

        if self.learning_frames > self.config.ac_warmup_frames && !self.ac_bins.is_empty() {
            let ac_level = self.ac_bins.iter().map(|&k| self.magnitude[k]).sum::<f32>()
                / self.ac_bins.len() as f32;
            let boosted = ac_level * AC_LEARNING_BOOST;
            for &k in &self.ac_bins {
                self.profile.mean[k] = self.profile.mean[k].max(boosted);
            }
        }

        self.learning_frames += 1;
        if self.learning_frames < self.config.max_learning_frames {
            return None;
        }

        self.phase = SuppressorPhase::Steady;
        info!(
            frames = self.learning_frames,
            "Rauschprofil gelernt, wechsle in Steady-Phase"
        );
        Some(PhaseTransition {
            learned_frames: self.learning_frames,
            frame_index: self.frames_seen,
        })
    }

    fn drift_profile(&mut self) {
        let s = self.config.profile_smoothing;
        for (mean, &mag) in self.profile.mean.iter_mut().zip(&self.magnitude) {
            *mean = s * *mean + (1.0 - s) * mag * STEADY_OVERESTIMATE;
        }
        for &k in &self.ac_bins {
            self.profile.mean[k] = self.profile.mean[k].max(self.magnitude[k] * AC_RATCHET);
        }
    }

    fn reconstruct(&mut self, samples: &mut [f32]) -> AudioResult<()> {
        // DC und Nyquist muessen fuer die reelle Inverse rein reell sein
        if let Some(first) = self.spectrum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = self.spectrum.last_mut() {
            last.im = 0.0;
        }

        self.fft_inverse
            .process_with_scratch(&mut self.spectrum, &mut self.time_buf, &mut self.fft_scratch)
            .map_err(|e| AudioError::FftFehler(e.to_string()))?;

        let scale = 1.0 / self.chunk_size as f32;
        for ((out, &x), &inv) in samples
            .iter_mut()
            .zip(&self.time_buf)
            .zip(&self.inverse_window)
        {
            *out = x * scale * inv;
        }

        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let divisor = match self.config.peak_normalization {
            PeakNormalization::Always => peak + PEAK_EPSILON,
            PeakNormalization::Limit if peak > 1.0 => peak,
            PeakNormalization::Limit => return Ok(()),
        };
        for s in samples.iter_mut() {
            *s /= divisor;
        }
        Ok(())
    }
}

/// Normierter Ueberschuss des Betrags ueber den skalierten Rauschboden.
///
/// Liegt immer in `[0, 1)` solange `floor >= 0`.
fn spectral_gain(magnitude: f32, floor: f32) -> f32 {
    let gain = (magnitude - floor * FLOOR_SCALE) / (magnitude + MAGNITUDE_EPSILON);
    if gain.is_nan() {
        0.0
    } else {
        gain.max(0.0)
    }
}
