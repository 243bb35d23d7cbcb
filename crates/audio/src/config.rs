//! Konfiguration fuer Rauschunterdrueckung und Session
//!
//! Alle Felder haben Standardwerte, sodass eine leere TOML-Tabelle
//! eine lauffaehige Konfiguration ergibt.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AudioError, AudioResult};

/// Verhalten der Spitzenwert-Normalisierung nach der Rekonstruktion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakNormalization {
    /// Nur herunterskalieren wenn der Spitzenwert 1.0 uebersteigt
    #[default]
    Limit,
    /// Immer durch (Spitzenwert + Epsilon) teilen
    Always,
}

/// Parameter des spektralen Rauschunterdrueckers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressorConfig {
    /// Multiplikator der Standardabweichung im Rauschboden
    pub noise_threshold: f32,
    /// Frame-Energie unterhalb dieses Werts gilt als Nicht-Sprache
    pub voice_energy_threshold: f32,
    /// Glaettungsfaktor fuer das Rauschprofil in der Steady-Phase
    pub profile_smoothing: f32,
    /// Untere Grenze des AC-Bands in Hz
    pub ac_low_hz: f32,
    /// Obere Grenze des AC-Bands in Hz (inklusive)
    pub ac_high_hz: f32,
    /// Zusaetzliche Daempfung der AC-Bins (0.0..1.0)
    pub ac_suppression_factor: f32,
    /// Anzahl der Lern-Frames bis zur Steady-Phase
    pub max_learning_frames: u32,
    /// Lern-Frames bevor das AC-Profil angehoben wird
    pub ac_warmup_frames: u32,
    /// Breite des Median-Filters ueber die Bins (ungerade)
    pub median_width: usize,
    /// Gain-Faktor fuer Frames ohne Sprache
    pub non_voice_gain: f32,
    pub peak_normalization: PeakNormalization,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            noise_threshold: 0.35,
            voice_energy_threshold: 0.25,
            profile_smoothing: 0.99,
            ac_low_hz: 30.0,
            ac_high_hz: 300.0,
            ac_suppression_factor: 0.98,
            max_learning_frames: 300,
            ac_warmup_frames: 50,
            median_width: 7,
            non_voice_gain: 0.05,
            peak_normalization: PeakNormalization::Limit,
        }
    }
}

impl SuppressorConfig {
    /// Prueft alle Parameter auf gueltige Wertebereiche
    pub fn validate(&self) -> AudioResult<()> {
        let unit = |name: &str, v: f32| -> AudioResult<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(AudioError::Konfiguration(format!(
                    "{name} muss in [0, 1] liegen, war {v}"
                )))
            }
        };
        unit("profile_smoothing", self.profile_smoothing)?;
        unit("ac_suppression_factor", self.ac_suppression_factor)?;
        unit("non_voice_gain", self.non_voice_gain)?;

        if !(self.noise_threshold >= 0.0) || !(self.voice_energy_threshold >= 0.0) {
            return Err(AudioError::Konfiguration(
                "Schwellenwerte duerfen nicht negativ sein".to_string(),
            ));
        }
        if !(self.ac_low_hz >= 0.0 && self.ac_low_hz <= self.ac_high_hz) {
            return Err(AudioError::Konfiguration(format!(
                "Ungueltiges AC-Band: {}..{} Hz",
                self.ac_low_hz, self.ac_high_hz
            )));
        }
        if self.median_width == 0 || self.median_width % 2 == 0 {
            return Err(AudioError::Konfiguration(format!(
                "median_width muss ungerade sein, war {}",
                self.median_width
            )));
        }
        if self.max_learning_frames == 0 {
            return Err(AudioError::Konfiguration(
                "max_learning_frames muss > 0 sein".to_string(),
            ));
        }
        Ok(())
    }
}

/// Vollstaendige Konfiguration einer Verarbeitungs-Session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Gewuenschte Kanalanzahl (wird auf die Geraetefaehigkeit begrenzt)
    pub channels: u16,
    /// Frame-Laenge in Samples
    pub chunk_size: usize,
    /// Name des Eingabegeraets (None = Standard)
    pub input_device: Option<String>,
    /// Name des Ausgabegeraets (None = Standard)
    pub output_device: Option<String>,
    /// Start-Lautstaerke (0.0..1.0)
    pub volume: f32,
    pub suppression_enabled: bool,
    pub feedback_enabled: bool,
    /// Kapazitaet jeder Frame-Queue in Frames
    pub queue_capacity: usize,
    /// Timeout des Workers beim Warten auf einen Frame
    pub pop_timeout_ms: u64,
    /// Abfrageintervall des Stream-Treibers
    pub poll_interval_ms: u64,
    pub suppressor: SuppressorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            chunk_size: 1024,
            input_device: None,
            output_device: None,
            volume: 1.0,
            suppression_enabled: true,
            feedback_enabled: true,
            queue_capacity: 32,
            pop_timeout_ms: 100,
            poll_interval_ms: 100,
            suppressor: SuppressorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Kleinste unterstuetzte Frame-Laenge
    pub const MIN_CHUNK_SIZE: usize = 64;

    pub fn pop_timeout(&self) -> Duration {
        Duration::from_millis(self.pop_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Anzahl der Frequenz-Bins pro Frame
    pub fn bins(&self) -> usize {
        self.chunk_size / 2 + 1
    }

    /// Prueft Session- und Suppressor-Parameter
    pub fn validate(&self) -> AudioResult<()> {
        if self.sample_rate == 0 {
            return Err(AudioError::Konfiguration(
                "sample_rate muss > 0 sein".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(AudioError::Konfiguration(
                "channels muss >= 1 sein".to_string(),
            ));
        }
        if self.chunk_size < Self::MIN_CHUNK_SIZE || !self.chunk_size.is_power_of_two() {
            return Err(AudioError::Konfiguration(format!(
                "chunk_size muss eine Zweierpotenz >= {} sein, war {}",
                Self::MIN_CHUNK_SIZE,
                self.chunk_size
            )));
        }
        if self.queue_capacity == 0 {
            return Err(AudioError::Konfiguration(
                "queue_capacity muss >= 1 sein".to_string(),
            ));
        }
        if self.pop_timeout_ms == 0 || self.poll_interval_ms == 0 {
            return Err(AudioError::Konfiguration(
                "pop_timeout_ms und poll_interval_ms muessen >= 1 sein".to_string(),
            ));
        }
        self.suppressor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = SessionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sample_rate, 44100);
        assert_eq!(cfg.chunk_size, 1024);
        assert_eq!(cfg.bins(), 513);
        assert_eq!(cfg.suppressor.max_learning_frames, 300);
        assert_eq!(cfg.suppressor.median_width, 7);
        assert_eq!(cfg.suppressor.peak_normalization, PeakNormalization::Limit);
    }

    #[test]
    fn gerade_median_breite_abgelehnt() {
        let cfg = SuppressorConfig {
            median_width: 6,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AudioError::Konfiguration(_))));
    }

    #[test]
    fn ac_faktor_ausserhalb_abgelehnt() {
        let cfg = SuppressorConfig {
            ac_suppression_factor: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn chunk_size_keine_zweierpotenz_abgelehnt() {
        let cfg = SessionConfig {
            chunk_size: 1000,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn vertauschtes_ac_band_abgelehnt() {
        let cfg = SuppressorConfig {
            ac_low_hz: 400.0,
            ac_high_hz: 300.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            chunk_size = 512
            input_device = "USB Mic"

            [suppressor]
            median_width = 5
            peak_normalization = "always"
        "#;
        let cfg: SessionConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.chunk_size, 512);
        assert_eq!(cfg.input_device.as_deref(), Some("USB Mic"));
        assert_eq!(cfg.suppressor.median_width, 5);
        assert_eq!(cfg.suppressor.peak_normalization, PeakNormalization::Always);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.sample_rate, 44100);
        assert!((cfg.suppressor.noise_threshold - 0.35).abs() < f32::EPSILON);
    }
}
