//! Laufzeit-Schalter einer Session
//!
//! Werden gleichzeitig vom Controller (schreibend), vom Worker und von den
//! Hardware-Callbacks (lesend) benutzt. Alle Felder sind atomar; ein um
//! einen Frame veralteter Wert ist zulaessig, zerrissene Werte nicht.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::dsp::SuppressorPhase;
use crate::error::AudioError;

/// Atomar lesbare/schreibbare Session-Schalter und Zaehler
#[derive(Debug)]
pub struct SessionControls {
    running: AtomicBool,
    suppression_enabled: AtomicBool,
    feedback_enabled: AtomicBool,
    /// f32-Bits der Lautstaerke
    volume: AtomicU32,
    phase: AtomicU8,
    frames_processed: AtomicU64,
    underruns: AtomicU64,
    last_error: Mutex<Option<AudioError>>,
}

impl SessionControls {
    pub fn new(volume: f32, suppression_enabled: bool, feedback_enabled: bool) -> Self {
        Self {
            running: AtomicBool::new(false),
            suppression_enabled: AtomicBool::new(suppression_enabled),
            feedback_enabled: AtomicBool::new(feedback_enabled),
            volume: AtomicU32::new(clamp_volume(volume).to_bits()),
            phase: AtomicU8::new(phase_to_u8(SuppressorPhase::Learning)),
            frames_processed: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn suppression_enabled(&self) -> bool {
        self.suppression_enabled.load(Ordering::Relaxed)
    }

    pub fn set_suppression_enabled(&self, enabled: bool) {
        self.suppression_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn feedback_enabled(&self) -> bool {
        self.feedback_enabled.load(Ordering::Relaxed)
    }

    pub fn set_feedback_enabled(&self, enabled: bool) {
        self.feedback_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    /// Setzt die Lautstaerke, begrenzt auf `[0, 1]`. Gibt den gespeicherten Wert zurueck.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let v = clamp_volume(volume);
        self.volume.store(v.to_bits(), Ordering::Relaxed);
        v
    }

    pub fn phase(&self) -> SuppressorPhase {
        match self.phase.load(Ordering::Relaxed) {
            1 => SuppressorPhase::Steady,
            _ => SuppressorPhase::Learning,
        }
    }

    pub fn set_phase(&self, phase: SuppressorPhase) {
        self.phase.store(phase_to_u8(phase), Ordering::Relaxed);
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Anzahl der Playback-Callbacks ohne verarbeiteten Frame
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn record_underrun(&self) -> u64 {
        self.underruns.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn last_error(&self) -> Option<AudioError> {
        self.last_error.lock().clone()
    }

    /// Merkt sich einen sitzungsbeendenden Fehler und stoppt die Session
    pub fn fail(&self, error: AudioError) {
        *self.last_error.lock() = Some(error);
        self.set_running(false);
    }

    /// Setzt Zaehler, Phase und Fehler fuer eine neue Session zurueck
    pub fn reset_session(&self) {
        self.frames_processed.store(0, Ordering::Relaxed);
        self.underruns.store(0, Ordering::Relaxed);
        self.set_phase(SuppressorPhase::Learning);
        *self.last_error.lock() = None;
    }
}

impl Default for SessionControls {
    fn default() -> Self {
        Self::new(1.0, true, true)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

fn phase_to_u8(phase: SuppressorPhase) -> u8 {
    match phase {
        SuppressorPhase::Learning => 0,
        SuppressorPhase::Steady => 1,
    }
}
