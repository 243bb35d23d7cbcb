//! Fehlertypen fuer die Audio-Engine

use thiserror::Error;

/// Alle moeglichen Fehler der Audio-Engine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AudioError {
    #[error("Audio-Geraet nicht gefunden: {0}")]
    GeraetNichtGefunden(String),

    #[error("Kein Standard-Eingabegeraet verfuegbar")]
    KeinStandardEingabegeraet,

    #[error("Kein Standard-Ausgabegeraet verfuegbar")]
    KeinStandardAusgabegeraet,

    #[error("Stream-Fehler: {0}")]
    StreamFehler(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Thread-Fehler: {0}")]
    ThreadFehler(String),

    #[error("FFT-Fehler: {0}")]
    FftFehler(String),
}

impl AudioError {
    /// Gibt true zurueck wenn der Fehler die laufende Session beendet hat
    pub fn ist_sitzungsfatal(&self) -> bool {
        matches!(self, Self::StreamFehler(_) | Self::ThreadFehler(_))
    }
}

impl From<std::io::Error> for AudioError {
    fn from(e: std::io::Error) -> Self {
        Self::ThreadFehler(e.to_string())
    }
}

pub type AudioResult<T> = Result<T, AudioError>;
