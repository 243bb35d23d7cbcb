//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (hat Vorrang vor der Konfigurationsdatei):
//! - `SILENTIUM_LOG_LEVEL`: Filter-Direktive (z.B. `debug` oder
//!   `info,silentium_audio=trace`), Standard: info
//! - `SILENTIUM_LOG_FORMAT`: Format (text/json), Standard: text

use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "SILENTIUM_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SILENTIUM_LOG_FORMAT";

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unbekanntes Log-Format: {other}")),
        }
    }
}

/// Initialisiert das Logging-System.
///
/// `SILENTIUM_LOG_LEVEL` und `SILENTIUM_LOG_FORMAT` ueberschreiben die
/// uebergebenen Werte. Gibt `false` zurueck, wenn bereits ein globaler
/// Subscriber gesetzt war.
pub fn logging_initialisieren(level: &str, format: &str) -> bool {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| format.to_string());

    match format_env.parse().unwrap_or_default() {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .with_current_span(true)
            .try_init()
            .is_ok(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .try_init()
            .is_ok(),
    }
}

/// Validiert ob eine Filter-Direktive von `EnvFilter` akzeptiert wird.
pub fn log_filter_gueltig(level: &str) -> bool {
    EnvFilter::try_new(level).is_ok()
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}
