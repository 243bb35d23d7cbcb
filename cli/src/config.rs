//! Konfiguration der Kommandozeile
//!
//! Wird aus einer TOML-Datei geladen. Fehlt die Datei, gelten die
//! Standardwerte.

use serde::{Deserialize, Serialize};
use silentium_audio::SessionConfig;

/// Gesamtkonfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Audio-Session (Geraete, Frame-Laenge, Unterdruecker)
    pub session: SessionConfig,
    pub logging: LoggingEinstellungen,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter-Direktive, z.B. "info" oder "info,silentium_audio=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
    /// Abstand der Status-Logs in Sekunden (0 = aus)
    pub status_intervall_sek: u64,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            status_intervall_sek: 5,
        }
    }
}

impl AppConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// Gibt Standardwerte zurueck falls die Datei nicht existiert; der
    /// zweite Wert sagt, ob die Datei gefunden wurde. Das Logging ist zu
    /// diesem Zeitpunkt noch nicht initialisiert, gemeldet wird im Aufrufer.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, bool)> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map(|config| (config, true))
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((Self::default(), false)),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Parst und validiert eine TOML-Konfiguration
    pub fn aus_toml(inhalt: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(inhalt)?;
        config.session.validate()?;
        if !silentium_observability::logging::log_filter_gueltig(&config.logging.level) {
            anyhow::bail!("Ungueltige Log-Direktive: {}", config.logging.level);
        }
        if !silentium_observability::logging::log_format_gueltig(&config.logging.format) {
            anyhow::bail!("Unbekanntes Log-Format: {}", config.logging.format);
        }
        Ok(config)
    }
}
