//! Silentium Kommandozeile
//!
//! Listet Audio-Geraete auf oder betreibt eine Session bis Ctrl-C.

pub mod config;

use anyhow::{Context, Result};
use clap::Parser;
use silentium_audio::{AudioHost, SessionController};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Echtzeit-Rauschunterdrueckung mit Mithoeren
#[derive(Parser, Debug, Clone)]
#[command(name = "silentium", version, about)]
pub struct Args {
    /// Pfad zur TOML-Konfiguration
    #[arg(long, env = "SILENTIUM_CONFIG", default_value = "silentium.toml")]
    pub config: String,

    /// Geraete auflisten und beenden
    #[arg(long)]
    pub list_devices: bool,

    /// Geraeteliste als JSON ausgeben
    #[arg(long, requires = "list_devices")]
    pub json: bool,

    /// Eingabegeraet (exakter Name)
    #[arg(long)]
    pub input: Option<String>,

    /// Ausgabegeraet (exakter Name)
    #[arg(long)]
    pub output: Option<String>,

    /// Lautstaerke 0.0..1.0
    #[arg(long)]
    pub volume: Option<f32>,

    /// Rauschunterdrueckung abschalten (reines Durchreichen)
    #[arg(long)]
    pub no_suppression: bool,

    /// Mithoeren abschalten
    #[arg(long)]
    pub no_feedback: bool,
}

impl Args {
    /// Uebertraegt die Kommandozeilen-Overrides in die Konfiguration
    pub fn anwenden(&self, config: &mut AppConfig) {
        if let Some(input) = &self.input {
            config.session.input_device = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.session.output_device = Some(output.clone());
        }
        if let Some(volume) = self.volume {
            config.session.volume = volume;
        }
        if self.no_suppression {
            config.session.suppression_enabled = false;
        }
        if self.no_feedback {
            config.session.feedback_enabled = false;
        }
    }
}

/// Gibt alle Geraete aus
pub fn geraete_auflisten(host: &dyn AudioHost, json: bool) -> Result<()> {
    let devices = host.devices().context("Geraete konnten nicht gelesen werden")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }
    for device in &devices {
        println!(
            "{:<48} ein: {:>2}  aus: {:>2}",
            device.name, device.max_input_channels, device.max_output_channels
        );
    }
    Ok(())
}

/// Betreibt eine Session bis Ctrl-C oder bis ein Stream-Fehler sie beendet
pub async fn session_betreiben(host: Arc<dyn AudioHost>, config: AppConfig) -> Result<()> {
    let controller = Arc::new(SessionController::new(host, config.session));

    let c = Arc::clone(&controller);
    tokio::task::spawn_blocking(move || c.start())
        .await?
        .context("Session konnte nicht gestartet werden")?;

    let intervall = Duration::from_secs(config.logging.status_intervall_sek.max(1));
    let mut status_tick = tokio::time::interval(intervall);
    status_tick.tick().await;
    let status_logs = config.logging.status_intervall_sek > 0;

    let ergebnis = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Ctrl-C Handler konnte nicht registriert werden")?;
                info!("Ctrl-C empfangen, beende Session");
                break Ok(());
            }
            _ = status_tick.tick() => {
                let status = controller.status();
                if !status.running {
                    break match status.last_error {
                        Some(e) => Err(anyhow::Error::new(e).context("Session abgebrochen")),
                        None => Ok(()),
                    };
                }
                if status_logs {
                    info!(
                        phase = ?status.phase,
                        frames = status.frames_processed,
                        verworfen = status.frames_dropped,
                        underruns = status.underruns,
                        "Status"
                    );
                }
            }
        }
    };

    let c = Arc::clone(&controller);
    if let Err(e) = tokio::task::spawn_blocking(move || c.stop()).await {
        warn!("Session konnte nicht sauber gestoppt werden: {}", e);
    }
    ergebnis
}
