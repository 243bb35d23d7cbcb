//! Silentium – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet die Session.

use anyhow::Result;
use clap::Parser;
use silentium_audio::{AudioHost, CpalHost};
use silentium_cli::{config::AppConfig, geraete_auflisten, session_betreiben, Args};
use silentium_observability::logging_initialisieren;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let (mut config, datei_gefunden) = AppConfig::laden(&args.config)?;
    args.anwenden(&mut config);

    logging_initialisieren(&config.logging.level, &config.logging.format);
    if !datei_gefunden {
        tracing::warn!(
            pfad = %args.config,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config,
        "Silentium wird initialisiert"
    );

    let host: Arc<dyn AudioHost> = Arc::new(CpalHost::new());
    if args.list_devices {
        return geraete_auflisten(host.as_ref(), args.json);
    }

    session_betreiben(host, config).await
}
