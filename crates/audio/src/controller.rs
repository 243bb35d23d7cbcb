//! Session-Controller
//!
//! Oeffentliche Steuerflaeche fuer UI und CLI: Geraete auflisten und
//! auswaehlen, Session starten/stoppen, Schalter umlegen, Status abfragen.
//! Alle Methoden nehmen `&self`; der Controller kann hinter einem `Arc`
//! von mehreren Threads benutzt werden. `start()` und `stop()` laufen
//! unter demselben Session-Lock vollstaendig nacheinander ab, weil alle
//! Sessions dasselbe Running-Flag teilen.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::bridge::bridge_pair;
use crate::config::SessionConfig;
use crate::controls::SessionControls;
use crate::device::{find_input, find_output, DeviceInfo};
use crate::driver::StreamDriver;
use crate::dsp::{NoiseSuppressor, SuppressorPhase};
use crate::error::{AudioError, AudioResult};
use crate::host::{AudioHost, StreamRequest};
use crate::queue::FramePair;
use crate::worker::ProcessingWorker;

/// Aufgeloeste Geraeteauswahl mit begrenzten Kanalzahlen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedDevices {
    pub input: DeviceInfo,
    pub output: DeviceInfo,
    pub input_channels: u16,
    pub output_channels: u16,
}

impl SelectedDevices {
    /// Begrenzt die gewuenschte Kanalzahl auf die Faehigkeit beider Geraete
    pub fn resolve(input: DeviceInfo, output: DeviceInfo, channels: u16) -> Self {
        let channels = channels
            .min(input.max_input_channels)
            .min(output.max_output_channels)
            .max(1);
        Self {
            input,
            output,
            input_channels: channels,
            output_channels: channels,
        }
    }
}

/// Momentaufnahme einer Session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub running: bool,
    pub phase: SuppressorPhase,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub underruns: u64,
    #[serde(serialize_with = "serialize_error")]
    pub last_error: Option<AudioError>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<AudioError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

struct ActiveSession {
    worker: ProcessingWorker,
    driver: StreamDriver,
}

/// Steuert genau eine Verarbeitungs-Session
pub struct SessionController {
    host: Arc<dyn AudioHost>,
    config: SessionConfig,
    controls: Arc<SessionControls>,
    selected: Mutex<Option<SelectedDevices>>,
    session: Mutex<Option<ActiveSession>>,
    /// Queues der letzten Session, fuer Drop-Zaehler im Status
    queues: Mutex<Option<FramePair>>,
}

impl SessionController {
    pub fn new(host: Arc<dyn AudioHost>, config: SessionConfig) -> Self {
        let controls = Arc::new(SessionControls::new(
            config.volume,
            config.suppression_enabled,
            config.feedback_enabled,
        ));
        Self {
            host,
            config,
            controls,
            selected: Mutex::new(None),
            session: Mutex::new(None),
            queues: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn list_devices(&self) -> AudioResult<Vec<DeviceInfo>> {
        self.host.devices()
    }

    /// Waehlt Ein- und Ausgabegeraet per exaktem Namen.
    ///
    /// Bei einem unbekannten Namen bleibt die bisherige Auswahl unveraendert.
    /// Eine laufende Session benutzt die neue Auswahl erst nach einem Neustart.
    pub fn select_devices(&self, input: &str, output: &str) -> AudioResult<SelectedDevices> {
        let devices = self.host.devices()?;
        let input = find_input(&devices, input)?.clone();
        let output = find_output(&devices, output)?.clone();

        let selected = SelectedDevices::resolve(input, output, self.config.channels);
        info!(
            eingabe = %selected.input.name,
            ausgabe = %selected.output.name,
            kanaele = selected.input_channels,
            "Geraete ausgewaehlt"
        );
        *self.selected.lock() = Some(selected.clone());
        Ok(selected)
    }

    pub fn selected_devices(&self) -> Option<SelectedDevices> {
        self.selected.lock().clone()
    }

    /// Startet die Session. Laeuft bereits eine, passiert nichts.
    pub fn start(&self) -> AudioResult<()> {
        let mut session = self.session.lock();
        if session.is_some() {
            if self.controls.is_running() {
                return Ok(());
            }
            // Durch Stream-Fehler beendete Session zuerst abraeumen
            if let Some(old) = session.take() {
                reap(old);
            }
        }

        self.config.validate()?;
        let devices = self.resolve_devices()?;
        let suppressor = NoiseSuppressor::new(
            self.config.suppressor.clone(),
            self.config.sample_rate,
            self.config.chunk_size,
        )?;

        let queues = FramePair::new(self.config.queue_capacity);
        self.controls.reset_session();

        let worker = ProcessingWorker::spawn(
            queues.clone(),
            Arc::clone(&self.controls),
            suppressor,
            self.config.pop_timeout(),
        )?;

        let (capture, playback) = bridge_pair(
            &queues,
            &self.controls,
            self.config.chunk_size,
            devices.input_channels,
            devices.output_channels,
        );
        let request = StreamRequest {
            input_device: devices.input.name.clone(),
            output_device: devices.output.name.clone(),
            sample_rate: self.config.sample_rate,
            input_channels: devices.input_channels,
            output_channels: devices.output_channels,
            chunk_size: self.config.chunk_size,
        };

        let driver = match StreamDriver::spawn(
            Arc::clone(&self.host),
            request,
            capture,
            playback,
            Arc::clone(&self.controls),
            self.config.poll_interval(),
        ) {
            Ok(driver) => driver,
            Err(e) => {
                worker.stop();
                self.controls.fail(e.clone());
                return Err(e);
            }
        };

        info!(
            eingabe = %devices.input.name,
            ausgabe = %devices.output.name,
            abtastrate = self.config.sample_rate,
            frame = self.config.chunk_size,
            "Session gestartet"
        );
        *self.queues.lock() = Some(queues);
        *session = Some(ActiveSession { worker, driver });
        Ok(())
    }

    /// Stoppt die Session und wartet auf beide Threads. Idempotent.
    ///
    /// Der Session-Lock bleibt bis nach dem Join gehalten; ein paralleles
    /// `start()` beginnt erst, wenn die alten Threads beendet sind.
    pub fn stop(&self) {
        let mut session = self.session.lock();
        let Some(active) = session.take() else {
            return;
        };
        let fehler = self.controls.last_error();
        reap(active);
        drop(session);
        match fehler {
            Some(e) => info!("Session gestoppt nach Fehler: {}", e),
            None => info!(
                frames = self.controls.frames_processed(),
                "Session gestoppt"
            ),
        }
    }

    pub fn is_running(&self) -> bool {
        self.controls.is_running() && self.session.lock().is_some()
    }

    pub fn set_suppression_enabled(&self, enabled: bool) {
        self.controls.set_suppression_enabled(enabled);
        info!(aktiv = enabled, "Rauschunterdrueckung umgeschaltet");
    }

    pub fn suppression_enabled(&self) -> bool {
        self.controls.suppression_enabled()
    }

    pub fn set_feedback_enabled(&self, enabled: bool) {
        self.controls.set_feedback_enabled(enabled);
        info!(aktiv = enabled, "Mithoeren umgeschaltet");
    }

    pub fn feedback_enabled(&self) -> bool {
        self.controls.feedback_enabled()
    }

    /// Setzt die Lautstaerke, begrenzt auf `[0, 1]`. Gibt den gespeicherten Wert zurueck.
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.controls.set_volume(volume)
    }

    pub fn volume(&self) -> f32 {
        self.controls.volume()
    }

    pub fn status(&self) -> SessionStatus {
        let frames_dropped = self
            .queues
            .lock()
            .as_ref()
            .map_or(0, FramePair::dropped);
        SessionStatus {
            running: self.is_running(),
            phase: self.controls.phase(),
            frames_processed: self.controls.frames_processed(),
            frames_dropped,
            underruns: self.controls.underruns(),
            last_error: self.controls.last_error(),
        }
    }

    // Explizite Auswahl > Namen aus der Konfiguration > Standardgeraete
    fn resolve_devices(&self) -> AudioResult<SelectedDevices> {
        if let Some(selected) = self.selected.lock().clone() {
            return Ok(selected);
        }

        let needs_list = self.config.input_device.is_some() || self.config.output_device.is_some();
        let devices = if needs_list {
            self.host.devices()?
        } else {
            Vec::new()
        };
        let input = match &self.config.input_device {
            Some(name) => find_input(&devices, name)?.clone(),
            None => self.host.default_input()?,
        };
        let output = match &self.config.output_device {
            Some(name) => find_output(&devices, name)?.clone(),
            None => self.host.default_output()?,
        };
        Ok(SelectedDevices::resolve(input, output, self.config.channels))
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reap(session: ActiveSession) {
    session.driver.stop();
    session.worker.stop();
}
