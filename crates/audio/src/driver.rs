//! Stream-Treiber
//!
//! Eigener Thread, der die Hardware-Streams oeffnet, besitzt und wieder
//! schliesst. Der Start wird synchron quittiert: [`StreamDriver::spawn`]
//! kehrt erst zurueck, wenn die Streams laufen oder das Oeffnen
//! fehlgeschlagen ist. Danach prueft der Thread periodisch das
//! Running-Flag und wartet auf Laufzeitfehler der Streams.

use crossbeam_channel::{bounded, RecvTimeoutError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::bridge::{CaptureBridge, PlaybackBridge};
use crate::controls::SessionControls;
use crate::error::{AudioError, AudioResult};
use crate::host::{AudioHost, StreamRequest};

/// Puffer fuer Stream-Fehler; weitere Fehler nach dem ersten sind irrelevant
const ERROR_CHANNEL_CAPACITY: usize = 8;

/// Handle auf den laufenden Treiber-Thread
pub struct StreamDriver {
    handle: Mutex<Option<JoinHandle<()>>>,
    controls: Arc<SessionControls>,
}

impl StreamDriver {
    /// Startet den Treiber und wartet auf das Ergebnis des Stream-Starts.
    pub fn spawn(
        host: Arc<dyn AudioHost>,
        request: StreamRequest,
        capture: CaptureBridge,
        playback: PlaybackBridge,
        controls: Arc<SessionControls>,
        poll_interval: Duration,
    ) -> AudioResult<Self> {
        let (ready_tx, ready_rx) = bounded::<AudioResult<()>>(1);
        let thread_controls = Arc::clone(&controls);

        let handle = std::thread::Builder::new()
            .name("silentium-streams".to_string())
            .spawn(move || {
                let (err_tx, err_rx) = bounded::<AudioError>(ERROR_CHANNEL_CAPACITY);
                let mut streams = match host.open_streams(&request, capture, playback, err_tx) {
                    Ok(streams) => {
                        let _ = ready_tx.send(Ok(()));
                        streams
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                debug!(
                    eingabe = %request.input_device,
                    ausgabe = %request.output_device,
                    "Streams laufen"
                );

                while thread_controls.is_running() {
                    match err_rx.recv_timeout(poll_interval) {
                        Ok(e) if e.ist_sitzungsfatal() => {
                            error!("Stream-Fehler, Session wird beendet: {}", e);
                            thread_controls.fail(e);
                            break;
                        }
                        Ok(e) => warn!("Stream meldet: {}", e),
                        Err(RecvTimeoutError::Timeout) => {}
                        // Host haelt keinen Sender mehr, nur noch das Flag pruefen
                        Err(RecvTimeoutError::Disconnected) => std::thread::sleep(poll_interval),
                    }
                }

                if let Err(e) = streams.stop() {
                    warn!("Streams konnten nicht angehalten werden: {}", e);
                }
                drop(streams);
                debug!("Stream-Treiber beendet");
            })?;

        let started = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(AudioError::ThreadFehler("Stream-Treiber abgestuerzt".into())));

        let driver = Self {
            handle: Mutex::new(Some(handle)),
            controls,
        };
        match started {
            Ok(()) => Ok(driver),
            Err(e) => {
                driver.join();
                Err(e)
            }
        }
    }

    /// Stoppt die Streams und wartet auf das Thread-Ende. Idempotent.
    pub fn stop(&self) {
        self.controls.set_running(false);
        self.join();
    }

    /// Wartet auf das Ende des Threads ohne das Flag zu aendern
    pub fn join(&self) {
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!("Stream-Treiber ist abgestuerzt");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, |h| h.is_finished())
    }
}

impl Drop for StreamDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::bridge_pair;
    use crate::device::DeviceInfo;
    use crate::host::StreamHandle;
    use crate::queue::FramePair;
    use crossbeam_channel::Sender;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Handle {
        stopped: Arc<AtomicBool>,
    }

    impl StreamHandle for Handle {
        fn stop(&mut self) -> AudioResult<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Host, dessen Streams nichts tun; der Fehler-Sender wird aufbewahrt
    struct StillerHost {
        fail_open: bool,
        stopped: Arc<AtomicBool>,
        errors: Mutex<Option<Sender<AudioError>>>,
    }

    impl StillerHost {
        fn new(fail_open: bool) -> Self {
            Self {
                fail_open,
                stopped: Arc::new(AtomicBool::new(false)),
                errors: Mutex::new(None),
            }
        }
    }

    impl AudioHost for StillerHost {
        fn devices(&self) -> AudioResult<Vec<DeviceInfo>> {
            Ok(Vec::new())
        }

        fn default_input(&self) -> AudioResult<DeviceInfo> {
            Err(AudioError::KeinStandardEingabegeraet)
        }

        fn default_output(&self) -> AudioResult<DeviceInfo> {
            Err(AudioError::KeinStandardAusgabegeraet)
        }

        fn open_streams(
            &self,
            _request: &StreamRequest,
            _capture: CaptureBridge,
            _playback: PlaybackBridge,
            errors: Sender<AudioError>,
        ) -> AudioResult<Box<dyn StreamHandle>> {
            if self.fail_open {
                return Err(AudioError::StreamFehler("Geraet belegt".into()));
            }
            *self.errors.lock() = Some(errors);
            Ok(Box::new(Handle {
                stopped: Arc::clone(&self.stopped),
            }))
        }
    }

    fn request() -> StreamRequest {
        StreamRequest {
            input_device: "Mic".into(),
            output_device: "Speaker".into(),
            sample_rate: 44100,
            input_channels: 1,
            output_channels: 1,
            chunk_size: 64,
        }
    }

    fn starten(host: &Arc<StillerHost>) -> (Arc<SessionControls>, AudioResult<StreamDriver>) {
        let controls = Arc::new(SessionControls::default());
        controls.set_running(true);
        let queues = FramePair::new(4);
        let (capture, playback) = bridge_pair(&queues, &controls, 64, 1, 1);
        let host_dyn: Arc<dyn AudioHost> = Arc::clone(host) as Arc<dyn AudioHost>;
        let driver = StreamDriver::spawn(
            host_dyn,
            request(),
            capture,
            playback,
            Arc::clone(&controls),
            Duration::from_millis(10),
        );
        (controls, driver)
    }

    #[test]
    fn start_fehler_wird_synchron_gemeldet() {
        let host = Arc::new(StillerHost::new(true));
        let (_, driver) = starten(&host);
        assert!(matches!(driver, Err(AudioError::StreamFehler(_))));
    }

    #[test]
    fn stop_haelt_streams_an() {
        let host = Arc::new(StillerHost::new(false));
        let (controls, driver) = starten(&host);
        let driver = driver.unwrap();
        assert!(!driver.is_finished());

        driver.stop();
        driver.stop();
        assert!(driver.is_finished());
        assert!(!controls.is_running());
        assert!(host.stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn laufzeitfehler_beendet_session() {
        let host = Arc::new(StillerHost::new(false));
        let (controls, driver) = starten(&host);
        let driver = driver.unwrap();

        let sender = host.errors.lock().clone().unwrap();
        sender
            .send(AudioError::StreamFehler("Geraet getrennt".into()))
            .unwrap();
        driver.join();

        assert!(!controls.is_running());
        assert!(matches!(
            controls.last_error(),
            Some(AudioError::StreamFehler(_))
        ));
        assert!(host.stopped.load(Ordering::SeqCst));
    }
}
