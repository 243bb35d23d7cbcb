//! Verarbeitungs-Worker
//!
//! Eigener Thread, der die Eingangs-Queue leert, jeden Frame mit der
//! aktuellen Lautstaerke skaliert, optional durch den Rauschunterdruecker
//! schickt und das Ergebnis in die Ausgangs-Queue legt. Der Worker besitzt
//! den Unterdruecker exklusiv, das Rauschprofil wird nie geteilt.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

use crate::controls::SessionControls;
use crate::dsp::{NoiseSuppressor, PhaseTransition, SuppressorPhase};
use crate::error::{AudioError, AudioResult};
use crate::frame::AudioFrame;
use crate::queue::FramePair;

/// Verarbeitet genau einen Frame: Lautstaerke, dann (falls aktiv) Unterdrueckung.
pub fn process_one(
    mut frame: AudioFrame,
    suppressor: &mut NoiseSuppressor,
    controls: &SessionControls,
) -> (AudioFrame, Option<PhaseTransition>) {
    frame.scale(controls.volume());

    if !controls.suppression_enabled() {
        return (frame, None);
    }

    match suppressor.process_frame(frame.samples_mut()) {
        Ok(transition) => (frame, transition),
        Err(e) => {
            warn!("Frame unverarbeitet weitergereicht: {}", e);
            (frame, None)
        }
    }
}

/// Handle auf den laufenden Worker-Thread
pub struct ProcessingWorker {
    handle: Mutex<Option<JoinHandle<()>>>,
    controls: Arc<SessionControls>,
}

impl ProcessingWorker {
    /// Startet den Worker. Setzt das Running-Flag, damit der Worker vor dem
    /// Stream bereit ist.
    pub fn spawn(
        queues: FramePair,
        controls: Arc<SessionControls>,
        mut suppressor: NoiseSuppressor,
        pop_timeout: Duration,
    ) -> AudioResult<Self> {
        controls.set_running(true);
        let thread_controls = Arc::clone(&controls);

        let handle = std::thread::Builder::new()
            .name("silentium-worker".to_string())
            .spawn(move || {
                debug!("Worker-Thread gestartet");
                while thread_controls.is_running() {
                    let Some(frame) = queues.input.pop_timeout(pop_timeout) else {
                        continue;
                    };
                    let (processed, transition) =
                        process_one(frame, &mut suppressor, &thread_controls);
                    if let Some(t) = transition {
                        thread_controls.set_phase(SuppressorPhase::Steady);
                        debug!(
                            frame = t.frame_index,
                            gelernt = t.learned_frames,
                            "Phase an Session gemeldet"
                        );
                    }
                    if !queues.output.push(processed) {
                        debug!("Ausgangs-Queue voll, aeltester Frame verworfen");
                    }
                    thread_controls.record_frame();
                }
                debug!(
                    frames = suppressor.frames_seen(),
                    "Worker-Thread beendet"
                );
            })
            .map_err(|e| {
                controls.set_running(false);
                AudioError::ThreadFehler(e.to_string())
            })?;

        Ok(Self {
            handle: Mutex::new(Some(handle)),
            controls,
        })
    }

    /// Stoppt den Worker und wartet bis der Thread beendet ist.
    ///
    /// Idempotent. Nach der Rueckkehr werden keine Frames mehr erzeugt.
    pub fn stop(&self) {
        self.controls.set_running(false);
        self.join();
    }

    /// Wartet auf das Ende des Threads ohne das Flag zu aendern
    pub fn join(&self) {
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!("Worker-Thread ist abgestuerzt");
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

impl Drop for ProcessingWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
