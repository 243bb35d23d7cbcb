//! Virtueller Audio-Host fuer Integration-Tests
//!
//! Ersetzt die Hardware durch einen Thread, der die Capture-Bridge mit
//! einem Testsignal fuettert und die Playback-Bridge ausliest.

#![allow(dead_code)]

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use silentium_audio::{
    AudioError, AudioHost, AudioResult, CaptureBridge, DeviceInfo, PlaybackBridge, StreamHandle,
    StreamRequest,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Samples pro virtuellem Callback und Kanal
const CALLBACK_FRAMES: usize = 256;

pub struct VirtualHost {
    devices: Vec<DeviceInfo>,
    amplitude: f32,
    pub fail_open: AtomicBool,
    pub opened: AtomicUsize,
    pub last_request: Mutex<Option<StreamRequest>>,
    pub played: Arc<Mutex<Vec<f32>>>,
    pub streams_running: Arc<AtomicBool>,
    /// Gerade offene Stream-Paare
    pub offen: Arc<AtomicUsize>,
    /// Hoechste Zahl gleichzeitig offener Stream-Paare
    pub max_offen: AtomicUsize,
    errors: Mutex<Option<Sender<AudioError>>>,
}

impl VirtualHost {
    /// Host mit "USB Mic" (1 Kanal), "Speakers" (2 Kanaele) und einem Headset
    pub fn new(amplitude: f32) -> Arc<Self> {
        Arc::new(Self {
            devices: vec![
                device("USB Mic", 1, 0),
                device("Speakers", 0, 2),
                device("Headset", 2, 2),
            ],
            amplitude,
            fail_open: AtomicBool::new(false),
            opened: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            played: Arc::new(Mutex::new(Vec::new())),
            streams_running: Arc::new(AtomicBool::new(false)),
            offen: Arc::new(AtomicUsize::new(0)),
            max_offen: AtomicUsize::new(0),
            errors: Mutex::new(None),
        })
    }

    pub fn as_host(self: &Arc<Self>) -> Arc<dyn AudioHost> {
        Arc::clone(self) as Arc<dyn AudioHost>
    }

    /// Meldet einen Laufzeitfehler wie ein abgezogenes Geraet
    pub fn stream_fehler_ausloesen(&self) {
        if let Some(tx) = self.errors.lock().as_ref() {
            let _ = tx.send(AudioError::StreamFehler("Geraet getrennt".into()));
        }
    }
}

pub fn device(name: &str, inputs: u16, outputs: u16) -> DeviceInfo {
    DeviceInfo {
        name: name.to_string(),
        max_input_channels: inputs,
        max_output_channels: outputs,
    }
}

struct VirtualStreams {
    running: Arc<AtomicBool>,
    thread_running: Arc<AtomicBool>,
    offen: Arc<AtomicUsize>,
    thread: Option<JoinHandle<()>>,
}

impl StreamHandle for VirtualStreams {
    fn stop(&mut self) -> AudioResult<()> {
        self.running.store(false, Ordering::SeqCst);
        self.thread_running.store(false, Ordering::SeqCst);
        if let Some(t) = self.thread.take() {
            self.offen.fetch_sub(1, Ordering::SeqCst);
            t.join()
                .map_err(|_| AudioError::ThreadFehler("virtueller Stream".into()))?;
        }
        Ok(())
    }
}

impl Drop for VirtualStreams {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl AudioHost for VirtualHost {
    fn devices(&self) -> AudioResult<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn default_input(&self) -> AudioResult<DeviceInfo> {
        Ok(self.devices[2].clone())
    }

    fn default_output(&self) -> AudioResult<DeviceInfo> {
        Ok(self.devices[2].clone())
    }

    fn open_streams(
        &self,
        request: &StreamRequest,
        mut capture: CaptureBridge,
        mut playback: PlaybackBridge,
        errors: Sender<AudioError>,
    ) -> AudioResult<Box<dyn StreamHandle>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(AudioError::StreamFehler("Geraet belegt".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());
        *self.errors.lock() = Some(errors);

        let jetzt_offen = self.offen.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_offen.fetch_max(jetzt_offen, Ordering::SeqCst);

        let running = Arc::clone(&self.streams_running);
        running.store(true, Ordering::SeqCst);
        // Eigenes Flag je Stream-Paar, damit sich Sessions nicht gegenseitig beenden
        let thread_running = Arc::new(AtomicBool::new(true));
        let stream_running = Arc::clone(&thread_running);
        let played = Arc::clone(&self.played);
        let amplitude = self.amplitude;
        let in_ch = usize::from(request.input_channels);
        let out_ch = usize::from(request.output_channels);

        let thread = std::thread::spawn(move || {
            let mut n = 0usize;
            while thread_running.load(Ordering::SeqCst) {
                let input: Vec<f32> = (0..CALLBACK_FRAMES * in_ch)
                    .map(|i| {
                        let t = (n + i / in_ch) as f32;
                        amplitude * (t * 0.05).sin()
                    })
                    .collect();
                n += CALLBACK_FRAMES;
                capture.push_interleaved(&input);

                let mut out = vec![0.0f32; CALLBACK_FRAMES * out_ch];
                playback.fill(&mut out);
                played.lock().extend(out.iter().step_by(out_ch));

                std::thread::sleep(Duration::from_millis(1));
            }
        });

        Ok(Box::new(VirtualStreams {
            running,
            thread_running: stream_running,
            offen: Arc::clone(&self.offen),
            thread: Some(thread),
        }))
    }
}

/// Wartet bis `bedingung` erfuellt ist oder das Timeout ablaeuft
pub fn warten_bis(timeout: Duration, mut bedingung: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if bedingung() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    bedingung()
}
