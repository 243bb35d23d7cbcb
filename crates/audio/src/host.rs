//! Abstraktion ueber das Audio-Subsystem
//!
//! Der [`AudioHost`] kapselt Geraete-Enumeration und das Oeffnen der
//! Ein-/Ausgabe-Streams. [`CpalHost`] ist die echte Implementierung;
//! Tests koennen einen virtuellen Host einsetzen, der die Bruecken aus
//! einem eigenen Thread heraus bedient.

use crossbeam_channel::Sender;

use crate::bridge::{CaptureBridge, PlaybackBridge};
use crate::device::{self, DeviceInfo};
use crate::error::{AudioError, AudioResult};
use crate::{capture, playback};

/// Parameter fuer ein Stream-Paar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub input_device: String,
    pub output_device: String,
    pub sample_rate: u32,
    pub input_channels: u16,
    pub output_channels: u16,
    pub chunk_size: usize,
}

/// Laufendes Stream-Paar. Wird es gedroppt, endet die Hardware-Aktivitaet.
pub trait StreamHandle {
    /// Haelt beide Streams an. Nach der Rueckkehr laufen keine Callbacks mehr.
    fn stop(&mut self) -> AudioResult<()>;
}

/// Zugriff auf Geraete und Streams eines Audio-Subsystems
pub trait AudioHost: Send + Sync {
    /// Alle bekannten Geraete mit ihren Kanal-Faehigkeiten
    fn devices(&self) -> AudioResult<Vec<DeviceInfo>>;

    fn default_input(&self) -> AudioResult<DeviceInfo>;

    fn default_output(&self) -> AudioResult<DeviceInfo>;

    /// Oeffnet und startet Capture- und Playback-Stream.
    ///
    /// Wird im Thread des Stream-Treibers aufgerufen; das Handle verlaesst
    /// diesen Thread nie. Laufzeitfehler der Streams gehen an `errors`.
    fn open_streams(
        &self,
        request: &StreamRequest,
        capture: CaptureBridge,
        playback: PlaybackBridge,
        errors: Sender<AudioError>,
    ) -> AudioResult<Box<dyn StreamHandle>>;
}

/// Audio-Host auf Basis des cpal-Standard-Hosts
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalHost;

impl CpalHost {
    pub fn new() -> Self {
        Self
    }
}

struct CpalStreams {
    input: cpal::Stream,
    output: cpal::Stream,
}

impl StreamHandle for CpalStreams {
    fn stop(&mut self) -> AudioResult<()> {
        use cpal::traits::StreamTrait;
        self.input
            .pause()
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
        self.output
            .pause()
            .map_err(|e| AudioError::StreamFehler(e.to_string()))
    }
}

impl AudioHost for CpalHost {
    fn devices(&self) -> AudioResult<Vec<DeviceInfo>> {
        device::list_devices()
    }

    fn default_input(&self) -> AudioResult<DeviceInfo> {
        device::default_input()
    }

    fn default_output(&self) -> AudioResult<DeviceInfo> {
        device::default_output()
    }

    fn open_streams(
        &self,
        request: &StreamRequest,
        capture: CaptureBridge,
        playback: PlaybackBridge,
        errors: Sender<AudioError>,
    ) -> AudioResult<Box<dyn StreamHandle>> {
        let input_device = device::load_cpal_input_device(&request.input_device)?;
        let output_device = device::load_cpal_output_device(&request.output_device)?;

        let input = capture::open_capture_stream(
            &input_device,
            request.sample_rate,
            request.input_channels,
            capture,
            errors.clone(),
        )?;
        let output = playback::open_playback_stream(
            &output_device,
            request.sample_rate,
            request.output_channels,
            playback,
            errors,
        )?;

        Ok(Box::new(CpalStreams { input, output }))
    }
}
