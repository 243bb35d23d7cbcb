//! silentium-audio – Echtzeit-Rauschunterdrueckung
//!
//! Vollstaendige Verarbeitungskette:
//! - Mikrofon-Capture und Lautsprecher-Playback via cpal
//! - Frame-Queues zwischen Hardware-Callbacks und Worker
//! - Spektrales Gating mit gelerntem Rauschprofil und AC-Brumm-Daempfung
//! - Mithoeren mit rohem Durchreich-Pfad
//! - Session-Steuerung (Geraete, Start/Stop, Schalter, Status)

pub mod bridge;
pub mod capture;
pub mod config;
pub mod controller;
pub mod controls;
pub mod device;
pub mod driver;
pub mod dsp;
pub mod error;
pub mod frame;
pub mod host;
pub mod playback;
pub mod queue;
pub mod worker;

// Bequeme Re-Exporte der wichtigsten Typen
pub use bridge::{bridge_pair, CaptureBridge, PlaybackBridge};
pub use config::{PeakNormalization, SessionConfig, SuppressorConfig};
pub use controller::{SelectedDevices, SessionController, SessionStatus};
pub use controls::SessionControls;
pub use device::{default_input, default_output, list_input_devices, list_output_devices, DeviceInfo};
pub use driver::StreamDriver;
pub use dsp::{NoiseProfile, NoiseSuppressor, PhaseTransition, SuppressorPhase};
pub use error::{AudioError, AudioResult};
pub use frame::AudioFrame;
pub use host::{AudioHost, CpalHost, StreamHandle, StreamRequest};
pub use queue::{FramePair, FrameQueue};
pub use worker::{process_one, ProcessingWorker};
