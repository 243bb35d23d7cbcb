//! DSP-Module fuer die Rauschunterdrueckung
//!
//! Kern ist das spektrale Gate ([`spectral_gate::NoiseSuppressor`]);
//! Fensterfunktion und Median-Filter sind eigenstaendige Bausteine.

pub mod median;
pub mod spectral_gate;
pub mod window;

pub use spectral_gate::{NoiseProfile, NoiseSuppressor, PhaseTransition, SuppressorPhase};
