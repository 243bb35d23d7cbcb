//! # silentium-observability
//!
//! Structured Logging fuer Silentium via tracing-subscriber, wahlweise als
//! Text oder JSON.

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat};
