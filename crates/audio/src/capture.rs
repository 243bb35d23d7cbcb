//! Mikrofon-Capture via cpal
//!
//! Oeffnet einen cpal InputStream und reicht die Samples direkt im
//! cpal-Callback an die [`CaptureBridge`] weiter.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::Sender;
use tracing::{debug, error};

use crate::bridge::CaptureBridge;
use crate::error::{AudioError, AudioResult};

/// Oeffnet und startet einen Capture-Stream auf dem gegebenen Geraet.
///
/// Laufzeitfehler des Streams werden ueber `errors` gemeldet.
pub fn open_capture_stream(
    device: &Device,
    sample_rate: u32,
    channels: u16,
    bridge: CaptureBridge,
    errors: Sender<AudioError>,
) -> AudioResult<Stream> {
    let stream_config = StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    // Unterstuetzte Sample-Formate pruefen
    let supported = device
        .supported_input_configs()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?
        .find(|c| {
            c.min_sample_rate() <= sample_rate
                && c.max_sample_rate() >= sample_rate
                && c.channels() >= channels
        });

    let sample_format = supported
        .map(|c| c.sample_format())
        .unwrap_or(SampleFormat::F32);

    let stream = match sample_format {
        SampleFormat::F32 => build::<f32>(device, &stream_config, bridge, errors)?,
        SampleFormat::I16 => build::<i16>(device, &stream_config, bridge, errors)?,
        SampleFormat::U16 => build::<u16>(device, &stream_config, bridge, errors)?,
        SampleFormat::U8 => build::<u8>(device, &stream_config, bridge, errors)?,
        _ => {
            return Err(AudioError::StreamFehler(format!(
                "Nicht unterstuetztes Sample-Format: {:?}",
                sample_format
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    debug!(
        "Capture-Stream geoeffnet: {}Hz {}ch {:?}",
        sample_rate, channels, sample_format
    );
    Ok(stream)
}

fn build<T>(
    device: &Device,
    config: &StreamConfig,
    mut bridge: CaptureBridge,
    errors: Sender<AudioError>,
) -> AudioResult<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| bridge.push_interleaved(data),
            move |err| {
                error!("Capture-Fehler: {}", err);
                let _ = errors.try_send(AudioError::StreamFehler(format!("Capture: {err}")));
            },
            None,
        )
        .map_err(|e| AudioError::StreamFehler(e.to_string()))
}
