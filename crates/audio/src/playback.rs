//! Audio-Playback via cpal
//!
//! Oeffnet einen cpal OutputStream, dessen Callback den Hardware-Puffer
//! ueber die [`PlaybackBridge`] fuellt.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::Sender;
use tracing::{debug, error};

use crate::bridge::PlaybackBridge;
use crate::error::{AudioError, AudioResult};

/// Oeffnet und startet einen Playback-Stream auf dem gegebenen Geraet.
pub fn open_playback_stream(
    device: &Device,
    sample_rate: u32,
    channels: u16,
    bridge: PlaybackBridge,
    errors: Sender<AudioError>,
) -> AudioResult<Stream> {
    let stream_config = StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let supported = device
        .supported_output_configs()
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
        "Playback-Stream geoeffnet: {}Hz {}ch {:?}",
        sample_rate, channels, sample_format
    );
    Ok(stream)
}

fn build<T>(
    device: &Device,
    config: &StreamConfig,
    mut bridge: PlaybackBridge,
    errors: Sender<AudioError>,
) -> AudioResult<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| bridge.fill(data),
            move |err| {
                error!("Playback-Fehler: {}", err);
                let _ = errors.try_send(AudioError::StreamFehler(format!("Playback: {err}")));
            },
            None,
        )
        .map_err(|e| AudioError::StreamFehler(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::SessionControls;
    use crate::queue::FramePair;
    use cpal::traits::HostTrait;
    use std::sync::Arc;

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn playback_stream_oeffnen() {
        let host = cpal::default_host();
        if let Some(device) = host.default_output_device() {
            let queues = FramePair::new(8);
            let controls = Arc::new(SessionControls::default());
            let (_, playback) = crate::bridge::bridge_pair(&queues, &controls, 1024, 1, 1);
            let (tx, _rx) = crossbeam_channel::bounded(4);
            let result = open_playback_stream(&device, 44100, 1, playback, tx);
            assert!(result.is_ok(), "Playback-Stream sollte oeffenbar sein");
        }
    }
}
