//! Bruecke zwischen Hardware-Callbacks und Frame-Queues
//!
//! Beide Seiten laufen im Callback-Kontext des Audio-Subsystems und
//! duerfen niemals blockieren:
//! - [`CaptureBridge`] mischt interleavte Eingangs-Samples auf Mono,
//!   setzt daraus Frames fester Laenge zusammen und reiht sie in die
//!   Eingangs-Queue ein. Die rohen Mono-Samples landen zusaetzlich in
//!   einem lock-free Monitor-Ring fuer den Durchreich-Pfad.
//! - [`PlaybackBridge`] spielt verarbeitete Frames aus der Ausgangs-Queue
//!   ab. Ist keiner bereit, werden die rohen Samples aus dem Monitor-Ring
//!   (skaliert mit der Lautstaerke) durchgereicht; bei deaktiviertem
//!   Feedback wird Stille ausgegeben.

use cpal::{FromSample, Sample};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::controls::SessionControls;
use crate::frame::AudioFrame;
use crate::queue::{FramePair, FrameQueue};

/// Erstellt beide Bruecken einer Session mit gemeinsamem Monitor-Ring
pub fn bridge_pair(
    queues: &FramePair,
    controls: &Arc<SessionControls>,
    chunk_size: usize,
    input_channels: u16,
    output_channels: u16,
) -> (CaptureBridge, PlaybackBridge) {
    // Vier Frames Vorlauf fuer den Durchreich-Pfad
    let rb = HeapRb::<f32>::new(chunk_size.max(1) * 4);
    let (monitor_tx, monitor_rx) = rb.split();

    let capture = CaptureBridge {
        channels: usize::from(input_channels.max(1)),
        chunk_size: chunk_size.max(1),
        pending: Vec::with_capacity(chunk_size),
        input: queues.input.clone(),
        monitor: monitor_tx,
        frames_dropped: 0,
    };
    let playback = PlaybackBridge {
        channels: usize::from(output_channels.max(1)),
        output: queues.output.clone(),
        monitor: monitor_rx,
        current: None,
        position: 0,
        controls: Arc::clone(controls),
    };
    (capture, playback)
}

/// Capture-Seite: Hardware-Samples -> Frames
pub struct CaptureBridge {
    channels: usize,
    chunk_size: usize,
    pending: Vec<f32>,
    input: FrameQueue,
    monitor: HeapProd<f32>,
    frames_dropped: u64,
}

impl CaptureBridge {
    /// Nimmt einen interleavten Hardware-Puffer entgegen
    pub fn push_interleaved<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let scale = 1.0 / self.channels as f32;
        for frame in data.chunks(self.channels) {
            let mono = frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>() * scale;
            // Monitor voll -> Sample fuer den Durchreich-Pfad verwerfen
            let _ = self.monitor.try_push(mono);

            self.pending.push(mono);
            if self.pending.len() == self.chunk_size {
                let samples =
                    std::mem::replace(&mut self.pending, Vec::with_capacity(self.chunk_size));
                if !self.input.push(AudioFrame::new(samples)) {
                    self.frames_dropped += 1;
                    if self.frames_dropped.is_power_of_two() {
                        warn!(
                            verworfen = self.frames_dropped,
                            "Eingangs-Queue voll, aelteste Frames verworfen"
                        );
                    }
                }
            }
        }
    }

    /// Samples des noch unvollstaendigen Frames
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Playback-Seite: Frames -> Hardware-Samples
pub struct PlaybackBridge {
    channels: usize,
    output: FrameQueue,
    monitor: HeapCons<f32>,
    current: Option<AudioFrame>,
    position: usize,
    controls: Arc<SessionControls>,
}

impl PlaybackBridge {
    /// Fuellt einen interleavten Hardware-Puffer vollstaendig
    pub fn fill<T>(&mut self, out: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        let volume = self.controls.volume();
        let feedback = self.controls.feedback_enabled();
        let mut underrun = false;

        for frame in out.chunks_mut(self.channels) {
            // Roher Pfad laeuft immer mit, damit er nicht hinterherhinkt
            let raw = self.monitor.try_pop();
            let value = match self.next_processed() {
                Some(s) => s,
                None => {
                    underrun = true;
                    raw.unwrap_or(0.0) * volume
                }
            };
            let value = if feedback { value } else { 0.0 };
            let sample = T::from_sample(value);
            for slot in frame.iter_mut() {
                *slot = sample;
            }
        }

        if underrun {
            let n = self.controls.record_underrun();
            if n.is_power_of_two() {
                debug!(underruns = n, "Kein verarbeiteter Frame bereit, reiche roh durch");
            }
        }
    }

    /// Rohe Samples die noch im Monitor-Ring warten
    pub fn monitor_len(&self) -> usize {
        self.monitor.occupied_len()
    }

    fn next_processed(&mut self) -> Option<f32> {
        let exhausted = self
            .current
            .as_ref()
            .map_or(true, |f| self.position >= f.len());
        if exhausted {
            self.current = self.output.try_pop();
            self.position = 0;
        }
        let frame = self.current.as_ref()?;
        let sample = frame.samples().get(self.position).copied();
        self.position += 1;
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(
        chunk: usize,
        in_ch: u16,
        out_ch: u16,
        volume: f32,
    ) -> (FramePair, Arc<SessionControls>, CaptureBridge, PlaybackBridge) {
        let queues = FramePair::new(8);
        let controls = Arc::new(SessionControls::new(volume, true, true));
        let (c, p) = bridge_pair(&queues, &controls, chunk, in_ch, out_ch);
        (queues, controls, c, p)
    }

    #[test]
    fn capture_setzt_frames_ueber_callbacks_zusammen() {
        let (queues, _, mut capture, _) = setup(8, 1, 1, 1.0);
        let data: Vec<f32> = (0..5).map(|i| i as f32).collect();
        capture.push_interleaved(&data);
        assert!(queues.input.is_empty());
        assert_eq!(capture.pending_len(), 5);

        let data: Vec<f32> = (5..13).map(|i| i as f32).collect();
        capture.push_interleaved(&data);
        let frame = queues.input.try_pop().expect("voller Frame erwartet");
        assert_eq!(frame.samples(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(capture.pending_len(), 5);
    }

    #[test]
    fn capture_mischt_stereo_auf_mono() {
        let (queues, _, mut capture, _) = setup(2, 2, 1, 1.0);
        capture.push_interleaved(&[1.0f32, 0.0, 0.5, 0.5]);
        let frame = queues.input.try_pop().unwrap();
        assert_eq!(frame.samples(), &[0.5, 0.5]);
    }

    #[test]
    fn capture_konvertiert_i16() {
        let (queues, _, mut capture, _) = setup(2, 1, 1, 1.0);
        capture.push_interleaved(&[0i16, i16::MIN]);
        let frame = queues.input.try_pop().unwrap();
        assert_eq!(frame.samples()[0], 0.0);
        assert!((frame.samples()[1] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn playback_spielt_verarbeitete_frames() {
        let (queues, _, mut capture, mut playback) = setup(4, 1, 1, 0.5);
        capture.push_interleaved(&[0.9f32; 4]);
        queues.output.push(AudioFrame::new(vec![0.1, 0.2, 0.3, 0.4]));

        let mut out = [0.0f32; 4];
        playback.fill(&mut out);
        // Verarbeitete Frames sind bereits vom Worker skaliert
        assert_eq!(out, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(playback.monitor_len(), 0, "Monitor muss mitlaufen");
    }

    #[test]
    fn playback_reicht_roh_durch_wenn_nichts_bereit() {
        let (_, controls, mut capture, mut playback) = setup(4, 1, 1, 0.5);
        capture.push_interleaved(&[0.8f32, -0.4]);
        let mut out = [1.0f32; 3];
        playback.fill(&mut out);
        assert_eq!(out, [0.4, -0.2, 0.0]);
        assert_eq!(controls.underruns(), 1);
    }

    #[test]
    fn playback_stille_ohne_feedback() {
        let (queues, controls, mut capture, mut playback) = setup(4, 1, 1, 1.0);
        controls.set_feedback_enabled(false);
        capture.push_interleaved(&[0.8f32; 2]);
        queues.output.push(AudioFrame::new(vec![0.5; 4]));
        let mut out = [1.0f32; 4];
        playback.fill(&mut out);
        assert_eq!(out, [0.0; 4]);
        assert!(queues.output.is_empty(), "Frame muss trotzdem verbraucht werden");
    }

    #[test]
    fn playback_frame_ueber_mehrere_callbacks() {
        let (queues, _, _, mut playback) = setup(4, 1, 2, 1.0);
        queues.output.push(AudioFrame::new(vec![0.1, 0.2, 0.3, 0.4]));
        queues.output.push(AudioFrame::new(vec![0.5, 0.6, 0.7, 0.8]));

        let mut out = [0.0f32; 6];
        playback.fill(&mut out);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
        let mut out = [0.0f32; 6];
        playback.fill(&mut out);
        assert_eq!(out, [0.4, 0.4, 0.5, 0.5, 0.6, 0.6]);
    }

    #[test]
    fn playback_i16_ausgabe() {
        let (queues, _, _, mut playback) = setup(2, 1, 1, 1.0);
        queues.output.push(AudioFrame::new(vec![0.0, 1.0]));
        let mut out = [7i16; 2];
        playback.fill(&mut out);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], i16::MAX);
    }
}
