//! Begrenzte Frame-Queues zwischen Callback und Worker
//!
//! Zwei Queues bilden das Queue-Paar: Eingang (Capture-Callback -> Worker)
//! und Ausgang (Worker -> Playback-Callback). Beide sind thread-safe und
//! begrenzt. Ueberlauf-Strategie: **drop-oldest**. Ist die Queue voll,
//! wird der aelteste Frame verworfen und gezaehlt, der neue Frame landet
//! am Ende. Die FIFO-Reihenfolge der verbleibenden Frames bleibt erhalten.
//!
//! Das Verwerfen entnimmt den aeltesten Frame ueber den Consumer. Holt sich
//! der Worker im selben Moment ebenfalls einen Frame, geht ein Frame mehr
//! verloren als noetig, obwohl gerade Platz frei wurde. Jeder verlorene
//! Frame wird trotzdem in `dropped()` gezaehlt.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::frame::AudioFrame;

/// Begrenzte FIFO-Queue fuer Audio-Frames
#[derive(Clone)]
pub struct FrameQueue {
    tx: Sender<AudioFrame>,
    rx: Receiver<AudioFrame>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl FrameQueue {
    /// Erstellt eine Queue mit Platz fuer `capacity` Frames (mindestens 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reiht einen Frame ein, blockiert nie.
    ///
    /// Gibt `false` zurueck wenn dabei ein Frame verworfen wurde.
    pub fn push(&self, frame: AudioFrame) -> bool {
        let frame = match self.tx.try_send(frame) {
            Ok(()) => return true,
            Err(TrySendError::Full(frame)) => frame,
            Err(TrySendError::Disconnected(_)) => {
                // Beide Enden gehoeren der Queue selbst
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        // Aeltesten Frame verwerfen, dann erneut versuchen
        if self.rx.try_recv().is_ok() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        if self.tx.try_send(frame).is_err() {
            // Konkurrierender Producer hat den Platz belegt
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        false
    }

    /// Entnimmt den aeltesten Frame ohne zu blockieren
    pub fn try_pop(&self) -> Option<AudioFrame> {
        self.rx.try_recv().ok()
    }

    /// Wartet hoechstens `timeout` auf den naechsten Frame.
    ///
    /// `None` bei Timeout (normaler Leerlauf, kein Fehler).
    pub fn pop_timeout(&self, timeout: Duration) -> Option<AudioFrame> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Anzahl der seit Erstellung verworfenen Frames
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Verwirft alle wartenden Frames (zaehlt nicht als Drop)
    pub fn clear(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}

/// Eingangs- und Ausgangs-Queue einer Session
#[derive(Clone)]
pub struct FramePair {
    /// Capture-Callback -> Worker
    pub input: FrameQueue,
    /// Worker -> Playback-Callback
    pub output: FrameQueue,
}

impl FramePair {
    pub fn new(capacity: usize) -> Self {
        Self {
            input: FrameQueue::new(capacity),
            output: FrameQueue::new(capacity),
        }
    }

    /// Summe der verworfenen Frames beider Queues
    pub fn dropped(&self) -> u64 {
        self.input.dropped() + self.output.dropped()
    }

    pub fn clear(&self) {
        self.input.clear();
        self.output.clear();
    }
}
