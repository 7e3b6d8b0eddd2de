//! Analysis tap: the post-master-gain point the analyzer reads from.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Most recent mono samples kept for analysis (covers the largest FFT size)
pub const TAP_CAPACITY: usize = 32768;

/// Ring buffer of the chain's output, mixed down to mono
///
/// Written by the audio thread after master gain, read by the analyzer.
/// Readers never mutate the chain; they only copy samples out.
#[derive(Debug)]
pub struct AnalysisTap {
    ring: Mutex<Ring>,
    live: AtomicBool,
}

#[derive(Debug)]
struct Ring {
    samples: Vec<f32>,
    write_pos: usize,
}

impl AnalysisTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                samples: vec![0.0; capacity.max(1)],
                write_pos: 0,
            }),
            live: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().samples.len()
    }

    /// True once a source is attached to the chain feeding this tap
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::Release);
    }

    /// Append samples (audio thread)
    ///
    /// Never blocks: while a reader or `clear` holds the ring the block is
    /// dropped from analysis and the audio path carries on.
    pub(crate) fn push(&self, mono: &[f32]) {
        let Some(mut ring) = self.ring.try_lock() else {
            return;
        };
        let len = ring.samples.len();
        // Only the newest `len` samples can survive
        let mono = &mono[mono.len().saturating_sub(len)..];
        for &sample in mono {
            let pos = ring.write_pos;
            ring.samples[pos] = sample;
            ring.write_pos = (pos + 1) % len;
        }
    }

    /// Zero the buffer (source detached or replaced)
    pub(crate) fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.samples.iter_mut().for_each(|s| *s = 0.0);
        ring.write_pos = 0;
    }

    /// Copy the newest `out.len()` samples into `out`, oldest first
    ///
    /// Returns false (leaving `out` untouched) while no source is attached.
    pub fn read_latest(&self, out: &mut [f32]) -> bool {
        if !self.is_live() {
            return false;
        }
        let ring = self.ring.lock();
        let len = ring.samples.len();
        let count = out.len().min(len);
        let lead = out.len() - count;
        out[..lead].iter_mut().for_each(|s| *s = 0.0);

        let start = (ring.write_pos + len - count) % len;
        for (i, slot) in out[lead..].iter_mut().enumerate() {
            *slot = ring.samples[(start + i) % len];
        }
        true
    }
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new(TAP_CAPACITY)
    }
}
