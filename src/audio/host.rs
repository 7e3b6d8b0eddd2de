//! Audio output hosts that drive a [`ChainProcessor`].

use tracing::debug;

use super::processor::ChainProcessor;
use crate::error::EngineError;

/// Negotiated output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: usize,
}

/// Something that pulls audio from the chain at its own pace
///
/// The host owns the processor once installed; the chain only talks to it
/// through shared state, so parameter changes never wait on the host.
pub trait AudioHost {
    /// Output format the processor must produce
    fn format(&self) -> StreamFormat;

    /// Take ownership of the processor and wire it to the output
    fn install(&mut self, processor: ChainProcessor) -> Result<(), EngineError>;

    /// Suspended hosts pull no audio until resumed
    fn is_suspended(&self) -> bool;

    /// Leave the suspended state; no-op when already running
    fn resume(&mut self) -> Result<(), EngineError>;
}

/// Host clocked by the caller, for tests and offline rendering
pub struct OfflineHost {
    format: StreamFormat,
    processor: Option<ChainProcessor>,
    suspended: bool,
    available: bool,
}

impl OfflineHost {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            format: StreamFormat {
                sample_rate,
                channels: channels.max(1),
            },
            processor: None,
            suspended: false,
            available: true,
        }
    }

    /// Start suspended, like an output waiting for a user gesture
    pub fn suspended(mut self) -> Self {
        self.suspended = true;
        self
    }

    /// Refuse installation, like a machine without audio output
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Pull `frames` interleaved frames; silence while suspended
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * self.format.channels];
        if self.suspended {
            return out;
        }
        if let Some(processor) = self.processor.as_mut() {
            processor.render(&mut out);
        }
        out
    }

    /// Pull audio covering `seconds` in blocks, discarding the output
    pub fn run_for(&mut self, seconds: f32) {
        let total = (seconds * self.format.sample_rate as f32).ceil() as usize;
        let mut remaining = total;
        let mut block = vec![0.0; 512 * self.format.channels];
        while remaining > 0 && !self.suspended {
            let frames = remaining.min(512);
            let out = &mut block[..frames * self.format.channels];
            out.iter_mut().for_each(|s| *s = 0.0);
            if let Some(processor) = self.processor.as_mut() {
                processor.render(out);
            }
            remaining -= frames;
        }
    }
}

impl AudioHost for OfflineHost {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn install(&mut self, processor: ChainProcessor) -> Result<(), EngineError> {
        if !self.available {
            return Err(EngineError::EngineUnavailable(
                "offline host configured as unavailable".to_string(),
            ));
        }
        self.processor = Some(processor);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if self.suspended {
            debug!("offline host resumed");
        }
        self.suspended = false;
        Ok(())
    }
}
