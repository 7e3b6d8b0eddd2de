//! Playable media handed to the signal chain.
//!
//! Decoding is the caller's business; the chain only pulls interleaved
//! `f32` frames from whatever [`MediaSource`] it is given.

use std::path::Path;

use glicol::Engine;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::params::audio_constants::BLOCK_SIZE;

/// Decoded audio the chain can pull from
pub trait MediaSource: Send {
    /// Interleaved channels per frame
    fn channels(&self) -> usize;

    fn sample_rate(&self) -> u32;

    /// Fill `out` with whole interleaved frames; returns frames written.
    /// Zero means the source is exhausted.
    fn read(&mut self, out: &mut [f32]) -> usize;

    /// Restart from the beginning, if supported
    fn rewind(&mut self) {}
}

/// Owned decoded PCM
#[derive(Debug, Clone)]
pub struct SampleSource {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    position: usize,
    looping: bool,
}

impl SampleSource {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        // Drop a trailing partial frame
        let mut samples = samples;
        samples.truncate(samples.len() - samples.len() % channels);
        Self {
            samples,
            channels,
            sample_rate,
            position: 0,
            looping: false,
        }
    }

    /// Restart automatically at the end
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate.max(1) as f32
    }

    /// Linearly resample to `target_rate`
    pub fn resampled(self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate || self.frames() < 2 || target_rate == 0 {
            return self;
        }
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let frames_in = self.frames();
        let frames_out = ((frames_in as f64) / ratio).floor() as usize;
        let ch = self.channels;
        let mut out = Vec::with_capacity(frames_out * ch);

        for i in 0..frames_out {
            let pos = i as f64 * ratio;
            let i0 = (pos.floor() as usize).min(frames_in - 1);
            let i1 = (i0 + 1).min(frames_in - 1);
            let t = (pos - i0 as f64) as f32;
            for c in 0..ch {
                let a = self.samples[i0 * ch + c];
                let b = self.samples[i1 * ch + c];
                out.push(a + (b - a) * t);
            }
        }

        debug!(
            from = self.sample_rate,
            to = target_rate,
            frames = frames_out,
            "resampled source"
        );
        Self {
            samples: out,
            sample_rate: target_rate,
            position: 0,
            ..self
        }
    }
}

impl MediaSource for SampleSource {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, out: &mut [f32]) -> usize {
        let wanted = out.len() / self.channels;
        let mut written = 0;
        while written < wanted {
            let available = (self.samples.len() - self.position) / self.channels;
            if available == 0 {
                if self.looping && !self.samples.is_empty() {
                    self.position = 0;
                    continue;
                }
                break;
            }
            let n = available.min(wanted - written);
            let src = &self.samples[self.position..self.position + n * self.channels];
            out[written * self.channels..(written + n) * self.channels].copy_from_slice(src);
            self.position += n * self.channels;
            written += n;
        }
        written
    }

    fn rewind(&mut self) {
        self.position = 0;
    }
}

/// Decode a WAV file into memory
pub fn load_wav(path: impl AsRef<Path>) -> Result<SampleSource, EngineError> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)
        .map_err(|e| EngineError::Source(format!("{}: {}", path.display(), e)))?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect()
        }
    };
    let samples =
        samples.map_err(|e| EngineError::Source(format!("{}: {}", path.display(), e)))?;

    let source = SampleSource::new(samples, spec.channels as usize, spec.sample_rate);
    info!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        seconds = source.duration_secs(),
        "loaded WAV source"
    );
    Ok(source)
}

/// Glicol composition used as the demo track
pub const DEMO_COMPOSITION: &str = r#"
~gate: speed 2.0 >> seq 60 _60 _~a 48
~a: choose 48 48 48 72 0 0 0
~amp: ~gate >> envperc 0.001 0.1
~pit: ~gate >> mul 261.63
~lead: saw ~pit >> mul ~amp >> lpf ~mod 5.0 >> mul 0.1
~mod: sin 0.2 >> mul 1300 >> add 1500
o: ~lead >> plate 0.1
"#;

/// Endless stereo source rendered by a Glicol engine
pub struct SynthSource {
    engine: Engine<BLOCK_SIZE>,
    sample_rate: u32,
    block: Vec<f32>,
    block_pos: usize,
}

impl SynthSource {
    pub fn new(code: &str, sample_rate: u32) -> Result<Self, EngineError> {
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(sample_rate as usize);
        engine.update_with_code(code);
        engine
            .update()
            .map_err(|e| EngineError::Source(format!("Glicol engine init failed: {:?}", e)))?;

        Ok(Self {
            engine,
            sample_rate,
            block: Vec::with_capacity(BLOCK_SIZE * 2),
            block_pos: 0,
        })
    }

    fn refill(&mut self) {
        let (buffers, _) = self.engine.next_block(vec![]);
        self.block.clear();
        for i in 0..BLOCK_SIZE {
            // Safety limiter: hard clip to ±0.5 to protect ears and speakers
            self.block.push(buffers[0][i].clamp(-0.5, 0.5));
            self.block.push(buffers[1][i].clamp(-0.5, 0.5));
        }
        self.block_pos = 0;
    }
}

impl MediaSource for SynthSource {
    fn channels(&self) -> usize {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, out: &mut [f32]) -> usize {
        let frames = out.len() / 2;
        for frame in out[..frames * 2].chunks_exact_mut(2) {
            if self.block_pos >= self.block.len() {
                self.refill();
            }
            frame[0] = self.block[self.block_pos];
            frame[1] = self.block[self.block_pos + 1];
            self.block_pos += 2;
        }
        frames
    }
}
