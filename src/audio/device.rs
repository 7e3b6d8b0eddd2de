//! Output device host backed by cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use tracing::{debug, info, warn};

use super::host::{AudioHost, StreamFormat};
use super::processor::ChainProcessor;
use crate::error::EngineError;

/// Default output device of the default cpal host
///
/// The stream is created paused; it starts on the first [`AudioHost::resume`].
pub struct CpalHost {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    stream: Option<cpal::Stream>,
    suspended: bool,
}

impl CpalHost {
    /// Acquire the default output device
    ///
    /// Runs at `preferred_sample_rate_hz` when the device supports it with its
    /// default channel layout and sample format, otherwise at the device default.
    pub fn open_default(preferred_sample_rate_hz: u32) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::EngineUnavailable("no audio output device found".into()))?;

        let default_config = device.default_output_config().map_err(|e| {
            EngineError::EngineUnavailable(format!("failed to get audio config: {}", e))
        })?;

        let config = match device.supported_output_configs() {
            Ok(ranges) => preferred_config(ranges, &default_config, preferred_sample_rate_hz)
                .unwrap_or_else(|| {
                    debug!(
                        preferred = preferred_sample_rate_hz,
                        "preferred sample rate unsupported, using device default"
                    );
                    default_config
                }),
            Err(e) => {
                warn!("could not list output configs: {}", e);
                default_config
            }
        };

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            format = ?config.sample_format(),
            "audio output acquired"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            suspended: true,
        })
    }

    fn build_stream<T>(&self, mut processor: ChainProcessor) -> Result<cpal::Stream, EngineError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let mut scratch: Vec<f32> = Vec::new();
        self.device
            .build_output_stream(
                &self.config.config(),
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    processor.render(&mut scratch);
                    for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                        *out = <T as Sample>::from_sample(sample.clamp(-1.0, 1.0));
                    }
                },
                |err| warn!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| EngineError::EngineUnavailable(format!("failed to build audio stream: {}", e)))
    }
}

/// First range matching the default layout and format that covers `sample_rate_hz`
fn preferred_config(
    ranges: impl IntoIterator<Item = cpal::SupportedStreamConfigRange>,
    default: &cpal::SupportedStreamConfig,
    sample_rate_hz: u32,
) -> Option<cpal::SupportedStreamConfig> {
    let rate = cpal::SampleRate(sample_rate_hz);
    ranges
        .into_iter()
        .find(|range| {
            range.channels() == default.channels()
                && range.sample_format() == default.sample_format()
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .map(|range| range.with_sample_rate(rate))
}

impl AudioHost for CpalHost {
    fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.config.sample_rate().0,
            channels: self.config.channels() as usize,
        }
    }

    fn install(&mut self, processor: ChainProcessor) -> Result<(), EngineError> {
        let stream = match self.config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(processor)?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>(processor)?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>(processor)?,
            cpal::SampleFormat::I32 => self.build_stream::<i32>(processor)?,
            other => {
                return Err(EngineError::EngineUnavailable(format!(
                    "unsupported output sample format {:?}",
                    other
                )))
            }
        };

        // Some backends start streams on creation; hold it until resumed
        if let Err(e) = stream.pause() {
            warn!("could not pause new stream: {}", e);
        }
        self.stream = Some(stream);
        self.suspended = true;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let Some(stream) = self.stream.as_ref() else {
            return Err(EngineError::EngineUnavailable(
                "no stream installed".to_string(),
            ));
        };
        if !self.suspended {
            return Ok(());
        }
        stream.play().map_err(|e| {
            EngineError::PlaybackStartFailed(format!("failed to start audio stream: {}", e))
        })?;
        self.suspended = false;
        Ok(())
    }
}
