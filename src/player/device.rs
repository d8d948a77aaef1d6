//! Live output through the default cpal device.

use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, PushError, RingBuffer};
use tracing::{info, warn};

use super::{OutputSink, SinkFormat};
use crate::{
    error::{Error, Result},
    sampler::Sampler,
};

/// Seconds of audio the ring between the driver and the callback can hold.
const RING_SECONDS: f64 = 0.5;

/// How long the writer sleeps while the ring is full.
const BACKOFF: Duration = Duration::from_millis(2);

/// Streams frames to the default output device.
///
/// Frames are decoded back to floats and pushed into a lock-free ring that
/// the audio callback drains. `write` blocks while the ring is full, which
/// paces the driver to real time.
pub struct DeviceSink {
    stream: Option<cpal::Stream>,
    producer: Producer<f32>,
    sampler: Sampler,
    sample_rate: u32,
    pending: Vec<u8>,
}

impl DeviceSink {
    pub fn open(format: SinkFormat) -> Result<Self> {
        let sampler = Sampler::for_bit_depth(format.bit_depth)?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Device("no default output device available".into()))?;
        let default_config = device
            .default_output_config()
            .map_err(|e| Error::Device(format!("failed to fetch default output config: {e}")))?;

        let channels = usize::from(default_config.channels());
        let config = cpal::StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = (f64::from(format.sample_rate) * RING_SECONDS).ceil() as usize;
        let (producer, consumer) = RingBuffer::<f32>::new(capacity.max(1));

        let stream = device
            .build_output_stream(
                &config,
                render_callback(consumer, channels),
                |err| warn!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Device(format!("failed to build output stream: {e}")))?;
        stream
            .play()
            .map_err(|e| Error::Device(format!("failed to start output stream: {e}")))?;

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = format.sample_rate,
            channels,
            "output stream started"
        );

        Ok(Self {
            stream: Some(stream),
            producer,
            sampler,
            sample_rate: format.sample_rate,
            pending: Vec::new(),
        })
    }

    fn push(&mut self, mut value: f32) -> Result<()> {
        loop {
            match self.producer.push(value) {
                Ok(()) => return Ok(()),
                Err(PushError::Full(rejected)) => {
                    if self.producer.is_abandoned() {
                        return Err(Error::Device("output stream stopped".into()));
                    }
                    value = rejected;
                    thread::sleep(BACKOFF);
                }
            }
        }
    }

    /// Wait for the callback to play out what is already queued.
    fn drain(&self) {
        let capacity = self.producer.buffer().capacity();
        let queued = capacity - self.producer.slots();
        let budget = Duration::from_secs_f64(queued as f64 / f64::from(self.sample_rate))
            + Duration::from_millis(250);
        let deadline = Instant::now() + budget;

        while self.producer.slots() < capacity && !self.producer.is_abandoned() {
            if Instant::now() >= deadline {
                warn!(
                    queued = capacity - self.producer.slots(),
                    "output stream did not drain in time"
                );
                break;
            }
            thread::sleep(BACKOFF);
        }
    }
}

/// Audio-thread side: mono from the ring to every channel, silence on underrun.
fn render_callback(
    mut consumer: Consumer<f32>,
    channels: usize,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [f32], _| {
        for frame in data.chunks_mut(channels) {
            let sample = consumer.pop().unwrap_or(0.0);
            frame.fill(sample);
        }
    }
}

impl OutputSink for DeviceSink {
    fn write(&mut self, frames: &[u8]) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::Device("write to a closed output stream".into()));
        }

        let width = self.sampler.bytes_per_sample();
        self.pending.extend_from_slice(frames);
        let whole = self.pending.len() - self.pending.len() % width;
        let decoded: Vec<f32> = self.pending[..whole]
            .chunks_exact(width)
            .map(|frame| self.sampler.decode(frame))
            .collect();
        self.pending.drain(..whole);

        for value in decoded {
            self.push(value)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };

        self.drain();
        let paused = stream.pause();
        drop(stream);
        info!("output stream closed");

        paused.map_err(|e| Error::Device(format!("failed to pause output stream: {e}")))
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
