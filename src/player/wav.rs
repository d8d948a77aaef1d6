use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{OutputSink, SinkFormat};
use crate::{
    error::{Error, Result},
    sampler::Sampler,
};

/// Renders a session to a WAV file instead of a device.
///
/// Frames arrive already quantized; each one is decoded back to its integer
/// level and handed to hound, which writes the same bytes plus a header.
pub struct WavFileSink {
    path: PathBuf,
    sampler: Sampler,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    pending: Vec<u8>,
}

impl WavFileSink {
    pub fn create(path: impl AsRef<Path>, format: SinkFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sampler = Sampler::for_bit_depth(format.bit_depth)?;
        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bit_depth,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(&path, spec)?;
        info!(path = %path.display(), ?spec, "writing wav file");

        Ok(Self {
            path,
            sampler,
            writer: Some(writer),
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_sample(
        writer: &mut hound::WavWriter<BufWriter<File>>,
        sampler: Sampler,
        frame: &[u8],
    ) -> Result<()> {
        let level = sampler.read_frame(frame);
        // hound takes 8-bit samples as signed and re-biases them itself.
        let level = if sampler.bit_depth() == 8 { level - 128 } else { level };
        writer.write_sample(level as i32)?;
        Ok(())
    }
}

impl OutputSink for WavFileSink {
    fn write(&mut self, frames: &[u8]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::Device("write to a closed wav sink".into()));
        };

        let width = self.sampler.bytes_per_sample();
        // A chunk may not end on a frame boundary; carry the remainder.
        self.pending.extend_from_slice(frames);
        let whole = self.pending.len() - self.pending.len() % width;
        for frame in self.pending[..whole].chunks_exact(width) {
            Self::write_sample(writer, self.sampler, frame)?;
        }
        self.pending.drain(..whole);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            info!(path = %self.path.display(), "wav file finalized");
        }
        Ok(())
    }
}

impl Drop for WavFileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
