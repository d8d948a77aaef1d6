use super::OutputSink;
use crate::error::{Error, Result};

/// Collects frames in memory. Used for tests and offline rendering.
#[derive(Debug, Default)]
pub struct MemorySink {
    bytes: Vec<u8>,
    writes: usize,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of `write` calls, one per chunk.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, frames: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::Device("write to a closed sink".into()));
        }
        self.bytes.extend_from_slice(frames);
        self.writes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
