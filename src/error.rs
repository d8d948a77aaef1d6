//! Error types shared by every layer of the engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for everything the engine can fail at.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad construction arguments.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A sample range outside of `[0, num_samples]`.
    #[error("sample range {start}..{end} is out of bounds for a waveform of {len} samples")]
    Range { start: usize, end: usize, len: usize },

    /// A container header that failed validation, or a malformed body.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A bit depth the sampler has no quantization policy for.
    #[error("unsupported bit depth: {0} (supported: 8, 16, 24)")]
    UnsupportedFormat(u16),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a WAV file failed.
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    /// The output device could not be opened or driven.
    #[error("output device error: {0}")]
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("time offset must be non-negative, got {0}")]
    NegativeTime(f64),

    #[error("duration must be non-negative, got {0}")]
    NegativeDuration(f64),

    #[error("sample rate {actual} Hz does not match the track's {expected} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("{0} is not a valid note")]
    UnknownNote(String),

    #[error("source bit depth {source_bits} does not match output bit depth {output_bits}")]
    BitDepthMismatch { source_bits: u16, output_bits: u16 },

    #[error("chunk duration must be positive, got {0}")]
    InvalidChunkDuration(f64),

    #[error("a {chunk_duration} s chunk is not a whole number of frames at {sample_rate} Hz")]
    FractionalChunk { chunk_duration: f64, sample_rate: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("header field `{field}` at {offset}..{end} lies past the end of a {len} byte buffer")]
    Truncated {
        field: &'static str,
        offset: usize,
        end: usize,
        len: usize,
    },

    #[error("header field `{field}` is {actual}, expected {expected}")]
    FieldMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("header field `{0}` is not valid utf-8")]
    InvalidText(&'static str),

    #[error("header field `{0}` is not an integer field")]
    NotAnInteger(&'static str),

    #[error("unknown header field `{0}`")]
    UnknownField(String),

    #[error("data size {data_size} does not divide evenly by {bytes_per_sec} bytes per second")]
    UnevenDataSize { data_size: u64, bytes_per_sec: u64 },

    #[error("bit width {0} is not a whole number of bytes")]
    UnalignedBitWidth(u64),

    #[error("bit width {0} is wider than 64 bits")]
    BitWidthTooWide(u64),

    #[error("data chunk declares {declared} bytes but only {available} follow the header")]
    MissingData { declared: usize, available: usize },
}
