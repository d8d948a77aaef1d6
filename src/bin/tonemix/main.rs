//! tonemix - play demo songs or PCM files
//!
//! Run with: cargo run --features device -- play melody
//! Or render offline: cargo run -- --out melody.wav play melody

mod songs;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tonemix::{
    player::{PlaybackConfig, Player, WavFileSink},
    tracks::Track,
    waves::{Amplitude, PcmFile, Waveform},
    DEFAULT_SAMPLE_RATE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use songs::Song;

#[derive(Parser)]
#[command(name = "tonemix")]
#[command(about = "Mix tones and PCM files into an audio stream")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output bit depth (8, 16 or 24). Defaults to 8, or the file's own width
    #[arg(long, global = true)]
    bit_depth: Option<u16>,

    /// Seconds of audio per chunk
    #[arg(long, global = true, default_value_t = PlaybackConfig::DEFAULT_CHUNK_DURATION)]
    chunk: f64,

    /// Master volume
    #[arg(long, global = true, default_value_t = 1.0)]
    volume: f32,

    /// Render into a WAV file instead of the output device
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Scale file samples to [-1, 1] instead of raw levels
    #[arg(long, global = true)]
    normalize_files: bool,

    /// Log filter, e.g. "debug" or "tonemix=trace". RUST_LOG wins when set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Play a built-in song
    Play {
        #[arg(value_enum)]
        song: Song,

        /// Sample rate to synthesize at
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
    },
    /// Play a PCM WAV file
    File {
        path: PathBuf,

        /// Start offset in seconds
        #[arg(long, default_value_t = 0.0)]
        at: f64,
    },
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cli.log_level))
                .wrap_err_with(|| format!("invalid log level {:?}", cli.log_level))?,
        )
        .init();

    let (tracks, native_bits) = load(&cli)?;
    let config = PlaybackConfig::new()
        .bit_depth(cli.bit_depth.or(native_bits).unwrap_or(8))
        .chunk_duration(cli.chunk)
        .volume(cli.volume);

    let player = Player::new(tracks, config).wrap_err("failed to prepare playback")?;
    info!(
        duration = player.track().duration(),
        waveforms = player.track().len(),
        "track ready"
    );

    let report = match &cli.out {
        Some(path) => player
            .play(|format| WavFileSink::create(path, format))
            .wrap_err_with(|| format!("failed to render {}", path.display()))?,
        None => play_on_device(&player)?,
    };

    info!(chunks = report.chunks, bytes = report.bytes, "done");
    Ok(())
}

/// Tracks to play, plus the bit width of a file source if there is one.
fn load(cli: &Cli) -> EyreResult<(Vec<Track>, Option<u16>)> {
    match &cli.command {
        Command::Play { song, sample_rate } => {
            let tracks = song
                .tracks(*sample_rate)
                .wrap_err_with(|| format!("failed to build song {song:?}"))?;
            Ok((tracks, None))
        }
        Command::File { path, at } => {
            let file = open_file(path, cli.normalize_files)?;
            let bits = file.bit_width();
            let mut track = Track::new(path.display().to_string(), file.sample_rate());
            track
                .add_waveform(*at, file)
                .wrap_err("failed to place file on the track")?;
            Ok((vec![track], Some(bits)))
        }
    }
}

fn open_file(path: &Path, normalize: bool) -> EyreResult<PcmFile> {
    let amplitude = if normalize {
        Amplitude::Normalized
    } else {
        Amplitude::Raw
    };
    let file = PcmFile::open(path)
        .wrap_err_with(|| format!("failed to open {}", path.display()))?
        .with_amplitude(amplitude);
    Ok(file)
}

#[cfg(feature = "device")]
fn play_on_device(player: &Player) -> EyreResult<tonemix::player::PlaybackReport> {
    use tonemix::player::DeviceSink;

    player
        .play(DeviceSink::open)
        .wrap_err("playback failed")
}

#[cfg(not(feature = "device"))]
fn play_on_device(player: &Player) -> EyreResult<tonemix::player::PlaybackReport> {
    let format = player.format();
    Err(color_eyre::eyre::eyre!(
        "built without the `device` feature; pass --out to render {} Hz {}-bit audio to a file",
        format.sample_rate,
        format.bit_depth
    ))
}
