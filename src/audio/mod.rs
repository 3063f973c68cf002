use anyhow::{Context, Result};
use rodio::Source;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Seam between the playback state machine and the actual audio
/// output. Exactly one engine is live at a time; loading a new track
/// replaces the old sink wholesale, so no stale playback survives a
/// track change.
pub trait AudioEngine {
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_paused(&self) -> bool;
    fn current_track(&self) -> Option<&Path>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn output_name(&self) -> Option<String>;
    fn is_finished(&self) -> bool;
}

pub struct RodioAudioEngine {
    stream: OutputStream,
    sink: Sink,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
    volume: f32,
}

impl RodioAudioEngine {
    pub fn new() -> Result<Self> {
        let (stream, sink) = Self::open_output_stream()?;
        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
            volume: 1.0,
        })
    }

    fn open_output_stream() -> Result<(OutputStream, Sink)> {
        let mut stream = with_silenced_stderr(|| {
            match OutputStreamBuilder::from_default_device()
                .context("failed to open default system output stream")
                .and_then(|builder| {
                    builder
                        .with_error_callback(|_| {})
                        .open_stream_or_fallback()
                        .context("failed to start default output stream")
                }) {
                Ok(stream) => Ok(stream),
                Err(default_err) => {
                    let host = rodio::cpal::default_host();
                    let mut candidates: Vec<String> = host
                        .output_devices()
                        .ok()
                        .into_iter()
                        .flatten()
                        .filter_map(|device| device.name().ok())
                        .collect();
                    candidates.sort_by_cached_key(|name| {
                        let lower = name.to_ascii_lowercase();
                        let rank = if lower.contains("pulse") {
                            0_u8
                        } else if lower.contains("pipewire") {
                            1_u8
                        } else if lower.contains("default") {
                            2_u8
                        } else {
                            3_u8
                        };
                        (rank, lower)
                    });
                    candidates.dedup();

                    let mut started: Option<OutputStream> = None;
                    for candidate in candidates {
                        let device = match host
                            .output_devices()
                            .ok()
                            .into_iter()
                            .flatten()
                            .find(|entry| entry.name().ok().as_deref() == Some(candidate.as_str()))
                        {
                            Some(device) => device,
                            None => continue,
                        };
                        let opened = OutputStreamBuilder::from_device(device)
                            .context("failed to open fallback output device")
                            .and_then(|builder| {
                                builder
                                    .with_error_callback(|_| {})
                                    .open_stream_or_fallback()
                                    .context("failed to start fallback output stream")
                            });
                        if let Ok(stream) = opened {
                            started = Some(stream);
                            break;
                        }
                    }

                    started.with_context(|| {
                        format!(
                            "unable to start any audio output stream after default failed: {default_err:#}"
                        )
                    })
                }
            }
        })?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        Ok((stream, sink))
    }
}

impl AudioEngine for RodioAudioEngine {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());

        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.track_duration = source.total_duration();
        self.sink.append(source);
        self.sink.set_volume(self.volume);
        self.current = Some(path.to_path_buf());
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.current = None;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }
        self.sink
            .try_seek(position)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))?;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn output_name(&self) -> Option<String> {
        self.stream.config().channel_count().checked_sub(0)?;
        Some(String::from("System default output (CPAL)"))
    }

    fn is_finished(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

/// Fallback engine for machines without a usable output device. It
/// keeps a logical clock so time, progress and auto-advance all still
/// behave.
pub struct NullAudioEngine {
    paused: bool,
    current: Option<PathBuf>,
    volume: f32,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self {
            paused: false,
            current: None,
            volume: 1.0,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
        }
    }

    fn estimate_duration(path: &Path) -> Option<Duration> {
        let file = File::open(path).ok()?;
        let source = Decoder::try_from(file).ok()?;
        source
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }
}

impl Default for NullAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for NullAudioEngine {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.paused = false;
        self.current = Some(path.to_path_buf());
        self.started_at = Some(Instant::now());
        self.position_offset = Duration::ZERO;
        self.track_duration = Self::estimate_duration(path);
        Ok(())
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn resume(&mut self) {
        if self.current.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.paused = false;
    }

    fn stop(&mut self) {
        self.current = None;
        self.paused = false;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("Null audio engine"))
    }

    fn is_finished(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.current.is_some() && !self.paused && self.current_position() >= duration
    }
}
