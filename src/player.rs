use crate::model::Track;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

pub const DEFAULT_VOLUME: u8 = 75;
pub const VOLUME_STEP: i16 = 5;

/// The playback state machine. It owns every piece of player state and
/// mutates it only through explicit operations; the audio backend is
/// driven by the event loop using the paths these operations return.
#[derive(Debug)]
pub struct PlayerCore {
    pub tracks: Vec<Track>,
    pub current: Option<usize>,
    pub playing: bool,
    pub volume: u8,
    pub muted: bool,
    pub repeat: bool,
    pub shuffle: bool,
    /// Permutation of track indices with the current track first.
    /// Empty while shuffle is off.
    pub shuffle_order: Vec<usize>,
    pub progress_percent: f64,
    pub current_time: f64,
    pub show_playlist: bool,
    pub playlist_cursor: usize,
    pub status: String,
    pub dirty: bool,
    rng: SmallRng,
}

impl PlayerCore {
    pub fn new(tracks: Vec<Track>) -> Self {
        let current = (!tracks.is_empty()).then_some(0);
        Self {
            tracks,
            current,
            playing: false,
            volume: DEFAULT_VOLUME,
            muted: false,
            repeat: false,
            shuffle: false,
            shuffle_order: Vec::new(),
            progress_percent: 0.0,
            current_time: 0.0,
            show_playlist: false,
            playlist_cursor: current.unwrap_or(0),
            status: String::from("Ready"),
            dirty: true,
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current?)
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_track().map(|track| track.path.as_path())
    }

    /// Sink volume for the requested logical state: silence while
    /// muted, otherwise the stored volume as a fraction.
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.volume) / 100.0
        }
    }

    pub fn toggle_play(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.playing = !self.playing;
        self.set_status(if self.playing { "Playing" } else { "Paused" });
    }

    pub fn next_track(&mut self) -> Option<PathBuf> {
        let target = self.step(true)?;
        Some(self.jump_to(target))
    }

    pub fn prev_track(&mut self) -> Option<PathBuf> {
        let target = self.step(false)?;
        Some(self.jump_to(target))
    }

    /// A natural end of track advances exactly like a user skip. At
    /// the playlist edge without repeat this holds, and `playing` is
    /// deliberately left as last requested (optimistic state); the
    /// event loop tears the idle sink down.
    pub fn on_track_ended(&mut self) -> Option<PathBuf> {
        let next = self.next_track();
        if next.is_none() {
            self.set_status("Reached end of playlist");
        }
        next
    }

    pub fn select_track(&mut self, index: usize) -> Option<PathBuf> {
        if index >= self.tracks.len() {
            return None;
        }
        self.show_playlist = false;
        Some(self.jump_to(index))
    }

    pub fn set_volume(&mut self, volume: i16) {
        self.volume = volume.clamp(0, 100) as u8;
        if volume > 0 {
            self.muted = false;
        }
        self.set_status(&format!("Volume {}%", self.volume));
    }

    /// Arrow-key volume step. An increase clears mute, a decrease
    /// leaves it alone.
    pub fn nudge_volume(&mut self, delta: i16) {
        let next = (i16::from(self.volume) + delta).clamp(0, 100) as u8;
        self.volume = next;
        if delta > 0 {
            self.muted = false;
        }
        self.set_status(&format!("Volume {}%", self.volume));
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.set_status(if self.muted { "Muted" } else { "Unmuted" });
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
        self.set_status(if self.repeat { "Repeat on" } else { "Repeat off" });
    }

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        if self.shuffle {
            self.regenerate_shuffle_order();
        } else {
            self.shuffle_order.clear();
        }
        self.set_status(if self.shuffle {
            "Shuffle on"
        } else {
            "Shuffle off"
        });
    }

    /// Absolute seek by percent. Only effective once the current
    /// track's duration is known; returns the target time in seconds
    /// for the event loop to apply to the audio backend.
    pub fn seek_percent(&mut self, percent: f64) -> Option<f64> {
        let duration = self.current_track()?.duration_seconds?;
        if !(duration.is_finite()) || duration <= 0.0 {
            return None;
        }
        let percent = percent.clamp(0.0, 100.0);
        let target = percent / 100.0 * duration;
        self.current_time = target;
        self.progress_percent = percent;
        self.dirty = true;
        Some(target)
    }

    pub fn on_metadata_loaded(&mut self, id: usize, duration_seconds: f64) {
        if let Some(track) = self.tracks.iter_mut().find(|track| track.id == id) {
            track.duration_seconds = Some(duration_seconds);
            self.dirty = true;
        }
    }

    pub fn on_time_update(&mut self, seconds: f64) {
        self.current_time = seconds;
        if let Some(duration) = self.current_track().and_then(|track| track.duration_seconds)
            && duration > 0.0
        {
            self.progress_percent = (seconds / duration * 100.0).clamp(0.0, 100.0);
        }
        self.dirty = true;
    }

    pub fn toggle_playlist(&mut self) {
        self.show_playlist = !self.show_playlist;
        if self.show_playlist {
            self.playlist_cursor = self.current.unwrap_or(0);
        }
        self.dirty = true;
    }

    pub fn close_playlist(&mut self) {
        self.show_playlist = false;
        self.dirty = true;
    }

    pub fn playlist_cursor_next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.playlist_cursor = (self.playlist_cursor + 1).min(self.tracks.len() - 1);
        self.dirty = true;
    }

    pub fn playlist_cursor_prev(&mut self) {
        self.playlist_cursor = self.playlist_cursor.saturating_sub(1);
        self.dirty = true;
    }

    pub fn activate_playlist_cursor(&mut self) -> Option<PathBuf> {
        self.select_track(self.playlist_cursor)
    }

    /// Commit a track change: reset elapsed time and progress, and
    /// re-anchor the shuffle order at the new track while shuffle is
    /// on. Returns the path the event loop should load.
    fn jump_to(&mut self, index: usize) -> PathBuf {
        self.current = Some(index);
        self.current_time = 0.0;
        self.progress_percent = 0.0;
        if self.shuffle {
            self.regenerate_shuffle_order();
        }
        self.dirty = true;
        self.tracks[index].path.clone()
    }

    /// Pick the next/previous index under the shuffle and repeat
    /// rules: advance within the shuffle order when shuffle is on,
    /// wrap at either boundary only under repeat, otherwise hold.
    fn step(&mut self, forward: bool) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        let current = self.current?;

        if self.shuffle && !self.shuffle_order.is_empty() {
            let pos = self
                .shuffle_order
                .iter()
                .position(|index| *index == current)?;
            if forward {
                if pos + 1 < self.shuffle_order.len() {
                    return Some(self.shuffle_order[pos + 1]);
                }
                return self.repeat.then(|| self.shuffle_order[0]);
            }
            if pos > 0 {
                return Some(self.shuffle_order[pos - 1]);
            }
            return self
                .repeat
                .then(|| self.shuffle_order[self.shuffle_order.len() - 1]);
        }

        if forward {
            if current + 1 < self.tracks.len() {
                return Some(current + 1);
            }
            return self.repeat.then_some(0);
        }
        if current > 0 {
            return Some(current - 1);
        }
        self.repeat.then(|| self.tracks.len() - 1)
    }

    /// Unbiased Fisher-Yates over the non-current indices, with the
    /// current track pinned at the front.
    fn regenerate_shuffle_order(&mut self) {
        if self.tracks.is_empty() {
            self.shuffle_order.clear();
            return;
        }
        let current = self.current.unwrap_or(0);
        let mut rest: Vec<usize> = (0..self.tracks.len())
            .filter(|index| *index != current)
            .collect();
        rest.shuffle(&mut self.rng);

        self.shuffle_order.clear();
        self.shuffle_order.push(current);
        self.shuffle_order.extend(rest);
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}
