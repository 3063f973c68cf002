use std::path::PathBuf;

/// Every bundled track is credited to the soundtrack composer.
pub const ARTIST: &str = "Christopher Larkin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Game {
    HollowKnight,
    Silksong,
}

impl Game {
    pub fn label(self) -> &'static str {
        match self {
            Self::HollowKnight => "Hollow Knight",
            Self::Silksong => "Silksong",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Stable identity, assigned by sorted discovery order.
    pub id: usize,
    pub title: String,
    pub artist: String,
    pub game: Game,
    pub path: PathBuf,
    /// Filled once the audio backend has decoded the track.
    pub duration_seconds: Option<f64>,
}

impl Track {
    pub fn new(id: usize, title: String, game: Game, path: PathBuf) -> Self {
        Self {
            id,
            title,
            artist: String::from(ARTIST),
            game,
            path,
            duration_seconds: None,
        }
    }
}
