use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::time::{Duration, Instant};

pub const BAR_COUNT: usize = 32;
const PLAYING_TICK: Duration = Duration::from_millis(120);
const DECAY_TICK: Duration = Duration::from_millis(50);
const FLOOR: f64 = 0.05;

/// Decorative bar animation. Not audio-reactive: while playing each
/// bar redraws from a weighted random range scaled by volume, and
/// while paused every bar decays toward a small floor. Heights stay in
/// [0, 1] and never reach zero.
pub struct Visualizer {
    bars: Vec<f64>,
    last_tick: Instant,
    rng: SmallRng,
}

impl Visualizer {
    pub fn new() -> Self {
        let mut rng = SmallRng::from_os_rng();
        let bars = (0..BAR_COUNT)
            .map(|_| rng.random_range(0.2..0.8))
            .collect();
        Self {
            bars,
            last_tick: Instant::now(),
            rng,
        }
    }

    pub fn bars(&self) -> &[f64] {
        &self.bars
    }

    /// Advance the animation if its interval elapsed. Returns true
    /// when the bars changed so the caller can schedule a redraw.
    pub fn tick(&mut self, playing: bool, volume_fraction: f64) -> bool {
        let interval = if playing { PLAYING_TICK } else { DECAY_TICK };
        if self.last_tick.elapsed() < interval {
            return false;
        }
        self.last_tick = Instant::now();

        if playing {
            self.redraw(volume_fraction.clamp(0.0, 1.0));
        } else {
            self.decay();
        }
        true
    }

    fn redraw(&mut self, volume_fraction: f64) {
        for bar in &mut self.bars {
            // 10% spikes, 20% medium, the rest a low baseline.
            let roll: f64 = self.rng.random();
            let height = if roll < 0.1 {
                self.rng.random_range(0.2..1.0)
            } else if roll < 0.3 {
                self.rng.random_range(0.3..0.8)
            } else {
                self.rng.random_range(0.1..0.4)
            };
            *bar = (height * volume_fraction).clamp(FLOOR, 1.0);
        }
    }

    fn decay(&mut self) {
        for bar in &mut self.bars {
            *bar = (*bar * 0.95).max(FLOOR);
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
