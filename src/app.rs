use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::catalog;
use crate::player::{PlayerCore, VOLUME_STEP};
use crate::ui;
use crate::visualizer::Visualizer;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::Path;
use std::time::{Duration, Instant};

pub fn run(sounds_dir: &Path) -> Result<()> {
    let tracks = catalog::scan(sounds_dir);
    let mut core = PlayerCore::new(tracks);
    let mut visualizer = Visualizer::new();

    let mut audio: Box<dyn AudioEngine> = match RodioAudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(_) => Box::new(NullAudioEngine::new()),
    };

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut last_draw = Instant::now();
    let mut phase = 0_u64;
    let mut playlist_area = ratatui::prelude::Rect::default();

    let result: Result<()> = loop {
        pump_media_events(&mut core, &mut *audio);

        if visualizer.tick(
            core.playing && core.current.is_some(),
            f64::from(core.effective_volume()),
        ) {
            core.dirty = true;
        }

        if core.dirty || last_draw.elapsed() > Duration::from_millis(250) {
            phase = phase.wrapping_add(1);
            terminal.draw(|frame| {
                playlist_area = ui::playlist_rect(frame.area());
                ui::draw(frame, &core, &visualizer, phase);
            })?;
            core.dirty = false;
            last_draw = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        match event::read()? {
            Event::Mouse(mouse) => handle_mouse(&mut core, mouse, playlist_area),
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if should_quit(key) {
                    break Ok(());
                }
                handle_key(&mut core, &mut *audio, key);
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
        || (matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn handle_key(core: &mut PlayerCore, audio: &mut dyn AudioEngine, key: KeyEvent) {
    if core.show_playlist {
        match key.code {
            KeyCode::Esc | KeyCode::Char('l') => core.close_playlist(),
            KeyCode::Down => core.playlist_cursor_next(),
            KeyCode::Up => core.playlist_cursor_prev(),
            KeyCode::Enter => {
                if let Some(path) = core.activate_playlist_cursor() {
                    load_current_track(core, audio, &path);
                }
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char(' ') => toggle_play(core, audio),
        KeyCode::Right => {
            if let Some(path) = core.next_track() {
                load_current_track(core, audio, &path);
            }
        }
        KeyCode::Left => {
            if let Some(path) = core.prev_track() {
                load_current_track(core, audio, &path);
            }
        }
        KeyCode::Up => {
            core.nudge_volume(VOLUME_STEP);
            apply_volume(core, audio);
        }
        KeyCode::Down => {
            core.nudge_volume(-VOLUME_STEP);
            apply_volume(core, audio);
        }
        KeyCode::Char('m') => {
            core.toggle_mute();
            apply_volume(core, audio);
        }
        KeyCode::Char('r') => core.toggle_repeat(),
        KeyCode::Char('s') => core.toggle_shuffle(),
        KeyCode::Char('l') => core.toggle_playlist(),
        KeyCode::Char(digit) if digit.is_ascii_digit() => {
            let percent = f64::from(digit.to_digit(10).unwrap_or(0)) * 10.0;
            seek(core, audio, percent);
        }
        _ => {}
    }
}

fn handle_mouse(core: &mut PlayerCore, mouse: MouseEvent, playlist_area: ratatui::prelude::Rect) {
    if !core.show_playlist {
        return;
    }
    let inside = point_in_rect(mouse.column, mouse.row, playlist_area);
    match mouse.kind {
        MouseEventKind::ScrollDown if inside => core.playlist_cursor_next(),
        MouseEventKind::ScrollUp if inside => core.playlist_cursor_prev(),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: ratatui::prelude::Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn toggle_play(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    core.toggle_play();
    if core.playing {
        if audio.current_track().is_some() {
            audio.resume();
        } else if let Some(path) = core.current_path().map(Path::to_path_buf) {
            load_current_track(core, audio, &path);
        }
    } else {
        audio.pause();
    }
}

/// Swap the media source. Playback start failures are swallowed and
/// the requested logical state stands (optimistic state policy); the
/// engine is cleared on failure so a dead sink never looks finished.
fn load_current_track(core: &mut PlayerCore, audio: &mut dyn AudioEngine, path: &Path) {
    if audio.play(path).is_err() {
        audio.stop();
        return;
    }

    apply_volume(core, audio);

    if let (Some(id), Some(duration)) = (core.current_track().map(|track| track.id), audio.duration())
    {
        core.on_metadata_loaded(id, duration.as_secs_f64());
    }

    if !core.playing {
        audio.pause();
    }
}

fn apply_volume(core: &PlayerCore, audio: &mut dyn AudioEngine) {
    audio.set_volume(core.effective_volume());
}

fn seek(core: &mut PlayerCore, audio: &mut dyn AudioEngine, percent: f64) {
    if let Some(target) = core.seek_percent(percent) {
        // Seek failures are best-effort too.
        let _ = audio.seek_to(Duration::from_secs_f64(target));
    }
}

/// Bridge the engine's asynchronous side back into the state machine:
/// elapsed-time updates while playing, and end-of-track auto-advance.
fn pump_media_events(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if audio.current_track().is_none() {
        return;
    }

    if audio.is_finished() {
        match core.on_track_ended() {
            Some(path) => load_current_track(core, audio, &path),
            None => audio.stop(),
        }
        return;
    }

    if core.playing
        && !audio.is_paused()
        && let Some(position) = audio.position()
    {
        core.on_time_update(position.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Game, Track};
    use anyhow::anyhow;
    use std::path::PathBuf;

    fn catalog(len: usize) -> Vec<Track> {
        (0..len)
            .map(|id| {
                Track::new(
                    id,
                    format!("Track {id}"),
                    Game::HollowKnight,
                    PathBuf::from(format!("{id:02}.mp3")),
                )
            })
            .collect()
    }

    struct TestAudioEngine {
        paused: bool,
        current: Option<PathBuf>,
        finished: bool,
        played: Vec<PathBuf>,
        stopped: bool,
        volume: f32,
        duration: Option<Duration>,
        position: Option<Duration>,
        fail_play: bool,
    }

    impl TestAudioEngine {
        fn new() -> Self {
            Self {
                paused: false,
                current: None,
                finished: false,
                played: Vec::new(),
                stopped: false,
                volume: 1.0,
                duration: None,
                position: None,
                fail_play: false,
            }
        }

        fn finished_with_current(path: &str) -> Self {
            Self {
                current: Some(PathBuf::from(path)),
                finished: true,
                ..Self::new()
            }
        }
    }

    impl AudioEngine for TestAudioEngine {
        fn play(&mut self, path: &Path) -> Result<()> {
            if self.fail_play {
                return Err(anyhow!("device refused"));
            }
            self.current = Some(path.to_path_buf());
            self.finished = false;
            self.paused = false;
            self.played.push(path.to_path_buf());
            Ok(())
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn stop(&mut self) {
            self.stopped = true;
            self.current = None;
            self.finished = false;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn current_track(&self) -> Option<&Path> {
            self.current.as_deref()
        }

        fn position(&self) -> Option<Duration> {
            self.position
        }

        fn duration(&self) -> Option<Duration> {
            self.duration
        }

        fn seek_to(&mut self, position: Duration) -> Result<()> {
            self.position = Some(position);
            Ok(())
        }

        fn volume(&self) -> f32 {
            self.volume
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }

        fn output_name(&self) -> Option<String> {
            Some(String::from("test"))
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    #[test]
    fn auto_advance_plays_next_track_when_finished() {
        let mut core = PlayerCore::new(catalog(2));
        core.playing = true;
        let mut audio = TestAudioEngine::finished_with_current("00.mp3");

        pump_media_events(&mut core, &mut audio);

        assert_eq!(audio.played, vec![PathBuf::from("01.mp3")]);
        assert_eq!(core.current, Some(1));
    }

    #[test]
    fn auto_advance_at_queue_end_stops_engine_but_not_logical_state() {
        let mut core = PlayerCore::new(catalog(1));
        core.playing = true;
        let mut audio = TestAudioEngine::finished_with_current("00.mp3");

        pump_media_events(&mut core, &mut audio);

        assert!(audio.stopped);
        assert!(core.playing, "requested play state survives the edge");
        assert_eq!(core.current, Some(0));
    }

    #[test]
    fn load_applies_volume_and_pauses_when_logically_paused() {
        let mut core = PlayerCore::new(catalog(1));
        core.set_volume(50);
        let mut audio = TestAudioEngine::new();

        load_current_track(&mut core, &mut audio, &PathBuf::from("00.mp3"));

        assert!(audio.paused, "paused logical state pauses the fresh sink");
        assert!((audio.volume - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn load_records_decoded_duration_as_metadata() {
        let mut core = PlayerCore::new(catalog(1));
        let mut audio = TestAudioEngine::new();
        audio.duration = Some(Duration::from_secs(90));

        load_current_track(&mut core, &mut audio, &PathBuf::from("00.mp3"));

        assert_eq!(core.tracks[0].duration_seconds, Some(90.0));
    }

    #[test]
    fn failed_play_keeps_optimistic_state_and_clears_engine() {
        let mut core = PlayerCore::new(catalog(1));
        core.toggle_play();
        let mut audio = TestAudioEngine::new();
        audio.fail_play = true;

        load_current_track(&mut core, &mut audio, &PathBuf::from("00.mp3"));

        assert!(core.playing, "logical play state stands after a failure");
        assert!(audio.stopped, "engine is cleared so it never reports finished");
        assert_eq!(core.status, "Playing", "media failures never reach the status line");
    }

    #[test]
    fn toggle_play_loads_current_track_on_first_press() {
        let mut core = PlayerCore::new(catalog(2));
        let mut audio = TestAudioEngine::new();

        toggle_play(&mut core, &mut audio);

        assert!(core.playing);
        assert_eq!(audio.played, vec![PathBuf::from("00.mp3")]);
    }

    #[test]
    fn toggle_play_pauses_and_resumes_a_loaded_track() {
        let mut core = PlayerCore::new(catalog(1));
        let mut audio = TestAudioEngine::new();

        toggle_play(&mut core, &mut audio);
        toggle_play(&mut core, &mut audio);
        assert!(audio.paused);

        toggle_play(&mut core, &mut audio);
        assert!(!audio.paused);
        assert_eq!(audio.played.len(), 1, "resume does not reload the source");
    }

    #[test]
    fn time_updates_flow_into_progress() {
        let mut core = PlayerCore::new(catalog(1));
        core.playing = true;
        core.on_metadata_loaded(0, 100.0);
        let mut audio = TestAudioEngine::new();
        audio.current = Some(PathBuf::from("00.mp3"));
        audio.position = Some(Duration::from_secs(25));

        pump_media_events(&mut core, &mut audio);

        assert!((core.progress_percent - 25.0).abs() < 1e-9);
        assert!((core.current_time - 25.0).abs() < 1e-9);
    }

    #[test]
    fn seek_forwards_target_to_engine() {
        let mut core = PlayerCore::new(catalog(1));
        core.on_metadata_loaded(0, 200.0);
        let mut audio = TestAudioEngine::new();
        audio.current = Some(PathBuf::from("00.mp3"));

        seek(&mut core, &mut audio, 50.0);

        assert_eq!(audio.position, Some(Duration::from_secs(100)));
        assert!((core.progress_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn seek_without_duration_is_a_no_op() {
        let mut core = PlayerCore::new(catalog(1));
        let mut audio = TestAudioEngine::new();

        seek(&mut core, &mut audio, 50.0);

        assert_eq!(audio.position, None);
        assert_eq!(core.current_time, 0.0);
    }

    #[test]
    fn playlist_keys_navigate_and_select() {
        let mut core = PlayerCore::new(catalog(3));
        let mut audio = TestAudioEngine::new();
        core.toggle_playlist();

        handle_key(&mut core, &mut audio, KeyEvent::from(KeyCode::Down));
        handle_key(&mut core, &mut audio, KeyEvent::from(KeyCode::Down));
        handle_key(&mut core, &mut audio, KeyEvent::from(KeyCode::Enter));

        assert_eq!(core.current, Some(2));
        assert!(!core.show_playlist, "selection closes the panel");
        assert_eq!(audio.played, vec![PathBuf::from("02.mp3")]);
    }

    #[test]
    fn arrow_keys_change_volume_and_up_unmutes() {
        let mut core = PlayerCore::new(catalog(1));
        let mut audio = TestAudioEngine::new();
        core.toggle_mute();

        handle_key(&mut core, &mut audio, KeyEvent::from(KeyCode::Up));

        assert!(!core.muted);
        assert_eq!(core.volume, 80);
        assert!((audio.volume - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn digit_keys_seek_by_tens_of_percent() {
        let mut core = PlayerCore::new(catalog(1));
        core.on_metadata_loaded(0, 100.0);
        let mut audio = TestAudioEngine::new();
        audio.current = Some(PathBuf::from("00.mp3"));

        handle_key(&mut core, &mut audio, KeyEvent::from(KeyCode::Char('7')));

        assert_eq!(audio.position, Some(Duration::from_secs(70)));
    }

    #[test]
    fn mouse_scroll_moves_playlist_cursor_inside_the_panel() {
        let mut core = PlayerCore::new(catalog(3));
        core.toggle_playlist();
        let rect = ratatui::prelude::Rect::new(60, 0, 40, 30);

        let scroll = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 70,
            row: 5,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut core, scroll, rect);
        assert_eq!(core.playlist_cursor, 1);

        let outside = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 5,
            row: 5,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut core, outside, rect);
        assert_eq!(core.playlist_cursor, 1);
    }
}
