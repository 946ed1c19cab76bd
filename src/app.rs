use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::catalog::ManifestSource;
use crate::core::ReplayCore;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct AppOptions {
    pub manifest: ManifestSource,
}

pub fn run(options: AppOptions) -> Result<()> {
    let mut core = ReplayCore::new(options.manifest);
    core.load_catalog();

    let mut audio: Box<dyn AudioEngine> = match RodioAudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(_) => Box::new(NullAudioEngine::new()),
    };

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut last_tick = Instant::now();

    let result: Result<()> = loop {
        maybe_auto_advance_track(&mut core, &mut *audio);

        if core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| crate::ui::draw(frame, &core, &*audio))?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Down => core.select_next(),
            KeyCode::Up => core.select_prev(),
            KeyCode::Enter => {
                let path = core.activate_selected();
                start_playback(&mut core, &mut *audio, path);
            }
            KeyCode::Char(' ') => {
                if audio.current_track().is_none() {
                    continue;
                }
                if audio.is_paused() {
                    audio.resume();
                    core.status = String::from("Resumed");
                } else {
                    audio.pause();
                    core.status = String::from("Paused");
                }
                core.dirty = true;
            }
            KeyCode::Char('n') => {
                let path = core.skip_to_next();
                start_playback(&mut core, &mut *audio, path);
            }
            KeyCode::Char('r') => {
                core.cycle_repeat_target();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (audio.volume() + 0.05).clamp(0.0, 2.0);
                audio.set_volume(next);
                core.status = format!("Volume: {}%", (next * 100.0).round() as u16);
                core.dirty = true;
            }
            KeyCode::Char('-') => {
                let next = (audio.volume() - 0.05).clamp(0.0, 2.0);
                audio.set_volume(next);
                core.status = format!("Volume: {}%", (next * 100.0).round() as u16);
                core.dirty = true;
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Completion handling: when the engine drains, feed the event back into the
/// sequencer and restart whatever it decided on from position zero.
fn maybe_auto_advance_track(core: &mut ReplayCore, audio: &mut dyn AudioEngine) {
    if audio.current_track().is_none() || audio.is_paused() || !audio.is_finished() {
        return;
    }

    let Some(active) = core.sequencer.active_index() else {
        audio.stop();
        return;
    };

    match core.handle_track_finished(active) {
        Some(path) => {
            if let Err(err) = audio.play(&path) {
                core.status = format!("playback error: {err:#}");
                core.dirty = true;
            }
        }
        None => {
            audio.stop();
            core.dirty = true;
        }
    }
}

fn start_playback(core: &mut ReplayCore, audio: &mut dyn AudioEngine, path: Option<PathBuf>) {
    let Some(path) = path else {
        return;
    };
    if let Err(err) = audio.play(&path) {
        core.status = format!("playback error: {err:#}");
        core.dirty = true;
    }
}
