use crate::catalog::{CatalogLoader, LoadStatus, ManifestSource};
use crate::model::{RepeatTarget, Track};
use crate::sequencer::{Decision, Sequencer};
use std::path::PathBuf;

/// Pure application state driven by the event loop: catalog, sequencer,
/// list selection and the one-line status message.
#[derive(Debug)]
pub struct ReplayCore {
    pub loader: CatalogLoader,
    pub sequencer: Sequencer,
    pub selected: usize,
    pub status: String,
    pub dirty: bool,
}

impl ReplayCore {
    pub fn new(source: ManifestSource) -> Self {
        Self {
            loader: CatalogLoader::new(source),
            sequencer: Sequencer::new(0),
            selected: 0,
            status: String::from("Ready"),
            dirty: true,
        }
    }

    /// One-shot startup load. The loader's status guard makes repeat calls
    /// no-ops, so the sequencer is resized only when the catalog changes.
    pub fn load_catalog(&mut self) {
        let already_loaded = self.loader.status() != &LoadStatus::Idle;
        self.loader.load();
        if already_loaded {
            return;
        }

        self.sequencer.set_track_count(self.loader.tracks().len());
        self.selected = 0;
        match self.loader.status() {
            LoadStatus::Succeeded => {
                self.set_status(&format!("Loaded {} tracks", self.loader.tracks().len()));
            }
            LoadStatus::Failed(message) => {
                let message = message.clone();
                self.set_status(&message);
            }
            _ => {}
        }
    }

    pub fn tracks(&self) -> &[Track] {
        self.loader.tracks()
    }

    pub fn catalog_ready(&self) -> bool {
        self.loader.status() == &LoadStatus::Succeeded
    }

    pub fn title_for(&self, index: usize) -> Option<&str> {
        self.tracks().get(index).map(|track| track.title.as_str())
    }

    pub fn select_next(&mut self) {
        if self.tracks().is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.tracks().len() - 1);
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.dirty = true;
    }

    /// User-initiated play of the selected track. Returns the media path the
    /// engine should start from zero.
    pub fn activate_selected(&mut self) -> Option<PathBuf> {
        self.activate(self.selected)
    }

    pub fn activate(&mut self, index: usize) -> Option<PathBuf> {
        if !self.catalog_ready() {
            self.set_status("No catalog loaded");
            return None;
        }
        if !self.sequencer.activate(index) {
            self.set_status("Nothing to play");
            return None;
        }

        let title = self.title_for(index).unwrap_or("?").to_string();
        self.set_status(&format!(
            "Playing {title} ({})",
            self.sequencer.repeat_target().label()
        ));
        self.loader.track_path(index)
    }

    /// Manual skip: supersedes the active track and starts the next one at
    /// play count 1, wrapping past the end of the catalog.
    pub fn skip_to_next(&mut self) -> Option<PathBuf> {
        let count = self.tracks().len();
        if count == 0 {
            self.set_status("Catalog is empty");
            return None;
        }
        let next = self
            .sequencer
            .active_index()
            .map_or(0, |active| (active + 1) % count);
        self.activate(next)
    }

    /// Completion event for track `index`. Returns the path the engine should
    /// restart from zero, for both the replay and the advance case. Stale
    /// events return None and change nothing.
    pub fn handle_track_finished(&mut self, index: usize) -> Option<PathBuf> {
        let decision = self.sequencer.on_track_finished(index)?;
        let target = self.sequencer.repeat_target();
        let next_index = match decision {
            Decision::Replay { index, play_count } => {
                let title = self.title_for(index).unwrap_or("?").to_string();
                self.set_status(&format!(
                    "Replaying {title} (play {play_count}/{})",
                    target.label()
                ));
                index
            }
            Decision::Advance { index } => {
                let title = self.title_for(index).unwrap_or("?").to_string();
                self.set_status(&format!("Up next: {title}"));
                index
            }
        };
        self.loader.track_path(next_index)
    }

    pub fn cycle_repeat_target(&mut self) -> RepeatTarget {
        let target = self.sequencer.cycle_repeat_target();
        self.set_status(&format!("Repeat target: {}", target.label()));
        target
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}
