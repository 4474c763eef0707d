// Session - the interactive state machine
// AwaitingBuild -> Building -> Browsing <-> SearchInput
//
// Pure state: handlers return effects and the UI layer performs them
// (spawning the build or the player) and feeds completions back in.

use crate::catalog::Hierarchy;
use crate::playback::{self, PlayMode};
use crate::search::{SearchEngine, SearchOutcome};
use crate::selection::SelectionSet;
use crate::tree::{cids_under, project_all, Navigator};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    AwaitingBuild,
    Building,
    Browsing,
    SearchInput,
}

/// Logical user actions. Key bindings live in the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Expand,
    Collapse,
    ToggleSelect,
    PlayCurrent,
    PlaySelected,
    TogglePlayMode,
    StartSearch,
    SearchChar(char),
    SearchBackspace,
    ConfirmSearch,
    CancelSearch,
    FindNext,
    Rebuild,
    Quit,
}

/// Work the session wants done outside itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartBuild,
    /// Already ordered per the active play mode.
    Play(Vec<u64>),
    Notify(String),
    Quit,
}

/// Everything that only exists while a catalog is loaded.
#[derive(Debug, Clone)]
pub struct Browser {
    pub hierarchy: Hierarchy,
    pub navigator: Navigator,
    pub search: SearchEngine,
    pub selection: SelectionSet,
}

impl Browser {
    pub fn new(hierarchy: Hierarchy) -> Self {
        let navigator = Navigator::new(&hierarchy);
        Self {
            hierarchy,
            navigator,
            search: SearchEngine::new(),
            selection: SelectionSet::new(),
        }
    }
}

pub struct Session {
    mode: Mode,
    catalog_path: PathBuf,
    browser: Option<Browser>,
    build_error: Option<String>,
    search_input: String,
    play_mode: PlayMode,
    playing: bool,
    page_size: usize,
}

impl Session {
    /// Start a session against `catalog_path`. No catalog, or one that
    /// fails to load, leaves the session waiting for a build.
    pub fn open(catalog_path: impl Into<PathBuf>, play_mode: PlayMode) -> Self {
        let mut session = Self::empty(catalog_path.into(), play_mode);

        if session.catalog_path.exists() {
            session.load_catalog();
        } else {
            info!("No catalog at {}, waiting for build", session.catalog_path.display());
        }
        session
    }

    /// Start browsing an already decoded hierarchy.
    pub fn from_hierarchy(hierarchy: Hierarchy, catalog_path: impl Into<PathBuf>, play_mode: PlayMode) -> Self {
        let mut session = Self::empty(catalog_path.into(), play_mode);
        session.browser = Some(Browser::new(hierarchy));
        session.mode = Mode::Browsing;
        session
    }

    fn empty(catalog_path: PathBuf, play_mode: PlayMode) -> Self {
        Self {
            mode: Mode::AwaitingBuild,
            catalog_path,
            browser: None,
            build_error: None,
            search_input: String::new(),
            play_mode,
            playing: false,
            page_size: 10,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn browser(&self) -> Option<&Browser> {
        self.browser.as_ref()
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn build_error(&self) -> Option<&str> {
        self.build_error.as_deref()
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Rows per page for PageUp/PageDown; the UI sets this from the viewport.
    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows.max(1);
    }

    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        if action == Action::Quit {
            info!("Quit requested");
            return vec![Effect::Quit];
        }

        match self.mode {
            Mode::AwaitingBuild => match action {
                Action::Rebuild => self.start_build(),
                _ => Vec::new(),
            },
            // only quit gets through while the build runs
            Mode::Building => Vec::new(),
            Mode::Browsing => self.handle_browsing(action),
            Mode::SearchInput => self.handle_search_input(action),
        }
    }

    /// Completion of the external build step.
    pub fn on_build_finished(&mut self, result: Result<(), String>) {
        if self.mode != Mode::Building {
            warn!("Build completion arrived in {:?}, ignoring", self.mode);
            return;
        }

        match result {
            Ok(()) => self.load_catalog(),
            Err(reason) => {
                warn!("Build failed: {}", reason);
                self.browser = None;
                self.build_error = Some(reason);
                self.mode = Mode::AwaitingBuild;
            }
        }
    }

    /// Completion of the playback queue.
    pub fn on_playback_finished(&mut self) {
        self.playing = false;
    }

    fn load_catalog(&mut self) {
        match Hierarchy::load(&self.catalog_path) {
            Ok(hierarchy) => {
                self.browser = Some(Browser::new(hierarchy));
                self.build_error = None;
                self.mode = Mode::Browsing;
            }
            Err(e) => {
                warn!("Catalog unusable: {}", e);
                self.browser = None;
                self.build_error = Some(e.to_string());
                self.mode = Mode::AwaitingBuild;
            }
        }
    }

    fn start_build(&mut self) -> Vec<Effect> {
        if self.playing {
            return vec![Effect::Notify("playback in progress, rebuild later".to_string())];
        }
        info!("Entering build");
        self.mode = Mode::Building;
        vec![Effect::StartBuild]
    }

    fn handle_browsing(&mut self, action: Action) -> Vec<Effect> {
        if action == Action::Rebuild {
            return self.start_build();
        }
        if action == Action::TogglePlayMode {
            self.play_mode = self.play_mode.toggled();
            return vec![Effect::Notify(format!("play mode: {}", self.play_mode.label()))];
        }
        if action == Action::StartSearch {
            self.search_input.clear();
            self.mode = Mode::SearchInput;
            return Vec::new();
        }

        let page = self.page_size as isize;
        let Some(browser) = self.browser.as_mut() else {
            return Vec::new();
        };
        let Browser {
            hierarchy,
            navigator,
            search,
            selection,
        } = browser;

        match action {
            Action::MoveUp => navigator.move_by(-1),
            Action::MoveDown => navigator.move_by(1),
            Action::PageUp => navigator.move_by(-page),
            Action::PageDown => navigator.move_by(page),
            Action::Top => navigator.move_to_top(),
            Action::Bottom => navigator.move_to_bottom(),
            Action::Expand => {
                navigator.expand(hierarchy);
            }
            Action::Collapse => {
                navigator.collapse(hierarchy);
            }
            Action::ToggleSelect => {
                if let Some(node) = navigator.current() {
                    selection.toggle(node);
                }
            }
            Action::FindNext => {
                if search.find_next(hierarchy, navigator) == SearchOutcome::NotFound {
                    return vec![Effect::Notify("no more matches".to_string())];
                }
            }
            Action::PlayCurrent => {
                let cids = navigator
                    .current()
                    .map(|node| cids_under(hierarchy, node.id))
                    .unwrap_or_default();
                search.clear();
                return self.play(cids);
            }
            Action::PlaySelected => {
                if selection.is_empty() {
                    return vec![Effect::Notify("nothing selected".to_string())];
                }
                let cids = selection.ordered_by(&project_all(hierarchy));
                return self.play(cids);
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_search_input(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::SearchChar(c) => self.search_input.push(c),
            Action::SearchBackspace => {
                self.search_input.pop();
            }
            Action::CancelSearch => self.mode = Mode::Browsing,
            Action::ConfirmSearch => {
                self.mode = Mode::Browsing;
                let Some(browser) = self.browser.as_mut() else {
                    return Vec::new();
                };
                let outcome = browser.search.search(
                    &self.search_input,
                    &mut browser.hierarchy,
                    &mut browser.navigator,
                );
                if outcome == SearchOutcome::NotFound {
                    return vec![Effect::Notify(format!("not found: {}", self.search_input))];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn play(&mut self, cids: Vec<u64>) -> Vec<Effect> {
        if cids.is_empty() {
            return Vec::new();
        }
        if self.playing {
            return vec![Effect::Notify("already playing".to_string())];
        }

        let queue = playback::arrange(cids, self.play_mode, &mut rand::thread_rng());
        info!("Queueing {} item(s) ({})", queue.len(), self.play_mode.label());
        self.playing = true;
        vec![Effect::Play(queue)]
    }
}
