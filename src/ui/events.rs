use crate::session::{Action, Mode};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

pub struct EventHandler {
    event_sender: mpsc::UnboundedSender<AppEvent>,
    event_receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        Self {
            event_sender,
            event_receiver,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.event_sender.clone()
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.event_receiver.recv().await
    }

    /// Read the terminal on a blocking thread and forward key presses,
    /// resizes and periodic ticks into the queue.
    pub fn spawn_terminal_reader(&self, tick_rate: Duration) -> JoinHandle<()> {
        let sender = self.sender();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = read_terminal_events(&sender, tick_rate) {
                warn!("Terminal reader stopped: {}", e);
            }
        })
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn read_terminal_events(sender: &mpsc::UnboundedSender<AppEvent>, tick_rate: Duration) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            let app_event = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                Event::Resize(_, _) => Some(AppEvent::Resize),
                _ => None,
            };
            if let Some(app_event) = app_event {
                if sender.send(app_event).is_err() {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if sender.send(AppEvent::Tick).is_err() {
                return Ok(());
            }
            last_tick = Instant::now();
        }
    }
}

/// Map a key press to a session action; what a key means depends on the mode.
pub fn key_to_action(mode: Mode, key: KeyEvent) -> Option<Action> {
    // Ctrl+C quits from anywhere, including the search prompt
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match mode {
        Mode::AwaitingBuild => match key.code {
            KeyCode::Char('b') | KeyCode::Char('B') => Some(Action::Rebuild),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            _ => None,
        },
        Mode::Building => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
        Mode::SearchInput => match key.code {
            KeyCode::Enter => Some(Action::ConfirmSearch),
            KeyCode::Esc => Some(Action::CancelSearch),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Char(c) if !c.is_control() => Some(Action::SearchChar(c)),
            _ => None,
        },
        Mode::Browsing => match key.code {
            // Navigation
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveUp),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
            KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),

            // Tree
            KeyCode::Char('l') | KeyCode::Right => Some(Action::Expand),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::Collapse),

            // Selection + playback
            KeyCode::Char(' ') => Some(Action::ToggleSelect),
            KeyCode::Enter => Some(Action::PlayCurrent),
            KeyCode::Char('p') => Some(Action::PlaySelected),
            KeyCode::Char('m') => Some(Action::TogglePlayMode),

            // Search
            KeyCode::Char('/') => Some(Action::StartSearch),
            KeyCode::Char('n') => Some(Action::FindNext),

            KeyCode::Char('b') | KeyCode::Char('B') => Some(Action::Rebuild),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn browsing_keys() {
        assert_eq!(key_to_action(Mode::Browsing, press(KeyCode::Char('j'))), Some(Action::MoveDown));
        assert_eq!(key_to_action(Mode::Browsing, press(KeyCode::Left)), Some(Action::Collapse));
        assert_eq!(key_to_action(Mode::Browsing, press(KeyCode::Enter)), Some(Action::PlayCurrent));
        assert_eq!(key_to_action(Mode::Browsing, press(KeyCode::Char('/'))), Some(Action::StartSearch));
        assert_eq!(key_to_action(Mode::Browsing, press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn search_prompt_takes_text() {
        assert_eq!(
            key_to_action(Mode::SearchInput, press(KeyCode::Char('q'))),
            Some(Action::SearchChar('q'))
        );
        let shifted = KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(Mode::SearchInput, shifted), Some(Action::SearchChar('Q')));
        assert_eq!(key_to_action(Mode::SearchInput, press(KeyCode::Esc)), Some(Action::CancelSearch));
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [Mode::AwaitingBuild, Mode::Building, Mode::Browsing, Mode::SearchInput] {
            assert_eq!(key_to_action(mode, ctrl_c), Some(Action::Quit));
        }
    }

    #[test]
    fn build_prompt_only_builds_or_quits() {
        assert_eq!(key_to_action(Mode::AwaitingBuild, press(KeyCode::Char('B'))), Some(Action::Rebuild));
        assert_eq!(key_to_action(Mode::AwaitingBuild, press(KeyCode::Char('j'))), None);
        assert_eq!(key_to_action(Mode::Building, press(KeyCode::Char('b'))), None);
    }
}
