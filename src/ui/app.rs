use super::{key_to_action, AppEvent, EventHandler, TerminalManager};
use crate::build::BuildEvent;
use crate::config::Config;
use crate::playback::{PlaybackHandle, PlayerCommand, PlayerEvent};
use crate::session::{Effect, Mode, Session};
use anyhow::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// header + footer rows plus the list border
const CHROME_ROWS: u16 = 3 + 4 + 2;

pub struct App {
    config: Config,
    terminal: TerminalManager,
    event_handler: EventHandler,
    session: Session,
    player: PlayerCommand,

    // Background work
    playback: Option<PlaybackHandle>,
    player_tx: mpsc::UnboundedSender<PlayerEvent>,
    player_rx: mpsc::UnboundedReceiver<PlayerEvent>,
    build_tx: mpsc::UnboundedSender<BuildEvent>,
    build_rx: mpsc::UnboundedReceiver<BuildEvent>,

    // UI state
    list_state: ListState,
    status_message: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, session: Session) -> Result<Self> {
        let terminal = TerminalManager::new()?;
        let (player_tx, player_rx) = mpsc::unbounded_channel();
        let (build_tx, build_rx) = mpsc::unbounded_channel();
        let player = config.player_command();

        Ok(Self {
            config,
            terminal,
            event_handler: EventHandler::new(),
            session,
            player,
            playback: None,
            player_tx,
            player_rx,
            build_tx,
            build_rx,
            list_state: ListState::default(),
            status_message: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let _reader = self.event_handler.spawn_terminal_reader(self.config.tick_rate());

        while !self.should_quit {
            self.render()?;

            tokio::select! {
                Some(event) = self.event_handler.next_event() => self.handle_event(event),
                Some(event) = self.player_rx.recv() => self.handle_player_event(event),
                Some(event) = self.build_rx.recv() => self.handle_build_event(event),
                else => break,
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.stop();
            if tokio::time::timeout(Duration::from_secs(2), playback.join()).await.is_err() {
                warn!("Player did not stop in time");
            }
        }
        info!("Session closed");
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => {
                if let Some(action) = key_to_action(self.session.mode(), key) {
                    debug!(?action, mode = ?self.session.mode(), "key");
                    let effects = self.session.handle(action);
                    self.apply(effects);
                }
            }
            AppEvent::Tick => self.expire_status(),
            AppEvent::Resize => {}
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Started { cid, position, total } => {
                self.set_status(format!("▶ playing {} ({}/{})", cid, position + 1, total));
            }
            PlayerEvent::Failed { cid, reason } => {
                self.set_status(format!("player failed for {}: {}", cid, reason));
            }
            PlayerEvent::QueueFinished { played, failed, .. } => {
                self.playback = None;
                self.session.on_playback_finished();
                self.set_status(format!("playback done: {} played, {} failed", played, failed));
            }
        }
    }

    fn handle_build_event(&mut self, event: BuildEvent) {
        let BuildEvent::Finished(result) = event;
        let succeeded = result.is_ok();
        self.session.on_build_finished(result);

        if succeeded && self.session.mode() == Mode::Browsing {
            self.list_state = ListState::default();
            self.set_status("catalog rebuilt");
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartBuild => {
                    let catalog_path = self.session.catalog_path().to_path_buf();
                    self.config.build_command().spawn(catalog_path, self.build_tx.clone());
                }
                Effect::Play(queue) => {
                    self.playback = Some(PlaybackHandle::spawn(
                        self.player.clone(),
                        queue,
                        self.player_tx.clone(),
                    ));
                }
                Effect::Notify(message) => self.set_status(message),
                Effect::Quit => self.should_quit = true,
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn expire_status(&mut self) {
        let timeout = self.config.status_timeout();
        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed() >= timeout {
                self.status_message = None;
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let area = self.terminal.size()?;
        self.session
            .set_page_size(area.height.saturating_sub(CHROME_ROWS) as usize);

        let session = &self.session;
        let list_state = &mut self.list_state;
        let status = self.status_message.as_ref().map(|(message, _)| message.as_str());

        self.terminal.draw(|f| Self::render_ui(f, session, list_state, status))
    }

    fn render_ui(f: &mut Frame, session: &Session, list_state: &mut ListState, status: Option<&str>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Main content
                Constraint::Length(4), // Status + help
            ])
            .split(f.area());

        Self::render_header(f, chunks[0], session);

        match session.mode() {
            Mode::AwaitingBuild => Self::render_build_prompt(f, chunks[1], session),
            Mode::Building => {
                let building = Paragraph::new("Building catalog...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().borders(Borders::ALL));
                f.render_widget(building, chunks[1]);
            }
            Mode::Browsing | Mode::SearchInput => Self::render_tree(f, chunks[1], session, list_state),
        }

        Self::render_footer(f, chunks[2], session, status);
    }

    fn render_header(f: &mut Frame, area: Rect, session: &Session) {
        let mut spans = vec![Span::styled(
            "cidtree",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if let Some(browser) = session.browser() {
            spans.push(Span::raw(format!(
                "  {} items, {} selected",
                browser.hierarchy.item_count(),
                browser.selection.len()
            )));
        }
        if session.is_playing() {
            spans.push(Span::styled("  ♪", Style::default().fg(Color::Green)));
        }

        let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(header, area);
    }

    fn render_build_prompt(f: &mut Frame, area: Rect, session: &Session) {
        let mut lines = vec![
            Line::from(format!("No catalog at {}", session.catalog_path().display())),
            Line::from(""),
            Line::from("Press b to build, q to quit"),
        ];
        if let Some(error) = session.build_error() {
            lines.push(Line::from(""));
            lines.push(Line::styled(format!("❗ {}", error), Style::default().fg(Color::Red)));
        }

        let prompt = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(prompt, area);
    }

    fn render_tree(f: &mut Frame, area: Rect, session: &Session, list_state: &mut ListState) {
        let Some(browser) = session.browser() else {
            return;
        };

        let rows = browser.navigator.rows();
        if rows.is_empty() {
            let empty = Paragraph::new("⚠ catalog is empty").block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = rows
            .iter()
            .map(|node| {
                let marked = browser.selection.is_marked(node);
                let prefix = if marked { "* " } else { "  " };
                let style = if marked {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{}{}", prefix, node.display())).style(style)
            })
            .collect();

        list_state.select(browser.navigator.cursor());

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Catalog"))
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        f.render_stateful_widget(list, area, list_state);
    }

    fn render_footer(f: &mut Frame, area: Rect, session: &Session, status: Option<&str>) {
        let first = match session.mode() {
            Mode::SearchInput => Line::from(vec![
                Span::styled("Search: ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("{}_", session.search_input())),
                Span::styled("  (Enter search, Esc cancel)", Style::default().fg(Color::DarkGray)),
            ]),
            _ => Line::from(status.unwrap_or("").to_string()),
        };

        let help = match session.mode() {
            Mode::AwaitingBuild => "b=build  q=quit".to_string(),
            Mode::Building => "q=quit".to_string(),
            Mode::Browsing | Mode::SearchInput => format!(
                "h/l=collapse/expand  j/k=move  space=select  Enter=play  p=play selected  m=mode({})  /=search  n=next  b=rebuild  q=quit",
                session.play_mode().label()
            ),
        };

        let footer = Paragraph::new(vec![first, Line::styled(help, Style::default().fg(Color::DarkGray))])
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(footer, area);
    }
}
