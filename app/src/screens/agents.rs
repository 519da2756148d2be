//! Agent selection screen.

use crate::{
    agents::{self, AgentSelection, ToggleOutcome, MAX_SELECTED_AGENTS},
    app::{App, AppMessage, ScreenAction},
    client::{AgentCatalog, ApiClient},
    screens::{render_footer, render_title, screen_layout, truncate, Screen},
};
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

pub struct AgentsScreen {
    pub selection: AgentSelection,
    pub cursor: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl AgentsScreen {
    pub fn new() -> Self {
        Self {
            selection: AgentSelection::default(),
            cursor: 0,
            loading: false,
            error: None,
        }
    }

    pub fn handle_catalog(&mut self, catalog: AgentCatalog) {
        self.loading = false;
        self.selection = AgentSelection::from_catalog(catalog);
        self.cursor = self.cursor.min(self.selection.available.len().saturating_sub(1));
    }

    pub fn handle_failure(&mut self, error: String) {
        self.loading = false;
        self.error = Some(error);
    }

    pub fn start_fetch(&mut self, client: ApiClient, tx: mpsc::Sender<AppMessage>) {
        self.loading = true;
        tokio::spawn(async move {
            let msg = match client.get_available_agents().await {
                Ok(catalog) => AppMessage::AgentsLoaded(catalog),
                Err(e) => AppMessage::AgentsFailed(e.to_string()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn toggle_current(&mut self) {
        let Some(name) = self.selection.available.get(self.cursor).map(|a| a.name.clone()) else {
            return;
        };
        if self.selection.toggle(&name) == ToggleOutcome::LimitReached {
            self.error = Some(format!(
                "You can only select up to {} agents at a time",
                MAX_SELECTED_AGENTS
            ));
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        client: &ApiClient,
        tx: mpsc::Sender<AppMessage>,
    ) -> ScreenAction {
        self.error = None;
        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < self.selection.available.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('r') if !self.loading => self.start_fetch(client.clone(), tx),
            KeyCode::Char('s') if !self.loading => {
                let client = client.clone();
                let selected = self.selection.selected.clone();
                self.loading = true;
                tokio::spawn(async move {
                    let msg = match agents::save_selection(&client, &selected).await {
                        Ok(reload) => AppMessage::AgentsSaved { reload },
                        Err(e) => AppMessage::AgentsFailed(e.to_string()),
                    };
                    let _ = tx.send(msg).await;
                });
            }
            KeyCode::Esc => return ScreenAction::GoHome,
            _ => {}
        }
        ScreenAction::None
    }
}

impl Screen for AgentsScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = screen_layout(area);
        let subtitle = format!(
            "{} of {} selected",
            self.selection.selected.len(),
            MAX_SELECTED_AGENTS
        );
        render_title(frame, chunks[0], "AGENTS", &subtitle);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(" Available Agents ", Style::default().fg(Color::White)));

        if self.selection.available.is_empty() {
            let text = if self.loading {
                "  Loading agents..."
            } else {
                "  No agents available. Press [r] to reload."
            };
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))),
            ])
            .block(block);
            frame.render_widget(empty, chunks[1]);
        } else {
            let width = chunks[1].width.saturating_sub(40) as usize;
            let items: Vec<ListItem> = self
                .selection
                .available
                .iter()
                .map(|agent| {
                    let checked = self.selection.is_selected(&agent.name);
                    let (mark, color) = if checked {
                        ("[x] ", Color::LightGreen)
                    } else if self.selection.can_add(&agent.name) {
                        ("[ ] ", Color::White)
                    } else {
                        ("[ ] ", Color::DarkGray)
                    };
                    let title = if agent.human_readable_name.is_empty() {
                        agent.name.clone()
                    } else {
                        agent.human_readable_name.clone()
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(mark, Style::default().fg(color)),
                        Span::styled(format!("{:<28}", title), Style::default().fg(color)),
                        Span::styled(
                            truncate(&agent.description, width),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();

            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                .highlight_symbol("▶ ");
            let mut state = ListState::default().with_selected(Some(self.cursor));
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }

        if let Some(err) = &self.error {
            let line = Paragraph::new(Line::from(vec![
                Span::styled(" ✗ ", Style::default().fg(Color::Red)),
                Span::styled(err.as_str(), Style::default().fg(Color::Red)),
            ]));
            frame.render_widget(line, chunks[2]);
            return;
        }

        render_footer(
            frame,
            chunks[2],
            app,
            &[
                ("Space", "Toggle"),
                ("s", "Save"),
                ("r", "Reload"),
                ("Esc", "Home"),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AgentInfo;

    fn catalog(n: usize, selected: &[&str]) -> AgentCatalog {
        AgentCatalog {
            available: (0..n)
                .map(|i| AgentInfo {
                    name: format!("agent{}", i),
                    description: String::new(),
                    human_readable_name: String::new(),
                })
                .collect(),
            selected: selected.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn seventh_toggle_reports_limit() {
        let mut screen = AgentsScreen::new();
        screen.handle_catalog(catalog(
            8,
            &["agent0", "agent1", "agent2", "agent3", "agent4", "agent5"],
        ));
        screen.cursor = 6;
        screen.toggle_current();

        assert_eq!(screen.selection.selected.len(), MAX_SELECTED_AGENTS);
        assert!(screen.error.is_some());
        assert!(!screen.selection.is_selected("agent6"));
    }

    #[test]
    fn catalog_reload_clamps_cursor() {
        let mut screen = AgentsScreen::new();
        screen.handle_catalog(catalog(5, &[]));
        screen.cursor = 4;
        screen.handle_catalog(catalog(2, &[]));
        assert_eq!(screen.cursor, 1);
    }
}
