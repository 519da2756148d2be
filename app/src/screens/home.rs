//! Home screen: connection status and main menu.

use crate::{
    app::App,
    screens::{render_footer, truncate, Screen},
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

const TITLE: &str = r#"
 __  __  ___  ____                        _
|  \/  |/ _ \|  _ \ __ _  __ _  ___ _ __ | |_ ___
| |\/| | | | | |_) / _` |/ _` |/ _ \ '_ \| __/ __|
| |  | | |_| |  _ < (_| | (_| |  __/ | | | |_\__ \
|_|  |_|\___/|_| \_\__,_|\__, |\___|_| |_|\__|___/
                         |___/
"#;

const MENU: [(&str, &str, &str); 5] = [
    ("1", "Chat", "talk to your agents"),
    ("2", "CDP Wallets", "create, restore, export, delete"),
    ("3", "Agents", "choose active agents"),
    ("4", "Settings", "X and Coinbase API keys"),
    ("5", "Base Bridge", "move tokens off Base"),
];

pub struct HomeScreen;

impl HomeScreen {
    pub fn new() -> Self {
        Self
    }
}

impl Screen for HomeScreen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(vec![
                Constraint::Length(8), // Header
                Constraint::Length(6), // Status
                Constraint::Min(7),    // Menu
                Constraint::Length(2), // Footer
            ])
            .split(area);

        let header = Paragraph::new(TITLE)
            .style(Style::default().fg(Color::LightGreen))
            .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        let status_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " Status ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
            .padding(Padding::horizontal(1));

        let (backend_icon, backend_color) = if app.chat.state.backend_unreachable {
            ("○", Color::Red)
        } else {
            ("●", Color::Green)
        };
        let wallet_line = match &app.config.wallet_address {
            Some(addr) => Span::styled(
                format!("◈ Wallet: {} (chain {})", truncate(addr, 20), app.config.chain_id),
                Style::default().fg(Color::Cyan),
            ),
            None => Span::styled(
                "○ No wallet address configured",
                Style::default().fg(Color::DarkGray),
            ),
        };
        let chats = app.store.chats();

        let status_lines = vec![
            Line::from(vec![
                Span::styled(format!("{} ", backend_icon), Style::default().fg(backend_color)),
                Span::styled(
                    format!("Backend: {}", app.client.base_url()),
                    Style::default().fg(backend_color),
                ),
            ]),
            Line::from(wallet_line),
            Line::from(Span::styled(
                format!(
                    "  {} messages · {} active agents · {} saved chats",
                    app.chat.state.history.len(),
                    app.agents.selection.selected.len(),
                    chats.len()
                ),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Paragraph::new(status_lines).block(status_block), chunks[1]);

        let menu_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " Menu ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
            .padding(Padding::horizontal(1));

        let items: Vec<ListItem> = MENU
            .iter()
            .map(|(key, label, hint)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!(" [{}] ", key),
                        Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(*label, Style::default().fg(Color::White)),
                    Span::styled(format!("  {}", hint), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(menu_block), chunks[2]);

        render_footer(frame, chunks[3], app, &[("1-5", "Select option"), ("Q", "Quit")]);
    }
}
