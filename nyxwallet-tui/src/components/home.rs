use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::app::{App, HomeFocus};
use crate::components::{render_footer, render_status_popup, render_title};

pub struct HomeComponent;

impl HomeComponent {
    pub fn render(app: &App, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Mnemonic input
                Constraint::Length(7), // Status
                Constraint::Min(7),    // Menu
                Constraint::Length(3), // Help
            ])
            .split(frame.area());

        render_title(frame, chunks[0], "Nym Basic Wallet");

        // Mnemonic input, masked
        let focused = app.home_focus == HomeFocus::Mnemonic;
        let words = app.mnemonic_input.split_whitespace().count();
        let masked = if app.mnemonic_input.is_empty() {
            Span::styled(
                "type or paste (Ctrl+V) your mnemonic, Enter to connect",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(format!("{} ({words} words)", "*".repeat(app.mnemonic_input.len().min(48))))
        };
        let border = if focused { Color::Yellow } else { Color::DarkGray };
        let input = Paragraph::new(Line::from(masked)).block(
            Block::default()
                .title("Mnemonic")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
        frame.render_widget(input, chunks[1]);

        // Status box
        let loading = app.snapshot.loading;
        let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Yellow));
        let pending = |text: &'static str| Span::styled(text, Style::default().fg(Color::Magenta));
        let missing = || Span::styled("--", Style::default().fg(Color::DarkGray));

        let account = match &app.snapshot.account {
            _ if loading.account => pending("Deriving..."),
            Some(address) => Span::styled(
                address.clone(),
                Style::default().fg(Color::Green).add_modifier(Modifier::UNDERLINED),
            ),
            None => missing(),
        };
        let account_hint = if app.snapshot.account.is_none() {
            Span::raw("")
        } else if app.should_show_copied() {
            Span::styled(" (Copied!)", Style::default().fg(Color::Green))
        } else {
            Span::styled(" (c to copy)", Style::default().fg(Color::DarkGray))
        };

        let balance = match &app.snapshot.balance {
            _ if loading.balance => pending("Loading..."),
            Some(coin) => Span::styled(coin.to_string(), Style::default().fg(Color::Green)),
            None => missing(),
        };
        let clients = if loading.clients {
            pending("Connecting...")
        } else if app.snapshot.clients_connected {
            Span::styled("connected", Style::default().fg(Color::Green))
        } else {
            Span::styled("not connected", Style::default().fg(Color::Red))
        };

        let info = vec![
            Line::from(vec![label("API: "), Span::raw(app.session.config().api_url.as_str())]),
            Line::from(vec![label("Clients: "), clients]),
            Line::from(vec![label("Account: "), account, account_hint]),
            Line::from(vec![label("Balance: "), balance]),
            Line::from(vec![
                label("Sender: "),
                app.snapshot
                    .sender
                    .as_deref()
                    .map_or_else(missing, |sender| Span::raw(sender.to_string())),
            ]),
        ];
        let status_title = if loading.connecting() { "Status (connecting...)" } else { "Status" };
        let status = Paragraph::new(info).block(Block::default().title(status_title).borders(Borders::ALL));
        frame.render_widget(status, chunks[2]);

        // Menu
        let menu_items = [
            ("1", "Send", "Send tokens to another address"),
            ("2", "Delegations", "Delegate, undelegate and withdraw rewards"),
            ("3", "Activity", "Results of completed actions"),
            ("r", "Refresh", "Fetch balance and delegations again"),
            ("q", "Quit", "Exit the application"),
        ];
        let menu_focused = app.home_focus == HomeFocus::Menu;
        let items: Vec<ListItem> = menu_items
            .iter()
            .enumerate()
            .map(|(i, (key, label, desc))| {
                let style = if menu_focused && i == app.selected_index {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("[{key}] "), Style::default().fg(Color::Cyan)),
                    Span::styled(*label, style),
                    Span::styled(format!(" - {desc}"), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        let menu = List::new(items).block(Block::default().title("Menu").borders(Borders::ALL));
        frame.render_widget(menu, chunks[3]);

        let help = if menu_focused {
            "Number keys or arrows + Enter, Tab to edit the mnemonic"
        } else {
            "Enter to connect, Ctrl+U to clear, Tab for the menu, Ctrl+C to quit"
        };
        render_footer(app, frame, chunks[4], help);

        if loading.account || loading.clients {
            render_status_popup(frame, "Connecting to the Nyx chain...", Color::Yellow);
        }
    }
}
