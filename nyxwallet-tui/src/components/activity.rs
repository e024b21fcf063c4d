use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::App;
use crate::components::{render_footer, render_title};

pub struct ActivityComponent;

impl ActivityComponent {
    pub fn render(app: &App, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(10),   // Content
                Constraint::Length(3), // Help
            ])
            .split(frame.area());

        render_title(frame, chunks[0], "Activity Log");

        if app.snapshot.log.is_empty() {
            let msg = Paragraph::new("No completed actions yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(msg, chunks[1]);
        } else {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(chunks[1]);

            // newest first
            let entries: Vec<_> = app.snapshot.log.iter().rev().collect();
            let items: Vec<ListItem> = entries
                .iter()
                .map(|entry| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            entry.timestamp.format("%H:%M:%S ").to_string(),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::raw(entry.activity.to_string()),
                    ]))
                })
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .title(format!("Entries ({})", entries.len()))
                        .borders(Borders::ALL),
                )
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                )
                .highlight_symbol("> ");

            let mut list_state = ListState::default();
            list_state.select(Some(app.selected_index));
            frame.render_stateful_widget(list, content_chunks[0], &mut list_state);

            if let Some(entry) = entries.get(app.selected_index) {
                let details = Paragraph::new(entry.payload.as_str())
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::default()
                            .title(format!(
                                "{} at {}",
                                entry.activity,
                                entry.timestamp.format("%Y-%m-%d %H:%M:%S")
                            ))
                            .borders(Borders::ALL),
                    );
                frame.render_widget(details, content_chunks[1]);
            }
        }

        render_footer(app, frame, chunks[2], "Up/Down to browse, Esc back");
    }
}
