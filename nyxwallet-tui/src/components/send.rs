use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, SendField};
use crate::components::{button_line, form_line, render_footer, render_title};

pub struct SendComponent;

impl SendComponent {
    pub fn render(app: &App, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(4), // From
                Constraint::Length(7), // Form
                Constraint::Min(3),    // Last result
                Constraint::Length(3), // Help
            ])
            .split(frame.area());

        render_title(frame, chunks[0], "Send Tokens");

        let denom = app.session.config().denom.as_str();
        let from = vec![
            Line::from(vec![
                Span::styled("From: ", Style::default().fg(Color::Yellow)),
                Span::raw(app.snapshot.account.as_deref().unwrap_or("connect on the home screen first")),
            ]),
            Line::from(vec![
                Span::styled("Balance: ", Style::default().fg(Color::Yellow)),
                Span::raw(
                    app.snapshot
                        .balance
                        .as_ref()
                        .map_or_else(|| "--".to_string(), ToString::to_string),
                ),
            ]),
        ];
        frame.render_widget(
            Paragraph::new(from).block(Block::default().title("Account").borders(Borders::ALL)),
            chunks[1],
        );

        let focused = app.send_form.focused_field;
        let amount_label = format!("Amount ({denom})");
        let lines = vec![
            form_line("Recipient", &app.send_form.recipient, focused == SendField::Recipient),
            Line::from(""),
            form_line(&amount_label, &app.send_form.amount, focused == SendField::Amount),
            Line::from(""),
            button_line("Send", focused == SendField::SendButton, app.snapshot.loading.send),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title("Transfer").borders(Borders::ALL)),
            chunks[2],
        );

        let last = app
            .snapshot
            .log
            .iter()
            .rev()
            .find(|entry| entry.activity == nyxwallet_lib::Activity::Send)
            .map_or_else(
                || "No transfer yet".to_string(),
                |entry| format!("{}\n{}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"), entry.payload),
            );
        frame.render_widget(
            Paragraph::new(last)
                .wrap(Wrap { trim: false })
                .block(Block::default().title("Last transfer").borders(Borders::ALL)),
            chunks[3],
        );

        render_footer(
            app,
            frame,
            chunks[4],
            "Tab/arrows to move, Enter on Send or Ctrl+S to submit, Ctrl+V paste, Esc back",
        );
    }
}
