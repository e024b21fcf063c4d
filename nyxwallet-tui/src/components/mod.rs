pub mod activity;
pub mod delegations;
pub mod home;
pub mod send;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::App;

pub fn render_title(frame: &mut Frame, area: Rect, title: &str) {
    let title = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(title, area);
}

/// Help line, replaced by the current notice while one is showing
pub fn render_footer(app: &App, frame: &mut Frame, area: Rect, help: &str) {
    let line = match &app.notice {
        Some(notice) => {
            let color = if notice.is_error { Color::Red } else { Color::Green };
            Line::from(Span::styled(notice.message.as_str(), Style::default().fg(color)))
        }
        None => Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))),
    };
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

/// One `label: value` line of an input form
pub fn form_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let mut spans = vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{label}: "), label_style),
        Span::raw(value),
    ];
    if focused {
        spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }
    Line::from(spans)
}

/// Button line, rendered dimmed while its action is running
pub fn button_line(label: &str, focused: bool, busy: bool) -> Line<'static> {
    let style = if busy {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let text = if busy {
        format!("  [ {label}... ]")
    } else {
        format!("  [ {label} ]")
    };
    Line::from(Span::styled(text, style))
}

pub fn render_status_popup(frame: &mut Frame, message: &str, color: Color) {
    let area = centered_rect(50, 15, frame.area());
    let popup = Paragraph::new(message)
        .style(Style::default().fg(color))
        .block(
            Block::default()
                .title("Status")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
