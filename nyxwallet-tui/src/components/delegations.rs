use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};

use crate::app::{App, DelegationsField};
use crate::components::{button_line, form_line, render_footer, render_status_popup, render_title};

pub struct DelegationsComponent;

impl DelegationsComponent {
    pub fn render(app: &App, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),  // Title
                Constraint::Min(8),     // Delegation table
                Constraint::Length(11), // Forms
                Constraint::Length(3),  // Help
            ])
            .split(frame.area());

        render_title(frame, chunks[0], "Mixnode Delegations");

        Self::render_table(app, frame, chunks[1]);
        Self::render_forms(app, frame, chunks[2]);

        render_footer(
            app,
            frame,
            chunks[3],
            "Tab to move, Enter: pick row / delegate / withdraw, u: undelegate all, r: refresh, Esc back",
        );

        if app.snapshot.loading.undelegate {
            render_status_popup(frame, "Undelegating from every mixnode...", Color::Yellow);
        }
    }

    fn render_table(app: &App, frame: &mut Frame, area: ratatui::layout::Rect) {
        let focused = app.delegations_form.focused_field == DelegationsField::Table;
        let border = if focused { Color::Yellow } else { Color::White };

        let Some(delegations) = &app.snapshot.delegations else {
            let message = if app.snapshot.loading.delegations {
                Span::styled("Loading delegations...", Style::default().fg(Color::Yellow))
            } else if app.snapshot.clients_connected {
                Span::styled("Press r to load delegations", Style::default().fg(Color::DarkGray))
            } else {
                Span::styled("Connect on the home screen first", Style::default().fg(Color::DarkGray))
            };
            let block = Block::default()
                .title("Delegations")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border));
            frame.render_widget(Paragraph::new(Line::from(message)).block(block), area);
            return;
        };

        let header = Row::new(["Mix ID", "Amount", "Height", "Proxy"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = delegations
            .iter()
            .map(|record| {
                Row::new([
                    record.mix_id.to_string(),
                    record.amount.to_string(),
                    record.height.to_string(),
                    record.proxy.clone().unwrap_or_else(|| "-".to_string()),
                ])
            })
            .collect();

        let title = format!(
            "Delegations of {} ({})",
            app.snapshot.sender.as_deref().unwrap_or("?"),
            delegations.len()
        );
        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(24),
                Constraint::Length(10),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

        let mut state = TableState::default();
        if focused && !delegations.is_empty() {
            state.select(Some(app.selected_index));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_forms(app: &App, frame: &mut Frame, area: ratatui::layout::Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let form = &app.delegations_form;
        let loading = app.snapshot.loading;
        let amount_label = format!("Amount ({})", app.session.config().denom);

        let delegate = vec![
            form_line("Mix ID", &form.mix_id, form.focused_field == DelegationsField::MixId),
            Line::from(""),
            form_line(&amount_label, &form.amount, form.focused_field == DelegationsField::Amount),
            Line::from(""),
            button_line("Delegate", false, loading.delegate),
            button_line("Undelegate all", false, loading.undelegate),
        ];
        frame.render_widget(
            Paragraph::new(delegate).block(Block::default().title("Delegate").borders(Borders::ALL)),
            columns[0],
        );

        let withdraw = vec![
            form_line(
                "Validator",
                &form.validator,
                form.focused_field == DelegationsField::Validator,
            ),
            Line::from(Span::styled(
                "  rewards go to the connected account",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            button_line("Withdraw rewards", false, loading.withdraw),
        ];
        frame.render_widget(
            Paragraph::new(withdraw).block(Block::default().title("Rewards").borders(Borders::ALL)),
            columns[1],
        );
    }
}
