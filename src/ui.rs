pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, AppState, Pending},
    clock::Clock,
    timer::Phase,
    util::format_hms,
};

const HORIZONTAL_MARGIN: u16 = 2;
const HEADER_COLOR: Color = Color::Rgb(44, 111, 187);

/// Tracking screen: selection, clocks, key legend and status bar
impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Length(5), // company / position / employee
                Constraint::Length(6), // clocks
                Constraint::Min(0),
                Constraint::Length(2), // legend
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "Work Time Tracker",
            bold_style.fg(Color::White).bg(HEADER_COLOR),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM))
        .render(chunks[0], buf);

        let identity = self.tracker.identity();
        let selection = vec![
            labelled("Company:", &identity.company, "(o)"),
            labelled("Position:", &identity.position, "(j)"),
            labelled("Employee:", &identity.employee, "(w)"),
        ];
        Paragraph::new(selection)
            .block(Block::default().borders(Borders::ALL).title("Selection"))
            .render(chunks[1], buf);

        let clock_style = match self.tracker.phase() {
            Phase::Running => bold_style.fg(Color::Green),
            Phase::Paused => bold_style.fg(Color::Yellow),
            Phase::Idle => bold_style.add_modifier(Modifier::DIM),
        };
        let clocks = vec![
            Line::from(vec![
                Span::styled(format!("{:<16}", "Current session:"), bold_style),
                Span::styled(format_hms(self.tracker.elapsed()), clock_style),
                Span::styled(format!("  [{}]", self.tracker.phase()), italic_style),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled(format!("{:<16}", "Total time:"), bold_style),
                Span::styled(format_hms(self.tracker.total_elapsed()), bold_style),
            ]),
        ];
        Paragraph::new(clocks)
            .block(Block::default().borders(Borders::ALL).title("Time"))
            .render(chunks[2], buf);

        Paragraph::new(Span::styled(
            "(s)tart/resume  (p)ause  (e)nd session  (r)eport  (c)lear data  (q)uit",
            italic_style,
        ))
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);

        status_bar(&self.status).render(chunks[5], buf);
    }
}

fn labelled<'a>(label: &'a str, value: &'a str, key: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("{label:<11}"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
        Span::styled(
            format!("  {key}"),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ])
}

fn status_bar(status: &str) -> Paragraph<'_> {
    Paragraph::new(status).style(Style::default().fg(Color::Black).bg(Color::Gray))
}

/// Day-grouped session table with the summary underneath
pub fn render_report<C: Clock>(app: &App<C>, f: &mut Frame) {
    let area = f.area();
    let report = app.tracker.report();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(5), // summary
            Constraint::Length(1), // legend
            Constraint::Length(1), // status bar
        ])
        .split(area);

    let day_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let total_style = Style::default().fg(Color::Green);

    let mut rows = Vec::new();
    for day in &report.days {
        rows.push(Row::new(vec![Cell::from(format!("Date: {}", day.label())).style(day_style)]));
        for s in &day.sessions {
            rows.push(Row::new(vec![
                Cell::from(""),
                Cell::from(s.start_time().format("%H:%M:%S").to_string()),
                Cell::from(s.end_time().format("%H:%M:%S").to_string()),
                Cell::from(format_hms(s.duration_seconds())),
            ]));
        }
        rows.push(Row::new(vec![
            Cell::from(""),
            Cell::from(""),
            Cell::from("Day total").style(total_style),
            Cell::from(format_hms(day.total_seconds)).style(total_style),
        ]));
    }

    let title = format!(
        "Report: {} / {} / {}",
        app.tracker.identity().company,
        app.tracker.identity().employee,
        app.tracker.identity().position
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["", "Start", "End", "Duration"])
            .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, chunks[0]);

    let summary = if report.is_empty() {
        vec![Line::from("No recorded sessions.")]
    } else {
        vec![
            Line::from(format!("Sessions:          {}", report.session_count)),
            Line::from(format!("Total time:        {}", format_hms(report.total_seconds))),
            Line::from(format!("Average duration:  {}", format_hms(report.average_seconds))),
        ]
    };
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title("Summary")),
        chunks[1],
    );

    f.render_widget(
        Paragraph::new(Span::styled(
            "export (t)ext / export c(v)s / (b)ack",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        chunks[2],
    );
    f.render_widget(status_bar(&app.status), chunks[3]);
}

/// Yes/no question drawn over the tracking screen
pub fn render_confirm<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());

    let question = match &app.state {
        AppState::Confirm(Pending::Quit) => {
            "A session is still active. Finish it before exiting? (y/n, esc to stay)".to_string()
        }
        AppState::Confirm(Pending::Clear) => {
            "Delete all session data? This cannot be undone. (y/n)".to_string()
        }
        AppState::Confirm(Pending::Switch(next)) => format!(
            "Switching to {} / {} will finish the current session. Continue? (y/n)",
            next.company, next.employee
        ),
        _ => return,
    };

    let area = centered(f.area(), question.width() as u16 + 4, 3);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(question)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title("Confirm"),
            ),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
