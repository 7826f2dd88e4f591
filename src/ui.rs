use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use mathdash::{session::Answer, util};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Quiz => render_quiz(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let session = &app.session;
    let config = session.config();
    let (solved, total) = session.progress();

    let body_height = 7;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(body_height) / 2),
            Constraint::Length(1), // operation
            Constraint::Length(1), // padding
            Constraint::Length(1), // problem
            Constraint::Length(1), // answer
            Constraint::Length(1), // feedback
            Constraint::Length(1), // padding
            Constraint::Length(1), // progress + timer
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(config.operation.long_name(), dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        session.current_display_text(),
        bold_style.fg(Color::Cyan),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("> ", dim_bold_style),
        Span::styled(app.answer.as_str(), bold_style),
        Span::styled("_", dim_bold_style.add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    let feedback = match app.last_answer {
        Some(Answer::Incorrect) => Span::styled("try again", Style::default().fg(Color::Red)),
        Some(Answer::Correct) => Span::styled("correct!", Style::default().fg(Color::Green)),
        _ => Span::raw(""),
    };
    Paragraph::new(feedback)
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        format!(
            "{}    {}",
            util::progress_text(solved, total),
            util::timer_text(session.elapsed_secs(), config.time_limit_secs)
        ),
        dim_bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[7], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let Some(result) = app.last_result.as_ref() else {
        return;
    };
    let config = result.config;

    let message_style = if result.passed {
        bold_style.fg(Color::Green)
    } else {
        bold_style.fg(Color::Red)
    };

    let mut lines = vec![
        Line::from(Span::styled(util::result_message(result.passed), message_style)),
        Line::from(""),
        Line::from(vec![
            Span::styled("problem: ", italic_style),
            Span::styled(config.operation.long_name(), bold_style),
        ]),
        Line::from(vec![
            Span::styled("your time: ", italic_style),
            Span::styled(util::format_time(result.elapsed_secs), bold_style),
        ]),
        Line::from(vec![
            Span::styled("solved: ", italic_style),
            Span::styled(
                format!("{}/{}", result.solved_count, config.total_questions),
                bold_style,
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "best times ({} questions in {})",
                config.total_questions,
                util::clock_text(config.time_limit_secs as f64)
            ),
            italic_style,
        )),
    ];

    for (op, record) in app
        .ledger
        .best_by_operation(config.time_limit_secs, config.total_questions)
    {
        let style = if op == config.operation {
            bold_style.fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{:<15} {:>16}   most solved {}",
                op.long_name(),
                util::best_time_text(&record),
                record.most_solved
            ),
            style,
        )));
    }

    if let Some(notice) = &app.notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(r)etry / (esc)ape",
        italic_style.add_modifier(Modifier::DIM),
    )));

    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height + VERTICAL_MARGIN * 2) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
