use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppState},
    form::Field,
    problem::Operation,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const HISTORY_LINES: usize = 8;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Settings => render_settings(self, area, buf),
            AppState::Playing => render_game(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn field_span(app: &App, field: Field) -> Span<'static> {
    let form = &app.form;
    let text = match field {
        Field::Op(op) => {
            let mark = if form.operations().is_enabled(op) { "x" } else { " " };
            format!("[{}] {}", mark, field.label())
        }
        Field::Duration => format!("{}s", form.text(field)),
        _ => format!("{:>4}", form.text(field)),
    };

    let mut style = if form.is_enabled(field) {
        bold()
    } else {
        dim_bold()
    };
    if form.focused() == field {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(text, style)
}

fn range_line(app: &App, title: &'static str, fields: [Field; 4]) -> Line<'static> {
    let label = Style::default().fg(Color::Gray);
    Line::from(vec![
        Span::styled(format!("{:<16}", title), label),
        Span::styled("a ", label),
        field_span(app, fields[0]),
        Span::styled(" to ", label),
        field_span(app, fields[1]),
        Span::styled("   b ", label),
        field_span(app, fields[2]),
        Span::styled(" to ", label),
        field_span(app, fields[3]),
    ])
}

fn render_settings(app: &App, area: Rect, buf: &mut Buffer) {
    let heading = bold().fg(Color::Cyan);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines = vec![
        Line::from(Span::styled("arithmetic drill", heading)),
        Line::default(),
    ];
    lines.extend(
        Operation::ALL
            .into_iter()
            .map(|op| Line::from(field_span(app, Field::Op(op)))),
    );
    lines.push(Line::default());
    lines.push(range_line(
        app,
        "addition",
        [Field::AddMinA, Field::AddMaxA, Field::AddMinB, Field::AddMaxB],
    ));
    lines.push(range_line(
        app,
        "multiplication",
        [Field::MulMinA, Field::MulMaxA, Field::MulMinB, Field::MulMaxB],
    ));
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled(format!("{:<16}", Field::Duration.label()), Style::default().fg(Color::Gray)),
        field_span(app, Field::Duration),
    ]));
    lines.push(Line::from(vec![
        Span::styled(
            format!("{:<16}", Field::RevealDelay.label()),
            Style::default().fg(Color::Gray),
        ),
        field_span(app, Field::RevealDelay),
        Span::styled(" s", Style::default().fg(Color::Gray)),
    ]));
    lines.push(Line::default());

    if !app.form.any_operation() {
        lines.push(Line::from(Span::styled(
            "select at least one operation to start",
            bold().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        "(↑/↓) move / (space) toggle / (enter) start / (esc)ape",
        italic,
    )));

    let area = inner(area);
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn render_game(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // clock and score
            Constraint::Length(2), // padding
            Constraint::Length(1), // problem
            Constraint::Length(1), // padding
            Constraint::Min(0),    // history
        ])
        .split(area);

    let status = Line::from(vec![
        Span::styled(format!("Seconds left: {}", app.remaining_secs), bold()),
        Span::raw("    "),
        Span::styled(format!("Score: {}", app.round.score()), bold()),
    ]);
    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if let Some(problem) = app.round.problem() {
        let answer_style = if app.is_revealing() {
            bold().fg(Color::Green)
        } else {
            bold().add_modifier(Modifier::UNDERLINED)
        };
        let answer = match app.round.input() {
            "" => " ".repeat(problem.answer.to_string().len().max(2)),
            typed => typed.to_string(),
        };
        let line = Line::from(vec![
            Span::styled(format!("{} ", problem.question), bold()),
            Span::styled(answer, answer_style),
        ]);
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    let history: Vec<Line> = app
        .solved
        .iter()
        .rev()
        .take(HISTORY_LINES)
        .enumerate()
        .map(|(idx, entry)| {
            let style = if idx == 0 {
                bold().fg(Color::Magenta)
            } else {
                dim_bold()
            };
            Line::from(Span::styled(entry.clone(), style))
        })
        .collect();
    Paragraph::new(history)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // score
            Constraint::Length(1), // ppm
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (score, ppm) = app
        .round
        .summary()
        .map(|s| (s.score, s.ppm_display()))
        .unwrap_or((app.round.score(), "0.0".to_string()));

    Paragraph::new(Span::styled(format!("Score: {}", score), bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    Paragraph::new(Span::styled(
        format!("{} problems per minute", ppm),
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
    Paragraph::new(Span::styled(
        "(n)ew round / (r)eturn to settings / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

fn inner(area: Rect) -> Rect {
    Layout::default()
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(0)])
        .split(area)[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Operations, Settings};
    use crate::store::MemoryStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::time::{Duration, Instant};

    fn create_test_app(settings: Settings) -> App {
        App::new(&settings, Box::new(MemoryStore::default()))
    }

    fn rendered(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now);
    }

    #[test]
    fn test_settings_screen_lists_operations() {
        let app = create_test_app(Settings::default());
        let text = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(text.contains("[x] addition"));
        assert!(text.contains("[x] division"));
        assert!(text.contains("120s"));
        assert!(!text.contains("select at least one operation"));
    }

    #[test]
    fn test_settings_screen_warns_without_operations() {
        let settings = Settings {
            operations: Operations::only(&[]),
            ..Settings::default()
        };
        let app = create_test_app(settings);
        let text = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(text.contains("[ ] addition"));
        assert!(text.contains("select at least one operation"));
    }

    #[test]
    fn test_game_screen_shows_problem_and_clock() {
        let mut app = create_test_app(Settings::default());
        press(&mut app, KeyCode::Enter, Instant::now());
        let text = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(text.contains("Seconds left: 120"));
        assert!(text.contains("Score: 0"));
        assert!(text.contains(&app.round.problem().unwrap().question));
    }

    #[test]
    fn test_game_screen_shows_solved_history() {
        let mut app = create_test_app(Settings::default());
        let now = Instant::now();
        press(&mut app, KeyCode::Enter, now);
        let history = app.round.problem().unwrap().history.clone();
        let answer = app.round.problem().unwrap().answer.to_string();
        for c in answer.chars() {
            press(&mut app, KeyCode::Char(c), now);
        }
        let text = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(text.contains("Score: 1"));
        assert!(text.contains(&history));
    }

    #[test]
    fn test_results_screen_shows_ppm() {
        let settings = Settings {
            duration: 30,
            ..Settings::default()
        };
        let mut app = create_test_app(settings);
        let t0 = Instant::now();
        press(&mut app, KeyCode::Enter, t0);
        app.on_tick(t0 + Duration::from_secs(30));

        let text = rendered(&app, Rect::new(0, 0, 80, 24));
        assert!(text.contains("Score: 0"));
        assert!(text.contains("0.0 problems per minute"));
    }

    #[test]
    fn test_small_and_large_areas_render() {
        let mut app = create_test_app(Settings::default());
        for area in [Rect::new(0, 0, 10, 3), Rect::new(0, 0, 200, 60)] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert_eq!(*buffer.area(), area);
        }
        press(&mut app, KeyCode::Enter, Instant::now());
        let area = Rect::new(0, 0, 12, 4);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }
}
