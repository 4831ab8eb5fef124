//! Rendering for the setup form, story pane, choice slots and popups.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use wt_story::{CHOICE_COUNT, Genre, SessionState};

use super::app::{App, OutputStyle, Screen};

/// Height of the choice panel: four slots plus borders.
const CHOICES_HEIGHT: u16 = CHOICE_COUNT as u16 + 2;

/// Draw the whole screen.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),              // Title bar
            Constraint::Min(0),                 // Story or setup
            Constraint::Length(CHOICES_HEIGHT), // Choice slots
            Constraint::Length(1),              // Status bar
        ])
        .split(frame.area());

    let title = Paragraph::new(" Waaagh Tales ")
        .style(Style::default().fg(Color::Black).bg(Color::Green).bold());
    frame.render_widget(title, chunks[0]);

    match app.screen {
        Screen::Setup => draw_setup(frame, app, chunks[1]),
        Screen::Story => draw_story(frame, app, chunks[1]),
    }

    app.choices_area = chunks[2];
    draw_choices(frame, app, chunks[2]);

    let status = Paragraph::new(format!(" {}", app.status))
        .style(Style::default().fg(Color::Black).bg(Color::White));
    frame.render_widget(status, chunks[3]);

    if app.show_help {
        draw_help_popup(frame);
    }
}

fn draw_setup(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect(60, 80, area);
    let loaded = app.state != SessionState::Idle;
    let model_style = if loaded {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let mut lines = vec![
        Line::from(vec![
            Span::raw("Model: "),
            Span::styled(format!("\u{25c0} {} \u{25b6}", app.setup.model()), model_style),
            Span::styled(
                if loaded { "  (loaded)" } else { "" },
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
        Line::from("Choose yer tale").style(Style::default().bold()),
        Line::from(""),
    ];
    for (i, genre) in Genre::ALL.iter().enumerate() {
        let selected = i == app.setup.genre_index;
        let marker = if selected { "> " } else { "  " };
        let style = if selected {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(format!("{marker}{}", genre.name()), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("Turns: "),
        Span::styled(
            format!("{}_", app.setup.turns_input),
            Style::default().fg(Color::Yellow),
        ),
    ]));
    lines.push(Line::from(""));
    lines.push(
        Line::from(app.setup.genre().flavor())
            .style(Style::default().fg(Color::Cyan).italic()),
    );

    let form = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" New Story ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(form, area);
}

fn draw_story(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for ol in &app.output_lines {
        let (prefix, color, modifier) = match ol.style {
            OutputStyle::Choice => ("> ", Color::Yellow, Modifier::BOLD),
            OutputStyle::Story => ("", Color::White, Modifier::empty()),
            OutputStyle::Error => ("", Color::Red, Modifier::empty()),
            OutputStyle::Notice => ("", Color::Cyan, Modifier::ITALIC),
        };
        lines.push(Line::from(Span::styled(
            format!("{prefix}{}", ol.text),
            Style::default().fg(color).add_modifier(modifier),
        )));
        lines.push(Line::from(""));
    }
    if let Some(preview) = &app.preview {
        lines.push(Line::from(Span::styled(
            format!("{preview}\u{2588}"),
            Style::default().fg(Color::Gray),
        )));
    }

    // Show the bottom by default.
    let inner_width = area.width.saturating_sub(2) as usize;
    let total_wrapped: u16 = lines
        .iter()
        .map(|l| {
            if inner_width == 0 {
                1
            } else {
                l.width().max(1).div_ceil(inner_width) as u16
            }
        })
        .sum();
    let visible_height = area.height.saturating_sub(2);
    let max_scroll = total_wrapped.saturating_sub(visible_height);
    let scroll = max_scroll.saturating_sub(app.output_scroll);

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Story ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn draw_choices(frame: &mut Frame, app: &App, area: Rect) {
    let enabled = app.choices_enabled();
    let style = if enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let lines: Vec<Line> = app
        .choices
        .iter()
        .enumerate()
        .map(|(i, label)| {
            Line::from(vec![
                Span::styled(
                    format!(" {} ", i + 1),
                    if enabled {
                        Style::default().fg(Color::Black).bg(Color::Green).bold()
                    } else {
                        Style::default().fg(Color::Black).bg(Color::DarkGray)
                    },
                ),
                Span::styled(format!(" {label}"), style),
            ])
        })
        .collect();

    let border = if enabled { Color::Green } else { Color::DarkGray };
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" Choices ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(panel, area);
}

/// Map a mouse click to a choice slot. Slots are the rows inside the panel border.
pub fn hit_test(col: u16, row: u16, area: Rect) -> Option<usize> {
    if area.width < 2 || area.height < 2 {
        return None;
    }
    let inside_x = col > area.x && col < area.x + area.width - 1;
    let inside_y = row > area.y && row < area.y + area.height - 1;
    if !inside_x || !inside_y {
        return None;
    }
    let slot = (row - area.y - 1) as usize;
    (slot < CHOICE_COUNT).then_some(slot)
}

/// Create a centered rectangle as a percentage of the given area.
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

/// Draw the help popup overlay.
pub fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());

    let help_text = vec![
        Line::from("Controls").style(Style::default().bold()),
        Line::from(""),
        Line::from("Setup:"),
        Line::from("  \u{2190} / \u{2192}       Pick a model"),
        Line::from("  \u{2191} / \u{2193}       Pick a genre"),
        Line::from("  0-9 / Bksp  Edit turn count"),
        Line::from("  Enter       Load the model, then start the story"),
        Line::from("  l           Load the picked model"),
        Line::from(""),
        Line::from("Story:"),
        Line::from("  1-4 / click Choose"),
        Line::from("  \u{2191} / \u{2193}       Scroll the story"),
        Line::from("  r           Start a new story"),
        Line::from(""),
        Line::from("  ?           Toggle this help"),
        Line::from("  q / Ctrl+C  Quit"),
    ];

    let popup = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_maps_rows_to_slots() {
        let area = Rect::new(0, 20, 40, CHOICES_HEIGHT);
        assert_eq!(hit_test(5, 21, area), Some(0));
        assert_eq!(hit_test(5, 24, area), Some(3));
    }

    #[test]
    fn hit_test_ignores_borders_and_outside() {
        let area = Rect::new(0, 20, 40, CHOICES_HEIGHT);
        assert_eq!(hit_test(5, 20, area), None);
        assert_eq!(hit_test(5, 25, area), None);
        assert_eq!(hit_test(0, 22, area), None);
        assert_eq!(hit_test(39, 22, area), None);
        assert_eq!(hit_test(5, 3, area), None);
    }

    #[test]
    fn hit_test_empty_area() {
        assert_eq!(hit_test(0, 0, Rect::default()), None);
    }

    #[test]
    fn centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 70, outer);
        assert!(inner.x >= outer.x && inner.right() <= outer.right());
        assert!(inner.y >= outer.y && inner.bottom() <= outer.bottom());
    }
}
