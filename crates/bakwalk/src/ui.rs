//! UI rendering for the TUI

use crate::screen::{Prompt, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const ADDED: Color = Color::Green;
const REMOVED: Color = Color::Red;
const HUNK: Color = Color::Cyan;
const MUTED: Color = Color::DarkGray;
const ACCENT: Color = Color::Yellow;

/// Truncate from the left so the tail (usually the file name) stays visible
fn truncate_left(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut kept = String::new();
    let mut width = 1;
    for c in text.chars().rev() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        kept.insert(0, c);
    }
    format!("…{kept}")
}

/// Main drawing function
pub fn draw(frame: &mut Frame, view: &View) {
    let constraints = if view.status_bar || view.prompt.is_some() || view.message.is_some() {
        [Constraint::Min(0), Constraint::Length(1)]
    } else {
        [Constraint::Min(0), Constraint::Length(0)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    draw_content(frame, view, chunks[0]);
    if chunks[1].height > 0 {
        draw_status_bar(frame, view, chunks[1]);
    }

    if view.show_help {
        draw_help_popover(frame);
    }
}

fn draw_content(frame: &mut Frame, view: &View, area: Rect) {
    if view.closed {
        if view.panes.is_empty() {
            return;
        }
        draw_panes(frame, view, area);
        return;
    }
    if view.panes.is_empty() {
        draw_diff(frame, view, area);
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    draw_diff(frame, view, chunks[0]);
    draw_panes(frame, view, chunks[1]);
}

/// Style unified diff lines; `---`/`+++` are file headers only before the first hunk
pub(crate) fn diff_lines(text: &str) -> Vec<Line<'_>> {
    let mut in_hunk = false;
    text.lines()
        .map(|line| {
            if line.starts_with("@@") {
                in_hunk = true;
            }
            let style = if !in_hunk && (line.starts_with("+++") || line.starts_with("---")) {
                Style::default().add_modifier(Modifier::BOLD)
            } else if line.starts_with("@@") {
                Style::default().fg(HUNK)
            } else if line.starts_with('+') {
                Style::default().fg(ADDED)
            } else if line.starts_with('-') {
                Style::default().fg(REMOVED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(line, style))
        })
        .collect()
}

fn draw_diff(frame: &mut Frame, view: &View, area: Rect) {
    let paragraph = Paragraph::new(diff_lines(&view.diff))
        .scroll((view.scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

fn draw_panes(frame: &mut Frame, view: &View, area: Rect) {
    let Some(focused) = view.focused() else {
        return;
    };

    let mut title = vec![Span::raw(" ")];
    for (i, pane) in view.panes.iter().enumerate() {
        let style = if i == view.focused_pane {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        title.push(Span::styled(pane.title(), style));
        title.push(Span::raw(" "));
    }

    let gutter = focused.content.lines().count().to_string().len();
    let lines: Vec<Line> = focused
        .content
        .lines()
        .enumerate()
        .map(|(i, text)| {
            if view.line_numbers {
                Line::from(vec![
                    Span::styled(format!("{:>gutter$} ", i + 1), Style::default().fg(MUTED)),
                    Span::raw(text),
                ])
            } else {
                Line::from(text)
            }
        })
        .collect();

    let block = Block::default()
        .borders(Borders::LEFT | Borders::TOP)
        .title(Line::from(title))
        .title_bottom(Line::from(Span::styled(
            format!(" {} ", focused.modified),
            Style::default().fg(MUTED),
        )))
        .border_style(Style::default().fg(MUTED));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((view.pane_scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, view: &View, area: Rect) {
    let width = area.width as usize;

    if let Some(prompt) = &view.prompt {
        let text = match prompt {
            Prompt::Confirm(question) => format!("{question} (y/n)"),
            Prompt::Input { label, buffer } => format!("{label}{buffer}"),
        };
        let line = Line::from(Span::styled(
            truncate_left(&text, width),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(message) = &view.message {
        let line = Line::from(Span::styled(
            truncate_left(message, width),
            Style::default().fg(ACCENT),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let right = match view.position {
        Some((current, total)) => format!(
            " +{} -{}  {}/{} ",
            view.insertions, view.deletions, current, total
        ),
        None if !view.panes.is_empty() => " q to exit ".to_string(),
        None => String::new(),
    };
    let left_width = width.saturating_sub(right.width());
    let left = truncate_left(&view.status, left_width);
    let padding = left_width.saturating_sub(left.width());

    let line = Line::from(vec![
        Span::raw(left),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, Style::default().fg(MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_help_popover(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 44u16.min(area.width.saturating_sub(4));
    let popup_height = 20u16.min(area.height.saturating_sub(2));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let key_style = Style::default().fg(ACCENT);
    let section_style = Style::default().add_modifier(Modifier::BOLD);
    let help_line = |key: &str, desc: &str| -> Line {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), key_style),
            Span::raw(desc.to_string()),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(" Backups", section_style)),
        help_line("n / p", "Newer / older (takes a count)"),
        help_line("N / P", "Newest / oldest"),
        help_line("b", "Find where a line came from"),
        Line::from(""),
        Line::from(Span::styled(" Views", section_style)),
        help_line("o / w", "Open backup beside the diff"),
        help_line("O", "Open the original"),
        help_line("Tab", "Next opened view"),
        help_line("x", "Close opened view"),
        Line::from(""),
        Line::from(Span::styled(" Scrolling", section_style)),
        help_line("j / k", "Scroll diff"),
        help_line("J / K", "Scroll opened view"),
        help_line("g / G", "Top / bottom"),
        help_line("^D / ^U", "Half page"),
        Line::from(""),
        help_line("q / Esc", "Quit (offers to close views)"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .title_alignment(Alignment::Center);
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
