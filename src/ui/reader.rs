use crate::app::{App, READER_HEADER_LINES};
use crate::util::strip_control_chars;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

/// Render the article reader: progress bar, article body and navigation bar.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    // Layout may produce tiny rects during extreme terminal resizes
    if area.width < 3 || area.height < 5 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    // Viewport inside the borders; clamp before drawing so a resize never
    // renders one frame past the end of the content.
    app.reader_visible_lines = chunks[1].height.saturating_sub(2) as usize;
    app.reader_viewport_width = chunks[1].width.saturating_sub(2) as usize;
    app.sync_scroll();

    render_progress(f, app, chunks[0]);
    render_body(f, app, chunks[1]);
    render_navigation(f, app, chunks[2]);
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let progress = app.reader.scroll_progress();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio((progress / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", progress));
    f.render_widget(gauge, area);
}

fn render_body(f: &mut Frame, app: &App, area: Rect) {
    let Some(article) = app.reader_article() else {
        let paragraph = Paragraph::new("No article selected")
            .block(Block::default().borders(Borders::ALL).title("Reader"));
        f.render_widget(paragraph, area);
        return;
    };

    let header: [Line<'static>; READER_HEADER_LINES] = [
        Line::from(Span::styled(
            strip_control_chars(&article.title).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} • {} • {}",
                article.display_date(),
                strip_control_chars(&article.category),
                article.read_time_label()
            ),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];
    let text = Text::from_iter(header.into_iter().chain(app.reader_lines.iter().cloned()));
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Article"))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset.min(u16::MAX as usize) as u16, 0));

    f.render_widget(paragraph, area);
}

fn render_navigation(f: &mut Frame, app: &App, area: Rect) {
    let len = app.article_count();
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(
            "← [p] Previous",
            if app.reader.has_previous() { enabled } else { disabled },
        ),
        Span::raw("   "),
        Span::raw(app.reader.position_label(len).unwrap_or_default()),
        Span::raw("   "),
        Span::styled(
            "[n] Next →",
            if app.reader.has_next(len) { enabled } else { disabled },
        ),
    ];
    if app.reader.back_to_top_visible() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            "↑ [g] Back to top",
            Style::default().fg(Color::Yellow),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Inline style flags while walking markdown events.
#[derive(Default)]
struct InlineState {
    heading: Option<HeadingLevel>,
    code_block: bool,
    emphasis: bool,
    strong: bool,
    link: bool,
    quote_depth: usize,
    list_depth: usize,
}

impl InlineState {
    fn style(&self) -> Style {
        if self.code_block {
            return Style::default().fg(Color::Yellow).bg(Color::Black);
        }
        let mut style = match self.heading {
            Some(HeadingLevel::H1) => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            Some(_) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            None if self.quote_depth > 0 => Style::default().fg(Color::Gray),
            None => Style::default(),
        };
        if self.strong {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.emphasis {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.link {
            style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn prefix(&self) -> Option<String> {
        (self.quote_depth > 0).then(|| "│ ".repeat(self.quote_depth))
    }
}

/// Convert markdown to styled ratatui Lines.
///
/// Returns owned lines so the reader can keep them for the life of the open
/// article.
pub fn render_markdown(md: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(md.lines().count());
    let mut spans: Vec<Span<'static>> = Vec::with_capacity(4);
    let mut state = InlineState::default();

    let flush = |lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>| {
        if !spans.is_empty() {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    for event in Parser::new(md) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => state.heading = Some(level),
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut lines, &mut spans);
                lines.push(Line::from(""));
                state.heading = None;
            }
            Event::Start(Tag::Paragraph) => {
                if let Some(prefix) = state.prefix() {
                    spans.push(Span::styled(prefix, Style::default().fg(Color::DarkGray)));
                }
            }
            Event::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut spans);
                if state.list_depth == 0 {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::BlockQuote { .. }) => state.quote_depth += 1,
            Event::End(TagEnd::BlockQuote { .. }) => {
                state.quote_depth = state.quote_depth.saturating_sub(1)
            }
            Event::Start(Tag::CodeBlock(_)) => state.code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                flush(&mut lines, &mut spans);
                state.code_block = false;
                lines.push(Line::from(""));
            }
            Event::Start(Tag::List { .. }) => state.list_depth += 1,
            Event::End(TagEnd::List { .. }) => {
                state.list_depth = state.list_depth.saturating_sub(1);
                if state.list_depth == 0 {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut lines, &mut spans);
                let indent = "  ".repeat(state.list_depth.saturating_sub(1));
                spans.push(Span::raw(format!("{}• ", indent)));
            }
            Event::End(TagEnd::Item) => flush(&mut lines, &mut spans),
            Event::Start(Tag::Emphasis) => state.emphasis = true,
            Event::End(TagEnd::Emphasis) => state.emphasis = false,
            Event::Start(Tag::Strong) => state.strong = true,
            Event::End(TagEnd::Strong) => state.strong = false,
            Event::Start(Tag::Link { .. }) => state.link = true,
            Event::End(TagEnd::Link) => state.link = false,
            Event::Start(Tag::Image { dest_url, .. }) => {
                spans.push(Span::styled(
                    format!("[Image: {}]", dest_url),
                    Style::default().fg(Color::Blue),
                ));
            }
            Event::Text(text) if state.code_block => {
                // Code blocks arrive as one text event; keep their line structure.
                for code_line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", code_line),
                        state.style(),
                    )));
                }
            }
            Event::Text(text) => spans.push(Span::styled(text.into_string(), state.style())),
            Event::Code(code) => spans.push(Span::styled(
                format!("`{}`", code),
                Style::default().fg(Color::Yellow),
            )),
            Event::SoftBreak => spans.push(Span::raw(" ")),
            Event::HardBreak => flush(&mut lines, &mut spans),
            Event::Rule => {
                flush(&mut lines, &mut spans);
                lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
                lines.push(Line::from(""));
            }
            _ => {}
        }
    }

    flush(&mut lines, &mut spans);
    lines
}
