use crate::app::{App, LoadState};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Columns taken by the date and read time after a title.
const META_WIDTH: u16 = 28;

/// Render the blog article list
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = match &app.articles {
        LoadState::Loading => vec![ListItem::new("Loading articles...")],
        LoadState::Failed(message) => vec![ListItem::new(Span::styled(
            *message,
            Style::default().fg(Color::Red),
        ))],
        LoadState::Ready(catalog) if catalog.is_empty() => vec![ListItem::new("No articles")],
        LoadState::Ready(catalog) => catalog
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let title_style = if i == app.selected_article {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let max_title = area.width.saturating_sub(META_WIDTH) as usize;
                let title = strip_control_chars(&article.title);

                let headline = Line::from(vec![
                    Span::styled(truncate_to_width(&title, max_title).into_owned(), title_style),
                    Span::styled(
                        format!("  {} · {}", article.short_date(), article.read_time_label()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                let excerpt_width = area.width.saturating_sub(6) as usize;
                let excerpt = strip_control_chars(&article.excerpt).replace('\n', " ");
                let detail = Line::from(vec![
                    Span::styled(
                        format!("  [{}] ", strip_control_chars(&article.category)),
                        Style::default().fg(Color::Magenta),
                    ),
                    Span::styled(
                        truncate_to_width(&excerpt, excerpt_width).into_owned(),
                        Style::default().fg(Color::Gray),
                    ),
                ]);
                ListItem::new(vec![headline, detail])
            })
            .collect(),
    };

    let title = match app.catalog() {
        Some(catalog) => format!("Blog ({})", catalog.len()),
        None => "Blog".to_string(),
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    // Placeholder rows are not selectable
    let selected = (app.article_count() > 0).then_some(app.selected_article);
    app.article_list.select(selected);
    f.render_stateful_widget(list, area, &mut app.article_list);
}
