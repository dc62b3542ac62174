use crate::app::{App, LoadState};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the project showcase with its topic filter in the title
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = match &app.projects {
        LoadState::Loading => vec![ListItem::new("Loading projects...")],
        LoadState::Failed(message) => vec![ListItem::new(Span::styled(
            *message,
            Style::default().fg(Color::Red),
        ))],
        LoadState::Ready(_) => {
            let visible = app.visible_projects();
            if visible.is_empty() {
                vec![ListItem::new("No projects")]
            } else {
                let width = area.width.saturating_sub(4) as usize;
                visible
                    .iter()
                    .enumerate()
                    .map(|(i, project)| {
                        let title_style = if i == app.selected_project {
                            Style::default().bg(Color::DarkGray).fg(Color::White)
                        } else {
                            Style::default().add_modifier(Modifier::BOLD)
                        };
                        let mut headline = vec![
                            Span::styled(strip_control_chars(&project.title).into_owned(), title_style),
                            Span::styled(
                                format!("  ★ {}  ⑂ {}", project.stars, project.forks),
                                Style::default().fg(Color::Yellow),
                            ),
                        ];
                        if project.demo.is_some() {
                            headline.push(Span::styled("  [demo]", Style::default().fg(Color::Green)));
                        }

                        let description = strip_control_chars(&project.description);
                        let tech = strip_control_chars(&project.tech.join(" · ")).into_owned();
                        ListItem::new(vec![
                            Line::from(headline),
                            Line::from(Span::styled(
                                format!("  {}", truncate_to_width(&description, width)),
                                Style::default().fg(Color::Gray),
                            )),
                            Line::from(Span::styled(
                                format!("  {}", truncate_to_width(&tech, width)),
                                Style::default().fg(Color::Magenta),
                            )),
                        ])
                    })
                    .collect()
            }
        }
    };

    let title = match app.projects.ready() {
        Some(showcase) => format!(
            "Projects - {} ({})",
            app.topic_filter.label(),
            showcase.count(&app.topic_filter)
        ),
        None => "Projects".to_string(),
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    // Placeholder rows are not selectable
    let selected = (!app.visible_projects().is_empty()).then_some(app.selected_project);
    app.project_list.select(selected);
    f.render_stateful_widget(list, area, &mut app.project_list);
}
