use crate::app::{App, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Borrow static hints and status messages; nothing here needs to allocate
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        match app.view {
            View::Blog => Cow::Borrowed(
                "[j/k]move [Enter]read [o]pen on GitHub [Tab]projects [r]eload [q]uit",
            ),
            View::Projects => Cow::Borrowed(
                "[j/k]move [t]opic filter [o]pen repo [d]emo [Tab]blog [r]eload [q]uit",
            ),
            View::Reader => Cow::Borrowed(
                "[Esc]close [j/k]scroll [n/p]next/prev [g]top [G]bottom [o]pen [s]hare draft",
            ),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
