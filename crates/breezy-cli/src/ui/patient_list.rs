//! Left panel: the patient picker or the upcoming-appointments list.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, ListPane, Screen};

/// Render the active list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = app.filtered_rows();
  let total = match app.pane {
    ListPane::Patients => app.patients.len(),
    ListPane::Upcoming => app.upcoming.len(),
  };
  let name = match app.pane {
    ListPane::Patients => "Patients",
    ListPane::Upcoming => "Upcoming",
  };

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" {name} ({}/{total}) ", rows.len())
  } else {
    format!(" {name} ({total}) ")
  };

  // Dim the border while the detail pane has focus.
  let border = if app.screen == Screen::Detail { Color::DarkGray } else { Color::Gray };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if (app.filter_active || !app.filter.is_empty()) && inner.height > 2 {
    let filter_area = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
    inner.height -= 1;

    let text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if rows.is_empty() {
    let empty = match app.pane {
      ListPane::Patients => "No patients.",
      ListPane::Upcoming => "No upcoming appointments.",
    };
    f.render_widget(
      Paragraph::new(empty).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = rows.into_iter().map(|r| ListItem::new(r.label)).collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
