//! Frame layout: header tabs, the two panes, and the status bar.

pub mod patient_detail;
pub mod patient_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, ListPane, Screen};

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let [header, body, status] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(0),
    Constraint::Length(1),
  ])
  .areas(f.area());

  draw_header(f, header, app);
  draw_body(f, body, app);
  draw_status(f, status, app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

/// Pane tabs with their row counts; the active one is highlighted.
fn pane_tabs(app: &App) -> Vec<Span<'static>> {
  let tab = |pane: ListPane, label: &str, count: usize| {
    let text = format!(" {label} ({count}) ");
    if app.pane == pane {
      Span::styled(text, Style::default().fg(Color::Black).bg(Color::Gray))
    } else {
      Span::styled(text, Style::default().fg(Color::Gray))
    }
  };
  vec![
    tab(ListPane::Patients, "Patients", app.patients.len()),
    tab(ListPane::Upcoming, "Upcoming", app.upcoming.len()),
  ]
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let mut spans = vec![Span::styled(
    " breezy ",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  )];
  spans.extend(pane_tabs(app));

  let date = Span::styled(
    format!("{} ", Local::now().format("%a %b %-d, %Y")),
    Style::default().fg(Color::Gray),
  );
  let used = Line::from(spans.clone()).width() + date.width();
  spans.push(Span::raw(" ".repeat(usize::from(area.width).saturating_sub(used))));
  spans.push(date);

  f.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let [list, detail] =
    Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)]).areas(area);

  patient_list::draw(f, list, app);
  match &app.selected {
    Some(d) => patient_detail::draw(f, detail, d),
    None => {
      let block = Block::default()
        .title(" Patient ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
      let hint = Paragraph::new("Select a patient and press Enter.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
      f.render_widget(hint, detail);
    }
  }
}

// ─── Status bar ───────────────────────────────────────────────────────────────

/// Mode badge and key hints for the current focus.
fn key_hints(app: &App) -> (&'static str, &'static str) {
  match app.screen {
    Screen::List if app.filter_active => ("SEARCH", "type to filter  Esc cancel  Enter select"),
    Screen::List => (
      "LIST",
      "↑↓/jk move  / search  Tab switch list  Enter open  r reload  q quit",
    ),
    Screen::Detail => (
      "PATIENT",
      "s send follow-up  r refresh  [ ] prev/next  Esc back  q quit",
    ),
  }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode, hints) = key_hints(app);
  let message = if app.status_msg.is_empty() { hints } else { app.status_msg.as_str() };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode} "),
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {message}"), Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}
