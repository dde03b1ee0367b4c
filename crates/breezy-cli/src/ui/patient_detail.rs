//! Right panel: one patient and their most recent appointment.

use breezy_core::dashboard::{AppointmentView, PatientDetail};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

const NOT_AVAILABLE: &str = "Not available";

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, detail: &PatientDetail) {
  let block = Block::default()
    .title(format!(" {} ", detail.display_name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let phone = match &detail.phone {
    Some(p) => {
      let shown = p.formatted.as_deref().unwrap_or(&p.raw).to_owned();
      match &p.tel_link {
        Some(link) => field("Phone", Span::raw(format!("{shown}  ({link})"))),
        None => field("Phone", Span::raw(shown)),
      }
    }
    None => field("Phone", dim(NOT_AVAILABLE)),
  };

  let mut lines = vec![
    field("First name", Span::raw(detail.first_name.clone())),
    field("Last name", Span::raw(detail.last_name.clone())),
    phone,
    Line::from(""),
  ];

  match &detail.appointment {
    Some(appt) => lines.extend(appointment_lines(appt)),
    None => lines.push(Line::from(dim("No appointments found for this patient."))),
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn appointment_lines(appt: &AppointmentView) -> Vec<Line<'static>> {
  let stage = Span::styled(
    appt.status.label(),
    Style::default()
      .fg(status_color(&appt.status_color))
      .add_modifier(Modifier::BOLD),
  );

  let follow_up = if appt.follow_up_allowed {
    Span::styled("press s to send", Style::default().fg(Color::Green))
  } else {
    dim("not available")
  };

  vec![
    Line::from(Span::styled(
      "Most recent appointment",
      Style::default().add_modifier(Modifier::UNDERLINED),
    )),
    field("Date", Span::raw(appt.formatted_date.clone())),
    field("Type", Span::raw(appt.reason.clone())),
    field("Stage", stage),
    field("Messages sent", Span::raw(appt.messages_sent.to_string())),
    field("Assessment", Span::raw(appt.assessment.label())),
    field("Follow-up", follow_up),
  ]
}

fn field(label: &'static str, value: Span<'static>) -> Line<'static> {
  Line::from(vec![
    Span::styled(
      format!("{label:<14}"),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    value,
  ])
}

fn dim(text: &'static str) -> Span<'static> {
  Span::styled(text, Style::default().fg(Color::DarkGray))
}

/// Map the colour names the API sends to terminal colours.
fn status_color(name: &str) -> Color {
  match name {
    "green" => Color::Green,
    "red" => Color::Red,
    _ => Color::White,
  }
}
