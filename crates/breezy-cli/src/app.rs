//! Application state machine and event dispatcher.

use std::sync::Arc;

use breezy_core::{
  dashboard::{DEFAULT_UPCOMING_LIMIT, PatientDetail, PatientOption, UpcomingEntry},
  dispatch::SendOutcome,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};

use crate::client::ApiClient;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the left list.
  List,
  /// Focus on the patient detail pane.
  Detail,
}

/// Which list the left pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPane {
  /// Every patient, alphabetical.
  Patients,
  /// The next appointments, soonest first.
  Upcoming,
}

/// One selectable line in the left pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
  pub patient_id: String,
  pub label:      String,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen: Screen,
  pub pane:   ListPane,

  /// Sorted patient picker, as returned by the API.
  pub patients: Vec<PatientOption>,

  pub upcoming: Vec<UpcomingEntry>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* list.
  pub list_cursor: usize,

  /// Detail of the patient shown in the right pane.
  pub selected: Option<PatientDetail>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient) -> Self {
    Self {
      screen: Screen::List,
      pane: ListPane::Patients,
      patients: Vec::new(),
      upcoming: Vec::new(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      selected: None,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the patient picker and the upcoming list.
  pub async fn load_lists(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading patients…".into();
    let loaded = async {
      let patients = self.client.list_patients().await?;
      let upcoming = self.client.upcoming(DEFAULT_UPCOMING_LIMIT).await?;
      anyhow::Ok((patients, upcoming))
    }
    .await;

    match loaded {
      Ok((patients, upcoming)) => {
        self.patients = patients;
        self.upcoming = upcoming;
        self.list_cursor = 0;
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Load the detail panel for `patient_id`.
  async fn load_detail(&mut self, patient_id: &str) -> anyhow::Result<()> {
    self.status_msg = "Loading…".into();
    match self.client.patient_detail(patient_id).await {
      Ok(Some(detail)) => {
        self.selected = Some(detail);
        self.status_msg = String::new();
        Ok(())
      }
      Ok(None) => {
        self.selected = None;
        self.status_msg = format!("Patient {patient_id} no longer exists");
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// All rows of the active pane, before filtering.
  pub fn rows(&self) -> Vec<ListRow> {
    match self.pane {
      ListPane::Patients => self
        .patients
        .iter()
        .map(|p| ListRow { patient_id: p.id.clone(), label: p.display_name.clone() })
        .collect(),
      ListPane::Upcoming => self
        .upcoming
        .iter()
        .map(|u| ListRow {
          patient_id: u.patient_id.clone(),
          label:      format!("{} - {}", u.display_name, u.formatted_date),
        })
        .collect(),
    }
  }

  /// Rows of the active pane matching the current filter query.
  pub fn filtered_rows(&self) -> Vec<ListRow> {
    let rows = self.rows();
    if self.filter.is_empty() {
      return rows;
    }
    let matcher = SkimMatcherV2::default();
    rows
      .into_iter()
      .filter(|r| {
        matcher.fuzzy_match(&r.label, &self.filter).is_some()
          || matcher.fuzzy_match(&r.patient_id, &self.filter).is_some()
      })
      .collect()
  }

  /// The patient id under the list cursor in the filtered view, if any.
  pub fn cursor_patient(&self) -> Option<String> {
    self
      .filtered_rows()
      .into_iter()
      .nth(self.list_cursor)
      .map(|r| r.patient_id)
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.filter_active {
      return self.handle_filter_key(key).await;
    }

    match self.screen {
      Screen::List => self.handle_list_key(key).await,
      Screen::Detail => self.handle_detail_key(key).await,
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open detail if there's exactly one match.
        let rows = self.filtered_rows();
        if let [only] = rows.as_slice() {
          let id = only.patient_id.clone();
          self.open_detail(&id).await?;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => self.cursor_down(),
      KeyCode::Up | KeyCode::Char('k') => self.cursor_up(),

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_patient() {
          self.open_detail(&id).await?;
        }
      }

      KeyCode::Tab => self.toggle_pane(),

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      KeyCode::Char('r') => {
        // The error is already in the status bar.
        let _ = self.load_lists().await;
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_detail_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::List;
        self.selected = None;
      }

      KeyCode::Char('s') => self.send_follow_up().await,

      KeyCode::Char('r') => {
        if let Some(id) = self.selected.as_ref().map(|d| d.id.clone()) {
          let _ = self.load_detail(&id).await;
        }
      }

      // Navigate list from detail (for quick switching)
      KeyCode::Char(']') | KeyCode::PageDown => {
        let before = self.list_cursor;
        self.cursor_down();
        if self.list_cursor != before
          && let Some(id) = self.cursor_patient()
        {
          self.open_detail(&id).await?;
        }
      }
      KeyCode::Char('[') | KeyCode::PageUp => {
        let before = self.list_cursor;
        self.cursor_up();
        if self.list_cursor != before
          && let Some(id) = self.cursor_patient()
        {
          self.open_detail(&id).await?;
        }
      }

      _ => {}
    }
    Ok(true)
  }

  fn cursor_down(&mut self) {
    let len = self.filtered_rows().len();
    if len > 0 && self.list_cursor + 1 < len {
      self.list_cursor += 1;
    }
  }

  fn cursor_up(&mut self) { self.list_cursor = self.list_cursor.saturating_sub(1); }

  fn toggle_pane(&mut self) {
    self.pane = match self.pane {
      ListPane::Patients => ListPane::Upcoming,
      ListPane::Upcoming => ListPane::Patients,
    };
    self.list_cursor = 0;
    self.filter.clear();
  }

  /// Transition to `Detail` for `patient_id`.
  async fn open_detail(&mut self, patient_id: &str) -> anyhow::Result<()> {
    self.load_detail(patient_id).await?;
    if self.selected.is_some() {
      self.screen = Screen::Detail;
    }
    Ok(())
  }

  /// Ask the server to text the selected patient, then reload the panel so
  /// the sent count reflects the store.
  async fn send_follow_up(&mut self) {
    let Some(detail) = &self.selected else {
      return;
    };
    let allowed = detail
      .appointment
      .as_ref()
      .is_some_and(|a| a.follow_up_allowed);
    if !allowed {
      self.status_msg = "Follow-up is not available for this appointment".into();
      return;
    }

    let id = detail.id.clone();
    let first_name = detail.first_name.clone();
    self.status_msg = "Sending…".into();
    match self.client.follow_up(&id).await {
      Ok(outcome) => {
        let message = outcome_message(&first_name, &outcome);
        if matches!(outcome, SendOutcome::Sent(_)) {
          let _ = self.load_detail(&id).await;
        }
        self.status_msg = message;
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }
}

/// Status-bar text for a send attempt.
pub fn outcome_message(first_name: &str, outcome: &SendOutcome) -> String {
  match outcome {
    SendOutcome::Sent(receipt) => format!(
      "Follow-up text sent to {first_name}! (Message SID: {})",
      receipt.message_id
    ),
    SendOutcome::Denied(reason) => format!("Not sent: {reason}"),
    SendOutcome::Failed(e) => format!("Send failed: {e}"),
  }
}
