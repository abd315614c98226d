//! Modal sessions as the host loop sees them.
//!
//! [`FormSession`] wraps an [`EntityModal`] for one record type together with
//! the view-side state the core leaves to the host: which field has focus and
//! which invalid field is currently pulsing. [`ModalSession`] erases the
//! record type so one loop can drive every entity kind.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

use crate::entity::records::{Group, Organization, Room, Schedule, Subject, User};
use crate::entity::{EntityKind, FieldInput, FormFields};
use crate::error::{Context, Result};
use crate::modal::{EntityModal, Mode, ModalConfig, SaveError, SaveOutcome, SubmitOutcome};

/// How long the first invalid field stays highlighted after a failed submit.
pub const PULSE: Duration = Duration::from_millis(800);

/// Input a modal session reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormInput {
    Char(char),
    Backspace,
    NextField,
    PrevField,
    Submit,
    Cancel,
    DismissServerError,
    DismissValidation,
}

/// A save the host must run and report back with [`ModalSession::complete`].
#[derive(Clone, Debug, PartialEq)]
pub struct SaveJob {
    pub kind: EntityKind,
    pub id: Option<String>,
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    None,
    /// Closed without saving; the host should drop the session.
    Closed,
    /// Saved and closed; the host should drop the session and refresh.
    Saved,
    Save(SaveJob),
}

/// One field as it should be drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRow {
    pub key: &'static str,
    pub label: &'static str,
    /// Masked for secret fields.
    pub value: String,
    pub required: bool,
    pub error: Option<String>,
    pub focused: bool,
    pub pulsing: bool,
}

/// Snapshot of a session for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormView {
    pub kind: EntityKind,
    pub mode: Mode,
    pub config: &'static ModalConfig,
    pub rows: Vec<FieldRow>,
    pub server_error: Option<String>,
    /// Present while the validation summary banner is shown.
    pub validation_summary: Option<Vec<String>>,
    pub submitting: bool,
    /// Drives the submit button: valid right now, or view mode.
    pub can_submit: bool,
}

pub trait ModalSession {
    fn kind(&self) -> EntityKind;

    fn mode(&self) -> Mode;

    fn is_submitting(&self) -> bool;

    fn handle(&mut self, input: FormInput) -> SessionEvent;

    /// Deliver the result of the [`SaveJob`] this session asked for.
    fn complete(&mut self, result: std::result::Result<(), SaveError>) -> SessionEvent;

    /// The host's copy of the record changed; reseed edit and view sessions.
    fn refresh_source(&mut self, record: &Value);

    fn view(&self, now: Instant) -> FormView;
}

pub struct FormSession<T: FormFields> {
    modal: EntityModal<T>,
    focus: usize,
    pulse: Option<(String, Instant)>,
}

impl<T: FormFields> FormSession<T> {
    pub fn open(mode: Mode, record: Option<&Value>) -> Result<Self> {
        let data = record
            .map(|v| serde_json::from_value::<T>(v.clone()))
            .transpose()
            .with_ctx(|| format!("decode {} record", T::KIND))?;
        let mut modal = EntityModal::new(T::default(), T::validator());
        modal.open(mode, data)?;
        Ok(Self {
            modal,
            focus: 0,
            pulse: None,
        })
    }

    pub fn modal(&self) -> &EntityModal<T> {
        &self.modal
    }

    pub fn focused_field(&self) -> Option<&'static str> {
        T::fields().get(self.focus).map(|f| f.key)
    }

    fn edit_focused(&mut self, op: impl FnOnce(&mut String)) {
        if self.modal.mode() == Mode::View || self.modal.is_submitting() {
            return;
        }
        let Some(key) = self.focused_field() else {
            return;
        };
        self.modal.update_form(|record| {
            if let Some(value) = record.field_mut(key) {
                op(value);
            }
        });
    }

    fn move_focus(&mut self, forward: bool) {
        let n = T::fields().len();
        if n == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % n
        } else {
            (self.focus + n - 1) % n
        };
    }

    fn submit(&mut self) -> SessionEvent {
        match self.modal.submit() {
            SubmitOutcome::Ignored => SessionEvent::None,
            SubmitOutcome::Closed => SessionEvent::Closed,
            SubmitOutcome::Invalid { fields } => {
                if let Some(first) = fields.first() {
                    if let Some(idx) = T::fields().iter().position(|f| f.key == first.as_str()) {
                        self.focus = idx;
                    }
                    self.pulse = Some((first.clone(), Instant::now()));
                }
                SessionEvent::None
            }
            SubmitOutcome::Save(request) => match serde_json::to_value(&request.data) {
                Ok(payload) => SessionEvent::Save(SaveJob {
                    kind: T::KIND,
                    id: request.id,
                    payload,
                }),
                Err(e) => {
                    self.modal
                        .complete_save(Err(SaveError::Message(format!("could not encode record: {e}"))));
                    SessionEvent::None
                }
            },
        }
    }
}

impl<T: FormFields> ModalSession for FormSession<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn mode(&self) -> Mode {
        self.modal.mode()
    }

    fn is_submitting(&self) -> bool {
        self.modal.is_submitting()
    }

    fn handle(&mut self, input: FormInput) -> SessionEvent {
        match input {
            FormInput::Char(c) => self.edit_focused(|v| v.push(c)),
            FormInput::Backspace => self.edit_focused(|v| {
                v.pop();
            }),
            FormInput::NextField => self.move_focus(true),
            FormInput::PrevField => self.move_focus(false),
            FormInput::Submit => return self.submit(),
            FormInput::Cancel => {
                if self.modal.close() {
                    return SessionEvent::Closed;
                }
            }
            FormInput::DismissServerError => self.modal.dismiss_server_error(),
            FormInput::DismissValidation => self.modal.dismiss_validation_errors(),
        }
        SessionEvent::None
    }

    fn complete(&mut self, result: std::result::Result<(), SaveError>) -> SessionEvent {
        match self.modal.complete_save(result) {
            Some(SaveOutcome::Closed) => SessionEvent::Saved,
            Some(SaveOutcome::Failed(_)) | None => SessionEvent::None,
        }
    }

    fn refresh_source(&mut self, record: &Value) {
        match serde_json::from_value::<T>(record.clone()) {
            Ok(data) => {
                if let Err(e) = self.modal.sync_source(data) {
                    warn!(kind = %T::KIND, error = %e, "could not reseed modal");
                }
            }
            Err(e) => warn!(kind = %T::KIND, error = %e, "could not decode refreshed record"),
        }
    }

    fn view(&self, now: Instant) -> FormView {
        let form = self.modal.form();
        let errors = self.modal.errors();
        let pulsing_field = self
            .pulse
            .as_ref()
            .filter(|(_, at)| now.duration_since(*at) < PULSE)
            .map(|(field, _)| field.as_str());
        let rows = T::fields()
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                let raw = form.field(spec.key).unwrap_or("");
                let value = match spec.input {
                    FieldInput::Secret => "•".repeat(raw.chars().count()),
                    FieldInput::Text | FieldInput::Number => raw.to_string(),
                };
                FieldRow {
                    key: spec.key,
                    label: spec.label,
                    value,
                    required: spec.required,
                    error: errors.get(spec.key).map(str::to_string),
                    focused: idx == self.focus,
                    pulsing: pulsing_field == Some(spec.key),
                }
            })
            .collect();
        let validation_summary = self.modal.show_validation_errors().then(|| {
            errors
                .iter()
                .map(|(field, message)| {
                    let label = T::fields()
                        .iter()
                        .find(|s| s.key == field)
                        .map(|s| s.label)
                        .unwrap_or(field);
                    format!("{label}: {message}")
                })
                .collect()
        });
        FormView {
            kind: T::KIND,
            mode: self.modal.mode(),
            config: self.modal.config(),
            rows,
            server_error: self.modal.server_error().map(str::to_string),
            validation_summary,
            submitting: self.modal.is_submitting(),
            can_submit: self.modal.mode() == Mode::View || self.modal.is_valid(),
        }
    }
}

/// Open a session for `kind`. Edit and view need the record as listed by the API.
pub fn open_session(kind: EntityKind, mode: Mode, record: Option<&Value>) -> Result<Box<dyn ModalSession>> {
    Ok(match kind {
        EntityKind::User => Box::new(FormSession::<User>::open(mode, record)?),
        EntityKind::Room => Box::new(FormSession::<Room>::open(mode, record)?),
        EntityKind::Subject => Box::new(FormSession::<Subject>::open(mode, record)?),
        EntityKind::Group => Box::new(FormSession::<Group>::open(mode, record)?),
        EntityKind::Organization => Box::new(FormSession::<Organization>::open(mode, record)?),
        EntityKind::Schedule => Box::new(FormSession::<Schedule>::open(mode, record)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn type_text(session: &mut dyn ModalSession, text: &str) {
        for c in text.chars() {
            session.handle(FormInput::Char(c));
        }
    }

    #[test]
    fn typing_goes_to_the_focused_field() {
        let mut s = open_session(EntityKind::Room, Mode::Create, None).unwrap();
        type_text(s.as_mut(), "Lab");
        s.handle(FormInput::NextField);
        type_text(s.as_mut(), "120");
        s.handle(FormInput::Backspace);
        let view = s.view(Instant::now());
        assert_eq!(view.rows[0].value, "Lab");
        assert_eq!(view.rows[1].value, "12");
        assert!(view.rows[1].focused);
        assert!(view.can_submit);
    }

    #[test]
    fn failed_validation_focuses_and_pulses_first_invalid_field() {
        let mut s = open_session(EntityKind::Schedule, Mode::Create, None).unwrap();
        s.handle(FormInput::NextField);
        s.handle(FormInput::NextField);
        assert_eq!(s.handle(FormInput::Submit), SessionEvent::None);

        let now = Instant::now();
        let view = s.view(now);
        assert!(view.rows[0].focused);
        assert!(view.rows[0].pulsing);
        assert!(!view.rows[1].pulsing);
        assert_eq!(view.rows[0].error.as_deref(), Some("Group is required"));
        let summary = view.validation_summary.unwrap();
        assert_eq!(summary[0], "Group: Group is required");

        assert!(!s.view(now + PULSE).rows[0].pulsing);
    }

    #[test]
    fn valid_submit_produces_a_save_job() {
        let record = json!({"id": "3", "name": "101", "capacity": "24", "floor": "1"});
        let mut s = open_session(EntityKind::Room, Mode::Edit, Some(&record)).unwrap();
        let SessionEvent::Save(job) = s.handle(FormInput::Submit) else {
            panic!("expected a save job");
        };
        assert_eq!(job.kind, EntityKind::Room);
        assert_eq!(job.id.as_deref(), Some("3"));
        assert_eq!(job.payload["capacity"], "24");
        assert!(s.is_submitting());

        assert_eq!(s.handle(FormInput::Cancel), SessionEvent::None);
        assert_eq!(s.complete(Ok(())), SessionEvent::Saved);
    }

    #[test]
    fn view_mode_is_read_only() {
        let record = json!({"id": "1", "name": "Art"});
        let mut s = open_session(EntityKind::Subject, Mode::View, Some(&record)).unwrap();
        type_text(s.as_mut(), "xyz");
        assert_eq!(s.view(Instant::now()).rows[0].value, "Art");
        assert_eq!(s.handle(FormInput::Submit), SessionEvent::Closed);
    }

    #[test]
    fn secrets_are_masked() {
        let mut s = open_session(EntityKind::User, Mode::Create, None).unwrap();
        for _ in 0..4 {
            s.handle(FormInput::NextField);
        }
        type_text(s.as_mut(), "hunter2");
        assert_eq!(s.view(Instant::now()).rows[4].value, "•••••••");
    }

    #[test]
    fn edit_without_id_is_refused() {
        let record = json!({"name": "Art"});
        assert!(open_session(EntityKind::Subject, Mode::Edit, Some(&record)).is_err());
    }
}
