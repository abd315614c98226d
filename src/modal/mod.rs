//! Generic create/edit/view modal controller.
//!
//! [`EntityModal`] owns one modal session for a record type `T`: the form
//! data, the validation error map, the submitting flag and the server error
//! banner. It performs no IO. Saving is handed to the host either
//! synchronously through a [`Saver`] ([`EntityModal::submit_with`]) or in two
//! phases: [`EntityModal::submit`] yields a [`SaveRequest`] and the host later
//! reports the result with [`EntityModal::complete_save`].
//!
//! The modal never tears itself down. Transitions that close it say so in
//! their return value and the host drops or hides the session.

pub mod config;
pub mod normalize;

use std::fmt::{self, Display, Formatter};

use tracing::{debug, info, warn};

use crate::entity::{FormEntity, ValidationErrors};

pub use config::{ModalConfig, modal_config};
pub use normalize::{ApiErrorBody, FALLBACK_MESSAGE, SaveError, normalize};

/// What a modal session does with its record. Fixed for one session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Create,
    Edit,
    View,
}

/// Pure check of form data; empty result means valid.
pub type Validator<T> = fn(&T) -> ValidationErrors;

/// Persists a record. `id` is present only when editing.
pub trait Saver<T> {
    fn save(&mut self, data: &T, id: Option<&str>) -> Result<(), SaveError>;
}

impl<T, F> Saver<T> for F
where
    F: FnMut(&T, Option<&str>) -> Result<(), SaveError>,
{
    fn save(&mut self, data: &T, id: Option<&str>) -> Result<(), SaveError> {
        self(data, id)
    }
}

/// Work the host must perform after a successful validation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveRequest<T> {
    pub data: T,
    pub id: Option<String>,
}

/// Result of a submit attempt. `P` is what a save produced: a
/// [`SaveRequest`] for the two-phase API, a [`SaveOutcome`] for
/// [`EntityModal::submit_with`].
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome<P> {
    /// Closed, or a save is already in flight.
    Ignored,
    /// View mode: the modal closed without saving.
    Closed,
    /// Validation failed; invalid fields in the order the validator found them.
    Invalid { fields: Vec<String> },
    Save(P),
}

/// How a finished save left the modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Closed,
    /// Still open, showing this message in the server error banner.
    Failed(String),
}

/// Rejected `open`: a caller defect, reported instead of panicking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenError {
    /// Edit and view need the record to show.
    MissingRecord(Mode),
    /// Edit needs a record that can be addressed.
    MissingId,
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::MissingRecord(mode) => write!(f, "{mode:?} mode requires a record"),
            OpenError::MissingId => f.write_str("edit mode requires a record with an id"),
        }
    }
}

impl std::error::Error for OpenError {}

pub struct EntityModal<T: FormEntity> {
    validator: Validator<T>,
    initial: T,
    mode: Mode,
    open: bool,
    source: Option<T>,
    form: T,
    errors: ValidationErrors,
    submitting: bool,
    server_error: Option<String>,
    show_validation_errors: bool,
}

impl<T: FormEntity> EntityModal<T> {
    /// A closed modal whose create sessions start from `initial`.
    pub fn new(initial: T, validator: Validator<T>) -> Self {
        Self {
            validator,
            form: initial.clone(),
            initial,
            mode: Mode::Create,
            open: false,
            source: None,
            errors: ValidationErrors::new(),
            submitting: false,
            server_error: None,
            show_validation_errors: false,
        }
    }

    /// Start a session. Create seeds from the initial data; edit and view seed
    /// from `data`. Reopening discards whatever the previous session left.
    pub fn open(&mut self, mode: Mode, data: Option<T>) -> Result<(), OpenError> {
        if self.submitting {
            debug!(kind = %T::KIND, "open ignored while saving");
            return Ok(());
        }
        let form = match (mode, data) {
            (Mode::Create, _) => {
                self.source = None;
                self.initial.clone()
            }
            (Mode::Edit | Mode::View, None) => return Err(OpenError::MissingRecord(mode)),
            (Mode::Edit, Some(record)) if record.id().is_none() => {
                return Err(OpenError::MissingId);
            }
            (Mode::Edit | Mode::View, Some(record)) => {
                self.source = Some(record.clone());
                record
            }
        };
        self.mode = mode;
        self.form = form;
        self.open = true;
        self.clear_feedback();
        debug!(kind = %T::KIND, ?mode, "modal opened");
        Ok(())
    }

    /// The host's record changed while open: reseed edit and view sessions.
    /// Create sessions and in-flight saves are left alone.
    pub fn sync_source(&mut self, data: T) -> Result<(), OpenError> {
        if !self.open || self.submitting || self.mode == Mode::Create {
            return Ok(());
        }
        if self.source.as_ref() == Some(&data) {
            return Ok(());
        }
        self.open(self.mode, Some(data))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn form(&self) -> &T {
        &self.form
    }

    /// Replace the form data. Errors are not touched until the next submit.
    pub fn set_form(&mut self, form: T) {
        self.form = form;
    }

    /// Edit the form data in place. Errors are not touched until the next submit.
    pub fn update_form(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.form);
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    /// Invalid fields from the last validation pass, first found first.
    pub fn invalid_fields(&self) -> Vec<String> {
        self.errors.fields()
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    pub fn show_validation_errors(&self) -> bool {
        self.show_validation_errors
    }

    /// Validate the current form without storing anything.
    pub fn is_valid(&self) -> bool {
        (self.validator)(&self.form).is_empty()
    }

    pub fn config(&self) -> &'static ModalConfig {
        modal_config(T::KIND, self.mode)
    }

    /// Validate and, when valid, enter the submitting state and hand back the
    /// save the host has to run.
    pub fn submit(&mut self) -> SubmitOutcome<SaveRequest<T>> {
        if !self.open || self.submitting {
            debug!(kind = %T::KIND, "submit ignored");
            return SubmitOutcome::Ignored;
        }
        if self.mode == Mode::View {
            self.reset();
            return SubmitOutcome::Closed;
        }
        let errors = (self.validator)(&self.form);
        if !errors.is_empty() {
            let fields = errors.fields();
            debug!(kind = %T::KIND, ?fields, "validation failed");
            self.errors = errors;
            self.show_validation_errors = true;
            return SubmitOutcome::Invalid { fields };
        }
        self.errors.clear();
        self.show_validation_errors = false;
        self.server_error = None;
        self.submitting = true;
        let id = match self.mode {
            Mode::Edit => self
                .source
                .as_ref()
                .and_then(|s| s.id())
                .map(str::to_string),
            Mode::Create | Mode::View => None,
        };
        info!(kind = %T::KIND, mode = ?self.mode, id = id.as_deref().unwrap_or("-"), "saving");
        SubmitOutcome::Save(SaveRequest {
            data: self.form.clone(),
            id,
        })
    }

    /// Report the settled save. `None` when no save was outstanding.
    pub fn complete_save(&mut self, result: Result<(), SaveError>) -> Option<SaveOutcome> {
        if !self.submitting {
            return None;
        }
        self.submitting = false;
        match result {
            Ok(()) => {
                info!(kind = %T::KIND, mode = ?self.mode, "saved");
                self.reset();
                Some(SaveOutcome::Closed)
            }
            Err(err) => {
                let message = normalize(&err);
                warn!(kind = %T::KIND, error = %err, "save failed");
                self.server_error = Some(message.clone());
                Some(SaveOutcome::Failed(message))
            }
        }
    }

    /// [`submit`](Self::submit) and run the save immediately.
    pub fn submit_with<S: Saver<T>>(&mut self, saver: &mut S) -> SubmitOutcome<SaveOutcome> {
        match self.submit() {
            SubmitOutcome::Ignored => SubmitOutcome::Ignored,
            SubmitOutcome::Closed => SubmitOutcome::Closed,
            SubmitOutcome::Invalid { fields } => SubmitOutcome::Invalid { fields },
            SubmitOutcome::Save(request) => {
                let result = saver.save(&request.data, request.id.as_deref());
                match self.complete_save(result) {
                    Some(outcome) => SubmitOutcome::Save(outcome),
                    None => SubmitOutcome::Ignored,
                }
            }
        }
    }

    /// Cancel or backdrop dismissal. Refused while a save is in flight;
    /// returns whether the modal closed.
    pub fn close(&mut self) -> bool {
        if self.submitting {
            debug!(kind = %T::KIND, "close refused while saving");
            return false;
        }
        if self.open {
            self.reset();
        }
        true
    }

    pub fn dismiss_server_error(&mut self) {
        self.server_error = None;
    }

    /// Hide the summary banner; field-level errors stay.
    pub fn dismiss_validation_errors(&mut self) {
        self.show_validation_errors = false;
    }

    fn clear_feedback(&mut self) {
        self.errors.clear();
        self.server_error = None;
        self.show_validation_errors = false;
    }

    fn reset(&mut self) {
        self.form = match self.mode {
            Mode::Create => self.initial.clone(),
            Mode::Edit | Mode::View => self.source.take().unwrap_or_else(|| self.initial.clone()),
        };
        self.source = None;
        self.open = false;
        self.submitting = false;
        self.clear_feedback();
        debug!(kind = %T::KIND, mode = ?self.mode, "modal closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::records::{Room, validate_room};

    fn room(id: Option<&str>, name: &str, capacity: &str) -> Room {
        Room {
            id: id.map(str::to_string),
            name: name.into(),
            capacity: capacity.into(),
            floor: String::new(),
        }
    }

    fn modal() -> EntityModal<Room> {
        EntityModal::new(Room::default(), validate_room)
    }

    #[test]
    fn open_clears_previous_feedback() {
        let mut m = modal();
        m.open(Mode::Create, None).unwrap();
        assert!(matches!(m.submit(), SubmitOutcome::Invalid { .. }));
        assert!(m.show_validation_errors());
        assert!(m.close());

        m.open(Mode::Create, None).unwrap();
        assert!(m.errors().is_empty());
        assert!(!m.show_validation_errors());
        assert_eq!(m.server_error(), None);
    }

    #[test]
    fn edit_needs_an_addressable_record() {
        let mut m = modal();
        assert_eq!(m.open(Mode::Edit, None), Err(OpenError::MissingRecord(Mode::Edit)));
        assert_eq!(
            m.open(Mode::Edit, Some(room(None, "101", "30"))),
            Err(OpenError::MissingId)
        );
        assert!(!m.is_open());
        assert!(m.open(Mode::View, Some(room(None, "101", "30"))).is_ok());
    }

    #[test]
    fn edit_save_carries_the_source_id() {
        let mut m = modal();
        m.open(Mode::Edit, Some(room(Some("4"), "101", "30"))).unwrap();
        m.update_form(|r| r.capacity = "32".into());
        match m.submit() {
            SubmitOutcome::Save(req) => {
                assert_eq!(req.id.as_deref(), Some("4"));
                assert_eq!(req.data.capacity, "32");
            }
            other => panic!("expected save, got {other:?}"),
        }
        assert!(m.is_submitting());
        assert_eq!(m.complete_save(Ok(())), Some(SaveOutcome::Closed));
        assert!(!m.is_open());
    }

    #[test]
    fn create_save_has_no_id() {
        let mut m = modal();
        m.open(Mode::Create, None).unwrap();
        m.set_form(room(Some("99"), "Lab", "12"));
        match m.submit() {
            SubmitOutcome::Save(req) => assert_eq!(req.id, None),
            other => panic!("expected save, got {other:?}"),
        }
    }

    #[test]
    fn failed_save_keeps_the_form_for_retry() {
        let mut m = modal();
        m.open(Mode::Create, None).unwrap();
        m.set_form(room(None, "Lab", "12"));
        assert!(matches!(m.submit(), SubmitOutcome::Save(_)));
        let outcome = m.complete_save(Err(SaveError::from_message(
            "HTTP error! status: 409 - Room name already exists",
        )));
        assert_eq!(
            outcome,
            Some(SaveOutcome::Failed("Room name already exists".into()))
        );
        assert!(m.is_open());
        assert!(!m.is_submitting());
        assert_eq!(m.form().name, "Lab");

        // A new attempt clears the old banner before saving.
        assert!(matches!(m.submit(), SubmitOutcome::Save(_)));
        assert_eq!(m.server_error(), None);
    }

    #[test]
    fn complete_without_outstanding_save_is_ignored() {
        let mut m = modal();
        m.open(Mode::Create, None).unwrap();
        assert_eq!(m.complete_save(Ok(())), None);
        assert!(m.is_open());
    }

    #[test]
    fn close_resets_create_form_to_initial() {
        let initial = room(None, "", "20");
        let mut m = EntityModal::new(initial.clone(), validate_room);
        m.open(Mode::Create, None).unwrap();
        assert_eq!(m.form(), &initial);
        m.update_form(|r| r.name = "Gym".into());
        assert!(m.close());
        assert_eq!(m.form(), &initial);
    }

    #[test]
    fn sync_source_reseeds_open_edit_sessions() {
        let mut m = modal();
        m.open(Mode::Edit, Some(room(Some("1"), "101", "30"))).unwrap();
        m.update_form(|r| r.name = "local edit".into());
        m.sync_source(room(Some("1"), "101", "30")).unwrap();
        assert_eq!(m.form().name, "local edit");

        m.sync_source(room(Some("1"), "102", "30")).unwrap();
        assert_eq!(m.form().name, "102");
    }

    #[test]
    fn is_valid_does_not_store_errors() {
        let mut m = modal();
        m.open(Mode::Create, None).unwrap();
        assert!(!m.is_valid());
        assert!(m.errors().is_empty());
        assert!(!m.show_validation_errors());
        m.set_form(room(None, "Lab", "10"));
        assert!(m.is_valid());
    }

    #[test]
    fn config_follows_mode() {
        let mut m = modal();
        m.open(Mode::View, Some(room(Some("1"), "101", "30"))).unwrap();
        assert_eq!(m.config().submit_text, "Close");
    }
}
