//! Entity kinds and the capabilities a record type offers to the modal.
//!
//! A record type plugs into the generic modal by implementing:
//! - [`FormEntity`]: which kind it is and how to address it for updates
//! - [`FormFields`]: the ordered fields the host renders and edits as text
//!
//! Validation results are carried by [`ValidationErrors`].

pub mod records;

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Category of record a modal manages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Room,
    Subject,
    Group,
    Organization,
    Schedule,
}

impl EntityKind {
    /// Every registered kind, in tab order.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Room,
        EntityKind::Subject,
        EntityKind::Group,
        EntityKind::Organization,
        EntityKind::Schedule,
    ];

    /// Stable lowercase key, used in the data file.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Room => "room",
            EntityKind::Subject => "subject",
            EntityKind::Group => "group",
            EntityKind::Organization => "organization",
            EntityKind::Schedule => "schedule",
        }
    }

    /// Plural label for tabs and table titles.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::User => "Users",
            EntityKind::Room => "Rooms",
            EntityKind::Subject => "Subjects",
            EntityKind::Group => "Groups",
            EntityKind::Organization => "Organizations",
            EntityKind::Schedule => "Schedules",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type the modal can manage.
pub trait FormEntity: Clone + Default + PartialEq + fmt::Debug {
    const KIND: EntityKind;

    /// Identifier used to address an update; `None` for records not yet created.
    fn id(&self) -> Option<&str>;
}

/// How the host should present a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldInput {
    Text,
    /// Rendered masked.
    Secret,
    Number,
}

/// One editable field of a record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
    pub required: bool,
}

impl FieldSpec {
    pub const fn text(key: &'static str, label: &'static str, required: bool) -> Self {
        Self { key, label, input: FieldInput::Text, required }
    }

    pub const fn secret(key: &'static str, label: &'static str, required: bool) -> Self {
        Self { key, label, input: FieldInput::Secret, required }
    }

    pub const fn number(key: &'static str, label: &'static str, required: bool) -> Self {
        Self { key, label, input: FieldInput::Number, required }
    }
}

/// Field access the host uses to render and edit a record.
///
/// Values are plain text: what the user typed. Whether the text is acceptable
/// is decided by the record's validator, never by the setter.
pub trait FormFields: FormEntity + Serialize + DeserializeOwned {
    /// Fields in display order. Validators report errors in the same order.
    fn fields() -> &'static [FieldSpec];

    fn field(&self, key: &str) -> Option<&str>;

    fn field_mut(&mut self, key: &str) -> Option<&mut String>;

    /// The validator the host injects into the modal for this record type.
    fn validator() -> fn(&Self) -> ValidationErrors;
}

/// Field name to message, in the order the validator found them.
///
/// Empty means valid; there is no other validity signal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. A field already present keeps its position and the
    /// first message.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        if !self.contains(&field) {
            self.entries.push((field, message.into()));
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(f, _)| f == field)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Invalid field names, first found first.
    pub fn fields(&self) -> Vec<String> {
        self.entries.iter().map(|(f, _)| f.clone()).collect()
    }

    pub fn first_field(&self) -> Option<&str> {
        self.entries.first().map(|(f, _)| f.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ValidationErrors
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut errors = Self::new();
        for (k, v) in iter {
            errors.insert(k, v);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cycle_in_tab_order() {
        assert_eq!(EntityKind::User.next(), EntityKind::Room);
        assert_eq!(EntityKind::Schedule.next(), EntityKind::User);
        assert_eq!(EntityKind::User.prev(), EntityKind::Schedule);
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("teacher"), None);
    }

    #[test]
    fn errors_keep_first_position_and_message() {
        let mut errors = ValidationErrors::new();
        errors.insert("name", "Name is required");
        errors.insert("capacity", "Capacity must be a number");
        errors.insert("name", "ignored");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first_field(), Some("name"));
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.fields(), vec!["name".to_string(), "capacity".to_string()]);

        assert_eq!(errors.remove("name").as_deref(), Some("Name is required"));
        assert_eq!(errors.first_field(), Some("capacity"));
    }
}
