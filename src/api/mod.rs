//! In-memory stand-in for the platform's REST API.
//!
//! Records are kept as JSON objects per entity kind, with string ids assigned
//! on create. The "server side" (`apply`) reports failures the
//! way the platform's HTTP client throws them, as loose JSON values; the
//! client side ([`InMemoryApi::save`]) classifies them with
//! [`SaveError::from_value`] before they reach the modal.
//!
//! With a backing file the whole store is rewritten after each successful save.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::entity::EntityKind;
use crate::entity::records::{parse_time, parse_weekday};
use crate::error::{Context, Result, simple_error};
use crate::modal::SaveError;

/// On-disk shape of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    records: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Default)]
pub struct InMemoryApi {
    records: BTreeMap<EntityKind, Vec<Value>>,
    next_id: u64,
    path: Option<PathBuf>,
}

/// Field that must be unique within a kind, if any.
fn unique_field(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::User => Some("login"),
        EntityKind::Room
        | EntityKind::Subject
        | EntityKind::Group
        | EntityKind::Organization => Some("name"),
        EntityKind::Schedule => None,
    }
}

pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// String value of `key`, empty when absent or not a string.
pub fn field_str<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

fn http_failure(status: u16, body: &str) -> Value {
    json!({ "message": format!("HTTP error! status: {status} - {body}") })
}

fn capitalized(kind: EntityKind) -> String {
    let s = kind.as_str();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// A store pre-filled with a small school.
    pub fn with_sample_data() -> Self {
        let mut api = Self::new();
        let seed: [(EntityKind, Value); 12] = [
            (EntityKind::User, json!({"login": "admin", "full_name": "Dilnoza Karimova", "role": "admin", "phone": "+998 90 111 22 33"})),
            (EntityKind::User, json!({"login": "a.lovelace", "full_name": "Ada Lovelace", "role": "teacher", "phone": ""})),
            (EntityKind::User, json!({"login": "t.jones", "full_name": "Tom Jones", "role": "student", "phone": "+44 20 7946 0958"})),
            (EntityKind::Room, json!({"name": "101", "capacity": "24", "floor": "1"})),
            (EntityKind::Room, json!({"name": "Lab 2", "capacity": "16", "floor": "2"})),
            (EntityKind::Subject, json!({"name": "Mathematics", "description": "Algebra and geometry"})),
            (EntityKind::Subject, json!({"name": "English", "description": ""})),
            (EntityKind::Group, json!({"name": "Math A1", "subject": "Mathematics", "teacher": "a.lovelace", "room": "101", "start_date": "2024-09-02"})),
            (EntityKind::Organization, json!({"name": "Northside Learning Center", "address": "12 Chilonzor St", "phone": "+998 71 200 00 00", "email": "office@northside.uz"})),
            (EntityKind::Schedule, json!({"group": "Math A1", "weekday": "mon", "start_time": "09:00", "end_time": "10:30", "room": "101"})),
            (EntityKind::Schedule, json!({"group": "Math A1", "weekday": "thu", "start_time": "09:00", "end_time": "10:30", "room": "101"})),
            (EntityKind::Group, json!({"name": "English B2", "subject": "English", "teacher": "a.lovelace", "room": "Lab 2", "start_date": ""})),
        ];
        for (kind, record) in seed {
            if let Err(thrown) = api.apply(kind, &record, None) {
                warn!(%kind, error = %thrown, "sample record rejected");
            }
        }
        api
    }

    /// Load the store from `path`, or seed sample data and write it there.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        let mut api = if path.exists() {
            Self::from_file(path)?
        } else {
            let api = Self::with_sample_data();
            api.write_file(path)?;
            info!(path = %path.display(), "seeded data file");
            api
        };
        api.path = Some(path.to_path_buf());
        Ok(api)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_ctx(|| format!("read {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&contents)
            .with_ctx(|| format!("parse {}", path.display()))?;
        let mut records = BTreeMap::new();
        for (key, rows) in snapshot.records {
            let kind = EntityKind::parse(&key)
                .ok_or_else(|| simple_error(format!("{}: unknown entity kind '{key}'", path.display())))?;
            records.insert(kind, rows);
        }
        Ok(Self {
            records,
            next_id: snapshot.next_id.max(1),
            path: None,
        })
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            next_id: self.next_id,
            records: self
                .records
                .iter()
                .map(|(kind, rows)| (kind.as_str().to_string(), rows.clone()))
                .collect(),
        };
        let text = serde_json::to_string_pretty(&snapshot).with_ctx(|| "encode records".to_string())?;
        std::fs::write(path, text).with_ctx(|| format!("write {}", path.display()))
    }

    pub fn list(&self, kind: EntityKind) -> Vec<Value> {
        self.records.get(&kind).cloned().unwrap_or_default()
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<Value> {
        self.records
            .get(&kind)?
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
    }

    /// Create (`id` absent) or update a record, as the platform client would.
    pub fn save(&mut self, kind: EntityKind, payload: &Value, id: Option<&str>) -> std::result::Result<(), SaveError> {
        self.apply(kind, payload, id)
            .map_err(|thrown| SaveError::from_value(&thrown))?;
        if let Some(path) = &self.path {
            if let Err(e) = self.write_file(path) {
                warn!(error = %e, "could not persist records");
            }
        }
        Ok(())
    }

    /// Server side of a save. Failures are the raw values the client throws.
    fn apply(&mut self, kind: EntityKind, payload: &Value, id: Option<&str>) -> std::result::Result<(), Value> {
        let Some(fields) = payload.as_object() else {
            return Err(http_failure(400, "Malformed record"));
        };
        let mut record: Map<String, Value> = fields.clone();
        record.remove("id");
        // Passwords are write-only.
        record.remove("password");

        let rows = self.records.entry(kind).or_default();
        let existing = match id {
            Some(id) => match rows.iter().position(|r| record_id(r) == Some(id)) {
                Some(idx) => Some(idx),
                None => return Err(http_failure(404, "Not found")),
            },
            None => None,
        };

        if let Some(key) = unique_field(kind) {
            let wanted = record.get(key).and_then(Value::as_str).unwrap_or("").trim();
            let taken = rows.iter().any(|r| {
                record_id(r) != id && field_str(r, key).trim().eq_ignore_ascii_case(wanted)
            });
            if taken {
                return Err(match kind {
                    EntityKind::User => json!({
                        "parsedError": { "error": "Login taken" },
                        "message": "HTTP error! status: 400 - Bad Request"
                    }),
                    _ => http_failure(409, &format!("{} name already exists", capitalized(kind))),
                });
            }
        }

        if kind == EntityKind::Schedule {
            let candidate = Value::Object(record.clone());
            if rows
                .iter()
                .any(|r| record_id(r) != id && slots_clash(r, &candidate))
            {
                return Err(json!({ "parsedError": { "title": "Room is busy at this time" } }));
            }
        }

        match existing {
            Some(idx) => {
                let id = id.unwrap_or_default().to_string();
                record.insert("id".into(), Value::String(id.clone()));
                rows[idx] = Value::Object(record);
                debug!(%kind, %id, "record updated");
            }
            None => {
                let id = self.next_id.to_string();
                self.next_id += 1;
                record.insert("id".into(), Value::String(id.clone()));
                rows.push(Value::Object(record));
                debug!(%kind, %id, "record created");
            }
        }
        Ok(())
    }
}

/// Same room, same weekday, overlapping times. Unparseable slots never clash.
fn slots_clash(a: &Value, b: &Value) -> bool {
    let room = field_str(a, "room").trim();
    if room.is_empty() || !room.eq_ignore_ascii_case(field_str(b, "room").trim()) {
        return false;
    }
    match (parse_weekday(field_str(a, "weekday")), parse_weekday(field_str(b, "weekday"))) {
        (Some(x), Some(y)) if x == y => {}
        _ => return false,
    }
    let span = |r: &Value| -> Option<(NaiveTime, NaiveTime)> {
        Some((
            parse_time(field_str(r, "start_time"))?,
            parse_time(field_str(r, "end_time"))?,
        ))
    };
    match (span(a), span(b)) {
        (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_increasing_ids() {
        let mut api = InMemoryApi::new();
        api.save(EntityKind::Room, &json!({"name": "A", "capacity": "10"}), None).unwrap();
        api.save(EntityKind::Room, &json!({"name": "B", "capacity": "10", "id": "77"}), None).unwrap();
        let ids: Vec<_> = api
            .list(EntityKind::Room)
            .iter()
            .map(|r| record_id(r).unwrap_or("").to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn duplicate_login_is_a_structured_error() {
        let mut api = InMemoryApi::with_sample_data();
        let err = api
            .save(EntityKind::User, &json!({"login": "ADMIN", "full_name": "x", "role": "admin"}), None)
            .unwrap_err();
        assert_eq!(err.user_message(), "Login taken");
    }

    #[test]
    fn duplicate_name_is_an_http_conflict() {
        let mut api = InMemoryApi::with_sample_data();
        let err = api
            .save(EntityKind::Room, &json!({"name": "lab 2", "capacity": "5"}), None)
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.user_message(), "Room name already exists");
    }

    #[test]
    fn update_keeps_its_own_name_and_id() {
        let mut api = InMemoryApi::new();
        api.save(EntityKind::Subject, &json!({"name": "Art"}), None).unwrap();
        api.save(EntityKind::Subject, &json!({"name": "Art", "description": "Drawing"}), Some("1"))
            .unwrap();
        let art = api.get(EntityKind::Subject, "1").unwrap();
        assert_eq!(field_str(&art, "description"), "Drawing");
        assert_eq!(api.list(EntityKind::Subject).len(), 1);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let mut api = InMemoryApi::new();
        let err = api
            .save(EntityKind::Subject, &json!({"name": "Art"}), Some("9"))
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "Not found");
    }

    #[test]
    fn overlapping_slots_in_one_room_clash() {
        let mut api = InMemoryApi::with_sample_data();
        let clash = json!({"group": "English B2", "weekday": "Monday", "start_time": "10:00", "end_time": "11:00", "room": "101"});
        let err = api.save(EntityKind::Schedule, &clash, None).unwrap_err();
        assert_eq!(err.user_message(), "Room is busy at this time");

        let later = json!({"group": "English B2", "weekday": "mon", "start_time": "10:30", "end_time": "12:00", "room": "101"});
        assert!(api.save(EntityKind::Schedule, &later, None).is_ok());
    }

    #[test]
    fn every_sample_record_is_accepted() {
        let api = InMemoryApi::with_sample_data();
        let total: usize = EntityKind::ALL.iter().map(|k| api.list(*k).len()).sum();
        assert_eq!(total, 12);
        assert_eq!(api.list(EntityKind::Schedule).len(), 2);
        assert_eq!(api.list(EntityKind::Group).len(), 2);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let mut api = InMemoryApi::new();
        let err = api.save(EntityKind::Room, &json!([1, 2]), None).unwrap_err();
        assert_eq!(err.user_message(), "Malformed record");
    }
}
