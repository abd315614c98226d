//! Form records for every registered entity kind, with their validators.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::{EntityKind, FieldSpec, FormEntity, FormFields, ValidationErrors};

pub const USER_ROLES: [&str; 3] = ["admin", "teacher", "student"];

const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_ROOM_CAPACITY: u32 = 500;

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn require(errors: &mut ValidationErrors, key: &str, value: &str, message: &str) {
    if is_blank(value) {
        errors.insert(key, message);
    }
}

/// `+` optional, then digits with optional spaces or dashes; 7 to 15 digits.
fn is_valid_phone(s: &str) -> bool {
    let body = s.trim().strip_prefix('+').unwrap_or(s.trim());
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}

/// Platform account: administrator, teacher or student.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub login: String,
    pub full_name: String,
    pub role: String,
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
}

impl FormEntity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormFields for User {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("login", "Login", true),
            FieldSpec::text("full_name", "Full name", true),
            FieldSpec::text("role", "Role (admin/teacher/student)", true),
            FieldSpec::text("phone", "Phone", false),
            FieldSpec::secret("password", "Password", false),
        ];
        FIELDS
    }

    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "login" => Some(&self.login),
            "full_name" => Some(&self.full_name),
            "role" => Some(&self.role),
            "phone" => Some(&self.phone),
            "password" => Some(&self.password),
            _ => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "login" => Some(&mut self.login),
            "full_name" => Some(&mut self.full_name),
            "role" => Some(&mut self.role),
            "phone" => Some(&mut self.phone),
            "password" => Some(&mut self.password),
            _ => None,
        }
    }

    fn validator() -> fn(&Self) -> ValidationErrors {
        validate_user
    }
}

/// Password is mandatory only for accounts that do not exist yet.
pub fn validate_user(user: &User) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let login = user.login.trim();
    if login.is_empty() {
        errors.insert("login", "Login is required");
    } else if !(3..=32).contains(&login.chars().count()) {
        errors.insert("login", "Login must be 3 to 32 characters long");
    } else if !login
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        errors.insert("login", "Login may only contain letters, digits, '_' and '.'");
    }
    require(&mut errors, "full_name", &user.full_name, "Full name is required");
    if is_blank(&user.role) {
        errors.insert("role", "Role is required");
    } else if !USER_ROLES.contains(&user.role.trim()) {
        errors.insert("role", "Role must be admin, teacher or student");
    }
    if !is_blank(&user.phone) && !is_valid_phone(&user.phone) {
        errors.insert("phone", "Phone number is invalid");
    }
    if user.id.is_none() && user.password.is_empty() {
        errors.insert("password", "Password is required");
    } else if !user.password.is_empty() && user.password.chars().count() < 6 {
        errors.insert("password", "Password must be at least 6 characters");
    }
    errors
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub capacity: String,
    pub floor: String,
}

impl FormEntity for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormFields for Room {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name", "Name", true),
            FieldSpec::number("capacity", "Capacity", true),
            FieldSpec::number("floor", "Floor", false),
        ];
        FIELDS
    }

    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "capacity" => Some(&self.capacity),
            "floor" => Some(&self.floor),
            _ => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "name" => Some(&mut self.name),
            "capacity" => Some(&mut self.capacity),
            "floor" => Some(&mut self.floor),
            _ => None,
        }
    }

    fn validator() -> fn(&Self) -> ValidationErrors {
        validate_room
    }
}

pub fn validate_room(room: &Room) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    require(&mut errors, "name", &room.name, "Room name is required");
    if is_blank(&room.capacity) {
        errors.insert("capacity", "Capacity is required");
    } else {
        match room.capacity.trim().parse::<u32>() {
            Ok(n) if (1..=MAX_ROOM_CAPACITY).contains(&n) => {}
            Ok(_) => errors.insert(
                "capacity",
                format!("Capacity must be between 1 and {MAX_ROOM_CAPACITY}"),
            ),
            Err(_) => errors.insert("capacity", "Capacity must be a whole number"),
        }
    }
    if !is_blank(&room.floor) && room.floor.trim().parse::<i32>().is_err() {
        errors.insert("floor", "Floor must be a whole number");
    }
    errors
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
}

impl FormEntity for Subject {
    const KIND: EntityKind = EntityKind::Subject;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormFields for Subject {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name", "Name", true),
            FieldSpec::text("description", "Description", false),
        ];
        FIELDS
    }

    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "description" => Some(&self.description),
            _ => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "name" => Some(&mut self.name),
            "description" => Some(&mut self.description),
            _ => None,
        }
    }

    fn validator() -> fn(&Self) -> ValidationErrors {
        validate_subject
    }
}

pub fn validate_subject(subject: &Subject) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    require(&mut errors, "name", &subject.name, "Subject name is required");
    if subject.description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.insert(
            "description",
            format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters"),
        );
    }
    errors
}

/// Study group: a subject taught by one teacher, usually in one room.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
    pub start_date: String,
}

impl FormEntity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormFields for Group {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name", "Name", true),
            FieldSpec::text("subject", "Subject", true),
            FieldSpec::text("teacher", "Teacher", true),
            FieldSpec::text("room", "Room", false),
            FieldSpec::text("start_date", "Start date (YYYY-MM-DD)", false),
        ];
        FIELDS
    }

    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "subject" => Some(&self.subject),
            "teacher" => Some(&self.teacher),
            "room" => Some(&self.room),
            "start_date" => Some(&self.start_date),
            _ => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "name" => Some(&mut self.name),
            "subject" => Some(&mut self.subject),
            "teacher" => Some(&mut self.teacher),
            "room" => Some(&mut self.room),
            "start_date" => Some(&mut self.start_date),
            _ => None,
        }
    }

    fn validator() -> fn(&Self) -> ValidationErrors {
        validate_group
    }
}

pub fn validate_group(group: &Group) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    require(&mut errors, "name", &group.name, "Group name is required");
    require(&mut errors, "subject", &group.subject, "Subject is required");
    require(&mut errors, "teacher", &group.teacher, "Teacher is required");
    if !is_blank(&group.start_date) && parse_date(&group.start_date).is_none() {
        errors.insert("start_date", "Start date must look like 2024-09-01");
    }
    errors
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl FormEntity for Organization {
    const KIND: EntityKind = EntityKind::Organization;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormFields for Organization {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name", "Name", true),
            FieldSpec::text("address", "Address", false),
            FieldSpec::text("phone", "Phone", false),
            FieldSpec::text("email", "Email", false),
        ];
        FIELDS
    }

    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "address" => Some(&self.address),
            "phone" => Some(&self.phone),
            "email" => Some(&self.email),
            _ => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "name" => Some(&mut self.name),
            "address" => Some(&mut self.address),
            "phone" => Some(&mut self.phone),
            "email" => Some(&mut self.email),
            _ => None,
        }
    }

    fn validator() -> fn(&Self) -> ValidationErrors {
        validate_organization
    }
}

pub fn validate_organization(org: &Organization) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    require(&mut errors, "name", &org.name, "Organization name is required");
    if !is_blank(&org.phone) && !is_valid_phone(&org.phone) {
        errors.insert("phone", "Phone number is invalid");
    }
    if !is_blank(&org.email) && !is_valid_email(&org.email) {
        errors.insert("email", "Email address is invalid");
    }
    errors
}

/// Weekly lesson slot of a group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub group: String,
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

impl FormEntity for Schedule {
    const KIND: EntityKind = EntityKind::Schedule;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormFields for Schedule {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("group", "Group", true),
            FieldSpec::text("weekday", "Weekday (mon..sun)", true),
            FieldSpec::text("start_time", "Starts (HH:MM)", true),
            FieldSpec::text("end_time", "Ends (HH:MM)", true),
            FieldSpec::text("room", "Room", false),
        ];
        FIELDS
    }

    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "group" => Some(&self.group),
            "weekday" => Some(&self.weekday),
            "start_time" => Some(&self.start_time),
            "end_time" => Some(&self.end_time),
            "room" => Some(&self.room),
            _ => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "group" => Some(&mut self.group),
            "weekday" => Some(&mut self.weekday),
            "start_time" => Some(&mut self.start_time),
            "end_time" => Some(&mut self.end_time),
            "room" => Some(&mut self.room),
            _ => None,
        }
    }

    fn validator() -> fn(&Self) -> ValidationErrors {
        validate_schedule
    }
}

pub fn validate_schedule(slot: &Schedule) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    require(&mut errors, "group", &slot.group, "Group is required");
    if is_blank(&slot.weekday) {
        errors.insert("weekday", "Weekday is required");
    } else if parse_weekday(&slot.weekday).is_none() {
        errors.insert("weekday", "Weekday must be one of mon, tue, wed, thu, fri, sat, sun");
    }
    let start = parse_time(&slot.start_time);
    let end = parse_time(&slot.end_time);
    if start.is_none() {
        errors.insert("start_time", "Start time must look like 09:00");
    }
    if end.is_none() {
        errors.insert("end_time", "End time must look like 10:30");
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            errors.insert("end_time", "End time must be after the start time");
        }
    }
    errors
}

/// Field specs of a kind, for hosts that hold records untyped.
pub fn field_specs(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::User => User::fields(),
        EntityKind::Room => Room::fields(),
        EntityKind::Subject => Subject::fields(),
        EntityKind::Group => Group::fields(),
        EntityKind::Organization => Organization::fields(),
        EntityKind::Schedule => Schedule::fields(),
    }
}
