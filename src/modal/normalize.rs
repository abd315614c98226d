//! Save failures and the message shown for them.
//!
//! The API client can fail in several shapes: a structured error envelope, an
//! HTTP status line folded into a message, a bare message, or nothing usable.
//! [`SaveError::from_value`] classifies a thrown value once at the client
//! boundary; [`normalize`] turns the classification into exactly one
//! non-empty, human-readable line.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown when nothing better can be extracted.
pub const FALLBACK_MESSAGE: &str = "An error occurred while performing the operation";

const HTTP_PREFIX: &str = "HTTP error!";
const HTTP_STATUS_MARKER: &str = "HTTP error! status: ";
const HTTP_BODY_SEPARATOR: &str = " - ";

/// Structured error envelope the API attaches to failed responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// `error`, then `title`, then `message`; empty strings do not count.
    pub fn best_message(&self) -> Option<&str> {
        [&self.error, &self.title, &self.message]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

/// Why a save did not go through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveError {
    /// The API answered with a structured envelope.
    Api(ApiErrorBody),
    /// Only a status line was available. `status` is `None` when the code
    /// does not fit an HTTP status.
    Http { status: Option<u16>, body: String },
    /// A plain message from the client or transport.
    Message(String),
    Unknown,
}

impl SaveError {
    /// Classify a value thrown by the API client.
    ///
    /// A `parsedError` object wins when it carries any usable field; otherwise
    /// the top-level `message` is inspected. A bare JSON string is treated as
    /// a message.
    pub fn from_value(value: &Value) -> Self {
        if let Some(parsed) = value.get("parsedError") {
            let body = ApiErrorBody {
                error: string_field(parsed, "error"),
                title: string_field(parsed, "title"),
                message: string_field(parsed, "message"),
            };
            if body.best_message().is_some() {
                return SaveError::Api(body);
            }
        }
        match value
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| value.as_str())
        {
            Some(message) => Self::from_message(message),
            None => SaveError::Unknown,
        }
    }

    /// Classify a bare error message.
    pub fn from_message(message: &str) -> Self {
        if let Some((status, body)) = parse_http_message(message) {
            return SaveError::Http {
                status,
                body: body.to_string(),
            };
        }
        if message.is_empty() || message.starts_with(HTTP_PREFIX) {
            SaveError::Unknown
        } else {
            SaveError::Message(message.to_string())
        }
    }

    /// HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SaveError::Http { status, .. } => *status,
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        normalize(self)
    }
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Api(body) => {
                write!(f, "api error: {}", body.best_message().unwrap_or("<empty>"))
            }
            SaveError::Http {
                status: Some(status),
                body,
            } => write!(f, "http {status}: {body}"),
            SaveError::Http { status: None, body } => write!(f, "http error: {body}"),
            SaveError::Message(m) => f.write_str(m),
            SaveError::Unknown => f.write_str("unknown save failure"),
        }
    }
}

impl std::error::Error for SaveError {}

/// The single line shown to the user for a failed save. Never empty.
pub fn normalize(err: &SaveError) -> String {
    let message = match err {
        SaveError::Api(body) => body.best_message(),
        SaveError::Http { body, .. } if !body.is_empty() => Some(body.as_str()),
        SaveError::Message(m) if !m.is_empty() && !m.starts_with(HTTP_PREFIX) => {
            Some(m.as_str())
        }
        SaveError::Http { .. } | SaveError::Message(_) | SaveError::Unknown => None,
    };
    message.unwrap_or(FALLBACK_MESSAGE).to_string()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Match `HTTP error! status: <digits> - <rest>` anywhere in `message`.
fn parse_http_message(message: &str) -> Option<(Option<u16>, &str)> {
    let start = message.find(HTTP_STATUS_MARKER)?;
    let after = &message[start + HTTP_STATUS_MARKER.len()..];
    let digits = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    if digits == 0 {
        return None;
    }
    let status = after[..digits].parse().ok();
    let rest = after[digits..].strip_prefix(HTTP_BODY_SEPARATOR)?;
    if rest.is_empty() {
        None
    } else {
        Some((status, rest))
    }
}
