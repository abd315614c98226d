//! Application state types and entry glue.
//!
//! Defines the dashboard state, the color theme, config file resolution, and
//! re-exports the event loop as `run`.
//!
pub mod keymap;
pub mod session;
pub mod update;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ratatui::style::Color;
use serde_json::Value;
use tracing::warn;

use crate::api::InMemoryApi;
use crate::entity::EntityKind;
use crate::modal::SaveError;
use keymap::Keymap;
use session::ModalSession;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
    Help,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub warning: Color,
}

impl Theme {
    /// Plain 16-color theme for terminals without truecolor.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::Red,
            warning: Color::Yellow,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
            warning: Color::Rgb(0xfa, 0xb3, 0x87),      // peach
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut Color> {
        match key {
            "text" => Some(&mut self.text),
            "muted" => Some(&mut self.muted),
            "title" => Some(&mut self.title),
            "border" => Some(&mut self.border),
            "header_bg" => Some(&mut self.header_bg),
            "header_fg" => Some(&mut self.header_fg),
            "status_bg" => Some(&mut self.status_bg),
            "status_fg" => Some(&mut self.status_fg),
            "highlight_fg" => Some(&mut self.highlight_fg),
            "highlight_bg" => Some(&mut self.highlight_bg),
            "error" => Some(&mut self.error),
            "warning" => Some(&mut self.warning),
            _ => None,
        }
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut theme = Self::mocha();

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            if let (Some(color), Some(slot)) = (parse_color(val), theme.slot(key.trim())) {
                *slot = color;
            }
        }

        Some(theme)
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# eduadmin theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");

        for (key, color) in [
            ("text", self.text),
            ("muted", self.muted),
            ("title", self.title),
            ("border", self.border),
            ("header_bg", self.header_bg),
            ("header_fg", self.header_fg),
            ("status_bg", self.status_bg),
            ("status_fg", self.status_fg),
            ("highlight_fg", self.highlight_fg),
            ("highlight_bg", self.highlight_bg),
            ("error", self.error),
            ("warning", self.warning),
        ] {
            let _ = writeln!(&mut buf, "{} = {}", key, color_to_str(color));
        }

        std::fs::write(path, buf)
    }

    /// Load the theme at `path`; if missing, write the default there and return it.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            warn!(path = %path.display(), error = %e, "could not write default theme");
        }
        t
    }
}

/// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
pub fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn color_to_str(c: Color) -> String {
    match c {
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Reset => "reset".to_string(),
        // Named colors get a best-effort hex approximation
        Color::Black => "#000000".to_string(),
        Color::Red => "#FF0000".to_string(),
        Color::Green => "#00FF00".to_string(),
        Color::Yellow => "#FFFF00".to_string(),
        Color::Blue => "#0000FF".to_string(),
        Color::Magenta => "#FF00FF".to_string(),
        Color::Cyan => "#00FFFF".to_string(),
        Color::Gray => "#B3B3B3".to_string(),
        Color::DarkGray => "#4D4D4D".to_string(),
        Color::LightRed => "#FF6666".to_string(),
        Color::LightGreen => "#66FF66".to_string(),
        Color::LightYellow => "#FFFF66".to_string(),
        Color::LightBlue => "#6666FF".to_string(),
        Color::LightMagenta => "#FF66FF".to_string(),
        Color::LightCyan => "#66FFFF".to_string(),
        Color::White => "#FFFFFF".to_string(),
        Color::Indexed(_) => "reset".to_string(),
    }
}

/// Directory holding `theme.conf` and `keybinds.conf`.
///
/// `explicit` wins, then `$XDG_CONFIG_HOME/eduadmin`, then
/// `$HOME/.config/eduadmin`, then the working directory.
pub fn config_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    let from_env = |var: &str| {
        std::env::var_os(var)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };
    if let Some(xdg) = from_env("XDG_CONFIG_HOME") {
        return xdg.join("eduadmin");
    }
    if let Some(home) = from_env("HOME") {
        return home.join(".config").join("eduadmin");
    }
    PathBuf::from(".")
}

/// Path of `name` inside the config directory, creating the directory when possible.
pub fn config_file_path(dir: &Path, name: &str) -> PathBuf {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "could not create config directory");
    }
    dir.join(name)
}

pub struct AppState {
    pub api: Arc<Mutex<InMemoryApi>>,
    pub active_kind: EntityKind,
    pub rows_all: Vec<Value>,
    pub rows: Vec<Value>,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub session: Option<Box<dyn ModalSession>>,
    /// Id of the record the open edit or view session was seeded from.
    pub session_record_id: Option<String>,
    /// One-line feedback shown in the status bar.
    pub status: Option<String>,
    /// Simulated network delay applied to every save.
    pub save_latency: Duration,
    pub(crate) save_tx: Sender<Result<(), SaveError>>,
    pub(crate) save_rx: Receiver<Result<(), SaveError>>,
}

impl AppState {
    pub fn new(api: InMemoryApi, theme: Theme, keymap: Keymap) -> Self {
        let (save_tx, save_rx) = mpsc::channel();
        let mut app = Self {
            api: Arc::new(Mutex::new(api)),
            active_kind: EntityKind::User,
            rows_all: Vec::new(),
            rows: Vec::new(),
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme,
            keymap,
            session: None,
            session_record_id: None,
            status: None,
            save_latency: Duration::ZERO,
            save_tx,
            save_rx,
        };
        app.reload_rows();
        app
    }

    /// Re-read the active kind from the API and re-apply the search query.
    pub fn reload_rows(&mut self) {
        self.rows_all = match self.api.lock() {
            Ok(api) => api.list(self.active_kind),
            Err(_) => {
                warn!("api state poisoned; keeping previous rows");
                return;
            }
        };
        crate::search::apply_search(self);
        self.refresh_session_source();
    }

    /// Hand the open session the current copy of its record.
    fn refresh_session_source(&mut self) {
        let (Some(session), Some(id)) = (self.session.as_mut(), self.session_record_id.as_deref()) else {
            return;
        };
        if session.kind() != self.active_kind {
            return;
        }
        if let Some(record) = self
            .rows_all
            .iter()
            .find(|r| crate::api::record_id(r) == Some(id))
        {
            session.refresh_source(record);
        }
    }

    pub fn switch_kind(&mut self, kind: EntityKind) {
        self.active_kind = kind;
        self.search_query.clear();
        self.selected_index = 0;
        self.reload_rows();
    }

    pub fn selected_record(&self) -> Option<&Value> {
        self.rows.get(self.selected_index)
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color_accepts_hex_and_reset() {
        assert_eq!(parse_color("#3B82F6"), Some(Color::Rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(parse_color(" 10b981 "), Some(Color::Rgb(0x10, 0xb9, 0x81)));
        assert_eq!(parse_color("Reset"), Some(Color::Reset));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#GG0000"), None);
    }

    #[test]
    fn explicit_config_dir_wins() {
        let dir = Path::new("/tmp/eduadmin-explicit");
        assert_eq!(config_dir(Some(dir)), dir.to_path_buf());
    }

    #[test]
    fn switch_kind_resets_search_and_selection() {
        let mut app = AppState::new(InMemoryApi::with_sample_data(), Theme::dark(), Keymap::default());
        app.search_query = "zzz".into();
        crate::search::apply_search(&mut app);
        assert!(app.rows.is_empty());

        app.switch_kind(EntityKind::Schedule);
        assert!(app.search_query.is_empty());
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.selected_index, 0);
        assert!(app.selected_record().is_some());
    }
}
