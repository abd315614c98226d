//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Bindings live in two scopes. Dashboard keys act on the record list; form
//! keys act on the open modal, where any unbound printable key is text input.

use std::collections::HashMap;
use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

/// Where an action applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyScope {
    Dashboard,
    Form,
}

/// Semantic keyboard actions that can be bound to key combinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    OpenHelp,
    StartSearch,
    /// Open the create modal for the active kind.
    NewRecord,
    /// Open the edit modal for the selected record.
    EditRecord,
    /// Open the read-only modal for the selected record.
    ViewRecord,
    NextKind,
    PrevKind,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Swallow the key.
    Ignore,
    Submit,
    CloseModal,
    NextField,
    PrevField,
    DeleteChar,
    DismissServerError,
    DismissValidation,
}

const ACTION_NAMES: [(KeyAction, &str); 20] = [
    (KeyAction::Quit, "Quit"),
    (KeyAction::OpenHelp, "OpenHelp"),
    (KeyAction::StartSearch, "StartSearch"),
    (KeyAction::NewRecord, "NewRecord"),
    (KeyAction::EditRecord, "EditRecord"),
    (KeyAction::ViewRecord, "ViewRecord"),
    (KeyAction::NextKind, "NextKind"),
    (KeyAction::PrevKind, "PrevKind"),
    (KeyAction::MoveUp, "MoveUp"),
    (KeyAction::MoveDown, "MoveDown"),
    (KeyAction::PageUp, "PageUp"),
    (KeyAction::PageDown, "PageDown"),
    (KeyAction::Ignore, "Ignore"),
    (KeyAction::Submit, "Submit"),
    (KeyAction::CloseModal, "CloseModal"),
    (KeyAction::NextField, "NextField"),
    (KeyAction::PrevField, "PrevField"),
    (KeyAction::DeleteChar, "DeleteChar"),
    (KeyAction::DismissServerError, "DismissServerError"),
    (KeyAction::DismissValidation, "DismissValidation"),
];

impl KeyAction {
    pub fn scope(self) -> KeyScope {
        match self {
            KeyAction::Submit
            | KeyAction::CloseModal
            | KeyAction::NextField
            | KeyAction::PrevField
            | KeyAction::DeleteChar
            | KeyAction::DismissServerError
            | KeyAction::DismissValidation => KeyScope::Form,
            _ => KeyScope::Dashboard,
        }
    }

    pub fn name(self) -> &'static str {
        ACTION_NAMES
            .iter()
            .find(|(a, _)| *a == self)
            .map(|(_, n)| *n)
            .unwrap_or("Ignore")
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        ACTION_NAMES.iter().find(|(_, n)| *n == s).map(|(a, _)| *a)
    }
}

/// Modifiers plus key code, the unit a binding matches.
pub type Binding = (KeyModifiers, KeyCode);

/// Maps key combinations to actions, per scope.
#[derive(Clone, Debug)]
pub struct Keymap {
    dashboard: HashMap<Binding, KeyAction>,
    form: HashMap<Binding, KeyAction>,
}

impl Keymap {
    /// Create a keymap with default keybindings.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut km = Self {
            dashboard: HashMap::new(),
            form: HashMap::new(),
        };
        for (key, action) in [
            ((M::NONE, Char('q')), KeyAction::Quit),
            ((M::NONE, Esc), KeyAction::Ignore),
            ((M::NONE, Char('?')), KeyAction::OpenHelp),
            ((M::NONE, Char('/')), KeyAction::StartSearch),
            ((M::NONE, Char('n')), KeyAction::NewRecord),
            ((M::NONE, Char('e')), KeyAction::EditRecord),
            ((M::NONE, Enter), KeyAction::EditRecord),
            ((M::NONE, Char('v')), KeyAction::ViewRecord),
            ((M::NONE, Tab), KeyAction::NextKind),
            // Shift+Tab is BackTab in crossterm
            ((M::NONE, BackTab), KeyAction::PrevKind),
            ((M::NONE, Up), KeyAction::MoveUp),
            ((M::NONE, Down), KeyAction::MoveDown),
            ((M::NONE, Char('k')), KeyAction::MoveUp),
            ((M::NONE, Char('j')), KeyAction::MoveDown),
            ((M::NONE, PageUp), KeyAction::PageUp),
            ((M::NONE, PageDown), KeyAction::PageDown),
            ((M::NONE, Left), KeyAction::PageUp),
            ((M::NONE, Right), KeyAction::PageDown),
            ((M::NONE, Enter), KeyAction::Submit),
            ((M::CONTROL, Char('s')), KeyAction::Submit),
            ((M::NONE, Esc), KeyAction::CloseModal),
            ((M::NONE, Tab), KeyAction::NextField),
            ((M::NONE, Down), KeyAction::NextField),
            ((M::NONE, BackTab), KeyAction::PrevField),
            ((M::NONE, Up), KeyAction::PrevField),
            ((M::NONE, Backspace), KeyAction::DeleteChar),
            ((M::CONTROL, Char('e')), KeyAction::DismissServerError),
            ((M::CONTROL, Char('w')), KeyAction::DismissValidation),
        ] {
            km.bind(key, action);
        }
        km
    }

    /// Bind `key` to `action` in the action's scope, replacing any previous binding.
    pub fn bind(&mut self, key: Binding, action: KeyAction) {
        self.table_mut(action.scope()).insert(key, action);
    }

    fn table(&self, scope: KeyScope) -> &HashMap<Binding, KeyAction> {
        match scope {
            KeyScope::Dashboard => &self.dashboard,
            KeyScope::Form => &self.form,
        }
    }

    fn table_mut(&mut self, scope: KeyScope) -> &mut HashMap<Binding, KeyAction> {
        match scope {
            KeyScope::Dashboard => &mut self.dashboard,
            KeyScope::Form => &mut self.form,
        }
    }

    /// Load a keymap from a file, or create defaults and write them there.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            warn!(path = %path.display(), error = %e, "could not write default keybindings");
        }
        km
    }

    /// Defaults overridden by `<Action> = <KeySpec>` lines. `None` if unreadable.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            match (KeyAction::parse(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => map.bind(key, action),
                _ => warn!(line, "ignoring keybinding"),
            }
        }
        Some(map)
    }

    /// Export every binding, dashboard scope first, sorted for stable output.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# eduadmin keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+s, Enter, Esc, Tab, BackTab, Up, Down, Left, Right, PageUp, PageDown, Backspace, /\n");
        let names: Vec<&str> = ACTION_NAMES.iter().map(|(_, n)| *n).collect();
        let _ = writeln!(&mut buf, "# Actions: {}\n", names.join(", "));

        for scope in [KeyScope::Dashboard, KeyScope::Form] {
            let mut lines: Vec<String> = self
                .table(scope)
                .iter()
                .map(|((mods, code), action)| {
                    format!("{} = {}", action.name(), Self::format_key(*mods, *code))
                })
                .collect();
            lines.sort();
            for line in lines {
                let _ = writeln!(&mut buf, "{line}");
            }
        }

        std::fs::write(path, buf)
    }

    /// Resolve a key event in `scope`. A binding without Shift also matches a
    /// shifted key, since terminals disagree on reporting Shift.
    pub fn resolve(&self, scope: KeyScope, key: &KeyEvent) -> Option<KeyAction> {
        let table = self.table(scope);
        table.get(&(key.modifiers, key.code)).copied().or_else(|| {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                table
                    .get(&(key.modifiers - KeyModifiers::SHIFT, key.code))
                    .copied()
            } else {
                None
            }
        })
    }

    /// Keys bound to `action`, formatted and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .table(action.scope())
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((mods, code), _)| Self::format_key(*mods, *code))
            .collect();
        keys.sort();
        keys
    }

    /// Format a key (modifiers + code) into a spec like "Ctrl+s" or "BackTab".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Backspace => "Backspace".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<Binding> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Backspace" => Backspace,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}
