// Integration tests for eduadmin

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(stem: &str, ext: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nonce = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    path.push(format!("eduadmin_{stem}_{}_{nonce}.{ext}", std::process::id()));
    path
}

// 1) Theme config roundtrip and init
#[test]
fn theme_roundtrip_and_init() {
    use eduadmin::app::Theme;
    use std::fs;

    let path = temp_path("theme", "conf");
    let t = Theme::mocha();
    t.write_file(&path).expect("write theme");
    let t2 = Theme::from_file(&path).expect("read theme");
    assert_eq!(t, t2);

    // Partial files override only what they name
    fs::write(&path, "# custom\nerror = #112233\nbogus = #000000\ntitle = not-a-color\n").unwrap();
    let t3 = Theme::from_file(&path).expect("read partial theme");
    assert_eq!(t3.error, ratatui::style::Color::Rgb(0x11, 0x22, 0x33));
    assert_eq!(t3.title, Theme::mocha().title);

    // load_or_init creates file if missing
    let p2 = temp_path("theme_init", "conf");
    let _ = fs::remove_file(&p2);
    let created = Theme::load_or_init(&p2);
    assert!(p2.exists());
    assert_eq!(created, Theme::mocha());

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&p2);
}

// 2) Keybindings file overrides defaults
#[test]
fn keymap_file_overrides_and_init() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use eduadmin::app::keymap::{KeyAction, KeyScope, Keymap};
    use std::fs;

    let path = temp_path("keys", "conf");
    fs::write(&path, "Quit = Ctrl+x\nSubmit = Ctrl+Enter\nNoSuchAction = a\n").unwrap();
    let km = Keymap::from_file(&path).expect("read keymap");
    let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
    assert_eq!(km.resolve(KeyScope::Dashboard, &ctrl_x), Some(KeyAction::Quit));
    // Defaults stay bound
    let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
    assert_eq!(km.resolve(KeyScope::Dashboard, &q), Some(KeyAction::Quit));
    let ctrl_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL);
    assert_eq!(km.resolve(KeyScope::Form, &ctrl_enter), Some(KeyAction::Submit));

    let p2 = temp_path("keys_init", "conf");
    let _ = fs::remove_file(&p2);
    let _ = Keymap::load_or_init(&p2);
    let written = fs::read_to_string(&p2).expect("keymap written");
    assert!(written.contains("Quit = q"));
    assert!(written.contains("Submit = Ctrl+s"));

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&p2);
}

// 3) The data file survives a save and a reload
#[test]
fn api_persists_saves_to_its_file() {
    use eduadmin::api::{InMemoryApi, field_str};
    use eduadmin::entity::EntityKind;
    use serde_json::json;
    use std::fs;

    let path = temp_path("records", "json");
    let _ = fs::remove_file(&path);
    let mut api = InMemoryApi::load_or_init(&path).expect("seed data file");
    assert!(path.exists());
    let rooms_before = api.list(EntityKind::Room).len();
    api.save(EntityKind::Room, &json!({"name": "Hall", "capacity": "120"}), None)
        .expect("save room");

    let reloaded = InMemoryApi::load_or_init(&path).expect("reload data file");
    let rooms = reloaded.list(EntityKind::Room);
    assert_eq!(rooms.len(), rooms_before + 1);
    assert!(rooms.iter().any(|r| field_str(r, "name") == "Hall"));

    // Ids keep increasing across reloads
    let mut reloaded = reloaded;
    reloaded
        .save(EntityKind::Subject, &json!({"name": "Physics"}), None)
        .expect("save subject");
    let ids: Vec<u64> = reloaded
        .list(EntityKind::Subject)
        .iter()
        .chain(reloaded.list(EntityKind::Room).iter())
        .filter_map(|r| eduadmin::api::record_id(r)?.parse().ok())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len(), "ids must be unique");

    fs::write(&path, "{ not json").unwrap();
    assert!(InMemoryApi::load_or_init(&path).is_err());

    let _ = fs::remove_file(&path);
}

// 3b) Data load failures carry their context into anyhow, as the binary reports them
#[test]
fn data_load_error_converts_to_anyhow() {
    use anyhow::Context as _;
    use eduadmin::api::InMemoryApi;
    use std::fs;

    let path = temp_path("broken", "json");
    fs::write(&path, "{ not json").unwrap();
    let err = InMemoryApi::load_or_init(&path)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("load data from {}", path.display()))
        .unwrap_err();
    let report = format!("{err:#}");
    assert!(report.starts_with("load data from"), "{report}");
    assert!(report.contains("parse"), "{report}");

    let _ = fs::remove_file(&path);
}

// 4) The generic modal driven against the in-memory API
#[test]
fn modal_saves_through_the_api() {
    use eduadmin::api::InMemoryApi;
    use eduadmin::entity::FormEntity;
    use eduadmin::entity::records::{User, validate_user};
    use eduadmin::modal::{EntityModal, Mode, SaveError, SaveOutcome, SubmitOutcome};

    let mut api = InMemoryApi::with_sample_data();
    let mut saver = |user: &User, id: Option<&str>| -> Result<(), SaveError> {
        let payload = serde_json::to_value(user).map_err(|e| SaveError::Message(e.to_string()))?;
        api.save(User::KIND, &payload, id)
    };

    let mut modal = EntityModal::new(User::default(), validate_user);
    modal.open(Mode::Create, None).unwrap();
    modal.set_form(User {
        id: None,
        login: "admin".into(),
        full_name: "Second Admin".into(),
        role: "admin".into(),
        phone: String::new(),
        password: "secret1".into(),
    });
    assert_eq!(
        modal.submit_with(&mut saver),
        SubmitOutcome::Save(SaveOutcome::Failed("Login taken".into()))
    );
    assert_eq!(modal.server_error(), Some("Login taken"));

    modal.update_form(|u| u.login = "admin2".into());
    assert_eq!(modal.submit_with(&mut saver), SubmitOutcome::Save(SaveOutcome::Closed));
    assert!(!modal.is_open());

    let users = api.list(User::KIND);
    let created = users
        .iter()
        .find(|u| u["login"] == "admin2")
        .expect("created user listed");
    // Passwords are never stored
    assert!(created.get("password").is_none());
}

// 5) Keyboard flow through the app state, rendered with a test backend
#[test]
fn dashboard_flow_renders() {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use eduadmin::api::InMemoryApi;
    use eduadmin::app::keymap::Keymap;
    use eduadmin::app::update::handle_key;
    use eduadmin::app::{AppState, InputMode, Theme};
    use eduadmin::entity::EntityKind;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    let mut app = AppState::new(InMemoryApi::with_sample_data(), Theme::dark(), Keymap::default());
    let mut terminal = Terminal::new(TestBackend::new(110, 36)).unwrap();

    terminal.draw(|f| eduadmin::ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("[Users]"));
    assert!(text.contains("a.lovelace"));

    let press = |app: &mut AppState, code: KeyCode| handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.active_kind, EntityKind::Room);
    press(&mut app, KeyCode::Char('v'));
    assert_eq!(app.input_mode, InputMode::Modal);

    terminal.draw(|f| eduadmin::ui::render(f, &mut app)).unwrap();
    let text = screen(&terminal);
    assert!(text.contains("Close"));
    assert!(text.contains("Capacity"));

    press(&mut app, KeyCode::Enter);
    assert!(app.session.is_none());
    assert_eq!(app.input_mode, InputMode::Normal);

    press(&mut app, KeyCode::Char('?'));
    terminal.draw(|f| eduadmin::ui::render(f, &mut app)).unwrap();
    assert!(screen(&terminal).contains("Help"));
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.input_mode, InputMode::Normal);
}
