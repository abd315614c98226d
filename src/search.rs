use serde_json::Value;

use crate::app::AppState;

/// Case-insensitive match against every scalar value of a record.
/// An empty query matches everything.
pub fn matches(row: &Value, q: &str) -> bool {
    if q.is_empty() {
        return true;
    }
    let Some(obj) = row.as_object() else {
        return false;
    };
    obj.iter()
        .filter(|(key, _)| key.as_str() != "password")
        .any(|(_, v)| match v {
            Value::String(s) => s.to_lowercase().contains(q),
            Value::Number(n) => n.to_string().contains(q),
            _ => false,
        })
}

pub fn apply_search(app: &mut AppState) {
    let q = app.search_query.trim().to_lowercase();
    app.rows = if q.is_empty() {
        app.rows_all.clone()
    } else {
        app.rows_all
            .iter()
            .filter(|row| matches(row, &q))
            .cloned()
            .collect()
    };
    app.selected_index = app.selected_index.min(app.rows.len().saturating_sub(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryApi;
    use crate::app::Theme;
    use crate::app::keymap::Keymap;
    use crate::entity::EntityKind;
    use serde_json::json;

    fn mk_app() -> AppState {
        let mut app = AppState::new(InMemoryApi::with_sample_data(), Theme::dark(), Keymap::default());
        app.switch_kind(EntityKind::User);
        app
    }

    #[test]
    fn matches_any_field_ignoring_case() {
        let row = json!({"id": "1", "login": "a.lovelace", "full_name": "Ada Lovelace"});
        assert!(matches(&row, "ada"));
        assert!(matches(&row, "love"));
        assert!(!matches(&row, "turing"));
        assert!(matches(&row, ""));
    }

    #[test]
    fn passwords_are_not_searchable() {
        let row = json!({"login": "ada", "password": "hunter2"});
        assert!(!matches(&row, "hunter"));
    }

    #[test]
    fn apply_search_filters_and_clamps_selection() {
        let mut app = mk_app();
        let total = app.rows.len();
        assert!(total >= 3);
        app.selected_index = total - 1;

        app.search_query = "LoVeLaCe".to_string();
        apply_search(&mut app);
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.rows[0]["login"], "a.lovelace");
        assert_eq!(app.selected_index, 0);

        app.search_query.clear();
        apply_search(&mut app);
        assert_eq!(app.rows.len(), total);
    }
}
