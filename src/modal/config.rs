//! Presentation metadata per entity kind and modal mode.

use super::Mode;
use crate::entity::EntityKind;

/// Static presentation record for one (kind, mode) pair.
#[derive(Debug, PartialEq, Eq)]
pub struct ModalConfig {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
    /// Gradient start, `#RRGGBB`.
    pub color_from: &'static str,
    /// Gradient end, `#RRGGBB`.
    pub color_to: &'static str,
    pub submit_text: &'static str,
    pub loading_text: &'static str,
}

struct ModeTable {
    create: ModalConfig,
    edit: ModalConfig,
    view: ModalConfig,
}

impl ModeTable {
    fn get(&self, mode: Mode) -> &ModalConfig {
        match mode {
            Mode::Create => &self.create,
            Mode::Edit => &self.edit,
            Mode::View => &self.view,
        }
    }
}

static USER: ModeTable = ModeTable {
    create: ModalConfig {
        title: "New user",
        subtitle: "Create an account for a teacher, student or administrator",
        icon: "👤",
        color_from: "#3B82F6",
        color_to: "#6366F1",
        submit_text: "Create user",
        loading_text: "Creating user...",
    },
    edit: ModalConfig {
        title: "Edit user",
        subtitle: "Update account details",
        icon: "👤",
        color_from: "#F59E0B",
        color_to: "#F97316",
        submit_text: "Save changes",
        loading_text: "Saving...",
    },
    view: ModalConfig {
        title: "User",
        subtitle: "Account details",
        icon: "👤",
        color_from: "#64748B",
        color_to: "#475569",
        submit_text: "Close",
        loading_text: "Closing...",
    },
};

static ROOM: ModeTable = ModeTable {
    create: ModalConfig {
        title: "New room",
        subtitle: "Register a classroom and its capacity",
        icon: "🚪",
        color_from: "#10B981",
        color_to: "#059669",
        submit_text: "Create room",
        loading_text: "Creating room...",
    },
    edit: ModalConfig {
        title: "Edit room",
        subtitle: "Update room name, capacity or floor",
        icon: "🚪",
        color_from: "#F59E0B",
        color_to: "#F97316",
        submit_text: "Save changes",
        loading_text: "Saving...",
    },
    view: ModalConfig {
        title: "Room",
        subtitle: "Room details",
        icon: "🚪",
        color_from: "#64748B",
        color_to: "#475569",
        submit_text: "Close",
        loading_text: "Closing...",
    },
};

static SUBJECT: ModeTable = ModeTable {
    create: ModalConfig {
        title: "New subject",
        subtitle: "Add a subject groups can be taught in",
        icon: "📘",
        color_from: "#8B5CF6",
        color_to: "#7C3AED",
        submit_text: "Create subject",
        loading_text: "Creating subject...",
    },
    edit: ModalConfig {
        title: "Edit subject",
        subtitle: "Update subject name or description",
        icon: "📘",
        color_from: "#F59E0B",
        color_to: "#F97316",
        submit_text: "Save changes",
        loading_text: "Saving...",
    },
    view: ModalConfig {
        title: "Subject",
        subtitle: "Subject details",
        icon: "📘",
        color_from: "#64748B",
        color_to: "#475569",
        submit_text: "Close",
        loading_text: "Closing...",
    },
};

static GROUP: ModeTable = ModeTable {
    create: ModalConfig {
        title: "New group",
        subtitle: "Form a study group with a subject and a teacher",
        icon: "👥",
        color_from: "#06B6D4",
        color_to: "#0891B2",
        submit_text: "Create group",
        loading_text: "Creating group...",
    },
    edit: ModalConfig {
        title: "Edit group",
        subtitle: "Update group subject, teacher or room",
        icon: "👥",
        color_from: "#F59E0B",
        color_to: "#F97316",
        submit_text: "Save changes",
        loading_text: "Saving...",
    },
    view: ModalConfig {
        title: "Group",
        subtitle: "Group details",
        icon: "👥",
        color_from: "#64748B",
        color_to: "#475569",
        submit_text: "Close",
        loading_text: "Closing...",
    },
};

static ORGANIZATION: ModeTable = ModeTable {
    create: ModalConfig {
        title: "New organization",
        subtitle: "Register a school or learning center",
        icon: "🏫",
        color_from: "#EC4899",
        color_to: "#DB2777",
        submit_text: "Create organization",
        loading_text: "Creating organization...",
    },
    edit: ModalConfig {
        title: "Edit organization",
        subtitle: "Update contact details",
        icon: "🏫",
        color_from: "#F59E0B",
        color_to: "#F97316",
        submit_text: "Save changes",
        loading_text: "Saving...",
    },
    view: ModalConfig {
        title: "Organization",
        subtitle: "Organization details",
        icon: "🏫",
        color_from: "#64748B",
        color_to: "#475569",
        submit_text: "Close",
        loading_text: "Closing...",
    },
};

static SCHEDULE: ModeTable = ModeTable {
    create: ModalConfig {
        title: "New lesson slot",
        subtitle: "Put a group on the weekly timetable",
        icon: "🗓",
        color_from: "#EF4444",
        color_to: "#DC2626",
        submit_text: "Add to schedule",
        loading_text: "Scheduling...",
    },
    edit: ModalConfig {
        title: "Edit lesson slot",
        subtitle: "Move the slot to another day, time or room",
        icon: "🗓",
        color_from: "#F59E0B",
        color_to: "#F97316",
        submit_text: "Save changes",
        loading_text: "Saving...",
    },
    view: ModalConfig {
        title: "Lesson slot",
        subtitle: "Timetable entry",
        icon: "🗓",
        color_from: "#64748B",
        color_to: "#475569",
        submit_text: "Close",
        loading_text: "Closing...",
    },
};

/// Look up the presentation record for `kind` in `mode`. Total by construction.
pub fn modal_config(kind: EntityKind, mode: Mode) -> &'static ModalConfig {
    let table = match kind {
        EntityKind::User => &USER,
        EntityKind::Room => &ROOM,
        EntityKind::Subject => &SUBJECT,
        EntityKind::Group => &GROUP,
        EntityKind::Organization => &ORGANIZATION,
        EntityKind::Schedule => &SCHEDULE,
    };
    table.get(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [Mode; 3] = [Mode::Create, Mode::Edit, Mode::View];

    fn is_hex_color(s: &str) -> bool {
        s.len() == 7
            && s.starts_with('#')
            && s[1..].chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn every_pair_is_complete() {
        for kind in EntityKind::ALL {
            for mode in MODES {
                let cfg = modal_config(kind, mode);
                for text in [
                    cfg.title,
                    cfg.subtitle,
                    cfg.icon,
                    cfg.submit_text,
                    cfg.loading_text,
                ] {
                    assert!(!text.is_empty(), "{kind} {mode:?}");
                }
                assert!(is_hex_color(cfg.color_from), "{kind} {mode:?}");
                assert!(is_hex_color(cfg.color_to), "{kind} {mode:?}");
            }
        }
    }

    #[test]
    fn modes_of_one_kind_differ() {
        for kind in EntityKind::ALL {
            assert_ne!(modal_config(kind, Mode::Create), modal_config(kind, Mode::Edit));
            assert_ne!(modal_config(kind, Mode::Edit), modal_config(kind, Mode::View));
        }
    }
}
