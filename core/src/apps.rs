//! Application registry
//!
//! The fixed table of launchable apps. A bare app id typed in the shell
//! opens (or refocuses) the matching window.

pub struct AppSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
}

pub const APPS: &[AppSpec] = &[
    AppSpec {
        id: "about",
        title: "About",
        icon: "person",
    },
    AppSpec {
        id: "files",
        title: "Files",
        icon: "folder",
    },
    AppSpec {
        id: "settings",
        title: "Settings",
        icon: "tune",
    },
    AppSpec {
        id: "textedit",
        title: "Text Editor",
        icon: "description",
    },
    AppSpec {
        id: "trash",
        title: "Trash",
        icon: "delete",
    },
];

pub fn find(id: &str) -> Option<&'static AppSpec> {
    APPS.iter().find(|app| app.id == id)
}
