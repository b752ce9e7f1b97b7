//! Path resolution helpers
//!
//! Pure functions over the node table. Resolution is case-sensitive exact
//! name matching; no globbing, no symlinks. With duplicate sibling names the
//! first match in child order wins.

use std::collections::HashMap;

use super::store::FsNode;

/// Alias expanded for `~`.
pub const HOME: &str = "/home/user";

/// Walk an absolute path down from the root. `/` resolves to the root;
/// a trailing slash is tolerated; any missing segment yields `None`.
pub fn resolve_path<'a>(
    path: &str,
    nodes: &'a HashMap<String, FsNode>,
    root_id: &str,
) -> Option<&'a FsNode> {
    let mut current = nodes.get(root_id)?;
    for part in path.split('/').filter(|part| !part.is_empty()) {
        let found = current
            .children()
            .iter()
            .filter_map(|id| nodes.get(id))
            .find(|child| child.name == part)?;
        current = found;
    }
    Some(current)
}

/// Walk parent pointers back to the root, producing an absolute path.
pub fn absolute_path(id: &str, nodes: &HashMap<String, FsNode>, root_id: &str) -> String {
    if id == root_id {
        return "/".to_string();
    }
    let mut parts = Vec::new();
    let mut current = nodes.get(id);
    while let Some(node) = current {
        if node.id == root_id {
            break;
        }
        parts.push(node.name.clone());
        current = node.parent.as_deref().and_then(|pid| nodes.get(pid));
    }
    parts.reverse();
    format!("/{}", parts.join("/"))
}

/// Resolve a target against a working directory, entirely as string
/// manipulation: `~` aliases the home directory, `.`/`..` collapse, absolute
/// targets pass through (normalized).
pub fn resolve_relative(cwd: &str, target: &str) -> String {
    if target == "~" {
        return HOME.to_string();
    }
    if let Some(rest) = target.strip_prefix("~/") {
        return resolve_relative(HOME, rest);
    }

    let mut parts: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|part| !part.is_empty()).collect()
    };

    for part in target.split('/').filter(|part| !part.is_empty()) {
        match part {
            "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Split an absolute path into its parent path and final segment.
pub fn split_parent(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/".to_string(), trimmed[1..].to_string()),
        Some(idx) => (trimmed[..idx].to_string(), trimmed[idx + 1..].to_string()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fs::store::{FsStore, NodeOpts};
    use std::sync::Arc;

    fn store() -> FsStore {
        FsStore::with_defaults(Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_resolve_root_and_nested() {
        let store = store();
        let root = resolve_path("/", store.nodes(), store.root_id()).unwrap();
        assert_eq!(root.id, store.root_id());

        let desktop = resolve_path("/home/user/Desktop", store.nodes(), store.root_id()).unwrap();
        assert_eq!(desktop.name, "Desktop");

        // Trailing slash tolerated.
        let desktop2 = resolve_path("/home/user/Desktop/", store.nodes(), store.root_id()).unwrap();
        assert_eq!(desktop2.id, desktop.id);
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let store = store();
        assert!(resolve_path("/home/user/desktop", store.nodes(), store.root_id()).is_none());
    }

    #[test]
    fn test_absolute_path_roundtrip() {
        let mut store = store();
        let desktop = resolve_path("/home/user/Desktop", store.nodes(), store.root_id())
            .unwrap()
            .id
            .clone();
        let file = store
            .create_file(&desktop, "todo.txt", "", NodeOpts::default())
            .unwrap();

        let path = absolute_path(&file, store.nodes(), store.root_id());
        assert_eq!(path, "/home/user/Desktop/todo.txt");
        let resolved = resolve_path(&path, store.nodes(), store.root_id()).unwrap();
        assert_eq!(resolved.id, file);
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("/home/user", "~"), "/home/user");
        assert_eq!(resolve_relative("/home/user", "~/Desktop"), "/home/user/Desktop");
        assert_eq!(resolve_relative("/home/user", "Desktop"), "/home/user/Desktop");
        assert_eq!(resolve_relative("/home/user", ".."), "/home");
        assert_eq!(resolve_relative("/home/user", "../.."), "/");
        assert_eq!(resolve_relative("/home/user", "../../.."), "/");
        assert_eq!(resolve_relative("/home/user", "./Desktop/./icons"), "/home/user/Desktop/icons");
        assert_eq!(resolve_relative("/home/user", "/etc"), "/etc");
        assert_eq!(resolve_relative("/", "."), "/");
        assert_eq!(resolve_relative("/home/user/", "Desktop"), "/home/user/Desktop");
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/home/user"), ("/home".into(), "user".into()));
        assert_eq!(split_parent("/home"), ("/".into(), "home".into()));
        assert_eq!(split_parent("/home/user/"), ("/home".into(), "user".into()));
    }
}
