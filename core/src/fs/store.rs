//! Filesystem store
//!
//! Single source of truth for the virtual node tree. Nodes live in a flat
//! id-keyed table; directories hold their children as an ordered id list
//! (insertion order, never sorted). All mutations go through this store.
//!
//! Sibling name uniqueness is deliberately NOT enforced here; path
//! resolution returns the first match in child order. See DESIGN.md.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::clock::{Clock, SharedClock};
use crate::error::{CoreError, CoreResult};

/// Fixed id of the root directory.
pub const ROOT_ID: &str = "root";

/// Payload half of a node: file content or directory children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    File {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        executable: bool,
    },
    Dir {
        #[serde(default)]
        children: Vec<String>,
    },
}

/// One entry in the virtual filesystem tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsNode {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
    pub created_at: u64,
    pub modified_at: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl FsNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn children(&self) -> &[String] {
        match &self.kind {
            NodeKind::Dir { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content, .. } => Some(content),
            NodeKind::Dir { .. } => None,
        }
    }

    pub fn executable(&self) -> bool {
        matches!(self.kind, NodeKind::File { executable: true, .. })
    }

    fn children_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.kind {
            NodeKind::Dir { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}

/// Optional attributes for node creation.
#[derive(Debug, Clone, Default)]
pub struct NodeOpts {
    pub hidden: bool,
    pub executable: bool,
    pub metadata: Option<Map<String, Value>>,
}

impl NodeOpts {
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::default()
        }
    }

    pub fn executable() -> Self {
        Self {
            executable: true,
            ..Self::default()
        }
    }
}

/// Persisted wire shape of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsState {
    pub root_id: String,
    pub nodes: HashMap<String, FsNode>,
}

/// The filesystem store proper.
pub struct FsStore {
    root_id: String,
    nodes: HashMap<String, FsNode>,
    clock: SharedClock,
}

impl FsStore {
    /// Build a store holding the hard-coded default tree.
    pub fn with_defaults(clock: SharedClock) -> Self {
        let state = default_state(clock.now_ms());
        Self::from_state(state, clock)
    }

    /// Rehydrate from a persisted blob.
    pub fn from_state(state: FsState, clock: SharedClock) -> Self {
        Self {
            root_id: state.root_id,
            nodes: state.nodes,
            clock,
        }
    }

    /// Snapshot for persistence.
    pub fn to_state(&self) -> FsState {
        FsState {
            root_id: self.root_id.clone(),
            nodes: self.nodes.clone(),
        }
    }

    /// Verify the loaded tree still has its root; reset to the default tree
    /// if it does not. Data loss is accepted here, not surfaced.
    pub fn init(&mut self) {
        if !self.nodes.contains_key(&self.root_id) {
            tracing::warn!("filesystem root missing, resetting to default tree");
            let state = default_state(self.clock.now_ms());
            self.root_id = state.root_id;
            self.nodes = state.nodes;
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn nodes(&self) -> &HashMap<String, FsNode> {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&FsNode> {
        self.nodes.get(id)
    }

    pub fn create_file(
        &mut self,
        parent_id: &str,
        name: &str,
        content: &str,
        opts: NodeOpts,
    ) -> CoreResult<String> {
        self.insert_node(
            parent_id,
            name,
            NodeKind::File {
                content: content.to_string(),
                executable: opts.executable,
            },
            opts,
        )
    }

    pub fn create_dir(&mut self, parent_id: &str, name: &str, opts: NodeOpts) -> CoreResult<String> {
        self.insert_node(parent_id, name, NodeKind::Dir { children: vec![] }, opts)
    }

    fn insert_node(
        &mut self,
        parent_id: &str,
        name: &str,
        kind: NodeKind,
        opts: NodeOpts,
    ) -> CoreResult<String> {
        match self.nodes.get(parent_id) {
            Some(parent) if parent.is_dir() => {}
            _ => return Err(CoreError::InvalidParent(parent_id.to_string())),
        }

        let id = Uuid::new_v4().to_string();
        let now = self.clock.now_ms();
        let node = FsNode {
            id: id.clone(),
            name: name.to_string(),
            parent: Some(parent_id.to_string()),
            created_at: now,
            modified_at: now,
            hidden: opts.hidden,
            metadata: opts.metadata.unwrap_or_default(),
            kind,
        };
        self.nodes.insert(id.clone(), node);
        if let Some(children) = self
            .nodes
            .get_mut(parent_id)
            .and_then(FsNode::children_mut)
        {
            children.push(id.clone());
        }
        Ok(id)
    }

    /// Remove a node and its whole subtree. No-op on unknown ids.
    pub fn delete_node(&mut self, id: &str) {
        let parent = match self.nodes.get(id) {
            Some(node) => node.parent.clone(),
            None => return,
        };

        if let Some(parent_id) = parent {
            if let Some(children) = self
                .nodes
                .get_mut(&parent_id)
                .and_then(FsNode::children_mut)
            {
                children.retain(|child| child != id);
            }
        }

        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children().iter().cloned());
            }
        }
    }

    /// Replace a file's content wholesale. No-op if the id is not a file.
    pub fn update_file(&mut self, id: &str, new_content: &str) {
        let now = self.clock.now_ms();
        if let Some(node) = self.nodes.get_mut(id) {
            if let NodeKind::File { content, .. } = &mut node.kind {
                *content = new_content.to_string();
                node.modified_at = now;
            }
        }
    }

    /// Change a node's name only. Does not check sibling collisions.
    pub fn rename_node(&mut self, id: &str, new_name: &str) {
        let now = self.clock.now_ms();
        if let Some(node) = self.nodes.get_mut(id) {
            node.name = new_name.to_string();
            node.modified_at = now;
        }
    }

    /// Reparent a node. No-op when the target is missing, not a directory,
    /// already the parent, or inside the moved subtree (tree invariant).
    pub fn move_node(&mut self, id: &str, new_parent_id: &str) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match self.nodes.get(new_parent_id) {
            Some(target) if target.is_dir() => {}
            _ => return,
        }
        if node.parent.as_deref() == Some(new_parent_id) {
            return;
        }
        if id == new_parent_id || self.subtree_contains(id, new_parent_id) {
            tracing::warn!(id, new_parent_id, "refusing move into own subtree");
            return;
        }

        let old_parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(old_parent_id) = old_parent {
            if let Some(children) = self
                .nodes
                .get_mut(&old_parent_id)
                .and_then(FsNode::children_mut)
            {
                children.retain(|child| child != id);
            }
        }
        if let Some(children) = self
            .nodes
            .get_mut(new_parent_id)
            .and_then(FsNode::children_mut)
        {
            children.push(id.to_string());
        }
        let now = self.clock.now_ms();
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(new_parent_id.to_string());
            node.modified_at = now;
        }
    }

    /// Shallow-merge into a node's metadata map.
    pub fn update_metadata(&mut self, id: &str, partial: Map<String, Value>) {
        if let Some(node) = self.nodes.get_mut(id) {
            for (key, value) in partial {
                node.metadata.insert(key, value);
            }
        }
    }

    fn subtree_contains(&self, root: &str, target: &str) -> bool {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children().iter().map(String::as_str));
            }
        }
        false
    }
}

/// The hard-coded tree a fresh (or unrecoverable) system boots with.
fn default_state(now: u64) -> FsState {
    let mut nodes: HashMap<String, FsNode> = HashMap::new();
    nodes.insert(
        ROOT_ID.to_string(),
        FsNode {
            id: ROOT_ID.to_string(),
            name: String::new(),
            parent: None,
            created_at: now,
            modified_at: now,
            hidden: false,
            metadata: Map::new(),
            kind: NodeKind::Dir { children: vec![] },
        },
    );

    fn attach(nodes: &mut HashMap<String, FsNode>, parent: &str, node: FsNode) -> String {
        let id = node.id.clone();
        nodes.insert(id.clone(), node);
        if let Some(children) = nodes.get_mut(parent).and_then(FsNode::children_mut) {
            children.push(id.clone());
        }
        id
    }
    fn mkdir(
        nodes: &mut HashMap<String, FsNode>,
        now: u64,
        parent: &str,
        name: &str,
        hidden: bool,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        attach(
            nodes,
            parent,
            FsNode {
                id,
                name: name.to_string(),
                parent: Some(parent.to_string()),
                created_at: now,
                modified_at: now,
                hidden,
                metadata: Map::new(),
                kind: NodeKind::Dir { children: vec![] },
            },
        )
    }
    fn touch(
        nodes: &mut HashMap<String, FsNode>,
        now: u64,
        parent: &str,
        name: &str,
        content: &str,
        executable: bool,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        attach(
            nodes,
            parent,
            FsNode {
                id,
                name: name.to_string(),
                parent: Some(parent.to_string()),
                created_at: now,
                modified_at: now,
                hidden: false,
                metadata: Map::new(),
                kind: NodeKind::File {
                    content: content.to_string(),
                    executable,
                },
            },
        )
    }

    let home = mkdir(&mut nodes, now, ROOT_ID, "home", false);
    let user = mkdir(&mut nodes, now, &home, "user", false);
    let desktop = mkdir(&mut nodes, now, &user, "Desktop", false);
    mkdir(&mut nodes, now, &user, "Documents", false);
    mkdir(&mut nodes, now, &user, "Downloads", false);
    mkdir(&mut nodes, now, &user, ".secrets", true);

    touch(&mut nodes, now, &desktop, "about.app", "", true);
    touch(&mut nodes, now, &desktop, "trash.app", "", true);

    let bin = mkdir(&mut nodes, now, ROOT_ID, "bin", false);
    for cmd in ["ls", "cat", "cd", "rm", "sudo", "neofetch"] {
        touch(&mut nodes, now, &bin, cmd, "", true);
    }

    let etc = mkdir(&mut nodes, now, ROOT_ID, "etc", false);
    touch(
        &mut nodes,
        now,
        &etc,
        "os.conf",
        "# System Configuration\nHOST=winteros\nUSER=user",
        false,
    );

    mkdir(&mut nodes, now, ROOT_ID, "trash", false);
    mkdir(&mut nodes, now, ROOT_ID, "mnt", false);

    FsState {
        root_id: ROOT_ID.to_string(),
        nodes,
    }
}
