//! Path-level filesystem facade
//!
//! The canonical API consumers use: every operation takes an absolute path,
//! resolves it against the store, and forwards to the id-level mutation.
//! Includes the trash lifecycle (move to `/trash` remembering the origin,
//! restore back to it).

use serde_json::{Map, Value};

use super::path::{absolute_path, resolve_path, split_parent, HOME};
use super::store::{FsNode, FsStore, NodeOpts};
use crate::error::{CoreError, CoreResult};

/// Metadata key recording where a trashed node came from.
pub const META_ORIGINAL_PARENT: &str = "original_parent";
/// Path of the trash directory.
pub const TRASH_PATH: &str = "/trash";

pub struct FsApi<'a> {
    store: &'a mut FsStore,
}

impl<'a> FsApi<'a> {
    pub fn new(store: &'a mut FsStore) -> Self {
        Self { store }
    }

    pub fn resolve(&self, path: &str) -> Option<&FsNode> {
        resolve_path(path, self.store.nodes(), self.store.root_id())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    pub fn stat(&self, path: &str) -> Option<&FsNode> {
        self.resolve(path)
    }

    pub fn read(&self, path: &str) -> Option<&str> {
        self.resolve(path).and_then(FsNode::content)
    }

    pub fn list(&self, path: &str) -> Vec<&FsNode> {
        match self.resolve(path) {
            Some(node) if node.is_dir() => node
                .children()
                .iter()
                .filter_map(|id| self.store.node(id))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn node_path(&self, id: &str) -> String {
        absolute_path(id, self.store.nodes(), self.store.root_id())
    }

    /// Overwrite an existing file or create a new one under an existing
    /// parent directory.
    pub fn write(&mut self, path: &str, content: &str) -> CoreResult<()> {
        if let Some(node) = self.resolve(path) {
            if !node.is_file() {
                return Err(CoreError::NotAFile(path.to_string()));
            }
            let id = node.id.clone();
            self.store.update_file(&id, content);
            return Ok(());
        }

        let (parent_path, name) = split_parent(path);
        if name.is_empty() {
            return Err(CoreError::InvalidArgument(path.to_string()));
        }
        let parent_id = match self.resolve(&parent_path) {
            Some(parent) if parent.is_dir() => parent.id.clone(),
            _ => return Err(CoreError::NotFound(parent_path)),
        };
        self.store
            .create_file(&parent_id, &name, content, NodeOpts::default())?;
        Ok(())
    }

    pub fn mkdir(&mut self, path: &str) -> CoreResult<String> {
        if self.exists(path) {
            return Err(CoreError::InvalidArgument(format!("{path}: already exists")));
        }
        let (parent_path, name) = split_parent(path);
        if name.is_empty() {
            return Err(CoreError::InvalidArgument(path.to_string()));
        }
        let parent_id = match self.resolve(&parent_path) {
            Some(parent) if parent.is_dir() => parent.id.clone(),
            _ => return Err(CoreError::NotFound(parent_path)),
        };
        self.store.create_dir(&parent_id, &name, NodeOpts::default())
    }

    /// `mkdir -p` equivalent used by the mount machinery.
    pub fn mkdir_all(&mut self, path: &str) -> CoreResult<String> {
        let mut current_id = self.store.root_id().to_string();
        for part in path.split('/').filter(|part| !part.is_empty()) {
            let existing = self
                .store
                .node(&current_id)
                .into_iter()
                .flat_map(FsNode::children)
                .filter_map(|id| self.store.node(id))
                .find(|child| child.name == part)
                .map(|child| (child.id.clone(), child.is_dir()));
            current_id = match existing {
                Some((id, true)) => id,
                Some((_, false)) => {
                    return Err(CoreError::NotADirectory(part.to_string()));
                }
                None => self
                    .store
                    .create_dir(&current_id, part, NodeOpts::default())?,
            };
        }
        Ok(current_id)
    }

    pub fn remove(&mut self, path: &str) -> CoreResult<()> {
        let id = self
            .resolve(path)
            .map(|node| node.id.clone())
            .ok_or_else(|| CoreError::NotFound(path.to_string()))?;
        self.store.delete_node(&id);
        Ok(())
    }

    /// Move a node into `/trash`, remembering its origin for restore.
    pub fn trash(&mut self, path: &str) -> CoreResult<()> {
        let node = self
            .resolve(path)
            .ok_or_else(|| CoreError::NotFound(path.to_string()))?;
        let (id, parent) = (node.id.clone(), node.parent.clone());
        let trash_id = match self.resolve(TRASH_PATH) {
            Some(trash) if trash.is_dir() => trash.id.clone(),
            _ => return Err(CoreError::NotFound(TRASH_PATH.to_string())),
        };
        let mut meta = Map::new();
        if let Some(parent) = parent {
            meta.insert(META_ORIGINAL_PARENT.to_string(), Value::String(parent));
        }
        self.store.update_metadata(&id, meta);
        self.store.move_node(&id, &trash_id);
        Ok(())
    }

    /// Move a trashed node back to its recorded origin, falling back to the
    /// home directory when the origin no longer exists.
    pub fn restore(&mut self, path: &str) -> CoreResult<()> {
        let node = self
            .resolve(path)
            .ok_or_else(|| CoreError::NotFound(path.to_string()))?;
        let id = node.id.clone();
        let origin = node
            .metadata
            .get(META_ORIGINAL_PARENT)
            .and_then(Value::as_str)
            .map(str::to_string);

        let target = origin
            .filter(|origin_id| {
                self.store
                    .node(origin_id)
                    .map(FsNode::is_dir)
                    .unwrap_or(false)
            })
            .or_else(|| self.resolve(HOME).map(|home| home.id.clone()));

        match target {
            Some(target_id) => {
                self.store.move_node(&id, &target_id);
                Ok(())
            }
            None => Err(CoreError::NotFound(HOME.to_string())),
        }
    }

    /// Move a node into a destination directory, keeping its name.
    pub fn move_to_dir(&mut self, src: &str, dest_dir: &str) -> CoreResult<()> {
        let id = self
            .resolve(src)
            .map(|node| node.id.clone())
            .ok_or_else(|| CoreError::NotFound(src.to_string()))?;
        let dest_id = match self.resolve(dest_dir) {
            Some(dest) if dest.is_dir() => dest.id.clone(),
            Some(_) => return Err(CoreError::NotADirectory(dest_dir.to_string())),
            None => return Err(CoreError::NotFound(dest_dir.to_string())),
        };
        self.store.move_node(&id, &dest_id);
        Ok(())
    }

    pub fn rename(&mut self, path: &str, new_name: &str) -> CoreResult<()> {
        let id = self
            .resolve(path)
            .map(|node| node.id.clone())
            .ok_or_else(|| CoreError::NotFound(path.to_string()))?;
        self.store.rename_node(&id, new_name);
        Ok(())
    }

    pub fn update_metadata(&mut self, path: &str, partial: Map<String, Value>) -> CoreResult<()> {
        let id = self
            .resolve(path)
            .map(|node| node.id.clone())
            .ok_or_else(|| CoreError::NotFound(path.to_string()))?;
        self.store.update_metadata(&id, partial);
        Ok(())
    }
}
