//! Virtual filesystem: node store, path resolution, path-level API.

pub mod api;
pub mod path;
pub mod store;

pub use api::{FsApi, META_ORIGINAL_PARENT, TRASH_PATH};
pub use path::{absolute_path, resolve_path, resolve_relative, split_parent, HOME};
pub use store::{FsNode, FsState, FsStore, NodeKind, NodeOpts, ROOT_ID};
