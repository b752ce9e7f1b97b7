//! Virtual device overlay
//!
//! A read-mostly shadow layer that synthesizes node-shaped values for the
//! well-known device paths (`/dev`, `/dev/sda`, `/dev/sda1`, `/dev/sr0`)
//! and, once the CD-ROM is mounted, a `README.txt` under its mount point.
//! Synthetic nodes are never persisted; every other path falls through to
//! the real tree.

use std::borrow::Cow;

use serde_json::Map;

use crate::devices::{BlockDevice, DeviceStore, CDROM_README, README_NAME, SR0};
use crate::fs::path::resolve_path;
use crate::fs::store::{FsNode, FsStore, NodeKind};

/// Path prefix owned by the overlay.
pub const DEV_PATH: &str = "/dev";

pub struct Overlay<'a> {
    fs: &'a FsStore,
    devices: &'a DeviceStore,
}

impl<'a> Overlay<'a> {
    pub fn new(fs: &'a FsStore, devices: &'a DeviceStore) -> Self {
        Self { fs, devices }
    }

    /// True when a path is served by the overlay rather than the real tree.
    pub fn is_virtual(&self, path: &str) -> bool {
        let path = normalize(path);
        if path == DEV_PATH || path.strip_prefix("/dev/").is_some_and(|name| self.devices.device(name).is_some()) {
            return true;
        }
        self.cdrom_readme_path()
            .map(|readme| path == readme)
            .unwrap_or(false)
    }

    /// Resolve a path through the overlay, falling back to the real tree.
    pub fn resolve(&self, path: &str) -> Option<Cow<'a, FsNode>> {
        let path = normalize(path);
        if path == DEV_PATH {
            return Some(Cow::Owned(dev_dir_node()));
        }
        if let Some(name) = path.strip_prefix("/dev/") {
            return self
                .devices
                .device(name)
                .map(|device| Cow::Owned(device_node(device)));
        }
        if self.cdrom_readme_path().as_deref() == Some(path.as_str()) {
            return Some(Cow::Owned(cdrom_readme_node()));
        }
        resolve_path(&path, self.fs.nodes(), self.fs.root_id()).map(Cow::Borrowed)
    }

    /// List a directory through the overlay: `/dev` is fully synthetic, and
    /// the CD-ROM mount point gains the payload README on top of its real
    /// children. `None` when the path is missing or not a directory.
    pub fn list(&self, path: &str) -> Option<Vec<Cow<'a, FsNode>>> {
        let path = normalize(path);
        if path == DEV_PATH {
            return Some(
                self.devices
                    .devices()
                    .map(|device| Cow::Owned(device_node(device)))
                    .collect(),
            );
        }

        let node = resolve_path(&path, self.fs.nodes(), self.fs.root_id())?;
        if !node.is_dir() {
            return None;
        }
        let mut entries: Vec<Cow<'a, FsNode>> = node
            .children()
            .iter()
            .filter_map(|id| self.fs.node(id))
            .map(Cow::Borrowed)
            .collect();

        if self.mounted_cdrom_point().as_deref() == Some(path.as_str())
            && !entries.iter().any(|entry| entry.name == README_NAME)
        {
            entries.push(Cow::Owned(cdrom_readme_node()));
        }
        Some(entries)
    }

    fn mounted_cdrom_point(&self) -> Option<String> {
        let sr0 = self.devices.device(SR0)?;
        if !sr0.mounted {
            return None;
        }
        sr0.mount_point.as_deref().map(normalize)
    }

    fn cdrom_readme_path(&self) -> Option<String> {
        self.mounted_cdrom_point().map(|point| {
            if point == "/" {
                format!("/{README_NAME}")
            } else {
                format!("{point}/{README_NAME}")
            }
        })
    }
}

fn normalize(path: &str) -> String {
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}

fn synthetic(id: &str, name: &str, kind: NodeKind) -> FsNode {
    FsNode {
        id: id.to_string(),
        name: name.to_string(),
        parent: None,
        created_at: 0,
        modified_at: 0,
        hidden: false,
        metadata: Map::new(),
        kind,
    }
}

fn dev_dir_node() -> FsNode {
    synthetic("dev", "dev", NodeKind::Dir { children: vec![] })
}

fn device_node(device: &BlockDevice) -> FsNode {
    synthetic(
        &format!("dev:{}", device.name),
        &device.name,
        NodeKind::File {
            content: String::new(),
            executable: false,
        },
    )
}

fn cdrom_readme_node() -> FsNode {
    synthetic(
        "sr0:readme",
        README_NAME,
        NodeKind::File {
            content: CDROM_README.to_string(),
            executable: false,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::Desk;
    use std::sync::Arc;

    fn desk() -> Desk {
        Desk::in_memory_with_clock(Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_dev_listing_is_synthetic() {
        let desk = desk();
        let overlay = Overlay::new(&desk.fs, &desk.devices);

        assert!(overlay.is_virtual("/dev"));
        assert!(overlay.is_virtual("/dev/sr0"));
        assert!(!overlay.is_virtual("/home/user"));

        let names: Vec<_> = overlay
            .list("/dev")
            .unwrap()
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        assert_eq!(names, ["sda", "sda1", "sr0"]);
        assert!(overlay.resolve("/dev").unwrap().is_dir());
        assert!(overlay.resolve("/dev/sda1").unwrap().is_file());
        assert!(overlay.resolve("/dev/sdz").is_none());
    }

    #[test]
    fn test_readme_served_only_while_mounted() {
        let clock = Arc::new(ManualClock::new(0));
        let mut desk = Desk::in_memory_with_clock(clock.clone());
        {
            let overlay = Overlay::new(&desk.fs, &desk.devices);
            assert!(overlay.resolve("/mnt/cdrom/README.txt").is_none());
        }

        // Drive the puzzle machine through its public surface until armed,
        // then mount for real.
        desk.mount_device("/dev/sr0", Some("/mnt/cdrom")).ok();
        desk.mount_device("/dev/sr0", Some("/mnt/cdrom")).ok();
        clock.advance(crate::devices::DRAMATIC_DELAY_MS);
        desk.device_watcher_tick();
        desk.wm.close_window(crate::devices::README_WINDOW_ID);
        desk.device_watcher_tick();
        desk.mount_device("/dev/sr0", Some("/mnt/cdrom")).unwrap();

        let overlay = Overlay::new(&desk.fs, &desk.devices);
        let readme = overlay.resolve("/mnt/cdrom/README.txt").unwrap();
        assert_eq!(readme.content(), Some(CDROM_README));

        let names: Vec<_> = overlay
            .list("/mnt/cdrom")
            .unwrap()
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        assert_eq!(names, [README_NAME]);
    }

    #[test]
    fn test_non_directory_listing_is_none() {
        let desk = desk();
        let overlay = Overlay::new(&desk.fs, &desk.devices);
        assert!(overlay.list("/etc/os.conf").is_none());
        assert!(overlay.list("/missing").is_none());
    }
}
