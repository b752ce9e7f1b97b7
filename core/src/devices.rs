//! Block devices and the CD-ROM puzzle
//!
//! Three fixed devices are seeded at first boot: `sda`/`sda1` stand in for
//! the system disk, `sr0` is the puzzle CD-ROM. `sr0` advances through a
//! scripted state machine driven entirely by shell commands:
//!
//! `Idle → ProbeFailed → CuriosityDetected → PostFail → Armed`
//!
//! The first mount attempt always fails. Poking at the device again
//! (`lsblk`, `dmesg`, `mount`) counts as curiosity; after a short dramatic
//! delay a README appears on the desktop, opened in a tracked text-editor
//! window. The instant that window closes or loses focus the file is deleted
//! and the device arms. Only an armed device mounts, and only with an
//! explicit mount point.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

use crate::clock::Clock;
use crate::fs::path::resolve_path;
use crate::fs::store::NodeOpts;
use crate::fs::FsApi;
use crate::icons::DESKTOP_PATH;
use crate::Desk;

/// Name of the puzzle device.
pub const SR0: &str = "sr0";
/// Pause between the curiosity trigger and the desktop reveal.
pub const DRAMATIC_DELAY_MS: u64 = 1_800;
/// Name of the ephemeral clue file and of the CD-ROM payload file.
pub const README_NAME: &str = "README.txt";
/// Window id tracking the opened clue file.
pub const README_WINDOW_ID: &str = "textedit-readme";

const DESKTOP_README_PATH: &str = "/home/user/Desktop/README.txt";

/// Clue dropped on the desktop mid-puzzle.
pub const DESKTOP_README: &str = "Something tried to mount.\n\
It didn't.\n\
\n\
Devices don't always announce themselves.\n\
Some wait until nobody is watching.\n\
\n\
Hint:\n\
  lsblk\n\
  dmesg | grep -i cd\n\
  mount\n";

/// Payload served from the mounted CD-ROM.
pub const CDROM_README: &str = "You made it.\n\
\n\
The drive only opens for people who close what they were told to read.\n\
Enjoy the rest of the desktop - and check /home/user/.secrets\n\
when you feel like digging further.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Disk,
    Part,
    Rom,
}

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Disk => "disk",
            DeviceKind::Part => "part",
            DeviceKind::Rom => "rom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleState {
    Idle,
    // Legacy blobs used shorter names for these two; accept both spellings.
    #[serde(alias = "probe", alias = "fail_mount")]
    ProbeFailed,
    #[serde(alias = "readme_injected")]
    CuriosityDetected,
    PostFail,
    Armed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    pub maj_min: String,
    pub removable: bool,
    pub size: String,
    pub read_only: bool,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub mounted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_point: Option<String>,
    pub state: PuzzleState,
    #[serde(default)]
    pub mount_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStore {
    devices: BTreeMap<String, BlockDevice>,
    pending_reveal_at: Option<u64>,
    tracked_window: Option<String>,
}

impl Default for DeviceStore {
    fn default() -> Self {
        let mut devices = BTreeMap::new();
        devices.insert(
            "sda".to_string(),
            BlockDevice {
                name: "sda".into(),
                maj_min: "8:0".into(),
                removable: false,
                size: "238.5G".into(),
                read_only: false,
                kind: DeviceKind::Disk,
                mounted: true,
                mount_point: None,
                state: PuzzleState::Idle,
                mount_attempts: 0,
            },
        );
        devices.insert(
            "sda1".to_string(),
            BlockDevice {
                name: "sda1".into(),
                maj_min: "8:1".into(),
                removable: false,
                size: "238G".into(),
                read_only: false,
                kind: DeviceKind::Part,
                mounted: true,
                mount_point: Some("/".into()),
                state: PuzzleState::Idle,
                mount_attempts: 0,
            },
        );
        devices.insert(
            SR0.to_string(),
            BlockDevice {
                name: SR0.into(),
                maj_min: "11:0".into(),
                removable: true,
                size: "1.4G".into(),
                read_only: true,
                kind: DeviceKind::Rom,
                mounted: false,
                mount_point: None,
                state: PuzzleState::Idle,
                mount_attempts: 0,
            },
        );
        Self {
            devices,
            pending_reveal_at: None,
            tracked_window: None,
        }
    }
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(&self, name: &str) -> Option<&BlockDevice> {
        self.devices.get(name)
    }

    pub fn devices(&self) -> impl Iterator<Item = &BlockDevice> {
        self.devices.values()
    }

    pub fn pending_reveal_at(&self) -> Option<u64> {
        self.pending_reveal_at
    }

    pub fn tracked_window(&self) -> Option<&str> {
        self.tracked_window.as_deref()
    }

    fn device_mut(&mut self, name: &str) -> Option<&mut BlockDevice> {
        self.devices.get_mut(name)
    }
}

/// Outcome of a mount attempt, error text ready for the shell.
pub type MountResult = Result<(), String>;

impl Desk {
    /// Attempt to mount a device. Mirrors the scripted narrative: the fake
    /// disks always report mounted, and `sr0` only succeeds once armed.
    pub fn mount_device(&mut self, dev_path: &str, mount_point: Option<&str>) -> MountResult {
        let dev_name = dev_path.strip_prefix("/dev/").unwrap_or(dev_path);
        let Some(device) = self.devices.device(dev_name) else {
            return Err(format!("mount: {dev_path}: No such device"));
        };
        if dev_name != SR0 {
            return Err(format!("mount: {dev_path} already mounted"));
        }
        if device.mounted {
            return Ok(());
        }

        if device.state == PuzzleState::Armed {
            let Some(point) = mount_point else {
                return Err("mount: missing operand".to_string());
            };
            let mut fs = FsApi::new(&mut self.fs);
            match fs.stat(point) {
                Some(node) if !node.is_dir() => {
                    return Err(format!("mount: mount point {point} is not a directory"));
                }
                Some(_) => {}
                None => {
                    fs.mkdir_all(point)
                        .map_err(|e| format!("mount: cannot create {point}: {e}"))?;
                }
            }
            if let Some(device) = self.devices.device_mut(SR0) {
                device.mounted = true;
                device.mount_point = Some(point.to_string());
            }
            tracing::info!(mount_point = point, "sr0 mounted");
            return Ok(());
        }

        // Every failed attempt is counted; the very first one moves the
        // machine out of Idle, repeats feed the curiosity trigger.
        let now = self.clock.now_ms();
        let attempts = {
            let device = match self.devices.device_mut(SR0) {
                Some(device) => device,
                None => return Err(format!("mount: {dev_path}: No such device")),
            };
            device.mount_attempts += 1;
            if device.mount_attempts == 1 {
                device.state = PuzzleState::ProbeFailed;
            }
            device.mount_attempts
        };
        self.notifications.push(
            "Failed to mount CD-ROM",
            "mount: /dev/sr0: access denied",
            "system",
            false,
            now,
        );
        if attempts >= 2 {
            self.trigger_curiosity();
        }
        Err(format!("mount: {dev_path}: access denied"))
    }

    /// Curiosity trigger, fired by the probing commands (`lsblk`, `dmesg`,
    /// `mount`). Only a probed-and-failed device takes the bait.
    pub fn curiosity_check(&mut self) {
        let should_trigger = self
            .devices
            .device(SR0)
            .map(|device| device.state == PuzzleState::ProbeFailed && device.mount_attempts >= 1)
            .unwrap_or(false);
        if should_trigger {
            self.trigger_curiosity();
        }
    }

    fn trigger_curiosity(&mut self) {
        let now = self.clock.now_ms();
        if let Some(device) = self.devices.device_mut(SR0) {
            if device.state == PuzzleState::ProbeFailed {
                device.state = PuzzleState::CuriosityDetected;
                self.devices.pending_reveal_at = Some(now + DRAMATIC_DELAY_MS);
                tracing::debug!("sr0 curiosity detected, reveal scheduled");
            }
        }
    }

    /// Watcher pass. Runs after every command and once at load: performs the
    /// delayed desktop reveal, and arms the device the moment the tracked
    /// window is gone or unfocused (including the mid-puzzle-reload case
    /// where no window is tracked at all).
    pub fn device_watcher_tick(&mut self) {
        let now = self.clock.now_ms();
        let state = match self.devices.device(SR0) {
            Some(device) => device.state,
            None => return,
        };
        match state {
            PuzzleState::CuriosityDetected => {
                let due = self
                    .devices
                    .pending_reveal_at
                    .map(|at| now >= at)
                    .unwrap_or(true);
                if due {
                    self.reveal_readme(now);
                }
            }
            PuzzleState::PostFail => {
                let window_active = self
                    .devices
                    .tracked_window
                    .as_deref()
                    .map(|id| {
                        self.wm.window(id).is_some()
                            && self.wm.focused_window_id() == Some(id)
                    })
                    .unwrap_or(false);
                if !window_active {
                    self.cleanup_readme();
                }
            }
            _ => {}
        }
    }

    fn reveal_readme(&mut self, now: u64) {
        let desktop = resolve_path(DESKTOP_PATH, self.fs.nodes(), self.fs.root_id())
            .map(|node| (node.id.clone(), node.children().to_vec()));
        let Some((desktop_id, children)) = desktop else {
            return;
        };
        let already_there = children
            .iter()
            .filter_map(|id| self.fs.node(id))
            .any(|node| node.name == README_NAME);
        if !already_there {
            if let Err(e) =
                self.fs
                    .create_file(&desktop_id, README_NAME, DESKTOP_README, NodeOpts::default())
            {
                tracing::warn!(error = %e, "could not inject desktop README");
                return;
            }
        }

        let mut props = Map::new();
        props.insert("path".to_string(), json!(DESKTOP_README_PATH));
        self.wm
            .open_window(README_WINDOW_ID, "textedit", README_NAME, "description", props);

        self.devices.tracked_window = Some(README_WINDOW_ID.to_string());
        self.devices.pending_reveal_at = None;
        if let Some(device) = self.devices.device_mut(SR0) {
            device.state = PuzzleState::PostFail;
        }
        self.notifications.push(
            "Removable media",
            "README.txt appeared on the Desktop",
            "textedit",
            false,
            now,
        );
    }

    fn cleanup_readme(&mut self) {
        let readme = resolve_path(DESKTOP_README_PATH, self.fs.nodes(), self.fs.root_id())
            .map(|node| node.id.clone());
        if let Some(id) = readme {
            self.fs.delete_node(&id);
        }
        self.devices.tracked_window = None;
        self.devices.pending_reveal_at = None;
        if let Some(device) = self.devices.device_mut(SR0) {
            device.state = PuzzleState::Armed;
        }
        tracing::debug!("sr0 armed");
    }
}
