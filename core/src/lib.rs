//! # winteros-core - state stores and engines for the Winter.OS desktop
//!
//! `winteros-core` owns every piece of simulated system state: the virtual
//! filesystem tree, the block-device puzzle, the window manager, desktop
//! icons, notifications, settings and session flags. Stores are plain
//! structs bundled into one explicit [`Desk`] context that callers pass
//! around - there are no ambient singletons, so any number of independent
//! desktops can coexist (and be tested) in one process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! // Ephemeral desktop (tests, demos)
//! let mut desk = Desk::in_memory();
//!
//! // Persistent desktop backed by a state directory
//! let mut desk = Desk::builder()
//!     .state_dir(".winteros")
//!     .viewport(1280, 800)
//!     .build()?;
//! desk.flush()?;
//! ```

pub mod apps;
pub mod clock;
pub mod devices;
pub mod error;
pub mod fs;
pub mod icons;
pub mod notify;
pub mod overlay;
pub mod persist;
pub mod session;
pub mod settings;
pub mod wm;

use std::path::PathBuf;
use std::sync::Arc;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{CoreError, CoreResult};

use devices::DeviceStore;
use fs::{FsState, FsStore};
use notify::NotificationStore;
use persist::{StateStore, KEY_DEVICES, KEY_FS, KEY_SESSION, KEY_SETTINGS, KEY_WM};
use session::Session;
use settings::Settings;
use wm::WmStore;

/// The whole simulated desktop: one value owning every store.
pub struct Desk {
    pub fs: FsStore,
    pub devices: DeviceStore,
    pub wm: WmStore,
    pub notifications: NotificationStore,
    pub settings: Settings,
    pub session: Session,
    pub clock: SharedClock,
    persist: Option<StateStore>,
}

impl Desk {
    /// Create a new builder for customizing a desk.
    pub fn builder() -> DeskBuilder {
        DeskBuilder::default()
    }

    /// An ephemeral desk with the default tree and the wall clock.
    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    /// An ephemeral desk on an injected clock (tests drive time by hand).
    pub fn in_memory_with_clock(clock: SharedClock) -> Self {
        let mut desk = Self {
            fs: FsStore::with_defaults(clock.clone()),
            devices: DeviceStore::new(),
            wm: WmStore::new(),
            notifications: NotificationStore::new(),
            settings: Settings::default(),
            session: Session::default(),
            clock,
            persist: None,
        };
        desk.device_watcher_tick();
        desk
    }

    /// Open (or create) a persistent desk under a state directory.
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::builder().state_dir(dir).build()
    }

    /// Persist every store. Each blob is written independently; there is no
    /// cross-blob transaction (the load-time watcher pass repairs the gaps).
    pub fn flush(&self) -> CoreResult<()> {
        let Some(persist) = &self.persist else {
            return Ok(());
        };
        persist.save(KEY_FS, &self.fs.to_state())?;
        persist.save(KEY_DEVICES, &self.devices)?;
        persist.save(KEY_WM, &self.wm)?;
        persist.save(KEY_SETTINGS, &self.settings)?;
        persist.save(KEY_SESSION, &self.session)?;
        Ok(())
    }

    pub fn state_dir(&self) -> Option<&std::path::Path> {
        self.persist.as_ref().map(StateStore::dir)
    }
}

/// Builder for constructing a customized [`Desk`].
#[derive(Default)]
pub struct DeskBuilder {
    state_dir: Option<PathBuf>,
    clock: Option<SharedClock>,
    viewport: Option<(u32, u32)>,
}

impl DeskBuilder {
    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Some((width, height));
        self
    }

    pub fn build(self) -> CoreResult<Desk> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let persist = match self.state_dir {
            Some(dir) => Some(StateStore::open(dir)?),
            None => None,
        };

        let mut fs = match &persist {
            Some(store) => match store.load::<FsState>(KEY_FS)? {
                Some(state) => FsStore::from_state(state, clock.clone()),
                None => FsStore::with_defaults(clock.clone()),
            },
            None => FsStore::with_defaults(clock.clone()),
        };
        fs.init();

        let devices = persist
            .as_ref()
            .and_then(|store| store.load::<DeviceStore>(KEY_DEVICES).ok().flatten())
            .unwrap_or_default();
        let mut wm = persist
            .as_ref()
            .and_then(|store| store.load::<WmStore>(KEY_WM).ok().flatten())
            .unwrap_or_default();
        let settings = persist
            .as_ref()
            .and_then(|store| store.load::<Settings>(KEY_SETTINGS).ok().flatten())
            .unwrap_or_default();
        let session = persist
            .as_ref()
            .and_then(|store| store.load::<Session>(KEY_SESSION).ok().flatten())
            .unwrap_or_default();

        if let Some((width, height)) = self.viewport {
            wm.set_viewport(width, height);
        }

        let mut desk = Desk {
            fs,
            devices,
            wm,
            notifications: NotificationStore::new(),
            settings,
            session,
            clock,
            persist,
        };
        // Defensive reconciliation: a reload mid-puzzle must not leave the
        // device machine pointing at a window that no longer exists.
        desk.device_watcher_tick();
        Ok(desk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FsApi, NodeOpts};
    use tempfile::tempdir;

    #[test]
    fn test_flush_and_reopen_roundtrip() {
        let dir = tempdir().unwrap();

        {
            let mut desk = Desk::open(dir.path()).unwrap();
            let mut fs = FsApi::new(&mut desk.fs);
            fs.write("/home/user/Documents/journal.txt", "day one").unwrap();
            desk.settings.volume = 15;
            desk.session.boot_seen = true;
            desk.flush().unwrap();
        }

        let mut desk = Desk::open(dir.path()).unwrap();
        let fs = FsApi::new(&mut desk.fs);
        assert_eq!(fs.read("/home/user/Documents/journal.txt"), Some("day one"));
        assert_eq!(desk.settings.volume, 15);
        assert!(desk.session.boot_seen);
    }

    #[test]
    fn test_corrupt_fs_blob_recovers_to_default_tree() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("os.fs.v1.json"), "{definitely not json").unwrap();

        let mut desk = Desk::open(dir.path()).unwrap();
        let fs = FsApi::new(&mut desk.fs);
        assert!(fs.exists("/home/user/Desktop"));
        assert!(fs.exists("/bin"));
    }

    #[test]
    fn test_in_memory_desks_are_independent() {
        let mut a = Desk::in_memory();
        let b = Desk::in_memory();

        let root = a.fs.root_id().to_string();
        a.fs
            .create_file(&root, "only-in-a.txt", "", NodeOpts::default())
            .unwrap();

        let count_children = |desk: &Desk| desk.fs.node(desk.fs.root_id()).unwrap().children().len();
        assert_eq!(count_children(&a), count_children(&b) + 1);
    }
}
