//! Command execution context
//!
//! Everything a command handler can touch: the working directory, the desk
//! stores, and overlay-aware read helpers. Reads go through the device
//! overlay so `/dev` and a mounted CD-ROM look like ordinary paths; writes
//! only ever reach the real tree.

use winteros_core::fs::{resolve_relative, FsApi};
use winteros_core::overlay::Overlay;
use winteros_core::Desk;

/// Result of one command (and, unchanged, of a whole pipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub output: String,
    pub exit_code: i32,
    pub clear: bool,
    pub interactive: Option<Interactive>,
}

/// Directive asking the caller to switch the terminal into a modal mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Interactive {
    Nano { path: String },
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: 0,
            clear: false,
            interactive: None,
        }
    }

    /// `cmd: message`, exit code 1 - the shape every user-input error takes.
    pub fn error(cmd: &str, message: impl std::fmt::Display) -> Self {
        Self {
            output: format!("{cmd}: {message}"),
            exit_code: 1,
            clear: false,
            interactive: None,
        }
    }

    pub fn with_code(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
            clear: false,
            interactive: None,
        }
    }
}

/// A resolved directory entry, detached from store borrows.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub hidden: bool,
    pub executable: bool,
}

pub struct ShellContext<'a> {
    pub cwd: &'a mut String,
    pub desk: &'a mut Desk,
}

impl<'a> ShellContext<'a> {
    pub fn new(cwd: &'a mut String, desk: &'a mut Desk) -> Self {
        Self { cwd, desk }
    }

    /// Resolve a command argument against the working directory.
    pub fn resolve(&self, target: &str) -> String {
        resolve_relative(self.cwd, target)
    }

    /// Mutable path-level access to the real tree.
    pub fn fs_mut(&mut self) -> FsApi<'_> {
        FsApi::new(&mut self.desk.fs)
    }

    pub fn exists(&self, abs: &str) -> bool {
        Overlay::new(&self.desk.fs, &self.desk.devices)
            .resolve(abs)
            .is_some()
    }

    pub fn is_virtual(&self, abs: &str) -> bool {
        Overlay::new(&self.desk.fs, &self.desk.devices).is_virtual(abs)
    }

    pub fn stat(&self, abs: &str) -> Option<Entry> {
        Overlay::new(&self.desk.fs, &self.desk.devices)
            .resolve(abs)
            .map(|node| Entry {
                name: node.name.clone(),
                is_dir: node.is_dir(),
                hidden: node.hidden,
                executable: node.executable(),
            })
    }

    pub fn read(&self, abs: &str) -> Option<String> {
        Overlay::new(&self.desk.fs, &self.desk.devices)
            .resolve(abs)
            .and_then(|node| node.content().map(str::to_string))
    }

    pub fn list(&self, abs: &str) -> Option<Vec<Entry>> {
        Overlay::new(&self.desk.fs, &self.desk.devices)
            .list(abs)
            .map(|entries| {
                entries
                    .iter()
                    .map(|node| Entry {
                        name: node.name.clone(),
                        is_dir: node.is_dir(),
                        hidden: node.hidden,
                        executable: node.executable(),
                    })
                    .collect()
            })
    }
}
