//! Modal line editor
//!
//! The `nano` command does not execute inline; it hands the caller an
//! interactive directive and the terminal switches into this editor until
//! exit. Input lines append to the buffer, `^O` writes the buffer out, `^X`
//! exits - asking for confirmation first when the buffer changed since the
//! last write or open.

use crate::context::ShellContext;

/// What the editor wants the terminal to do after one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum NanoOutcome {
    /// Stay in the editor, optionally showing a status message.
    Continue(Option<String>),
    /// Leave the editor, optionally showing a final message.
    Exit(Option<String>),
}

#[derive(Debug)]
pub struct NanoEditor {
    path: String,
    lines: Vec<String>,
    dirty: bool,
    confirming_exit: bool,
}

impl NanoEditor {
    /// Open a file in the editor: read existing content, or start an empty
    /// buffer for a new file.
    pub fn open(ctx: &ShellContext, path: String) -> Result<Self, String> {
        if let Some(stat) = ctx.stat(&path) {
            if stat.is_dir {
                return Err(format!("nano: {path}: Is a directory"));
            }
        }
        let lines = match ctx.read(&path) {
            Some(content) if !content.is_empty() => {
                content.split('\n').map(str::to_string).collect()
            }
            _ => Vec::new(),
        };
        Ok(Self {
            path,
            lines,
            dirty: false,
            confirming_exit: false,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Banner shown when the editor takes over the terminal.
    pub fn header(&self) -> String {
        format!(
            "nano: editing {} ({} lines) - type to append, ^O writes, ^X exits",
            self.path,
            self.lines.len()
        )
    }

    pub fn buffer(&self) -> String {
        self.lines.join("\n")
    }

    /// Feed one input line to the editor.
    pub fn handle_line(&mut self, line: &str, ctx: &mut ShellContext) -> NanoOutcome {
        if self.confirming_exit {
            return match line.trim() {
                "y" | "Y" | "yes" => match self.save(ctx) {
                    Ok(count) => NanoOutcome::Exit(Some(format!("[ Wrote {count} lines ]"))),
                    Err(message) => {
                        self.confirming_exit = false;
                        NanoOutcome::Continue(Some(message))
                    }
                },
                "n" | "N" | "no" => NanoOutcome::Exit(None),
                _ => NanoOutcome::Continue(Some("Save modified buffer? (y/n)".to_string())),
            };
        }

        match line.trim_end() {
            "^X" | "^x" => {
                if self.dirty {
                    self.confirming_exit = true;
                    NanoOutcome::Continue(Some("Save modified buffer? (y/n)".to_string()))
                } else {
                    NanoOutcome::Exit(None)
                }
            }
            "^O" | "^o" => match self.save(ctx) {
                Ok(count) => NanoOutcome::Continue(Some(format!("[ Wrote {count} lines ]"))),
                Err(message) => NanoOutcome::Continue(Some(message)),
            },
            _ => {
                self.lines.push(line.to_string());
                self.dirty = true;
                NanoOutcome::Continue(None)
            }
        }
    }

    fn save(&mut self, ctx: &mut ShellContext) -> Result<usize, String> {
        ctx.fs_mut()
            .write(&self.path, &self.buffer())
            .map_err(|e| format!("nano: write failed: {e}"))?;
        self.dirty = false;
        Ok(self.lines.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use winteros_core::{Desk, ManualClock};

    fn desk() -> Desk {
        Desk::in_memory_with_clock(Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_edit_write_exit() {
        let mut desk = desk();
        let mut cwd = "/home/user".to_string();
        let mut ctx = ShellContext::new(&mut cwd, &mut desk);

        let mut editor = NanoEditor::open(&ctx, "/home/user/poem.txt".to_string()).unwrap();
        assert_eq!(editor.line_count(), 0);

        editor.handle_line("snow falls", &mut ctx);
        editor.handle_line("quietly", &mut ctx);
        let saved = editor.handle_line("^O", &mut ctx);
        assert_eq!(
            saved,
            NanoOutcome::Continue(Some("[ Wrote 2 lines ]".to_string()))
        );

        // Clean buffer exits without a prompt.
        assert_eq!(editor.handle_line("^X", &mut ctx), NanoOutcome::Exit(None));
        assert_eq!(ctx.read("/home/user/poem.txt").as_deref(), Some("snow falls\nquietly"));
    }

    #[test]
    fn test_dirty_exit_asks_for_confirmation() {
        let mut desk = desk();
        let mut cwd = "/home/user".to_string();
        let mut ctx = ShellContext::new(&mut cwd, &mut desk);

        let mut editor = NanoEditor::open(&ctx, "/home/user/draft.txt".to_string()).unwrap();
        editor.handle_line("unsaved thought", &mut ctx);

        let prompt = editor.handle_line("^X", &mut ctx);
        assert_eq!(
            prompt,
            NanoOutcome::Continue(Some("Save modified buffer? (y/n)".to_string()))
        );

        // Garbage answer re-prompts; "y" saves and exits.
        assert!(matches!(
            editor.handle_line("maybe", &mut ctx),
            NanoOutcome::Continue(Some(_))
        ));
        assert_eq!(
            editor.handle_line("y", &mut ctx),
            NanoOutcome::Exit(Some("[ Wrote 1 lines ]".to_string()))
        );
        assert_eq!(ctx.read("/home/user/draft.txt").as_deref(), Some("unsaved thought"));
    }

    #[test]
    fn test_dirty_exit_discard() {
        let mut desk = desk();
        let mut cwd = "/home/user".to_string();
        let mut ctx = ShellContext::new(&mut cwd, &mut desk);

        let mut editor = NanoEditor::open(&ctx, "/home/user/scratch.txt".to_string()).unwrap();
        editor.handle_line("throwaway", &mut ctx);
        editor.handle_line("^X", &mut ctx);
        assert_eq!(editor.handle_line("n", &mut ctx), NanoOutcome::Exit(None));
        assert!(ctx.read("/home/user/scratch.txt").is_none());
    }

    #[test]
    fn test_open_loads_existing_content() {
        let mut desk = desk();
        let mut cwd = "/home/user".to_string();
        let mut ctx = ShellContext::new(&mut cwd, &mut desk);
        ctx.fs_mut()
            .write("/home/user/existing.txt", "line one\nline two")
            .unwrap();

        let editor = NanoEditor::open(&ctx, "/home/user/existing.txt".to_string()).unwrap();
        assert_eq!(editor.line_count(), 2);
        assert_eq!(editor.buffer(), "line one\nline two");
    }

    #[test]
    fn test_open_rejects_directories() {
        let mut desk = desk();
        let mut cwd = "/home/user".to_string();
        let ctx = ShellContext::new(&mut cwd, &mut desk);
        let err = NanoEditor::open(&ctx, "/home/user/Desktop".to_string()).unwrap_err();
        assert!(err.contains("Is a directory"));
    }
}
