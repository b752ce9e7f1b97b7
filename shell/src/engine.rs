//! Pipeline engine
//!
//! Splits a line on `|`, runs each stage left to right, threading stdout
//! into the next stage's stdin. The first stage that fails becomes the
//! pipeline's result; later stages never run. Empty segments (a trailing
//! pipe, doubled pipes) are skipped rather than rejected. A stage that
//! panics is downgraded to a generic system error instead of taking the
//! terminal down.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Map;
use winteros_core::apps;

use crate::commands;
use crate::context::{CommandResult, ShellContext};

/// Exit code for an unknown command name.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Evaluate one line of input as a pipeline.
pub fn execute(input: &str, ctx: &mut ShellContext) -> CommandResult {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return CommandResult::ok("");
    }

    let mut stdin = String::new();
    let mut last = CommandResult::ok("");

    for segment in trimmed.split('|') {
        let words = tokenize(segment);
        let Some((name, args)) = words.split_first() else {
            continue;
        };

        let result = run_stage(name, args, &stdin, ctx);

        if result.exit_code != 0 {
            return result;
        }
        // Interactive and clear directives cannot feed a next stage.
        if result.interactive.is_some() || result.clear {
            return result;
        }
        stdin = result.output.clone();
        last = result;
    }

    last
}

fn run_stage(name: &str, args: &[String], stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    if let Some(handler) = commands::lookup(name) {
        let caught = catch_unwind(AssertUnwindSafe(|| handler(args, stdin, ctx)));
        return match caught {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(command = name, "command handler panicked");
                CommandResult::with_code("System error", 1)
            }
        };
    }

    // A bare app id is a launcher.
    if let Some(app) = apps::find(name) {
        ctx.desk
            .wm
            .open_window(app.id, app.id, app.title, app.icon, Map::new());
        ctx.desk.session.bump_frequent(app.id);
        return CommandResult::ok(format!("Opening {}...", app.title));
    }

    CommandResult::with_code(format!("{name}: command not found"), EXIT_NOT_FOUND)
}

/// Whitespace word split with double/single quoted tokens unwrapped. No
/// variables, no globbing, no escapes - quoting exists so that
/// `echo "hello world"` and `grep "two words"` behave.
fn tokenize(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;

    for c in segment.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    quoted = true;
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        words.push(std::mem::take(&mut current));
                    }
                    quoted = false;
                }
                _ => current.push(c),
            },
        }
    }
    if !current.is_empty() || quoted {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use winteros_core::{Desk, ManualClock};

    fn desk() -> Desk {
        Desk::in_memory_with_clock(Arc::new(ManualClock::new(0)))
    }

    fn run(desk: &mut Desk, cwd: &mut String, input: &str) -> CommandResult {
        let mut ctx = ShellContext::new(cwd, desk);
        execute(input, &mut ctx)
    }

    #[test]
    fn test_tokenize_unwraps_quotes() {
        assert_eq!(tokenize("echo hello world"), ["echo", "hello", "world"]);
        assert_eq!(tokenize(r#"grep "two words""#), ["grep", "two words"]);
        assert_eq!(tokenize("echo 'a b'  c"), ["echo", "a b", "c"]);
        assert_eq!(tokenize("echo \"\""), ["echo", ""]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_empty_input_is_quiet_success() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");
        let result = run(&mut desk, &mut cwd, "   ");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "");
    }

    #[test]
    fn test_unknown_command_is_127() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");
        let result = run(&mut desk, &mut cwd, "frobnicate");
        assert_eq!(result.exit_code, EXIT_NOT_FOUND);
        assert_eq!(result.output, "frobnicate: command not found");
    }

    #[test]
    fn test_pipe_threads_stdout_to_stdin() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");
        let result = run(&mut desk, &mut cwd, "echo one two | grep one");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "one two");
    }

    #[test]
    fn test_failing_stage_stops_the_pipeline() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");

        // The second stage would create a directory; the first stage fails,
        // so it must never run.
        let result = run(&mut desk, &mut cwd, "cat /does/not/exist | mkdir /home/user/leak");
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("No such file or directory"));

        let check = run(&mut desk, &mut cwd, "ls /home/user");
        assert!(!check.output.contains("leak"));
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");
        let result = run(&mut desk, &mut cwd, "echo keep | | grep keep |");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "keep");
    }

    #[test]
    fn test_unknown_command_mid_pipeline_is_127() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");
        let result = run(&mut desk, &mut cwd, "echo hi | zap");
        assert_eq!(result.exit_code, EXIT_NOT_FOUND);
    }

    #[test]
    fn test_app_launcher_opens_window_and_counts() {
        let mut desk = desk();
        let mut cwd = String::from("/home/user");
        let result = run(&mut desk, &mut cwd, "settings");
        assert_eq!(result.exit_code, 0);
        assert!(desk.wm.window("settings").is_some());
        assert_eq!(desk.wm.focused_window_id(), Some("settings"));
        assert_eq!(desk.session.frequent_apps[0].app_id, "settings");

        run(&mut desk, &mut cwd, "settings");
        assert_eq!(desk.session.frequent_apps[0].count, 2);
        assert_eq!(desk.wm.windows().count(), 1);
    }
}
