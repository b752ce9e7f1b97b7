//! Interactive terminal session
//!
//! The rustyline loop driving the simulated desktop: prompt, execute the
//! pipeline, render output and notifications, run the nano modal editor when
//! asked, and persist every store after each command.

use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use winteros_core::devices::DRAMATIC_DELAY_MS;
use winteros_core::fs::HOME;
use winteros_core::{Clock, Desk};
use winteros_shell::{execute, Interactive, NanoEditor, NanoOutcome, ShellContext};

fn print_banner(first_boot: bool) {
    if !first_boot {
        println!("{}", "Welcome back to Winter.OS.".cyan());
        return;
    }
    println!();
    println!("   {}        {}", "*  .  *".bright_cyan(), "Winter.OS".bold().cyan());
    println!(" {}        {}", ".  / \\  .".bright_cyan(), "a desktop for your terminal".cyan());
    println!("   {}       {}", "/___\\".bright_cyan(), format!("{} shows the commands", "help".bold()).cyan());
    println!("    {}", "|_|".bright_cyan());
    println!();
}

fn prompt_for(cwd: &str) -> String {
    let short = if cwd == HOME {
        "~".to_string()
    } else if let Some(rest) = cwd.strip_prefix("/home/user/") {
        format!("~/{rest}")
    } else {
        cwd.to_string()
    };
    format!("user@winteros:{short}$ ")
}

/// Post-command upkeep: play out the puzzle's dramatic pause, run the device
/// watcher, surface fresh notifications.
fn upkeep(desk: &mut Desk, allow_pause: bool) {
    if allow_pause {
        if let Some(at) = desk.devices.pending_reveal_at() {
            let now = desk.clock.now_ms();
            if at > now && at - now <= DRAMATIC_DELAY_MS {
                std::thread::sleep(std::time::Duration::from_millis(at - now));
            }
        }
    }
    desk.device_watcher_tick();
    for note in desk.notifications.drain_new() {
        println!(
            "{} {} {}",
            "*".cyan().bold(),
            note.title.cyan().bold(),
            format!("- {}", note.body).cyan()
        );
    }
}

fn render(output: &str, exit_code: i32) {
    if output.is_empty() {
        return;
    }
    if exit_code == 0 {
        println!("{output}");
    } else {
        eprintln!("{}", output.red());
    }
}

pub fn run(desk: &mut Desk) -> anyhow::Result<()> {
    print_banner(!desk.session.boot_seen);
    desk.session.boot_seen = true;
    desk.flush()?;

    let mut rl = DefaultEditor::new()?;
    let history_path = desk.state_dir().map(|dir| dir.join("history"));
    if let Some(path) = &history_path {
        let _ = rl.load_history(path);
    }

    let mut cwd = String::from(HOME);
    loop {
        match rl.readline(&prompt_for(&cwd)) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;

                let result = {
                    let mut ctx = ShellContext::new(&mut cwd, desk);
                    execute(&line, &mut ctx)
                };

                if result.clear {
                    print!("\x1B[2J\x1B[1;1H");
                }
                match &result.interactive {
                    Some(Interactive::Nano { path }) => {
                        run_nano(desk, &mut rl, &mut cwd, path.clone())?;
                    }
                    None => render(&result.output, result.exit_code),
                }

                upkeep(desk, true);
                desk.flush()?;
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "logout".cyan());
                if let Some(path) = &history_path {
                    let _ = rl.save_history(path);
                }
                break;
            }
            Err(err) => {
                eprintln!("{}: {err}", "error".red().bold());
                break;
            }
        }
    }
    desk.flush()?;
    Ok(())
}

fn run_nano(
    desk: &mut Desk,
    rl: &mut DefaultEditor,
    cwd: &mut String,
    path: String,
) -> anyhow::Result<()> {
    let opened = {
        let ctx = ShellContext::new(cwd, desk);
        NanoEditor::open(&ctx, path)
    };
    let mut editor = match opened {
        Ok(editor) => editor,
        Err(message) => {
            eprintln!("{}", message.red());
            return Ok(());
        }
    };

    println!("{}", editor.header().bright_black());
    loop {
        match rl.readline("  ") {
            Ok(line) => {
                let outcome = {
                    let mut ctx = ShellContext::new(cwd, desk);
                    editor.handle_line(&line, &mut ctx)
                };
                match outcome {
                    NanoOutcome::Continue(Some(message)) => println!("{}", message.bright_black()),
                    NanoOutcome::Continue(None) => {}
                    NanoOutcome::Exit(message) => {
                        if let Some(message) = message {
                            println!("{}", message.bright_black());
                        }
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// `-c` mode: run the given commands in order without a terminal session.
pub fn run_batch(desk: &mut Desk, commands: &[String]) -> anyhow::Result<()> {
    let mut cwd = String::from(HOME);
    let mut failed = false;

    for command in commands {
        let result = {
            let mut ctx = ShellContext::new(&mut cwd, desk);
            execute(command, &mut ctx)
        };
        if result.interactive.is_some() {
            eprintln!("nano: the editor needs an interactive session");
            failed = true;
        } else {
            render(&result.output, result.exit_code);
        }
        if result.exit_code != 0 {
            failed = true;
        }
        upkeep(desk, false);
    }

    desk.flush()?;
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
