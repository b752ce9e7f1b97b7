//! Command set
//!
//! Every command is a plain function behind a name lookup. Handlers resolve
//! their path arguments against the working directory, report user errors as
//! one-line `cmd: message` results with a non-zero exit code, and never
//! panic on bad input.

use winteros_core::devices::{PuzzleState, SR0};
use winteros_core::fs::split_parent;
use winteros_core::icons;

use crate::context::{CommandResult, Entry, Interactive, ShellContext};

pub type CommandFn = fn(&[String], &str, &mut ShellContext) -> CommandResult;

pub fn lookup(name: &str) -> Option<CommandFn> {
    Some(match name {
        "ls" => ls,
        "cd" => cd,
        "pwd" => pwd,
        "cat" => cat,
        "mkdir" => mkdir,
        "touch" => touch,
        "rm" => rm,
        "mv" => mv,
        "mount" => mount,
        "lsblk" => lsblk,
        "dmesg" => dmesg,
        "grep" => grep,
        "clear" => clear,
        "echo" => echo,
        "help" => help,
        "base64" => base64,
        "nano" => nano,
        "sudo" => sudo,
        "neofetch" => neofetch,
        "windows" => windows,
        "close" => close,
        "desktop" => desktop,
        "trash" => trash,
        "restore" => restore,
        _ => return None,
    })
}

fn visible(entry: &Entry) -> bool {
    !entry.hidden && !entry.name.starts_with('.')
}

fn ls(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let all = args.iter().any(|arg| arg == "-a");
    let target = args
        .iter()
        .find(|arg| !arg.starts_with('-'))
        .map(String::as_str)
        .unwrap_or(".");
    let abs = ctx.resolve(target);

    let Some(stat) = ctx.stat(&abs) else {
        return CommandResult::error(
            "ls",
            format!("cannot access '{target}': No such file or directory"),
        );
    };
    if !stat.is_dir {
        return CommandResult::ok(stat.name);
    }

    let mut entries = ctx.list(&abs).unwrap_or_default();
    if !all {
        entries.retain(visible);
    }
    // Directories first, then lexicographic.
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then(a.name.cmp(&b.name)));
    let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    CommandResult::ok(names.join("  "))
}

fn cd(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let target = args.first().map(String::as_str).unwrap_or("~");
    let abs = ctx.resolve(target);
    match ctx.stat(&abs) {
        None => CommandResult::error("cd", format!("{target}: No such file or directory")),
        Some(stat) if !stat.is_dir => {
            CommandResult::error("cd", format!("{target}: Not a directory"))
        }
        Some(_) => {
            *ctx.cwd = abs;
            CommandResult::ok("")
        }
    }
}

fn pwd(_args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    CommandResult::ok(ctx.cwd.clone())
}

fn cat(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::error("cat", "missing operand");
    }
    let mut chunks = Vec::new();
    for arg in args {
        let abs = ctx.resolve(arg);
        match ctx.stat(&abs) {
            None => {
                return CommandResult::error(
                    "cat",
                    format!("{arg}: No such file or directory"),
                )
            }
            Some(stat) if stat.is_dir => {
                return CommandResult::error("cat", format!("{arg}: Is a directory"))
            }
            Some(_) => chunks.push(ctx.read(&abs).unwrap_or_default()),
        }
    }
    CommandResult::ok(chunks.join("\n"))
}

fn mkdir(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::error("mkdir", "missing operand");
    }
    let mut errors = Vec::new();
    for arg in args {
        let abs = ctx.resolve(arg);
        if ctx.exists(&abs) {
            errors.push(format!("mkdir: cannot create directory '{arg}': File exists"));
            continue;
        }
        let (parent, _) = split_parent(&abs);
        if ctx.stat(&parent).map(|stat| stat.is_dir) != Some(true) {
            errors.push(format!(
                "mkdir: cannot create directory '{arg}': No such file or directory"
            ));
            continue;
        }
        if let Err(e) = ctx.fs_mut().mkdir(&abs) {
            errors.push(format!("mkdir: cannot create directory '{arg}': {e}"));
        }
    }
    if errors.is_empty() {
        CommandResult::ok("")
    } else {
        CommandResult::with_code(errors.join("\n"), 1)
    }
}

fn touch(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::error("touch", "missing operand");
    }
    let mut errors = Vec::new();
    for arg in args {
        let abs = ctx.resolve(arg);
        if ctx.exists(&abs) {
            continue;
        }
        let (parent, _) = split_parent(&abs);
        if ctx.stat(&parent).map(|stat| stat.is_dir) != Some(true) {
            errors.push(format!("touch: cannot touch '{arg}': No such file or directory"));
            continue;
        }
        if let Err(e) = ctx.fs_mut().write(&abs, "") {
            errors.push(format!("touch: cannot touch '{arg}': {e}"));
        }
    }
    if errors.is_empty() {
        CommandResult::ok("")
    } else {
        CommandResult::with_code(errors.join("\n"), 1)
    }
}

fn rm(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let mut recursive = false;
    let mut force = false;
    let mut targets = Vec::new();
    for arg in args {
        match arg.strip_prefix('-') {
            Some(flags) if !flags.is_empty() && flags.chars().all(|c| matches!(c, 'r' | 'R' | 'f')) => {
                recursive |= flags.contains(['r', 'R']);
                force |= flags.contains('f');
            }
            _ => targets.push(arg.as_str()),
        }
    }
    if targets.is_empty() {
        return CommandResult::error("rm", "missing operand");
    }

    let mut errors = Vec::new();
    for target in targets {
        let abs = ctx.resolve(target);
        if ctx.is_virtual(&abs) {
            errors.push(format!("rm: cannot remove '{target}': Operation not permitted"));
            continue;
        }
        match ctx.stat(&abs) {
            None => {
                if !force {
                    errors.push(format!(
                        "rm: cannot remove '{target}': No such file or directory"
                    ));
                }
            }
            Some(stat) if stat.is_dir && !recursive => {
                errors.push(format!("rm: cannot remove '{target}': Is a directory"));
            }
            Some(_) => {
                if let Err(e) = ctx.fs_mut().remove(&abs) {
                    errors.push(format!("rm: cannot remove '{target}': {e}"));
                }
            }
        }
    }
    if errors.is_empty() {
        CommandResult::ok("")
    } else {
        CommandResult::with_code(errors.join("\n"), 1)
    }
}

fn mv(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.len() < 2 {
        return CommandResult::error("mv", "missing file operand");
    }
    let (src_arg, dest_arg) = (&args[0], &args[1]);
    let src = ctx.resolve(src_arg);
    let dest = ctx.resolve(dest_arg);

    if ctx.is_virtual(&src) || ctx.is_virtual(&dest) {
        return CommandResult::error("mv", "Operation not permitted");
    }
    let Some(src_stat) = ctx.stat(&src) else {
        return CommandResult::error(
            "mv",
            format!("cannot stat '{src_arg}': No such file or directory"),
        );
    };
    if src == dest {
        return CommandResult::ok("");
    }

    if let Some(dest_stat) = ctx.stat(&dest) {
        if dest_stat.is_dir {
            return match ctx.fs_mut().move_to_dir(&src, &dest) {
                Ok(()) => CommandResult::ok(""),
                Err(e) => CommandResult::error("mv", e),
            };
        }
        if src_stat.is_dir {
            return CommandResult::error(
                "mv",
                format!("cannot overwrite non-directory '{dest_arg}' with directory '{src_arg}'"),
            );
        }
        // Destination file is overwritten: delete, then move into place.
        if let Err(e) = ctx.fs_mut().remove(&dest) {
            return CommandResult::error("mv", e);
        }
    }

    let (dest_parent, dest_name) = split_parent(&dest);
    if ctx.stat(&dest_parent).map(|stat| stat.is_dir) != Some(true) {
        return CommandResult::error(
            "mv",
            format!("cannot move '{src_arg}' to '{dest_arg}': No such file or directory"),
        );
    }

    let (src_parent, src_name) = split_parent(&src);
    if src_parent != dest_parent {
        if let Err(e) = ctx.fs_mut().move_to_dir(&src, &dest_parent) {
            return CommandResult::error("mv", e);
        }
        if src_name != dest_name {
            let moved = if dest_parent == "/" {
                format!("/{src_name}")
            } else {
                format!("{dest_parent}/{src_name}")
            };
            if let Err(e) = ctx.fs_mut().rename(&moved, &dest_name) {
                return CommandResult::error("mv", e);
            }
        }
    } else if let Err(e) = ctx.fs_mut().rename(&src, &dest_name) {
        return CommandResult::error("mv", e);
    }
    CommandResult::ok("")
}

fn mount(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    // Running mount at all counts as poking at the devices.
    ctx.desk.curiosity_check();

    if args.is_empty() {
        let mut lines = Vec::new();
        for device in ctx.desk.devices.devices() {
            let Some(point) = device.mount_point.as_deref() else {
                continue;
            };
            if !device.mounted {
                continue;
            }
            let fstype = match device.kind.as_str() {
                "rom" => "iso9660",
                _ => "ext4",
            };
            let opts = if device.read_only { "ro" } else { "rw,relatime" };
            lines.push(format!(
                "/dev/{} on {} type {} ({})",
                device.name, point, fstype, opts
            ));
        }
        return CommandResult::ok(lines.join("\n"));
    }

    let dev_path = &args[0];
    let mount_point = args.get(1).map(|point| ctx.resolve(point));
    match ctx.desk.mount_device(dev_path, mount_point.as_deref()) {
        Ok(()) => CommandResult::ok(""),
        Err(message) => CommandResult::with_code(message, 1),
    }
}

fn lsblk(_args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    ctx.desk.curiosity_check();

    let mut lines = vec![format!(
        "{:<6} {:>7} {:>2} {:>7} {:>2} {:<5} {}",
        "NAME", "MAJ:MIN", "RM", "SIZE", "RO", "TYPE", "MOUNTPOINTS"
    )];
    for device in ctx.desk.devices.devices() {
        let mount_point = if device.mounted {
            device.mount_point.as_deref().unwrap_or("")
        } else {
            ""
        };
        lines.push(format!(
            "{:<6} {:>7} {:>2} {:>7} {:>2} {:<5} {}",
            device.name,
            device.maj_min,
            if device.removable { "1" } else { "0" },
            device.size,
            if device.read_only { "1" } else { "0" },
            device.kind.as_str(),
            mount_point,
        ));
    }
    CommandResult::ok(lines.join("\n"))
}

fn dmesg(_args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    ctx.desk.curiosity_check();

    let mut lines = vec![
        "[    0.000000] Linux version 6.1.0-winter (builder@frostbox) #1 SMP PREEMPT_DYNAMIC".to_string(),
        "[    0.412744] sd 0:0:0:0: [sda] Attached SCSI disk".to_string(),
    ];
    let probed = ctx
        .desk
        .devices
        .device(SR0)
        .map(|device| device.state != PuzzleState::Idle)
        .unwrap_or(false);
    if probed {
        lines.push("[    2.104311] sr 1:0:0:0: [sr0] CD-ROM detected, media present".to_string());
        lines.push("[    2.104562] sr0: unable to read TOC header: access denied".to_string());
    }
    CommandResult::ok(lines.join("\n"))
}

fn grep(args: &[String], stdin: &str, _ctx: &mut ShellContext) -> CommandResult {
    let ignore_case = args.iter().any(|arg| arg == "-i");
    let Some(pattern) = args.iter().find(|arg| !arg.starts_with('-')) else {
        return CommandResult::error("grep", "usage: grep [-i] pattern");
    };
    if stdin.is_empty() {
        return CommandResult::ok("");
    }
    let needle = if ignore_case {
        pattern.to_lowercase()
    } else {
        pattern.clone()
    };
    let matches: Vec<&str> = stdin
        .lines()
        .filter(|line| {
            if ignore_case {
                line.to_lowercase().contains(&needle)
            } else {
                line.contains(&needle)
            }
        })
        .collect();
    CommandResult::ok(matches.join("\n"))
}

fn clear(_args: &[String], _stdin: &str, _ctx: &mut ShellContext) -> CommandResult {
    CommandResult {
        output: String::new(),
        exit_code: 0,
        clear: true,
        interactive: None,
    }
}

fn echo(args: &[String], _stdin: &str, _ctx: &mut ShellContext) -> CommandResult {
    CommandResult::ok(args.join(" "))
}

fn help(_args: &[String], _stdin: &str, _ctx: &mut ShellContext) -> CommandResult {
    CommandResult::ok(
        "Winter.OS shell\n\
         \n\
         Filesystem:  ls cd pwd cat mkdir touch rm mv nano trash restore\n\
         Devices:     lsblk mount dmesg\n\
         Desktop:     desktop windows close <id>\n\
         Apps:        about files settings textedit trash\n\
         Misc:        echo grep base64 clear neofetch sudo help\n\
         \n\
         Commands can be piped: dmesg | grep -i cd",
    )
}

fn base64(args: &[String], stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let decode = args.iter().any(|arg| arg == "-d");
    let operand = args.iter().find(|arg| !arg.starts_with('-'));

    let input = match operand {
        Some(file) => {
            let abs = ctx.resolve(file);
            match ctx.stat(&abs) {
                None => {
                    return CommandResult::error(
                        "base64",
                        format!("{file}: No such file or directory"),
                    )
                }
                Some(stat) if stat.is_dir => {
                    return CommandResult::error("base64", format!("{file}: Is a directory"))
                }
                Some(_) => ctx.read(&abs).unwrap_or_default(),
            }
        }
        None => stdin.to_string(),
    };

    if decode {
        match base64_simd::STANDARD.decode_to_vec(input.trim().as_bytes()) {
            Ok(bytes) => CommandResult::ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(_) => CommandResult::error("base64", "invalid input"),
        }
    } else {
        CommandResult::ok(base64_simd::STANDARD.encode_to_string(input.as_bytes()))
    }
}

fn nano(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let Some(file) = args.first() else {
        return CommandResult::error("nano", "missing file operand");
    };
    let abs = ctx.resolve(file);
    if ctx.is_virtual(&abs) {
        return CommandResult::error("nano", format!("{file}: Operation not permitted"));
    }
    if ctx.stat(&abs).map(|stat| stat.is_dir) == Some(true) {
        return CommandResult::error("nano", format!("{file}: Is a directory"));
    }
    CommandResult {
        output: String::new(),
        exit_code: 0,
        clear: false,
        interactive: Some(Interactive::Nano { path: abs }),
    }
}

fn sudo(args: &[String], _stdin: &str, _ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::error("sudo", "usage: sudo <command>");
    }
    let line = match args.join(" ").as_str() {
        "rm -rf /" => "Nice try. The snow stays.",
        _ => "user is not in the sudoers file. This incident will be reported.",
    };
    CommandResult::with_code(line, 1)
}

fn neofetch(_args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let settings = &ctx.desk.settings;
    CommandResult::ok(format!(
        "      *       user@winteros\n\
        \x20    /_\\      -------------\n\
        \x20   /___\\     OS: Winter.OS 0.1\n\
        \x20  /_____\\    Kernel: 6.1.0-winter\n\
        \x20    |_|      Shell: wsh\n\
        \x20             WM: winter-wm\n\
        \x20             Theme: {} / {}",
        settings.wallpaper, settings.accent
    ))
}

fn windows(_args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let focused = ctx.desk.wm.focused_window_id().map(str::to_string);
    let mut lines = Vec::new();
    for window in ctx.desk.wm.windows() {
        let marker = if focused.as_deref() == Some(window.id.as_str()) {
            "*"
        } else if window.minimized {
            "-"
        } else {
            " "
        };
        lines.push(format!(
            "{marker} {:<18} {:<10} z={}",
            window.id, window.app_id, window.z_index
        ));
    }
    if lines.is_empty() {
        CommandResult::ok("(no open windows)")
    } else {
        CommandResult::ok(lines.join("\n"))
    }
}

fn close(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let Some(id) = args.first() else {
        return CommandResult::error("close", "missing window id");
    };
    if ctx.desk.wm.window(id).is_none() {
        return CommandResult::error("close", format!("no such window: {id}"));
    }
    ctx.desk.wm.close_window(id);
    CommandResult::ok("")
}

fn desktop(_args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let viewport = ctx.desk.wm.viewport();
    let nodes = icons::desktop_nodes(&ctx.desk.fs);
    let layout = icons::calculate_layout(viewport.width as i32, viewport.height as i32, &nodes);

    let mut lines = Vec::new();
    for node in &nodes {
        if let Some(position) = layout.get(&node.id) {
            lines.push(format!("{:>5},{:<5} {}", position.x, position.y, node.name));
        }
    }
    if lines.is_empty() {
        CommandResult::ok("(empty desktop)")
    } else {
        CommandResult::ok(lines.join("\n"))
    }
}

fn trash(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let Some(target) = args.first() else {
        // Bare `trash` behaves like the app launcher.
        ctx.desk.wm.open_window(
            "trash",
            "trash",
            "Trash",
            "delete",
            serde_json::Map::new(),
        );
        ctx.desk.session.bump_frequent("trash");
        return CommandResult::ok("Opening Trash...");
    };
    let abs = ctx.resolve(target);
    if ctx.is_virtual(&abs) {
        return CommandResult::error("trash", format!("{target}: Operation not permitted"));
    }
    match ctx.fs_mut().trash(&abs) {
        Ok(()) => CommandResult::ok(""),
        Err(_) => CommandResult::error(
            "trash",
            format!("{target}: No such file or directory"),
        ),
    }
}

fn restore(args: &[String], _stdin: &str, ctx: &mut ShellContext) -> CommandResult {
    let Some(name) = args.first() else {
        return CommandResult::error("restore", "missing operand");
    };
    let path = format!("/trash/{name}");
    match ctx.fs_mut().restore(&path) {
        Ok(()) => CommandResult::ok(""),
        Err(_) => CommandResult::error("restore", format!("{name}: not in trash")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execute;
    use std::sync::Arc;
    use winteros_core::devices::{DRAMATIC_DELAY_MS, README_WINDOW_ID};
    use winteros_core::{Desk, ManualClock};

    struct Term {
        desk: Desk,
        cwd: String,
        clock: Arc<ManualClock>,
    }

    impl Term {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(100_000));
            Self {
                desk: Desk::in_memory_with_clock(clock.clone()),
                cwd: "/home/user".to_string(),
                clock,
            }
        }

        fn run(&mut self, input: &str) -> CommandResult {
            let mut ctx = ShellContext::new(&mut self.cwd, &mut self.desk);
            let result = execute(input, &mut ctx);
            self.desk.device_watcher_tick();
            result
        }
    }

    #[test]
    fn test_ls_sorts_dirs_first_then_names() {
        let mut term = Term::new();
        term.run("touch alpha.txt");
        term.run("mkdir zebra");
        let result = term.run("ls");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "Desktop  Documents  Downloads  zebra  alpha.txt");
    }

    #[test]
    fn test_ls_hides_dotfiles_without_dash_a() {
        let mut term = Term::new();
        let plain = term.run("ls");
        assert!(!plain.output.contains(".secrets"));

        let all = term.run("ls -a");
        assert!(all.output.contains(".secrets"));
    }

    #[test]
    fn test_ls_on_file_prints_its_name() {
        let mut term = Term::new();
        let result = term.run("ls /etc/os.conf");
        assert_eq!(result.output, "os.conf");
    }

    #[test]
    fn test_ls_missing_target_fails() {
        let mut term = Term::new();
        let result = term.run("ls nope");
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("cannot access 'nope'"));
    }

    #[test]
    fn test_cd_updates_cwd_and_rejects_files() {
        let mut term = Term::new();
        assert_eq!(term.run("cd /etc").exit_code, 0);
        assert_eq!(term.run("pwd").output, "/etc");

        let err = term.run("cd os.conf");
        assert_eq!(err.exit_code, 1);
        assert!(err.output.contains("Not a directory"));

        assert_eq!(term.run("cd").exit_code, 0);
        assert_eq!(term.run("pwd").output, "/home/user");
    }

    #[test]
    fn test_cat_concatenates_with_newlines() {
        let mut term = Term::new();
        let mut ctx = ShellContext::new(&mut term.cwd, &mut term.desk);
        ctx.fs_mut().write("/home/user/a.txt", "one").unwrap();
        ctx.fs_mut().write("/home/user/b.txt", "two").unwrap();

        let result = term.run("cat a.txt b.txt");
        assert_eq!(result.output, "one\ntwo");

        let dir_err = term.run("cat Desktop");
        assert_eq!(dir_err.exit_code, 1);
        assert!(dir_err.output.contains("Is a directory"));
    }

    #[test]
    fn test_mkdir_reports_per_argument() {
        let mut term = Term::new();
        let result = term.run("mkdir fresh Desktop missing/parent");
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("'Desktop': File exists"));
        assert!(result.output.contains("'missing/parent': No such file or directory"));
        // The valid argument was still created.
        assert!(term.run("ls").output.contains("fresh"));
    }

    #[test]
    fn test_touch_creates_empty_file_and_is_idempotent() {
        let mut term = Term::new();
        assert_eq!(term.run("touch notes.txt").exit_code, 0);
        assert_eq!(term.run("cat notes.txt").output, "");
        assert_eq!(term.run("touch notes.txt").exit_code, 0);
    }

    #[test]
    fn test_rm_requires_recursive_for_directories() {
        let mut term = Term::new();
        term.run("mkdir stuff");
        term.run("touch stuff/keep.txt");

        let err = term.run("rm stuff");
        assert_eq!(err.exit_code, 1);
        assert!(err.output.contains("Is a directory"));
        // Untouched, contents included.
        assert_eq!(term.run("cat stuff/keep.txt").exit_code, 0);

        assert_eq!(term.run("rm -rf stuff").exit_code, 0);
        assert_eq!(term.run("ls stuff").exit_code, 1);
    }

    #[test]
    fn test_rm_force_ignores_missing() {
        let mut term = Term::new();
        assert_eq!(term.run("rm -f ghost.txt").exit_code, 0);
        assert_eq!(term.run("rm ghost.txt").exit_code, 1);
    }

    #[test]
    fn test_rm_refuses_virtual_paths() {
        let mut term = Term::new();
        let result = term.run("rm -rf /dev/sr0");
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("Operation not permitted"));
    }

    #[test]
    fn test_mv_into_directory_keeps_name() {
        let mut term = Term::new();
        term.run("touch letter.txt");
        assert_eq!(term.run("mv letter.txt Documents").exit_code, 0);
        assert!(term.run("ls Documents").output.contains("letter.txt"));
        assert!(!term.run("ls").output.contains("letter.txt"));
    }

    #[test]
    fn test_mv_renames_within_directory() {
        let mut term = Term::new();
        term.run("touch draft.txt");
        assert_eq!(term.run("mv draft.txt final.txt").exit_code, 0);
        assert!(term.run("ls").output.contains("final.txt"));
        assert!(!term.run("ls").output.contains("draft.txt"));
    }

    #[test]
    fn test_mv_overwrites_existing_file() {
        let mut term = Term::new();
        {
            let mut ctx = ShellContext::new(&mut term.cwd, &mut term.desk);
            ctx.fs_mut().write("/home/user/old.txt", "old").unwrap();
            ctx.fs_mut().write("/home/user/new.txt", "new").unwrap();
        }
        assert_eq!(term.run("mv new.txt old.txt").exit_code, 0);
        assert_eq!(term.run("cat old.txt").output, "new");
        assert!(!term.run("ls").output.contains("new.txt"));
    }

    #[test]
    fn test_mv_moves_and_renames_across_directories() {
        let mut term = Term::new();
        term.run("touch memo.txt");
        assert_eq!(term.run("mv memo.txt Documents/renamed.txt").exit_code, 0);
        assert!(term.run("ls Documents").output.contains("renamed.txt"));
    }

    #[test]
    fn test_grep_filters_and_ignores_case() {
        let mut term = Term::new();
        let result = term.run("dmesg | grep -i SCSI");
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("Attached SCSI disk"));

        let none = term.run("echo nothing | grep missing");
        assert_eq!(none.exit_code, 0);
        assert_eq!(none.output, "");

        let usage = term.run("grep");
        assert_eq!(usage.exit_code, 1);
    }

    #[test]
    fn test_base64_roundtrip_and_invalid_input() {
        let mut term = Term::new();
        let encoded = term.run("echo winter is coming | base64");
        assert_eq!(encoded.exit_code, 0);

        let decoded = term.run(&format!("echo {} | base64 -d", encoded.output));
        assert_eq!(decoded.output, "winter is coming");

        let invalid = term.run("echo @@@not-base64@@@ | base64 -d");
        assert_eq!(invalid.exit_code, 1);
        assert!(invalid.output.contains("invalid input"));
    }

    #[test]
    fn test_base64_reads_file_operand() {
        let mut term = Term::new();
        {
            let mut ctx = ShellContext::new(&mut term.cwd, &mut term.desk);
            ctx.fs_mut().write("/home/user/secret.txt", "hi").unwrap();
        }
        let result = term.run("base64 secret.txt");
        assert_eq!(result.output, "aGk=");
    }

    #[test]
    fn test_clear_sets_directive() {
        let mut term = Term::new();
        let result = term.run("clear");
        assert!(result.clear);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_nano_returns_interactive_directive() {
        let mut term = Term::new();
        let result = term.run("nano story.txt");
        assert_eq!(
            result.interactive,
            Some(Interactive::Nano {
                path: "/home/user/story.txt".to_string()
            })
        );

        let dir_err = term.run("nano Desktop");
        assert_eq!(dir_err.exit_code, 1);
        assert!(dir_err.output.contains("Is a directory"));
    }

    #[test]
    fn test_sudo_is_scripted() {
        let mut term = Term::new();
        let result = term.run("sudo rm -rf /");
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.output, "Nice try. The snow stays.");
        assert!(term.run("sudo make sandwich").output.contains("not in the sudoers file"));
    }

    #[test]
    fn test_windows_and_close() {
        let mut term = Term::new();
        assert_eq!(term.run("windows").output, "(no open windows)");

        term.run("settings");
        let listing = term.run("windows");
        assert!(listing.output.contains("settings"));

        assert_eq!(term.run("close settings").exit_code, 0);
        assert_eq!(term.run("windows").output, "(no open windows)");
        assert_eq!(term.run("close settings").exit_code, 1);
    }

    #[test]
    fn test_desktop_lists_icon_positions() {
        let mut term = Term::new();
        let result = term.run("desktop");
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("about.app"));
        assert!(result.output.contains("trash.app"));
    }

    #[test]
    fn test_trash_and_restore_roundtrip() {
        let mut term = Term::new();
        term.run("touch Documents/old-notes.txt");
        assert_eq!(term.run("trash Documents/old-notes.txt").exit_code, 0);
        assert!(term.run("ls /trash").output.contains("old-notes.txt"));

        assert_eq!(term.run("restore old-notes.txt").exit_code, 0);
        assert!(term.run("ls Documents").output.contains("old-notes.txt"));
    }

    #[test]
    fn test_ls_dev_through_overlay() {
        let mut term = Term::new();
        assert_eq!(term.run("ls /dev").output, "sda  sda1  sr0");
        assert_eq!(term.run("cd /dev").exit_code, 0);
        assert_eq!(term.run("ls").output, "sda  sda1  sr0");
    }

    #[test]
    fn test_lsblk_table_shape() {
        let mut term = Term::new();
        let result = term.run("lsblk");
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].contains("disk"));
        assert!(lines[2].contains('/'));
        assert!(lines[3].contains("rom"));
    }

    #[test]
    fn test_cdrom_puzzle_walkthrough_via_shell() {
        let mut term = Term::new();

        // First mount attempt always fails.
        let first = term.run("mount /dev/sr0 /mnt/cdrom");
        assert_eq!(first.exit_code, 1);
        assert!(first.output.contains("access denied"));

        // Poking at the device again is the curiosity trigger; the README
        // lands on the desktop after the dramatic pause.
        term.run("lsblk");
        assert!(!term.run("ls Desktop").output.contains("README.txt"));
        term.clock.advance(DRAMATIC_DELAY_MS);
        term.run("pwd"); // any command; the watcher runs after it
        assert!(term.run("ls Desktop").output.contains("README.txt"));
        assert!(term.run("cat Desktop/README.txt").output.contains("lsblk"));

        // Mounting mid-puzzle still fails.
        assert_eq!(term.run("mount /dev/sr0 /mnt/cdrom").exit_code, 1);

        // Closing the tracked window deletes the clue and arms the drive.
        assert_eq!(term.run(&format!("close {README_WINDOW_ID}")).exit_code, 0);
        assert!(!term.run("ls Desktop").output.contains("README.txt"));

        // Armed: the mount finally succeeds and the payload is served.
        assert_eq!(term.run("mount /dev/sr0 /mnt/cdrom").exit_code, 0);
        assert_eq!(term.run("ls /mnt/cdrom").output, "README.txt");
        assert!(term.run("cat /mnt/cdrom/README.txt").output.contains("secrets"));
        assert!(term.run("mount").output.contains("/dev/sr0 on /mnt/cdrom type iso9660 (ro)"));
    }

    #[test]
    fn test_mount_table_lists_root() {
        let mut term = Term::new();
        let result = term.run("mount");
        assert!(result.output.contains("/dev/sda1 on / type ext4 (rw,relatime)"));
    }
}
