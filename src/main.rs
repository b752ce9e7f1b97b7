use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use winteros_core::Desk;

mod repl;

/// Winter.OS - a simulated desktop operating system for your terminal
#[derive(Parser)]
#[command(name = "winteros", author, version, about, long_about = None)]
struct Cli {
    /// Print verbose logs
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the persisted desktop state
    #[arg(long, default_value = ".winteros")]
    state_dir: PathBuf,

    /// Desktop viewport, e.g. 1280x800
    #[arg(long, default_value = "1280x800")]
    viewport: String,

    /// Run a command non-interactively (repeatable), then exit
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Discard persisted state and boot a fresh desktop
    #[arg(long)]
    reset: bool,
}

fn parse_viewport(raw: &str) -> anyhow::Result<(u32, u32)> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("viewport must look like 1280x800, got '{raw}'"))?;
    Ok((width.trim().parse()?, height.trim().parse()?))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let (width, height) = parse_viewport(&cli.viewport)?;

    if cli.reset && cli.state_dir.exists() {
        std::fs::remove_dir_all(&cli.state_dir)?;
    }

    let mut desk = Desk::builder()
        .state_dir(&cli.state_dir)
        .viewport(width, height)
        .build()?;

    if !cli.commands.is_empty() {
        return repl::run_batch(&mut desk, &cli.commands);
    }
    repl::run(&mut desk)
}
