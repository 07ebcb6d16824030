//! `wid`: drive a window with synthetic input from the command line.
//!
//! Binds to the first window whose title contains the given substring (or to
//! a process found by `--process`) and runs either a script file or a fixed
//! demonstration sequence of key and mouse batches.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use window_input_driver::events::{MouseButton, MouseEvent};
use window_input_driver::{
    keys, KeyEvent, ProcessFinder, Script, SystemSession, TimedBatch,
};

#[derive(Parser, Debug)]
#[command(name = "wid", version, about = "Send timed synthetic input to a window")]
struct Args {
    /// Substring to search window titles for
    #[arg(required_unless_present = "process")]
    title: Option<String>,

    /// Bind by process name instead of window title
    #[arg(long, conflicts_with = "title")]
    process: Option<String>,

    /// Run a JSON key script instead of the demonstration sequence
    #[arg(long)]
    script: Option<String>,

    /// Queue the sequence and drain it with tick() instead of blocking
    #[arg(long)]
    non_blocking: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("window_input_driver=debug,wid=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut session = SystemSession::system();

    let bound = if let Some(process) = &args.process {
        let pid = ProcessFinder::new()
            .find_pid(process)
            .with_context(|| format!("no running process matches '{process}'"))?;
        println!("{} process '{}' with pid {}", "Found".green(), process, pid);
        session.bind(pid)
    } else {
        let title = args.title.as_deref().unwrap_or_default();
        session.bind(title)
    };

    if !bound {
        bail!("unable to find a window to bind");
    }

    let identity = session
        .identity()
        .context("bound session has no identity")?
        .clone();
    println!(
        "{} '{}' (pid={}, tid={}, visible={})",
        "Bound".green().bold(),
        identity.title,
        identity.process_id,
        identity.thread_id,
        identity.is_visible
    );
    let dims = session.geometry();
    println!(
        "Window at ({}, {}), {}x{}",
        dims.top_left.0, dims.top_left.1, dims.width, dims.height
    );

    match &args.script {
        Some(path) => run_script(&mut session, path, args.non_blocking)?,
        None => run_demo(&mut session, args.non_blocking)?,
    }

    println!("{}", "Done".green().bold());
    Ok(())
}

fn run_script(session: &mut SystemSession, path: &str, non_blocking: bool) -> Result<()> {
    let script = Script::from_file(path)?;
    let batches = script.to_batches()?;
    println!("Running script '{}' ({} keys)", path.cyan(), batches.len());

    session.set_blocking(script.blocking && !non_blocking);
    session.execute_keys(batches, false);
    if !session.is_blocking() {
        drain(session);
    }
    Ok(())
}

/// The fixed demonstration sequence: type "hello there", press enter, then
/// run a short right-click / move / left-click mouse pattern.
fn run_demo(session: &mut SystemSession, non_blocking: bool) -> Result<()> {
    let mut key_batches: Vec<TimedBatch<KeyEvent>> = Vec::new();
    for c in "hello there".chars() {
        let name = if c == ' ' { "space".to_string() } else { c.to_string() };
        let key = keys::lookup(&name)?;
        key_batches.push(TimedBatch::single(key.typed(), Duration::from_millis(250)));
    }
    key_batches.push(TimedBatch::single(
        KeyEvent::typed(keys::vk::RETURN),
        Duration::ZERO,
    ));

    if non_blocking {
        println!("Sending keys (non-blocking, tick-polled)...");
        session.set_blocking(false);
        session.execute_keys(key_batches, false);
        drain(session);
    } else {
        println!("Sending keys (blocking)...");
        session.set_blocking(true);
        session.execute_keys(key_batches, false);
    }

    println!("Sending mouse events (blocking)...");
    let delay = Duration::from_millis(300);
    let mouse_batches = vec![
        TimedBatch::single(MouseEvent::click(MouseButton::Right), delay),
        TimedBatch::single(MouseEvent::move_by(20, 90), delay),
        TimedBatch::single(MouseEvent::click(MouseButton::Left), delay),
        TimedBatch::single(MouseEvent::click(MouseButton::Right), delay),
        TimedBatch::single(MouseEvent::move_by(20, 70), delay),
        TimedBatch::single(MouseEvent::click(MouseButton::Left), delay),
    ];
    session.set_blocking(true);
    session.execute_mouse(mouse_batches, false);
    Ok(())
}

fn drain(session: &mut SystemSession) {
    while session.has_events_in_queue() {
        session.tick();
        std::thread::sleep(Duration::from_millis(10));
    }
}
