//! # iterscope - Main Entry Point
//!
//! - **Replay** (`replay SESSION`): feed a recorded timeline through the
//!   event loop, then report or print the tree view
//! - **Report** (`report SAVED`): report iterations saved by an earlier replay
//! - **Frame** (`frame SESSION N`): report a single recorded frame

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use log::{info, warn};

use iterscope::cli::{Args, Command};
use iterscope::config::Settings;
use iterscope::context::ProfilerContext;
use iterscope::domain::{ExportError, FrameIndex};
use iterscope::host::{run_event_loop, HostEvent};
use iterscope::iteration::IterationRegistry;
use iterscope::profiling::{RecordedSession, ReplayStep};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

/// Command-line misuse not caught by clap.
#[derive(Debug, thiserror::Error)]
enum UsageError {
    #[error(
        "Missing command\n\n\
         Usage:\n  \
         iterscope replay <SESSION>\n  \
         iterscope report <SAVED>\n  \
         iterscope frame <SESSION> <FRAME>"
    )]
    MissingCommand,
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let usage = err.chain().any(|cause| {
        cause.is::<UsageError>()
            || matches!(cause.downcast_ref::<ExportError>(), Some(ExportError::UnknownFormat(_)))
    });
    if usage {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.deep_profile |= args.deep;
    settings.user_code_only |= args.user_code;
    settings.flatten |= args.flatten;
    Ok(settings)
}

fn run() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args)?;

    if args.list_formats {
        let ctx = ProfilerContext::new(settings)?;
        for name in ctx.reporters().names() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(command) = &args.command else {
        return Err(UsageError::MissingCommand.into());
    };

    match command {
        Command::Replay { session, save, tree } => {
            let recorded = RecordedSession::from_file(session)
                .with_context(|| format!("Failed to read session {}", session.display()))?;
            if settings.product_name.is_empty() {
                settings.product_name = recorded.product_name.clone().unwrap_or_default();
            }
            let (source, steps) = recorded.into_replay().context("Invalid recorded session")?;

            let mut ctx = ProfilerContext::new(settings)?;
            let (tx, rx) = bounded(1000);
            let producer = std::thread::spawn(move || {
                for step in steps {
                    let event = match step {
                        ReplayStep::Lifecycle { time, event } => {
                            HostEvent::Lifecycle { event, timestamp: Some(time) }
                        }
                        ReplayStep::FrameRecorded(frame) => HostEvent::FrameRecorded(frame),
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            });
            let stats = run_event_loop(&mut ctx, &source, &rx);
            if producer.join().is_err() {
                warn!("Replay producer thread panicked, the replay may be incomplete");
            }

            if !args.quiet {
                eprintln!(
                    "replayed: {} lifecycle event(s), {} frame(s), {} import(s)",
                    stats.lifecycle_events, stats.frames, stats.imports
                );
            }

            if let Some(path) = save {
                ctx.save_session(path)
                    .with_context(|| format!("Failed to save iterations to {}", path.display()))?;
                if !args.quiet {
                    eprintln!("saved: {}", path.display());
                }
            }

            if *tree {
                print_tree(&ctx);
                return Ok(());
            }
            emit(&args, &ctx, ctx.registry())
        }
        Command::Report { saved } => {
            let mut ctx = ProfilerContext::new(settings)?;
            ctx.load_session(saved)
                .with_context(|| format!("Failed to load iterations from {}", saved.display()))?;
            emit(&args, &ctx, ctx.registry())
        }
        Command::Frame { session, frame } => {
            let recorded = RecordedSession::from_file(session)
                .with_context(|| format!("Failed to read session {}", session.display()))?;
            if settings.product_name.is_empty() {
                settings.product_name = recorded.product_name.clone().unwrap_or_default();
            }
            let (source, _) = recorded.into_replay().context("Invalid recorded session")?;

            let ctx = ProfilerContext::new(settings)?;
            let captured = ctx
                .capture_frame(&source, FrameIndex(*frame))
                .with_context(|| format!("Frame {frame} has no valid data"))?;
            emit(&args, &ctx, &captured)
        }
    }
}

/// Write the report to `--output`, or stdout without one.
fn emit(args: &Args, ctx: &ProfilerContext, registry: &IterationRegistry) -> Result<()> {
    let Some(path) = &args.output else {
        print!("{}", ctx.report_registry(&args.format, registry)?);
        return Ok(());
    };

    let written = ctx
        .export_registry(&args.format, registry, path)
        .with_context(|| format!("Failed to export {}", path.display()))?;
    if written && !args.quiet {
        eprintln!("saved: {}", path.display());
    }
    info!("{} report for {} iteration(s)", args.format, registry.len());
    Ok(())
}

fn print_tree(ctx: &ProfilerContext) {
    for row in ctx.view_rows() {
        let indent = "  ".repeat(row.depth);
        if row.details.is_empty() {
            println!("{indent}{} ({:.3} ms)", row.name, row.duration);
        } else {
            println!("{indent}{} ({:.3} ms; {})", row.name, row.duration, row.details);
        }
    }
}
