use anyhow::{Context, Result};
use clap::Parser;
use evstat::cli::{Cli, Command, OutputFormat};
use evstat::{actions, clicks, event, frame_gaps, json_output, session};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    match args.command {
        Command::Actions { events } => {
            let log = event::load_events(&events)
                .with_context(|| format!("loading {}", events.display()))?;
            let report = actions::tally(&log);
            match args.format {
                OutputFormat::Text => report.print_text(),
                OutputFormat::Json => json_output::print_json("evstat-actions-v1", &report)?,
            }
        }

        Command::FrameGaps {
            events,
            fps,
            min_actions,
        } => {
            anyhow::ensure!(fps > 0.0, "--fps must be positive, got {fps}");
            let log = event::load_events(&events)
                .with_context(|| format!("loading {}", events.display()))?;
            let report = frame_gaps::analyze(&log, fps, min_actions);
            match args.format {
                OutputFormat::Text => report.print_text(),
                OutputFormat::Json => json_output::print_json("evstat-frame-gaps-v1", &report)?,
            }
        }

        Command::Clicks { events, fps } => {
            anyhow::ensure!(fps > 0.0, "--fps must be positive, got {fps}");
            let log = event::load_events(&events)
                .with_context(|| format!("loading {}", events.display()))?;
            let report = clicks::analyze(&log, fps);
            match args.format {
                OutputFormat::Text => report.print_text(),
                OutputFormat::Json => json_output::print_json("evstat-clicks-v1", &report)?,
            }
        }

        Command::Session {
            dirs,
            gap_ms,
            drift_threshold,
        } => {
            let opts = session::SessionOptions {
                gap_ms,
                drift_threshold,
            };
            let run = session::analyze_all(&dirs, &opts);
            match args.format {
                OutputFormat::Text => run.print_text(),
                OutputFormat::Json => json_output::print_json("evstat-session-v1", &run)?,
            }
            if run.all_failed() {
                anyhow::bail!("no session could be analyzed");
            }
        }
    }

    Ok(())
}
