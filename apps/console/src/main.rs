use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    render::dashboard_markup, render_dashboard, HttpEntryApi, SyncController,
};
use shared::domain::SortOrder;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod view;

use commands::{parse_command, spawn_command_worker, ConsoleCommand, QueuedCommand, HELP};
use config::{load_settings, Settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "logbook", about = "Keeps a terminal view of a remote log-entry store in sync")]
struct Args {
    /// Base url of the entry service.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Seconds between scheduled refreshes.
    #[arg(long)]
    poll_secs: Option<u64>,
    #[arg(long)]
    sort: Option<SortOrder>,
    /// Discard list responses that resolve after a newer one was applied.
    #[arg(long)]
    strict_ordering: bool,
    /// Also write the rendered dashboard markup to this file on every change.
    #[arg(long)]
    html_out: Option<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = self.poll_secs {
            settings.poll_interval_secs = v;
        }
        if let Some(v) = self.sort {
            settings.sort_order = v;
        }
        if self.strict_ordering {
            settings.strict_refresh_ordering = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    args.apply(&mut settings);
    info!(
        server_url = %settings.server_url,
        poll_secs = settings.poll_interval_secs,
        sort = %settings.sort_order,
        strict = settings.strict_refresh_ordering,
        "starting logbook"
    );

    let api = HttpEntryApi::with_timeout(&settings.server_url, settings.request_timeout())
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    info!(base_url = %api.base_url(), "entry service endpoint");
    let controller = Arc::new(SyncController::new(
        Arc::new(api),
        settings.controller_options(),
    ));

    let mut changes = controller.store().subscribe();
    let mut notices = controller.coordinator().subscribe_notices();
    let poller = controller.start_polling();
    let (commands, mut statuses) = spawn_command_worker(controller.clone());

    let mut dashboard = render_dashboard(&changes.borrow_and_update());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let cmd = match parse_command(&line) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => continue,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                match cmd {
                    ConsoleCommand::Quit => break,
                    ConsoleCommand::Help => println!("{HELP}"),
                    ConsoleCommand::Show => print!("{}", view::format_dashboard(&dashboard)),
                    cmd => {
                        let queued = QueuedCommand { cmd, view: dashboard.view.clone() };
                        if commands.send(queued).is_err() {
                            warn!("command worker is gone");
                            break;
                        }
                    }
                }
            }
            status = statuses.recv() => match status {
                Some(status) => println!("{status}"),
                None => break,
            },
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                dashboard = render_dashboard(&changes.borrow_and_update());
                print!("{}", view::format_dashboard(&dashboard));
                if let Some(path) = &args.html_out {
                    if let Err(err) = tokio::fs::write(path, dashboard_markup(&dashboard)).await {
                        warn!(path = %path.display(), error = %err, "failed to write dashboard markup");
                    }
                }
            }
            notice = notices.recv() => match notice {
                Ok(notice) => println!("{}", view::format_notice(&notice)),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped notices"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    drop(commands);
    poller.stop().await;
    info!("logbook stopped");
    Ok(())
}
