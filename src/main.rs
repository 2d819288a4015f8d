mod alert;
mod cli;
mod config;
mod error;
mod flink;
mod logging;
mod monitor;
mod reconciler;
mod remediation;
mod scheduler;
mod store;
mod ui;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use alert::Notifier;
use cli::{Cli, Command};
use config::WatchConfig;
use error::WatchError;
use flink::FlinkClient;
use monitor::{CycleReport, JobMonitor};
use reconciler::JobStatus;
use remediation::{NoRestart, Restarter, SqlClientRestarter};
use scheduler::IntervalTicker;
use store::{JsonFileStore, MemoryStore, StatusStore};
use ui::StatusTable;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = WatchConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    let _log_guard = logging::init(cli.verbose, config.log_dir.as_deref())?;

    match cli.command {
        Command::Watch => {
            config.validate()?;
            watch(&config).await?;
        }
        Command::Check { dry_run } => {
            config.validate()?;
            let (report, records) = check(&config, dry_run).await?;
            let table = StatusTable::default();
            table.print(&records);
            table.print_report(&report);
        }
        Command::Status => {
            let store = JsonFileStore::new(&config.status_file);
            StatusTable::default().print(&store.all().map_err(WatchError::from)?);
        }
    }
    Ok(())
}

fn build_monitor<S: StatusStore, R: Restarter>(
    config: &WatchConfig,
    control: FlinkClient,
    notifier: Notifier,
    store: S,
    restarter: R,
) -> JobMonitor<FlinkClient, Notifier, S, R> {
    JobMonitor::new(
        control,
        notifier,
        store,
        restarter,
        config.jobs.clone(),
        config.failure_threshold,
    )
}

async fn watch(config: &WatchConfig) -> Result<(), WatchError> {
    let control = FlinkClient::new(&config.flink_rest_url, config.request_timeout())?;
    let notifier = Notifier::from_url(&config.webhook_url)?;
    let store = JsonFileStore::new(&config.status_file);

    tracing::info!(
        flink = %control.base_url(),
        jobs = config.jobs.len(),
        interval_secs = config.check_interval_secs,
        threshold = config.failure_threshold,
        status_file = %store.path().display(),
        restart = config.restart.is_some(),
        "starting Flink job watcher"
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current cycle");
            interrupt.cancel();
        }
    });

    let mut ticker = IntervalTicker::new(config.check_interval());
    match &config.restart {
        Some(restart) => {
            let restarter = SqlClientRestarter::new(control.clone(), restart.clone());
            let mut monitor = build_monitor(config, control, notifier, store, restarter);
            scheduler::run(&mut monitor, &mut ticker, &cancel).await;
        }
        None => {
            let mut monitor = build_monitor(config, control, notifier, store, NoRestart);
            scheduler::run(&mut monitor, &mut ticker, &cancel).await;
        }
    }
    Ok(())
}

async fn poll_once<S: StatusStore, R: Restarter>(
    mut monitor: JobMonitor<FlinkClient, Notifier, S, R>,
) -> Result<(CycleReport, Vec<(String, JobStatus)>), WatchError> {
    let report = monitor.poll().await;
    let records = monitor.store().all()?;
    Ok((report, records))
}

async fn check(
    config: &WatchConfig,
    dry_run: bool,
) -> Result<(CycleReport, Vec<(String, JobStatus)>), WatchError> {
    let control = FlinkClient::new(&config.flink_rest_url, config.request_timeout())?;
    let store = JsonFileStore::new(&config.status_file);

    if dry_run {
        let memory: MemoryStore = store.all()?.into_iter().collect();
        let monitor = build_monitor(config, control, Notifier::LogOnly, memory, NoRestart);
        return poll_once(monitor).await;
    }

    let notifier = Notifier::from_url(&config.webhook_url)?;
    match &config.restart {
        Some(restart) => {
            let restarter = SqlClientRestarter::new(control.clone(), restart.clone());
            poll_once(build_monitor(config, control, notifier, store, restarter)).await
        }
        None => poll_once(build_monitor(config, control, notifier, store, NoRestart)).await,
    }
}
