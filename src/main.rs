mod api;
mod cli;
mod config;
mod error;
mod session;
mod store;
mod sync;
mod ui;
mod wizard;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::Style;

use crate::api::{ApiClient, QueueApi};
use crate::cli::{Cli, Command};
use crate::config::PipedeckConfig;
use crate::error::PipedeckError;
use crate::session::Session;
use crate::store::{JobAction, JobStore, StoreError};
use crate::sync::PollingSync;
use crate::ui::{QueueView, WatchProgress};
use crate::wizard::{FileDraftStore, ProjectDefinition, STEPS, Wizard};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", Style::new().red().bold().apply_to("error:"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), PipedeckError> {
    let config = PipedeckConfig::load().map_err(|e| PipedeckError::Config(e.to_string()))?;
    let session = Arc::new(Session::new());
    if !config.api_token.is_empty() {
        session.init(config.api_token.clone());
    }
    if !session.is_authenticated() {
        log::warn!("no API token configured; set PIPEDECK_API_TOKEN or api_token in pipedeck.toml");
    }

    let api = Arc::new(ApiClient::new(config.api_url.clone(), Arc::clone(&session)));
    let interval = Duration::from_millis(cli.interval.unwrap_or(config.poll_interval_ms));
    // a contradicted optimistic mutation survives at most one poll interval
    let store = Arc::new(JobStore::new(interval));

    match cli.command {
        Command::Status => status(api.as_ref(), &store).await,
        Command::Watch => watch(api, store, session, interval, &config).await,
        Command::Show { id } => show(api.as_ref(), &store, &id).await,
        Command::Retry { id } => mutate(api.as_ref(), &store, &id, JobAction::Retry).await,
        Command::Delete { id } => mutate(api.as_ref(), &store, &id, JobAction::Delete).await,
        Command::Create { file, back } => create(api.as_ref(), &store, &config, file, back).await,
        Command::Cancel => cancel(&config),
    }
}

async fn status(api: &ApiClient, store: &JobStore) -> Result<(), PipedeckError> {
    let snapshot = api.fetch_queue().await?;
    store.reconcile(snapshot);
    QueueView::new().render(&store.jobs());
    Ok(())
}

async fn show(api: &ApiClient, store: &JobStore, id: &str) -> Result<(), PipedeckError> {
    let snapshot = api.fetch_queue().await?;
    store.reconcile(snapshot);
    let view = QueueView::new();
    match store.get(id) {
        Some(job) => view.render_detail(&job, store.pending_on(id)),
        None => {
            // jobs drop off the queue listing once fully published
            let job = api.get_video(id).await?;
            view.render_detail(&job, None);
        }
    }
    Ok(())
}

async fn mutate(
    api: &ApiClient,
    store: &JobStore,
    id: &str,
    action: JobAction,
) -> Result<(), PipedeckError> {
    let snapshot = api.fetch_queue().await?;
    store.reconcile(snapshot);
    match store.mutate(api, id, action).await {
        Ok(()) => {
            println!("{action} confirmed for job {id}");
            Ok(())
        }
        Err(StoreError::NotFound(id)) => Err(PipedeckError::JobNotFound(id)),
        Err(e) => Err(e.into()),
    }
}

async fn watch(
    api: Arc<ApiClient>,
    store: Arc<JobStore>,
    session: Arc<Session>,
    interval: Duration,
    config: &PipedeckConfig,
) -> Result<(), PipedeckError> {
    let sync = Arc::new(PollingSync::new(
        Arc::clone(&api) as Arc<dyn QueueApi>,
        Arc::clone(&store),
        Duration::from_millis(config.backoff_ceiling_ms),
    ));

    let spinner = WatchProgress::start("loading queue...");
    sync.start(interval);
    sync.force_refresh().await;
    spinner.finish();

    let view = QueueView::new();
    let dim = Style::new().dim();
    view.render(&store.jobs());

    let mut jobs_rx = store.subscribe();
    let mut anomaly_rx = store.anomalies();
    let mut auth_rx = session.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Ok(()) = jobs_rx.changed() => {
                let jobs = jobs_rx.borrow_and_update().clone();
                println!();
                view.render(&jobs);
                println!(
                    "{}",
                    dim.apply_to(format!("next refresh in {:?}", sync.current_delay()))
                );
            }
            Ok(anomaly) = anomaly_rx.recv() => view.render_anomaly(&anomaly),
            Ok(()) = auth_rx.changed() => {
                if !*auth_rx.borrow_and_update() {
                    eprintln!("session expired, signed out");
                    break;
                }
            }
        }
    }

    sync.stop();
    Ok(())
}

async fn create(
    api: &ApiClient,
    store: &JobStore,
    config: &PipedeckConfig,
    file: Option<String>,
    back: bool,
) -> Result<(), PipedeckError> {
    let drafts = FileDraftStore::new(&config.draft_path);
    let mut wizard = Wizard::resume_or_new(drafts);
    if back {
        wizard.back();
    }

    let Some(path) = file else {
        let session = wizard.session();
        println!(
            "draft {} at step {}/{} ({})",
            session.id,
            session.current_index + 1,
            STEPS.len(),
            session.current_step()
        );
        for step in STEPS {
            let mark = if session.data_for(step).is_some() { "✓" } else { "·" };
            println!("  {mark} {step}");
        }
        println!("provide --file <project.toml> to fill the remaining steps");
        return Ok(());
    };

    let contents = std::fs::read_to_string(&path)?;
    let definition: ProjectDefinition = toml::from_str(&contents)?;
    for form in definition.forms() {
        if form.step().index() < wizard.session().current_index {
            // validated in a previous run, the draft keeps it
            continue;
        }
        wizard.advance(form)?;
    }

    let job = wizard.submit(api).await?;
    store.insert_optimistic(job.clone());
    println!("project created: job {} ({})", job.id, job.status);
    Ok(())
}

fn cancel(config: &PipedeckConfig) -> Result<(), PipedeckError> {
    // no need to load the draft just to discard it
    Wizard::new(FileDraftStore::new(&config.draft_path)).cancel()?;
    println!("wizard draft discarded");
    Ok(())
}
