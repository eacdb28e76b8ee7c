//! CLI entrypoint for Agent Relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use relay_application::{
    AgentCatalog, AgentSelector, Dispatcher, FireJobUseCase, NoveltyPipeline, PollDueJobs,
    RouteOptions, RouteTaskUseCase,
};
use relay_domain::{DispatchResult, Identity, JobId, StreamEvent, TaskRequest};
use relay_infrastructure::bootstrap;
use relay_infrastructure::{ConfigLoader, FileConfig, InMemoryStore, OpenAiClient, OpenAiSettings};
use relay_presentation::{Cli, Command, ConsoleFormatter, OutputFormat, ServerState};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Fully wired application graph.
struct Relay {
    catalog: Arc<AgentCatalog>,
    router: Arc<RouteTaskUseCase>,
    store: Arc<InMemoryStore>,
    fire: Arc<FireJobUseCase>,
    poller: Arc<PollDueJobs>,
}

impl Relay {
    async fn build(config: &FileConfig) -> Result<Self> {
        let relay_config = config.to_relay_config();

        let client = OpenAiClient::new(OpenAiSettings::from_config(&config.provider))
            .context("Failed to build provider client")?;
        if !client.has_api_key() {
            warn!(env = %config.provider.api_key_env, "No provider API key configured");
        }

        let logger = bootstrap::build_conversation_logger(config);

        let catalog = Arc::new(bootstrap::build_catalog(config, &client));
        let classifier = bootstrap::build_classifier(config, &client);
        let selector = Arc::new(
            AgentSelector::new(catalog.clone(), classifier, relay_config.selection().clone())
                .with_conversation_logger(logger.clone()),
        );
        let dispatcher = Dispatcher::new(relay_config.dispatch().clone())
            .with_conversation_logger(logger.clone());
        let router = Arc::new(RouteTaskUseCase::new(catalog.clone(), selector, dispatcher));

        let store = Arc::new(InMemoryStore::new());
        let seeded = bootstrap::seed_jobs(config, store.as_ref(), Utc::now()).await?;
        info!(jobs = seeded, agents = catalog.registered().len(), "Relay initialized");

        let (policy, _) = config.novelty.parse_policy();
        let novelty = NoveltyPipeline::new(
            store.clone(),
            store.clone(),
            policy,
            relay_config.novelty().clone(),
        )
        .with_conversation_logger(logger);
        let fire = Arc::new(FireJobUseCase::new(
            store.clone(),
            store.clone(),
            novelty,
            router.clone(),
            relay_config.fire().clone(),
        ));
        let poller = Arc::new(PollDueJobs::new(store.clone(), fire.clone()));

        Ok(Self {
            catalog,
            router,
            store,
            fire,
            poller,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&issues));
    }
    if FileConfig::has_errors(&issues) {
        bail!("Configuration has errors; fix them and retry");
    }

    info!("Starting Agent Relay");

    // === Dependency Injection ===
    let relay = Relay::build(&config).await?;

    match command {
        Command::Serve { bind, no_poll } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            serve(&relay, &config, &bind, !no_poll).await
        }
        Command::Ask {
            task,
            identity,
            agents,
            stream,
            output,
        } => {
            let mut request = TaskRequest::new(task)?.with_preferred_agents(agents);
            if let Some(identity) = identity {
                request = request.with_identity(Identity::new(identity));
            }
            ask(&relay, &request, stream, output).await
        }
        Command::Agents { identity } => {
            let identity = identity.map(Identity::new);
            let agents = relay.catalog.available_for(identity.as_ref()).await;
            print!("{}", ConsoleFormatter::format_agents(&agents));
            Ok(())
        }
        Command::Poll { once } => {
            if once {
                let report = relay.poller.poll_once(Utc::now()).await?;
                println!("{}", ConsoleFormatter::format_poll(&report));
                return Ok(());
            }
            tokio::select! {
                _ = poll_loop(relay.poller.clone(), config.scheduler.poll_interval()) => {}
                _ = tokio::signal::ctrl_c() => info!("Interrupted; stopping poller"),
            }
            Ok(())
        }
        Command::Fire { job_id } => {
            let outcome = relay.fire.fire_now(&JobId::new(job_id.clone()), Utc::now()).await?;
            print!("{}", ConsoleFormatter::format_fire(&job_id, &outcome));
            Ok(())
        }
    }
}

async fn ask(relay: &Relay, task: &TaskRequest, stream: bool, output: OutputFormat) -> Result<()> {
    let result = if stream && output != OutputFormat::Json {
        let mut events = relay.router.start(task, RouteOptions::default()).await;
        let mut streamed = false;
        let mut stdout = std::io::stdout();
        let mut terminal = None;

        while let Some(event) = events.next().await {
            if let StreamEvent::ContentDelta { .. } = &event {
                streamed = true;
            }
            if let Some(rendered) = ConsoleFormatter::format_event(&event) {
                write!(stdout, "{}", rendered)?;
                stdout.flush()?;
            }
            if let Some(result) = event.into_result() {
                terminal = Some(result);
                break;
            }
        }
        let result = terminal.unwrap_or_else(|| DispatchResult::Failed {
            error: "dispatch ended without a result".to_string(),
        });

        if streamed && let DispatchResult::Done(done) = &result {
            println!();
            if output == OutputFormat::Full {
                println!();
                print!("{}", ConsoleFormatter::format_footer(done));
            }
            return Ok(());
        }
        result
    } else {
        relay.router.execute(task, RouteOptions::default()).await
    };

    let rendered = match output {
        OutputFormat::Full => ConsoleFormatter::format(&result),
        OutputFormat::Text => ConsoleFormatter::format_text(&result),
        OutputFormat::Json => ConsoleFormatter::format_json(&result),
    };
    print!("{}", rendered);
    if output == OutputFormat::Json {
        println!();
    }

    if let DispatchResult::Failed { error } = result {
        bail!("Dispatch failed: {}", error);
    }
    Ok(())
}

async fn serve(relay: &Relay, config: &FileConfig, bind: &str, poll: bool) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    let state = ServerState::new(relay.router.clone())
        .with_jobs(relay.store.clone(), relay.fire.clone())
        .with_keep_alive(Duration::from_secs(config.server.keep_alive_secs));

    let poller = poll.then(|| {
        tokio::spawn(poll_loop(
            relay.poller.clone(),
            config.scheduler.poll_interval(),
        ))
    });

    relay_presentation::serve(listener, Arc::new(state), async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    })
    .await?;

    if let Some(poller) = poller {
        poller.abort();
    }
    Ok(())
}

/// Fire due jobs every `period` until the task is dropped.
async fn poll_loop(poller: Arc<PollDueJobs>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = period.as_secs(), "Job poller started");

    loop {
        ticker.tick().await;
        match poller.poll_once(Utc::now()).await {
            Ok(report) if report.due > 0 => {
                info!("Poll cycle: {}", ConsoleFormatter::format_poll(&report))
            }
            Ok(_) => debug!("No jobs due"),
            Err(e) => warn!(error = %e, "Poll cycle failed"),
        }
    }
}
