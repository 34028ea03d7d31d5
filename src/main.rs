use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gemini_relay::client::{ChatDraft, ChatForm, FormState};
use gemini_relay::config::{load_config, LogFormat, ObservabilityConfig};
use gemini_relay::page::AssetMode;
use gemini_relay::relay::{KeyRing, RelayEngine, RelayHandler};
use gemini_relay::routes::create_router;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay server (default)
    Serve(ServeArgs),
    /// Send one prompt to a running relay
    Ask(AskArgs),
}

#[derive(clap::Args, Debug, Default)]
struct ServeArgs {
    /// Server bind address, overrides host and port
    #[arg(short, long)]
    bind: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct AskArgs {
    /// Gemini model name, e.g. gemini-2.5-flash-lite
    #[arg(short, long)]
    model: String,

    /// Message to send
    #[arg(short = 'M', long)]
    message: String,

    /// Use the paid API key if the relay has one
    #[arg(long)]
    paid: bool,

    /// Base URL of the relay
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:3000")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(serve_args) => serve(serve_args).await,
        Command::Ask(ask_args) => ask(ask_args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    // Load configuration
    let (config, credentials) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config.observability)?;

    info!("Starting GeminiRelay server...");
    info!(
        "Paid API key {}",
        if credentials.has_paid() { "configured" } else { "not configured" }
    );

    // Determine bind address
    let bind_addr = args.bind.unwrap_or_else(|| config.server.bind_addr());

    // Initialize components
    let keys = KeyRing::from_credentials(&credentials, &config.upstream)
        .context("Failed to create upstream clients")?;
    let engine = Arc::new(RelayEngine::new(keys));
    let assets = if config.server.production {
        AssetMode::Directory(config.server.static_dir.clone())
    } else {
        AssetMode::Embedded
    };
    info!("Serving client assets: {:?}", assets);
    let handler = Arc::new(RelayHandler::new(engine, assets));

    let app = create_router(handler, config.server.request_body_limit_bytes);

    // Start server
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server is running on http://{}/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_duration()))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn ask(args: AskArgs) -> Result<()> {
    init_tracing(&ObservabilityConfig {
        tracing_level: "warn".to_string(),
        log_format: LogFormat::Pretty,
    })?;

    let mut form = ChatForm::connect(args.url).await;
    if args.paid && !form.paid_key_available() {
        eprintln!("The relay has no paid API key; using the free key.");
    }

    let draft = ChatDraft::new(args.model, args.message, args.paid);
    if !draft.is_submittable() {
        anyhow::bail!("model and message must not be blank");
    }

    match form.submit(&draft).await {
        FormState::Succeeded { reply, latency } => {
            println!("{}", reply);
            eprintln!("Response time: {:.2} ms", latency.as_secs_f64() * 1000.0);
            Ok(())
        }
        FormState::Failed { message } => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
        state => anyhow::bail!("Unexpected form state: {:?}", state),
    }
}

fn init_tracing(observability: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "gemini_relay={level},tower_http={level}",
            level = observability.tracing_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match observability.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
    }
    .context("Failed to initialize tracing")?;

    Ok(())
}

async fn shutdown_signal(grace_period: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    if grace_period > Duration::ZERO {
        info!("Waiting {}s for ongoing requests to complete...", grace_period.as_secs());
        tokio::time::sleep(grace_period).await;
    }
}
