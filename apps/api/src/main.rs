mod cli;
mod config;
mod errors;
mod extraction;
mod matching;
mod routes;
mod similarity;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{render_report, Cli, Commands};
use crate::config::Config;
use crate::matching::engine::MatchEngine;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging. Logs go to stderr so `match --json`
    // output on stdout stays parseable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let engine = Arc::new(MatchEngine::from_config(&config)?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, engine).await,
        Commands::Match { resume, job, json } => {
            run_match(&engine, &resume, &job, json).await
        }
    }
}

async fn serve(config: Config, engine: Arc<MatchEngine>) -> Result<()> {
    info!("Starting Resume Matcher API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Weights: skills={} semantic={} tfidf={}, discovery: {}, embeddings: {}",
        config.weights.skills,
        config.weights.semantic,
        config.weights.tfidf,
        config.discovery_mode,
        config.embedding_backend
    );

    let state = AppState {
        config: config.clone(),
        engine,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_match(engine: &MatchEngine, resume: &Path, job: &Path, json: bool) -> Result<()> {
    let report = engine
        .match_resume_to_job(resume, job)
        .await
        .with_context(|| format!("Failed to match {} against {}", resume.display(), job.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}
