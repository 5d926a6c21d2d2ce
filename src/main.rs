use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use gigmatch::config::AppConfig;
use gigmatch::error::AppError;
use gigmatch::marketplace::{
    marketplace_router, AvailabilityStatus, Difficulty, InMemoryTaskRepository,
    InMemoryUserRepository, MarketplaceService, NewTask, NewUser, Role, TaskSegment,
};
use gigmatch::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "gigmatch",
    about = "Run the gigmatch freelance marketplace service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run an end-to-end CLI demo covering matching, rating, and pricing
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Seed pricing history from a CSV export before serving
    #[arg(long)]
    history_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Optional CSV export to seed completed-task pricing history
    #[arg(long)]
    history_csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run_cli().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

fn build_service() -> Arc<MarketplaceService<InMemoryUserRepository, InMemoryTaskRepository>> {
    let users = Arc::new(InMemoryUserRepository::default());
    let tasks = Arc::new(InMemoryTaskRepository::default());
    Arc::new(MarketplaceService::new(users, tasks))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let service = build_service();
    if let Some(path) = args.history_csv.take() {
        let file = File::open(path)?;
        let imported = service.import_history(file)?;
        info!(imported, "seeded pricing history");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(marketplace_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "gigmatch marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Scripted walk through the marketplace: register a client and freelancers,
/// post a task, collect applications, rank, select, complete, and rate.
fn run_demo(mut args: DemoArgs) -> Result<(), AppError> {
    let service = build_service();

    if let Some(path) = args.history_csv.take() {
        let file = File::open(path)?;
        let imported = service.import_history(file)?;
        println!("seeded {imported} historical tasks");
    }

    let client = service.register_user(NewUser {
        name: "Asha Client".to_string(),
        email: "asha@example.com".to_string(),
        role: Role::Client,
        domains: Vec::new(),
    })?;

    let veteran = service.register_user(NewUser {
        name: "Ravi Veteran".to_string(),
        email: "ravi@example.com".to_string(),
        role: Role::Freelancer,
        domains: vec!["Video Editing".to_string()],
    })?;
    let rookie = service.register_user(NewUser {
        name: "Nina Rookie".to_string(),
        email: "nina@example.com".to_string(),
        role: Role::Freelancer,
        domains: vec!["Video Editing".to_string()],
    })?;

    let task = service.create_task(NewTask {
        title: "Edit a product launch reel".to_string(),
        description: "Three-minute highlight cut from raw footage".to_string(),
        segment: TaskSegment::Individual,
        domain: "Video Editing".to_string(),
        duration_days: 10,
        budget: 5000,
        difficulty: Difficulty::Medium,
        client_id: client.id.clone(),
    })?;
    println!(
        "task {} advisory range: {}..{} ({})",
        task.id.0,
        task.recommended_budget_range.min,
        task.recommended_budget_range.max,
        task.recommended_budget_range
            .classify(task.budget)
            .advisory_note()
    );

    service.apply_to_task(&task.id, &veteran.id, AvailabilityStatus::Available)?;
    service.apply_to_task(&task.id, &rookie.id, AvailabilityStatus::Busy)?;

    let ranked = service.top_applicants(&task.id)?;
    println!("ranked applicants:");
    for applicant in &ranked {
        println!(
            "  {:<14} level {} score {:>6.2} rookie={}",
            applicant.name, applicant.level, applicant.final_score, applicant.is_rookie
        );
    }

    service.select_freelancer(&task.id, &client.id, &veteran.id)?;
    service.complete_task(&task.id, &veteran.id)?;
    let profile = service.rate_task(&task.id, &client.id, 5)?;

    println!(
        "{} after rating: level {} quality {:.2} reliability {:.2}",
        profile.domain_name, profile.level, profile.quality_score, profile.reliability_score
    );

    Ok(())
}
