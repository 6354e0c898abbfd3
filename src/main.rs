use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use token_service::models::Token;
use token_service::store::TokenStore;
use token_service::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // OTLP export is opt-in; without an endpoint only the fmt layer runs.
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "token-service"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "token_service=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Token { command }) => {
            let db = open_store(&cfg).await?;
            handle_token_command(command, &db).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn open_store(cfg: &config::Config) -> anyhow::Result<TokenStore> {
    tracing::info!("Connecting to database...");
    let db = TokenStore::connect(&cfg.database_url, cfg.max_connections).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;
    Ok(db)
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    let db = open_store(&cfg).await?;

    if !cfg.strict_status {
        tracing::info!("Errors are reported as 200 with an `error` body (TOKENS_STRICT_STATUS=false)");
    }

    let state = Arc::new(AppState { db, config: cfg });
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("token service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_token_command(cmd: cli::TokenCommands, db: &TokenStore) -> anyhow::Result<()> {
    match cmd {
        cli::TokenCommands::Create { name } => {
            let token = db.create_or_reactivate(&name).await?;
            println!("Token ready:");
            print_token(&token);
        }
        cli::TokenCommands::List { status } => {
            let tokens = db.list(status).await?;
            if tokens.is_empty() {
                println!("No tokens found.");
            } else {
                println!("{:<10} {:<30} {:<10}", "ID", "NAME", "ACTIVE");
                for t in &tokens {
                    println!("{:<10} {:<30} {:<10}", t.id, t.name, t.active);
                }
                println!("{} of {} tokens", tokens.len(), db.count().await?);
            }
        }
        cli::TokenCommands::Get { id } => {
            let token = db.get(id).await?;
            print_token(&token);
        }
        cli::TokenCommands::Activate { id } => {
            let token = db.set_active(id, true).await?;
            println!("Token activated.");
            print_token(&token);
        }
        cli::TokenCommands::Deactivate { id } => {
            let token = db.set_active(id, false).await?;
            println!("Token deactivated.");
            print_token(&token);
        }
    }
    Ok(())
}

fn print_token(token: &Token) {
    println!(
        "  ID:     {}\n  Name:   {}\n  Active: {}",
        token.id, token.name, token.active
    );
}
