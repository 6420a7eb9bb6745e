use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocketdesk::{api, AppState, Config, Database};

#[derive(Parser)]
#[command(name = "pocketdesk")]
#[command(about = "Personal to-do list and notes, with a quote of the day")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the PocketDesk server
    Serve {
        /// Address to bind (overrides POCKETDESK_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP (overrides POCKETDESK_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file (overrides POCKETDESK_DATABASE_PATH)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "pocketdesk=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Default: start server
    if let Some(Commands::Serve {
        host,
        port,
        database,
    }) = cli.command
    {
        if let Some(host) = host {
            config.host = host;
        }
        if let Some(port) = port {
            config.port = port;
        }
        if database.is_some() {
            config.database_path = database;
        }
    }

    serve(config).await
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let db = match &config.database_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    tracing::info!("Database ready with {} users", db.count_users()?);

    if config.google.is_none() {
        tracing::info!("GOOGLE_CLIENT_ID not set, Google sign-in disabled");
    }

    let addr = config.server_address();
    let app = api::create_router(AppState::new(db, config)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("PocketDesk listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
