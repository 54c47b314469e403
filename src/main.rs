use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use publink_gallery::{
    Config, create_app, create_app_with_transport,
    album::{AlbumResolver, HighResCache, PhotoId},
    pcloud::{FixtureTransport, PcloudClient},
    startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Answer remote calls from a JSON fixture file instead of the network
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Resolve a share code and print the album as JSON
    Album {
        /// Share-link code
        code: String,
    },

    /// Resolve the high-resolution link of one photo in a shared album
    Photo {
        /// Share-link code
        code: String,
        /// Remote file id of the photo
        photo_id: PhotoId,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(&cli.config)?;

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            fixture,
            quit_after,
        }) => run_server(config, port, host, fixture, quit_after).await,
        Some(Commands::Album { code }) => print_album(config, &code).await,
        Some(Commands::Photo { code, photo_id }) => print_high_res(config, &code, photo_id).await,
        None => {
            // Default to serve command if no subcommand specified
            run_server(config, None, None, None, None).await
        }
    }
}

async fn print_album(config: Config, code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(PcloudClient::from_config(&config.pcloud)?);
    let resolver = AlbumResolver::new(client, config.pcloud.thumbnail_spec());

    let snapshot = resolver.resolve_album(code).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn print_high_res(
    config: Config,
    code: &str,
    photo_id: PhotoId,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(PcloudClient::from_config(&config.pcloud)?);
    let cache = HighResCache::new(client, config.pcloud.high_res_size.clone());

    let url = cache.get_high_res(photo_id, code).await?;
    println!("{}", url);
    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    fixture: Option<PathBuf>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("API servers: {:?}", config.pcloud.api_servers);

    if let Err(errors) = startup_checks::perform_startup_checks(&config) {
        for error in &errors {
            tracing::error!("Startup check failed: {}", error);
        }
        return Err("Startup checks failed".into());
    }

    let app = match fixture {
        Some(path) => {
            info!("Serving remote calls from fixture {:?}", path);
            let transport = Arc::new(FixtureTransport::from_file(&path)?);
            create_app_with_transport(config, transport)
        }
        None => create_app(config)?,
    };

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Set up graceful shutdown
    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
