use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{info, warn};

use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tokio::net::TcpListener;

use anyhow::anyhow;

use gemini_relay::{ServerConfig, routes, state::AppState};

/// Gemini relay - browser audio to Gemini Live API
#[derive(Parser, Debug)]
#[command(name = "gemini-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before the config reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => {
            println!("Loading configuration from {}", path.display());
            ServerConfig::from_file(&path).map_err(|e| anyhow!(e.to_string()))?
        }
        None => ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    // Needed by the outbound wss connection and by the TLS listener
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let socket_addr: SocketAddr = config
        .address()
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", config.address(), e))?;
    let tls = config.tls.clone();

    info!(
        model = %config.gemini_model,
        voice = %config.gemini_voice,
        language = %config.gemini_language_code,
        log_level = %config.log_level,
        "Starting Gemini relay"
    );
    let index = config.static_dir.join("index.html");
    if !index.exists() {
        warn!("{} not found, the browser client will not be served", index.display());
    }

    let app = routes::create_router(AppState::new(config))
        .into_make_service_with_connect_info::<SocketAddr>();

    match tls {
        Some(tls) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|e| {
                    anyhow!(
                        "Failed to load TLS certificates from {} and {}: {}",
                        tls.cert_path.display(),
                        tls.key_path.display(),
                        e
                    )
                })?;

            info!("Server listening on https://{} (TLS enabled)", socket_addr);
            axum_server::bind_rustls(socket_addr, rustls_config)
                .serve(app)
                .await
                .map_err(|e| anyhow!("TLS server error: {}", e))?;
        }
        None => {
            info!("Server listening on http://{}", socket_addr);
            let listener = TcpListener::bind(&socket_addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
