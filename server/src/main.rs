use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::credentials::CredentialStore;
use server::network::ChatServer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON config file
    #[arg(short = 'c', long, default_value = "config.json")]
    config: String,

    /// Override the host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Override the port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the per-recipient send timeout in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    send_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match ServerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(send_timeout_ms) = args.send_timeout_ms {
        config.server.send_timeout_ms = send_timeout_ms;
    }

    let credentials = CredentialStore::from_config(&config);
    info!("Loaded users: {}", credentials.users().join(", "));

    let server = ChatServer::bind(
        &config.listen_address(),
        credentials,
        config.send_timeout(),
    )
    .await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
