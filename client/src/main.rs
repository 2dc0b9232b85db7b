use clap::Parser;
use client::network::Client;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 'a', long, default_value_t = format!("127.0.0.1:{}", shared::DEFAULT_PORT))]
    addr: String,

    /// User to log in as
    #[arg(short = 'u', long)]
    user: String,

    /// Password of the user
    #[arg(short = 'p', long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut client = match Client::connect(&args.addr, &args.user, &args.password).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to log in: {}", e);
            eprintln!("Failed to log in: {}", e);
            std::process::exit(1);
        }
    };

    client.run().await?;
    info!("Bye");

    Ok(())
}
