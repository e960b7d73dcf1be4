use clap::Parser;
use log::info;
use server::registry::GameRegistry;
use server::{dictionary, network};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Main-method of the application.
/// Parses command-line arguments, loads the canned dictionaries, then runs
/// the WebSocket accept loop until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Directory of canned dictionaries (<name>.txt, one word per line)
        #[clap(short, long, default_value = "dicts")]
        dicts: PathBuf,
    }

    env_logger::init();
    let args = Args::parse();

    // Dictionaries are loaded once and injected read-only into every game.
    let dictionaries = dictionary::load_dir(&args.dicts)?;
    let registry = Arc::new(GameRegistry::new(Arc::new(dictionaries)));

    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&address).await?;
    info!("server listening on {}", address);

    // Spawn the accept loop
    let server_handle = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            network::run(listener, registry).await;
        })
    };

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                eprintln!("Network task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
