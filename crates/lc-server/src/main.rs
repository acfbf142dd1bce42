use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lc-server", version, about = "Sheet-metal costing HTTP service")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "3001")]
    port: u16,

    /// Path to the rate book TOML file
    #[arg(long)]
    rates: PathBuf,

    /// Path to the machine profile TOML file
    #[arg(long)]
    machine: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let rate_book_toml = std::fs::read_to_string(&args.rates).expect("Failed to read rate book");
    let rate_book: lc_cost::RateBook = toml::from_str(&rate_book_toml).expect("Failed to parse rate book");

    let machine_toml = std::fs::read_to_string(&args.machine).expect("Failed to read machine profile");
    let machine_profile: lc_cost::MachineProfile =
        toml::from_str(&machine_toml).expect("Failed to parse machine profile");

    tracing::info!("Starting lc-server on {}:{}", args.host, args.port);

    let app = lc_server::build_app(rate_book, machine_profile);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", args.host, args.port))
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}:{}", args.host, args.port);

    axum::serve(listener, app).await.expect("Server error");
}
