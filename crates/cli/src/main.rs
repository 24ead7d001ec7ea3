use clap::Parser;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = lstake_cli::run(lstake_cli::args::Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
