use bookshelf_server::ServerBuilder;
use bookshelf_server::config::loader::load_config;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "bookshelf-server", version, about = "GraphQL API for a book catalogue")]
struct Cli {
    /// Path to the TOML configuration file. Missing files are skipped.
    #[arg(long, env = "BOOKSHELF_CONFIG", default_value = "bookshelf.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    bookshelf_server::observability::init_tracing();

    let cli = Cli::parse();

    let cfg = match load_config(Some(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    bookshelf_server::observability::apply_logging_level(&cfg.logging.level);
    tracing::info!(
        path = %cli.config,
        storage = %cfg.storage.backend,
        port = cfg.server.port,
        "Configuration loaded"
    );

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Server initialization failed: {e:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        eprintln!("Server error: {err:#}");
        std::process::exit(1);
    }
}
