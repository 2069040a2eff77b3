use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "promfold",
    about = "promfold: fold Prometheus metrics into structured monitoring events",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in modules
    Modules,
    /// Check that a mapping file is valid
    Validate {
        /// Path to a mapping TOML file
        #[arg(short, long)]
        mapping: String,
    },
    /// Assemble events from an exposition payload on disk or stdin.
    ///
    /// The mapping comes from the built-in module unless --mapping is
    /// given, in which case the file replaces it.
    Assemble {
        #[arg(long)]
        module: String,
        #[arg(long)]
        metricset: String,
        /// Mapping TOML file overriding the module's built-in mapping
        #[arg(long)]
        mapping: Option<String>,
        /// Payload file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
        /// Output format: json (one event per line) or pretty
        #[arg(short, long, default_value = "json")]
        format: String,
    },
    /// Run a single collection cycle against a host
    Scrape {
        #[arg(long)]
        module: String,
        #[arg(long)]
        metricset: String,
        /// host:port or full URL; scheme and path default per module
        #[arg(long)]
        host: String,
        #[arg(long)]
        mapping: Option<String>,
        /// Fetch timeout, e.g. 5s or 500ms
        #[arg(long, default_value = "5s")]
        timeout: String,
    },
    /// Run collectors from a config file until interrupted
    Run {
        #[arg(short, long)]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("promfold=info".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Modules => commands::modules::list(),
        Commands::Validate { mapping } => commands::validate::validate(&mapping),
        Commands::Assemble {
            module,
            metricset,
            mapping,
            input,
            format,
        } => commands::assemble::assemble(
            &module,
            &metricset,
            mapping.as_deref(),
            &input,
            &format,
        ),
        Commands::Scrape {
            module,
            metricset,
            host,
            mapping,
            timeout,
        } => {
            commands::scrape::scrape(&module, &metricset, &host, mapping.as_deref(), &timeout)
                .await
        }
        Commands::Run { config } => commands::run::run(&config).await,
    }
}
