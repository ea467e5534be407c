use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::get::ValueKind;
use commands::dump::Format;

#[derive(Parser)]
#[command(
    name = "infra",
    about = "Inspect and edit layered application configuration",
    version,
    propagate_version = true,
)]
struct Cli {
    /// TOML options file (local file list, remote table, timeouts)
    #[arg(long, global = true)]
    options: Option<PathBuf>,
    /// Semicolon-separated local properties files. Overrides the options
    /// file and the environment.
    #[arg(long, global = true)]
    local: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of one parameter
    Get {
        name: String,
        /// Parse the value as this type before printing it
        #[arg(long = "as", value_enum, default_value = "string")]
        kind: ValueKind,
    },
    /// Print every parameter whose name starts with a prefix.
    ///
    /// Local values shadow remote ones. `*` matches everything.
    Dump {
        #[arg(short, long, default_value = "*")]
        prefix: String,
        /// Output format: text or json
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Update a parameter in the remote table and reload it
    Save { name: String, value: String },
    /// Insert a parameter row into a redb database.
    ///
    /// URL is `redb:<path>`. The table comes from the options file.
    Seed {
        url: String,
        name: String,
        value: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("infra=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = commands::load_options(cli.options.as_deref(), cli.local.as_deref())?;

    match cli.command {
        Commands::Get { name, kind } => {
            let config = commands::open(options)?;
            commands::get::get(&config, &name, kind)
        }
        Commands::Dump { prefix, format } => {
            let config = commands::open(options)?;
            commands::dump::dump(&config, &prefix, format)
        }
        Commands::Save { name, value } => {
            let config = commands::open(options)?;
            commands::save::save(&config, &name, &value)
        }
        Commands::Seed { url, name, value } => {
            commands::seed::seed(&options, &url, &name, &value)
        }
    }
}
