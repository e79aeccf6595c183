//! spacex-mirror CLI entry point

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use spacex_mirror::{
    api::{ApiClient, Collection},
    commands::{
        cmd_ingest, cmd_ingest_all, cmd_init, cmd_list_crew, cmd_list_launches, cmd_list_payloads,
        cmd_show_crew, cmd_show_launch, cmd_show_payload, cmd_status, print_crew,
        print_crew_member, print_ingest_stats, print_init, print_launch_detail, print_launches,
        print_payload_detail, print_payloads, print_status,
    },
    config::{Config, CONFIG_FILE_NAME},
    db::SpaceDb,
    error::{Error, Result},
    progress::LogWriterFactory,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "spacex-mirror")]
#[command(version, about = "Mirror the SpaceX public API into a local database", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Fetch a collection from the API and reconcile it into the database
    Ingest {
        /// Collection to ingest
        #[arg(value_enum)]
        target: IngestTarget,
    },

    /// List mirrored launches, newest first
    Launches {
        /// Only launches whose name, date or ID contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List mirrored payloads by name
    Payloads {
        /// Only payloads whose name, type, orbit or ID contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List mirrored crew members by name
    Crew {
        /// Only crew whose name, agency, status or ID contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one mirrored record in detail
    Show {
        #[command(subcommand)]
        entity: ShowEntity,
    },

    /// Show database counts and latest ingest runs
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IngestTarget {
    Crew,
    Payloads,
    Launches,
    /// Crew, then payloads, then launches
    All,
}

impl IngestTarget {
    fn collection(self) -> Option<Collection> {
        match self {
            IngestTarget::Crew => Some(Collection::Crew),
            IngestTarget::Payloads => Some(Collection::Payloads),
            IngestTarget::Launches => Some(Collection::Launches),
            IngestTarget::All => None,
        }
    }
}

#[derive(Subcommand)]
enum ShowEntity {
    /// Launch with links, crew, payloads and cores
    Launch {
        /// External launch ID
        id: String,
    },
    /// Payload with its Dragon capsule
    Payload {
        /// External payload ID
        id: String,
    },
    /// Crew member
    Crew {
        /// External crew ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn emit<T: Serialize>(json: bool, value: &T, print: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let config_file = cli.config.as_deref().map(config_file_path);
            let config = cmd_init(config_file, force).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_init(&config);
            }
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "spacex-mirror", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    if !config.paths.db_file.exists() {
        return Err(Error::NotInitialized);
    }
    let db = SpaceDb::new(&config.paths.db_file).await?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest { target } => {
            let client = ApiClient::new(&config.api)?;
            let stats = match target.collection() {
                Some(collection) => vec![cmd_ingest(&db, &client, collection).await?],
                None => cmd_ingest_all(&db, &client).await?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                stats.iter().for_each(print_ingest_stats);
            }
        }

        Commands::Launches { search } => {
            let launches = cmd_list_launches(&db, search.as_deref()).await?;
            emit(cli.json, &launches, |l| print_launches(l))?;
        }

        Commands::Payloads { search } => {
            let payloads = cmd_list_payloads(&db, search.as_deref()).await?;
            emit(cli.json, &payloads, |p| print_payloads(p))?;
        }

        Commands::Crew { search } => {
            let crew = cmd_list_crew(&db, search.as_deref()).await?;
            emit(cli.json, &crew, |c| print_crew(c))?;
        }

        Commands::Show { entity } => match entity {
            ShowEntity::Launch { id } => {
                let detail = cmd_show_launch(&db, &id).await?;
                emit(cli.json, &detail, print_launch_detail)?;
            }
            ShowEntity::Payload { id } => {
                let detail = cmd_show_payload(&db, &id).await?;
                emit(cli.json, &detail, print_payload_detail)?;
            }
            ShowEntity::Crew { id } => {
                let member = cmd_show_crew(&db, &id).await?;
                emit(cli.json, &member, print_crew_member)?;
            }
        },

        Commands::Status => {
            let status = cmd_status(&config, &db).await?;
            emit(cli.json, &status, print_status)?;
        }
    }

    Ok(())
}

/// A `--config` pointing at a .toml file names the file; anything else names
/// the directory holding `config.toml`
fn config_file_path(path: &Path) -> PathBuf {
    if path.extension().map_or(false, |e| e == "toml") {
        path.to_path_buf()
    } else {
        path.join(CONFIG_FILE_NAME)
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) if p.extension().map_or(false, |e| e == "toml") => Config::load(p),
        Some(p) => Config::load_from(Some(p.to_path_buf())),
        None => Config::load_from(None),
    }
}
