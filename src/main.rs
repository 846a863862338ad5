use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use sea_orm::DatabaseConnection;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use layerconfig::config::CompilerConfig;
use layerconfig::database::connect_and_migrate;
use layerconfig::errors::CompilerError;
use layerconfig::services::{ExportService, ImportService, PortalService, TreeService};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// TOML settings file; LAYERCONFIG_* environment variables override it
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Import one or more layer documents into a portal as a single batch
    Import {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
        #[clap(short, long)]
        portal: String,
        #[clap(short, long, required = true)]
        json: Vec<PathBuf>,
    },
    /// Write a portal's pruned layer document
    Export {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
        #[clap(short, long)]
        portal: String,
        #[clap(short, long)]
        out: PathBuf,
        #[clap(long)]
        compact: bool,
    },
    Tree {
        #[clap(subcommand)]
        command: TreeCommands,
    },
    Registry {
        #[clap(subcommand)]
        command: RegistryCommands,
    },
    Portals {
        #[clap(subcommand)]
        command: PortalCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
    },
}

#[derive(Subcommand, Debug)]
enum TreeCommands {
    /// Validate a tree file against a layer document and replace the stored tree
    Import {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
        #[clap(short, long)]
        portal: String,
        #[clap(short, long)]
        tree: PathBuf,
        #[clap(long)]
        layers: PathBuf,
    },
    Export {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
        #[clap(short, long)]
        portal: String,
        #[clap(short, long)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum RegistryCommands {
    /// Register every layer key of a layer document in the service-layer registry
    Sync {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
        #[clap(long)]
        layers: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum PortalCommands {
    List {
        #[clap(short, long, default_value = "layerconfig.db")]
        database: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match run(args).await {
        Ok(report) => {
            println!("{} {}", "OK".green().bold(), report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err
                .downcast_ref::<CompilerError>()
                .map_or("ERROR", CompilerError::error_code);
            eprintln!("{} [{}]: {}", "error".red().bold(), code, err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<String> {
    let config = CompilerConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                info!("Initializing database: {}", database);
                open(&database).await?;
                Ok(format!("Database {} is ready", database))
            }
        },
        Commands::Import {
            database,
            portal,
            json,
        } => {
            info!("Importing {} document(s) into portal {}", json.len(), portal);
            let db = open(&database).await?;
            let summary = ImportService::new(db, config)
                .import_files(&portal, &json)
                .await?;
            Ok(format!(
                "Imported {} layer(s), {} switch link(s) into portal '{}' from {} document(s)",
                summary.layers_written, summary.switch_links, summary.portal_code, summary.documents
            ))
        }
        Commands::Export {
            database,
            portal,
            out,
            compact,
        } => {
            let db = open(&database).await?;
            let count = ExportService::new(db, config)
                .export_to_file(&portal, &out, compact)
                .await?;
            Ok(format!(
                "Exported {} top-level layer(s) for portal '{}' to {}",
                count,
                portal,
                out.display()
            ))
        }
        Commands::Tree { command } => match command {
            TreeCommands::Import {
                database,
                portal,
                tree,
                layers,
            } => {
                let db = open(&database).await?;
                let summary = TreeService::new(db, config)
                    .import_tree_files(&portal, &tree, &layers)
                    .await?;
                Ok(format!(
                    "Imported tree for portal '{}': {} node(s), {} leaf reference(s)",
                    summary.portal_code, summary.nodes_written, summary.leaves
                ))
            }
            TreeCommands::Export {
                database,
                portal,
                out,
            } => {
                let db = open(&database).await?;
                TreeService::new(db, config)
                    .export_tree_to_file(&portal, &out)
                    .await?;
                Ok(format!("Exported tree for portal '{}' to {}", portal, out.display()))
            }
        },
        Commands::Registry { command } => match command {
            RegistryCommands::Sync { database, layers } => {
                let db = open(&database).await?;
                let (total, inserted) = TreeService::new(db, config)
                    .register_layer_keys_from_file(&layers)
                    .await?;
                Ok(format!(
                    "Registered {} new layer key(s); {} key(s) in {}",
                    inserted,
                    total,
                    layers.display()
                ))
            }
        },
        Commands::Portals { command } => match command {
            PortalCommands::List { database } => {
                let db = open(&database).await?;
                let portals = PortalService::new(db).list_portals().await?;
                for portal in &portals {
                    println!("{:>4}  {:<24} {}", portal.id, portal.code, portal.title);
                }
                Ok(format!("{} portal(s)", portals.len()))
            }
        },
    }
}

async fn open(database: &str) -> Result<DatabaseConnection> {
    Ok(connect_and_migrate(Some(database))
        .await
        .map_err(CompilerError::from)?)
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = if log_level <= Level::INFO {
        format!("sqlx=warn,sea_orm=warn,{}", log_level)
    } else {
        log_level.to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
