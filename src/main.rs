use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use psisearch::config::{default_config_path, load_config, save_config, Config};
use psisearch::mcp::McpServer;
use psisearch::models::{Record, SearchOutcome, SearchParams};
use psisearch::print_status;
use psisearch::search::{Orchestrator, SearchSession};
use psisearch::sources::{HealthStatus, SourceRegistry};
use psisearch::ui::{self, OwoColorize, Spinner};
use psisearch::utils::{to_bibtex, to_bibtex_all, FileStore, SavedList};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// psisearch - search Crossref, PubMed and DOAJ in one go
#[derive(Parser, Debug)]
#[command(name = "psisearch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search Crossref, PubMed and DOAJ, merge duplicates and classify studies", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search all providers
    #[command(alias = "s")]
    Search {
        /// Free-text query (may be omitted to search by year range only)
        query: Option<String>,

        /// First publication year (default from config, 2019)
        #[arg(long)]
        from: Option<String>,

        /// Last publication year (default from config, 2025)
        #[arg(long)]
        to: Option<String>,

        /// Keep only these languages (e.g. --lang en,pt)
        #[arg(long, value_delimiter = ',')]
        lang: Vec<String>,

        /// Keep only open access records
        #[arg(long)]
        oa: bool,

        /// Save (or unsave) the n-th result, counting from 1
        #[arg(long, value_name = "N")]
        save: Option<usize>,
    },

    /// Check that each provider is reachable
    Health,

    /// Manage saved records
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },

    /// Print the BibTeX entry of a saved record
    Cite {
        /// Record id (DOI or provider:id)
        id: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run the MCP server
    #[command(alias = "mcp")]
    Serve {
        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Host to bind to in HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to in HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Subcommand, Debug)]
enum SavedCommands {
    /// List saved records
    List,

    /// Remove a saved record by id
    Remove { id: String },

    /// Export all saved records as BibTeX
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Destination (default: the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn init_logging(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    // RUST_LOG wins over flags and config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("psisearch={}", level)));

    let json = cli.log_json || config.logging.is_json();

    // stdout carries results and the stdio MCP transport; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn build_session(config: &Config) -> Result<SearchSession> {
    let registry = SourceRegistry::from_config(config)?;
    Ok(
        SearchSession::new(Orchestrator::new(registry), saved_list(config))
            .with_defaults(config.search.clone()),
    )
}

fn saved_list(config: &Config) -> SavedList {
    let dir = config.storage.resolved_directory();
    tracing::debug!("Saved list stored in {}", dir.display());
    SavedList::new(Arc::new(FileStore::new(dir)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&cli, &config);

    let format = cli.output.resolve();

    match cli.command {
        Some(Commands::Search {
            query,
            from,
            to,
            lang,
            oa,
            save,
        }) => {
            let session = build_session(&config)?;
            let params = SearchParams {
                q: query.unwrap_or_default(),
                year_from: from,
                year_to: to,
                lang,
                oa,
            };

            let spinner = if format == OutputFormat::Table && !cli.quiet {
                Spinner::new("Searching Crossref, PubMed and DOAJ...")
            } else {
                Spinner::hidden()
            };
            let outcome = session.search(&params).await;
            spinner.clear();

            let outcome = outcome.context("Search was superseded by a newer search")?;
            output_outcome(&outcome, format)?;

            if let Some(n) = save {
                let record = n
                    .checked_sub(1)
                    .and_then(|i| outcome.records.get(i))
                    .with_context(|| format!("No result #{} to save", n))?;
                let saved = session.toggle_saved(record)?;
                if !cli.quiet {
                    let verb = if saved { "Saved" } else { "Removed" };
                    print_status!(Status::Success, format!("{} {}", verb, record.id));
                }
            }
        }

        Some(Commands::Health) => {
            let session = build_session(&config)?;
            let spinner = if format == OutputFormat::Table && !cli.quiet {
                Spinner::new("Checking providers...")
            } else {
                Spinner::hidden()
            };
            let statuses = session.orchestrator().health().await;
            spinner.clear();

            output_health(&statuses, format)?;
        }

        Some(Commands::Saved { command }) => {
            let saved = saved_list(&config);
            match command {
                SavedCommands::List => output_saved(&saved.load(), format)?,
                SavedCommands::Remove { id } => {
                    if saved.remove(&id)? {
                        print_status!(Status::Success, format!("Removed {}", id));
                    } else {
                        print_status!(Status::Warning, format!("{} is not saved", id));
                    }
                }
                SavedCommands::Export { file } => {
                    let items = saved.load();
                    let bibtex = to_bibtex_all(&items);
                    match file {
                        Some(path) => {
                            let content = format!("{}\n\n{}\n", export_header(), bibtex);
                            std::fs::write(&path, content)
                                .with_context(|| format!("Failed to write {}", path.display()))?;
                            if !cli.quiet {
                                print_status!(
                                    Status::Success,
                                    format!("Exported {} records to {}", items.len(), path.display())
                                );
                            }
                        }
                        None => println!("{}", bibtex),
                    }
                }
            }
        }

        Some(Commands::Cite { id }) => {
            let record = saved_list(&config)
                .get(&id)
                .with_context(|| format!("{} is not in the saved list", id))?;
            println!("{}", to_bibtex(&record));
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init { path, force } => {
                let path = path
                    .or_else(default_config_path)
                    .context("Could not determine a config directory; pass a path")?;
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                save_config(&Config::default(), &path)?;
                print_status!(Status::Success, format!("Wrote {}", path.display()));
            }
            ConfigCommands::Show => {
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    print!("{}", config.to_toml()?);
                }
            }
        },

        Some(Commands::Serve { http, host, port }) => {
            let session = Arc::new(build_session(&config)?);
            let server = McpServer::new(session)?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Comment line placed at the top of exported BibTeX files
fn export_header() -> String {
    format!(
        "% Exported by psisearch {} on {}",
        env!("CARGO_PKG_VERSION"),
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    )
}

fn output_outcome(outcome: &SearchOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Table => {
            ui::print_search_header(outcome);
            if !outcome.is_empty() {
                println!("{}", ui::records_table(&outcome.records));
            }
        }
        OutputFormat::Plain => {
            println!("{}", ui::search_header(outcome));
            for (provider, reason) in &outcome.errors {
                println!("! {}: {}", provider.name(), reason);
            }
            if !outcome.is_empty() {
                println!("{}", ui::facet_summary(&outcome.facets));
            }
            for (i, record) in outcome.records.iter().enumerate() {
                println!();
                println!("{}", ui::plain_record(i + 1, record));
            }
        }
        OutputFormat::Auto => unreachable!("resolved before output"),
    }
    Ok(())
}

fn output_health(statuses: &[(psisearch::Provider, HealthStatus)], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let map: BTreeMap<_, _> = statuses.iter().cloned().collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for (provider, status) in statuses {
        let line = format!("{} {}: {}", ui::provider_icon(*provider), provider.name(), status);
        if status.is_online() {
            print_status!(Status::Success, line);
        } else {
            print_status!(Status::Error, line);
        }
    }
    Ok(())
}

fn output_saved(items: &[Record], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        _ if items.is_empty() => println!("{}", "No saved records.".dimmed()),
        OutputFormat::Table => println!("{}", ui::records_table(items)),
        _ => {
            for (i, record) in items.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", ui::plain_record(i + 1, record));
            }
        }
    }
    Ok(())
}
