use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use karta_finder::config::{self, AppConfig};
use karta_finder::core::{CollectOptions, FileReference, ProjectCode, Resolver};
use karta_finder::integrations::{self, GraphClient, GraphMailNotifier, GraphSession};
use karta_finder::notify::{JsonLedger, NotificationWorkflow};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "karta-finder", version, about = "Find the karta stavby spreadsheet for a project code")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a project code to its single karta stavby file
    Resolve {
        /// Project code, optionally with a year (e.g. EP25005/2025)
        code: String,
        /// Project name, used when ranking ambiguous matches
        #[arg(default_value = "")]
        name: String,
    },
    /// List the spreadsheets of the project folder
    Files {
        code: String,
        #[arg(default_value = "")]
        name: String,
        /// Only look at the folder itself, not its subfolders
        #[arg(long)]
        no_recurse: bool,
        /// Print every match instead of ranking down to one
        #[arg(long)]
        all: bool,
    },
    /// Notify about every pending ledger entry
    Notify {
        /// Ledger file (overrides `ledger_path` from the config)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Print the location of the default configuration file
    ConfigPath,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Command::ConfigPath = cli.command {
        match config::settings::get_config_file_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    let app_config = AppConfig::load(cli.config.as_deref())?;

    let session = GraphSession::authenticate(&app_config.graph)
        .await
        .context("authenticating against Microsoft Graph")?;
    let store = GraphClient::for_site(session.clone(), &app_config.graph.site_url)
        .await
        .context("resolving SharePoint site")?;
    tracing::info!("Using SharePoint site {}", store.site_id());
    let ranker = integrations::ranker_from_config(&app_config.ranker)?;
    let resolver = Resolver::new(Arc::new(store), ranker, app_config.search.options());

    match cli.command {
        Command::Resolve { code, name } => {
            match resolver.resolve(&ProjectCode::parse(&code), &name).await {
                Ok(file) => print_file(&file),
                Err(e) => println!("Not found: {}", e),
            }
        }
        Command::Files {
            code,
            name,
            no_recurse,
            all,
        } => {
            let options = CollectOptions {
                recurse_subfolders: !no_recurse && app_config.search.recurse_subfolders,
                auto_select: !all && app_config.search.auto_select,
            };
            match resolver
                .files(&ProjectCode::parse(&code), &name, options)
                .await
            {
                Ok(files) => files.iter().for_each(print_file),
                Err(e) => println!("Not found: {}", e),
            }
        }
        Command::Notify { ledger } => run_notify(&app_config, &resolver, session, ledger).await?,
        Command::ConfigPath => {}
    }

    Ok(())
}

async fn run_notify(
    app_config: &AppConfig,
    resolver: &Resolver,
    session: GraphSession,
    ledger: Option<PathBuf>,
) -> Result<()> {
    let ledger_path = ledger
        .or_else(|| app_config.ledger_path.clone())
        .ok_or_else(|| anyhow::anyhow!("No ledger given (use --ledger or set ledger_path)"))?;
    let mut ledger = JsonLedger::open(&ledger_path)?;
    let notifier = GraphMailNotifier::new(session, app_config.mail.from.clone());

    let summary = NotificationWorkflow::new(resolver, &mut ledger, &notifier, app_config.mail.to.clone())
        .run()
        .await?;
    tracing::info!(
        "Done: {} notified ({} with link, {} without), {} failed",
        summary.notified,
        summary.with_link,
        summary.without_link,
        summary.failed
    );
    Ok(())
}

fn print_file(file: &FileReference) {
    println!("{}", file.name);
    println!("  path: {}", file.path);
    println!("  size: {:.2} MB", file.size_mb());
    if let Some(link) = &file.external_link {
        println!("  link: {}", link);
    }
}
