//! SubX command-line tool
//!
//! Operator access to the SubX backend: browse offerings and paywalls, inspect
//! and update subscribers, submit receipts, grant or revoke entitlements and
//! record analytics events.

mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use subx_lib::StoreName;
use tracing_subscriber::EnvFilter;

use crate::commands::{parse_key_val, receipt::parse_store, Context};
use crate::config::{default_config_path, FileConfig, Settings};

#[derive(Parser)]
#[command(name = "subx")]
#[command(about = "SubX subscription backend CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Project API key
    #[arg(long, global = true, env = "SUBX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "SUBX_BASE_URL")]
    base_url: Option<String>,

    /// Config file path (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List offerings
    Offerings {
        /// Show the offerings as seen by this subscriber
        #[arg(short, long)]
        user: Option<String>,
    },

    /// List the paywalls of an offering
    Paywalls {
        /// Offering ID
        offering_id: String,
    },

    /// Inspect or update subscribers
    Subscriber {
        #[command(subcommand)]
        action: SubscriberAction,
    },

    /// Submit store receipts
    Receipt {
        #[command(subcommand)]
        action: ReceiptAction,
    },

    /// Grant or revoke entitlements
    Entitlement {
        #[command(subcommand)]
        action: EntitlementAction,
    },

    /// Record analytics events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },

    /// Manage the CLI configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SubscriberAction {
    /// Show a subscriber
    Get {
        /// App user ID
        user: String,
    },
    /// Create or update a subscriber
    Upsert {
        /// App user ID
        user: String,

        /// Attribute to set (repeatable)
        #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        attrs: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ReceiptAction {
    /// Submit a receipt for validation
    Submit {
        /// App user ID
        user: String,

        /// Store the receipt comes from (app_store or play_store)
        #[arg(long, value_parser = parse_store)]
        store: StoreName,

        /// Store product ID
        #[arg(long)]
        product_id: String,

        /// Receipt payload or purchase token
        #[arg(long)]
        receipt: String,

        /// Price paid
        #[arg(long)]
        price: Option<f64>,

        /// ISO currency code
        #[arg(long)]
        currency: Option<String>,
    },
}

#[derive(Subcommand)]
enum EntitlementAction {
    /// Grant an entitlement
    Grant {
        /// App user ID
        user: String,

        /// Entitlement lookup key or ID
        entitlement: String,

        /// Expiry timestamp (ISO 8601)
        #[arg(long)]
        expires_at: Option<String>,
    },
    /// Revoke an entitlement
    Revoke {
        /// App user ID
        user: String,

        /// Entitlement lookup key or ID
        entitlement: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum EventAction {
    /// Track an event
    Track {
        /// Event name
        name: String,

        /// App user ID
        #[arg(short, long)]
        user: Option<String>,

        /// Event property (repeatable); values that parse as JSON keep their type
        #[arg(long = "prop", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        props: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a config file from --api-key/--base-url (prompts for a missing key)
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "subx_cli=debug,subx_lib=debug"
    } else {
        "subx_cli=info,subx_lib=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let file = FileConfig::load(&path)?;
    let settings = Settings::resolve(path, &file, cli.api_key.clone(), cli.base_url.clone());
    tracing::debug!("Config file: {}", settings.path.display());

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config::show(&settings, cli.json),
            ConfigAction::Init { force } => {
                commands::config::init(&settings, cli.api_key, cli.base_url, *force)
            }
        };
    }

    let ctx = Context::new(&settings, cli.json)?;

    match cli.command {
        Commands::Offerings { user } => commands::offerings::run(&ctx, user.as_deref()).await,
        Commands::Paywalls { offering_id } => commands::paywalls::run(&ctx, &offering_id).await,
        Commands::Subscriber { action } => match action {
            SubscriberAction::Get { user } => commands::subscriber::get(&ctx, &user).await,
            SubscriberAction::Upsert { user, attrs } => {
                commands::subscriber::upsert(&ctx, &user, attrs).await
            }
        },
        Commands::Receipt { action } => match action {
            ReceiptAction::Submit {
                user,
                store,
                product_id,
                receipt,
                price,
                currency,
            } => {
                commands::receipt::submit(
                    &ctx,
                    commands::receipt::SubmitArgs {
                        user,
                        store,
                        product_id,
                        receipt,
                        price,
                        currency,
                    },
                )
                .await
            }
        },
        Commands::Entitlement { action } => match action {
            EntitlementAction::Grant {
                user,
                entitlement,
                expires_at,
            } => {
                commands::entitlement::grant(&ctx, &user, &entitlement, expires_at.as_deref())
                    .await
            }
            EntitlementAction::Revoke {
                user,
                entitlement,
                yes,
            } => commands::entitlement::revoke(&ctx, &user, &entitlement, yes).await,
        },
        Commands::Event { action } => match action {
            EventAction::Track { name, user, props } => {
                commands::event::track(&ctx, &name, user, props).await
            }
        },
        Commands::Config { .. } => Ok(()),
    }
}
