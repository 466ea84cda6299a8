//! Bazaar CLI - browse the marketplace and manage a vendor account from the
//! terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session persists under BAZAAR_STATE_DIR)
//! BAZAAR_PASSWORD=hunter22 bazaar login -e ada@example.com
//! pass show bazaar | bazaar login -e ada@example.com --password-stdin
//!
//! # Browse stores and build a WhatsApp inquiry
//! bazaar stores list
//! bazaar stores show mama-put
//! bazaar stores inquire mama-put p1 p2
//!
//! # Manage your products
//! bazaar products mine
//! bazaar products create -n "Jollof tray" -d "Serves 4" -p 15000
//! bazaar products upload p1 ./cover.jpg
//!
//! # Approve vendors (admin accounts)
//! bazaar admin pending
//! bazaar admin approve v123
//! ```
//!
//! # Environment Variables
//!
//! Client settings are documented on `bazaar_client::ClientConfig`. In
//! addition:
//! - `BAZAAR_PASSWORD` - Password for `login` and `signup` unless
//!   `--password-stdin` is given
//! - `SENTRY_DSN` - Enables error reporting when set
//! - `SENTRY_ENVIRONMENT` - Environment tag for reported events

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_client::{Bazaar, ClientConfig};
use bazaar_core::{Email, Price};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to an existing account
    Login {
        #[arg(short, long)]
        email: Email,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },
    /// Create a vendor account and its store
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Email,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,

        /// Number buyers reach the store on
        #[arg(short, long)]
        whatsapp: String,

        #[arg(short, long)]
        username: String,

        /// Store name
        #[arg(short, long)]
        store: String,

        #[arg(short, long, default_value = "")]
        bio: String,
    },
    /// Sign out and forget cached account data
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Browse stores
    Stores {
        #[command(subcommand)]
        action: StoresAction,
    },
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Vendor approval (admin accounts)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum StoresAction {
    /// List stores page by page
    List {
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Search stores by name
    Search { query: String },
    /// Show a public store page with its products
    Show { slug: String },
    /// Print a WhatsApp link asking a store about some of its products
    Inquire {
        slug: String,

        /// Product ids to ask about
        #[arg(required = true)]
        products: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Your own products
    Mine,
    /// Products visible to shoppers
    Active,
    /// Search products
    Search { query: String },
    /// Products within a price range
    Price {
        #[arg(long)]
        min: Option<Price>,

        #[arg(long)]
        max: Option<Price>,
    },
    /// Create a product
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long)]
        price: Price,
    },
    /// List or unlist a product
    Status {
        id: String,

        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Delete a product
    Delete { id: String },
    /// Upload an image for a product
    Upload {
        id: String,

        file: std::path::PathBuf,

        /// Display position; appended last when omitted
        #[arg(long)]
        position: Option<i32>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Vendors waiting for approval
    Pending,
    /// Approved vendors
    Approved,
    /// Approve a pending vendor
    Approve { id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_client=info,bazaar_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let bazaar = Bazaar::open(ClientConfig::from_env()?)?;

    match cli.command {
        Commands::Login {
            email,
            password_stdin,
        } => {
            let password = commands::auth::read_password(password_stdin).await?;
            commands::auth::login(&bazaar, email, password).await?;
        }
        Commands::Signup {
            name,
            email,
            password_stdin,
            whatsapp,
            username,
            store,
            bio,
        } => {
            let request = bazaar_client::api::SignupRequest {
                name,
                email,
                password: commands::auth::read_password(password_stdin).await?,
                whatsapp_number: whatsapp,
                username,
                store_name: store,
                bio,
            };
            commands::auth::signup(&bazaar, &request).await?;
        }
        Commands::Logout => commands::auth::logout(&bazaar),
        Commands::Whoami => commands::auth::whoami(&bazaar)?,
        Commands::Stores { action } => match action {
            StoresAction::List { page, page_size } => {
                commands::stores::list(&bazaar, page, page_size).await?;
            }
            StoresAction::Search { query } => commands::stores::search(&bazaar, &query).await?,
            StoresAction::Show { slug } => commands::stores::show(&bazaar, &slug).await?,
            StoresAction::Inquire { slug, products } => {
                commands::stores::inquire(&bazaar, &slug, &products).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::Mine => commands::products::mine(&bazaar).await?,
            ProductsAction::Active => commands::products::active(&bazaar).await?,
            ProductsAction::Search { query } => {
                commands::products::search(&bazaar, &query).await?;
            }
            ProductsAction::Price { min, max } => {
                commands::products::by_price(&bazaar, min, max).await?;
            }
            ProductsAction::Create {
                name,
                description,
                price,
            } => commands::products::create(&bazaar, name, description, price).await?,
            ProductsAction::Status { id, active } => {
                commands::products::set_status(&bazaar, &id, active).await?;
            }
            ProductsAction::Delete { id } => commands::products::delete(&bazaar, &id).await?,
            ProductsAction::Upload { id, file, position } => {
                commands::products::upload(&bazaar, &id, &file, position).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Pending => commands::admin::pending(&bazaar).await?,
            AdminAction::Approved => commands::admin::approved(&bazaar).await?,
            AdminAction::Approve { id } => commands::admin::approve(&bazaar, &id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_price_and_email() {
        let cli = Cli::try_parse_from([
            "bazaar", "products", "create", "-n", "Tray", "-p", "1500.50",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Products {
                action: ProductsAction::Create { .. }
            })
        ));

        let bad = Cli::try_parse_from(["bazaar", "login", "-e", "nope"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_password_is_not_an_argument() {
        let with_password =
            Cli::try_parse_from(["bazaar", "login", "-e", "ada@example.com", "-p", "hunter22"]);
        assert!(with_password.is_err());

        let cli = Cli::try_parse_from(["bazaar", "login", "-e", "ada@example.com", "--password-stdin"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Login {
                password_stdin: true,
                ..
            })
        ));
    }
}
