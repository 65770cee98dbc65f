//! PokeStore CLI - storefront and back-office from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is kept in POKESTORE_DATA_DIR)
//! pokestore login -e ash@pallet.town -p pikachu
//!
//! # Browse and buy
//! pokestore catalog list --type fuego --search char
//! pokestore cart add 25
//! pokestore checkout
//!
//! # Back-office (admin role required)
//! pokestore admin top --limit 3
//! pokestore admin update 25 --price 80000
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Session management
//! - `catalog list` - Show the product catalog, optionally filtered
//! - `cart add|remove|clear|show` - Manage the cart
//! - `checkout` - Buy the cart
//! - `history` - Your past purchases
//! - `admin sales|top|seed|update|delete` - Back-office

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokestore_admin::{AdminError, DEFAULT_TOP_LIMIT};
use pokestore_core::ProductId;
use pokestore_storefront::api::{ApiClient, ApiError};
use pokestore_storefront::catalog::CatalogQuery;
use pokestore_storefront::{Storefront, StorefrontConfig, StorefrontError};

mod commands;

#[derive(Parser)]
#[command(name = "pokestore")]
#[command(author, version, about = "PokeStore storefront and back-office")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to an existing account
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Buy everything in the cart
    Checkout,
    /// List your past purchases
    History,
    /// Back-office (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products, optionally filtered
    List {
        /// Only this type ("all" for every type)
        #[arg(long = "type")]
        category: Option<String>,
        /// Match names or catalog ids containing this term
        #[arg(short, long)]
        search: Option<String>,
        /// Require the name to equal the search term
        #[arg(long, requires = "search")]
        exact: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add {
        /// Catalog id
        id: ProductId,
    },
    /// Remove a product entirely
    Remove {
        /// Catalog id
        id: ProductId,
    },
    /// Empty the cart
    Clear,
    /// Show the cart and its totals
    Show,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Sales history across all users
    Sales,
    /// Best-selling products
    Top {
        /// How many products to show
        #[arg(short, long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,
    },
    /// Load the initial product set
    Seed,
    /// Change fields of a product
    Update {
        /// Catalog id
        id: ProductId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Unit price in CLP
        #[arg(long)]
        price: Option<Decimal>,

        #[arg(long)]
        description: Option<String>,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a product from the catalog
    Delete {
        /// Catalog id
        id: ProductId,
    },
}

/// Errors a command can end with.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Bad command-line input that clap cannot catch.
    #[error("{0}")]
    Usage(String),
}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        Self::Storefront(error.into())
    }
}

impl CliError {
    fn is_internal(&self) -> bool {
        match self {
            Self::Storefront(e) => e.is_internal(),
            Self::Admin(AdminError::Storage(_)) => true,
            Self::Admin(_) | Self::Usage(_) => false,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            send_default_pii: false,
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

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pokestore_storefront=info,pokestore_admin=info,pokestore_cli=info".into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    // Ctrl-C drops any request in flight instead of applying its response
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = match Storefront::open(config) {
        Ok(store) => ApiClient::cancellable(&cancel, run(cli, store)).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        if e.is_internal() {
            tracing::error!("Command failed: {e}");
        } else {
            commands::output::failure(&e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, store: Storefront) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&store, &email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => commands::account::register(&store, &name, &email, password).await?,
        Commands::Logout => commands::account::logout(&store),
        Commands::Whoami => commands::account::whoami(&store),
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                category,
                search,
                exact,
            } => {
                let query = CatalogQuery {
                    category,
                    term: search,
                    exact,
                };
                commands::shop::list_catalog(&store, &query).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Add { id } => commands::shop::add_to_cart(&store, id).await?,
            CartAction::Remove { id } => commands::shop::remove_from_cart(&store, id),
            CartAction::Clear => commands::shop::clear_cart(&store),
            CartAction::Show => commands::shop::show_cart(&store),
        },
        Commands::Checkout => commands::shop::checkout(&store)?,
        Commands::History => commands::shop::history(&store)?,
        Commands::Admin { action } => match action {
            AdminAction::Sales => commands::admin::sales(&store)?,
            AdminAction::Top { limit } => commands::admin::top(&store, limit)?,
            AdminAction::Seed => commands::admin::seed(&store).await?,
            AdminAction::Update {
                id,
                name,
                category,
                price,
                description,
                image,
            } => {
                let update = commands::admin::build_update(name, category, price, description, image)?;
                commands::admin::update(&store, id, &update).await?;
            }
            AdminAction::Delete { id } => commands::admin::delete(&store, id).await?,
        },
    }
    Ok(())
}
