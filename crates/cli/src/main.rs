//! ZapaStyle CLI - browse the catalog and manage the cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List sport products, cheapest first
//! zs-cli products --category sport --sort price-asc
//!
//! # Add two pairs of product 3 to the cart and show it
//! zs-cli cart add 3 -q 2
//! zs-cli cart show
//!
//! # Check out
//! zs-cli cart checkout ZS-1001
//! ```
//!
//! State is kept under `STOREFRONT_DATA_DIR`, so successive invocations
//! share one cart, favorites list, theme and analytics counters.
//!
//! # Commands
//!
//! - `products` - List and filter the catalog
//! - `product` - Show one product and record a product view
//! - `cart` - Show and modify the cart, check out
//! - `favorites` - List and toggle favorites
//! - `compare` - Compare up to three products side by side
//! - `theme` - Show or toggle the display theme
//! - `stats` - Show analytics counters

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zapastyle_core::ProductId;
use zapastyle_storefront::analytics::DEFAULT_POPULAR_LIMIT;
use zapastyle_storefront::catalog::InMemoryCatalog;
use zapastyle_storefront::config::StorefrontConfig;
use zapastyle_storefront::error::{Result, StorefrontError};
use zapastyle_storefront::listing::SortOrder;
use zapastyle_storefront::notifications::TracingNotifier;
use zapastyle_storefront::state::Storefront;
use zapastyle_storefront::storage::FileStorage;

mod commands;

#[derive(Parser)]
#[command(name = "zs-cli")]
#[command(author, version, about = "ZapaStyle storefront CLI")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Products {
        /// Only show this category (`all` shows every category)
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive search over name and category
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order (`name`, `price-asc`, `price-desc`)
        #[arg(long, default_value = "name")]
        sort: SortOrder,
    },
    /// Show a single product
    Product {
        /// Product ID
        id: ProductId,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Compare products side by side
    Compare {
        /// Product IDs to compare
        #[arg(required = true)]
        ids: Vec<ProductId>,
    },
    /// Show or change the display theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Show analytics counters
    Stats {
        /// Number of popular products to list
        #[arg(short, long, default_value_t = DEFAULT_POPULAR_LIMIT)]
        limit: usize,
    },
}

impl Commands {
    /// Page recorded in analytics when the command runs.
    const fn page(&self) -> &'static str {
        match self {
            Self::Products { .. } => "products",
            Self::Product { .. } => "product",
            Self::Cart { .. } => "cart",
            Self::Favorites { .. } => "favorites",
            Self::Compare { .. } => "compare",
            Self::Theme { .. } => "theme",
            Self::Stats { .. } => "stats",
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        id: ProductId,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a cart line (0 removes it)
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
    /// Place an order for the cart contents
    Checkout {
        /// Order number
        order_number: String,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorite products
    List,
    /// Add or remove a favorite
    Toggle {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show the current theme
    Show,
    /// Switch between light and dark
    Toggle,
}

fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry::integrations::tracing::EventFilter {
    use sentry::integrations::tracing::EventFilter;

    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

/// Exit code for errors caused by the command's input (unknown product,
/// empty cart at checkout).
const EXIT_USER_ERROR: i32 = 2;

fn exit_code(error: &StorefrontError) -> i32 {
    if error.is_user_error() { EXIT_USER_ERROR } else { 1 }
}

fn load_config() -> Result<StorefrontConfig> {
    Ok(StorefrontConfig::from_env()?)
}

#[allow(clippy::print_stderr)]
fn main() {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet, so report directly
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(exit_code(&e));
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "zapastyle_storefront=info,zapastyle_cli=info".into());

    // Logs go to stderr; stdout carries command output
    let json_layer = cli.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry::integrations::tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config) {
        tracing::error!("Command failed: {e}");
        std::process::exit(exit_code(&e));
    }
}

/// Open persisted state and the catalog, then initialize the storefront.
fn open_storefront(config: &StorefrontConfig) -> Result<Storefront> {
    let storage = FileStorage::open(config.data_dir.clone())?.with_quota(config.storage_quota_bytes);
    let catalog = InMemoryCatalog::from_json_file(&config.catalog_path)?;
    tracing::debug!(
        products = catalog.len(),
        path = %config.catalog_path.display(),
        "Catalog loaded"
    );

    let mut storefront = Storefront::new(
        config,
        Arc::new(catalog),
        Arc::new(storage),
        Arc::new(TracingNotifier),
    );
    storefront.init();
    Ok(storefront)
}

fn run(cli: Cli, config: &StorefrontConfig) -> Result<()> {
    let mut storefront = open_storefront(config)?;
    storefront.visit(cli.command.page());

    match cli.command {
        Commands::Products {
            category,
            search,
            sort,
        } => commands::catalog::list(&storefront, category, search, sort),
        Commands::Product { id } => commands::catalog::show(&storefront, id)?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront),
            CartAction::Add { id, quantity } => commands::cart::add(&mut storefront, id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&mut storefront, id),
            CartAction::Update { id, quantity } => {
                commands::cart::update(&mut storefront, id, quantity);
            }
            CartAction::Clear => commands::cart::clear(&mut storefront),
            CartAction::Checkout { order_number } => {
                commands::cart::checkout(&mut storefront, &order_number)?;
            }
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites::list(&storefront),
            FavoritesAction::Toggle { id } => commands::favorites::toggle(&mut storefront, id)?,
        },
        Commands::Compare { ids } => commands::compare::show(&mut storefront, &ids)?,
        Commands::Theme { action } => match action {
            ThemeAction::Show => commands::preferences::show_theme(&storefront),
            ThemeAction::Toggle => commands::preferences::toggle_theme(&mut storefront),
        },
        Commands::Stats { limit } => commands::stats::show(&storefront, limit),
    }
    Ok(())
}
