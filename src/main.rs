//! Storefront CLI

use std::{io, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use storefront::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront cart CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

/// Where the cart, configuration and catalog live.
#[derive(Debug, Args)]
struct StoreArgs {
    /// Directory the cart is saved in
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    data_dir: PathBuf,

    /// Store configuration file (YAML)
    #[arg(long, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding catalog fixtures
    #[arg(long, env = "STOREFRONT_CATALOG_DIR", default_value = "./fixtures/catalog")]
    catalog: PathBuf,

    /// Catalog fixture name
    #[arg(long, env = "STOREFRONT_FIXTURE", default_value = "storefront")]
    fixture: String,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List products, optionally in one category
    Products {
        /// Category slug
        #[arg(long)]
        category: Option<String>,
    },

    /// Search product names and descriptions
    Search {
        /// Text to look for
        query: String,
    },

    /// List categories
    Categories,

    /// Add one unit of a product to the cart
    Add {
        /// Product id
        id: u32,
    },

    /// Remove a product from the cart
    Remove {
        /// Product id
        id: u32,
    },

    /// Set a product's quantity; 0 removes it
    Update {
        /// Product id
        id: u32,

        /// New quantity
        quantity: u32,
    },

    /// Empty the cart
    Clear,

    /// Show the cart
    Show,

    /// Place an order for the cart contents
    Checkout(CheckoutArgs),
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Delivery speed
    #[arg(long, value_enum, default_value_t = ShippingMethod::Standard)]
    shipping: ShippingMethod,

    /// Payment method
    #[arg(long, value_enum, default_value_t = PaymentMethod::CreditCard)]
    payment: PaymentMethod,

    /// First name
    #[arg(long)]
    first_name: String,

    /// Last name
    #[arg(long)]
    last_name: String,

    /// Contact email
    #[arg(long)]
    email: String,

    /// Street address
    #[arg(long)]
    street: String,

    /// City
    #[arg(long)]
    city: String,

    /// State or region
    #[arg(long)]
    state: String,

    /// ZIP or postal code
    #[arg(long)]
    zip: String,
}

impl From<CheckoutArgs> for CheckoutRequest {
    fn from(args: CheckoutArgs) -> Self {
        CheckoutRequest {
            shipping: args.shipping,
            payment: args.payment,
            details: ShippingDetails {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                street: args.street,
                city: args.city,
                state: args.state,
                zip: args.zip,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.logging)?;

    run(cli)
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    match config.log_format {
        LogFormat::Compact => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(io::stderr),
        ),
        LogFormat::Json => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(io::stderr),
        ),
    }
}

fn init_with_layer<L>(config: &LoggingConfig, fmt_layer: L) -> Result<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(EnvFilter::new(&config.log_level))
        .try_init()
        .context("failed to install log subscriber")
}

#[expect(clippy::print_stdout, reason = "CLI output goes to stdout.")]
fn run(cli: Cli) -> Result<()> {
    let config = match &cli.store.config {
        Some(path) => StoreConfig::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => StoreConfig::default(),
    };

    let catalog = FixtureCatalog::load(&cli.store.catalog, &cli.store.fixture)
        .with_context(|| format!("failed to load catalog {:?}", cli.store.fixture))?;

    if let Some(currency) = catalog.currency().filter(|&currency| currency != config.currency) {
        bail!(
            "catalog is priced in {}, store is configured for {}",
            currency.iso_alpha_code,
            config.currency.iso_alpha_code
        );
    }

    debug!(products = catalog.len(), "catalog loaded");

    let mut store = CartStore::open(FileStorage::new(&cli.store.data_dir), &config);

    store.subscribe(|_, event| println!("{}", event.notification()));

    let stdout = io::stdout();

    match cli.command {
        Commands::Products { category } => {
            write_products(stdout.lock(), &catalog.products(category.as_deref()))?;
        }
        Commands::Search { query } => {
            write_products(stdout.lock(), &catalog.search(&query))?;
        }
        Commands::Categories => {
            for category in catalog.categories() {
                println!("{:<14}{}", category.slug, category.name);
            }
        }
        Commands::Add { id } => {
            let product = catalog
                .product(ProductId(id))
                .with_context(|| format!("no product with id {id}"))?;

            store.add_item(product)?;
        }
        Commands::Remove { id } => {
            if store.remove_item(ProductId(id)).is_none() {
                info!(id, "product not in cart");
                println!("Product {} is not in your cart", ProductId(id));
            }
        }
        Commands::Update { id, quantity } => {
            if store.update_quantity(ProductId(id), quantity)?.is_none() {
                info!(id, "product not in cart");
                println!("Product {} is not in your cart", ProductId(id));
            }
        }
        Commands::Clear => {
            store.clear_cart();
        }
        Commands::Show => {
            write_cart(stdout.lock(), store.cart())?;
        }
        Commands::Checkout(args) => {
            let order = store.checkout(args.into())?;

            write_order(stdout.lock(), &order)?;
        }
    }

    Ok(())
}
