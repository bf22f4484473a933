//! FreshCart CLI - query the grocery backend the way the storefront does.
//!
//! # Usage
//!
//! ```bash
//! # How is a pincode served?
//! freshcart pincode check 560034
//!
//! # Delivery charge for a position and cart total
//! freshcart delivery quote --lat 12.93 --lng 77.62 --total 349 --payment cod
//!
//! # Promocode suggestions for a cart (product:quantity:price)
//! freshcart promos suggest --item P1:2:49.50 --item P7:1:120
//!
//! # Published blog posts
//! freshcart blogs list --category recipes
//! ```
//!
//! The backend is read from `FRESHCART_BACKEND_URL` (a `.env` file is
//! honoured) unless `--backend-url` is given.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use freshcart_core::PaymentMethod;

mod commands;

#[derive(Parser)]
#[command(name = "freshcart")]
#[command(author, version, about = "FreshCart backend tools")]
struct Cli {
    /// Backend base URL (overrides `FRESHCART_BACKEND_URL`)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pincode lookups
    Pincode {
        #[command(subcommand)]
        action: PincodeAction,
    },
    /// Delivery charges
    Delivery {
        #[command(subcommand)]
        action: DeliveryAction,
    },
    /// Promocodes
    Promos {
        #[command(subcommand)]
        action: PromosAction,
    },
    /// Blog posts
    Blogs {
        #[command(subcommand)]
        action: BlogsAction,
    },
}

#[derive(Subcommand)]
enum PincodeAction {
    /// Show the delivery mode and warehouse for a pincode
    Check {
        /// Six-digit pincode
        pincode: String,
    },
}

#[derive(Subcommand)]
enum DeliveryAction {
    /// Quote the delivery charge for a position and cart total
    Quote {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Cart total in rupees
        #[arg(long)]
        total: Decimal,

        /// Payment method (`online`, `cod`)
        #[arg(long, default_value = "online")]
        payment: PaymentMethod,
    },
}

#[derive(Subcommand)]
enum PromosAction {
    /// Show the codes the cart page would offer
    Suggest {
        /// Cart line as `product:quantity:price`, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<String>,

        /// Signed-in user id, for user-specific codes
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum BlogsAction {
    /// List published posts
    List {
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let backend = commands::connect(cli.backend_url)?;

    match cli.command {
        Commands::Pincode { action } => match action {
            PincodeAction::Check { pincode } => {
                commands::pincode::check(&backend, &pincode).await?;
            }
        },
        Commands::Delivery { action } => match action {
            DeliveryAction::Quote {
                lat,
                lng,
                total,
                payment,
            } => commands::delivery::quote(&backend, lat, lng, total, payment).await?,
        },
        Commands::Promos { action } => match action {
            PromosAction::Suggest { items, user } => {
                commands::promos::suggest(&backend, &items, user).await?;
            }
        },
        Commands::Blogs { action } => match action {
            BlogsAction::List {
                page,
                limit,
                category,
                search,
            } => {
                let query = freshcart_storefront::backend::BlogQuery {
                    page,
                    limit,
                    category,
                    search,
                };
                commands::blogs::list(&backend, &query).await?;
            }
        },
    }
    Ok(())
}
