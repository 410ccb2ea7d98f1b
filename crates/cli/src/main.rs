//! Cartwheel CLI - storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! cw products list --category electronics --sort price-asc --page 2
//!
//! # Build a cart (kept offline until signed in)
//! cw cart add 3 --quantity 2
//! cw cart promo apply SAVE10
//!
//! # Sign in and push the offline cart to the server
//! cw account login --token <TOKEN>
//! cw cart sync
//!
//! # Place an order for the cart contents
//! cw checkout --full-name "Ada Lovelace" --email ada@example.com \
//!     --phone 555-0100 --street "1 Analytical Way" --city London \
//!     --state LDN --zip-code "EC1A 1BB" --country UK
//! ```
//!
//! # Commands
//!
//! - `products` - Browse and search the catalog
//! - `cart` - View and mutate the cart
//! - `checkout` - Place an order
//! - `orders` - Order history and live status updates
//! - `wishlist` - Manage the wishlist
//! - `account` - Session and profile management

#![cfg_attr(not(test), forbid(unsafe_code))]

use cartwheel_client::api::ProfileUpdate;
use cartwheel_client::{Address, SortKey};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::CliContext;

#[derive(Parser)]
#[command(name = "cw")]
#[command(version, about = "Cartwheel storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and search the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// View and mutate the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the current cart
    Checkout(CheckoutArgs),
    /// Order history and live status updates
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Session and profile management
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products with filtering, sorting, and pagination
    List {
        /// Only show products in this category
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive search over title, description, and category
        #[arg(long)]
        search: Option<String>,

        /// Minimum price, inclusive
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Maximum price, inclusive
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Sort order (`price-asc`, `price-desc`, `name-asc`, `name-desc`,
        /// `rating-desc`)
        #[arg(long)]
        sort: Option<SortKey>,

        /// Page to show, 1-based
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one product with its rating and reviews
    Show {
        /// Product ID
        id: i64,
    },
    /// List all product categories
    Categories,
    /// Show products related to one product
    Related {
        /// Product ID
        id: i64,

        /// Maximum number of related products
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: i64,

        /// Quantity to add
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line
    Update {
        /// Product ID
        product_id: i64,

        /// New quantity (0 is ignored; use `remove` to delete a line)
        #[arg(long)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: i64,
    },
    /// Remove every item from the cart
    Clear,
    /// Show the cart item count
    Count,
    /// Manage the applied promo code
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },
    /// Push offline cart lines to the server
    Sync,
}

#[derive(Subcommand)]
enum PromoAction {
    /// Validate and apply a promo code
    Apply {
        /// Promo code
        code: String,
    },
    /// Remove the applied promo code
    Remove,
}

#[derive(Args)]
struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    full_name: String,

    /// Contact email
    #[arg(long)]
    email: String,

    /// Contact phone number
    #[arg(long)]
    phone: String,

    /// Street address
    #[arg(long)]
    street: String,

    /// City
    #[arg(long)]
    city: String,

    /// State or province
    #[arg(long)]
    state: String,

    /// Postal code
    #[arg(long)]
    zip_code: String,

    /// Country
    #[arg(long)]
    country: String,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Poll order statuses until interrupted
    Watch {
        /// Poll interval in seconds (defaults to the configured interval)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Cancel a pending order
    Cancel {
        /// Order ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List wishlist entries
    List,
    /// Add or remove a product from the wishlist
    Toggle {
        /// Product ID
        id: i64,
    },
    /// Check whether a product is in the wishlist
    Check {
        /// Product ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Show session status
    Status,
    /// Show the signed-in account's profile
    Profile,
    /// Update profile fields (unset flags are left unchanged)
    Update {
        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Last name
        #[arg(long)]
        last_name: Option<String>,

        /// Phone number
        #[arg(long)]
        phone_number: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,

        /// Street address
        #[arg(long)]
        address: Option<String>,

        /// City
        #[arg(long)]
        city: Option<String>,

        /// State or province
        #[arg(long)]
        state: Option<String>,

        /// Postal code
        #[arg(long)]
        zip_code: Option<String>,

        /// Country
        #[arg(long)]
        country: Option<String>,
    },
    /// Sign in with an API bearer token
    Login {
        /// Bearer token
        #[arg(long)]
        token: String,

        /// Account username (stored for display only)
        #[arg(long)]
        username: Option<String>,

        /// Account email (stored for display only)
        #[arg(long)]
        email: Option<String>,

        /// Account ID (stored for display only)
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Sign out and clear stored credentials
    Logout,
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
    let ctx = CliContext::init()?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                category,
                search,
                min_price,
                max_price,
                sort,
                page,
            } => {
                let options = commands::catalog::ListOptions {
                    category,
                    search,
                    min_price,
                    max_price,
                    sort,
                    page,
                };
                commands::catalog::list(&ctx, options).await?;
            }
            ProductsAction::Show { id } => commands::catalog::show(&ctx, id).await?,
            ProductsAction::Categories => commands::catalog::categories(&ctx).await?,
            ProductsAction::Related { id, limit } => {
                commands::catalog::related(&ctx, id, limit).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&ctx, product_id, quantity).await?,
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&ctx, product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&ctx, product_id).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
            CartAction::Count => commands::cart::count(&ctx).await?,
            CartAction::Promo { action } => match action {
                PromoAction::Apply { code } => commands::cart::apply_promo(&ctx, &code).await?,
                PromoAction::Remove => commands::cart::remove_promo(&ctx)?,
            },
            CartAction::Sync => commands::cart::sync(&ctx).await?,
        },
        Commands::Checkout(args) => {
            let address = Address {
                full_name: args.full_name,
                email: args.email,
                phone: args.phone,
                street: args.street,
                city: args.city,
                state: args.state,
                zip_code: args.zip_code,
                country: args.country,
            };
            commands::checkout::place_order(&ctx, address).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&ctx).await?,
            OrdersAction::Watch { interval_secs } => {
                commands::orders::watch(&ctx, interval_secs).await?;
            }
            OrdersAction::Cancel { id } => commands::orders::cancel(&ctx, id).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::List => commands::wishlist::list(&ctx).await?,
            WishlistAction::Toggle { id } => commands::wishlist::toggle(&ctx, id).await?,
            WishlistAction::Check { id } => commands::wishlist::check(&ctx, id).await?,
        },
        Commands::Account { action } => match action {
            AccountAction::Status => commands::account::status(&ctx),
            AccountAction::Profile => commands::account::profile(&ctx).await?,
            AccountAction::Update {
                first_name,
                last_name,
                phone_number,
                date_of_birth,
                address,
                city,
                state,
                zip_code,
                country,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    phone_number,
                    date_of_birth,
                    address,
                    city,
                    state,
                    zip_code,
                    country,
                };
                commands::account::update(&ctx, update).await?;
            }
            AccountAction::Login {
                token,
                username,
                email,
                user_id,
            } => commands::account::login(&ctx, token, username, email, user_id)?,
            AccountAction::Logout => commands::account::logout(&ctx)?,
        },
    }
    Ok(())
}
