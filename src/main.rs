use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use storefront::application::cart_engine::CartEngine;
use storefront::application::notification_engine::NotificationEngine;
use storefront::config::Config;
use storefront::domain::cart::{CartId, Price, Product};
use storefront::domain::notification::{FeedState, NotificationId, UserProfile, UserView};
use storefront::domain::ports::{ClientStorage, ClientStorageRef, TOKEN_KEY, USER_KEY};
use storefront::infrastructure::http::HttpNotificationApi;
use storefront::interfaces::csv::{CartReader, CartWriter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and change the shopping cart
    #[command(subcommand)]
    Cart(CartCommand),
    /// Read and acknowledge notifications
    #[command(subcommand)]
    Notifications(NotificationCommand),
    /// Store or drop the credentials the notification feed reads
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
enum CartCommand {
    /// Add a product (merges with an existing line for the same product)
    Add {
        product_id: String,
        name: String,
        price: Decimal,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        store: Option<String>,
    },
    /// Remove a line entry
    Remove { cart_id: CartId },
    /// Set a line's quantity; below 1 removes it
    SetQuantity {
        cart_id: CartId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Print the cart as CSV
    Show,
    /// Print the cart total
    Total,
    /// Add every product line of a CSV file
    Import { input: PathBuf },
}

#[derive(Subcommand)]
enum NotificationCommand {
    /// Fetch and print the feed once
    List,
    /// Mark one notification read
    MarkRead { id: NotificationId },
    /// Mark every notification read
    MarkAllRead,
    /// Poll and print the feed on every change until interrupted
    Watch,
}

#[derive(Subcommand)]
enum SessionCommand {
    Login {
        #[arg(long)]
        token: String,
        #[arg(long, value_enum, default_value_t = ViewArg::Personal)]
        view: ViewArg,
    },
    Logout,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Personal,
    Business,
}

impl From<ViewArg> for UserView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Personal => UserView::Personal,
            ViewArg::Business => UserView::Business,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    storefront::telemetry::init();
    let cli = Cli::parse();

    let storage = cli.config.open_storage().into_diagnostic()?;

    match cli.command {
        Command::Cart(cmd) => run_cart(cmd, storage),
        Command::Notifications(cmd) => run_notifications(cmd, &cli.config, storage).await,
        Command::Session(cmd) => run_session(cmd, storage),
    }
}

fn run_cart(cmd: CartCommand, storage: ClientStorageRef) -> Result<()> {
    let cart = CartEngine::new(storage);

    match cmd {
        CartCommand::Add {
            product_id,
            name,
            price,
            quantity,
            store,
        } => {
            let mut product = Product::new(product_id, name, Price::new(price).into_diagnostic()?);
            product.store = store;
            cart.try_add_to_cart(product, quantity).into_diagnostic()?;
        }
        CartCommand::Remove { cart_id } => cart.remove_from_cart(cart_id),
        CartCommand::SetQuantity { cart_id, quantity } => cart.update_quantity(cart_id, quantity),
        CartCommand::Clear => cart.clear_cart(),
        CartCommand::Show => {}
        CartCommand::Total => {
            println!("{}", cart.total().normalize());
            return Ok(());
        }
        CartCommand::Import { input } => {
            let file = File::open(input).into_diagnostic()?;
            for line in CartReader::new(file).lines() {
                match line {
                    Ok(line) => {
                        let (product, quantity) = line.into_product();
                        cart.try_add_to_cart(product, quantity).into_diagnostic()?;
                    }
                    Err(e) => eprintln!("Error reading cart line: {}", e),
                }
            }
        }
    }

    let stdout = io::stdout();
    let mut writer = CartWriter::new(stdout.lock());
    writer.write_cart(&cart.snapshot()).into_diagnostic()?;
    Ok(())
}

async fn run_notifications(
    cmd: NotificationCommand,
    config: &Config,
    storage: ClientStorageRef,
) -> Result<()> {
    let api = Arc::new(HttpNotificationApi::new(config.api_url.clone()));
    let settings = config.notification_settings().into_diagnostic()?;
    let engine = NotificationEngine::new(api, storage, settings);

    match cmd {
        NotificationCommand::List => {
            engine.fetch_notifications().await;
            print_feed(&engine.state());
        }
        NotificationCommand::MarkRead { id } => {
            engine.fetch_notifications().await;
            let ack = engine
                .mark_as_read(id)
                .ok_or_else(|| miette!("notification {} is not in the feed", id))?;
            ack.await.into_diagnostic()?;
        }
        NotificationCommand::MarkAllRead => {
            engine.fetch_notifications().await;
            engine.mark_all_as_read().await.into_diagnostic()?;
        }
        NotificationCommand::Watch => {
            let mut feed = engine.subscribe();
            let poller = engine.activate();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    state = feed.changed() => match state {
                        Some(state) if !state.is_loading() => print_feed(&state),
                        Some(_) => {}
                        None => break,
                    },
                }
            }
            feed.unsubscribe();
            poller.shutdown().await;
        }
    }
    Ok(())
}

fn print_feed(state: &FeedState) {
    if let Some(error) = &state.last_error {
        eprintln!("notifications unavailable: {}", error);
    }
    println!("{} unread", state.unread_count());
    for n in &state.notifications {
        let marker = if n.is_read { " " } else { "*" };
        println!("{} {}\t{}\t{}", marker, n.id, n.created_at.to_rfc3339(), n.text);
    }
}

fn run_session(cmd: SessionCommand, storage: ClientStorageRef) -> Result<()> {
    match cmd {
        SessionCommand::Login { token, view } => {
            let profile = UserProfile {
                active_view: view.into(),
            };
            let profile = serde_json::to_string(&profile).into_diagnostic()?;
            storage.set(USER_KEY, &profile).into_diagnostic()?;
            storage.set(TOKEN_KEY, &token).into_diagnostic()?;
        }
        SessionCommand::Logout => {
            storage.remove(USER_KEY).into_diagnostic()?;
            storage.remove(TOKEN_KEY).into_diagnostic()?;
        }
    }
    Ok(())
}
