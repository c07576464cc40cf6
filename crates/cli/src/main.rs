//! Luma CLI - storefront and hostess check-in from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password read from stdin)
//! luma login -u ana
//!
//! # Browse events
//! luma events --search rock --sort menor-preco
//!
//! # Build a cart and pay
//! luma cart add --event 3 --ticket 7 --quantity 2
//! luma cart list
//! luma checkout
//!
//! # Hostess check-in
//! luma hostess events
//! luma hostess checkin 3 --scan
//! luma hostess checkin 3 --attendee 41
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `events` - Browse the catalog
//! - `tickets` - List your tickets and their QR payloads
//! - `cart` - Manage the local cart
//! - `checkout` - Create a payment intent and clear the cart once paid
//! - `hostess` - Event-day check-in
//! - `admin cities` - City lookup used by the admin event form

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use luma_core::{AttendeeId, CartLineId, CategoryId, EventId, EventSort, StateId, TicketId};
use luma_storefront::config::{LogFormat, StorefrontConfig};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;
mod scanner;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "luma")]
#[command(author, version, about = "Luma Events storefront and check-in tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in; the password is read from stdin
    Login {
        #[arg(short, long)]
        username: String,
    },
    /// Create an account and log into it
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Browse events
    Events {
        /// Search title, description, category, and city
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        min_price: Option<Decimal>,

        #[arg(long)]
        max_price: Option<Decimal>,

        /// Category ID; repeat to select several
        #[arg(long = "category")]
        categories: Vec<CategoryId>,

        /// `relevancia`, `recentes`, `menor-preco`, or `maior-preco`
        #[arg(long, default_value = "relevancia")]
        sort: EventSort,
    },
    /// List your tickets with their QR payloads
    Tickets,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Pay for the cart
    Checkout {
        /// Skip the payment confirmation prompt
        #[arg(long)]
        paid: bool,
    },
    /// Event-day check-in (hostess group only)
    Hostess {
        #[command(subcommand)]
        action: HostessAction,
    },
    /// Admin helpers
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its totals
    List,
    /// Add tickets of an event
    Add {
        #[arg(long)]
        event: EventId,

        #[arg(long)]
        ticket: TicketId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Merge into an existing line instead of creating a new one
        #[arg(long)]
        line: Option<CartLineId>,
    },
    /// Remove a line
    Remove { line: CartLineId },
    /// Change a line's quantity; values below 1 are ignored
    Set {
        line: CartLineId,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum HostessAction {
    /// List events to check in
    Events,
    /// Show an event's roster and check attendees in
    Checkin {
        event: EventId,

        /// Check one attendee in by ID
        #[arg(long, conflicts_with = "scan")]
        attendee: Option<AttendeeId>,

        /// Read QR payloads from stdin, one per line (`q` to stop)
        #[arg(long)]
        scan: bool,

        /// Only list attendees whose name contains this text
        #[arg(long, default_value = "")]
        name: String,

        /// Only list checked-in (`true`) or pending (`false`) attendees
        #[arg(long)]
        checked_in: Option<bool>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Cities of a state, as the event form loads them
    Cities {
        /// Two-letter state code
        #[arg(long, required_unless_present = "state_id")]
        uf: Option<String>,

        /// State ID (legacy endpoint)
        #[arg(long, conflicts_with = "uf")]
        state_id: Option<StateId>,

        /// Cookie header to take the CSRF token from
        #[arg(long)]
        cookie: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
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
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr; stdout is for command output.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "luma=info,luma_storefront=info".into());

    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    if let Err(e) = run(cli, config).await {
        e.report();
        output::error(&e.user_message());
        if e.is_session_error() {
            output::error("Faça login com `luma login -u <usuário>`.");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let ctx = Context::open(config)?;

    match cli.command {
        Commands::Login { username } => commands::account::login(&ctx, &username).await,
        Commands::Register { username, email } => {
            commands::account::register(&ctx, &username, &email).await
        }
        Commands::Logout => commands::account::logout(&ctx).await,
        Commands::Whoami => commands::account::whoami(&ctx).await,
        Commands::Tickets => commands::account::tickets(&ctx).await,
        Commands::Events {
            search,
            city,
            min_price,
            max_price,
            categories,
            sort,
        } => {
            let query = luma_core::EventQuery {
                search,
                city,
                min_price,
                max_price,
                categories,
                sort,
            };
            commands::catalog::events(&ctx, &query).await
        }
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&ctx),
            CartAction::Add {
                event,
                ticket,
                quantity,
                line,
            } => commands::cart::add(&ctx, event, ticket, quantity, line).await,
            CartAction::Remove { line } => commands::cart::remove(&ctx, line),
            CartAction::Set { line, quantity } => commands::cart::set_quantity(&ctx, line, quantity),
            CartAction::Clear => commands::cart::clear(&ctx),
        },
        Commands::Checkout { paid } => commands::cart::checkout(&ctx, paid).await,
        Commands::Hostess { action } => match action {
            HostessAction::Events => commands::hostess::events(&ctx).await,
            HostessAction::Checkin {
                event,
                attendee,
                scan,
                name,
                checked_in,
            } => {
                let filter = luma_core::RosterFilter::new(name, checked_in);
                commands::hostess::checkin(&ctx, event, attendee, scan, &filter).await
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Cities {
                uf,
                state_id,
                cookie,
            } => commands::admin::cities(&ctx, uf.as_deref(), state_id, cookie.as_deref()).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_negative_quantity_and_sort() {
        let cli = Cli::try_parse_from([
            "luma",
            "cart",
            "set",
            "8c1f1a52-4f2b-4a43-9f7e-0d5b8e1f2a10",
            "-1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Set { quantity: -1, .. }
            }
        ));

        let cli = Cli::try_parse_from(["luma", "events", "--sort", "maior-preco"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Events {
                sort: EventSort::HighestPrice,
                ..
            }
        ));
    }
}
