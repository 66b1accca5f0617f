//! `parkly` command-line client.
//!
//! ```sh
//! parkly --email me@example.com quote 7 --start 2026-10-20T10:00:00Z --end 2026-10-20T12:30:00Z
//! parkly book 7 --start ... --end ... --vehicle ABC-123 --card-token pm_123
//! parkly check-in 42
//! parkly review --visit 11,12
//! ```

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use parkly_app::screens::{BookParkingScreen, BookingsScreen, DashboardScreen, HostBookingsScreen};
use parkly_app::{auth, AppError, AppState, Ports};
use parkly_booking::{DateFilter, PlateReadings, StatusFilter};
use parkly_catalog::{Quote, TimeWindow};
use parkly_core::payment::PaymentMethod;
use parkly_shared::Masked;
use parkly_store::{ApiClient, Config};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "parkly", version, about = "Parking marketplace client")]
struct Cli {
    /// Directory holding default.toml and friends.
    #[arg(short, long, default_value = "config")]
    config: String,

    #[arg(long, env = "PARKLY_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "PARKLY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price a stay without booking it.
    Quote {
        parking_id: i64,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Ask whether a window is free.
    Availability {
        parking_id: i64,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Pay for and create a booking.
    Book {
        parking_id: i64,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        vehicle: String,
        /// Provider token of a card already registered for this account.
        #[arg(long)]
        card_token: String,
        #[arg(long, default_value = "Card")]
        card_brand: String,
        #[arg(long, default_value = "0000")]
        card_last4: String,
    },
    /// List your bookings.
    Bookings {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    Cancel {
        booking_id: i64,
    },
    /// Capture the entrance camera and check a booking in.
    CheckIn {
        booking_id: i64,
    },
    /// Host: list unmatched vehicles, optionally marking some visited.
    Review {
        #[arg(long, value_delimiter = ',')]
        visit: Vec<i64>,
    },
    /// Host: revenue summary and bookings.
    Summary {
        #[arg(long)]
        parking_id: Option<i64>,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "all")]
        date: DateFilter,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config).context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli, config).await {
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(app) => {
                eprintln!("{}", app.notice());
                debug!("{:?}", app);
                std::process::exit(1);
            }
            None => Err(e),
        },
        ok => ok,
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let email = cli.email.context("--email or PARKLY_EMAIL is required")?;
    let password = cli.password.context("--password or PARKLY_PASSWORD is required")?;

    let session = auth::sign_in(&client, &email, &password, Utc::now()).await?;
    let ports = Ports::from_client(client.authorized(session.token.clone()));
    let state = AppState::new(session, ports, config.rules.clone());
    spawn_event_log(&state);

    let now = Utc::now();
    match cli.command {
        Command::Quote { parking_id, start, end } => {
            let screen = BookParkingScreen::open(state, parking_id, now).await?;
            let quote = Quote::for_window(screen.listing().charges, &TimeWindow::new(start, end));
            println!("{} ({})", screen.listing().title, screen.listing().address);
            println!(
                "{} x {}/hr = {}",
                quote.billable_hours, quote.rate, quote.total
            );
        }
        Command::Availability { parking_id, start, end } => {
            let screen = BookParkingScreen::open(state, parking_id, now).await?;
            screen.set_start(start, now).await?;
            let status = screen.set_end(end).await?;
            println!("{:?}", status);
            if let Some(slots) = screen.slot_occupancy().await {
                println!("{}/{} slots free right now", slots.available_slots, slots.total_slots);
            }
        }
        Command::Book {
            parking_id,
            start,
            end,
            vehicle,
            card_token,
            card_brand,
            card_last4,
        } => {
            let card = PaymentMethod {
                id: "cli".to_string(),
                token: Masked::new(card_token),
                brand: card_brand,
                last4: card_last4,
                exp_month: 12,
                exp_year: 2099,
            };
            state.wallet.remember(card.clone()).await;

            let screen = BookParkingScreen::open(state, parking_id, now).await?;
            screen.set_start(start, now).await?;
            screen.set_end(end).await?;
            screen.set_vehicle_number(&vehicle).await;
            screen.proceed_to_payment(now).await?;
            screen.select_card(&card.id).await?;

            let booking = screen.submit(now).await?;
            println!(
                "Booking#{} {} slot {} ({} -> {}) total {}",
                booking.id,
                booking.status,
                booking.slot_number.as_deref().unwrap_or("-"),
                booking.start_time,
                booking.end_time,
                booking.price
            );
        }
        Command::Bookings { status } => {
            let screen = BookingsScreen::new(state);
            screen.refresh().await?;
            screen.set_filter(status).await;
            for booking in screen.visible().await {
                let actions = screen.actions(&booking, now);
                println!(
                    "#{} {} {} {} -> {} cancel={} check-in={}",
                    booking.id,
                    booking.status,
                    booking.vehicle_number,
                    booking.start_time,
                    booking.end_time,
                    actions.cancel,
                    actions.check_in
                );
            }
        }
        Command::Cancel { booking_id } => {
            let screen = BookingsScreen::new(state);
            screen.refresh().await?;
            println!("{}", screen.cancel(booking_id, now).await?);
        }
        Command::CheckIn { booking_id } => {
            let screen = BookingsScreen::new(state);
            screen.refresh().await?;
            println!("{}", screen.check_in(booking_id).await?);
        }
        Command::Review { visit } => {
            let screen = DashboardScreen::new(state);
            screen.load().await?;
            for entry in screen.review_entries().await {
                let PlateReadings { easyocr, custom } = entry.readings();
                println!(
                    "log {} at {}: EasyOCR {} / Custom {} (expected {})",
                    entry.id,
                    entry.detected_at,
                    easyocr,
                    custom,
                    entry.expected_vehicle_number.as_deref().unwrap_or("N/A")
                );
            }
            if !visit.is_empty() {
                for id in visit {
                    screen.toggle(id).await;
                }
                println!("{}", screen.mark_visited().await?);
            }
        }
        Command::Summary { parking_id, status, date } => {
            let dashboard = DashboardScreen::new(state.clone());
            dashboard.load().await?;
            if let Some(summary) = dashboard.summary().await {
                println!(
                    "Revenue today {} / week {} / month {}; {} slots",
                    summary.revenue.daily, summary.revenue.weekly, summary.revenue.monthly, summary.total_slots
                );
            }
            let screen = HostBookingsScreen::new(state, parking_id);
            screen.refresh().await?;
            for booking in screen.view(status, date, now).await {
                println!(
                    "#{} {} {} {} {}",
                    booking.id,
                    booking.status,
                    booking.vehicle_number,
                    booking.start_time,
                    booking.customer_name.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

fn spawn_event_log(state: &AppState) {
    let mut events = state.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!("event: {}", serde_json::to_string(&event).unwrap_or_default()),
                Err(RecvError::Lagged(skipped)) => debug!("Event log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
