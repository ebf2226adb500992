use anyhow::{Context, Result, bail};
use booking_intake::{
    BookingRecord, Config, GmailClient, LodgifyClient, MessageOutcome, Pipeline, ProcessedLedger,
    ReservationRequest, Session, decode_rfc822, extract_booking,
};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "booking-intake",
    version,
    about = "Forward booking notification emails as reservations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch matching emails and submit their bookings
    Run {
        /// Build reservations and print them instead of submitting
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse a saved notification (plain text or .eml) and print the booking
    Extract {
        file: PathBuf,
        /// Print the record and reservation payload as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run { dry_run } => run(dry_run).await,
        Command::Extract { file, json } => extract(&file, json).await,
    }
}

async fn run(dry_run: bool) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(?config, "Starting intake run");

    let mut session = Session::load(&config.token_file).await?;
    session
        .ensure_fresh(&reqwest::Client::new())
        .await
        .context("Failed to refresh mailbox token")?;

    let mail = GmailClient::new(
        SecretString::from(session.access_token().to_string()),
        config.max_messages,
    )?;
    // A dry run never reaches the reservation API
    let api_key = match config.api_key() {
        Some(key) => key.clone(),
        None if dry_run => SecretString::from(String::new()),
        None => config.require_api_key()?.clone(),
    };
    let sink = LodgifyClient::new(&config.reservation_url, api_key)?;
    let ledger = ProcessedLedger::load(&config.ledger_file).await?;

    let mut pipeline = Pipeline::new(mail, sink, config.search_query(), config.target)
        .with_ledger(ledger)
        .dry_run(dry_run);

    let report = pipeline.run().await?;

    for message in &report.messages {
        match &message.outcome {
            MessageOutcome::DryRun(request) => {
                println!("{}", serde_json::to_string_pretty(request)?);
            }
            outcome if outcome.is_failure() => {
                println!("{}: {outcome:?}", message.id);
            }
            _ => {}
        }
    }

    session.persist().await?;

    println!(
        "Submitted {}, failed {}, skipped {}",
        report.submitted(),
        report.failed(),
        report.skipped()
    );
    Ok(())
}

async fn extract(file: &Path, json: bool) -> Result<()> {
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let is_eml = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"));

    let body = if is_eml {
        match decode_rfc822(&raw)? {
            Some(body) => body,
            None => bail!("{} has no plain-text body", file.display()),
        }
    } else {
        String::from_utf8(raw).context("Body is not valid UTF-8")?
    };

    let record = extract_booking(&body)?;

    if json {
        let config = Config::from_env().context("Failed to load configuration")?;
        let request = ReservationRequest::from_record(&record, &config.target);
        let output = serde_json::json!({ "booking": record, "reservation": request });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &BookingRecord) {
    println!("Layout:    {}", record.layout);
    println!(
        "Guest:     {} {}",
        record.first_name.display_or_sentinel(),
        record.last_name.display_or_sentinel()
    );
    println!("Email:     {}", record.email.display_or_sentinel());
    println!("Phone:     {}", record.phone.display_or_sentinel());
    println!(
        "Address:   {}, {} {} ({})",
        record.street_address.display_or_sentinel(),
        record.postal_code.display_or_sentinel(),
        record.city.display_or_sentinel(),
        record.country_code
    );
    println!(
        "Guests:    {} adults, {} children, {} infants",
        record.guests.adults, record.guests.children, record.guests.infants
    );
    println!(
        "Period:    {} to {}",
        record.arrival.display_or_sentinel(),
        record.departure.display_or_sentinel()
    );
    println!("Total:     EUR {}", record.total_price);
    println!("Message:   {}", record.guest_message.display_or_sentinel());
}
