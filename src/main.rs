use clap::{Parser, Subcommand};
use fs2::FileExt;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

use slot_watch::config::Config;
use slot_watch::credentials::{self, CredentialType};
use slot_watch::extract::SiteExtractor;
use slot_watch::logging;
use slot_watch::notify::{SmtpNotifier, SmtpSettings};
use slot_watch::store::{SlotStore, SqliteSlotStore};
use slot_watch::watcher::{IntervalTicker, Watcher};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Watch a booking site for newly opened appointments and email them"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the site forever on the configured interval
    Run {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Credentials file (default: ~/.config/slot_watch/credentials.toml)
        #[arg(long)]
        credentials: Option<PathBuf>,
    },
    /// Run a single extract/filter/notify cycle and exit
    Once {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Credentials file (default: ~/.config/slot_watch/credentials.toml)
        #[arg(long)]
        credentials: Option<PathBuf>,
    },
    /// List slots already recorded as seen
    Seen {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Command::Run {
            config,
            credentials,
        } => watch(&config, credentials, false),
        Command::Once {
            config,
            credentials,
        } => watch(&config, credentials, true),
        Command::Seen { config } => seen(&config),
    }
}

fn watch(
    config_path: &Path,
    credentials_path: Option<PathBuf>,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    logging::init(&config.log_file)?;

    // Held until this function returns
    let lock_path = config.lock_path();
    let lock_file = File::create(&lock_path)
        .map_err(|e| format!("Failed to create lock file '{}': {}", lock_path.display(), e))?;
    lock_file.try_lock_exclusive().map_err(|_| {
        format!(
            "Another instance is already watching '{}'. Lock file: {}",
            config.database.display(),
            lock_path.display()
        )
    })?;

    let credentials_path = credentials_path
        .or_else(credentials::get_credentials_path)
        .ok_or("No credentials file given and HOME is not set")?;
    let creds = credentials::load_credentials(&credentials_path)?;

    let login_url = config.login_url()?;
    let extractor = SiteExtractor::new(
        login_url.clone(),
        config.site.username.clone(),
        creds.password(CredentialType::Site, &config.site.credential_profile)?,
    );
    let notifier = SmtpNotifier::new(SmtpSettings {
        server: config.smtp.server.clone(),
        port: config.smtp.port,
        sender: config.smtp.sender.clone(),
        password: creds.password(CredentialType::Smtp, &config.smtp.credential_profile)?,
        recipients: config.smtp.recipients.clone(),
        subject: config.subject().to_string(),
        login_url: login_url.to_string(),
    })?;
    let store = SqliteSlotStore::open(&config.database)?;
    info!("SQLite database: {}", config.database.display());

    let thresholds = config.thresholds()?;
    info!(
        "Thresholds: weekday >= {}, weekend >= {}",
        thresholds.weekday, thresholds.weekend
    );

    let mut watcher = Watcher::new(extractor, notifier, store, thresholds);
    if once {
        let report = watcher.run_cycle()?;
        info!(
            "Cycle completed: {} listed, {} new, notified={}",
            report.listed, report.new_slots, report.notified
        );
        return Ok(());
    }

    watcher.run(&mut IntervalTicker::new(config.poll_interval()));
    Ok(())
}

fn seen(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    let store = SqliteSlotStore::open(&config.database)?;
    let slots = store.seen_slots()?;

    if slots.is_empty() {
        println!("No slots seen yet.");
        return Ok(());
    }

    println!(
        "{:<19} | {:<8} | {:<8} | {:<16} | {:<8} | {}",
        "First seen (UTC)", "Start", "End", "Instructor", "Notified", "Appointment"
    );
    println!("{}", "-".repeat(100));
    for slot in &slots {
        let first_seen = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(slot.first_seen_at_ms)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<19} | {:<8} | {:<8} | {:<16} | {:<8} | {}",
            first_seen,
            slot.start_time,
            slot.end_time,
            truncate(&slot.instructor, 16),
            if slot.notified { "yes" } else { "no" },
            slot.identifier
        );
    }
    println!("\n{} slots", slots.len());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
