//! mastodon-speaker: reads new Mastodon notifications aloud.

mod announcer;
mod config;
mod cursor;
mod error;
mod html_text;
mod mastodon;
mod poller;
mod speech;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::announcer::Announcer;
use crate::config::{Config, InstanceConfig};
use crate::cursor::CursorStore;
use crate::mastodon::MastodonClient;
use crate::poller::Poller;
use crate::speech::history::AnnouncementHistory;
use crate::speech::piper::PiperSpeaker;
use crate::speech::{LogSpeaker, Speaker};

#[derive(Parser, Debug)]
#[command(name = "mastodon-speaker", about = "Speak new Mastodon notifications aloud")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep running and poll every N seconds instead of exiting after one pass
    #[arg(short, long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    watch: Option<u64>,

    /// Log announcements instead of speaking them; the cursor is left as is
    #[arg(long)]
    dry_run: bool,

    /// Print the announcement report for a date (YYYY-MM-DD or "today") and exit
    #[arg(long, value_name = "DATE")]
    report: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging (keep HTTP internals quiet)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info,html5ever=warn")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn,html5ever=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(args.config.as_deref());

    if let Some(date) = &args.report {
        match AnnouncementHistory::from_config(&config.history) {
            Some(history) => println!("{}", history.generate_report(date)),
            None => warn!("Announcement history is disabled in config"),
        }
        return ExitCode::SUCCESS;
    }

    match run(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &Config) -> error::Result<()> {
    let instance = InstanceConfig::from_env()?;
    info!("mastodon-speaker starting for {}", instance.url);

    let client = MastodonClient::new(&instance)?;
    info!("Notifications endpoint: {}", client.endpoint());
    let cursor = CursorStore::new(&config.cursor.path);
    info!("Cursor file: {}", cursor.path().display());

    if args.dry_run {
        let announcer = Announcer::new(LogSpeaker, &config.announce, &config.speech, None);
        drive(Poller::new(client, announcer, cursor, false), args.watch).await
    } else {
        let speaker = PiperSpeaker::new(config.speech.clone());
        let history = AnnouncementHistory::from_config(&config.history);
        let announcer = Announcer::new(speaker, &config.announce, &config.speech, history);
        drive(Poller::new(client, announcer, cursor, true), args.watch).await
    }
}

async fn drive<S: Speaker>(poller: Poller<S>, watch: Option<u64>) -> error::Result<()> {
    match watch {
        Some(secs) => {
            info!("Watching for notifications every {secs}s");
            poller.watch(Duration::from_secs(secs), ctrl_c()).await;
            Ok(())
        }
        None => poller.run_once().await,
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
