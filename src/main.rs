use anyhow::{Result, bail};
use clap::Parser;
use diarywatch::{
    config::Config,
    fetcher::FeedClient,
    render::{Presenter, render},
    scrape::{ScrapeOutcome, Scraper},
};

/// Dry run: print what the watcher would announce for a profile
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Profile slug
    profile: String,

    /// Title of the newest entry already announced
    #[arg(long = "last-entry")]
    last_entry: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Args {
        profile,
        last_entry,
    } = Args::parse();

    let config = Config::from_env()?;
    let client = FeedClient::new(config.fetcher())?;
    let scraper = Scraper::new(client.clone(), config.feed_kind());

    let entries = match scraper.scrape_delta(&profile, last_entry.as_deref()).await {
        ScrapeOutcome::Invalid(reason) => bail!("cannot scrape {profile}: {reason:?}"),
        ScrapeOutcome::NoNewEntries => Vec::new(),
        ScrapeOutcome::HasEntries { entries, .. } => entries,
    };

    let presenter = Presenter {
        url: client.profile_url(&profile)?,
        avatar_url: scraper.profile_avatar_url(&profile).await,
        name: profile,
    };
    let units = render(&entries, &presenter, config.render());
    println!("{}", serde_json::to_string_pretty(&units)?);

    Ok(())
}
