use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use url::Url;
use diarywatch::{
    config::Config,
    fetcher::FeedClient,
    render::rating_text,
    repositories::{ServerChannelRepository, TrackedProfileRepository},
    scrape::Scraper,
    watcher::{RegistrationOutcome, register_profile, unregister_profile},
};

/// Manage the diary profiles a server follows
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start tracking a profile
    Add { server_id: i64, profile: String },
    /// Stop tracking a profile
    Remove { server_id: i64, profile: String },
    /// List tracked profiles and their last announced entry
    List { server_id: i64 },
    /// Announce a server's entries to this webhook
    SetChannel { server_id: i64, webhook_url: Url },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(config.database_url())
        .await?;

    match args.command {
        Command::Add { server_id, profile } => {
            let scraper = Scraper::new(FeedClient::new(config.fetcher())?, config.feed_kind());
            let outcome = register_profile(
                &pool,
                &scraper,
                server_id,
                &profile,
                config.max_profiles_per_server(),
            )
            .await?;
            match outcome {
                RegistrationOutcome::Registered { entry, .. } => println!(
                    "Now tracking {profile}. Latest entry: {} {}",
                    entry.title,
                    rating_text(entry.rating.as_deref(), config.render())
                ),
                RegistrationOutcome::RegisteredWithoutEntries => {
                    println!("Now tracking {profile}. No diary entries yet.")
                }
                RegistrationOutcome::AlreadyTracked => {
                    println!("{profile} is already tracked on this server.")
                }
                RegistrationOutcome::ServerFull => println!(
                    "This server already tracks {} profiles.",
                    config.max_profiles_per_server()
                ),
                RegistrationOutcome::InvalidProfile(reason) => {
                    bail!("cannot track {profile}: {reason:?}")
                }
            }
        }
        Command::Remove { server_id, profile } => {
            if unregister_profile(&pool, server_id, &profile).await? {
                println!("Stopped tracking {profile}.");
            } else {
                println!("{profile} was not tracked on this server.");
            }
        }
        Command::SetChannel {
            server_id,
            webhook_url,
        } => {
            ServerChannelRepository::new(pool)
                .set(server_id, &webhook_url)
                .await?;
            println!("Announcements for server {server_id} now go to {webhook_url}.");
        }
        Command::List { server_id } => {
            let channel = ServerChannelRepository::new(pool.clone())
                .find(server_id)
                .await?;
            match channel {
                Some(channel) => println!("channel\t{}", channel.webhook_url),
                None => println!("channel\t(default)"),
            }
            let profiles = TrackedProfileRepository::new(pool)
                .list_for_server(server_id)
                .await?;
            for profile in profiles {
                println!(
                    "{}\t{}",
                    profile.profile_name,
                    profile.last_entry.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
