//! Vibe command-line client
//!
//! Talks to the recommendation service: checks its health, browses artists
//! and their tracks, and runs a search followed by regenerations.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibe_common::config::{resolve_config_path, TomlConfig};
use vibe_session::{Completion, RecommendationClient, RecommendationSession};

/// Command-line arguments for vibe
#[derive(Parser, Debug)]
#[command(name = "vibe")]
#[command(about = "Artist recommendations from seed artists")]
#[command(version)]
struct Args {
    /// Bootstrap config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recommendation service base URL (overrides config and VIBE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the service is up and has data loaded
    Health,

    /// List artists known to the service
    Artists {
        /// Case-insensitive name filter
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// List one artist's tracks
    Tracks { artist: String },

    /// Search for artists like the seeds, then ask for more
    Recommend {
        /// Seed artist (repeatable)
        #[arg(short, long = "seed", required = true)]
        seeds: Vec<String>,

        /// Steer toward a track, as "Artist=Track name" (repeatable)
        #[arg(short, long = "fine-tune")]
        fine_tune: Vec<String>,

        /// Artist to leave out of every batch (repeatable)
        #[arg(short, long = "known")]
        known: Vec<String>,

        /// Regenerations to run after the first batch
        #[arg(short, long, default_value_t = 0)]
        more: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(url) = args.api_url.as_deref() {
        config.api_url = url.to_string();
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match resolve_config_path(args.config.as_deref()) {
        Some(path) => debug!("Config file: {}", path.display()),
        None => debug!("No config file, using defaults"),
    }
    info!("Using recommendation service at {}", config.api_url);

    let client = RecommendationClient::from_config(&config).context("building HTTP client")?;

    match args.command {
        Command::Health => {
            let health = client.health().await.context("health check failed")?;
            if !health.is_ok() {
                bail!("service reports status '{}'", health.status);
            }
            println!("ok: {} tracks loaded", health.tracks_loaded);
        }
        Command::Artists { query, limit } => {
            for artist in client.search_artists(&query, limit).await? {
                println!("{}", artist);
            }
        }
        Command::Tracks { artist } => {
            let tracks = client
                .artist_tracks(&artist)
                .await
                .with_context(|| format!("fetching tracks for {}", artist))?;
            for track in tracks {
                println!("{}\t{}", track.track_id, track.track_name);
            }
        }
        Command::Recommend {
            seeds,
            fine_tune,
            known,
            more,
        } => {
            let mut session = RecommendationSession::from_config(&config);
            prepare_inputs(&client, &mut session, seeds, fine_tune, known).await?;
            recommend(&client, &mut session, more).await?;
        }
    }

    Ok(())
}

/// Fill the session inputs, fetching track lists for fine-tuned artists
async fn prepare_inputs(
    client: &RecommendationClient,
    session: &mut RecommendationSession,
    seeds: Vec<String>,
    fine_tune: Vec<String>,
    known: Vec<String>,
) -> Result<()> {
    for seed in seeds {
        session.inputs_mut().add_seed(seed);
    }
    for artist in known {
        session.inputs_mut().mark_known(artist);
    }

    for pick in fine_tune {
        let Some((artist, track)) = pick.split_once('=') else {
            bail!("fine-tune pick '{}' is not of the form Artist=Track", pick);
        };
        let (artist, track) = (artist.trim(), track.trim());
        if session.inputs().artist_tracks(artist).is_none() {
            let tracks = client
                .artist_tracks(artist)
                .await
                .with_context(|| format!("fetching tracks for {}", artist))?;
            session.inputs_mut().cache_artist_tracks(artist, tracks);
        }
        if !session.inputs_mut().select_track(artist, track) {
            warn!(
                "Ignoring fine-tune pick '{}' for {} (duplicate or {} already picked)",
                track,
                artist,
                session.inputs().fine_tune().capacity()
            );
        }
    }
    Ok(())
}

/// One search plus up to `more` regenerations, printing every batch
async fn recommend(
    client: &RecommendationClient,
    session: &mut RecommendationSession,
    more: u32,
) -> Result<()> {
    let ticket = session.begin_search()?;
    let result = client.recommend(ticket.request()).await;
    if let Completion::Failed(message) = session.complete(ticket, result) {
        bail!(message);
    }
    print_batch(session, 1);

    for batch in 2..=more + 1 {
        let ticket = match session.begin_regenerate() {
            Ok(ticket) => ticket,
            Err(blocked) => {
                println!("No more batches: {}", blocked.reason());
                return Ok(());
            }
        };
        let result = client.recommend(ticket.request()).await;
        match session.complete(ticket, result) {
            Completion::Applied(_) => print_batch(session, batch),
            Completion::Failed(message) => {
                println!("Regeneration failed: {}", message);
                return Ok(());
            }
            Completion::Discarded => {}
        }
    }

    if let Some(blocked) = session.regenerate_blocked() {
        println!("No more batches: {}", blocked.reason());
    }
    Ok(())
}

fn print_batch(session: &RecommendationSession, batch: u32) {
    println!(
        "== Batch {} ({} artists hidden so far) ==",
        batch,
        session.exclusion_history().len()
    );
    for (artist, tracks) in session.recommendations() {
        println!("{}", artist);
        for track in tracks {
            match track.year {
                Some(year) => println!("  {} ({})", track.track_name, year),
                None => println!("  {}", track.track_name),
            }
        }
    }
}
