use clap::{Args, Parser, Subcommand};
use log::info;
use rshuffle::clients::errors::Result;
use rshuffle::shuffle::{Policy, SampleMode, WeightConfig};
use std::path::PathBuf;

use crate::shuffler::{self, ShuffleRequest};

#[derive(Parser)]
#[command(name = "rshuffle")]
#[command(version, about = "Cache Spotify liked songs and build shuffled playlists", long_about = None)]
struct Cli {
    /// Library JSON file (defaults to $RSHUFFLE_LIBRARY or the local data directory)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PlaylistArgs {
    /// Sync liked songs before shuffling
    #[arg(long)]
    pull: bool,
    /// Maximum number of tracks in the playlist
    #[arg(long)]
    limit: Option<usize>,
    /// Seed for a repeatable ordering
    #[arg(long)]
    seed: Option<u64>,
    /// Print the track IDs instead of creating a playlist (offline unless --pull)
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch liked songs and merge them into the library
    Update {
        /// Remove songs that are no longer liked
        #[arg(long)]
        prune: bool,
    },
    /// Uniformly shuffle the whole library into a playlist
    Shuffle {
        #[arg(long, default_value = "Liked Shuffle all")]
        name: String,
        #[command(flatten)]
        playlist: PlaylistArgs,
    },
    /// Build a playlist weighted by stars and age
    Weighted {
        #[arg(long, default_value = "Liked Weighted")]
        name: String,
        #[arg(long, value_enum, default_value_t = Policy::ExpStar)]
        policy: Policy,
        /// Weight multiplier per star
        #[arg(long, default_value_t = 2.0)]
        base: f64,
        /// Recency window in days (exp-star-recent)
        #[arg(long, default_value_t = 365)]
        days_back: i64,
        /// Bonus per day left in the recency window (exp-star-recent)
        #[arg(long, default_value_t = 0.01)]
        weight_day: f64,
        /// Weight lost per day since liked (linear-falloff)
        #[arg(long, default_value_t = 1.0 / 365.0)]
        slope: f64,
        /// Lowest weight (linear-falloff)
        #[arg(long, default_value_t = 0.0)]
        floor: f64,
        /// Draw with replacement instead of ordering every song once
        #[arg(long)]
        with_replacement: bool,
        /// Skip a draw that repeats one of the last N picks (with --with-replacement)
        #[arg(long, default_value_t = 100)]
        not_last: usize,
        #[command(flatten)]
        playlist: PlaylistArgs,
    },
    /// Set the star rating of a song
    Rate {
        /// Track ID or "Name - Artist"
        song: String,
        #[arg(value_parser = clap::value_parser!(i32).range(1..=10))]
        stars: i32,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Update { prune } => {
            let shuffler = online(cli.library, None, false)?;
            shuffler.authorize().await?;
            shuffler.update(prune).await?;
        }
        Commands::Shuffle { name, playlist } => {
            let request = ShuffleRequest {
                playlist_name: &name,
                policy: &Policy::Uniform,
                weights: WeightConfig::default(),
                mode: SampleMode::Permutation,
                seed: playlist.seed,
                pull: playlist.pull,
            };
            shuffle(cli.library, &playlist, request).await?;
        }
        Commands::Weighted {
            name,
            policy,
            base,
            days_back,
            weight_day,
            slope,
            floor,
            with_replacement,
            not_last,
            playlist,
        } => {
            let weights = WeightConfig {
                base,
                days_back,
                weight_day,
                slope,
                floor,
                ..WeightConfig::default()
            };
            let mode = if with_replacement {
                SampleMode::WithReplacement { not_last }
            } else {
                SampleMode::Permutation
            };
            let request = ShuffleRequest {
                playlist_name: &name,
                policy: &policy,
                weights,
                mode,
                seed: playlist.seed,
                pull: playlist.pull,
            };
            shuffle(cli.library, &playlist, request).await?;
        }
        Commands::Rate { song, stars } => {
            let config = shuffler::ConfigBuilder::new()
                .library(cli.library)
                .offline(true)
                .build()?;
            shuffler::Shuffler::new(config).rate(&song, stars).await?;
        }
    }
    Ok(())
}

fn online(
    library: Option<PathBuf>,
    limit: Option<usize>,
    dry_run: bool,
) -> Result<shuffler::Shuffler> {
    info!("Building config ...");
    let config = shuffler::ConfigBuilder::new()
        .library(library)
        .playlist_limit(limit)
        .dry_run(dry_run)
        .build()?;
    Ok(shuffler::Shuffler::new(config))
}

async fn shuffle(
    library: Option<PathBuf>,
    playlist: &PlaylistArgs,
    request: ShuffleRequest<'_>,
) -> Result<()> {
    // A dry run that doesn't pull never talks to Spotify
    if playlist.dry_run && !playlist.pull {
        let config = shuffler::ConfigBuilder::new()
            .library(library)
            .playlist_limit(playlist.limit)
            .offline(true)
            .dry_run(true)
            .build()?;
        shuffler::Shuffler::new(config).shuffle(request).await?;
        return Ok(());
    }

    let shuffler = online(library, playlist.limit, playlist.dry_run)?;
    shuffler.authorize().await?;
    shuffler.shuffle(request).await?;
    Ok(())
}
