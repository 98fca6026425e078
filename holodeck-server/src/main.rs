use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

use holodeck_common::traits::platform_traits::PlatformIntegration;
use holodeck_core::Database;
use holodeck_core::media::YtDlpAcquirer;
use holodeck_core::platforms::discord::{DiscordPlatform, PlatformSeed};
use holodeck_core::repositories::{SceneStore, SqliteSceneRepository};
use holodeck_core::services::SceneService;

#[derive(Parser, Debug, Clone)]
#[command(name = "holodeck")]
#[command(author, version, about = "Holodeck - banish people into audio scenes")]
struct Args {
    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN")]
    token: String,

    /// Voice channel members get banished into
    #[arg(long, env = "BANISH_CHANNEL_ID")]
    banish_channel_id: u64,

    /// SQLite connection URL for the scene store
    #[arg(long, default_value = "sqlite:data/holodeck.db")]
    database_url: String,

    /// Directory downloaded scene audio lands in
    #[arg(long, default_value = "data/media")]
    media_dir: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("holodeck=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let Some(banish_channel_id) = Id::<ChannelMarker>::new_checked(args.banish_channel_id) else {
        bail!("--banish-channel-id must be a non-zero channel id");
    };

    std::fs::create_dir_all("data")?;
    std::fs::create_dir_all(&args.media_dir)?;

    let db = Database::new(&args.database_url).await?;
    db.migrate().await?;

    let repo = Arc::new(SqliteSceneRepository::new(db.pool().clone()));
    let store = Arc::new(SceneStore::new(repo));
    store.reload().await?;

    let acquirer = Arc::new(YtDlpAcquirer::new(&args.media_dir));
    let scenes = Arc::new(SceneService::new(store.clone(), acquirer));

    let mut platform = DiscordPlatform::new(
        args.token.clone(),
        PlatformSeed {
            store,
            scenes,
            banish_channel_id,
        },
    );
    platform.connect().await?;
    info!("Holodeck is up. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    platform.disconnect().await?;

    Ok(())
}
