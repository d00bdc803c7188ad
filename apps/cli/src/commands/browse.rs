//! Listing commands.

use std::sync::Arc;

use anyhow::Context as _;
use motionlab_api::{DiskSink, FetchRoute, HttpTransport, video_items};
use motionlab_transfer::{CredentialProvider, StaticProbe, TransferController};

use super::Context;
use super::transfer::{concurrent_policy, run_job};
use crate::cli::VideosArgs;

pub async fn groups(ctx: &Context, group: Option<String>) -> anyhow::Result<u8> {
    let client = ctx.client()?;
    let names = match &group {
        Some(group) => client
            .list_group(group)
            .await
            .with_context(|| format!("listing group {group}"))?,
        None => client.list_groups().await.context("listing groups")?,
    };
    for name in names {
        println!("{name}");
    }
    Ok(0)
}

pub async fn videos(ctx: &Context, args: VideosArgs) -> anyhow::Result<u8> {
    let token = ctx
        .session
        .token()
        .context("not logged in; run `motionlab login --token <TOKEN>` first")?;
    let client = ctx.client()?;
    let records = client.list_videos(&token).await.context("listing videos")?;

    let Some(dir) = args.save else {
        for video in &records {
            println!("{}\t{}", video.video_id, video.filename);
        }
        return Ok(0);
    };

    let transport = HttpTransport::new(client).with_fetch_route(FetchRoute::StreamVideo);
    let controller = TransferController::new(Arc::new(transport))
        .with_credentials(ctx.session.clone())
        .with_sink(Arc::new(DiskSink::new(dir)))
        .with_network_probe(Arc::new(StaticProbe(ctx.config.network_hint)));
    let policy = concurrent_policy(args.concurrency.or(ctx.config.max_concurrency)).with_auth(true);
    run_job(&controller, video_items(&records), policy, "saving").await
}
