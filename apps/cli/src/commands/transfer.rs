//! Upload and download commands.

use std::sync::Arc;

use anyhow::Context as _;
use motionlab_api::{DiskSink, HttpTransport, download_items};
use motionlab_protocol::ResultFolder;
use motionlab_transfer::{Policy, StaticProbe, TransferController, TransferItem};

use super::Context;
use crate::cli::{DownloadArgs, FetchArgs, UploadArgs};
use crate::render::{ProgressPrinter, exit_status};

pub async fn upload(ctx: &Context, args: UploadArgs) -> anyhow::Result<u8> {
    let batch_size = args.batch_size.unwrap_or(ctx.config.batch_size);
    let policy = Policy::batched(batch_size)
        .with_analysis(args.mode)
        .with_group(args.group)
        .with_auth(args.auth || ctx.config.upload_requires_auth);
    let items = args.files.into_iter().map(TransferItem::upload).collect();

    let controller = TransferController::new(Arc::new(HttpTransport::new(ctx.client()?)))
        .with_credentials(ctx.session.clone());
    run_job(&controller, items, policy, "uploading").await
}

pub async fn download(ctx: &Context, args: DownloadArgs) -> anyhow::Result<u8> {
    let client = ctx.client()?;
    let records = client
        .list_files(&args.group, args.folder)
        .await
        .with_context(|| format!("listing {}/{}", args.group, args.folder))?;
    let items = download_items(&records, args.folder.content_kind());

    let out = args.out.unwrap_or_else(|| ctx.config.download_dir());
    let hint = args.network.or(ctx.config.network_hint);
    let policy = concurrent_policy(args.concurrency.or(ctx.config.max_concurrency));

    let controller = TransferController::new(Arc::new(HttpTransport::new(client)))
        .with_sink(Arc::new(DiskSink::new(out)))
        .with_network_probe(Arc::new(StaticProbe(hint)));
    run_job(&controller, items, policy, "downloading").await
}

pub async fn fetch(ctx: &Context, args: FetchArgs) -> anyhow::Result<u8> {
    let item = fetch_item(args.id, args.name, args.folder);
    let out = args.out.unwrap_or_else(|| ctx.config.download_dir());

    let controller = TransferController::new(Arc::new(HttpTransport::new(ctx.client()?)))
        .with_sink(Arc::new(DiskSink::new(out)));
    run_job(&controller, vec![item], Policy::concurrent(1), "downloading").await
}

fn fetch_item(id: String, name: Option<String>, folder: Option<ResultFolder>) -> TransferItem {
    let kind = folder.map(|f| f.content_kind()).unwrap_or_default();
    let name = name.unwrap_or_else(|| id.clone());
    TransferItem::download(id, name, kind)
}

/// Fixed limit when one is configured, otherwise follow the network hint.
pub(super) fn concurrent_policy(limit: Option<usize>) -> Policy {
    match limit {
        Some(n) => Policy::concurrent(n),
        None => Policy::adaptive(),
    }
}

/// Runs one job to completion, rendering its events on stderr.
///
/// Ctrl-C cancels the job; the batch or group in flight still settles.
pub(super) async fn run_job(
    controller: &TransferController,
    items: Vec<TransferItem>,
    policy: Policy,
    verb: &'static str,
) -> anyhow::Result<u8> {
    let Some(mut job) = controller.submit(items, policy)?.into_job() else {
        println!("nothing to transfer");
        return Ok(0);
    };

    let forwarder = job.take_events().map(|mut rx| {
        tokio::spawn(async move {
            let mut printer = ProgressPrinter::new(std::io::stderr(), verb);
            while let Some(event) = rx.recv().await {
                let _ = printer.handle(&event);
            }
        })
    });

    let cancel = job.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current batch");
            cancel.cancel();
        }
    });

    let report = job.wait().await?;
    interrupt.abort();
    // The job task has dropped its sender, so the forwarder drains and exits.
    if let Some(handle) = forwarder {
        let _ = handle.await;
    }

    println!("{}", report.summary());
    Ok(exit_status(&report.outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionlab_protocol::ContentKind;
    use motionlab_transfer::TransferMode;

    #[test]
    fn fixed_limit_wins_over_hint() {
        let policy = concurrent_policy(Some(3));
        assert_eq!(policy.mode, TransferMode::BoundedConcurrent);
        assert_eq!(policy.max_concurrency, Some(3));
    }

    #[test]
    fn fetch_item_defaults_name_to_id() {
        let item = fetch_item("f-9".into(), None, Some(ResultFolder::Jsons));
        assert_eq!(item.display_name(), "f-9");
        assert_eq!(item.remote_id(), Some("f-9"));
        assert_eq!(item.kind(), Some(ContentKind::Json));

        let item = fetch_item("f-9".into(), Some("pose.json".into()), None);
        assert_eq!(item.display_name(), "pose.json");
        assert_eq!(item.kind(), Some(ContentKind::Other));
    }

    #[test]
    fn no_limit_is_adaptive() {
        let policy = concurrent_policy(None);
        assert_eq!(policy.mode, TransferMode::BoundedConcurrent);
        assert!(policy.max_concurrency.is_none());
    }
}
