use motionlab_transfer::{
    BatchMetadata, CallContext, Payload, Receipt, TransferError, TransferFuture, TransferItem,
    Transport,
};
use tracing::debug;

use crate::client::{ApiClient, UploadFile};

/// Endpoint used for single-item fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchRoute {
    /// `GET /files/{id}`: result files of a group.
    #[default]
    Files,
    /// `GET /stream_video/{id}`: the user's own uploads. Needs a bearer.
    StreamVideo,
}

/// [`Transport`] backed by the analysis service.
///
/// Batches go to the processing endpoint; single items are fetched from
/// the endpoint selected by [`FetchRoute`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ApiClient,
    route: FetchRoute,
}

impl HttpTransport {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            route: FetchRoute::default(),
        }
    }

    pub fn with_fetch_route(mut self, route: FetchRoute) -> Self {
        self.route = route;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl Transport for HttpTransport {
    fn send_batch<'a>(
        &'a self,
        items: &'a [TransferItem],
        metadata: &'a BatchMetadata,
        ctx: &'a CallContext,
    ) -> TransferFuture<'a, Receipt> {
        Box::pin(async move {
            let mut files = Vec::with_capacity(items.len());
            let mut bytes = 0u64;
            for item in items {
                let TransferItem::Upload { path, name } = item else {
                    return Err(TransferError::Transport(format!(
                        "{} is not an upload",
                        item.display_name()
                    )));
                };
                let data = tokio::fs::read(path).await.map_err(|e| {
                    TransferError::Transport(format!("cannot read {}: {e}", path.display()))
                })?;
                bytes += data.len() as u64;
                files.push(UploadFile {
                    name: name.clone(),
                    data,
                });
            }

            let response = self
                .client
                .process_batch(files, metadata, ctx.bearer.as_deref())
                .await?;
            debug!(items = items.len(), bytes, "batch accepted");
            Ok(Receipt {
                stored_id: response.stored_id(),
                saved_to: None,
                bytes,
            })
        })
    }

    fn fetch_one<'a>(
        &'a self,
        item: &'a TransferItem,
        ctx: &'a CallContext,
    ) -> TransferFuture<'a, Payload> {
        Box::pin(async move {
            let Some(id) = item.remote_id() else {
                return Err(TransferError::Transport(format!(
                    "{} is not a download",
                    item.display_name()
                )));
            };
            let payload = match self.route {
                FetchRoute::Files => self.client.fetch_file(id, ctx.bearer.as_deref()).await?,
                FetchRoute::StreamVideo => {
                    let bearer = ctx
                        .bearer
                        .as_deref()
                        .ok_or(TransferError::MissingCredential)?;
                    self.client.stream_video(id, bearer).await?
                }
            };
            Ok(payload)
        })
    }
}
