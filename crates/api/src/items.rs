use motionlab_protocol::{ContentKind, FileRecord, VideoRecord};
use motionlab_transfer::TransferItem;

/// Builds download items for the given result files.
pub fn download_items(records: &[FileRecord], kind: ContentKind) -> Vec<TransferItem> {
    records
        .iter()
        .map(|r| TransferItem::download(r.id.clone(), r.filename.clone(), kind))
        .collect()
}

/// Builds download items for the user's uploaded videos.
pub fn video_items(records: &[VideoRecord]) -> Vec<TransferItem> {
    records
        .iter()
        .map(|r| TransferItem::download(r.video_id.clone(), r.filename.clone(), ContentKind::Video))
        .collect()
}
