use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use motionlab_transfer::{
    Payload, PayloadSink, TransferError, TransferFuture, TransferItem, validate_file_name,
};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Upper bound on ` (n)` suffixes tried before giving up on a name.
const MAX_DUPLICATES: usize = 1000;

/// Writes downloaded payloads into a root directory.
///
/// Files are named after the item's display name, which must be a plain
/// file name. A name without an extension gets the one matching the item's
/// content kind. Existing files are never replaced: a taken name is saved as
/// `name (1).ext`, `name (2).ext` and so on, and each name is claimed with an
/// exclusive create so concurrent items cannot land on the same path.
#[derive(Debug, Clone)]
pub struct DiskSink {
    root: PathBuf,
}

impl DiskSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write_new(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, TransferError> {
        let sink_err = |path: &Path, e: std::io::Error| {
            TransferError::Sink(format!("{}: {e}", path.display()))
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| sink_err(&self.root, e))?;

        for n in 0..=MAX_DUPLICATES {
            let dest = self.root.join(numbered(file_name, n));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&dest).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(sink_err(&dest, e)),
            };

            let written = match file.write_all(data).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(sink_err(&dest, e));
            }
            return Ok(dest);
        }

        Err(TransferError::Sink(format!(
            "{file_name}: more than {MAX_DUPLICATES} files with this name in {}",
            self.root.display()
        )))
    }
}

impl PayloadSink for DiskSink {
    fn save<'a>(&'a self, item: &'a TransferItem, payload: Payload) -> TransferFuture<'a, PathBuf> {
        Box::pin(async move {
            let name = item.display_name();
            validate_file_name(name)?;

            let file_name = match item.kind().and_then(|k| k.extension()) {
                Some(ext) if Path::new(name).extension().is_none() => format!("{name}.{ext}"),
                _ => name.to_string(),
            };
            let dest = self.write_new(&file_name, &payload.data).await?;

            debug!(path = %dest.display(), bytes = payload.len(), "payload saved");
            Ok(dest)
        })
    }
}

/// `clip.mp4` becomes `clip (n).mp4`; the first candidate is the name itself.
fn numbered(file_name: &str, n: usize) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &file_name[..dot], &file_name[dot..]),
        _ => format!("{file_name} ({n})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionlab_protocol::ContentKind;

    fn payload(data: &[u8]) -> Payload {
        Payload {
            data: data.to_vec(),
            content_type: None,
        }
    }

    #[test]
    fn numbered_keeps_extension() {
        assert_eq!(numbered("clip.mp4", 0), "clip.mp4");
        assert_eq!(numbered("clip.mp4", 2), "clip (2).mp4");
        assert_eq!(numbered("run.tar.gz", 1), "run.tar (1).gz");
        assert_eq!(numbered("README", 1), "README (1)");
        assert_eq!(numbered(".hidden", 1), ".hidden (1)");
    }

    #[tokio::test]
    async fn writes_payload_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(tmp.path().join("out"));
        let item = TransferItem::download("1", "clip.json", ContentKind::Json);

        let path = sink.save(&item, payload(b"{}")).await.unwrap();

        assert_eq!(path, tmp.path().join("out").join("clip.json"));
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn existing_file_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(tmp.path());
        let item = TransferItem::download("1", "clip.mp4", ContentKind::Video);

        let first = sink.save(&item, payload(b"old")).await.unwrap();
        let second = sink.save(&item, payload(b"new")).await.unwrap();

        assert_eq!(first, tmp.path().join("clip.mp4"));
        assert_eq!(second, tmp.path().join("clip (1).mp4"));
        assert_eq!(std::fs::read(first).unwrap(), b"old");
        assert_eq!(std::fs::read(second).unwrap(), b"new");
    }

    #[tokio::test]
    async fn concurrent_saves_of_one_name_get_distinct_files() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(tmp.path());
        let a = TransferItem::download("a", "out.json", ContentKind::Json);
        let b = TransferItem::download("b", "out.json", ContentKind::Json);

        let (pa, pb) = tokio::join!(sink.save(&a, payload(b"A")), sink.save(&b, payload(b"B")));
        let (pa, pb) = (pa.unwrap(), pb.unwrap());

        assert_ne!(pa, pb);
        assert_eq!(std::fs::read(pa).unwrap(), b"A");
        assert_eq!(std::fs::read(pb).unwrap(), b"B");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn missing_extension_follows_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(tmp.path());

        let video = TransferItem::download("7", "run_7", ContentKind::Video);
        let other = TransferItem::download("8", "notes", ContentKind::Other);
        let named = TransferItem::download("9", "pose.json", ContentKind::Video);

        assert_eq!(sink.save(&video, payload(b"v")).await.unwrap(), tmp.path().join("run_7.mp4"));
        assert_eq!(sink.save(&other, payload(b"o")).await.unwrap(), tmp.path().join("notes"));
        assert_eq!(sink.save(&named, payload(b"n")).await.unwrap(), tmp.path().join("pose.json"));
    }

    #[tokio::test]
    async fn refuses_names_with_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DiskSink::new(tmp.path().join("out"));

        for name in ["../escape.mp4", "/etc/passwd", "Group1/clip.json", ""] {
            let item = TransferItem::download("1", name, ContentKind::Video);
            let err = sink.save(&item, payload(b"x")).await.unwrap_err();
            assert!(matches!(err, TransferError::InvalidPath(_)), "{name}: {err}");
        }
        assert!(!tmp.path().join("escape.mp4").exists());
        assert!(!tmp.path().join("out").join("Group1").exists());
    }
}
