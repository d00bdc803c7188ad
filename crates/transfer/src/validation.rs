use crate::TransferError;

/// Checks that a file name supplied by the service is a single, plain path
/// component that can be created directly inside the download directory.
///
/// Separators of either platform are rejected rather than stripped, so a
/// name like `Group1/clip.json` fails instead of creating `Group1/`.
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    let invalid = |why: &str| Err(TransferError::InvalidPath(format!("{why}: {name:?}")));

    if name.trim().is_empty() {
        return invalid("empty file name");
    }
    if name == "." || name == ".." {
        return invalid("not a file name");
    }
    if name.contains(['/', '\\']) {
        return invalid("path separators not allowed");
    }
    if name.contains(':') {
        // Drive prefixes and alternate data streams on Windows.
        return invalid("':' not allowed");
    }
    if name.chars().any(char::is_control) {
        return invalid("control characters not allowed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("   ").is_err());
    }

    #[test]
    fn rejects_dot_entries() {
        assert!(validate_file_name(".").is_err());
        assert!(validate_file_name("..").is_err());
    }

    #[test]
    fn rejects_any_separator() {
        for name in [
            "../../../etc/passwd",
            "/tmp/processed.mp4",
            "Group1/clip.json",
            "./clip.mp4",
            "videos\\clip.mp4",
        ] {
            let err = validate_file_name(name).unwrap_err();
            assert!(matches!(err, TransferError::InvalidPath(_)), "{name}");
        }
    }

    #[test]
    fn rejects_drive_and_control_chars() {
        assert!(validate_file_name("C:clip.mp4").is_err());
        assert!(validate_file_name("clip\n.mp4").is_err());
    }

    #[test]
    fn accepts_plain_names() {
        assert!(validate_file_name("processed_clip.mp4").is_ok());
        assert!(validate_file_name("keypoints.json").is_ok());
        assert!(validate_file_name("run 2 (final).mp4").is_ok());
        assert!(validate_file_name("..hidden").is_ok());
    }
}
