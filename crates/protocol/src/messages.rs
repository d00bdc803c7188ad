use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// A processed result file inside a group folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub filename: String,
}

/// An uploaded video owned by the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub video_id: String,
    pub filename: String,
}

/// Identifiers arrive as strings or bare integers depending on the backend store.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Reply of the processing endpoint for one uploaded batch.
///
/// The service returns a free-form JSON document; the stored identifier is
/// picked from the first of `id`, `video_id` or `file_id` that is present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessResponse(pub serde_json::Value);

impl ProcessResponse {
    /// Returns the identifier the service stored the batch under, if any.
    pub fn stored_id(&self) -> Option<String> {
        ["id", "video_id", "file_id"]
            .iter()
            .find_map(|key| match self.0.get(key)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Error body returned by the service on non-success statuses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Renders `detail` as a human-readable message.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
