use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a protocol enum cannot be parsed from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Analysis pipeline requested for an uploaded batch.
///
/// Sent as the `mode` form field of the processing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    #[serde(rename = "wholebody")]
    WholeBody,
    #[serde(rename = "pose3d")]
    Pose3d,
}

impl AnalysisMode {
    /// Returns the form-field value for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeBody => "wholebody",
            Self::Pose3d => "pose3d",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wholebody" => Ok(Self::WholeBody),
            "pose3d" => Ok(Self::Pose3d),
            _ => Err(ParseError {
                kind: "analysis mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Subfolder of a group holding processed results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFolder {
    Videos,
    Jsons,
}

impl ResultFolder {
    /// Path segment used by the listing endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Jsons => "jsons",
        }
    }

    /// Kind of content stored in this folder.
    pub fn content_kind(&self) -> ContentKind {
        match self {
            Self::Videos => ContentKind::Video,
            Self::Jsons => ContentKind::Json,
        }
    }
}

impl fmt::Display for ResultFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultFolder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "videos" => Ok(Self::Videos),
            "jsons" | "json" => Ok(Self::Jsons),
            _ => Err(ParseError {
                kind: "result folder",
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of a downloadable resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Json,
    #[default]
    Other,
}

impl ContentKind {
    /// File extension conventionally used for this kind, without the dot.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Video => Some("mp4"),
            Self::Json => Some("json"),
            Self::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&AnalysisMode::WholeBody).unwrap(),
            "\"wholebody\""
        );
        assert_eq!(
            serde_json::to_string(&AnalysisMode::Pose3d).unwrap(),
            "\"pose3d\""
        );
    }

    #[test]
    fn analysis_mode_parse() {
        assert_eq!("wholebody".parse::<AnalysisMode>().unwrap(), AnalysisMode::WholeBody);
        assert_eq!(" Pose3D ".parse::<AnalysisMode>().unwrap(), AnalysisMode::Pose3d);
        let err = "skeleton".parse::<AnalysisMode>().unwrap_err();
        assert_eq!(err.value, "skeleton");
    }

    #[test]
    fn content_kind_extension() {
        assert_eq!(ContentKind::Video.extension(), Some("mp4"));
        assert_eq!(ContentKind::Json.extension(), Some("json"));
        assert!(ContentKind::Other.extension().is_none());
    }

    #[test]
    fn result_folder_content_kind() {
        assert_eq!(ResultFolder::Videos.content_kind(), ContentKind::Video);
        assert_eq!(ResultFolder::Jsons.content_kind(), ContentKind::Json);
        assert_eq!("json".parse::<ResultFolder>().unwrap(), ResultFolder::Jsons);
        assert!("images".parse::<ResultFolder>().is_err());
    }

    #[test]
    fn content_kind_default_is_other() {
        assert_eq!(ContentKind::default(), ContentKind::Other);
    }
}
