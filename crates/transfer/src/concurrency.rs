use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_CONCURRENCY, TransferError};

/// Effective network class, as reported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkHint {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
}

impl fmt::Display for NetworkHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
        })
    }
}

impl FromStr for NetworkHint {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => Ok(Self::Slow2g),
            "2g" => Ok(Self::TwoG),
            "3g" => Ok(Self::ThreeG),
            "4g" => Ok(Self::FourG),
            other => Err(TransferError::InvalidPolicy(format!(
                "unknown network type: {other}"
            ))),
        }
    }
}

/// Source of the network hint, read once when a job starts.
pub trait NetworkProbe: Send + Sync {
    fn effective_type(&self) -> Option<NetworkHint>;
}

/// Probe returning a fixed hint (configuration or tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProbe(pub Option<NetworkHint>);

impl NetworkProbe for StaticProbe {
    fn effective_type(&self) -> Option<NetworkHint> {
        self.0
    }
}

/// Picks a concurrency limit from an optional network hint.
pub type ConcurrencyStrategy = fn(Option<NetworkHint>) -> usize;

/// Default strategy: more parallel requests on faster links.
///
/// Falls back to [`DEFAULT_CONCURRENCY`] when the hint is unavailable.
pub fn choose_concurrency(hint: Option<NetworkHint>) -> usize {
    match hint {
        Some(NetworkHint::FourG) => 8,
        Some(NetworkHint::ThreeG) => 4,
        Some(NetworkHint::TwoG | NetworkHint::Slow2g) => 2,
        None => DEFAULT_CONCURRENCY,
    }
}
